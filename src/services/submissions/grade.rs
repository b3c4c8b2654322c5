use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::SubmissionService;
use crate::lifecycle::{self, GradeRejection};
use crate::middlewares::RequireJWT;
use crate::models::submissions::requests::GradeSubmissionRequest;
use crate::models::submissions::responses::SubmissionResponse;
use crate::models::users::entities::UserRole;
use crate::models::{ApiResponse, ErrorCode};

/// 批改提交
/// POST /submissions/{id}/grade
///
/// 单向迁移：写入分数与评语后提交进入终态。与覆盖提交的竞争由
/// 存储层以 status 为条件的单行更新裁决；落空只可能是已批改。
pub async fn grade_submission(
    service: &SubmissionService,
    request: &HttpRequest,
    submission_id: i64,
    req: GradeSubmissionRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let clock = service.get_clock(request);

    // 获取当前用户信息（路由层已要求辅导老师角色）
    let grader = match RequireJWT::extract_user_claims(request) {
        Some(user) => user,
        None => {
            return Ok(HttpResponse::Unauthorized().json(ApiResponse::error_empty(
                ErrorCode::Unauthorized,
                "无法获取用户信息",
            )));
        }
    };

    let submission = match storage.get_submission_by_id(submission_id).await {
        Ok(Some(s)) => s,
        Ok(None) => {
            return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::SubmissionNotFound,
                "提交不存在",
            )));
        }
        Err(e) => {
            return Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    format!("查询提交失败: {e}"),
                )),
            );
        }
    };

    let assignment = match storage.get_assignment_by_id(submission.assignment_id).await {
        Ok(Some(a)) => a,
        Ok(None) => {
            return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::AssignmentNotFound,
                "提交所属的作业不存在",
            )));
        }
        Err(e) => {
            return Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    format!("查询作业失败: {e}"),
                )),
            );
        }
    };

    // 只有布置者本人可以批改，管理员放行
    if grader.role != UserRole::Admin && assignment.owner_id != grader.id {
        return Ok(HttpResponse::Forbidden().json(ApiResponse::error_empty(
            ErrorCode::Forbidden,
            "只能批改自己布置的作业",
        )));
    }

    let draft = match lifecycle::build_grade(
        &assignment,
        &submission,
        req.points_earned,
        req.feedback,
        clock.now(),
    ) {
        Ok(draft) => draft,
        Err(GradeRejection::AlreadyGraded) => {
            return Ok(HttpResponse::Conflict().json(ApiResponse::error_empty(
                ErrorCode::AlreadyGraded,
                "该提交已批改过",
            )));
        }
        Err(GradeRejection::ScoreOutOfRange { total_points }) => {
            return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
                ErrorCode::ScoreOutOfRange,
                format!("分数必须在 0 到 {total_points} 之间"),
            )));
        }
    };

    match storage
        .grade_submission_if_ungraded(submission.id, draft)
        .await
    {
        Ok(Some(graded)) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            SubmissionResponse::from(graded),
            "批改成功",
        ))),
        // 读到 submitted，写入前被并发批改抢先
        Ok(None) => Ok(HttpResponse::Conflict().json(ApiResponse::error_empty(
            ErrorCode::AlreadyGraded,
            "该提交已批改过",
        ))),
        Err(e) => Ok(
            HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::InternalServerError,
                format!("写入批改失败: {e}"),
            )),
        ),
    }
}
