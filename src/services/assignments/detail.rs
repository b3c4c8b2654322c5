use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::AssignmentService;
use crate::lifecycle;
use crate::middlewares::RequireJWT;
use crate::models::assignments::responses::{
    AssignmentOwner, AssignmentView, StudentAssignmentItem, TutorAssignmentItem,
};
use crate::models::submissions::responses::OwnSubmissionBrief;
use crate::models::users::entities::UserRole;
use crate::models::{ApiResponse, ErrorCode};

/// 获取作业详情
/// GET /assignments/{id}
///
/// 学生只能看到自己班级的作业（否则视同不存在），响应里附带本人
/// 提交状态；辅导老师只能看自己布置的作业，响应里附带批改进度。
pub async fn get_assignment(
    service: &AssignmentService,
    request: &HttpRequest,
    assignment_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let clock = service.get_clock(request);

    let user = match RequireJWT::extract_user_claims(request) {
        Some(user) => user,
        None => {
            return Ok(HttpResponse::Unauthorized().json(ApiResponse::error_empty(
                ErrorCode::Unauthorized,
                "无法获取用户信息",
            )));
        }
    };

    let assignment = match storage.get_assignment_by_id(assignment_id).await {
        Ok(Some(a)) => a,
        Ok(None) => {
            return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::AssignmentNotFound,
                "作业不存在",
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

    let owner = match storage.get_user_by_id(assignment.owner_id).await {
        Ok(Some(u)) => AssignmentOwner {
            id: u.id,
            username: u.username,
            display_name: u.display_name,
        },
        Ok(None) => AssignmentOwner {
            id: assignment.owner_id,
            username: "未知用户".to_string(),
            display_name: None,
        },
        Err(e) => {
            return Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    format!("查询布置者信息失败: {e}"),
                )),
            );
        }
    };

    match user.role {
        UserRole::Student => {
            // 不在目标班级的学生视同作业不存在
            if user.cohort.as_deref() != Some(assignment.audience_class.as_str()) {
                return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                    ErrorCode::AssignmentNotFound,
                    "作业不存在",
                )));
            }

            let submission = match storage
                .get_submission_for_student(assignment.id, user.id)
                .await
            {
                Ok(s) => s,
                Err(e) => {
                    return Ok(HttpResponse::InternalServerError().json(
                        ApiResponse::error_empty(
                            ErrorCode::InternalServerError,
                            format!("查询提交记录失败: {e}"),
                        ),
                    ));
                }
            };

            let view = lifecycle::compute_status(&assignment, submission.as_ref(), clock.now());
            let item = StudentAssignmentItem {
                status: view.status,
                is_overdue: view.is_overdue,
                my_submission: submission.as_ref().map(OwnSubmissionBrief::from),
                assignment: AssignmentView::from_assignment(assignment, owner),
            };
            Ok(HttpResponse::Ok().json(ApiResponse::success(item, "获取作业详情成功")))
        }
        UserRole::Tutor | UserRole::Admin => {
            if user.role != UserRole::Admin && assignment.owner_id != user.id {
                return Ok(HttpResponse::Forbidden().json(ApiResponse::error_empty(
                    ErrorCode::Forbidden,
                    "只能查看自己布置的作业",
                )));
            }

            let tally = match storage.tally_submissions(&[assignment.id]).await {
                Ok(map) => map.get(&assignment.id).copied().unwrap_or_default(),
                Err(e) => {
                    return Ok(HttpResponse::InternalServerError().json(
                        ApiResponse::error_empty(
                            ErrorCode::InternalServerError,
                            format!("统计提交进度失败: {e}"),
                        ),
                    ));
                }
            };

            let item = TutorAssignmentItem {
                submission_count: tally.submitted,
                graded_count: tally.graded,
                pending_grading: tally.submitted - tally.graded,
                assignment: AssignmentView::from_assignment(assignment, owner),
            };
            Ok(HttpResponse::Ok().json(ApiResponse::success(item, "获取作业详情成功")))
        }
    }
}
