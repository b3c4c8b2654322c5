use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::{DateTime, Utc};
use std::sync::Arc;

use super::SubmissionService;
use crate::errors::{Result, TuitionSystemError};
use crate::lifecycle::{self, SubmissionWrite, SubmitRejection};
use crate::middlewares::RequireJWT;
use crate::models::assignments::entities::Assignment;
use crate::models::submissions::entities::Submission;
use crate::models::submissions::requests::SubmitAssignmentRequest;
use crate::models::submissions::responses::SubmissionResponse;
use crate::models::users::entities::UserRole;
use crate::models::{ApiResponse, ErrorCode};
use crate::storage::Storage;
use crate::utils::validate::validate_submit_payload;

/// 一次读-改-写尝试的结果
enum Attempt {
    Persisted(Submission),
    Rejected(SubmitRejection),
    /// 条件写入落空：读到的状态在写入前被并发请求改掉了
    LostRace,
}

/// 提交作业
/// POST /assignments/{id}/submissions
///
/// 首次提交插入记录，重复提交在批改前原地覆盖。与批改的竞争由
/// 存储层的条件写入兜底，落空后重读一次再试，仍落空则返回冲突。
pub async fn submit_assignment(
    service: &SubmissionService,
    request: &HttpRequest,
    assignment_id: i64,
    req: SubmitAssignmentRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let clock = service.get_clock(request);

    let student = match RequireJWT::extract_user_claims(request) {
        Some(user) => user,
        None => {
            return Ok(HttpResponse::Unauthorized().json(ApiResponse::error_empty(
                ErrorCode::Unauthorized,
                "无法获取用户信息",
            )));
        }
    };

    if student.role != UserRole::Student {
        return Ok(HttpResponse::Forbidden().json(ApiResponse::error_empty(
            ErrorCode::Forbidden,
            "只有学生可以提交作业",
        )));
    }

    if let Err(message) = validate_submit_payload(&req) {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::ValidationFailed,
            message,
        )));
    }

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

    // 不在目标班级的学生视同作业不存在
    if student.cohort.as_deref() != Some(assignment.audience_class.as_str()) {
        return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::AssignmentNotFound,
            "作业不存在",
        )));
    }

    let now = clock.now();

    // 读-改-写，竞争落空后重试一次
    for _ in 0..2 {
        let attempt = match try_submit(&storage, &assignment, student.id, &req, now).await {
            Ok(outcome) => outcome,
            Err(e) => {
                return Ok(
                    HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                        ErrorCode::InternalServerError,
                        format!("提交失败: {e}"),
                    )),
                );
            }
        };

        match attempt {
            Attempt::Persisted(submission) => {
                return Ok(HttpResponse::Ok().json(ApiResponse::success(
                    SubmissionResponse::from(submission),
                    "提交成功",
                )));
            }
            Attempt::Rejected(SubmitRejection::AlreadyGraded) => {
                return Ok(HttpResponse::Conflict().json(ApiResponse::error_empty(
                    ErrorCode::AlreadyGraded,
                    "该提交已批改，不能再修改",
                )));
            }
            Attempt::Rejected(SubmitRejection::DeadlinePassed) => {
                return Ok(HttpResponse::Forbidden().json(ApiResponse::error_empty(
                    ErrorCode::DeadlinePassed,
                    "截止时间已过，该作业不接受迟交",
                )));
            }
            Attempt::LostRace => continue,
        }
    }

    Ok(HttpResponse::Conflict().json(ApiResponse::error_empty(
        ErrorCode::Conflict,
        "提交与其他操作冲突，请稍后重试",
    )))
}

async fn try_submit(
    storage: &Arc<dyn Storage>,
    assignment: &Assignment,
    student_id: i64,
    req: &SubmitAssignmentRequest,
    now: DateTime<Utc>,
) -> Result<Attempt> {
    let existing = storage
        .get_submission_for_student(assignment.id, student_id)
        .await?;

    if let Err(rejection) = lifecycle::validate_submit(assignment, existing.as_ref(), now) {
        return Ok(Attempt::Rejected(rejection));
    }

    let write = lifecycle::build_submission(
        assignment,
        existing.as_ref(),
        student_id,
        req.content.clone(),
        req.attachment_ref.clone(),
        now,
    );

    match write {
        SubmissionWrite::Create(draft) => match storage.insert_submission(draft).await {
            Ok(submission) => Ok(Attempt::Persisted(submission)),
            // 唯一索引拦下了并发的首次提交，重读后转为覆盖
            Err(TuitionSystemError::WriteConflict(_)) => Ok(Attempt::LostRace),
            Err(e) => Err(e),
        },
        SubmissionWrite::Revise {
            submission_id,
            draft,
        } => {
            match storage
                .revise_submission_if_ungraded(submission_id, draft)
                .await?
            {
                Some(submission) => Ok(Attempt::Persisted(submission)),
                // 读到 submitted，写入前被批改拿走了
                None => Ok(Attempt::LostRace),
            }
        }
    }
}
