use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::SubmissionService;
use crate::middlewares::RequireJWT;
use crate::models::submissions::requests::SubmissionListParams;
use crate::models::submissions::responses::{
    SubmissionListItem, SubmissionListResponse, SubmissionStudent,
};
use crate::models::users::entities::UserRole;
use crate::models::{ApiResponse, ErrorCode, PaginationInfo};

/// 列出某作业的提交
/// GET /assignments/{id}/submissions
///
/// 按提交时间升序，关联提交者身份，供批改列表使用。
pub async fn list_submissions(
    service: &SubmissionService,
    request: &HttpRequest,
    assignment_id: i64,
    params: SubmissionListParams,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);

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

    // 只有布置者本人可以翻看提交，管理员放行
    if user.role != UserRole::Admin && assignment.owner_id != user.id {
        return Ok(HttpResponse::Forbidden().json(ApiResponse::error_empty(
            ErrorCode::Forbidden,
            "只能查看自己布置作业的提交",
        )));
    }

    let page = params.pagination.page();
    let size = params.pagination.size();

    let (submissions, total) = match storage
        .list_submissions_for_assignment(assignment_id, page, size)
        .await
    {
        Ok(result) => result,
        Err(e) => {
            return Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    format!("查询提交列表失败: {e}"),
                )),
            );
        }
    };

    // 批量关联提交者身份
    let student_ids: Vec<i64> = submissions
        .iter()
        .map(|s| s.student_id)
        .collect::<std::collections::HashSet<_>>()
        .into_iter()
        .collect();

    let student_map = match storage.get_users_by_ids(&student_ids).await {
        Ok(map) => map,
        Err(e) => {
            return Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    format!("查询提交者信息失败: {e}"),
                )),
            );
        }
    };

    let items: Vec<SubmissionListItem> = submissions
        .into_iter()
        .map(|s| SubmissionListItem {
            id: s.id,
            assignment_id: s.assignment_id,
            student: SubmissionStudent::from_lookup(s.student_id, student_map.get(&s.student_id)),
            content: s.content,
            attachment_ref: s.attachment_ref,
            status: s.status,
            is_late: s.is_late,
            submitted_at: s.submitted_at,
            points_earned: s.points_earned,
            feedback: s.feedback,
            graded_at: s.graded_at,
        })
        .collect();

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        SubmissionListResponse {
            items,
            pagination: PaginationInfo::new(page, size, total),
        },
        "获取提交列表成功",
    )))
}
