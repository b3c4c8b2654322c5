use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::collections::HashMap;
use std::sync::Arc;

use super::AssignmentService;
use crate::lifecycle;
use crate::middlewares::RequireJWT;
use crate::models::assignments::responses::{
    AssignmentOwner, AssignmentView, StudentAssignmentItem, StudentAssignmentListResponse,
    TutorAssignmentItem, TutorAssignmentListResponse,
};
use crate::models::submissions::entities::Submission;
use crate::models::submissions::responses::OwnSubmissionBrief;
use crate::models::users::entities::{User, UserRole};
use crate::models::{ApiResponse, ErrorCode};
use crate::storage::Storage;
use crate::utils::clock::Clock;

/// 列出作业
/// GET /assignments
///
/// 同一个入口按角色分流：学生看到所在班级的作业与自己的提交状态，
/// 辅导老师与管理员看到自己布置的作业与批改进度。
pub async fn list_assignments(
    service: &AssignmentService,
    request: &HttpRequest,
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

    match user.role {
        UserRole::Student => list_for_student(&storage, &clock, &user).await,
        UserRole::Tutor | UserRole::Admin => list_for_tutor(&storage, &user).await,
    }
}

/// 学生视角：班级作业 + 本人提交状态，截止时间最近的在最前
async fn list_for_student(
    storage: &Arc<dyn Storage>,
    clock: &Arc<dyn Clock>,
    user: &User,
) -> ActixResult<HttpResponse> {
    let now = clock.now();

    // 没有班级归属的账号看不到任何作业
    let cohort = match &user.cohort {
        Some(c) => c.clone(),
        None => {
            return Ok(HttpResponse::Ok().json(ApiResponse::success(
                StudentAssignmentListResponse { items: Vec::new() },
                "获取作业列表成功",
            )));
        }
    };

    let assignments = match storage.list_assignments_for_class(&cohort).await {
        Ok(list) => list,
        Err(e) => {
            return Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    format!("查询作业列表失败: {e}"),
                )),
            );
        }
    };

    let assignment_ids: Vec<i64> = assignments.iter().map(|a| a.id).collect();

    // 本人提交，按作业聚合
    let submission_map: HashMap<i64, Submission> = match storage
        .list_submissions_for_student(user.id, &assignment_ids)
        .await
    {
        Ok(list) => list.into_iter().map(|s| (s.assignment_id, s)).collect(),
        Err(e) => {
            return Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    format!("查询提交记录失败: {e}"),
                )),
            );
        }
    };

    // 布置者信息
    let owner_ids: Vec<i64> = assignments
        .iter()
        .map(|a| a.owner_id)
        .collect::<std::collections::HashSet<_>>()
        .into_iter()
        .collect();
    let owner_map = match storage.get_users_by_ids(&owner_ids).await {
        Ok(map) => map,
        Err(e) => {
            return Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    format!("查询布置者信息失败: {e}"),
                )),
            );
        }
    };

    let items: Vec<StudentAssignmentItem> = assignments
        .into_iter()
        .map(|assignment| {
            let submission = submission_map.get(&assignment.id);
            let view = lifecycle::compute_status(&assignment, submission, now);
            let owner = owner_map
                .get(&assignment.owner_id)
                .map(|u| AssignmentOwner {
                    id: u.id,
                    username: u.username.clone(),
                    display_name: u.display_name.clone(),
                })
                .unwrap_or(AssignmentOwner {
                    id: assignment.owner_id,
                    username: "未知用户".to_string(),
                    display_name: None,
                });

            StudentAssignmentItem {
                status: view.status,
                is_overdue: view.is_overdue,
                my_submission: submission.map(OwnSubmissionBrief::from),
                assignment: AssignmentView::from_assignment(assignment, owner),
            }
        })
        .collect();

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        StudentAssignmentListResponse { items },
        "获取作业列表成功",
    )))
}

/// 辅导老师视角：自己布置的作业与批改进度
async fn list_for_tutor(storage: &Arc<dyn Storage>, user: &User) -> ActixResult<HttpResponse> {
    let assignments = match storage.list_assignments_by_owner(user.id).await {
        Ok(list) => list,
        Err(e) => {
            return Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    format!("查询作业列表失败: {e}"),
                )),
            );
        }
    };

    let assignment_ids: Vec<i64> = assignments.iter().map(|a| a.id).collect();
    let tallies = match storage.tally_submissions(&assignment_ids).await {
        Ok(map) => map,
        Err(e) => {
            return Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    format!("统计提交进度失败: {e}"),
                )),
            );
        }
    };

    let owner = AssignmentOwner {
        id: user.id,
        username: user.username.clone(),
        display_name: user.display_name.clone(),
    };

    let items: Vec<TutorAssignmentItem> = assignments
        .into_iter()
        .map(|assignment| {
            let tally = tallies.get(&assignment.id).copied().unwrap_or_default();
            TutorAssignmentItem {
                submission_count: tally.submitted,
                graded_count: tally.graded,
                pending_grading: tally.submitted - tally.graded,
                assignment: AssignmentView::from_assignment(
                    assignment,
                    AssignmentOwner {
                        id: owner.id,
                        username: owner.username.clone(),
                        display_name: owner.display_name.clone(),
                    },
                ),
            }
        })
        .collect();

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        TutorAssignmentListResponse { items },
        "获取作业列表成功",
    )))
}
