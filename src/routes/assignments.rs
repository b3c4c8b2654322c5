use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::assignments::requests::CreateAssignmentRequest;
use crate::models::submissions::requests::{SubmissionListParams, SubmitAssignmentRequest};
use crate::models::users::entities::UserRole;
use crate::services::{AssignmentService, SubmissionService};
use crate::utils::SafeAssignmentIdI64;

// 懒加载的全局服务实例
static ASSIGNMENT_SERVICE: Lazy<AssignmentService> = Lazy::new(AssignmentService::new_lazy);
static SUBMISSION_SERVICE: Lazy<SubmissionService> = Lazy::new(SubmissionService::new_lazy);

// 列出作业（业务层按角色返回不同视图）
pub async fn list_assignments(req: HttpRequest) -> ActixResult<HttpResponse> {
    ASSIGNMENT_SERVICE.list_assignments(&req).await
}

// 创建作业
pub async fn create_assignment(
    req: HttpRequest,
    body: web::Json<CreateAssignmentRequest>,
) -> ActixResult<HttpResponse> {
    ASSIGNMENT_SERVICE
        .create_assignment(&req, body.into_inner())
        .await
}

// 获取作业详情
pub async fn get_assignment(
    req: HttpRequest,
    path: SafeAssignmentIdI64,
) -> ActixResult<HttpResponse> {
    ASSIGNMENT_SERVICE.get_assignment(&req, path.0).await
}

// 提交作业
pub async fn submit_assignment(
    req: HttpRequest,
    path: SafeAssignmentIdI64,
    body: web::Json<SubmitAssignmentRequest>,
) -> ActixResult<HttpResponse> {
    SUBMISSION_SERVICE
        .submit_assignment(&req, path.0, body.into_inner())
        .await
}

// 列出某作业的提交
pub async fn list_submissions(
    req: HttpRequest,
    path: SafeAssignmentIdI64,
    query: web::Query<SubmissionListParams>,
) -> ActixResult<HttpResponse> {
    SUBMISSION_SERVICE
        .list_submissions(&req, path.0, query.into_inner())
        .await
}

// 获取本人提交
pub async fn get_my_submission(
    req: HttpRequest,
    path: SafeAssignmentIdI64,
) -> ActixResult<HttpResponse> {
    SUBMISSION_SERVICE.get_my_submission(&req, path.0).await
}

pub fn configure_assignments_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/assignments")
            .wrap(middlewares::RequireJWT)
            .service(
                web::resource("")
                    // 列出作业 - 所有登录用户可访问（业务层按角色过滤）
                    .route(web::get().to(list_assignments))
                    // 创建作业 - 仅辅导老师和管理员
                    .route(
                        web::post()
                            .to(create_assignment)
                            .wrap(middlewares::RequireRole::new_any(UserRole::tutor_roles())),
                    ),
            )
            .service(
                web::resource("/{id}")
                    // 获取作业详情 - 业务层校验班级归属/布置者
                    .route(web::get().to(get_assignment)),
            )
            .service(
                web::resource("/{id}/submissions")
                    // 提交作业 - 业务层校验角色与班级归属
                    .route(web::post().to(submit_assignment))
                    // 列出提交 - 仅辅导老师和管理员，归属在业务层校验
                    .route(
                        web::get()
                            .to(list_submissions)
                            .wrap(middlewares::RequireRole::new_any(UserRole::tutor_roles())),
                    ),
            )
            // 本人提交 - 所有登录用户可访问
            .service(web::resource("/{id}/submissions/my").route(web::get().to(get_my_submission))),
    );
}
