use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::submissions::requests::GradeSubmissionRequest;
use crate::models::users::entities::UserRole;
use crate::services::SubmissionService;
use crate::utils::SafeSubmissionIdI64;

// 懒加载的全局 SubmissionService 实例
static SUBMISSION_SERVICE: Lazy<SubmissionService> = Lazy::new(SubmissionService::new_lazy);

// 批改提交
pub async fn grade_submission(
    req: HttpRequest,
    path: SafeSubmissionIdI64,
    body: web::Json<GradeSubmissionRequest>,
) -> ActixResult<HttpResponse> {
    SUBMISSION_SERVICE
        .grade_submission(&req, path.0, body.into_inner())
        .await
}

pub fn configure_submissions_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/submissions")
            .wrap(middlewares::RequireJWT)
            .service(
                web::resource("/{id}/grade")
                    // 批改 - 仅辅导老师和管理员，归属校验在业务层
                    .route(
                        web::post()
                            .to(grade_submission)
                            .wrap(middlewares::RequireRole::new_any(UserRole::tutor_roles())),
                    ),
            ),
    );
}
