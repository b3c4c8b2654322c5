use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::AssignmentService;
use crate::middlewares::RequireJWT;
use crate::models::assignments::requests::CreateAssignmentRequest;
use crate::models::assignments::responses::{AssignmentOwner, AssignmentView};
use crate::models::{ApiResponse, ErrorCode};
use crate::utils::validate::validate_create_assignment;

/// 创建作业
/// POST /assignments
pub async fn create_assignment(
    service: &AssignmentService,
    request: &HttpRequest,
    req: CreateAssignmentRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let clock = service.get_clock(request);

    // 获取当前用户信息（路由层已要求辅导老师角色）
    let owner = match RequireJWT::extract_user_claims(request) {
        Some(user) => user,
        None => {
            return Ok(HttpResponse::Unauthorized().json(ApiResponse::error_empty(
                ErrorCode::Unauthorized,
                "无法获取用户信息",
            )));
        }
    };

    // 边界校验一次，后续各层直接信任请求内容
    if let Err(message) = validate_create_assignment(&req) {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::ValidationFailed,
            message,
        )));
    }

    match storage.create_assignment(owner.id, req, clock.now()).await {
        Ok(assignment) => {
            let view = AssignmentView::from_assignment(
                assignment,
                AssignmentOwner {
                    id: owner.id,
                    username: owner.username,
                    display_name: owner.display_name,
                },
            );
            Ok(HttpResponse::Ok().json(ApiResponse::success(view, "创建作业成功")))
        }
        Err(e) => Ok(
            HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::InternalServerError,
                format!("创建作业失败: {e}"),
            )),
        ),
    }
}
