use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use serde::Serialize;
use ts_rs::TS;

use crate::models::{ApiResponse, AppStartTime, ErrorCode};

/// 健康检查响应
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/system.ts")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: i64,
}

// 健康检查
pub async fn health(req: HttpRequest) -> ActixResult<HttpResponse> {
    let start_time = match req.app_data::<web::Data<AppStartTime>>() {
        Some(t) => t.get_ref(),
        None => {
            return Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    "启动时间未注册",
                )),
            );
        }
    };

    let uptime = chrono::Utc::now()
        .signed_duration_since(start_time.start_datetime)
        .num_seconds();

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        HealthResponse {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: uptime,
        },
        "服务正常",
    )))
}

pub fn configure_system_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/api/v1/system").service(web::resource("/health").route(web::get().to(health))));
}
