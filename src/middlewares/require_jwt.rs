/*!
 * JWT 认证中间件
 *
 * 验证请求携带的 JWT 令牌。令牌由外部身份服务签发，Claims 自带
 * 角色与班级信息，验证通过后用户身份写入请求扩展，后续处理程序
 * 与授权中间件直接读取，不再访问存储。
 *
 * ## 使用方法
 *
 * 1. 在路由上应用中间件：
 * ```rust,ignore
 * web::scope("/api/v1/assignments")
 *     .wrap(RequireJWT)
 *     .route("", web::get().to(list_assignments))
 * ```
 *
 * 2. 在处理程序中提取用户信息：
 * ```rust,ignore
 * async fn handler(req: HttpRequest) -> Result<HttpResponse> {
 *     if let Some(user) = RequireJWT::extract_user_claims(&req) {
 *         // user.id / user.role / user.cohort
 *     }
 *     ...
 * }
 * ```
 *
 * ## 认证流程
 *
 * 1. 客户端在请求头中包含 `Authorization: Bearer <JWT_TOKEN>`
 * 2. 中间件校验令牌签名与有效期
 * 3. 令牌有效则将用户身份存入请求扩展，继续处理请求
 * 4. 令牌无效或缺失则返回 401
 */

use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage, HttpRequest,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::rc::Rc;
use std::task::{Context, Poll};
use tracing::info;

use crate::models::ErrorCode;
use crate::models::users::entities::{User, UserRole};
use crate::utils::jwt::JwtUtils;

use super::create_error_response;

const BEARER_PREFIX: &str = "Bearer ";
const AUTHORIZATION_HEADER: &str = "Authorization";

#[derive(Clone)]
pub struct RequireJWT;

impl RequireJWT {
    /// 从请求扩展中提取完整的用户身份
    pub fn extract_user_claims(req: &HttpRequest) -> Option<User> {
        req.extensions().get::<User>().cloned()
    }

    /// 从请求扩展中提取用户 ID
    pub fn extract_user_id(req: &HttpRequest) -> Option<i64> {
        req.extensions().get::<User>().map(|u| u.id)
    }

    /// 检查用户是否具有任一角色
    pub fn has_any_role(req: &HttpRequest, roles: &[&UserRole]) -> bool {
        req.extensions()
            .get::<User>()
            .is_some_and(|u| roles.contains(&&u.role))
    }
}

// 辅助函数：提取并验证 JWT access token
fn extract_and_verify_jwt(req: &ServiceRequest) -> Result<User, String> {
    let token = req
        .headers()
        .get(AUTHORIZATION_HEADER)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix(BEARER_PREFIX))
        .ok_or_else(|| "Missing or invalid Authorization header".to_string())?;

    let claims = JwtUtils::verify_token(token).map_err(|err| {
        info!("JWT token validation failed: {}", err);
        "Invalid JWT token".to_string()
    })?;

    claims
        .into_user()
        .ok_or_else(|| "Invalid JWT subject".to_string())
}

impl<S, B> Transform<S, ServiceRequest> for RequireJWT
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RequireJWTMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireJWTMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct RequireJWTMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequireJWTMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, ctx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            match extract_and_verify_jwt(&req) {
                Ok(user) => {
                    req.extensions_mut().insert(user);
                    let res = service.call(req).await?;
                    Ok(res.map_into_left_body())
                }
                Err(message) => {
                    let response = create_error_response(
                        StatusCode::UNAUTHORIZED,
                        ErrorCode::Unauthorized,
                        &message,
                    );
                    Ok(req.into_response(response).map_into_right_body())
                }
            }
        })
    }
}
