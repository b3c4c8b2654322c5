//! 类型安全的路径参数提取器
//!
//! 路径里的 ID 解析失败时直接返回结构化的 400 响应，处理函数
//! 拿到的一定是正整数。

use actix_web::error::InternalError;
use actix_web::{FromRequest, HttpRequest, HttpResponse, dev::Payload};
use futures_util::future::{Ready, ready};

use crate::models::{ApiResponse, ErrorCode};

macro_rules! define_safe_id_extractor {
    ($name:ident, $param:literal, $message:literal) => {
        pub struct $name(pub i64);

        impl FromRequest for $name {
            type Error = actix_web::Error;
            type Future = Ready<Result<Self, Self::Error>>;

            fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
                let parsed = req.match_info().query($param).parse::<i64>();
                ready(match parsed {
                    Ok(id) if id > 0 => Ok($name(id)),
                    _ => {
                        let response = HttpResponse::BadRequest()
                            .json(ApiResponse::error_empty(ErrorCode::BadRequest, $message));
                        Err(InternalError::from_response($message, response).into())
                    }
                })
            }
        }
    };
}

define_safe_id_extractor!(SafeAssignmentIdI64, "id", "无效的作业 ID");
define_safe_id_extractor!(SafeSubmissionIdI64, "id", "无效的提交 ID");
