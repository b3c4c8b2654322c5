use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// 业务错误码
///
/// 前端依赖这些数值做错误分支，只增不改。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/api.ts")]
pub enum ErrorCode {
    Success = 0,

    // 请求与参数
    BadRequest = 40000,

    // 认证与授权
    Unauthorized = 40100,
    Forbidden = 40300,

    // 资源不存在
    NotFound = 40400,
    UserNotFound = 40401,
    AssignmentNotFound = 40402,
    SubmissionNotFound = 40403,

    // 提交生命周期
    Conflict = 40900,
    AlreadyGraded = 40901,
    DeadlinePassed = 40902,

    // 校验
    ValidationFailed = 42200,
    ScoreOutOfRange = 42201,

    // 服务器
    InternalServerError = 50000,
}
