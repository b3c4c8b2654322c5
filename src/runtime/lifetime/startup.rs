use std::sync::Arc;

use tracing::{error, warn};

use crate::storage::{Storage, create_storage};
use crate::utils::clock::{Clock, SystemClock};

pub struct StartupContext {
    pub storage: Arc<dyn Storage>,
    pub clock: Arc<dyn Clock>,
}

/// 服务器启动前的准备工作
///
/// 初始化存储（必要时运行迁移）并装配时间源。用户数据由外部
/// 身份服务维护，这里不做任何种子写入。
pub async fn prepare_server_startup() -> StartupContext {
    let storage = match create_storage().await {
        Ok(storage) => {
            warn!("Storage backend initialized");
            storage
        }
        Err(e) => {
            error!("Failed to initialize storage: {}", e);
            std::process::exit(1);
        }
    };

    StartupContext {
        storage,
        clock: Arc::new(SystemClock),
    }
}
