use chrono::{DateTime, Utc};

/// 时间源
///
/// 截止判定、迟交标记、批改时间都要与"现在"比较。时间源通过
/// app_data 注入，业务代码每次请求只取一次当前时间，测试里可以
/// 换成冻结的时钟。
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// 系统时钟
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// 固定时钟，测试专用
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
