//! 时钟与 ID 生成器
//!
//! Token 组件不直接调用 `Utc::now()` / `Uuid::now_v7()`，而是通过这里的函数类型注入，
//! 测试时可以替换为固定或手动推进的实现。

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

/// 返回当前时间的函数
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// 返回唯一字符串的函数
pub type IdGenerator = Arc<dyn Fn() -> String + Send + Sync>;

/// 系统时钟
pub fn system_clock() -> Clock {
    Arc::new(Utc::now)
}

/// 固定时钟
pub fn fixed_clock(now: DateTime<Utc>) -> Clock {
    Arc::new(move || now)
}

/// UUID v7（时间有序）生成器
pub fn uuid_generator() -> IdGenerator {
    Arc::new(|| Uuid::now_v7().to_string())
}

/// 手动推进的时钟
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    /// 当前时间
    pub fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// 设置为指定时间
    pub fn set(&self, at: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = at;
    }

    /// 向前推进
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }

    /// 转换为可注入的 `Clock`，与本实例共享状态
    pub fn as_clock(&self) -> Clock {
        let this = self.clone();
        Arc::new(move || this.now())
    }
}
