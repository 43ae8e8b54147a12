//! common - 通用类型和工具库
//!
//! 时钟 / ID 生成器注入点，以及启动阶段使用的重试工具

pub mod clock;
pub mod retry;

pub use clock::*;
pub use retry::*;
