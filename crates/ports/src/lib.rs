//! ports - 抽象 trait 层
//!
//! 定义 token 组件依赖的缓存接口，以及进程内实现

mod cache;
mod memory;
mod record;

pub use cache::*;
pub use memory::*;
pub use record::*;
