//! furumaru-bootstrap - 认证组件启动
//!
//! 从配置组装 token 签发器、校验器和 OIDC 校验器

mod infrastructure;
mod runtime;

pub use infrastructure::*;
pub use runtime::*;
