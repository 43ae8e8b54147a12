//! Cache trait 定义

use async_trait::async_trait;
use furumaru_errors::AppResult;
use std::time::Duration;

/// 缓存 trait
///
/// 只要求单个 key 的读写是原子的，不提供事务。
#[async_trait]
pub trait CachePort: Send + Sync {
    /// 获取缓存值
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// 设置缓存值，`ttl` 为 None 时永不过期
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> AppResult<()>;

    /// 返回所有 key 以 `prefix` 开头的值
    async fn scan_prefix(&self, prefix: &str) -> AppResult<Vec<String>>;

    /// 批量删除，不存在的 key 忽略
    async fn delete_many(&self, keys: &[String]) -> AppResult<()>;
}
