//! 以记录为单位的缓存访问
//!
//! 在字符串接口 `CachePort` 之上提供 insert / get / scan / batch_delete，
//! 记录以 JSON 序列化，key 为 `{table}:{primary_key}`，记录的 TTL 交给缓存实现处理。

use std::sync::Arc;
use std::time::Duration;

use furumaru_errors::{AppError, AppResult};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::CachePort;

/// 可存入缓存的记录
pub trait CacheRecord: Serialize + DeserializeOwned + Send + Sync {
    /// 表名，作为 key 前缀
    const TABLE: &'static str;

    /// 主键
    fn primary_key(&self) -> String;

    /// 缓存 TTL，None 表示不过期
    fn time_to_live(&self) -> Option<Duration> {
        None
    }
}

/// 记录缓存
#[derive(Clone)]
pub struct RecordCache {
    port: Arc<dyn CachePort>,
}

impl RecordCache {
    pub fn new(port: Arc<dyn CachePort>) -> Self {
        Self { port }
    }

    fn key<T: CacheRecord>(primary_key: &str) -> String {
        format!("{}:{}", T::TABLE, primary_key)
    }

    /// 写入记录（已存在则覆盖）
    pub async fn insert<T: CacheRecord>(&self, record: &T) -> AppResult<()> {
        let value = serde_json::to_string(record).map_err(|e| {
            AppError::internal(format!("Failed to serialize {} record: {}", T::TABLE, e))
        })?;

        self.port
            .set(&Self::key::<T>(&record.primary_key()), &value, record.time_to_live())
            .await
    }

    /// 按主键读取
    pub async fn get<T: CacheRecord>(&self, primary_key: &str) -> AppResult<Option<T>> {
        let Some(value) = self.port.get(&Self::key::<T>(primary_key)).await? else {
            return Ok(None);
        };

        serde_json::from_str(&value).map(Some).map_err(|e| {
            AppError::cache(format!("Corrupted {} record: {}", T::TABLE, e))
        })
    }

    /// 扫描整张表，返回满足 `filter` 的记录
    pub async fn scan<T, F>(&self, filter: F) -> AppResult<Vec<T>>
    where
        T: CacheRecord,
        F: Fn(&T) -> bool,
    {
        let values = self.port.scan_prefix(&format!("{}:", T::TABLE)).await?;

        let mut records = Vec::new();
        for value in values {
            let record: T = serde_json::from_str(&value).map_err(|e| {
                AppError::cache(format!("Corrupted {} record: {}", T::TABLE, e))
            })?;
            if filter(&record) {
                records.push(record);
            }
        }

        tracing::debug!(table = T::TABLE, matched = records.len(), "Cache scan finished");
        Ok(records)
    }

    /// 批量删除记录
    pub async fn batch_delete<T: CacheRecord>(&self, records: &[T]) -> AppResult<()> {
        if records.is_empty() {
            return Ok(());
        }

        let keys: Vec<String> = records
            .iter()
            .map(|r| Self::key::<T>(&r.primary_key()))
            .collect();

        self.port.delete_many(&keys).await
    }
}
