//! Token 组件配置

use std::fmt;

use chrono::Duration;
use furumaru_common::{Clock, IdGenerator, system_clock, uuid_generator};

/// access token 默认有效期：30 分钟
pub fn default_access_token_ttl() -> Duration {
    Duration::minutes(30)
}

/// refresh token 默认有效期：14 天
pub fn default_refresh_token_ttl() -> Duration {
    Duration::days(14)
}

/// JWT generator / verifier 共用的配置
///
/// `clock` 和 `id_generator` 默认使用系统时间和 UUID v7，测试时替换。
#[derive(Clone)]
pub struct JwtOptions {
    /// `iss` claim，签发与校验必须一致
    pub issuer: String,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    pub clock: Clock,
    /// 生成 `jti`
    pub id_generator: IdGenerator,
}

impl JwtOptions {
    pub fn new(issuer: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            access_token_ttl: default_access_token_ttl(),
            refresh_token_ttl: default_refresh_token_ttl(),
            clock: system_clock(),
            id_generator: uuid_generator(),
        }
    }

    pub fn with_access_token_ttl(mut self, ttl: Duration) -> Self {
        self.access_token_ttl = ttl;
        self
    }

    pub fn with_refresh_token_ttl(mut self, ttl: Duration) -> Self {
        self.refresh_token_ttl = ttl;
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_id_generator(mut self, id_generator: IdGenerator) -> Self {
        self.id_generator = id_generator;
        self
    }
}

impl fmt::Debug for JwtOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtOptions")
            .field("issuer", &self.issuer)
            .field("access_token_ttl", &self.access_token_ttl)
            .field("refresh_token_ttl", &self.refresh_token_ttl)
            .finish_non_exhaustive()
    }
}
