//! furumaru-config - 配置加载库
//!
//! 进程启动时加载一次，运行期间不重新加载。

use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::Deserialize;
use thiserror::Error;

use secrecy::{ExposeSecret, Secret};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    Load(#[from] figment::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// 环境变量前缀，嵌套字段用 `__` 分隔，例如 `FURUMARU_JWT__ISSUER`
pub const ENV_PREFIX: &str = "FURUMARU_";

/// Redis 配置
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: Secret<String>,
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

fn default_key_prefix() -> String {
    "furumaru".to_string()
}

/// JWT 配置
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    /// `iss` claim
    pub issuer: String,
    /// RSA 私钥（PEM，PKCS#1 或 PKCS#8）
    pub private_key: Secret<String>,
    #[serde(default = "default_access_token_ttl_secs")]
    pub access_token_ttl_secs: u64,
    #[serde(default = "default_refresh_token_ttl_secs")]
    pub refresh_token_ttl_secs: u64,
}

fn default_access_token_ttl_secs() -> u64 {
    30 * 60
}

fn default_refresh_token_ttl_secs() -> u64 {
    14 * 24 * 60 * 60
}

/// token TTL 上限：366 天
pub const MAX_TOKEN_TTL_SECS: u64 = 366 * 24 * 60 * 60;

/// 外部 OIDC provider 配置（LINE）
#[derive(Debug, Clone, Deserialize)]
pub struct OidcConfig {
    #[serde(default = "default_oidc_issuer_url")]
    pub issuer_url: String,
    /// channel ID，作为 `aud` 校验
    pub client_id: String,
    /// 允许的时钟偏差（秒）
    #[serde(default = "default_oidc_leeway_secs")]
    pub leeway_secs: u64,
    /// 拒绝未携带 nonce 的校验请求
    #[serde(default)]
    pub require_nonce: bool,
}

fn default_oidc_issuer_url() -> String {
    "https://access.line.me".to_string()
}

fn default_oidc_leeway_secs() -> u64 {
    300
}

/// 遥测配置
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// 输出 JSON 格式日志（生产环境）
    #[serde(default)]
    pub json: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// 应用配置
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app_name: String,
    pub app_env: String,
    pub redis: RedisConfig,
    pub jwt: JwtConfig,
    pub oidc: Option<OidcConfig>,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    ///
    /// 优先级：环境变量 > `{APP_ENV}.toml` > `default.toml`
    pub fn load(config_dir: &str) -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config: Self = Figment::new()
            .merge(Toml::file(format!("{}/default.toml", config_dir)))
            .merge(Toml::file(format!("{}/{}.toml", config_dir, env)))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt.issuer.trim().is_empty() {
            return Err(ConfigError::Invalid("jwt.issuer must not be empty".to_string()));
        }
        if self.jwt.private_key.expose_secret().trim().is_empty() {
            return Err(ConfigError::Invalid("jwt.private_key must not be empty".to_string()));
        }
        if self.jwt.access_token_ttl_secs == 0 || self.jwt.refresh_token_ttl_secs == 0 {
            return Err(ConfigError::Invalid("jwt token TTLs must be positive".to_string()));
        }
        if self.jwt.access_token_ttl_secs > MAX_TOKEN_TTL_SECS
            || self.jwt.refresh_token_ttl_secs > MAX_TOKEN_TTL_SECS
        {
            return Err(ConfigError::Invalid(format!(
                "jwt token TTLs must not exceed {} seconds",
                MAX_TOKEN_TTL_SECS
            )));
        }
        if let Some(oidc) = &self.oidc {
            if oidc.client_id.trim().is_empty() {
                return Err(ConfigError::Invalid("oidc.client_id must not be empty".to_string()));
            }
        }
        Ok(())
    }

    /// 是否为生产环境
    pub fn is_production(&self) -> bool {
        self.app_env == "production"
    }
}
