//! 认证基础设施
//!
//! Redis 和 OIDC discovery 只在启动时带重试连接，之后的请求不做重试。

use std::sync::Arc;
use std::time::Duration;

use furumaru_adapter_redis::{RedisCache, create_connection_manager};
use furumaru_auth_core::{
    JwtGenerator, JwtOptions, JwtVerifier, OidcOptions, OidcVerifier, RsaKeyPair,
};
use furumaru_common::{RetryConfig, with_retry};
use furumaru_config::{AppConfig, MAX_TOKEN_TTL_SECS};
use furumaru_errors::{AppError, AppResult};
use furumaru_ports::CachePort;
use secrecy::ExposeSecret;
use tracing::info;

/// 认证组件容器
pub struct AuthInfrastructure {
    config: AppConfig,
    cache: Arc<dyn CachePort>,
    generator: Arc<JwtGenerator>,
    verifier: Arc<JwtVerifier>,
    oidc: Option<Arc<OidcVerifier>>,
}

impl AuthInfrastructure {
    /// 从配置创建（连接 Redis，带重试）
    pub async fn from_config(config: AppConfig) -> AppResult<Self> {
        let retry_config = RetryConfig::default();

        let redis_url = config.redis.url.clone();
        let conn = with_retry(&retry_config, "Redis connection", || {
            let url = redis_url.expose_secret().clone();
            async move { create_connection_manager(&url).await }
        })
        .await?;
        info!("Redis connection created");

        let cache: Arc<dyn CachePort> =
            Arc::new(RedisCache::new(conn, config.redis.key_prefix.clone()));

        Self::with_cache(config, cache).await
    }

    /// 使用指定的缓存创建
    pub async fn with_cache(config: AppConfig, cache: Arc<dyn CachePort>) -> AppResult<Self> {
        let keys = RsaKeyPair::from_pem(config.jwt.private_key.expose_secret())?;
        let options = jwt_options(&config)?;

        let generator = Arc::new(JwtGenerator::new(options.clone(), &keys, cache.clone()));
        let verifier = Arc::new(JwtVerifier::new(&options, &keys, cache.clone()));
        info!(issuer = %options.issuer, "JWT generator and verifier created");

        let oidc = match &config.oidc {
            Some(oidc_config) => {
                let mut oidc_options =
                    OidcOptions::new(&oidc_config.issuer_url, &oidc_config.client_id);
                oidc_options.leeway = Duration::from_secs(oidc_config.leeway_secs);
                oidc_options.require_nonce = oidc_config.require_nonce;

                let verifier = with_retry(&RetryConfig::default(), "OIDC discovery", || {
                    OidcVerifier::discover(oidc_options.clone())
                })
                .await?;
                info!(issuer = %verifier.issuer(), "OIDC verifier created");
                Some(Arc::new(verifier))
            }
            None => {
                info!("OIDC not configured, skipping");
                None
            }
        };

        Ok(Self {
            config,
            cache,
            generator,
            verifier,
            oidc,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn cache(&self) -> Arc<dyn CachePort> {
        self.cache.clone()
    }

    pub fn generator(&self) -> Arc<JwtGenerator> {
        self.generator.clone()
    }

    pub fn verifier(&self) -> Arc<JwtVerifier> {
        self.verifier.clone()
    }

    /// OIDC 校验器（未配置时为 None）
    pub fn oidc_verifier(&self) -> Option<Arc<OidcVerifier>> {
        self.oidc.clone()
    }
}

fn jwt_options(config: &AppConfig) -> AppResult<JwtOptions> {
    Ok(JwtOptions::new(&config.jwt.issuer)
        .with_access_token_ttl(ttl("jwt.access_token_ttl_secs", config.jwt.access_token_ttl_secs)?)
        .with_refresh_token_ttl(ttl(
            "jwt.refresh_token_ttl_secs",
            config.jwt.refresh_token_ttl_secs,
        )?))
}

fn ttl(name: &str, secs: u64) -> AppResult<chrono::Duration> {
    i64::try_from(secs)
        .ok()
        .filter(|secs| (1..=MAX_TOKEN_TTL_SECS as i64).contains(secs))
        .and_then(chrono::Duration::try_seconds)
        .ok_or_else(|| AppError::validation(format!("{} is out of range: {}", name, secs)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use furumaru_config::{JwtConfig, RedisConfig, TelemetryConfig};
    use furumaru_ports::MemoryCache;
    use secrecy::Secret;

    const PRIVATE_KEY: &str =
        include_str!("../../crates/auth-core/tests/fixtures/private_pkcs8.pem");

    fn config(private_key: &str) -> AppConfig {
        AppConfig {
            app_name: "furumaru-user".to_string(),
            app_env: "test".to_string(),
            redis: RedisConfig {
                url: Secret::new("redis://127.0.0.1:6379".to_string()),
                key_prefix: "furumaru".to_string(),
            },
            jwt: JwtConfig {
                issuer: "https://api.furumaru.example".to_string(),
                private_key: Secret::new(private_key.to_string()),
                access_token_ttl_secs: 600,
                refresh_token_ttl_secs: 3600,
            },
            oidc: None,
            telemetry: TelemetryConfig::default(),
        }
    }

    #[tokio::test]
    async fn test_with_cache_wires_components() {
        let infra = AuthInfrastructure::with_cache(config(PRIVATE_KEY), Arc::new(MemoryCache::new()))
            .await
            .unwrap();

        let auth = infra.generator().generate("u1", "f1").await.unwrap();
        assert_eq!(auth.expires_in, 600);

        let claims = infra.verifier().verify_access_token(&auth.access_token).unwrap();
        assert_eq!(claims.iss, "https://api.furumaru.example");
        assert!(infra.verifier().verify_refresh_token(&auth.refresh_token).await.is_ok());
        assert!(infra.oidc_verifier().is_none());
    }

    #[tokio::test]
    async fn test_out_of_range_ttl_fails_startup() {
        let mut too_long = config(PRIVATE_KEY);
        too_long.jwt.access_token_ttl_secs = u64::MAX;

        let err = AuthInfrastructure::with_cache(too_long, Arc::new(MemoryCache::new()))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AppError::Validation(_)));

        // chrono 在这个量级会 panic，必须在构造前拒绝
        let mut overflow = config(PRIVATE_KEY);
        overflow.jwt.refresh_token_ttl_secs = i64::MAX as u64 / 100;
        let result = AuthInfrastructure::with_cache(overflow, Arc::new(MemoryCache::new())).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_invalid_private_key_fails_startup() {
        let result =
            AuthInfrastructure::with_cache(config("not a key"), Arc::new(MemoryCache::new())).await;

        let err = result.err().unwrap();
        assert!(err.is_server_error());
    }
}
