//! JWT 校验

use std::sync::Arc;

use furumaru_common::Clock;
use furumaru_ports::{CachePort, RecordCache};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

use crate::{AuthError, AuthResult, Claims, JwtOptions, RefreshToken, RsaKeyPair};

/// JWT 校验器
#[derive(Clone)]
pub struct JwtVerifier {
    issuer: String,
    decoding_key: DecodingKey,
    cache: RecordCache,
    clock: Clock,
}

impl JwtVerifier {
    pub fn new(options: &JwtOptions, keys: &RsaKeyPair, cache: Arc<dyn CachePort>) -> Self {
        Self::with_decoding_key(options, keys.decoding_key().clone(), cache)
    }

    /// 只持有公钥的校验器
    pub fn with_decoding_key(
        options: &JwtOptions,
        decoding_key: DecodingKey,
        cache: Arc<dyn CachePort>,
    ) -> Self {
        Self {
            issuer: options.issuer.clone(),
            decoding_key,
            cache: RecordCache::new(cache),
            clock: options.clock.clone(),
        }
    }

    fn validation(&self) -> Validation {
        // 只接受 RS256，防止算法混淆
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["iss", "sub", "iat", "exp"]);
        validation.validate_aud = false;
        // 时间相关的检查使用注入的时钟
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.leeway = 0;
        validation
    }

    /// 校验访问令牌
    pub fn verify_access_token(&self, token: &str) -> AuthResult<Claims> {
        let result = self.decode_access_token(token);

        let label = if result.is_ok() { "ok" } else { "invalid" };
        metrics::counter!("auth_token_verifications_total", "kind" => "access", "result" => label)
            .increment(1);

        result.inspect_err(|e| tracing::debug!(error = %e, "Access token rejected"))
    }

    fn decode_access_token(&self, token: &str) -> AuthResult<Claims> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation())
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?
            .claims;

        let now = (self.clock)().timestamp();
        if claims.iat > now {
            return Err(AuthError::InvalidToken("token used before issued".to_string()));
        }
        if now > claims.exp {
            return Err(AuthError::InvalidToken("token is expired".to_string()));
        }

        Ok(claims)
    }

    /// 校验刷新令牌
    ///
    /// 依次检查：记录是否存在、哈希是否一致、是否过期
    pub async fn verify_refresh_token(&self, token: &str) -> AuthResult<RefreshToken> {
        let result = self.check_refresh_token(token).await;

        let label = match &result {
            Ok(_) => "ok",
            Err(e) if e.is_expired() => "expired",
            Err(AuthError::Storage { .. }) => "error",
            Err(_) => "invalid",
        };
        metrics::counter!("auth_token_verifications_total", "kind" => "refresh", "result" => label)
            .increment(1);

        result
    }

    async fn check_refresh_token(&self, token: &str) -> AuthResult<RefreshToken> {
        let key = RefreshToken::digest(token);
        let record: RefreshToken = self
            .cache
            .get(&key)
            .await
            .map_err(AuthError::storage("failed to get refresh token"))?
            .ok_or(AuthError::NotFound)?;

        record.verify(token)?;

        if record.is_expired((self.clock)()) {
            tracing::debug!(user_id = %record.user_id, expired_at = %record.expired_at, "Refresh token expired");
            return Err(AuthError::TokenExpired);
        }

        Ok(record)
    }
}
