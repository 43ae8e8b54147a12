//! JWT 签发
//!
//! access token 由 RS256 自包含签名；refresh token 只在缓存中保存摘要和哈希。
//! 刷新 access token 时不轮换 refresh token，原 token 在自身过期前一直可用。

use std::sync::Arc;

use chrono::Duration;
use furumaru_common::{Clock, IdGenerator};
use furumaru_ports::{CachePort, RecordCache};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};

use crate::{Auth, AuthError, AuthResult, Claims, JwtOptions, RefreshToken, RsaKeyPair};

/// JWT 签发器
#[derive(Clone)]
pub struct JwtGenerator {
    issuer: String,
    encoding_key: EncodingKey,
    access_token_ttl: Duration,
    refresh_token_ttl: Duration,
    cache: RecordCache,
    clock: Clock,
    id_generator: IdGenerator,
}

impl JwtGenerator {
    pub fn new(options: JwtOptions, keys: &RsaKeyPair, cache: Arc<dyn CachePort>) -> Self {
        Self {
            issuer: options.issuer,
            encoding_key: keys.encoding_key().clone(),
            access_token_ttl: options.access_token_ttl,
            refresh_token_ttl: options.refresh_token_ttl,
            cache: RecordCache::new(cache),
            clock: options.clock,
            id_generator: options.id_generator,
        }
    }

    /// access token 有效期（秒）
    pub fn expires_in(&self) -> i64 {
        self.access_token_ttl.num_seconds()
    }

    /// 生成访问令牌
    pub fn generate_access_token(&self, subject: &str, facility_id: &str) -> AuthResult<String> {
        let now = (self.clock)();
        let claims = Claims {
            iss: self.issuer.clone(),
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: (now + self.access_token_ttl).timestamp(),
            jti: (self.id_generator)(),
            facility_id: facility_id.to_string(),
        };

        let token = encode(&Header::new(Algorithm::RS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Signing(e.to_string()))?;

        metrics::counter!("auth_tokens_issued_total", "kind" => "access").increment(1);
        Ok(token)
    }

    /// 生成刷新令牌，返回原始 token（缓存中只保存摘要和哈希）
    pub async fn generate_refresh_token(
        &self,
        subject: &str,
        facility_id: &str,
    ) -> AuthResult<String> {
        let mut record =
            RefreshToken::new(subject, facility_id, (self.clock)(), self.refresh_token_ttl)?;
        let token = record
            .take_token()
            .ok_or_else(|| AuthError::Hashing("refresh token was not generated".to_string()))?;

        self.cache.insert(&record).await.map_err(|e| {
            tracing::error!(user_id = %subject, error = %e, "Failed to store refresh token");
            AuthError::storage("failed to insert refresh token")(e)
        })?;

        metrics::counter!("auth_tokens_issued_total", "kind" => "refresh").increment(1);
        Ok(token)
    }

    /// 同时签发 access token 和 refresh token
    pub async fn generate(&self, subject: &str, facility_id: &str) -> AuthResult<Auth> {
        let access_token = self.generate_access_token(subject, facility_id)?;
        let refresh_token = self.generate_refresh_token(subject, facility_id).await?;

        tracing::info!(user_id = %subject, facility_id = %facility_id, "Issued token pair");

        Ok(Auth {
            access_token,
            refresh_token,
            expires_in: self.expires_in(),
        })
    }

    /// 用 refresh token 换取新的 access token
    ///
    /// 返回的 `Auth.refresh_token` 为空，调用方继续使用原 refresh token。
    pub async fn refresh_access_token(&self, refresh_token: &str) -> AuthResult<Auth> {
        if refresh_token.is_empty() {
            return Err(AuthError::InvalidArgument("refresh token is empty".to_string()));
        }

        let key = RefreshToken::digest(refresh_token);
        let record: RefreshToken = self
            .cache
            .get(&key)
            .await
            .map_err(AuthError::storage("failed to get refresh token"))?
            .ok_or_else(|| {
                tracing::debug!("Refresh token not found");
                AuthError::NotFound
            })?;

        let access_token = self.generate_access_token(&record.user_id, &record.facility_id)?;

        tracing::info!(user_id = %record.user_id, "Refreshed access token");

        Ok(Auth {
            access_token,
            refresh_token: String::new(),
            expires_in: self.expires_in(),
        })
    }

    /// 删除用户的所有 refresh token
    pub async fn delete_refresh_token(&self, user_id: &str) -> AuthResult<()> {
        let records: Vec<RefreshToken> = self
            .cache
            .scan(|r: &RefreshToken| r.user_id == user_id)
            .await
            .map_err(AuthError::storage("failed to scan refresh tokens"))?;

        if records.is_empty() {
            return Ok(());
        }

        self.cache
            .batch_delete(&records)
            .await
            .map_err(AuthError::storage("failed to delete refresh tokens"))?;

        tracing::info!(user_id = %user_id, count = records.len(), "Revoked refresh tokens");
        Ok(())
    }
}
