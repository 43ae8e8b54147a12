//! Refresh Token 实体
//!
//! 两种哈希：SHA-256 摘要作为查找主键（确定性），argon2 哈希用于校验（加盐、慢）。
//! 原始 token 只在刚创建时保存在内存中，不会被序列化。

use std::fmt;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use furumaru_ports::CacheRecord;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{AuthError, AuthResult};

/// 原始 token 的随机字节数
pub const REFRESH_TOKEN_BYTES: usize = 32;

/// Refresh Token
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshToken {
    #[serde(skip)]
    token: Option<String>,
    /// 原始 token 的 SHA-256 摘要（主键）
    pub key: String,
    /// 原始 token 的 argon2 哈希
    pub hashed_token: String,
    pub user_id: String,
    pub facility_id: String,
    pub expired_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RefreshToken {
    /// 生成新的 Refresh Token
    pub fn new(
        user_id: impl Into<String>,
        facility_id: impl Into<String>,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> AuthResult<Self> {
        let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        let token = URL_SAFE_NO_PAD.encode(bytes);

        let salt = SaltString::generate(&mut OsRng);
        let hashed_token = Argon2::default()
            .hash_password(token.as_bytes(), &salt)
            .map_err(|e| AuthError::Hashing(e.to_string()))?
            .to_string();

        Ok(Self {
            key: Self::digest(&token),
            token: Some(token),
            hashed_token,
            user_id: user_id.into(),
            facility_id: facility_id.into(),
            expired_at: now + ttl,
            created_at: now,
            updated_at: now,
        })
    }

    /// 计算原始 token 的 SHA-256 摘要（十六进制）
    pub fn digest(token: &str) -> String {
        hex::encode(Sha256::digest(token.as_bytes()))
    }

    /// 原始 token，只有刚创建的实例才有
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// 取出原始 token
    pub fn take_token(&mut self) -> Option<String> {
        self.token.take()
    }

    /// 校验提交的 token 是否与存储的哈希一致
    pub fn verify(&self, candidate: &str) -> AuthResult<()> {
        if candidate.is_empty() {
            return Err(AuthError::InvalidToken("refresh token is empty".to_string()));
        }

        let parsed = PasswordHash::new(&self.hashed_token)
            .map_err(|e| AuthError::InvalidToken(format!("malformed stored hash: {}", e)))?;

        Argon2::default()
            .verify_password(candidate.as_bytes(), &parsed)
            .map_err(|_| AuthError::InvalidToken("refresh token mismatch".to_string()))
    }

    /// 检查是否过期
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expired_at
    }

    /// 剩余有效时间
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.expired_at - now).max(Duration::zero())
    }
}

impl CacheRecord for RefreshToken {
    const TABLE: &'static str = "refresh-tokens";

    fn primary_key(&self) -> String {
        self.key.clone()
    }

    /// 缓存过期时间与记录的有效期一致
    fn time_to_live(&self) -> Option<std::time::Duration> {
        let ttl = (self.expired_at - self.created_at).to_std().unwrap_or_default();
        Some(ttl.max(std::time::Duration::from_secs(1)))
    }
}

impl fmt::Debug for RefreshToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshToken")
            .field("key", &self.key)
            .field("user_id", &self.user_id)
            .field("facility_id", &self.facility_id)
            .field("expired_at", &self.expired_at)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn token() -> RefreshToken {
        RefreshToken::new("u1", "f1", now(), Duration::days(14)).unwrap()
    }

    #[test]
    fn test_new_sets_fields() {
        let rt = token();
        let raw = rt.token().unwrap();

        assert_eq!(raw.len(), 43);
        assert_eq!(rt.key, RefreshToken::digest(raw));
        assert_ne!(rt.hashed_token, raw);
        assert!(rt.hashed_token.starts_with("$argon2"));
        assert_eq!(rt.expired_at, now() + Duration::days(14));
        assert_eq!(rt.created_at, now());
        assert_eq!(rt.updated_at, now());
        assert_eq!(rt.time_to_live(), Some(std::time::Duration::from_secs(14 * 24 * 3600)));
    }

    #[test]
    fn test_digest_is_deterministic() {
        let a = RefreshToken::digest("raw-token");
        let b = RefreshToken::digest("raw-token");

        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, RefreshToken::digest("raw-token2"));
    }

    #[test]
    fn test_generated_tokens_are_distinct() {
        let a = token();
        let b = token();

        assert_ne!(a.token(), b.token());
        assert_ne!(a.key, b.key);
    }

    #[test]
    fn test_verify() {
        let rt = token();
        let raw = rt.token().unwrap().to_string();

        assert!(rt.verify(&raw).is_ok());
        assert!(matches!(rt.verify("wrong"), Err(AuthError::InvalidToken(_))));
        assert!(matches!(rt.verify(""), Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn test_serialized_record_has_no_raw_token() {
        let mut rt = token();
        let json = serde_json::to_string(&rt).unwrap();
        let raw = rt.take_token().unwrap();

        assert!(!json.contains(&raw));
        assert!(json.contains("hashedToken"));
        assert!(json.contains("expiredAt"));

        let restored: RefreshToken = serde_json::from_str(&json).unwrap();
        assert!(restored.token().is_none());
        assert!(restored.verify(&raw).is_ok());
        assert!(rt.token().is_none());
    }

    #[test]
    fn test_expiry() {
        let rt = token();

        assert!(!rt.is_expired(now()));
        assert!(!rt.is_expired(rt.expired_at));
        assert!(rt.is_expired(rt.expired_at + Duration::seconds(1)));
        assert_eq!(rt.remaining(now()), Duration::days(14));
        assert_eq!(rt.remaining(rt.expired_at + Duration::days(1)), Duration::zero());
    }

    #[test]
    fn test_debug_hides_secrets() {
        let rt = token();
        let output = format!("{:?}", rt);

        assert!(!output.contains(rt.token().unwrap()));
        assert!(!output.contains(&rt.hashed_token));
    }
}
