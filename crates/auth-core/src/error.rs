//! 认证错误

use furumaru_errors::AppError;
use thiserror::Error;

/// 认证错误
#[derive(Debug, Error)]
pub enum AuthError {
    /// 密钥或 provider 配置错误，只在构造时出现
    #[error("auth: invalid configuration: {0}")]
    Configuration(String),

    #[error("oidc: discovery failed: {0}")]
    Discovery(String),

    #[error("jwt: invalid argument: {0}")]
    InvalidArgument(String),

    #[error("jwt: invalid token: {0}")]
    InvalidToken(String),

    #[error("oidc: invalid id token: {0}")]
    InvalidIdToken(String),

    #[error("oidc: invalid nonce")]
    InvalidNonce,

    #[error("jwt: refresh token is expired")]
    TokenExpired,

    #[error("jwt: refresh token not found")]
    NotFound,

    #[error("jwt: failed to hash refresh token: {0}")]
    Hashing(String),

    #[error("jwt: failed to sign token: {0}")]
    Signing(String),

    #[error("jwt: {context}: {source}")]
    Storage {
        context: &'static str,
        #[source]
        source: AppError,
    },
}

impl AuthError {
    /// 给缓存错误加上下文，配合 `map_err` 使用
    pub fn storage(context: &'static str) -> impl FnOnce(AppError) -> Self {
        move |source| Self::Storage { context, source }
    }

    /// 是否需要重新登录（token 本身已失效）
    pub fn is_unauthenticated(&self) -> bool {
        matches!(
            self,
            Self::InvalidToken(_)
                | Self::InvalidIdToken(_)
                | Self::InvalidNonce
                | Self::TokenExpired
                | Self::NotFound
        )
    }

    pub fn is_expired(&self) -> bool {
        matches!(self, Self::TokenExpired)
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidArgument(msg) => AppError::validation(msg),
            AuthError::InvalidToken(_)
            | AuthError::InvalidIdToken(_)
            | AuthError::InvalidNonce
            | AuthError::TokenExpired
            | AuthError::NotFound => AppError::unauthorized(err.to_string()),
            AuthError::Storage { context, source } => {
                AppError::cache(format!("{}: {}", context, source))
            }
            AuthError::Discovery(msg) => AppError::external_service(msg),
            AuthError::Configuration(_) | AuthError::Hashing(_) | AuthError::Signing(_) => {
                AppError::internal(err.to_string())
            }
        }
    }
}

/// Result 类型别名
pub type AuthResult<T> = Result<T, AuthError>;
