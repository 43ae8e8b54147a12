//! furumaru-auth-core - 认证核心库
//!
//! 自家 JWT（RS256）签发与校验、refresh token 管理，以及外部 OIDC ID token 校验

mod claims;
mod error;
mod generator;
mod keys;
mod oidc;
mod options;
mod refresh_token;
mod verifier;

#[cfg(test)]
mod test_keys;

pub use claims::{Auth, Claims};
pub use error::{AuthError, AuthResult};
pub use generator::JwtGenerator;
pub use keys::{MIN_RSA_KEY_BITS, RsaKeyPair, decoding_key_from_public_pem};
pub use oidc::{Audience, IdTokenClaims, OidcOptions, OidcVerifier, ProviderMetadata};
pub use options::{JwtOptions, default_access_token_ttl, default_refresh_token_ttl};
pub use refresh_token::{REFRESH_TOKEN_BYTES, RefreshToken};
pub use verifier::JwtVerifier;
