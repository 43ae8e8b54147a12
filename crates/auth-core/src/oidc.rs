//! 外部 OIDC provider（LINE）ID token 校验
//!
//! 构造时执行 discovery 并拉取 JWKS。遇到未知 `kid` 时重新拉取一次 JWKS，
//! 两次拉取之间至少间隔 `jwks_refresh_interval`，防止伪造 `kid` 触发大量请求。

use std::str::FromStr;
use std::time::{Duration, Instant};

use jsonwebtoken::jwk::{AlgorithmParameters, Jwk, JwkSet};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::{AuthError, AuthResult};

const DISCOVERY_PATH: &str = "/.well-known/openid-configuration";

/// OIDC verifier 配置
#[derive(Debug, Clone)]
pub struct OidcOptions {
    pub issuer_url: String,
    /// `aud` 必须包含的 client ID
    pub client_id: String,
    /// 时钟偏差容忍
    pub leeway: Duration,
    pub jwks_refresh_interval: Duration,
    /// 为 true 时空 nonce 视为校验失败；默认 false，空 nonce 跳过检查
    pub require_nonce: bool,
}

impl OidcOptions {
    pub fn new(issuer_url: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            issuer_url: issuer_url.into(),
            client_id: client_id.into(),
            leeway: Duration::from_secs(300),
            jwks_refresh_interval: Duration::from_secs(60),
            require_nonce: false,
        }
    }
}

/// OpenID Provider Metadata（只取需要的字段）
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderMetadata {
    pub issuer: String,
    pub jwks_uri: String,
    #[serde(default)]
    pub id_token_signing_alg_values_supported: Vec<String>,
}

/// `aud` 可以是字符串或数组
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    Single(String),
    Multiple(Vec<String>),
}

impl Audience {
    pub fn contains(&self, client_id: &str) -> bool {
        match self {
            Self::Single(aud) => aud == client_id,
            Self::Multiple(auds) => auds.iter().any(|aud| aud == client_id),
        }
    }
}

/// ID token claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdTokenClaims {
    pub iss: String,
    pub sub: String,
    pub aud: Audience,
    pub exp: i64,
    pub iat: i64,
    #[serde(default)]
    pub nonce: Option<String>,
    /// 认证方式，例如 `["pwd"]`、`["lineautologin"]`
    #[serde(default)]
    pub amr: Vec<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

struct KeySet {
    jwks: JwkSet,
    fetched_at: Instant,
}

/// OIDC ID token 校验器
pub struct OidcVerifier {
    options: OidcOptions,
    metadata: ProviderMetadata,
    algorithms: Vec<Algorithm>,
    http: reqwest::Client,
    keys: RwLock<KeySet>,
}

impl OidcVerifier {
    /// 执行 discovery 并创建校验器
    pub async fn discover(options: OidcOptions) -> AuthResult<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AuthError::Discovery(format!("failed to build http client: {}", e)))?;

        Self::discover_with_client(options, http).await
    }

    /// 使用指定的 HTTP client 执行 discovery
    pub async fn discover_with_client(
        options: OidcOptions,
        http: reqwest::Client,
    ) -> AuthResult<Self> {
        let issuer_url = options.issuer_url.trim_end_matches('/');
        let metadata: ProviderMetadata =
            fetch_json(&http, &format!("{}{}", issuer_url, DISCOVERY_PATH)).await?;

        if metadata.issuer.trim_end_matches('/') != issuer_url {
            return Err(AuthError::Discovery(format!(
                "issuer did not match: expected {}, got {}",
                issuer_url, metadata.issuer
            )));
        }

        let algorithms = signing_algorithms(&metadata.id_token_signing_alg_values_supported)?;
        let jwks: JwkSet = fetch_json(&http, &metadata.jwks_uri).await?;

        tracing::info!(
            issuer = %metadata.issuer,
            keys = jwks.keys.len(),
            "OIDC provider discovered"
        );

        Ok(Self {
            options,
            metadata,
            algorithms,
            http,
            keys: RwLock::new(KeySet {
                jwks,
                fetched_at: Instant::now(),
            }),
        })
    }

    pub fn issuer(&self) -> &str {
        &self.metadata.issuer
    }

    /// 校验 ID token
    ///
    /// `nonce` 为空时跳过 nonce 检查（`require_nonce` 开启时直接拒绝）。
    /// 需要防重放的调用方必须传入 nonce。
    pub async fn verify_id_token(&self, id_token: &str, nonce: &str) -> AuthResult<IdTokenClaims> {
        if nonce.is_empty() && self.options.require_nonce {
            return Err(AuthError::InvalidNonce);
        }

        let header = decode_header(id_token)
            .map_err(|e| AuthError::InvalidIdToken(format!("malformed token: {}", e)))?;

        if !self.algorithms.contains(&header.alg) {
            return Err(AuthError::InvalidIdToken(format!(
                "unexpected signing algorithm {:?}",
                header.alg
            )));
        }

        let jwk = self.find_key(header.kid.as_deref()).await?;
        if !key_matches_algorithm(&jwk, header.alg) {
            return Err(AuthError::InvalidIdToken(format!(
                "provider key type does not match algorithm {:?}",
                header.alg
            )));
        }
        let decoding_key = DecodingKey::from_jwk(&jwk)
            .map_err(|e| AuthError::InvalidIdToken(format!("unusable provider key: {}", e)))?;

        // 只放行 header 中的算法，provider 可能同时公布 RSA 和 EC 算法
        let mut validation = Validation::new(header.alg);
        validation.set_issuer(&[&self.metadata.issuer]);
        validation.set_audience(&[&self.options.client_id]);
        validation.set_required_spec_claims(&["iss", "sub", "aud", "exp"]);
        validation.leeway = self.options.leeway.as_secs();

        let claims = decode::<IdTokenClaims>(id_token, &decoding_key, &validation)
            .map_err(|e| AuthError::InvalidIdToken(e.to_string()))?
            .claims;

        if !nonce.is_empty() && claims.nonce.as_deref() != Some(nonce) {
            tracing::debug!(sub = %claims.sub, "ID token nonce mismatch");
            return Err(AuthError::InvalidNonce);
        }

        Ok(claims)
    }

    async fn find_key(&self, kid: Option<&str>) -> AuthResult<Jwk> {
        if let Some(jwk) = select_key(&self.keys.read().await.jwks, kid) {
            return Ok(jwk);
        }

        self.refresh_keys().await;

        select_key(&self.keys.read().await.jwks, kid).ok_or_else(|| {
            AuthError::InvalidIdToken(format!("no provider key matches kid {:?}", kid))
        })
    }

    async fn refresh_keys(&self) {
        let mut keys = self.keys.write().await;
        if keys.fetched_at.elapsed() < self.options.jwks_refresh_interval {
            return;
        }

        match fetch_json::<JwkSet>(&self.http, &self.metadata.jwks_uri).await {
            Ok(jwks) => {
                tracing::info!(keys = jwks.keys.len(), "OIDC provider keys refreshed");
                keys.jwks = jwks;
            }
            Err(e) => tracing::warn!(error = %e, "Failed to refresh OIDC provider keys"),
        }
        // 失败也更新时间，避免每个请求都去请求 provider
        keys.fetched_at = Instant::now();
    }
}

fn select_key(jwks: &JwkSet, kid: Option<&str>) -> Option<Jwk> {
    match kid {
        Some(kid) => jwks.find(kid).cloned(),
        None if jwks.keys.len() == 1 => jwks.keys.first().cloned(),
        None => None,
    }
}

fn key_matches_algorithm(jwk: &Jwk, alg: Algorithm) -> bool {
    match &jwk.algorithm {
        AlgorithmParameters::RSA(_) => matches!(
            alg,
            Algorithm::RS256
                | Algorithm::RS384
                | Algorithm::RS512
                | Algorithm::PS256
                | Algorithm::PS384
                | Algorithm::PS512
        ),
        AlgorithmParameters::EllipticCurve(_) => {
            matches!(alg, Algorithm::ES256 | Algorithm::ES384)
        }
        AlgorithmParameters::OctetKeyPair(_) => alg == Algorithm::EdDSA,
        AlgorithmParameters::OctetKey(_) => false,
    }
}

fn signing_algorithms(supported: &[String]) -> AuthResult<Vec<Algorithm>> {
    if supported.is_empty() {
        return Ok(vec![Algorithm::RS256]);
    }

    // 不在 jsonwebtoken 支持范围内的算法（以及 "none"）直接忽略
    let algorithms: Vec<Algorithm> = supported
        .iter()
        .filter_map(|alg| Algorithm::from_str(alg).ok())
        .filter(|alg| !matches!(alg, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512))
        .collect();

    if algorithms.is_empty() {
        return Err(AuthError::Discovery(format!(
            "no supported signing algorithm in {:?}",
            supported
        )));
    }
    Ok(algorithms)
}

async fn fetch_json<T: serde::de::DeserializeOwned>(
    http: &reqwest::Client,
    url: &str,
) -> AuthResult<T> {
    http.get(url)
        .send()
        .await
        .and_then(|resp| resp.error_for_status())
        .map_err(|e| AuthError::Discovery(format!("request to {} failed: {}", url, e)))?
        .json::<T>()
        .await
        .map_err(|e| AuthError::Discovery(format!("malformed response from {}: {}", url, e)))
}
