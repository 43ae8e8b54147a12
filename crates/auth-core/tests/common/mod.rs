//! 集成测试公共工具：测试密钥与 LINE 风格的 OIDC mock provider

#![allow(dead_code)]

use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const PRIVATE_KEY_PKCS8: &str = include_str!("../fixtures/private_pkcs8.pem");
pub const PUBLIC_KEY: &str = include_str!("../fixtures/public.pem");

/// provider 签名用的私钥（与上面的 token 签名密钥无关）
pub const PROVIDER_PRIVATE_KEY: &str = include_str!("../fixtures/other_private_pkcs8.pem");

// PROVIDER_PRIVATE_KEY 的 modulus / exponent（base64url）
const PROVIDER_N: &str = "xM-ux2BUk5uzowP5hfCRUCEtbqZFXnirEcWLOUYXkixXByZIIPUtSzo8H4JeYsKE_ajEsgmMFKYbFlh_vDfpVcTMgoaFp2tHipohG87Q_fgk_ec0lwOyzWuYfdTMJpHZhGGuzMJzwTQbDTkDgBKmiv_3beeh8ztSScJT70pGpBHpLHhrI2U6foHW0TrMzUEQo2OY0V6Tl36_BkTCVFB0ZifZDqsYZoRA3SbrTTBFjpBOsqYrvGkQ1uZX6xWDVSNBNHZi-8rEow4U1S9tpq912pYaXwayr1aX77U_zNaAwpaTscN5FSITbEFQB_3e2Ojs4bDfUBN_PfEfxsV1SrOcTQ";
const PROVIDER_E: &str = "AQAB";

pub const CLIENT_ID: &str = "1650000000";
pub const KEY_ID: &str = "line-key-1";

/// JWKS 文档
pub fn jwks(kids: &[&str]) -> serde_json::Value {
    let keys: Vec<_> = kids
        .iter()
        .map(|kid| {
            json!({
                "kty": "RSA",
                "use": "sig",
                "alg": "RS256",
                "kid": kid,
                "n": PROVIDER_N,
                "e": PROVIDER_E,
            })
        })
        .collect();
    json!({ "keys": keys })
}

/// 启动 mock provider，JWKS 中只有 `KEY_ID`
pub async fn start_provider() -> MockServer {
    let server = MockServer::start().await;
    mount_discovery(&server).await;
    Mock::given(method("GET"))
        .and(path("/jwks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(jwks(&[KEY_ID])))
        .mount(&server)
        .await;
    server
}

pub async fn mount_discovery(server: &MockServer) {
    mount_discovery_with_algorithms(server, &["RS256"]).await;
}

/// discovery 文档，`id_token_signing_alg_values_supported` 由调用方指定
pub async fn mount_discovery_with_algorithms(server: &MockServer, algorithms: &[&str]) {
    Mock::given(method("GET"))
        .and(path("/.well-known/openid-configuration"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "issuer": server.uri(),
            "authorization_endpoint": format!("{}/authorize", server.uri()),
            "token_endpoint": format!("{}/token", server.uri()),
            "jwks_uri": format!("{}/jwks", server.uri()),
            "response_types_supported": ["code"],
            "subject_types_supported": ["pairwise"],
            "id_token_signing_alg_values_supported": algorithms,
        })))
        .mount(server)
        .await;
}

/// ID token claims，默认当前时间签发、1 小时后过期
pub fn id_token_claims(issuer: &str, nonce: Option<&str>) -> serde_json::Value {
    let now = chrono::Utc::now().timestamp();
    let mut claims = json!({
        "iss": issuer,
        "sub": "U1234567890abcdef",
        "aud": CLIENT_ID,
        "exp": now + 3600,
        "iat": now,
        "amr": ["pwd"],
        "name": "Furumaru Taro",
        "picture": "https://profile.line-scdn.net/example",
    });
    if let Some(nonce) = nonce {
        claims["nonce"] = json!(nonce);
    }
    claims
}

/// 用 provider 私钥签名
pub fn sign_id_token(claims: &serde_json::Value, kid: &str) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(kid.to_string());
    let key = EncodingKey::from_rsa_pem(PROVIDER_PRIVATE_KEY.as_bytes()).unwrap();
    encode(&header, claims, &key).unwrap()
}
