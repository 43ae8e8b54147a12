//! 测试用 RSA 私钥

/// PKCS#8 格式
pub const PRIVATE_KEY_PKCS8: &str = include_str!("../tests/fixtures/private_pkcs8.pem");

/// 与 `PRIVATE_KEY_PKCS8` 同一把密钥的 PKCS#1 格式
pub const PRIVATE_KEY_PKCS1: &str = include_str!("../tests/fixtures/private_pkcs1.pem");

/// 另一把无关的密钥
pub const OTHER_PRIVATE_KEY_PKCS8: &str = include_str!("../tests/fixtures/other_private_pkcs8.pem");
