//! # PKCE (Proof Key for Code Exchange)
//!
//! RFC 7636 的 code verifier / code challenge 生成。
//! 授权请求携带 challenge，令牌交换时携带 verifier

use base64::engine::{Engine, general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// 随机字节数，编码后得到 86 个字符的 verifier
const VERIFIER_RANDOM_BYTES: usize = 64;

/// Code Challenge 方法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PkceMethod {
    /// 明文
    #[serde(rename = "plain")]
    Plain,
    /// SHA256 哈希
    #[serde(rename = "S256")]
    #[default]
    S256,
}

impl PkceMethod {
    /// 参数取值
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::S256 => "S256",
        }
    }
}

impl std::fmt::Display for PkceMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 根据 verifier 计算 challenge
#[must_use]
pub fn code_challenge(verifier: &str, method: PkceMethod) -> String {
    match method {
        PkceMethod::Plain => verifier.to_string(),
        PkceMethod::S256 => URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes())),
    }
}

/// PKCE 参数对
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkcePair {
    /// 令牌交换时提交
    pub verifier: String,
    /// 授权请求时提交
    pub challenge: String,
    /// 计算方法
    pub method: PkceMethod,
}

impl PkcePair {
    /// 生成 S256 参数对
    #[must_use]
    pub fn generate() -> Self {
        Self::generate_with_method(PkceMethod::S256)
    }

    /// 生成指定方法的参数对
    #[must_use]
    pub fn generate_with_method(method: PkceMethod) -> Self {
        let mut bytes = [0u8; VERIFIER_RANDOM_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        let verifier = URL_SAFE_NO_PAD.encode(bytes);
        let challenge = code_challenge(&verifier, method);
        Self {
            verifier,
            challenge,
            method,
        }
    }
}
