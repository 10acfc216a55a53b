//! # OAuth2 客户端核心
//!
//! 一个 `OAuth2Client` 绑定一份凭证和一份提供商配置，负责：
//! - 构造授权跳转地址（纯函数，不发请求）
//! - 授权码换取令牌、刷新令牌、撤销令牌
//! - 获取用户信息
//!
//! 客户端除了复用的 HTTP 连接池外不保存任何跨调用状态

mod authorize;
mod http;
mod profile;
mod token;

pub use authorize::AuthorizationRequest;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::config::{ClientCredentials, ProviderConfig};
use crate::error::OAuth2Result;

/// 用户信息，保留提供商返回的全部字段
pub type UserProfile = Map<String, Value>;

/// 令牌响应
///
/// 原样保留令牌端点返回的 JSON 对象，常用字段提供访问方法
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenResponse(Map<String, Value>);

impl TokenResponse {
    /// 读取任意字段
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// `access_token`
    #[must_use]
    pub fn access_token(&self) -> Option<&str> {
        self.get_str("access_token")
    }

    /// `refresh_token`
    #[must_use]
    pub fn refresh_token(&self) -> Option<&str> {
        self.get_str("refresh_token")
    }

    /// `token_type`
    #[must_use]
    pub fn token_type(&self) -> Option<&str> {
        self.get_str("token_type")
    }

    /// `expires_in`，兼容数字和字符串两种写法
    #[must_use]
    pub fn expires_in(&self) -> Option<u64> {
        match self.0.get("expires_in")? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// 微信返回的 `openid`
    #[must_use]
    pub fn openid(&self) -> Option<&str> {
        self.get_str("openid")
    }

    /// 底层 JSON 对象
    #[must_use]
    pub const fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// 取出底层 JSON 对象
    #[must_use]
    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for TokenResponse {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// OAuth2 提供商操作
///
/// 回调适配器只依赖这个 trait，测试中可以替换为其他实现
#[async_trait]
pub trait OAuth2Provider: Send + Sync {
    /// 提供商名称
    fn name(&self) -> &str;

    /// 构造授权跳转地址
    fn authorization_url(&self, request: &AuthorizationRequest) -> String;

    /// 授权码换取令牌
    async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
        code_verifier: Option<&str>,
    ) -> OAuth2Result<TokenResponse>;

    /// 刷新令牌
    async fn refresh_token(&self, refresh_token: &str) -> OAuth2Result<TokenResponse>;

    /// 撤销令牌
    async fn revoke_token(&self, token: &str, token_type_hint: Option<&str>) -> OAuth2Result<()>;

    /// 获取用户信息
    async fn fetch_profile(
        &self,
        access_token: &str,
        openid: Option<&str>,
    ) -> OAuth2Result<UserProfile>;
}

/// OAuth2 客户端
#[derive(Debug, Clone)]
pub struct OAuth2Client {
    credentials: ClientCredentials,
    config: ProviderConfig,
    http_client: reqwest::Client,
}

impl OAuth2Client {
    /// 创建客户端
    #[must_use]
    pub fn new(credentials: ClientCredentials, config: ProviderConfig) -> Self {
        Self {
            credentials,
            config,
            http_client: http::build_http_client(None).unwrap_or_else(|e| {
                warn!(error = %e, "HTTP 客户端构建失败，使用 reqwest 默认客户端");
                reqwest::Client::default()
            }),
        }
    }

    /// 设置请求超时
    ///
    /// 客户端构建失败时返回配置错误，不会退回到无超时的客户端
    pub fn with_timeout(mut self, timeout: Duration) -> OAuth2Result<Self> {
        self.http_client = http::build_http_client(Some(timeout))?;
        Ok(self)
    }

    /// 使用外部 HTTP 客户端
    #[must_use]
    pub fn with_http_client(mut self, http_client: reqwest::Client) -> Self {
        self.http_client = http_client;
        self
    }

    /// 提供商名称
    #[must_use]
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// 客户端 ID
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.credentials.client_id
    }

    /// 提供商配置
    #[must_use]
    pub const fn config(&self) -> &ProviderConfig {
        &self.config
    }
}

#[async_trait]
impl OAuth2Provider for OAuth2Client {
    fn name(&self) -> &str {
        Self::name(self)
    }

    fn authorization_url(&self, request: &AuthorizationRequest) -> String {
        Self::authorization_url(self, request)
    }

    async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
        code_verifier: Option<&str>,
    ) -> OAuth2Result<TokenResponse> {
        Self::exchange_code(self, code, redirect_uri, code_verifier).await
    }

    async fn refresh_token(&self, refresh_token: &str) -> OAuth2Result<TokenResponse> {
        Self::refresh_token(self, refresh_token).await
    }

    async fn revoke_token(&self, token: &str, token_type_hint: Option<&str>) -> OAuth2Result<()> {
        Self::revoke_token(self, token, token_type_hint).await
    }

    async fn fetch_profile(
        &self,
        access_token: &str,
        openid: Option<&str>,
    ) -> OAuth2Result<UserProfile> {
        Self::fetch_profile(self, access_token, openid).await
    }
}
