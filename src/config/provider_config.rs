//! # 提供商端点配置
//!
//! 描述一个 OAuth2 提供商的全部端点与协议差异，客户端只依赖这里的数据工作

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{OAuth2Error, OAuth2Result};

/// 协议方言
///
/// 绝大多数提供商遵循 RFC 6749，微信使用自有参数名和 GET 请求
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolDialect {
    /// 标准 OAuth2
    #[default]
    Standard,
    /// 微信开放平台 / 公众号
    #[serde(rename = "wechat")]
    WeChat,
}

/// 用户信息获取策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProfileFetchStrategy {
    /// `Bearer` 令牌请求用户信息端点
    #[default]
    Standard,
    /// 主资料缺少邮箱时回退到 `{userinfo}/emails`
    #[serde(rename = "github_email_fallback")]
    GitHubWithEmailFallback,
    /// 通过 `access_token` + `openid` 查询参数获取
    #[serde(rename = "wechat_openid")]
    WeChatOpenIdKeyed,
}

/// 提供商配置
///
/// 构造后不可变，多个客户端可以共享同一份配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// 提供商标识，用于日志
    pub name: String,
    /// 授权端点
    pub authorize_endpoint: String,
    /// 令牌端点
    pub access_token_endpoint: String,
    /// 刷新令牌端点
    #[serde(default)]
    pub refresh_token_endpoint: Option<String>,
    /// 撤销令牌端点
    #[serde(default)]
    pub revoke_token_endpoint: Option<String>,
    /// 用户信息端点
    pub userinfo_endpoint: String,
    /// 默认授权范围
    #[serde(default)]
    pub default_scopes: Option<Vec<String>>,
    /// 令牌端点是否使用 HTTP Basic 认证
    #[serde(default)]
    pub token_endpoint_basic_auth: bool,
    /// 撤销端点是否使用 HTTP Basic 认证
    #[serde(default)]
    pub revoke_token_endpoint_basic_auth: bool,
    /// 协议方言
    #[serde(default)]
    pub dialect: ProtocolDialect,
    /// 用户信息获取策略
    #[serde(default)]
    pub profile_strategy: ProfileFetchStrategy,
}

impl ProviderConfig {
    /// 以标准方言创建配置，其余字段取默认值
    pub fn new(
        name: impl Into<String>,
        authorize_endpoint: impl Into<String>,
        access_token_endpoint: impl Into<String>,
        userinfo_endpoint: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            authorize_endpoint: authorize_endpoint.into(),
            access_token_endpoint: access_token_endpoint.into(),
            refresh_token_endpoint: None,
            revoke_token_endpoint: None,
            userinfo_endpoint: userinfo_endpoint.into(),
            default_scopes: None,
            token_endpoint_basic_auth: false,
            revoke_token_endpoint_basic_auth: false,
            dialect: ProtocolDialect::Standard,
            profile_strategy: ProfileFetchStrategy::Standard,
        }
    }

    /// 设置刷新端点
    #[must_use]
    pub fn with_refresh_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.refresh_token_endpoint = Some(endpoint.into());
        self
    }

    /// 设置撤销端点
    #[must_use]
    pub fn with_revoke_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.revoke_token_endpoint = Some(endpoint.into());
        self
    }

    /// 设置默认授权范围
    #[must_use]
    pub fn with_default_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.default_scopes = Some(scopes.into_iter().map(Into::into).collect());
        self
    }

    /// 令牌端点改用 Basic 认证
    #[must_use]
    pub const fn with_token_basic_auth(mut self, enabled: bool) -> Self {
        self.token_endpoint_basic_auth = enabled;
        self
    }

    /// 撤销端点改用 Basic 认证
    #[must_use]
    pub const fn with_revoke_basic_auth(mut self, enabled: bool) -> Self {
        self.revoke_token_endpoint_basic_auth = enabled;
        self
    }

    /// 设置协议方言
    #[must_use]
    pub const fn with_dialect(mut self, dialect: ProtocolDialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// 设置用户信息获取策略
    #[must_use]
    pub const fn with_profile_strategy(mut self, strategy: ProfileFetchStrategy) -> Self {
        self.profile_strategy = strategy;
        self
    }

    /// 授权范围分隔符，微信使用逗号
    #[must_use]
    pub const fn scope_separator(&self) -> &'static str {
        match self.dialect {
            ProtocolDialect::Standard => " ",
            ProtocolDialect::WeChat => ",",
        }
    }

    /// 验证配置
    pub fn validate(&self) -> OAuth2Result<()> {
        if self.name.trim().is_empty() {
            return Err(OAuth2Error::config("提供商名称不能为空"));
        }

        let required = [
            ("authorize_endpoint", Some(&self.authorize_endpoint)),
            ("access_token_endpoint", Some(&self.access_token_endpoint)),
            ("userinfo_endpoint", Some(&self.userinfo_endpoint)),
            ("refresh_token_endpoint", self.refresh_token_endpoint.as_ref()),
            ("revoke_token_endpoint", self.revoke_token_endpoint.as_ref()),
        ];

        for (field, value) in required {
            let Some(value) = value else { continue };
            url::Url::parse(value).map_err(|e| {
                OAuth2Error::config_with_source(
                    format!("{}: 无效的 {field}: {value}", self.name),
                    e,
                )
            })?;
        }

        Ok(())
    }
}

/// 客户端凭证
///
/// `Debug` 输出会隐藏密钥
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct ClientCredentials {
    /// 客户端 ID
    pub client_id: String,
    /// 客户端密钥
    pub client_secret: String,
}

impl ClientCredentials {
    /// 创建凭证
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .finish()
    }
}
