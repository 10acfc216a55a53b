//! # 应用配置结构定义

use std::collections::BTreeMap;
use std::env;

use serde::Deserialize;

use super::{ClientCredentials, ProtocolDialect, ProviderConfig};
use crate::error::{OAuth2Error, OAuth2Result};
use crate::providers::Provider;

/// 应用主配置结构
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 演示服务器配置
    #[serde(default)]
    pub server: ServerConfig,
    /// HTTP 客户端配置
    #[serde(default)]
    pub http: HttpConfig,
    /// 日志配置
    #[serde(default)]
    pub logging: LoggingConfig,
    /// 提供商条目，键为条目名
    #[serde(default)]
    pub providers: BTreeMap<String, ProviderEntry>,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8000".to_string()
}

/// HTTP 客户端配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HttpConfig {
    /// 请求超时（秒），不设置则不限制
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// 日志配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别
    #[serde(default)]
    pub level: Option<String>,
}

/// 单个提供商条目
///
/// `preset` 缺省时按条目名匹配内置提供商；匹配不到时必须给出三个必需端点
#[derive(Clone, Default, Deserialize)]
pub struct ProviderEntry {
    /// 内置提供商名称
    #[serde(default)]
    pub preset: Option<String>,
    /// 客户端 ID
    pub client_id: String,
    /// 客户端密钥，留空时读取 `OAUTH_<NAME>_CLIENT_SECRET`
    #[serde(default)]
    pub client_secret: String,
    /// 固定回调地址，不设置时从请求推导
    #[serde(default)]
    pub redirect_uri: Option<String>,
    /// 授权端点覆盖
    #[serde(default)]
    pub authorize_endpoint: Option<String>,
    /// 令牌端点覆盖
    #[serde(default)]
    pub access_token_endpoint: Option<String>,
    /// 刷新端点覆盖
    #[serde(default)]
    pub refresh_token_endpoint: Option<String>,
    /// 撤销端点覆盖
    #[serde(default)]
    pub revoke_token_endpoint: Option<String>,
    /// 用户信息端点覆盖
    #[serde(default)]
    pub userinfo_endpoint: Option<String>,
    /// 默认授权范围覆盖
    #[serde(default)]
    pub default_scopes: Option<Vec<String>>,
    /// 令牌端点 Basic 认证覆盖
    #[serde(default)]
    pub token_endpoint_basic_auth: Option<bool>,
    /// 撤销端点 Basic 认证覆盖
    #[serde(default)]
    pub revoke_token_endpoint_basic_auth: Option<bool>,
    /// 协议方言，仅对自定义提供商生效
    #[serde(default)]
    pub dialect: Option<ProtocolDialect>,
}

impl std::fmt::Debug for ProviderEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderEntry")
            .field("preset", &self.preset)
            .field("client_id", &self.client_id)
            .field("redirect_uri", &self.redirect_uri)
            .finish_non_exhaustive()
    }
}

impl ProviderEntry {
    /// 解析为提供商配置与凭证
    pub fn resolve(&self, name: &str) -> OAuth2Result<(ProviderConfig, ClientCredentials)> {
        let preset_name = self.preset.as_deref().unwrap_or(name);
        let mut config = match preset_name.parse::<Provider>() {
            Ok(provider) => provider.config(),
            Err(_) if self.preset.is_some() => {
                return Err(OAuth2Error::config(format!(
                    "{name}: 未知的提供商预设 {preset_name}"
                )));
            }
            Err(_) => self.custom_config(name)?,
        };
        config.name = name.to_string();
        self.apply_overrides(&mut config);
        config.validate()?;

        if self.client_id.trim().is_empty() {
            return Err(OAuth2Error::config(format!("{name}: client_id 不能为空")));
        }

        let client_secret = if self.client_secret.is_empty() {
            let key = secret_env_key(name);
            env::var(&key).map_err(|_| {
                OAuth2Error::config(format!("{name}: 未配置 client_secret，且环境变量 {key} 不存在"))
            })?
        } else {
            self.client_secret.clone()
        };

        Ok((config, ClientCredentials::new(&self.client_id, client_secret)))
    }

    fn custom_config(&self, name: &str) -> OAuth2Result<ProviderConfig> {
        let require = |field: &str, value: &Option<String>| {
            value
                .clone()
                .ok_or_else(|| OAuth2Error::config(format!("{name}: 自定义提供商缺少 {field}")))
        };
        let config = ProviderConfig::new(
            name,
            require("authorize_endpoint", &self.authorize_endpoint)?,
            require("access_token_endpoint", &self.access_token_endpoint)?,
            require("userinfo_endpoint", &self.userinfo_endpoint)?,
        );
        Ok(config.with_dialect(self.dialect.unwrap_or_default()))
    }

    fn apply_overrides(&self, config: &mut ProviderConfig) {
        if let Some(endpoint) = &self.authorize_endpoint {
            config.authorize_endpoint.clone_from(endpoint);
        }
        if let Some(endpoint) = &self.access_token_endpoint {
            config.access_token_endpoint.clone_from(endpoint);
        }
        if let Some(endpoint) = &self.userinfo_endpoint {
            config.userinfo_endpoint.clone_from(endpoint);
        }
        if self.refresh_token_endpoint.is_some() {
            config.refresh_token_endpoint.clone_from(&self.refresh_token_endpoint);
        }
        if self.revoke_token_endpoint.is_some() {
            config.revoke_token_endpoint.clone_from(&self.revoke_token_endpoint);
        }
        if self.default_scopes.is_some() {
            config.default_scopes.clone_from(&self.default_scopes);
        }
        if let Some(enabled) = self.token_endpoint_basic_auth {
            config.token_endpoint_basic_auth = enabled;
        }
        if let Some(enabled) = self.revoke_token_endpoint_basic_auth {
            config.revoke_token_endpoint_basic_auth = enabled;
        }
    }
}

/// 条目名对应的密钥环境变量名
pub fn secret_env_key(name: &str) -> String {
    let normalized: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect();
    format!("OAUTH_{normalized}_CLIENT_SECRET")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProfileFetchStrategy;

    fn parse(content: &str) -> AppConfig {
        toml::from_str(content).unwrap()
    }

    #[test]
    fn test_defaults_when_sections_missing() {
        let config = parse("");
        assert_eq!(config.server.bind, "127.0.0.1:8000");
        assert!(config.http.timeout_secs.is_none());
        assert!(config.providers.is_empty());
    }

    #[test]
    fn test_preset_resolved_by_entry_name() {
        let config = parse(
            r#"
            [providers.github]
            client_id = "gh-id"
            client_secret = "gh-secret"
            "#,
        );
        let (provider, credentials) = config.providers["github"].resolve("github").unwrap();
        assert_eq!(provider.profile_strategy, ProfileFetchStrategy::GitHubWithEmailFallback);
        assert_eq!(credentials.client_secret, "gh-secret");
    }

    #[test]
    fn test_preset_with_override() {
        let config = parse(
            r#"
            [providers.corp]
            preset = "gitee"
            client_id = "id"
            client_secret = "secret"
            access_token_endpoint = "https://gitee.internal/oauth/token"
            default_scopes = ["user_info", "emails"]
            "#,
        );
        let (provider, _) = config.providers["corp"].resolve("corp").unwrap();
        assert_eq!(provider.name, "corp");
        assert_eq!(provider.authorize_endpoint, "https://gitee.com/oauth/authorize");
        assert_eq!(provider.access_token_endpoint, "https://gitee.internal/oauth/token");
        assert_eq!(
            provider.default_scopes,
            Some(vec!["user_info".to_string(), "emails".to_string()])
        );
    }

    #[test]
    fn test_unknown_preset_is_error() {
        let entry = ProviderEntry {
            preset: Some("myspace".to_string()),
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            ..ProviderEntry::default()
        };
        let err = entry.resolve("social").unwrap_err();
        assert!(err.to_string().contains("myspace"));
    }

    #[test]
    fn test_custom_provider_requires_endpoints() {
        let entry = ProviderEntry {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            authorize_endpoint: Some("https://sso.example.com/authorize".to_string()),
            ..ProviderEntry::default()
        };
        let err = entry.resolve("sso").unwrap_err();
        assert!(err.to_string().contains("access_token_endpoint"));
    }

    #[test]
    fn test_secret_env_key() {
        assert_eq!(secret_env_key("wechat_open"), "OAUTH_WECHAT_OPEN_CLIENT_SECRET");
        assert_eq!(secret_env_key("linux-do"), "OAUTH_LINUX_DO_CLIENT_SECRET");
    }
}
