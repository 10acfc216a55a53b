//! # 配置管理模块
//!
//! 提供商端点配置与应用 TOML 配置的加载、验证

mod app_config;
mod provider_config;

pub use app_config::{
    AppConfig, HttpConfig, LoggingConfig, ProviderEntry, ServerConfig, secret_env_key,
};
pub use provider_config::{ClientCredentials, ProfileFetchStrategy, ProtocolDialect, ProviderConfig};

use std::env;
use std::path::Path;

use crate::error::{OAuth2Error, OAuth2Result};

/// 按 `RUST_ENV` 加载 `config/oauth.{env}.toml`
pub fn load_config() -> OAuth2Result<AppConfig> {
    let env = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
    load_config_from(format!("config/oauth.{env}.toml"))
}

/// 从指定路径加载配置
pub fn load_config_from(path: impl AsRef<Path>) -> OAuth2Result<AppConfig> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(OAuth2Error::config(format!(
            "配置文件不存在: {}",
            path.display()
        )));
    }

    let content = std::fs::read_to_string(path).map_err(|e| {
        OAuth2Error::config_with_source(format!("读取配置文件失败: {}", path.display()), e)
    })?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        OAuth2Error::config_with_source(format!("解析配置文件失败: {}", path.display()), e)
    })?;

    validate_config(&config)?;

    Ok(config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> OAuth2Result<()> {
    if config.server.bind.parse::<std::net::SocketAddr>().is_err() {
        return Err(OAuth2Error::config(format!(
            "无效的监听地址: {}",
            config.server.bind
        )));
    }

    if config.http.timeout_secs == Some(0) {
        return Err(OAuth2Error::config("HTTP 超时必须大于0"));
    }

    for (name, entry) in &config.providers {
        entry.resolve(name)?;
        if let Some(redirect_uri) = &entry.redirect_uri {
            url::Url::parse(redirect_uri).map_err(|e| {
                OAuth2Error::config_with_source(format!("{name}: 无效的 redirect_uri"), e)
            })?;
        }
    }

    Ok(())
}
