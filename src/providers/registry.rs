use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::callback::{OAuthCallback, RedirectUri};
use crate::client::{OAuth2Client, OAuth2Provider};
use crate::config::AppConfig;
use crate::error::OAuth2Result;

/// 已注册的提供商客户端
#[derive(Debug, Clone)]
pub struct RegisteredClient {
    /// 客户端
    pub client: Arc<OAuth2Client>,
    /// 固定回调地址
    pub redirect_uri: Option<String>,
}

impl RegisteredClient {
    /// 回调地址策略
    #[must_use]
    pub fn redirect_strategy(&self) -> RedirectUri {
        self.redirect_uri
            .clone()
            .map_or(RedirectUri::FromRequest, RedirectUri::Fixed)
    }

    /// 构建回调适配器
    #[must_use]
    pub fn callback(&self) -> OAuthCallback {
        OAuthCallback::new(
            self.client.clone() as Arc<dyn OAuth2Provider>,
            self.redirect_strategy(),
        )
    }
}

/// 按条目名索引的客户端集合
#[derive(Debug, Clone, Default)]
pub struct ClientRegistry {
    clients: BTreeMap<String, RegisteredClient>,
}

impl ClientRegistry {
    /// 从应用配置构建
    pub fn from_config(config: &AppConfig) -> OAuth2Result<Self> {
        let timeout = config.http.timeout_secs.map(Duration::from_secs);
        let mut registry = Self::default();

        for (name, entry) in &config.providers {
            let (provider, credentials) = entry.resolve(name)?;
            let mut client = OAuth2Client::new(credentials, provider);
            if let Some(timeout) = timeout {
                client = client.with_timeout(timeout)?;
            }
            debug!(provider = %name, "注册 OAuth2 客户端");
            registry.insert(name.clone(), client, entry.redirect_uri.clone());
        }

        Ok(registry)
    }

    /// 注册客户端，同名条目会被替换
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        client: OAuth2Client,
        redirect_uri: Option<String>,
    ) {
        self.clients.insert(
            name.into(),
            RegisteredClient {
                client: Arc::new(client),
                redirect_uri,
            },
        );
    }

    /// 查找客户端
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&RegisteredClient> {
        self.clients.get(name)
    }

    /// 已注册的条目名
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.clients.keys().map(String::as_str)
    }

    /// 条目数量
    #[must_use]
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// 是否为空
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
