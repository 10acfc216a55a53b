//! 用户信息获取

use reqwest::header::ACCEPT;
use serde_json::Value;
use tracing::{debug, warn};

use super::http::{self, SERIALIZATION_FAILED};
use super::{OAuth2Client, UserProfile};
use crate::config::ProfileFetchStrategy;
use crate::error::{OAuth2Error, OAuth2Result};

impl OAuth2Client {
    /// 获取用户信息
    ///
    /// 微信需要令牌响应中的 `openid`，其他提供商忽略该参数
    pub async fn fetch_profile(
        &self,
        access_token: &str,
        openid: Option<&str>,
    ) -> OAuth2Result<UserProfile> {
        match self.config.profile_strategy {
            ProfileFetchStrategy::Standard => self.fetch_bearer_profile(access_token).await,
            ProfileFetchStrategy::GitHubWithEmailFallback => {
                let mut profile = self.fetch_bearer_profile(access_token).await?;
                if profile.get("email").is_none_or(Value::is_null) {
                    let email = self.fetch_primary_email(access_token).await?;
                    profile.insert("email".to_string(), Value::String(email));
                }
                Ok(profile)
            }
            ProfileFetchStrategy::WeChatOpenIdKeyed => {
                let Some(openid) = openid.filter(|id| !id.is_empty()) else {
                    warn!(provider = %self.name(), "缺少 openid，无法获取用户信息");
                    return Err(OAuth2Error::user_info("openid is required", None));
                };
                self.fetch_wechat_profile(access_token, openid).await
            }
        }
    }

    async fn fetch_bearer_profile(&self, access_token: &str) -> OAuth2Result<UserProfile> {
        let endpoint = &self.config.userinfo_endpoint;
        debug!(provider = %self.name(), endpoint = %endpoint, "获取用户信息");

        let request = self
            .http_client
            .get(endpoint)
            .header(ACCEPT, "application/json")
            .bearer_auth(access_token);
        let snapshot = http::send(self.name(), request).await?;
        http::parse_object(self.name(), snapshot, OAuth2Error::user_info::<String>)
    }

    /// 主资料没有公开邮箱时，从邮箱列表中取主邮箱，没有主邮箱则取第一个
    async fn fetch_primary_email(&self, access_token: &str) -> OAuth2Result<String> {
        let endpoint = format!("{}/emails", self.config.userinfo_endpoint.trim_end_matches('/'));
        debug!(provider = %self.name(), endpoint = %endpoint, "获取邮箱列表");

        let request = self
            .http_client
            .get(&endpoint)
            .header(ACCEPT, "application/json")
            .bearer_auth(access_token);
        let snapshot = http::send(self.name(), request).await?;

        let Ok(Value::Array(emails)) = serde_json::from_str::<Value>(&snapshot.body) else {
            return Err(OAuth2Error::user_info(SERIALIZATION_FAILED, Some(snapshot)));
        };

        let address = |entry: &Value| entry.get("email").and_then(Value::as_str).map(str::to_string);
        let chosen = emails
            .iter()
            .find(|entry| entry.get("primary").and_then(Value::as_bool) == Some(true))
            .and_then(address)
            .or_else(|| emails.first().and_then(address));

        chosen.ok_or_else(|| {
            warn!(provider = %self.name(), "邮箱列表为空");
            OAuth2Error::user_info("no email address available", Some(snapshot))
        })
    }

    async fn fetch_wechat_profile(&self, access_token: &str, openid: &str) -> OAuth2Result<UserProfile> {
        let endpoint = &self.config.userinfo_endpoint;
        debug!(provider = %self.name(), endpoint = %endpoint, "获取微信用户信息");

        let request = self
            .http_client
            .get(endpoint)
            .header(ACCEPT, "application/json")
            .query(&[
                ("access_token", access_token),
                ("openid", openid),
                ("lang", "zh_CN"),
            ]);
        let snapshot = http::send(self.name(), request).await?;
        http::parse_object(self.name(), snapshot, OAuth2Error::user_info::<String>)
    }
}
