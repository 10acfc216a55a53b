//! # 内置提供商
//!
//! 每个提供商只是一份 `ProviderConfig` 预设，不包含额外逻辑

use std::fmt;
use std::str::FromStr;

use crate::client::OAuth2Client;
use crate::config::{ClientCredentials, ProfileFetchStrategy, ProtocolDialect, ProviderConfig};
use crate::error::OAuth2Error;

const WECHAT_TOKEN_ENDPOINT: &str = "https://api.weixin.qq.com/sns/oauth2/access_token";
const WECHAT_REFRESH_ENDPOINT: &str = "https://api.weixin.qq.com/sns/oauth2/refresh_token";
const WECHAT_USERINFO_ENDPOINT: &str = "https://api.weixin.qq.com/sns/userinfo";

/// 内置提供商
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    /// GitHub
    GitHub,
    /// Google
    Google,
    /// 码云
    Gitee,
    /// 飞书
    FeiShu,
    /// LinuxDo
    LinuxDo,
    /// 开源中国
    OsChina,
    /// 微信开放平台（扫码登录）
    WeChatOpen,
    /// 微信公众号（网页授权）
    WeChatMp,
}

impl Provider {
    /// 全部内置提供商
    pub const ALL: [Self; 8] = [
        Self::GitHub,
        Self::Google,
        Self::Gitee,
        Self::FeiShu,
        Self::LinuxDo,
        Self::OsChina,
        Self::WeChatOpen,
        Self::WeChatMp,
    ];

    /// 标识名
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::GitHub => "github",
            Self::Google => "google",
            Self::Gitee => "gitee",
            Self::FeiShu => "feishu",
            Self::LinuxDo => "linuxdo",
            Self::OsChina => "oschina",
            Self::WeChatOpen => "wechat_open",
            Self::WeChatMp => "wechat_mp",
        }
    }

    /// 展示名
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::GitHub => "GitHub",
            Self::Google => "Google",
            Self::Gitee => "Gitee",
            Self::FeiShu => "FeiShu",
            Self::LinuxDo => "LinuxDo",
            Self::OsChina => "OSChina",
            Self::WeChatOpen => "WeChat Open",
            Self::WeChatMp => "WeChat MP",
        }
    }

    /// 预设端点配置
    #[must_use]
    pub fn config(&self) -> ProviderConfig {
        let name = self.as_str();
        match self {
            Self::GitHub => ProviderConfig::new(
                name,
                "https://github.com/login/oauth/authorize",
                "https://github.com/login/oauth/access_token",
                "https://api.github.com/user",
            )
            .with_default_scopes(["user", "user:email"])
            .with_profile_strategy(ProfileFetchStrategy::GitHubWithEmailFallback),
            Self::Google => ProviderConfig::new(
                name,
                "https://accounts.google.com/o/oauth2/v2/auth",
                "https://oauth2.googleapis.com/token",
                "https://www.googleapis.com/oauth2/v1/userinfo",
            )
            .with_refresh_endpoint("https://oauth2.googleapis.com/token")
            .with_revoke_endpoint("https://accounts.google.com/o/oauth2/revoke")
            .with_default_scopes(["email", "openid", "profile"]),
            Self::Gitee => ProviderConfig::new(
                name,
                "https://gitee.com/oauth/authorize",
                "https://gitee.com/oauth/token",
                "https://gitee.com/api/v5/user",
            )
            .with_refresh_endpoint("https://gitee.com/oauth/token")
            .with_default_scopes(["user_info"]),
            Self::FeiShu => ProviderConfig::new(
                name,
                "https://passport.feishu.cn/suite/passport/oauth/authorize",
                "https://passport.feishu.cn/suite/passport/oauth/token",
                "https://passport.feishu.cn/suite/passport/oauth/userinfo",
            )
            .with_refresh_endpoint("https://passport.feishu.cn/suite/passport/oauth/token")
            .with_default_scopes([
                "contact:user.employee_id:readonly",
                "contact:user.base:readonly",
                "contact:user.email:readonly",
            ]),
            Self::LinuxDo => ProviderConfig::new(
                name,
                "https://connect.linux.do/oauth2/authorize",
                "https://connect.linux.do/oauth2/token",
                "https://connect.linux.do/api/user",
            )
            .with_refresh_endpoint("https://connect.linux.do/oauth2/token")
            .with_token_basic_auth(true),
            Self::OsChina => ProviderConfig::new(
                name,
                "https://www.oschina.net/action/oauth2/authorize",
                "https://www.oschina.net/action/openapi/token",
                "https://www.oschina.net/action/openapi/user",
            )
            .with_refresh_endpoint("https://www.oschina.net/action/openapi/token"),
            Self::WeChatOpen => wechat_config(
                name,
                "https://open.weixin.qq.com/connect/qrconnect",
                "snsapi_login",
            ),
            Self::WeChatMp => wechat_config(
                name,
                "https://open.weixin.qq.com/connect/oauth2/authorize",
                "snsapi_userinfo",
            ),
        }
    }

    /// 用预设配置创建客户端
    #[must_use]
    pub fn client(&self, credentials: ClientCredentials) -> OAuth2Client {
        OAuth2Client::new(credentials, self.config())
    }
}

fn wechat_config(name: &str, authorize_endpoint: &str, scope: &str) -> ProviderConfig {
    ProviderConfig::new(
        name,
        authorize_endpoint,
        WECHAT_TOKEN_ENDPOINT,
        WECHAT_USERINFO_ENDPOINT,
    )
    .with_refresh_endpoint(WECHAT_REFRESH_ENDPOINT)
    .with_default_scopes([scope])
    .with_dialect(ProtocolDialect::WeChat)
    .with_profile_strategy(ProfileFetchStrategy::WeChatOpenIdKeyed)
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = OAuth2Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "github" => Ok(Self::GitHub),
            "google" => Ok(Self::Google),
            "gitee" => Ok(Self::Gitee),
            "feishu" | "lark" => Ok(Self::FeiShu),
            "linuxdo" | "linux_do" => Ok(Self::LinuxDo),
            "oschina" => Ok(Self::OsChina),
            "wechat_open" | "wechat" | "weixin" => Ok(Self::WeChatOpen),
            "wechat_mp" | "weixin_mp" => Ok(Self::WeChatMp),
            other => Err(OAuth2Error::config(format!("未知的提供商: {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases() {
        assert_eq!("GitHub".parse::<Provider>().unwrap(), Provider::GitHub);
        assert_eq!("linux-do".parse::<Provider>().unwrap(), Provider::LinuxDo);
        assert_eq!("weixin".parse::<Provider>().unwrap(), Provider::WeChatOpen);
        assert!("myspace".parse::<Provider>().is_err());
    }

    #[test]
    fn test_name_round_trip() {
        for provider in Provider::ALL {
            assert_eq!(provider.as_str().parse::<Provider>().unwrap(), provider);
            assert_eq!(provider.config().name, provider.as_str());
        }
    }

    #[test]
    fn test_presets_are_valid() {
        for provider in Provider::ALL {
            provider.config().validate().unwrap();
        }
    }

    #[test]
    fn test_wechat_presets_share_token_endpoints() {
        let open = Provider::WeChatOpen.config();
        let mp = Provider::WeChatMp.config();
        assert_eq!(open.access_token_endpoint, mp.access_token_endpoint);
        assert_eq!(open.refresh_token_endpoint, mp.refresh_token_endpoint);
        assert_ne!(open.authorize_endpoint, mp.authorize_endpoint);
        assert_eq!(mp.default_scopes, Some(vec!["snsapi_userinfo".to_string()]));
    }

    #[test]
    fn test_only_google_can_revoke() {
        for provider in Provider::ALL {
            let config = provider.config();
            assert_eq!(
                config.revoke_token_endpoint.is_some(),
                provider == Provider::Google
            );
        }
    }
}
