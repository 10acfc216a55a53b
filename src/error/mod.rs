//! # OAuth2 错误处理
//!
//! 定义授权码流程中可能出现的错误类型。
//! 传输层错误（非 2xx 状态、网络失败）与语义错误（端点缺失、JSON 解析失败、提供商拒绝授权）分开表示。

use thiserror::Error;

/// 上游 HTTP 响应快照
///
/// 保存触发错误的原始响应，供调用方记录日志和诊断。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamResponse {
    /// HTTP 状态码
    pub status: u16,
    /// 请求 URL，不含查询串
    pub url: String,
    /// 响应体文本
    pub body: String,
}

impl UpstreamResponse {
    /// 创建响应快照
    pub fn new(status: u16, url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            status,
            url: url.into(),
            body: body.into(),
        }
    }

    /// 状态码是否为 2xx
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// OAuth2 专用错误类型
#[derive(Debug, Error)]
pub enum OAuth2Error {
    /// 传输错误：非 2xx 状态码或网络失败
    #[error("HTTP请求失败: {message}")]
    Transport {
        /// 错误消息
        message: String,
        /// 上游响应快照
        response: Option<UpstreamResponse>,
    },

    /// 授权码换取令牌失败
    #[error("获取访问令牌失败: {message}")]
    AccessToken {
        /// 错误消息
        message: String,
        /// 上游响应快照
        response: Option<UpstreamResponse>,
    },

    /// 刷新令牌失败
    #[error("刷新令牌失败: {message}")]
    RefreshToken {
        /// 错误消息
        message: String,
        /// 上游响应快照
        response: Option<UpstreamResponse>,
    },

    /// 撤销令牌失败
    #[error("撤销令牌失败: {message}")]
    RevokeToken {
        /// 错误消息
        message: String,
        /// 上游响应快照
        response: Option<UpstreamResponse>,
    },

    /// 获取用户信息失败
    #[error("获取用户信息失败: {message}")]
    UserInfo {
        /// 错误消息
        message: String,
        /// 上游响应快照
        response: Option<UpstreamResponse>,
    },

    /// 回调地址未配置或无法从请求推导
    #[error("回调地址缺失: {message}")]
    RedirectUriMissing {
        /// 错误消息
        message: String,
    },

    /// 提供商在回调中返回了 error 参数
    #[error("提供商拒绝授权: {error}")]
    ProviderDenied {
        /// 回调中的 error 参数
        error: String,
        /// 回调中的 error_description 参数
        description: Option<String>,
    },

    /// 配置错误
    #[error("配置错误: {message}")]
    Config {
        /// 错误消息
        message: String,
        /// 底层错误
        #[source]
        source: Option<anyhow::Error>,
    },
}

/// 错误种类（不携带数据）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// 传输错误
    Transport,
    /// 令牌交换错误
    AccessToken,
    /// 刷新令牌错误
    RefreshToken,
    /// 撤销令牌错误
    RevokeToken,
    /// 用户信息错误
    UserInfo,
    /// 回调地址缺失
    RedirectUriMissing,
    /// 提供商拒绝授权
    ProviderDenied,
    /// 配置错误
    Config,
}

/// 错误分类，用于映射到 HTTP 状态码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// 无需网络即可发现的流程错误，对应 4xx
    Client,
    /// 网络交换或配置阶段的失败，对应 5xx
    Server,
}

impl OAuth2Error {
    /// 创建传输错误
    pub fn transport<S: Into<String>>(message: S, response: Option<UpstreamResponse>) -> Self {
        Self::Transport {
            message: message.into(),
            response,
        }
    }

    /// 创建令牌交换错误
    pub fn access_token<S: Into<String>>(message: S, response: Option<UpstreamResponse>) -> Self {
        Self::AccessToken {
            message: message.into(),
            response,
        }
    }

    /// 创建刷新令牌错误
    pub fn refresh_token<S: Into<String>>(message: S, response: Option<UpstreamResponse>) -> Self {
        Self::RefreshToken {
            message: message.into(),
            response,
        }
    }

    /// 创建撤销令牌错误
    pub fn revoke_token<S: Into<String>>(message: S, response: Option<UpstreamResponse>) -> Self {
        Self::RevokeToken {
            message: message.into(),
            response,
        }
    }

    /// 创建用户信息错误
    pub fn user_info<S: Into<String>>(message: S, response: Option<UpstreamResponse>) -> Self {
        Self::UserInfo {
            message: message.into(),
            response,
        }
    }

    /// 创建回调地址缺失错误
    pub fn redirect_uri_missing<S: Into<String>>(message: S) -> Self {
        Self::RedirectUriMissing {
            message: message.into(),
        }
    }

    /// 创建配置错误
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的配置错误
    pub fn config_with_source<S: Into<String>, E: Into<anyhow::Error>>(
        message: S,
        source: E,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 原始错误消息（不含分类前缀）
    pub fn message(&self) -> &str {
        match self {
            Self::Transport { message, .. }
            | Self::AccessToken { message, .. }
            | Self::RefreshToken { message, .. }
            | Self::RevokeToken { message, .. }
            | Self::UserInfo { message, .. }
            | Self::RedirectUriMissing { message }
            | Self::Config { message, .. } => message,
            Self::ProviderDenied { error, .. } => error,
        }
    }

    /// 触发错误的上游响应（如果有）
    pub const fn response(&self) -> Option<&UpstreamResponse> {
        match self {
            Self::Transport { response, .. }
            | Self::AccessToken { response, .. }
            | Self::RefreshToken { response, .. }
            | Self::RevokeToken { response, .. }
            | Self::UserInfo { response, .. } => response.as_ref(),
            Self::RedirectUriMissing { .. } | Self::ProviderDenied { .. } | Self::Config { .. } => {
                None
            }
        }
    }

    /// 取出上游响应的所有权
    pub fn into_response(self) -> Option<UpstreamResponse> {
        match self {
            Self::Transport { response, .. }
            | Self::AccessToken { response, .. }
            | Self::RefreshToken { response, .. }
            | Self::RevokeToken { response, .. }
            | Self::UserInfo { response, .. } => response,
            Self::RedirectUriMissing { .. } | Self::ProviderDenied { .. } | Self::Config { .. } => {
                None
            }
        }
    }

    /// 错误种类
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport { .. } => ErrorKind::Transport,
            Self::AccessToken { .. } => ErrorKind::AccessToken,
            Self::RefreshToken { .. } => ErrorKind::RefreshToken,
            Self::RevokeToken { .. } => ErrorKind::RevokeToken,
            Self::UserInfo { .. } => ErrorKind::UserInfo,
            Self::RedirectUriMissing { .. } => ErrorKind::RedirectUriMissing,
            Self::ProviderDenied { .. } => ErrorKind::ProviderDenied,
            Self::Config { .. } => ErrorKind::Config,
        }
    }

    /// 错误分类
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::ProviderDenied { .. } => ErrorCategory::Client,
            _ => ErrorCategory::Server,
        }
    }
}

/// OAuth2 结果类型别名
pub type OAuth2Result<T> = Result<T, OAuth2Error>;
