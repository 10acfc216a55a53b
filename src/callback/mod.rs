//! # 授权回调适配器
//!
//! 在 axum 中处理提供商重定向回来的请求：
//! 读取 `code` / `state` / `error`，推导回调地址，调用令牌交换。
//!
//! 失败统一渲染为 `{"detail": ...}`：流程错误 400，网络交换错误 500

use std::sync::Arc;

use axum::extract::{FromRef, FromRequestParts, OriginalUri, Query};
use axum::http::{StatusCode, header::HOST, request::Parts};
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::client::{OAuth2Provider, TokenResponse};
use crate::error::{ErrorCategory, OAuth2Error, UpstreamResponse};

/// 回调地址策略
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectUri {
    /// 固定地址
    Fixed(String),
    /// 由当前请求的协议、主机和路径推导
    FromRequest,
}

/// 回调查询参数
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    /// 授权码
    pub code: Option<String>,
    /// 原样返回的 state
    pub state: Option<String>,
    /// 提供商返回的错误码
    pub error: Option<String>,
    /// 错误描述
    pub error_description: Option<String>,
    /// PKCE verifier
    pub code_verifier: Option<String>,
}

/// 回调处理错误
#[derive(Debug, thiserror::Error)]
#[error("授权回调失败: {status}")]
pub struct CallbackError {
    /// 响应状态码
    pub status: StatusCode,
    /// 错误详情
    pub detail: Option<String>,
    /// 触发错误的上游响应
    pub response: Option<UpstreamResponse>,
}

impl CallbackError {
    /// 400 错误
    #[must_use]
    pub const fn bad_request(detail: Option<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            detail,
            response: None,
        }
    }
}

impl From<OAuth2Error> for CallbackError {
    fn from(err: OAuth2Error) -> Self {
        let status = match err.category() {
            ErrorCategory::Client => StatusCode::BAD_REQUEST,
            ErrorCategory::Server => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let detail = Some(err.message().to_string());
        Self {
            status,
            detail,
            response: err.into_response(),
        }
    }
}

impl IntoResponse for CallbackError {
    fn into_response(self) -> Response {
        let detail = self.detail.unwrap_or_else(|| {
            self.status
                .canonical_reason()
                .unwrap_or("Error")
                .to_string()
        });
        (self.status, Json(json!({ "detail": detail }))).into_response()
    }
}

/// 回调处理器
///
/// 绑定一个提供商和一种回调地址策略，可以放进 axum 状态中
#[derive(Clone)]
pub struct OAuthCallback {
    provider: Arc<dyn OAuth2Provider>,
    redirect_uri: RedirectUri,
}

impl std::fmt::Debug for OAuthCallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthCallback")
            .field("provider", &self.provider.name())
            .field("redirect_uri", &self.redirect_uri)
            .finish()
    }
}

impl OAuthCallback {
    /// 创建回调处理器
    pub fn new(provider: Arc<dyn OAuth2Provider>, redirect_uri: RedirectUri) -> Self {
        Self {
            provider,
            redirect_uri,
        }
    }

    /// 绑定的提供商
    #[must_use]
    pub fn provider(&self) -> &Arc<dyn OAuth2Provider> {
        &self.provider
    }

    /// 计算本次请求使用的回调地址
    pub fn resolve_redirect_uri(&self, parts: &Parts) -> Result<String, OAuth2Error> {
        match &self.redirect_uri {
            RedirectUri::Fixed(uri) => Ok(uri.clone()),
            RedirectUri::FromRequest => redirect_uri_from_request(parts),
        }
    }

    /// 处理回调请求
    pub async fn handle(&self, parts: &Parts) -> Result<AuthorizeCallback, CallbackError> {
        let Query(params) = Query::<CallbackParams>::try_from_uri(&parts.uri).map_err(|e| {
            warn!(provider = %self.provider.name(), error = %e, "回调参数解析失败");
            CallbackError::bad_request(Some(e.body_text()))
        })?;
        self.handle_params(params, parts).await
    }

    /// 用已解析的参数处理回调
    pub async fn handle_params(
        &self,
        params: CallbackParams,
        parts: &Parts,
    ) -> Result<AuthorizeCallback, CallbackError> {
        let provider = self.provider.name();

        if let Some(error) = params.error {
            warn!(
                provider = %provider,
                error = %error,
                description = ?params.error_description,
                "提供商拒绝授权"
            );
            return Err(OAuth2Error::ProviderDenied {
                error,
                description: params.error_description,
            }
            .into());
        }

        let Some(code) = params.code else {
            warn!(provider = %provider, "回调缺少授权码");
            return Err(CallbackError::bad_request(None));
        };

        let redirect_uri = self.resolve_redirect_uri(parts)?;
        let token = self
            .provider
            .exchange_code(&code, &redirect_uri, params.code_verifier.as_deref())
            .await
            .map_err(|e| {
                warn!(provider = %provider, error = %e, "授权码交换失败");
                CallbackError::from(e)
            })?;

        info!(provider = %provider, "授权回调完成");
        Ok(AuthorizeCallback {
            token,
            state: params.state,
        })
    }
}

/// 按 `X-Forwarded-Proto`、`X-Forwarded-Host` / `Host` 推导 `{scheme}://{host}`
pub fn request_origin(parts: &Parts) -> Result<String, OAuth2Error> {
    let scheme = first_header_value(parts, "x-forwarded-proto")
        .or_else(|| parts.uri.scheme_str())
        .unwrap_or("http");
    let host = first_header_value(parts, "x-forwarded-host")
        .or_else(|| first_header_value(parts, HOST.as_str()))
        .or_else(|| parts.uri.authority().map(|a| a.as_str()))
        .ok_or_else(|| OAuth2Error::redirect_uri_missing("无法从请求推导回调地址"))?;

    Ok(format!("{scheme}://{host}"))
}

/// 请求来源加上原始路径
fn redirect_uri_from_request(parts: &Parts) -> Result<String, OAuth2Error> {
    let origin = request_origin(parts)?;
    let path = parts
        .extensions
        .get::<OriginalUri>()
        .map_or_else(|| parts.uri.path(), |uri| uri.0.path());

    Ok(format!("{origin}{path}"))
}

/// 代理可能追加多个值，取第一个
fn first_header_value<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// 回调提取器
///
/// 从状态中取出 `OAuthCallback` 并完成令牌交换，失败时直接返回错误响应
#[derive(Debug, Clone)]
pub struct AuthorizeCallback {
    /// 令牌响应
    pub token: TokenResponse,
    /// 原样返回的 state
    pub state: Option<String>,
}

impl<S> FromRequestParts<S> for AuthorizeCallback
where
    OAuthCallback: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = CallbackError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let callback = OAuthCallback::from_ref(state);
        callback.handle(parts).await
    }
}
