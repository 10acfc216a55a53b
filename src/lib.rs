//! # OAuth Connect
//!
//! GitHub、Google、Gitee、飞书、LinuxDo、开源中国和微信的 OAuth2 授权码客户端，
//! 以及 axum 授权回调适配器

pub mod callback;
pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod pkce;
pub mod providers;

// Re-export commonly used types
pub use callback::{AuthorizeCallback, CallbackError, OAuthCallback, RedirectUri};
pub use client::{AuthorizationRequest, OAuth2Client, OAuth2Provider, TokenResponse, UserProfile};
pub use config::{AppConfig, ClientCredentials, ProviderConfig};
pub use error::{OAuth2Error, OAuth2Result};
pub use providers::{ClientRegistry, Provider};
