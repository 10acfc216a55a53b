//! # OAuth Connect 演示程序
//!
//! - `authorize-url`：打印某个提供商的授权跳转地址
//! - `serve`：启动演示服务器，`/login/{provider}` 跳转授权，`/auth/{provider}` 处理回调

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::{Path, Request, State};
use axum::response::{IntoResponse, Json, Redirect, Response};
use axum::{Router, routing::get};
use clap::{Parser, Subcommand};
use serde_json::json;
use rand::Rng;
use rand::distributions::Alphanumeric;
use tracing::{debug, error, info};

use oauth_connect::callback::request_origin;
use oauth_connect::config::{self, AppConfig};
use oauth_connect::pkce::PkcePair;
use oauth_connect::{
    AuthorizationRequest, CallbackError, ClientCredentials, ClientRegistry, OAuth2Client,
    OAuth2Error, OAuth2Result, Provider, logging,
};

#[derive(Debug, Parser)]
#[command(name = "oauth-connect", version, about = "OAuth2 授权码流程演示")]
struct Cli {
    /// 配置文件路径，默认按 RUST_ENV 读取 config/oauth.{env}.toml
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// 打印授权跳转地址
    AuthorizeUrl {
        /// 提供商名称
        #[arg(long)]
        provider: String,
        /// 回调地址
        #[arg(long)]
        redirect_uri: String,
        /// state 参数
        #[arg(long)]
        state: Option<String>,
        /// 生成 PKCE 参数
        #[arg(long)]
        pkce: bool,
    },
    /// 启动演示服务器
    Serve,
    /// 打印日志配置说明
    LoggingHelp,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        error!(error = %e, "运行失败");
        eprintln!("{e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> OAuth2Result<()> {
    match cli.command {
        Command::LoggingHelp => {
            logging::print_logging_help();
            Ok(())
        }
        Command::AuthorizeUrl {
            provider,
            redirect_uri,
            state,
            pkce,
        } => {
            logging::init_logging(None);
            let client_id = std::env::var("OAUTH_CLIENT_ID").unwrap_or_default();
            let config = cli.config.map(config::load_config_from).transpose()?;
            let client = match config.as_ref() {
                Some(config) => registry_client(config, &provider)?,
                None => Arc::new(
                    provider
                        .parse::<Provider>()?
                        .client(ClientCredentials::new(client_id, "")),
                ),
            };

            let mut request = AuthorizationRequest::new(redirect_uri);
            if let Some(state) = state {
                request = request.state(state);
            }
            if pkce {
                let pair = PkcePair::generate();
                println!("code_verifier: {}", pair.verifier);
                request = request.pkce(&pair);
            }
            println!("{}", client.authorization_url(&request));
            Ok(())
        }
        Command::Serve => {
            let config = match cli.config {
                Some(path) => config::load_config_from(path)?,
                None => config::load_config()?,
            };
            logging::init_logging(config.logging.level.as_deref());
            serve(config).await
        }
    }
}

fn registry_client(
    config: &AppConfig,
    name: &str,
) -> OAuth2Result<Arc<OAuth2Client>> {
    let registry = ClientRegistry::from_config(config)?;
    registry
        .get(name)
        .map(|entry| entry.client.clone())
        .ok_or_else(|| OAuth2Error::config(format!("配置中没有提供商: {name}")))
}

async fn serve(config: AppConfig) -> OAuth2Result<()> {
    let registry = Arc::new(ClientRegistry::from_config(&config)?);
    info!(
        providers = ?registry.names().collect::<Vec<_>>(),
        bind = %config.server.bind,
        "演示服务器启动"
    );

    let app = Router::new()
        .route("/login/{provider}", get(login))
        .route("/auth/{provider}", get(callback))
        .with_state(registry);

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .map_err(|e| OAuth2Error::config_with_source("监听地址绑定失败", e))?;
    axum::serve(listener, app)
        .await
        .map_err(|e| OAuth2Error::config_with_source("服务器异常退出", e))
}

fn not_found(provider: &str) -> Response {
    (
        axum::http::StatusCode::NOT_FOUND,
        Json(json!({ "detail": format!("unknown provider: {provider}") })),
    )
        .into_response()
}

async fn login(
    State(registry): State<Arc<ClientRegistry>>,
    Path(provider): Path<String>,
    request: Request,
) -> Response {
    let Some(entry) = registry.get(&provider) else {
        return not_found(&provider);
    };
    let (parts, _) = request.into_parts();
    let redirect_uri = match &entry.redirect_uri {
        Some(uri) => uri.clone(),
        None => match request_origin(&parts) {
            Ok(origin) => format!("{origin}/auth/{provider}"),
            Err(e) => return CallbackError::from(e).into_response(),
        },
    };

    let state: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect();
    debug!(provider = %provider, state = %state, "跳转授权");

    let url = entry
        .client
        .authorization_url(&AuthorizationRequest::new(redirect_uri).state(state));
    Redirect::temporary(&url).into_response()
}

async fn callback(
    State(registry): State<Arc<ClientRegistry>>,
    Path(provider): Path<String>,
    request: Request,
) -> Response {
    let Some(entry) = registry.get(&provider) else {
        return not_found(&provider);
    };
    let (parts, _) = request.into_parts();

    let authorized = match entry.callback().handle(&parts).await {
        Ok(authorized) => authorized,
        Err(e) => return e.into_response(),
    };

    let Some(access_token) = authorized.token.access_token() else {
        return CallbackError::from(OAuth2Error::access_token("missing access_token", None))
            .into_response();
    };
    match entry
        .client
        .fetch_profile(access_token, authorized.token.openid())
        .await
    {
        Ok(profile) => Json(json!({
            "provider": provider,
            "state": authorized.state,
            "token": authorized.token,
            "profile": profile,
        }))
        .into_response(),
        Err(e) => CallbackError::from(e).into_response(),
    }
}
