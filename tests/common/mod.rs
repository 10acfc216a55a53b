//! 集成测试共享工具
#![allow(dead_code)]

use oauth_connect::{ClientCredentials, OAuth2Client, ProviderConfig};
use wiremock::MockServer;

/// `cid:secret` 的 Basic 认证头
pub const BASIC_AUTH: &str = "Basic Y2lkOnNlY3JldA==";

pub fn credentials() -> ClientCredentials {
    ClientCredentials::new("cid", "secret")
}

/// 所有端点都指向 mock 服务器的标准配置
pub fn mock_config(server: &MockServer) -> ProviderConfig {
    let uri = server.uri();
    ProviderConfig::new(
        "mock",
        format!("{uri}/authorize"),
        format!("{uri}/token"),
        format!("{uri}/user"),
    )
    .with_refresh_endpoint(format!("{uri}/token"))
    .with_revoke_endpoint(format!("{uri}/revoke"))
}

pub fn mock_client(server: &MockServer) -> OAuth2Client {
    OAuth2Client::new(credentials(), mock_config(server))
}

/// 把预设配置的端点替换为 mock 服务器地址，保留路径
pub fn point_to(mut config: ProviderConfig, server: &MockServer) -> ProviderConfig {
    let rebase = |endpoint: &str| {
        let url = url::Url::parse(endpoint).unwrap();
        format!("{}{}", server.uri(), url.path())
    };
    config.authorize_endpoint = rebase(&config.authorize_endpoint);
    config.access_token_endpoint = rebase(&config.access_token_endpoint);
    config.userinfo_endpoint = rebase(&config.userinfo_endpoint);
    config.refresh_token_endpoint = config.refresh_token_endpoint.as_deref().map(rebase);
    config.revoke_token_endpoint = config.revoke_token_endpoint.as_deref().map(rebase);
    config
}

/// 收到的第一个请求的表单体
pub async fn first_body(server: &MockServer) -> String {
    let requests = server.received_requests().await.unwrap();
    String::from_utf8(requests[0].body.clone()).unwrap()
}
