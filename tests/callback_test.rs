//! 授权回调适配器测试
//!
//! 通过 axum Router 驱动 `AuthorizeCallback` 提取器，检查状态码与 `detail` 响应体

mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use common::{credentials, first_body, mock_client, point_to};
use oauth_connect::{
    AuthorizeCallback, OAuth2Client, OAuth2Provider, OAuthCallback, Provider, RedirectUri,
};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tower::ServiceExt;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn authorized(callback: AuthorizeCallback) -> Json<Value> {
    Json(json!({
        "access_token": callback.token.access_token(),
        "state": callback.state,
    }))
}

fn app(server: &MockServer, redirect_uri: RedirectUri) -> Router {
    let provider: Arc<dyn OAuth2Provider> = Arc::new(mock_client(server));
    Router::new()
        .route("/auth/mock", get(authorized))
        .with_state(OAuthCallback::new(provider, redirect_uri))
}

async fn call(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("host", "app.example.com")
        .body(Body::empty())
        .unwrap()
}

async fn mount_token(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "at-1"})))
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_successful_callback_with_fixed_redirect() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("code=abc"))
        .and(body_string_contains("redirect_uri=https%3A%2F%2Flogin.example.com%2Fcb"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "at-1"})))
        .expect(1)
        .mount(&server)
        .await;

    let app = app(&server, RedirectUri::Fixed("https://login.example.com/cb".to_string()));
    let (status, body) = call(app, get_request("/auth/mock?code=abc&state=xyz")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"access_token": "at-1", "state": "xyz"}));
}

#[tokio::test]
async fn test_redirect_uri_derived_from_request() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;

    let app = app(&server, RedirectUri::FromRequest);
    let request = Request::builder()
        .uri("/auth/mock?code=abc")
        .header("host", "internal:8000")
        .header("x-forwarded-proto", "https")
        .header("x-forwarded-host", "login.example.com")
        .body(Body::empty())
        .unwrap();
    let (status, body) = call(app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], Value::Null);
    assert!(
        first_body(&server)
            .await
            .contains("redirect_uri=https%3A%2F%2Flogin.example.com%2Fauth%2Fmock")
    );
}

#[tokio::test]
async fn test_provider_error_is_bad_request() {
    let server = MockServer::start().await;
    mount_token(&server, 0).await;

    let app = app(&server, RedirectUri::FromRequest);
    let (status, body) = call(
        app,
        get_request("/auth/mock?error=access_denied&error_description=user+cancelled&state=xyz"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"detail": "access_denied"}));
}

#[tokio::test]
async fn test_missing_code_is_bad_request() {
    let server = MockServer::start().await;
    mount_token(&server, 0).await;

    let app = app(&server, RedirectUri::FromRequest);
    let (status, body) = call(app, get_request("/auth/mock?state=xyz")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"detail": "Bad Request"}));
}

#[tokio::test]
async fn test_token_endpoint_failure_is_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "invalid_grant"})))
        .mount(&server)
        .await;

    let app = app(&server, RedirectUri::FromRequest);
    let (status, body) = call(app, get_request("/auth/mock?code=expired")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let detail = body["detail"].as_str().unwrap();
    assert!(detail.starts_with("400 Bad Request"));
}

#[tokio::test]
async fn test_unparseable_token_is_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let app = app(&server, RedirectUri::FromRequest);
    let (status, body) = call(app, get_request("/auth/mock?code=abc")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"detail": "Result serialization failed"}));
}

#[tokio::test]
async fn test_missing_host_is_server_error() {
    let server = MockServer::start().await;
    mount_token(&server, 0).await;

    let app = app(&server, RedirectUri::FromRequest);
    let request = Request::builder()
        .uri("/auth/mock?code=abc")
        .body(Body::empty())
        .unwrap();
    let (status, _) = call(app, request).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_code_verifier_is_forwarded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("code_verifier=v-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "at-1"})))
        .expect(1)
        .mount(&server)
        .await;

    let app = app(&server, RedirectUri::FromRequest);
    let (status, _) = call(app, get_request("/auth/mock?code=abc&code_verifier=v-1")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_wechat_failure_detail_hides_secret() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sns/oauth2/access_token"))
        .and(query_param("secret", "secret"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let client = OAuth2Client::new(credentials(), point_to(Provider::WeChatOpen.config(), &server));
    let provider: Arc<dyn OAuth2Provider> = Arc::new(client);
    let app = Router::new()
        .route("/auth/mock", get(authorized))
        .with_state(OAuthCallback::new(
            provider,
            RedirectUri::Fixed("https://login.example.com/cb".to_string()),
        ));
    let (status, body) = call(app, get_request("/auth/mock?code=c")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let detail = body["detail"].as_str().unwrap();
    assert!(detail.starts_with("500 Internal Server Error"));
    assert!(detail.ends_with("/sns/oauth2/access_token"));
    assert!(!detail.contains("secret="));
    assert!(!detail.contains("appid="));
}
