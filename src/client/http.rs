//! 共享的 HTTP 发送与响应解析

use std::time::Duration;

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{OAuth2Error, OAuth2Result, UpstreamResponse};

/// JSON 解析失败时的固定消息
pub const SERIALIZATION_FAILED: &str = "Result serialization failed";

/// 语义错误构造函数
pub type ErrorFactory = fn(String, Option<UpstreamResponse>) -> OAuth2Error;

/// 构建共享 HTTP 客户端：关闭重定向，默认接受 JSON
pub fn build_http_client(timeout: Option<Duration>) -> OAuth2Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    let mut builder = reqwest::Client::builder()
        .default_headers(headers)
        .redirect(reqwest::redirect::Policy::none())
        .user_agent(concat!("oauth-connect/", env!("CARGO_PKG_VERSION")));
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder
        .build()
        .map_err(|e| OAuth2Error::config_with_source("构建 HTTP 客户端失败", e.without_url()))
}

/// 去掉查询串和片段后的地址，微信方言把 secret 和 access_token 放在查询串里
pub fn redacted_url(url: &reqwest::Url) -> String {
    let mut url = url.clone();
    url.set_query(None);
    url.set_fragment(None);
    url.to_string()
}

/// 发送请求并读取完整响应
///
/// 网络失败和非 2xx 状态都映射为传输错误，地址不带查询串
pub async fn send(provider: &str, request: reqwest::RequestBuilder) -> OAuth2Result<UpstreamResponse> {
    let response = request.send().await.map_err(|e| {
        let url = e.url().map(redacted_url).unwrap_or_default();
        let e = e.without_url();
        warn!(provider = %provider, url = %url, error = %e, "请求发送失败");
        OAuth2Error::transport(e.to_string(), None)
    })?;

    let status = response.status();
    let url = redacted_url(response.url());
    let body = response.text().await.map_err(|e| {
        let e = e.without_url();
        warn!(provider = %provider, url = %url, error = %e, "读取响应体失败");
        OAuth2Error::transport(e.to_string(), None)
    })?;
    let snapshot = UpstreamResponse::new(status.as_u16(), url, body);

    if !status.is_success() {
        warn!(
            provider = %provider,
            status = status.as_u16(),
            url = %snapshot.url,
            "上游返回非成功状态"
        );
        return Err(OAuth2Error::transport(
            format!("{status} 来自 {}", snapshot.url),
            Some(snapshot),
        ));
    }

    Ok(snapshot)
}

/// 将响应体解析为 JSON 对象
pub fn parse_object(
    provider: &str,
    snapshot: UpstreamResponse,
    on_error: ErrorFactory,
) -> OAuth2Result<Map<String, Value>> {
    match serde_json::from_str::<Value>(&snapshot.body) {
        Ok(Value::Object(map)) => Ok(map),
        _ => {
            warn!(provider = %provider, url = %snapshot.url, "响应体不是 JSON 对象");
            Err(on_error(SERIALIZATION_FAILED.to_string(), Some(snapshot)))
        }
    }
}

/// 将响应体解析为任意 JSON 值
pub fn parse_value(
    provider: &str,
    snapshot: UpstreamResponse,
    on_error: ErrorFactory,
) -> OAuth2Result<Value> {
    serde_json::from_str::<Value>(&snapshot.body).map_err(|_| {
        warn!(provider = %provider, url = %snapshot.url, "响应体不是合法 JSON");
        on_error(SERIALIZATION_FAILED.to_string(), Some(snapshot))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_redacted_url_drops_query() {
        let url = reqwest::Url::parse(
            "https://api.weixin.qq.com/sns/oauth2/access_token?appid=cid&secret=s3&code=c#frag",
        )
        .unwrap();
        assert_eq!(redacted_url(&url), "https://api.weixin.qq.com/sns/oauth2/access_token");
    }

    #[test]
    fn test_build_http_client_with_timeout() {
        assert!(build_http_client(Some(Duration::from_secs(3))).is_ok());
        assert!(build_http_client(None).is_ok());
    }

    #[test]
    fn test_parse_object_accepts_object() {
        let snapshot = UpstreamResponse::new(200, "https://x/token", r#"{"access_token":"t"}"#);
        let map = parse_object("p", snapshot, OAuth2Error::access_token::<String>).unwrap();
        assert_eq!(map["access_token"], "t");
    }

    #[test]
    fn test_parse_object_rejects_array_and_text() {
        for body in ["[1,2]", "access_token=t&scope=user", ""] {
            let snapshot = UpstreamResponse::new(200, "https://x/token", body);
            let err = parse_object("p", snapshot, OAuth2Error::refresh_token::<String>).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::RefreshToken);
            assert_eq!(err.message(), SERIALIZATION_FAILED);
            assert_eq!(err.response().map(|r| r.body.as_str()), Some(body));
        }
    }
}
