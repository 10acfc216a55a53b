//! 微信接口错误体识别
//!
//! 微信在 HTTP 200 响应中用 `errcode` / `errmsg` 表示失败，客户端核心不解释这些字段

use serde_json::Value;

/// 微信接口错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeChatApiError {
    /// 错误码
    pub errcode: i64,
    /// 错误信息
    pub errmsg: String,
}

impl std::fmt::Display for WeChatApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "微信接口错误 {}: {}", self.errcode, self.errmsg)
    }
}

/// 从响应体中提取微信错误，`errcode` 为 0 或缺失时返回 `None`
#[must_use]
pub fn wechat_api_error(body: &Value) -> Option<WeChatApiError> {
    let errcode = body.get("errcode")?.as_i64()?;
    if errcode == 0 {
        return None;
    }
    let errmsg = body
        .get("errmsg")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    Some(WeChatApiError { errcode, errmsg })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_detects_error_body() {
        let err = wechat_api_error(&json!({"errcode": 40029, "errmsg": "invalid code"})).unwrap();
        assert_eq!(err.errcode, 40029);
        assert_eq!(err.errmsg, "invalid code");
        assert_eq!(err.to_string(), "微信接口错误 40029: invalid code");
    }

    #[test]
    fn test_success_bodies_pass() {
        assert!(wechat_api_error(&json!({"errcode": 0, "errmsg": "ok"})).is_none());
        assert!(wechat_api_error(&json!({"access_token": "t", "openid": "o"})).is_none());
    }
}
