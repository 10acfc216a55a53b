//! 授权跳转地址构造

use url::form_urlencoded;

use super::OAuth2Client;
use crate::config::ProtocolDialect;
use crate::pkce::{PkceMethod, PkcePair};

/// 授权请求参数
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorizationRequest {
    /// 回调地址
    pub redirect_uri: String,
    /// 防 CSRF 的 state
    pub state: Option<String>,
    /// 授权范围，为空时使用提供商默认值
    pub scopes: Option<Vec<String>>,
    /// PKCE challenge
    pub code_challenge: Option<String>,
    /// PKCE 方法
    pub code_challenge_method: Option<PkceMethod>,
    /// 额外参数，同名时覆盖计算出的参数
    pub extra_params: Vec<(String, String)>,
}

impl AuthorizationRequest {
    /// 以回调地址创建
    pub fn new(redirect_uri: impl Into<String>) -> Self {
        Self {
            redirect_uri: redirect_uri.into(),
            ..Self::default()
        }
    }

    /// 设置 state
    #[must_use]
    pub fn state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    /// 设置授权范围
    #[must_use]
    pub fn scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = Some(scopes.into_iter().map(Into::into).collect());
        self
    }

    /// 设置 PKCE challenge 与方法
    #[must_use]
    pub fn code_challenge(mut self, challenge: impl Into<String>, method: PkceMethod) -> Self {
        self.code_challenge = Some(challenge.into());
        self.code_challenge_method = Some(method);
        self
    }

    /// 使用生成的 PKCE 参数对
    #[must_use]
    pub fn pkce(self, pair: &PkcePair) -> Self {
        self.code_challenge(pair.challenge.clone(), pair.method)
    }

    /// 追加额外参数
    #[must_use]
    pub fn extra_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_params.push((key.into(), value.into()));
        self
    }
}

fn upsert(params: &mut Vec<(String, String)>, key: &str, value: &str) {
    match params.iter_mut().find(|(k, _)| k == key) {
        Some(entry) => value.clone_into(&mut entry.1),
        None => params.push((key.to_string(), value.to_string())),
    }
}

impl OAuth2Client {
    /// 构造授权跳转地址
    ///
    /// 参数顺序固定，额外参数最后合并；微信方言使用 `appid` 并附加 `#wechat_redirect`
    #[must_use]
    pub fn authorization_url(&self, request: &AuthorizationRequest) -> String {
        let wechat = self.config.dialect == ProtocolDialect::WeChat;
        let client_id_key = if wechat { "appid" } else { "client_id" };

        let mut params: Vec<(String, String)> = vec![
            (client_id_key.to_string(), self.credentials.client_id.clone()),
            ("redirect_uri".to_string(), request.redirect_uri.clone()),
            ("response_type".to_string(), "code".to_string()),
        ];
        if wechat {
            params.push(("lang".to_string(), "cn".to_string()));
        }

        if let Some(state) = &request.state {
            params.push(("state".to_string(), state.clone()));
        }

        let scopes = request
            .scopes
            .as_ref()
            .filter(|scopes| !scopes.is_empty())
            .or(self.config.default_scopes.as_ref());
        if let Some(scopes) = scopes {
            params.push((
                "scope".to_string(),
                scopes.join(self.config.scope_separator()),
            ));
        }

        if let Some(challenge) = &request.code_challenge {
            params.push(("code_challenge".to_string(), challenge.clone()));
        }
        if let Some(method) = request.code_challenge_method {
            params.push(("code_challenge_method".to_string(), method.as_str().to_string()));
        }

        for (key, value) in &request.extra_params {
            upsert(&mut params, key, value);
        }

        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(&params)
            .finish();
        let mut url = format!("{}?{query}", self.config.authorize_endpoint);
        if wechat {
            url.push_str("#wechat_redirect");
        }
        url
    }
}
