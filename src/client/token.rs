//! 令牌端点：授权码交换、刷新、撤销

use reqwest::header::ACCEPT;
use tracing::{debug, warn};

use super::http::{self, ErrorFactory};
use super::{OAuth2Client, TokenResponse};
use crate::config::ProtocolDialect;
use crate::error::{OAuth2Error, OAuth2Result};

impl OAuth2Client {
    /// 授权码换取令牌
    ///
    /// 标准方言 POST 表单；微信方言 GET 查询参数
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
        code_verifier: Option<&str>,
    ) -> OAuth2Result<TokenResponse> {
        let endpoint = &self.config.access_token_endpoint;
        debug!(provider = %self.name(), endpoint = %endpoint, "授权码换取令牌");

        let request = match self.config.dialect {
            ProtocolDialect::WeChat => self.http_client.get(endpoint).query(&[
                ("appid", self.credentials.client_id.as_str()),
                ("secret", self.credentials.client_secret.as_str()),
                ("code", code),
                ("grant_type", "authorization_code"),
            ]),
            ProtocolDialect::Standard => {
                let mut form = vec![
                    ("grant_type", "authorization_code"),
                    ("code", code),
                    ("redirect_uri", redirect_uri),
                ];
                if let Some(verifier) = code_verifier {
                    form.push(("code_verifier", verifier));
                }
                self.token_request(endpoint, form)
            }
        };

        self.send_for_token(request, OAuth2Error::access_token::<String>)
            .await
    }

    /// 刷新令牌
    pub async fn refresh_token(&self, refresh_token: &str) -> OAuth2Result<TokenResponse> {
        let Some(endpoint) = self.config.refresh_token_endpoint.as_deref() else {
            warn!(provider = %self.name(), "未配置刷新令牌端点");
            return Err(OAuth2Error::refresh_token("refresh token address is missing", None));
        };
        debug!(provider = %self.name(), endpoint = %endpoint, "刷新令牌");

        let request = match self.config.dialect {
            ProtocolDialect::WeChat => self.http_client.get(endpoint).query(&[
                ("appid", self.credentials.client_id.as_str()),
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ]),
            ProtocolDialect::Standard => self.token_request(
                endpoint,
                vec![
                    ("grant_type", "refresh_token"),
                    ("refresh_token", refresh_token),
                ],
            ),
        };

        self.send_for_token(request, OAuth2Error::refresh_token::<String>)
            .await
    }

    /// 撤销令牌
    ///
    /// 只检查状态码，不解析响应体
    pub async fn revoke_token(&self, token: &str, token_type_hint: Option<&str>) -> OAuth2Result<()> {
        let Some(endpoint) = self.config.revoke_token_endpoint.as_deref() else {
            warn!(provider = %self.name(), "未配置撤销令牌端点");
            return Err(OAuth2Error::revoke_token("revoke token address is missing", None));
        };
        debug!(provider = %self.name(), endpoint = %endpoint, "撤销令牌");

        let mut form = vec![("token", token)];
        if let Some(hint) = token_type_hint {
            form.push(("token_type_hint", hint));
        }

        let mut request = self
            .http_client
            .post(endpoint)
            .header(ACCEPT, "application/json")
            .form(&form);
        if self.config.revoke_token_endpoint_basic_auth {
            request = request.basic_auth(
                &self.credentials.client_id,
                Some(&self.credentials.client_secret),
            );
        }

        http::send(self.name(), request).await?;
        Ok(())
    }

    /// 构造令牌端点表单请求，按配置选择 Basic 认证或表单凭证
    fn token_request<'a>(
        &'a self,
        endpoint: &str,
        mut form: Vec<(&'a str, &'a str)>,
    ) -> reqwest::RequestBuilder {
        let request = self.http_client.post(endpoint).header(ACCEPT, "application/json");
        if self.config.token_endpoint_basic_auth {
            request
                .basic_auth(
                    &self.credentials.client_id,
                    Some(&self.credentials.client_secret),
                )
                .form(&form)
        } else {
            form.push(("client_id", self.credentials.client_id.as_str()));
            form.push(("client_secret", self.credentials.client_secret.as_str()));
            request.form(&form)
        }
    }

    async fn send_for_token(
        &self,
        request: reqwest::RequestBuilder,
        on_error: ErrorFactory,
    ) -> OAuth2Result<TokenResponse> {
        let snapshot = http::send(self.name(), request).await?;
        let map = http::parse_object(self.name(), snapshot, on_error)?;
        Ok(TokenResponse::from(map))
    }
}
