use crate::api::models::{
    Envelope, LoginRequest, LoginRequestData, LoginResponseData, QueryRequest, QueryResponseData,
};
use crate::error::ApiError;
use crate::utils::error_helpers::{convert_json_error, convert_request_error};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
const USER_AGENT: &str = concat!("snowparam/", env!("CARGO_PKG_VERSION"));
const CLIENT_APP_ID: &str = "snowparam";
const SNOWFLAKE_DOMAIN: &str = "snowflakecomputing.com";

const LOGIN_ENDPOINT: &str = "/session/v1/login-request";
const QUERY_ENDPOINT: &str = "/queries/v1/query-request";
const LOGOUT_ENDPOINT: &str = "/session?delete=true";

/// Thin client for the Snowflake session and query REST endpoints.
#[derive(Debug)]
pub struct SnowflakeClient {
    client: Client,
    pub base_url: String,
    timeout_secs: u64,
    session_token: Option<String>,
    sequence: AtomicU64,
}

impl SnowflakeClient {
    // Create client with the given base URL and request timeout
    pub fn new(base_url: String, timeout_secs: u64) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| convert_request_error(e, "client_init", timeout_secs))?;

        Ok(SnowflakeClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_secs,
            session_token: None,
            sequence: AtomicU64::new(0),
        })
    }

    /// Default base URL for an account identifier such as `xy12345.us-east-1`
    /// or `myorg-myaccount`.
    pub fn base_url_for_account(account: &str) -> String {
        let account = account.trim().trim_end_matches('/');
        let account = account
            .strip_prefix("https://")
            .unwrap_or(account)
            .trim_end_matches(&format!(".{}", SNOWFLAKE_DOMAIN));
        format!("https://{}.{}", account, SNOWFLAKE_DOMAIN)
    }

    /// The login `ACCOUNT_NAME`: the identifier up to the first dot.
    pub fn account_name(account: &str) -> String {
        let account = account.trim();
        let account = account.strip_prefix("https://").unwrap_or(account);
        account.split('.').next().unwrap_or(account).to_string()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session_token.is_some()
    }

    pub fn build_request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self
            .client
            .request(method, url)
            .header("Accept", "application/json");

        if let Some(token) = &self.session_token {
            request = request.header("Authorization", format!("Snowflake Token=\"{}\"", token));
        }

        request
    }

    /// Log in with user/password and keep the session token.
    pub async fn login(
        &mut self,
        account: &str,
        user: &str,
        password: &str,
        role: Option<&str>,
    ) -> Result<(), ApiError> {
        let body = LoginRequest {
            data: LoginRequestData {
                client_app_id: CLIENT_APP_ID.to_string(),
                client_app_version: env!("CARGO_PKG_VERSION").to_string(),
                account_name: Self::account_name(account),
                login_name: user.to_string(),
                password: password.to_string(),
            },
        };

        let mut request = self
            .build_request(Method::POST, LOGIN_ENDPOINT)
            .query(&[("request_id", uuid::Uuid::new_v4().to_string())]);
        if let Some(role) = role.filter(|r| !r.is_empty()) {
            request = request.query(&[("roleName", role)]);
        }

        tracing::debug!("Logging in to {} as {}", self.base_url, user);
        let response = request
            .json(&body)
            .send()
            .await
            .map_err(|e| convert_request_error(e, LOGIN_ENDPOINT, self.timeout_secs))?;

        let data: LoginResponseData = self.handle_envelope(response, LOGIN_ENDPOINT).await?;
        let token = data.token.ok_or_else(|| ApiError::Http {
            status: 200,
            endpoint: LOGIN_ENDPOINT.to_string(),
            message: "Login response did not contain a session token".to_string(),
        })?;

        tracing::debug!("Login succeeded (session id {:?})", data.session_id);
        self.session_token = Some(token);
        Ok(())
    }

    /// Run one statement synchronously and return the raw result data.
    pub async fn execute(&self, sql: &str) -> Result<QueryResponseData, ApiError> {
        if !self.is_authenticated() {
            return Err(ApiError::Unauthorized {
                status: 401,
                endpoint: QUERY_ENDPOINT.to_string(),
                server_message: "No active session".to_string(),
            });
        }

        let body = QueryRequest {
            sql_text: sql.to_string(),
            async_exec: false,
            sequence_id: self.sequence.fetch_add(1, Ordering::Relaxed) + 1,
        };

        tracing::debug!("Executing: {}", sql);
        let response = self
            .build_request(Method::POST, QUERY_ENDPOINT)
            .query(&[("requestId", uuid::Uuid::new_v4().to_string())])
            .json(&body)
            .send()
            .await
            .map_err(|e| convert_request_error(e, QUERY_ENDPOINT, self.timeout_secs))?;

        self.handle_envelope(response, QUERY_ENDPOINT).await
    }

    /// Close the server-side session. A client without a session is a no-op.
    pub async fn logout(&mut self) -> Result<(), ApiError> {
        if !self.is_authenticated() {
            return Ok(());
        }

        let response = self
            .build_request(Method::POST, LOGOUT_ENDPOINT)
            .send()
            .await
            .map_err(|e| convert_request_error(e, LOGOUT_ENDPOINT, self.timeout_secs));

        // The token is unusable afterwards whatever the server says
        self.session_token = None;

        let response = response?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ApiError::Http {
                status: status.as_u16(),
                endpoint: LOGOUT_ENDPOINT.to_string(),
                message: response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string()),
            })
        }
    }

    async fn handle_envelope<T>(&self, response: Response, endpoint: &str) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            return match status.as_u16() {
                401 | 403 => Err(ApiError::Unauthorized {
                    status: status.as_u16(),
                    endpoint: endpoint.to_string(),
                    server_message: error_text,
                }),
                408 | 504 => Err(ApiError::Timeout {
                    timeout_secs: self.timeout_secs,
                    endpoint: endpoint.to_string(),
                }),
                _ => Err(ApiError::Http {
                    status: status.as_u16(),
                    endpoint: endpoint.to_string(),
                    message: error_text,
                }),
            };
        }

        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| convert_json_error(e, endpoint))?;

        if !envelope.success {
            return Err(ApiError::Snowflake {
                code: envelope.code.unwrap_or_else(|| "unknown".to_string()),
                endpoint: endpoint.to_string(),
                message: envelope
                    .message
                    .unwrap_or_else(|| "Request was not successful".to_string()),
            });
        }

        envelope.data.ok_or_else(|| ApiError::Http {
            status: status.as_u16(),
            endpoint: endpoint.to_string(),
            message: "Response envelope has no data".to_string(),
        })
    }
}
