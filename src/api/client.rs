//! API client for communicating with the Nova REST API.
//!
//! Every screen dispatches requests through clones of `ApiClient`; the
//! client attaches the bearer credential and checks each response at a
//! single point, so individual screens never handle 401 themselves.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::{header, Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};

use crate::auth::SessionData;
use crate::models::{Analysis, DicomInfo, DicomPage, Role, UserPage};

use super::ApiError;

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// One-shot latch raised by the response interceptor when any request
/// observes HTTP 401.
///
/// The main loop drains the latch once per tick, so a burst of concurrent
/// 401s (several screens refreshing at once) triggers exactly one logout
/// transition. This is the navigation capability injected into the client;
/// it carries no dependency on the UI.
#[derive(Clone, Default)]
pub struct UnauthorizedLatch(Arc<AtomicBool>);

impl UnauthorizedLatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Returns true if the latch was raised since the last drain, and
    /// clears it.
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::SeqCst)
    }
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    username: String,
    role: Role,
    token: String,
}

/// API client for the Nova backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
    unauthorized: UnauthorizedLatch,
}

impl ApiClient {
    /// Create a new API client for the given base URL. The latch is shared
    /// with the owner so that 401 observations can force navigation back
    /// to the login screen.
    pub fn new(base_url: impl Into<String>, unauthorized: UnauthorizedLatch) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
            unauthorized,
        })
    }

    /// Set the bearer token for authenticated requests
    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    /// Drop the bearer token; subsequent requests carry no credential.
    pub fn clear_token(&mut self) {
        self.token = None;
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Create a clone with the given token, sharing the connection pool.
    pub fn with_token(&self, token: String) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: Some(token),
            unauthorized: self.unauthorized.clone(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn auth_headers(&self) -> Result<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        if let Some(ref token) = self.token {
            headers.insert(
                header::AUTHORIZATION,
                header::HeaderValue::from_str(&format!("Bearer {}", token))?,
            );
        }
        Ok(headers)
    }

    /// The single response interception point. Success passes through;
    /// 401 raises the unauthorized latch before the error is returned to
    /// the caller (the failure is re-raised, never swallowed); every other
    /// status maps to an `ApiError` with no side effect.
    async fn check_response(&self, response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if status == StatusCode::UNAUTHORIZED {
            self.unauthorized.raise();
        }

        Err(ApiError::from_status(status, &body).into())
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        let response = self
            .client
            .get(&url)
            .headers(self.auth_headers()?)
            .send()
            .await
            .with_context(|| format!("Failed to send GET request to {}", url))?;

        let response = self.check_response(response).await?;

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON response from {}", url))
    }

    // ===== Authentication =====

    /// Exchange credentials for a session. This is the only endpoint that
    /// carries no bearer header.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<SessionData> {
        let url = self.url("/auth/login");
        let body = serde_json::json!({
            "username": username,
            "password": password,
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .context("Failed to send login request")?;

        let response = self.check_response(response).await?;

        let login: LoginResponse = response
            .json()
            .await
            .context("Failed to parse login response")?;

        Ok(SessionData {
            token: login.token,
            username: login.username,
            role: login.role,
        })
    }

    // ===== Data Fetching Methods =====

    /// Fetch the aggregate analysis counters for the dashboard
    pub async fn fetch_analysis(&self) -> Result<Analysis> {
        self.get_json("/admin/dicoms/analysis").await
    }

    /// Fetch the imaging records awaiting review
    pub async fn fetch_pending_list(&self) -> Result<Vec<DicomInfo>> {
        self.get_json("/admin/dicoms/pending-list").await
    }

    /// Fetch one page of imaging records
    pub async fn fetch_dicom_page(&self, page: i64) -> Result<DicomPage> {
        self.get_json(&format!("/dicom/list/{}", page)).await
    }

    /// Fetch the account listing
    pub async fn fetch_users(&self, limit: i64) -> Result<UserPage> {
        self.get_json(&format!("/admin/users?limit={}", limit)).await
    }

    // ===== Account Mutations =====

    pub async fn create_user(&self, username: &str, role: Role, password: &str) -> Result<()> {
        let url = self.url("/admin/users");
        let body = serde_json::json!({
            "username": username,
            "role": role,
            "password": password,
        });

        let response = self
            .client
            .post(&url)
            .headers(self.auth_headers()?)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Failed to send POST request to {}", url))?;

        self.check_response(response).await?;
        Ok(())
    }

    pub async fn update_user(&self, id: i64, username: &str, role: Role) -> Result<()> {
        let url = self.url(&format!("/admin/users/{}", id));
        let body = serde_json::json!({
            "username": username,
            "role": role,
        });

        let response = self
            .client
            .put(&url)
            .headers(self.auth_headers()?)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Failed to send PUT request to {}", url))?;

        self.check_response(response).await?;
        Ok(())
    }

    pub async fn delete_user(&self, id: i64) -> Result<()> {
        let url = self.url(&format!("/admin/users/{}", id));

        let response = self
            .client
            .delete(&url)
            .headers(self.auth_headers()?)
            .send()
            .await
            .with_context(|| format!("Failed to send DELETE request to {}", url))?;

        self.check_response(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> ApiClient {
        ApiClient::new("http://api.test/", UnauthorizedLatch::new())
            .expect("Failed to build client")
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = test_client();
        assert_eq!(client.url("/auth/login"), "http://api.test/auth/login");
        assert_eq!(client.url("/dicom/list/3"), "http://api.test/dicom/list/3");
    }

    #[test]
    fn test_bearer_header_follows_token() {
        let mut client = test_client();
        assert!(client.auth_headers().unwrap().is_empty());

        client.set_token("tok-123".to_string());
        let headers = client.auth_headers().unwrap();
        assert_eq!(
            headers.get(header::AUTHORIZATION).unwrap(),
            "Bearer tok-123"
        );

        client.clear_token();
        assert!(client.auth_headers().unwrap().is_empty());
        assert!(!client.has_token());
    }

    #[test]
    fn test_with_token_shares_latch() {
        let latch = UnauthorizedLatch::new();
        let client = ApiClient::new("http://api.test", latch.clone()).unwrap();
        let authed = client.with_token("tok-123".to_string());

        authed.unauthorized.raise();
        assert!(latch.take());
    }

    #[test]
    fn test_latch_drains_once_per_burst() {
        let latch = UnauthorizedLatch::new();

        // Several concurrent requests all observe a 401
        latch.raise();
        latch.raise();
        latch.raise();

        // The main loop sees exactly one pending transition
        assert!(latch.take());
        assert!(!latch.take());
    }

    #[test]
    fn test_parse_login_response() {
        let json = r#"{"username": "alice", "role": "ADMIN", "token": "tok-123"}"#;
        let login: LoginResponse = serde_json::from_str(json).expect("Failed to parse login");
        assert_eq!(login.username, "alice");
        assert_eq!(login.role, Role::Admin);
        assert_eq!(login.token, "tok-123");
    }
}
