//! Typed wallet API client with builder pattern.
//!
//! Wraps [`ApiClient`] with one method per backend endpoint. The client
//! holds no session: callers pass the bearer token for each call, usually
//! taken from the [`SessionStore`](crate::SessionStore).

use crate::{
    api::ApiClient,
    error::{Result, WalletLinkError},
    models::{
        LoginRequest, TopUpRequest, TransactionListResponse, TransactionResponse,
        TransferRequest, UserProfile, UserResponse, WalletMutationListResponse, WalletResponse,
    },
    timeouts::LinkTimeouts,
};
use reqwest::Method;

/// Default page size of `GET /transactions`.
pub const DEFAULT_TRANSACTIONS_LIMIT: u32 = 10;
/// Default page size of `GET /wallet-mutations`.
pub const DEFAULT_MUTATIONS_LIMIT: u32 = 20;

/// Wallet backend client.
///
/// # Examples
///
/// ```rust,no_run
/// use wallet_link::WalletLinkClient;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = WalletLinkClient::builder()
///     .base_url("http://localhost:8080/api")
///     .build()?;
///
/// let user = client.login("alice", "p1").await?;
/// let profile = client.me(&user.token).await?;
/// println!("{} has role {}", profile.username, profile.role);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct WalletLinkClient {
    api: ApiClient,
    ws_url: Option<String>,
    timeouts: LinkTimeouts,
}

impl WalletLinkClient {
    pub fn builder() -> WalletLinkClientBuilder {
        WalletLinkClientBuilder::new()
    }

    /// Low-level access to envelope requests.
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn base_url(&self) -> &str {
        self.api.base_url()
    }

    /// Realtime channel endpoint, if configured.
    pub fn ws_url(&self) -> Option<&str> {
        self.ws_url.as_deref()
    }

    pub fn timeouts(&self) -> &LinkTimeouts {
        &self.timeouts
    }

    /// `POST /users/login`
    pub async fn login(&self, username: &str, password: &str) -> Result<UserResponse> {
        log::debug!("[LOGIN] Authenticating user '{}'", username);
        let request = LoginRequest::new(username, password);
        self.api
            .request_data(Method::POST, "/users/login", Some(&request), None)
            .await
    }

    /// `POST /users/register`
    pub async fn register(&self, username: &str, password: &str) -> Result<UserResponse> {
        log::debug!("[LOGIN] Registering user '{}'", username);
        let request = LoginRequest::new(username, password);
        self.api
            .request_data(Method::POST, "/users/register", Some(&request), None)
            .await
    }

    /// `GET /users/me`
    pub async fn me(&self, token: &str) -> Result<UserProfile> {
        self.api
            .request_data::<_, ()>(Method::GET, "/users/me", None, Some(token))
            .await
    }

    /// `POST /users/logout`
    pub async fn logout(&self, token: &str) -> Result<()> {
        self.api
            .request::<serde_json::Value, ()>(Method::POST, "/users/logout", None, Some(token))
            .await
            .map(|_| ())
    }

    /// `GET /wallets/me`
    pub async fn my_wallet(&self, token: &str) -> Result<WalletResponse> {
        self.api
            .request_data::<_, ()>(Method::GET, "/wallets/me", None, Some(token))
            .await
    }

    /// `POST /transactions/transfer`
    pub async fn transfer(
        &self,
        token: &str,
        request: &TransferRequest,
    ) -> Result<TransactionResponse> {
        self.api
            .request_data(Method::POST, "/transactions/transfer", Some(request), Some(token))
            .await
    }

    /// `POST /transactions/topup` (super admin only)
    pub async fn top_up(&self, token: &str, request: &TopUpRequest) -> Result<TransactionResponse> {
        self.api
            .request_data(Method::POST, "/transactions/topup", Some(request), Some(token))
            .await
    }

    /// `GET /transactions?page&limit`, defaulting to page 1 of 10.
    pub async fn list_transactions(
        &self,
        token: &str,
        page: Option<u32>,
        limit: Option<u32>,
    ) -> Result<TransactionListResponse> {
        let endpoint = format!(
            "/transactions?page={}&limit={}",
            page.unwrap_or(1),
            limit.unwrap_or(DEFAULT_TRANSACTIONS_LIMIT)
        );
        self.api
            .request_data::<_, ()>(Method::GET, &endpoint, None, Some(token))
            .await
    }

    /// `GET /wallet-mutations?page&limit`, defaulting to page 1 of 20.
    pub async fn list_wallet_mutations(
        &self,
        token: &str,
        page: Option<u32>,
        limit: Option<u32>,
    ) -> Result<WalletMutationListResponse> {
        let endpoint = format!(
            "/wallet-mutations?page={}&limit={}",
            page.unwrap_or(1),
            limit.unwrap_or(DEFAULT_MUTATIONS_LIMIT)
        );
        self.api
            .request_data::<_, ()>(Method::GET, &endpoint, None, Some(token))
            .await
    }
}

/// Builder for [`WalletLinkClient`].
pub struct WalletLinkClientBuilder {
    base_url: Option<String>,
    ws_url: Option<String>,
    timeouts: LinkTimeouts,
}

impl WalletLinkClientBuilder {
    fn new() -> Self {
        Self {
            base_url: None,
            ws_url: None,
            timeouts: LinkTimeouts::default(),
        }
    }

    /// Base URL of the backend API, e.g. `http://localhost:8080/api`
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// WebSocket endpoint of the realtime channel, e.g. `ws://localhost:8080/ws`
    pub fn ws_url(mut self, url: impl Into<String>) -> Self {
        self.ws_url = Some(url.into());
        self
    }

    pub fn timeouts(mut self, timeouts: LinkTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn build(self) -> Result<WalletLinkClient> {
        let base_url = self
            .base_url
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| WalletLinkError::ConfigurationError("base_url is required".into()))?;
        url::Url::parse(&base_url)?;
        if let Some(ws_url) = &self.ws_url {
            url::Url::parse(ws_url)?;
        }

        let mut client_builder = reqwest::Client::builder()
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(std::time::Duration::from_secs(90));
        if !LinkTimeouts::is_no_timeout(self.timeouts.connection_timeout) {
            client_builder = client_builder.connect_timeout(self.timeouts.connection_timeout);
        }
        if !LinkTimeouts::is_no_timeout(self.timeouts.request_timeout) {
            client_builder = client_builder.timeout(self.timeouts.request_timeout);
        }

        let http_client = client_builder
            .build()
            .map_err(|e| WalletLinkError::ConfigurationError(e.to_string()))?;

        Ok(WalletLinkClient {
            api: ApiClient::new(base_url, http_client),
            ws_url: self.ws_url,
            timeouts: self.timeouts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_pattern() {
        let client = WalletLinkClient::builder()
            .base_url("http://localhost:8080/api")
            .ws_url("ws://localhost:8080/ws")
            .timeouts(LinkTimeouts::fast())
            .build()
            .unwrap();

        assert_eq!(client.base_url(), "http://localhost:8080/api");
        assert_eq!(client.ws_url(), Some("ws://localhost:8080/ws"));
    }

    #[test]
    fn test_builder_missing_url() {
        let result = WalletLinkClient::builder().build();
        assert!(matches!(result, Err(WalletLinkError::ConfigurationError(_))));
    }

    #[test]
    fn test_builder_invalid_ws_url() {
        let result = WalletLinkClient::builder()
            .base_url("http://localhost:8080/api")
            .ws_url("not a url")
            .build();
        assert!(matches!(result, Err(WalletLinkError::ConfigurationError(_))));
    }
}
