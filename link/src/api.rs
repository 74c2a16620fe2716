//! Outbound HTTP requests to the wallet backend.
//!
//! Every call goes through [`ApiClient::request`], which attaches the bearer
//! token, sends JSON and unwraps the `{data, message}` envelope. Any non-2xx
//! status becomes [`WalletLinkError::ApiError`] carrying the backend's own
//! message. Requests are never retried.

use std::time::Instant;

use log::{debug, warn};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::{
    auth::AuthProvider,
    error::{Result, WalletLinkError, FALLBACK_ERROR_MESSAGE},
    models::{ApiEnvelope, ErrorEnvelope},
};

/// Sends requests to the backend API.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    http_client: reqwest::Client,
}

impl ApiClient {
    pub(crate) fn new(base_url: String, http_client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send `body` as JSON to `endpoint` and decode the response envelope.
    ///
    /// `endpoint` is appended to the base URL as is, including any query
    /// string. A bearer header is attached when `token` is given.
    pub async fn request<T, B>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&B>,
        token: Option<&str>,
    ) -> Result<ApiEnvelope<T>>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, endpoint);
        let mut req_builder = self
            .http_client
            .request(method.clone(), &url)
            .header(reqwest::header::CONTENT_TYPE, "application/json");
        if let Some(body) = body {
            req_builder = req_builder.json(body);
        }
        req_builder = AuthProvider::from_token(token).apply_to_request(req_builder);

        let start = Instant::now();
        debug!("[API] Sending {} {}", method, endpoint);

        let response = match req_builder.send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(
                    "[API] Transport error: {} {} error=\"{}\" duration_ms={}",
                    method,
                    endpoint,
                    e,
                    start.elapsed().as_millis()
                );
                return Err(e.into());
            },
        };

        let status = response.status();
        let text = response.text().await?;
        debug!(
            "[API] Response received: {} {} status={} duration_ms={}",
            method,
            endpoint,
            status,
            start.elapsed().as_millis()
        );

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&text)
                .ok()
                .and_then(|envelope| envelope.message)
                .filter(|message| !message.is_empty())
                .unwrap_or_else(|| FALLBACK_ERROR_MESSAGE.to_string());

            warn!(
                "[API] Request rejected: {} {} status={} message=\"{}\"",
                method, endpoint, status, message
            );
            return Err(WalletLinkError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        if text.trim().is_empty() {
            return Ok(ApiEnvelope::empty());
        }
        Ok(serde_json::from_str(&text)?)
    }

    /// Like [`request`](Self::request) but requires `data` to be present.
    pub async fn request_data<T, B>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&B>,
        token: Option<&str>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(method, endpoint, body, token)
            .await?
            .data
            .ok_or_else(|| WalletLinkError::EmptyResponse(endpoint.to_string()))
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient").field("base_url", &self.base_url).finish()
    }
}
