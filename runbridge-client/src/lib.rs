//! Runbridge HTTP Client
//!
//! A simple, type-safe HTTP client for a managed compute platform's run API
//! (`/api/2.0/jobs/runs/*`).
//!
//! The client is constructed explicitly and passed to whoever needs it; there
//! is no process-wide configuration. It also implements
//! [`RunPlatform`](runbridge_core::lifecycle::RunPlatform) so it can be handed
//! straight to a [`RunLifecycleMonitor`](runbridge_core::lifecycle::RunLifecycleMonitor).
//!
//! # Example
//!
//! ```no_run
//! use runbridge_client::PlatformClient;
//! use runbridge_core::dto::run::RunSpec;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = PlatformClient::new("http://localhost:8085").with_token("dapi-token");
//!
//!     let handle = client.submit_run(&RunSpec {
//!         run_name: "nightly".to_string(),
//!         ..Default::default()
//!     }).await?;
//!
//!     println!("Submitted run: {}", handle);
//!     Ok(())
//! }
//! ```

pub mod error;
mod platform;
mod runs;

// Re-export commonly used types
pub use error::{ClientError, Result};

use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;

/// Path prefix of the platform's REST API
const API_PREFIX: &str = "/api/2.0";

/// HTTP client for the platform's run API
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct PlatformClient {
    /// Base URL of the platform (e.g., "https://adb-123.azuredatabricks.net")
    base_url: String,
    /// Personal access token sent as a bearer token
    token: Option<String>,
    /// HTTP client instance
    client: Client,
}

impl PlatformClient {
    /// Create a new platform client
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the platform (e.g., "http://localhost:8085")
    ///
    /// # Example
    /// ```
    /// use runbridge_client::PlatformClient;
    ///
    /// let client = PlatformClient::new("http://localhost:8085");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new platform client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    ///
    /// # Example
    /// ```
    /// use runbridge_client::PlatformClient;
    /// use reqwest::Client;
    /// use std::time::Duration;
    ///
    /// let http_client = Client::builder()
    ///     .timeout(Duration::from_secs(30))
    ///     .build()
    ///     .unwrap();
    ///
    /// let client = PlatformClient::with_client("http://localhost:8085", http_client);
    /// ```
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
            client,
        }
    }

    /// Authenticate every request with a bearer token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Get the base URL of the platform
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a request against an API path such as `jobs/runs/get`
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}/{}", self.base_url, API_PREFIX, path);
        let builder = self.client.request(method, url);

        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    ///
    /// This method checks the status code and returns an appropriate error if
    /// the request failed, or deserializes the response body if successful.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let response = Self::check_status(response).await?;

        response
            .json()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }

    /// Handle an API response whose body may be empty or `null`
    async fn handle_optional_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<Option<T>> {
        let response = Self::check_status(response).await?;
        let body = response.text().await?;

        if body.trim().is_empty() {
            return Ok(None);
        }

        serde_json::from_str(&body)
            .map_err(|e| ClientError::Decode(e.to_string()))
    }

    /// Handle an API response that carries no meaningful body (cancel, delete)
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<()> {
        Self::check_status(response).await?;
        Ok(())
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::from_response(status.as_u16(), &body));
        }

        Ok(response)
    }
}
