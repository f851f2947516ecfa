//! Configuration module
//!
//! Handles CLI configuration including the platform URL and credentials.

use runbridge_client::PlatformClient;

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the platform workspace
    pub platform_url: String,

    /// Personal access token, sent as a bearer token when present
    pub token: Option<String>,
}

impl Config {
    /// Builds a client for the configured platform
    pub fn client(&self) -> PlatformClient {
        let client = PlatformClient::new(self.platform_url.clone());
        match &self.token {
            Some(token) => client.with_token(token.clone()),
            None => client,
        }
    }
}
