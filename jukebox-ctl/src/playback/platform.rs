//! REST client for the home-automation platform's service API
//!
//! `POST {base_url}/api/services/{domain}/{service}` with a JSON body and a
//! bearer token. The platform answers once the service call has finished, so
//! a successful response means the command was carried out.

use super::service::{ServiceCall, ServiceCaller};
use crate::error::{Error, Result};
use async_trait::async_trait;
use tracing::debug;

const USER_AGENT: &str = concat!("rfid-jukebox/", env!("CARGO_PKG_VERSION"));

/// Platform API client
pub struct PlatformClient {
    http_client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl PlatformClient {
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self> {
        // No request timeout: a command blocks until the platform answers
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
        })
    }

    fn service_url(&self, call: &ServiceCall) -> String {
        format!(
            "{}/api/services/{}/{}",
            self.base_url, call.address.domain, call.address.service
        )
    }
}

#[async_trait]
impl ServiceCaller for PlatformClient {
    async fn call(&self, call: &ServiceCall) -> Result<()> {
        let url = self.service_url(call);
        debug!("Calling {} with data: {}", call.address, call.data);

        let mut request = self.http_client.post(&url).json(&call.data);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::PlaybackService(format!("{} request failed: {}", call.address, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::PlaybackService(format!(
                "{} returned {}: {}",
                call.address,
                status,
                body.trim()
            )));
        }

        Ok(())
    }
}
