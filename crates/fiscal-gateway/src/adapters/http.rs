//! reqwest-backed transport used by both production channels.

use std::time::Duration;

use async_trait::async_trait;
use fiscal_types::FiscalError;
use reqwest::header::CONTENT_TYPE;

use crate::domain::entities::{RawResponse, WireRequest};
use crate::ports::outbound::Transport;

/// Default outbound deadline.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP POST transport with a fixed deadline.
///
/// The underlying client pools connections per host; one transport instance
/// can be shared across adapters of the same tenant.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, FiscalError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, FiscalError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FiscalError::Config(format!("http client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: WireRequest) -> Result<RawResponse, FiscalError> {
        let mut builder = self
            .client
            .post(&request.endpoint)
            .header(CONTENT_TYPE, request.content_type)
            .body(request.body);
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        let response = builder
            .send()
            .await
            .map_err(|e| FiscalError::Transport(format!("send failed: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(FiscalError::Transport(format!(
                "provider returned http {status}"
            )));
        }
        let body = response
            .text()
            .await
            .map_err(|e| FiscalError::Transport(format!("body read failed: {e}")))?;
        Ok(RawResponse::new(body))
    }
}
