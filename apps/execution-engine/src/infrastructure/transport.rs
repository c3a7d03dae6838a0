//! Shared reqwest plumbing for the provider adapters.
//!
//! Every response is classified into a [`ProviderError`] here, so adapters
//! only deal with decoded payloads.

use std::time::Duration;

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

use crate::application::ports::ProviderError;
use crate::resilience::RetryAfterExtractor;

/// Build a client with a per-request deadline.
///
/// # Errors
///
/// Returns [`ProviderError::Transport`] if the TLS backend fails to load.
pub fn build_client(timeout: Duration) -> Result<Client, ProviderError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ProviderError::Transport {
            message: e.to_string(),
        })
}

/// Classify a transport-level failure.
pub fn classify_send_error(err: &reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout {
            message: err.to_string(),
        }
    } else {
        ProviderError::Transport {
            message: err.to_string(),
        }
    }
}

/// Decode a JSON body, classifying non-success statuses.
///
/// # Errors
///
/// Returns the classified status error or [`ProviderError::InvalidResponse`].
pub async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ProviderError> {
    let status = response.status();
    if !status.is_success() {
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(RetryAfterExtractor::parse);
        let body = response.text().await.unwrap_or_default();
        return Err(ProviderError::from_status(status.as_u16(), &body, retry_after));
    }

    let text = response.text().await.map_err(|e| classify_send_error(&e))?;
    serde_json::from_str(&text).map_err(|e| ProviderError::InvalidResponse {
        message: e.to_string(),
    })
}
