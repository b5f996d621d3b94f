//! Shared HTTP plumbing for provider bindings

use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use crate::constants::network::CONNECTION_TIMEOUT_SECS;
use crate::types::{ErrorCategory, ErrorClassifier, LlmError, Result};

pub(super) fn build_client(timeout_secs: u64, provider: &str) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(CONNECTION_TIMEOUT_SECS))
        .build()
        .map_err(|e| {
            LlmError::with_provider(
                ErrorCategory::Unknown,
                format!("Failed to create HTTP client: {}", e),
                provider,
            )
            .into()
        })
}

/// Send a request and decode a JSON body, classifying every failure
pub(super) async fn send_json<T: DeserializeOwned>(
    request: RequestBuilder,
    provider: &str,
) -> Result<T> {
    let response = request
        .send()
        .await
        .map_err(|e| ErrorClassifier::classify_transport(&e, provider))?;

    let response = check_status(response, provider).await?;

    response.json::<T>().await.map_err(|e| {
        LlmError::with_provider(
            ErrorCategory::ParseError,
            format!("Failed to parse {} response: {}", provider, e),
            provider,
        )
        .into()
    })
}

async fn check_status(response: Response, provider: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs);

    let body = response.text().await.unwrap_or_default();
    debug!("{} returned {}: {}", provider, status, body);

    let mut err = ErrorClassifier::classify_http_status(
        status.as_u16(),
        &format!("{} API error ({}): {}", provider, status, body),
        provider,
    );
    if let Some(delay) = retry_after {
        err = err.retry_after(delay);
    }
    Err(err.into())
}

/// Join a base URL and a path without doubling slashes
pub(super) fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
