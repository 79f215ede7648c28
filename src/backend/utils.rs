use reqwest::Response;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{error, trace, warn};

use crate::error::TransportError;

/// Strip a Markdown code fence wrapped around a model response, if present.
///
/// Handles ```` ```json ... ``` ```` and bare ```` ``` ... ``` ````; text that
/// isn't fenced comes back trimmed but otherwise untouched, so stripping is
/// idempotent.
pub fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();

    let Some(after_open) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    match after_open.find('\n') {
        // Skip the rest of the opening line (language tag)
        Some(newline) => {
            let body = &after_open[newline + 1..];
            match body.rfind("```") {
                Some(close) => body[..close].trim(),
                None => trimmed,
            }
        }
        None => match after_open.strip_suffix("```") {
            Some(body) => body.trim(),
            None => trimmed,
        },
    }
}

/// Convert a reqwest error to a TransportError.
///
/// None of these carry an HTTP status, so all of them are transient; the
/// variant only records where the exchange broke.
pub fn handle_http_error(e: reqwest::Error, provider_name: &str) -> TransportError {
    error!(error = %e, "HTTP request to {} failed", provider_name);
    if e.is_timeout() {
        TransportError::Timeout
    } else if e.is_connect() {
        TransportError::Connect(e.to_string())
    } else if e.is_body() {
        TransportError::Body(e.to_string())
    } else if e.is_decode() {
        TransportError::Decode(e.to_string())
    } else {
        TransportError::Request(e.to_string())
    }
}

/// Check HTTP response status and extract the error body if unsuccessful.
pub async fn check_response_status(
    response: Response,
    provider_name: &str,
) -> Result<Response, TransportError> {
    if !response.status().is_success() {
        let status = response.status();
        let error_text = response.text().await.unwrap_or_default();
        error!(
            status = %status,
            error = %error_text,
            "{} API returned error response", provider_name
        );
        return Err(TransportError::Status {
            provider: provider_name.to_string(),
            status: status.as_u16(),
            body: error_text,
        });
    }
    Ok(response)
}

/// Read the response body and decode it as JSON.
pub async fn decode_json<T: DeserializeOwned>(
    response: Response,
    provider_name: &str,
) -> Result<T, TransportError> {
    let body = response
        .text()
        .await
        .map_err(|e| handle_http_error(e, provider_name))?;
    trace!(body_len = body.len(), "Read {} response body", provider_name);
    serde_json::from_str(&body).map_err(|e| {
        error!(error = %e, "Failed to parse JSON response from {}", provider_name);
        TransportError::Decode(e.to_string())
    })
}

/// Build a reqwest client, applying the timeout when one is configured.
pub fn build_http_client(timeout: Option<Duration>) -> reqwest::Client {
    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout).connect_timeout(timeout);
    }
    builder.build().unwrap_or_else(|e| {
        warn!(error = %e, "Failed to build reqwest client with timeout, using default");
        reqwest::Client::new()
    })
}

/// Macro to generate standard builder methods for LLM clients.
///
/// This macro generates `model()`, `temperature()`, `max_tokens()`,
/// `timeout()` and `base_url()` methods that are identical across the
/// provider adapters.
#[macro_export]
macro_rules! impl_client_builder_methods {
    (
        client_type: $client:ty,
        provider_name: $provider:expr
    ) => {
        impl $client {
            /// Set the model to use
            #[tracing::instrument(skip(self, model))]
            pub fn model(mut self, model: impl Into<String>) -> Self {
                let model = model.into();
                tracing::debug!(
                    previous_model = %self.config.model,
                    new_model = %model,
                    "Setting {} model", $provider
                );
                self.config.model = model;
                self
            }

            /// Set the sampling temperature
            #[tracing::instrument(skip(self))]
            pub fn temperature(mut self, temp: f32) -> Self {
                tracing::debug!(
                    previous_temp = self.config.temperature,
                    new_temp = temp,
                    "Setting temperature"
                );
                self.config.temperature = temp;
                self
            }

            /// Set the maximum tokens to generate
            #[tracing::instrument(skip(self))]
            pub fn max_tokens(mut self, max: u32) -> Self {
                tracing::debug!(
                    previous_max = ?self.config.max_tokens,
                    new_max = max,
                    "Setting max_tokens"
                );
                // At least 1, or the API rejects the request
                self.config.max_tokens = Some(max.max(1));
                self
            }

            /// Set the timeout for HTTP requests.
            ///
            /// Applies to connecting and to the whole request, for every
            /// request made by the client.
            #[tracing::instrument(skip(self))]
            pub fn timeout(mut self, timeout: std::time::Duration) -> Self {
                tracing::debug!(
                    previous_timeout = ?self.config.timeout,
                    new_timeout = ?timeout,
                    "Setting timeout"
                );
                self.config.timeout = Some(timeout);
                self.client = $crate::backend::build_http_client(Some(timeout));
                self
            }

            /// Set a custom base URL (no trailing slash), e.g. for a
            /// compatible self-hosted endpoint or a test server.
            #[tracing::instrument(skip(self, base_url))]
            pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
                let base_url = base_url.into();
                tracing::debug!(
                    previous_base_url = %self.config.base_url,
                    new_base_url = %base_url,
                    "Setting custom base URL"
                );
                self.config.base_url = base_url.trim_end_matches('/').to_string();
                self
            }
        }
    };
}
