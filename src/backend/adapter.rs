//! Service adapter for the analysis/research backends.
//!
//! Every backend is an opaque prompt-in, text-out service. The adapter
//! submits the prompt with bearer credentials and resolves the reply once
//! into a tagged variant: structured JSON when the completion parses,
//! raw text otherwise. Downstream components consume that one shape.

use crate::config::{BackendConfig, BackendsConfig};
use crate::error::BackendError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// A backend reply, resolved once at the adapter boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BackendReply {
    /// The completion parsed as JSON.
    Structured(Value),
    /// The completion was free text; wrapped rather than rejected, since
    /// backends are not guaranteed to return well-formed output.
    RawText(String),
}

impl BackendReply {
    /// The structured value, if this reply carries one.
    pub fn as_structured(&self) -> Option<&Value> {
        match self {
            BackendReply::Structured(value) => Some(value),
            BackendReply::RawText(_) => None,
        }
    }
}

/// Request body submitted to a backend.
#[derive(Debug, Serialize)]
struct BackendRequest<'a> {
    model: &'a str,
    input: &'a str,
}

/// Client for all analysis backends. One HTTP client, bounded by a
/// per-request timeout so a slow backend cannot stall the fleet fan-out.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http_client: reqwest::Client,
    api_key: String,
}

impl BackendClient {
    /// Create a client from the backend settings.
    pub fn new(config: &BackendsConfig) -> Result<Self, BackendError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| BackendError::Transport {
                backend: "client".to_string(),
                detail: e.to_string(),
            })?;

        Ok(Self {
            http_client,
            api_key: config.api_key.clone(),
        })
    }

    /// Submit a prompt to one backend and resolve the reply.
    pub async fn invoke(
        &self,
        backend: &BackendConfig,
        prompt: &str,
    ) -> Result<BackendReply, BackendError> {
        debug!("Invoking backend '{}' at {}", backend.id, backend.endpoint);

        let request = BackendRequest {
            model: &backend.model,
            input: prompt,
        };

        let response = self
            .http_client
            .post(&backend.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                let detail = if e.is_timeout() {
                    "request timed out".to_string()
                } else if e.is_connect() {
                    format!("cannot connect to {}", backend.endpoint)
                } else {
                    e.to_string()
                };
                BackendError::Transport {
                    backend: backend.id.clone(),
                    detail,
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(BackendError::Auth {
                backend: backend.id.clone(),
            });
        }
        if !status.is_success() {
            return Err(BackendError::Unavailable {
                backend: backend.id.clone(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| BackendError::Transport {
            backend: backend.id.clone(),
            detail: e.to_string(),
        })?;

        Ok(resolve_reply(&backend.id, &body))
    }
}

/// Resolve a raw response body into a [`BackendReply`].
///
/// The completion text is extracted from whichever envelope the backend
/// uses (`output`, `choices[0].message.content`, or the body itself) and
/// then parsed as JSON if possible.
fn resolve_reply(backend_id: &str, body: &str) -> BackendReply {
    let completion = extract_completion(body);

    match serde_json::from_str::<Value>(completion.trim()) {
        Ok(value) if value.is_object() || value.is_array() => BackendReply::Structured(value),
        _ => {
            warn!(
                "Backend '{}' returned unstructured output; wrapping as raw text",
                backend_id
            );
            BackendReply::RawText(completion.to_string())
        }
    }
}

/// Pull the completion text out of the provider envelope.
fn extract_completion(body: &str) -> String {
    if let Ok(envelope) = serde_json::from_str::<Value>(body) {
        if let Some(output) = envelope.get("output").and_then(|v| v.as_str()) {
            return output.to_string();
        }
        if let Some(content) = envelope
            .pointer("/choices/0/message/content")
            .and_then(|v| v.as_str())
        {
            return content.to_string();
        }
        // The body itself was the structured completion.
        return envelope.to_string();
    }
    body.to_string()
}
