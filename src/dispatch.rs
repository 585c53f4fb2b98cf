//! Outbound HTTP dispatch to the classroom API server.
//!
//! [`ApiDispatcher`] is the seam between the conversion core and the network.
//! It is object-safe so the submitter can hold an `Arc<dyn ApiDispatcher>`
//! and tests can swap in a scripted implementation. [`send`] adds typed
//! request/response (de)serialisation on top of it.
//!
//! ## Wire format
//!
//! Every endpoint takes a JSON body via `POST` and answers with an envelope:
//!
//! ```text
//! {"status": 0, "data": {...}}          success
//! {"status": 1, "code": 110001}         rejected by the server
//! ```

use crate::config::ClientConfig;
use crate::error::{ConvertError, SubmitError};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Longest response body kept in [`SubmitError::Http`].
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Sends an authenticated JSON request and returns the envelope's `data`.
#[async_trait]
pub trait ApiDispatcher: Send + Sync {
    /// `POST` `body` to `path` and return the unwrapped payload.
    ///
    /// # Errors
    /// Any transport, HTTP, envelope, or decode failure as a [`SubmitError`].
    async fn post(&self, path: &str, body: Value) -> Result<Value, SubmitError>;
}

/// A typed request to one endpoint.
pub trait ApiRequest: Serialize + Sync {
    type Response: DeserializeOwned;

    fn path(&self) -> &str;
}

/// Serialise `request`, dispatch it, and decode the typed response.
pub async fn send<R: ApiRequest>(
    dispatcher: &dyn ApiDispatcher,
    request: &R,
) -> Result<R::Response, SubmitError> {
    let body = serde_json::to_value(request).map_err(|e| SubmitError::Decode {
        detail: format!("request body: {e}"),
    })?;
    let data = dispatcher.post(request.path(), body).await?;
    serde_json::from_value(data).map_err(|e| SubmitError::Decode {
        detail: e.to_string(),
    })
}

// ── Start-conversion endpoint ────────────────────────────────────────────

/// Ask the server to start converting a stored file.
#[derive(Debug, Clone, Serialize)]
pub struct StartConvertRequest {
    #[serde(rename = "fileUUID")]
    pub file_uuid: String,
    #[serde(skip)]
    path: String,
}

impl StartConvertRequest {
    pub fn new(file_uuid: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            file_uuid: file_uuid.into(),
            path: path.into(),
        }
    }
}

impl ApiRequest for StartConvertRequest {
    type Response = StartConvertResponse;

    fn path(&self) -> &str {
        &self.path
    }
}

/// Task handle returned when the server accepts a conversion.
///
/// Fields the server adds beyond the task identifier and token are kept in
/// `extra` and passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartConvertResponse {
    #[serde(rename = "taskUUID")]
    pub task_uuid: String,
    #[serde(rename = "taskToken")]
    pub task_token: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

// ── reqwest implementation ───────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct Envelope {
    status: i64,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    code: Option<i64>,
}

impl Envelope {
    fn into_data(self) -> Result<Value, SubmitError> {
        if self.status == 0 {
            Ok(self.data.unwrap_or(Value::Null))
        } else {
            Err(SubmitError::Api {
                status: self.status,
                code: self.code,
            })
        }
    }
}

/// Production dispatcher backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestDispatcher {
    client: reqwest::Client,
    config: ClientConfig,
}

impl ReqwestDispatcher {
    /// Build a client with the configured timeout and user agent.
    pub fn new(config: &ClientConfig) -> Result<Self, ConvertError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ConvertError::InvalidConfig(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    fn transport_error(&self, e: reqwest::Error) -> SubmitError {
        if e.is_timeout() {
            SubmitError::Timeout {
                secs: self.config.request_timeout_secs,
            }
        } else {
            SubmitError::Network {
                reason: e.to_string(),
            }
        }
    }
}

#[async_trait]
impl ApiDispatcher for ReqwestDispatcher {
    async fn post(&self, path: &str, body: Value) -> Result<Value, SubmitError> {
        let url = self.config.endpoint_url(path);
        debug!("POST {}", url);

        let mut request = self.client.post(&url).json(&body);
        if let Some(ref token) = self.config.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(SubmitError::Http {
                status: status.as_u16(),
                body: text.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        let envelope: Envelope = response.json().await.map_err(|e| {
            if e.is_timeout() {
                self.transport_error(e)
            } else {
                SubmitError::Decode {
                    detail: e.to_string(),
                }
            }
        })?;

        debug!("POST {} -> status {}", url, envelope.status);
        envelope.into_data()
    }
}
