//! Configuration for talking to the conversion service.
//!
//! All client behaviour is controlled through [`ClientConfig`], built via its
//! [`ClientConfigBuilder`]. Callers set only what they care about and rely on
//! the documented defaults for the rest.

use crate::error::ConvertError;
use std::fmt;
use url::Url;

/// Default path of the start-conversion endpoint.
pub const DEFAULT_START_CONVERT_PATH: &str = "/v1/cloud-storage/convert/start";

/// Configuration for the start-conversion client.
///
/// # Example
/// ```rust
/// use classroom_convert::ClientConfig;
///
/// let config = ClientConfig::builder()
///     .base_url("https://api.example.com")
///     .token("secret")
///     .request_timeout_secs(15)
///     .build()
///     .unwrap();
/// assert_eq!(config.request_timeout_secs, 15);
/// ```
#[derive(Clone)]
pub struct ClientConfig {
    /// Scheme + host (+ optional prefix) of the API server. Default: `http://127.0.0.1:8080`.
    pub base_url: String,

    /// Bearer token attached to every request. Default: none.
    pub token: Option<String>,

    /// Path of the start-conversion endpoint, appended to `base_url`.
    pub start_convert_path: String,

    /// Per-request timeout in seconds. Default: 30.
    ///
    /// The submitter itself never times out; this is the dispatcher's policy.
    pub request_timeout_secs: u64,

    /// Maximum submissions in flight during a batch trigger. Default: 4.
    pub concurrency: usize,

    /// `User-Agent` header value.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            token: None,
            start_convert_path: DEFAULT_START_CONVERT_PATH.to_string(),
            request_timeout_secs: 30,
            concurrency: 4,
            user_agent: concat!("classroom-convert/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("start_convert_path", &self.start_convert_path)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("concurrency", &self.concurrency)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl ClientConfig {
    /// Create a new builder for `ClientConfig`.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: Self::default(),
        }
    }

    /// Full URL for an endpoint path.
    pub fn endpoint_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.config.token = if token.is_empty() { None } else { Some(token) };
        self
    }

    pub fn start_convert_path(mut self, path: impl Into<String>) -> Self {
        self.config.start_convert_path = path.into();
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs.max(1);
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ClientConfig, ConvertError> {
        let c = &self.config;
        let parsed = Url::parse(&c.base_url).map_err(|e| {
            ConvertError::InvalidConfig(format!("base URL '{}' is invalid: {}", c.base_url, e))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConvertError::InvalidConfig(format!(
                "base URL must be http or https, got '{}'",
                parsed.scheme()
            )));
        }
        if c.start_convert_path.trim().is_empty() {
            return Err(ConvertError::InvalidConfig(
                "start-conversion path must not be empty".into(),
            ));
        }
        if c.concurrency == 0 {
            return Err(ConvertError::InvalidConfig("Concurrency must be ≥ 1".into()));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = ClientConfig::default();
        assert_eq!(c.start_convert_path, DEFAULT_START_CONVERT_PATH);
        assert_eq!(c.request_timeout_secs, 30);
        assert_eq!(c.concurrency, 4);
        assert!(c.token.is_none());
    }

    #[test]
    fn rejects_non_http_base() {
        let err = ClientConfig::builder()
            .base_url("ftp://files.example.com")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("http"), "got: {err}");
    }

    #[test]
    fn rejects_garbage_base() {
        assert!(ClientConfig::builder().base_url("not a url").build().is_err());
    }

    #[test]
    fn clamps_zero_values() {
        let c = ClientConfig::builder()
            .concurrency(0)
            .request_timeout_secs(0)
            .build()
            .unwrap();
        assert_eq!(c.concurrency, 1);
        assert_eq!(c.request_timeout_secs, 1);
    }

    #[test]
    fn endpoint_url_joins_slashes() {
        let c = ClientConfig::builder()
            .base_url("https://api.example.com/")
            .build()
            .unwrap();
        assert_eq!(
            c.endpoint_url("/v1/cloud-storage/convert/start"),
            "https://api.example.com/v1/cloud-storage/convert/start"
        );
    }

    #[test]
    fn debug_redacts_token() {
        let c = ClientConfig::builder().token("hunter2").build().unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("hunter2"));
        assert!(dbg.contains("<redacted>"));
    }

    #[test]
    fn empty_token_means_none() {
        let c = ClientConfig::builder().token("").build().unwrap();
        assert!(c.token.is_none());
    }
}
