//! Join-room links: pull the room UUID out of an incoming URL.
//!
//! Two shapes are recognised:
//!
//! ```text
//! x-agora-flat-client://joinRoom?roomUUID=<uuid>     custom scheme
//! https://<host>/join/<uuid>                         universal link
//! ```
//!
//! Anything else, or a blank UUID, is not a join link.

use url::Url;

/// Which URLs count as join-room links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinLinkRule {
    pub scheme: String,
    pub host: String,
    pub query_key: String,
    /// Path segment marking a universal join link.
    pub path_marker: String,
}

impl Default for JoinLinkRule {
    fn default() -> Self {
        Self {
            scheme: "x-agora-flat-client".to_string(),
            host: "joinRoom".to_string(),
            query_key: "roomUUID".to_string(),
            path_marker: "join".to_string(),
        }
    }
}

impl JoinLinkRule {
    /// Room UUID carried by `url`, if it is a join link.
    pub fn room_uuid(&self, url: &str) -> Option<String> {
        let parsed = Url::parse(url.trim()).ok()?;
        self.from_custom_scheme(&parsed)
            .or_else(|| self.from_universal_link(&parsed))
    }

    fn from_custom_scheme(&self, url: &Url) -> Option<String> {
        if !url.scheme().eq_ignore_ascii_case(&self.scheme) {
            return None;
        }
        // Hosts of non-special schemes keep their case.
        if url.host_str()? != self.host {
            return None;
        }
        url.query_pairs()
            .find(|(k, _)| k == self.query_key.as_str())
            .map(|(_, v)| v.into_owned())
            .filter(|v| !v.trim().is_empty())
    }

    fn from_universal_link(&self, url: &Url) -> Option<String> {
        let segments: Vec<&str> = url.path_segments()?.collect();
        if !segments.iter().any(|s| *s == self.path_marker) {
            return None;
        }
        segments
            .last()
            .filter(|s| !s.trim().is_empty() && **s != self.path_marker)
            .map(|s| s.to_string())
    }
}

/// [`JoinLinkRule::room_uuid`] with the default rule.
pub fn join_room_uuid(url: &str) -> Option<String> {
    JoinLinkRule::default().room_uuid(url)
}
