//! Error types for the classroom-convert library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ConvertError`]: **Fatal for the call**: the requested operation could
//!   not proceed at all (bad identifier, unknown file, illegal step change,
//!   invalid configuration). Returned as `Err(ConvertError)` from tracker,
//!   submitter, and preference operations.
//!
//! * [`SubmitError`]: **Endpoint failure**: the start-conversion request was
//!   sent (or attempted) but the dispatcher reported a failure. Delivered
//!   verbatim through the submission result slot so the presentation layer
//!   can show the reason to the user. It is `Clone + Serialize` so observers
//!   and CLIs can keep or print it.
//!
//! Classification never fails and has no error type.

use crate::step::{ConversionStep, StepEvent};
use std::path::PathBuf;
use thiserror::Error;

/// All call-level errors returned by the classroom-convert library.
#[derive(Debug, Error)]
pub enum ConvertError {
    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Submission errors ─────────────────────────────────────────────────
    /// The file identifier was empty or whitespace only.
    #[error("Invalid file identifier '{file_id}': must not be empty")]
    InvalidFileId { file_id: String },

    /// A submission for this identifier has not resolved yet.
    #[error("A conversion submission for '{file_id}' is already in flight")]
    AlreadyInFlight { file_id: String },

    /// Submissions spawn onto the current Tokio runtime, and there is none.
    #[error("No Tokio runtime is running; submissions must be made from async context")]
    NoRuntime,

    /// The dispatcher reported a failure for this file.
    #[error("Failed to submit conversion for '{file_id}': {source}")]
    SubmitFailed {
        file_id: String,
        #[source]
        source: SubmitError,
    },

    // ── Record errors ─────────────────────────────────────────────────────
    /// The storage listing has no record with this identifier.
    #[error("File '{file_id}' not found in storage listing")]
    FileNotFound { file_id: String },

    /// The requested step change is not an edge of the conversion lifecycle.
    #[error("File '{file_id}': cannot apply {event:?} while {from}")]
    IllegalTransition {
        file_id: String,
        from: ConversionStep,
        event: StepEvent,
    },

    /// The record store could not read or write the listing.
    #[error("Record store failed: {detail}")]
    Store { detail: String },

    // ── Preference errors ─────────────────────────────────────────────────
    /// A session was requested for an empty user identifier.
    #[error("Invalid user identifier '{user_uuid}': must not be empty")]
    InvalidUser { user_uuid: String },

    /// Could not read or write the preference file.
    #[error("Failed to access preferences at '{path}': {source}")]
    PreferencesIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The preference file exists but is not valid JSON.
    #[error("Preferences at '{path}' are corrupt: {detail}")]
    PreferencesFormat { path: PathBuf, detail: String },
}

/// A failure reported by the start-conversion endpoint or its transport.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum SubmitError {
    /// Connection refused, DNS failure, TLS error, etc.
    #[error("network error: {reason}")]
    Network { reason: String },

    /// The dispatcher's own timeout elapsed.
    #[error("request timed out after {secs}s")]
    Timeout { secs: u64 },

    /// Non-2xx HTTP status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// HTTP 200 but the response envelope carried a non-zero status.
    #[error("endpoint rejected the request (status {status}, code {code:?})")]
    Api { status: i64, code: Option<i64> },

    /// The response body could not be decoded.
    #[error("could not decode response: {detail}")]
    Decode { detail: String },

    /// The submission task ended without producing a result.
    #[error("submission task ended before delivering a result")]
    Dropped,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submit_failed_display_carries_reason() {
        let e = ConvertError::SubmitFailed {
            file_id: "abc-123".into(),
            source: SubmitError::Network {
                reason: "connection reset".into(),
            },
        };
        let msg = e.to_string();
        assert!(msg.contains("abc-123"), "got: {msg}");
        assert!(msg.contains("connection reset"), "got: {msg}");
    }

    #[test]
    fn illegal_transition_display() {
        let e = ConvertError::IllegalTransition {
            file_id: "f1".into(),
            from: ConversionStep::Done,
            event: StepEvent::Reset,
        };
        let msg = e.to_string();
        assert!(msg.contains("Reset"), "got: {msg}");
        assert!(msg.contains("done"), "got: {msg}");
    }

    #[test]
    fn api_error_display() {
        let e = SubmitError::Api {
            status: 1,
            code: Some(110001),
        };
        assert!(e.to_string().contains("110001"));
    }

    #[test]
    fn submit_error_serializes() {
        let json = serde_json::to_string(&SubmitError::Timeout { secs: 30 }).unwrap();
        assert!(json.contains("Timeout"));
        let back: SubmitError = serde_json::from_str(&json).unwrap();
        assert_eq!(back, SubmitError::Timeout { secs: 30 });
    }
}
