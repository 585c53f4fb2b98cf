//! # classroom-convert
//!
//! Track document conversions for a video-classroom whiteboard.
//!
//! Files uploaded to cloud storage must be converted before a whiteboard can
//! show them: PDFs and Word/PowerPoint documents become page images
//! (`static`), `.pptx` decks become animated slides (`dynamic`). This crate
//! decides which files need converting, submits each one to the conversion
//! service exactly once, and keeps the file's conversion step in sync so a
//! UI can show idle / converting / error.
//!
//! ## Pipeline Overview
//!
//! ```text
//! FileRecord
//!  │
//!  ├─ 1. Classify     extension → static | dynamic | not convertible
//!  ├─ 2. Eligibility  convertible and step == none
//!  ├─ 3. Submit       one POST per file, one result (in-flight guarded)
//!  └─ 4. Track        none → submitting → converting | failed, observer notified
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use classroom_convert::{
//!     ClientConfig, ConversionTracker, FileRecord, InMemoryFileStore, ReqwestDispatcher,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::builder()
//!         .base_url("https://api.example.com")
//!         .token("…")
//!         .build()?;
//!     let store = Arc::new(InMemoryFileStore::new());
//!     store.insert(FileRecord::new("abc-123", "https://cdn.example.com/lecture.pptx"));
//!
//!     let dispatcher = Arc::new(ReqwestDispatcher::new(&config)?);
//!     let tracker = ConversionTracker::new(store, dispatcher, &config);
//!     println!("{:?}", tracker.trigger("abc-123").await?);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `classroom-convert` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod deeplink;
pub mod dispatch;
pub mod error;
pub mod pipeline;
pub mod preferences;
pub mod progress;
pub mod record;
pub mod settings;
pub mod step;
pub mod tracker;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ClientConfig, ClientConfigBuilder};
pub use deeplink::{join_room_uuid, JoinLinkRule};
pub use dispatch::{
    send, ApiDispatcher, ApiRequest, ReqwestDispatcher, StartConvertRequest, StartConvertResponse,
};
pub use error::{ConvertError, SubmitError};
pub use pipeline::classify::{classify, is_convertible, ConversionKind};
pub use pipeline::eligibility::should_convert;
pub use pipeline::submit::{Reservation, Submission, SubmitResult, Submitter};
pub use preferences::{DevicePreference, PreferenceStore, Session, UserPreferences};
pub use progress::{Animation, JobIndicator, NoopStatusObserver, SharedObserver, StatusObserver};
pub use record::{FileRecord, FileRecordStore, InMemoryFileStore};
pub use settings::{settings_rows, DisplayVersion, SettingAction, SettingItem, SettingsContext, VersionInfo};
pub use step::{ConversionStep, StepEvent};
pub use tracker::{ConversionTracker, ConvertProgress, TriggerOutcome};
