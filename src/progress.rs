//! Job status presentation: what a file row should show, and when it changes.
//!
//! A storage list row has three looks: nothing (idle), a spinning
//! "converting" badge, or an error mark. [`JobIndicator`] maps every
//! [`ConversionStep`] onto one of them; [`JobIndicator::animation_change`]
//! tells the row whether to start or stop its spinner on a transition.
//!
//! Inject an [`Arc<dyn StatusObserver>`] into the tracker to receive step
//! changes as they happen.
//!
//! # Example
//!
//! ```rust
//! use classroom_convert::{ConversionStep, StatusObserver};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! struct Counter(AtomicUsize);
//!
//! impl StatusObserver for Counter {
//!     fn on_step_changed(&self, _file_id: &str, _from: ConversionStep, _to: ConversionStep) {
//!         self.0.fetch_add(1, Ordering::SeqCst);
//!     }
//! }
//!
//! let c = Counter(AtomicUsize::new(0));
//! c.on_step_changed("f1", ConversionStep::None, ConversionStep::Submitting);
//! assert_eq!(c.0.load(Ordering::SeqCst), 1);
//! ```

use crate::error::SubmitError;
use crate::step::ConversionStep;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// What a file row displays for its conversion job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobIndicator {
    Idle,
    /// Spinning badge.
    Converting,
    Error,
}

/// Spinner command for a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Animation {
    Start,
    Stop,
}

impl From<ConversionStep> for JobIndicator {
    fn from(step: ConversionStep) -> Self {
        match step {
            ConversionStep::None | ConversionStep::Done => JobIndicator::Idle,
            ConversionStep::Submitting | ConversionStep::Converting => JobIndicator::Converting,
            ConversionStep::Failed => JobIndicator::Error,
        }
    }
}

impl JobIndicator {
    /// Spinner change needed to go from `prev` to `next`, if any.
    pub fn animation_change(prev: JobIndicator, next: JobIndicator) -> Option<Animation> {
        match (prev == JobIndicator::Converting, next == JobIndicator::Converting) {
            (false, true) => Some(Animation::Start),
            (true, false) => Some(Animation::Stop),
            _ => None,
        }
    }
}

/// Receives conversion-step changes from the tracker.
///
/// Implementations must be `Send + Sync`: batch triggers report from
/// concurrently running submissions. All methods default to no-ops.
pub trait StatusObserver: Send + Sync {
    /// Called after the store accepted a new step for `file_id`.
    fn on_step_changed(&self, file_id: &str, from: ConversionStep, to: ConversionStep) {
        let _ = (file_id, from, to);
    }

    /// Called when the endpoint rejected or failed a submission.
    fn on_submission_failed(&self, file_id: &str, error: &SubmitError) {
        let _ = (file_id, error);
    }
}

/// Observer used when none is configured.
pub struct NoopStatusObserver;

impl StatusObserver for NoopStatusObserver {}

/// Shared observer handle, as stored by the tracker.
pub type SharedObserver = Arc<dyn StatusObserver>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn step_to_indicator() {
        assert_eq!(JobIndicator::from(ConversionStep::None), JobIndicator::Idle);
        assert_eq!(JobIndicator::from(ConversionStep::Submitting), JobIndicator::Converting);
        assert_eq!(JobIndicator::from(ConversionStep::Converting), JobIndicator::Converting);
        assert_eq!(JobIndicator::from(ConversionStep::Done), JobIndicator::Idle);
        assert_eq!(JobIndicator::from(ConversionStep::Failed), JobIndicator::Error);
    }

    #[test]
    fn spinner_starts_and_stops_on_boundaries() {
        use JobIndicator::*;
        assert_eq!(JobIndicator::animation_change(Idle, Converting), Some(Animation::Start));
        assert_eq!(JobIndicator::animation_change(Converting, Converting), None);
        assert_eq!(JobIndicator::animation_change(Converting, Error), Some(Animation::Stop));
        assert_eq!(JobIndicator::animation_change(Converting, Idle), Some(Animation::Stop));
        assert_eq!(JobIndicator::animation_change(Error, Idle), None);
    }

    #[derive(Default)]
    struct Recorder {
        steps: Mutex<Vec<(String, ConversionStep)>>,
        failures: Mutex<Vec<String>>,
    }

    impl StatusObserver for Recorder {
        fn on_step_changed(&self, file_id: &str, _from: ConversionStep, to: ConversionStep) {
            self.steps.lock().unwrap().push((file_id.to_string(), to));
        }

        fn on_submission_failed(&self, file_id: &str, _error: &SubmitError) {
            self.failures.lock().unwrap().push(file_id.to_string());
        }
    }

    #[test]
    fn noop_observer_does_not_panic() {
        let o: SharedObserver = Arc::new(NoopStatusObserver);
        o.on_step_changed("f", ConversionStep::None, ConversionStep::Submitting);
        o.on_submission_failed("f", &SubmitError::Dropped);
    }

    #[test]
    fn recorder_receives_events() {
        let r = Recorder::default();
        r.on_step_changed("a", ConversionStep::None, ConversionStep::Submitting);
        r.on_submission_failed("a", &SubmitError::Timeout { secs: 1 });
        assert_eq!(r.steps.lock().unwrap().len(), 1);
        assert_eq!(*r.failures.lock().unwrap(), vec!["a".to_string()]);
    }
}
