//! Conversion tracker: moves files through their conversion lifecycle.
//!
//! The tracker is the orchestration layer around the pipeline. It gates each
//! submission on [`should_convert`], writes every step change back to the
//! [`FileRecordStore`], and reports it to the [`StatusObserver`] so rows can
//! start or stop their spinners.
//!
//! ```text
//! trigger ──▶ eligibility ──▶ submit ──▶ none→submitting ──▶ await ──▶ converting | failed
//! ```
//!
//! Completion of the conversion itself is observed elsewhere (polling or a
//! push notification) and fed back through [`ConversionTracker::apply_progress`].

use crate::config::ClientConfig;
use crate::dispatch::{ApiDispatcher, StartConvertResponse};
use crate::error::ConvertError;
use crate::pipeline::classify::classify;
use crate::pipeline::eligibility::should_convert;
use crate::pipeline::submit::Submitter;
use crate::progress::{JobIndicator, NoopStatusObserver, SharedObserver};
use crate::record::{FileRecord, FileRecordStore};
use crate::step::{ConversionStep, StepEvent};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of [`ConversionTracker::trigger`].
#[derive(Debug, Clone, PartialEq)]
pub enum TriggerOutcome {
    /// Not eligible (wrong extension, or already past `none`). Nothing was sent.
    Skipped { step: ConversionStep },
    /// The server accepted the task; the file is now `converting`.
    Started(StartConvertResponse),
}

/// Externally observed end of a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvertProgress {
    Finished,
    Failed,
}

/// Orchestrates eligibility, submission, and step bookkeeping.
pub struct ConversionTracker {
    store: Arc<dyn FileRecordStore>,
    submitter: Submitter,
    config: ClientConfig,
    observer: SharedObserver,
}

impl ConversionTracker {
    pub fn new(
        store: Arc<dyn FileRecordStore>,
        dispatcher: Arc<dyn ApiDispatcher>,
        config: &ClientConfig,
    ) -> Self {
        Self {
            store,
            submitter: Submitter::new(dispatcher, config),
            config: config.clone(),
            observer: Arc::new(NoopStatusObserver),
        }
    }

    /// Report step changes to `observer`.
    pub fn with_observer(mut self, observer: SharedObserver) -> Self {
        self.observer = observer;
        self
    }

    pub fn submitter(&self) -> &Submitter {
        &self.submitter
    }

    /// Submit `file_id` for conversion if it is eligible.
    ///
    /// The file's in-flight slot is claimed before its record is read and
    /// held until the post-submission step is written, so eligibility is
    /// always decided on the current step and a file is never sent twice.
    ///
    /// # Returns
    /// * `Ok(Skipped)`: not convertible, already past `none`, or another
    ///   trigger for the same file holds its slot
    /// * `Ok(Started)`: accepted; step is now `converting`
    ///
    /// # Errors
    /// * [`ConvertError::FileNotFound`]: not in the listing
    /// * [`ConvertError::SubmitFailed`]: the endpoint failed; step is now `failed`
    /// * any store error; nothing is sent if `none → submitting` cannot be written
    pub async fn trigger(&self, file_id: &str) -> Result<TriggerOutcome, ConvertError> {
        // ── Step 1: claim the in-flight slot ─────────────────────────────
        let mut reservation = match self.submitter.reserve(file_id) {
            Ok(r) => r,
            Err(ConvertError::AlreadyInFlight { .. }) => {
                debug!("Skipping {}: submission already in flight", file_id);
                return Ok(TriggerOutcome::Skipped {
                    step: ConversionStep::Submitting,
                });
            }
            Err(e) => return Err(e),
        };

        // ── Step 2: eligibility on the current record ────────────────────
        let record = self.record(file_id).await?;
        if !should_convert(&record) {
            debug!(
                "Skipping {} ({}): step {}",
                file_id, record.file_name, record.conversion_step
            );
            return Ok(TriggerOutcome::Skipped {
                step: record.conversion_step,
            });
        }

        // ── Step 3: none → submitting ────────────────────────────────────
        let kind = classify(&record.file_url);
        info!(
            "Submitting {} ({}) for {} conversion",
            file_id,
            record.file_name,
            kind.map(|k| k.to_string()).unwrap_or_default()
        );
        let submitting = self
            .transition(file_id, record.conversion_step, StepEvent::Submit)
            .await?;

        // ── Step 4: send ─────────────────────────────────────────────────
        let submission = match reservation.dispatch() {
            Ok(s) => s,
            Err(e) => {
                self.restore(file_id, submitting, record.conversion_step)
                    .await;
                return Err(e);
            }
        };

        // ── Step 5: submitting → converting | failed ─────────────────────
        let outcome = match submission.outcome().await {
            Ok(response) => {
                self.transition(file_id, submitting, StepEvent::Accepted)
                    .await?;
                Ok(TriggerOutcome::Started(response))
            }
            Err(source) => {
                self.observer.on_submission_failed(file_id, &source);
                self.transition(file_id, submitting, StepEvent::Rejected)
                    .await?;
                Err(ConvertError::SubmitFailed {
                    file_id: file_id.to_string(),
                    source,
                })
            }
        };
        drop(reservation);
        outcome
    }

    /// Trigger every eligible file in the listing.
    ///
    /// At most `config.concurrency` submissions run at once (at least one).
    /// Results are sorted by file id; per-file failures do not stop the batch.
    pub async fn trigger_all(
        &self,
    ) -> Result<Vec<(String, Result<TriggerOutcome, ConvertError>)>, ConvertError> {
        let records = self.store.list().await?;
        let listed = records.len();
        let eligible: Vec<String> = records
            .into_iter()
            .filter(should_convert)
            .map(|r| r.file_uuid)
            .collect();
        info!("{} of {} listed files need conversion", eligible.len(), listed);

        let mut results: Vec<(String, Result<TriggerOutcome, ConvertError>)> =
            stream::iter(eligible)
                .map(|file_id| async move {
                    let result = self.trigger(&file_id).await;
                    (file_id, result)
                })
                .buffer_unordered(self.config.concurrency.max(1))
                .collect()
                .await;
        results.sort_by(|a, b| a.0.cmp(&b.0));

        let failed = results.iter().filter(|(_, r)| r.is_err()).count();
        if failed > 0 {
            warn!("{}/{} conversion submissions failed", failed, results.len());
        }
        Ok(results)
    }

    /// Record the end of a conversion: converting → done | failed.
    pub async fn apply_progress(
        &self,
        file_id: &str,
        progress: ConvertProgress,
    ) -> Result<ConversionStep, ConvertError> {
        let record = self.record(file_id).await?;
        let event = match progress {
            ConvertProgress::Finished => StepEvent::Completed,
            ConvertProgress::Failed => StepEvent::Failed,
        };
        self.transition(file_id, record.conversion_step, event).await
    }

    /// Put a failed file back to `none` so it can be triggered again.
    pub async fn reset(&self, file_id: &str) -> Result<ConversionStep, ConvertError> {
        let record = self.record(file_id).await?;
        self.transition(file_id, record.conversion_step, StepEvent::Reset)
            .await
    }

    /// What the file's row should display right now.
    pub async fn indicator(&self, file_id: &str) -> Result<JobIndicator, ConvertError> {
        Ok(self.record(file_id).await?.conversion_step.into())
    }

    async fn record(&self, file_id: &str) -> Result<FileRecord, ConvertError> {
        self.store
            .get(file_id)
            .await?
            .ok_or_else(|| ConvertError::FileNotFound {
                file_id: file_id.to_string(),
            })
    }

    /// Put back the step a trigger replaced when its request could not be sent.
    async fn restore(&self, file_id: &str, from: ConversionStep, to: ConversionStep) {
        match self.store.update_step(file_id, to).await {
            Ok(()) => {
                debug!("{}: {} -> {} (not sent)", file_id, from, to);
                self.observer.on_step_changed(file_id, from, to);
            }
            Err(e) => warn!("Could not restore step of {} to {}: {}", file_id, to, e),
        }
    }

    async fn transition(
        &self,
        file_id: &str,
        from: ConversionStep,
        event: StepEvent,
    ) -> Result<ConversionStep, ConvertError> {
        let to = from
            .apply(event)
            .ok_or_else(|| ConvertError::IllegalTransition {
                file_id: file_id.to_string(),
                from,
                event,
            })?;
        self.store.update_step(file_id, to).await?;
        debug!("{}: {} -> {}", file_id, from, to);
        self.observer.on_step_changed(file_id, from, to);
        Ok(to)
    }
}
