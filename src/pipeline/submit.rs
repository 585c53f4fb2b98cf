//! Conversion submitter: one start-conversion request per call.
//!
//! The request runs on a spawned Tokio task so the caller is never blocked
//! on the network. Its result is delivered exactly once, either through a
//! [`Submission`] (a one-shot slot consumed by [`Submission::outcome`]) or
//! through an `FnOnce` callback.
//!
//! An identifier can have only one submission in flight. The check-and-set
//! on the in-flight set is a single `DashMap` entry operation, so two rapid
//! triggers for the same file cannot both reach the network. For a plain
//! submission the slot is freed as soon as the dispatcher returns, before the
//! result is delivered. A [`Reservation`] instead holds the slot until it is
//! dropped, so a caller can keep other submissions out while it records the
//! outcome.
//!
//! The submitter never touches the file record; moving the conversion step
//! is the caller's job.

use crate::config::ClientConfig;
use crate::dispatch::{send, ApiDispatcher, StartConvertRequest, StartConvertResponse};
use crate::error::{ConvertError, SubmitError};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::{info, warn};

/// What a submission resolves to.
pub type SubmitResult = Result<StartConvertResponse, SubmitError>;

/// Issues start-conversion requests through an [`ApiDispatcher`].
///
/// Cheap to clone; clones share the in-flight set.
#[derive(Clone)]
pub struct Submitter {
    dispatcher: Arc<dyn ApiDispatcher>,
    path: String,
    in_flight: Arc<DashMap<String, ()>>,
}

impl Submitter {
    pub fn new(dispatcher: Arc<dyn ApiDispatcher>, config: &ClientConfig) -> Self {
        Self {
            dispatcher,
            path: config.start_convert_path.clone(),
            in_flight: Arc::new(DashMap::new()),
        }
    }

    /// Submit `file_id` and get a handle that resolves once.
    ///
    /// # Errors
    /// * [`ConvertError::InvalidFileId`] for an empty or blank id
    /// * [`ConvertError::AlreadyInFlight`] if a submission for this id is unresolved
    /// * [`ConvertError::NoRuntime`] outside a Tokio runtime
    pub fn submit(&self, file_id: &str) -> Result<Submission, ConvertError> {
        let (callback, rx) = deliver_once();
        self.submit_with(file_id, callback)?;
        Ok(Submission {
            file_id: file_id.to_string(),
            rx,
        })
    }

    /// Submit `file_id` and invoke `callback` with the outcome.
    ///
    /// `callback` runs on the runtime's worker, at most once. Errors are the
    /// same as [`Submitter::submit`]; when one is returned the callback is
    /// dropped without being called.
    pub fn submit_with<F>(&self, file_id: &str, callback: F) -> Result<(), ConvertError>
    where
        F: FnOnce(SubmitResult) + Send + 'static,
    {
        let handle = Handle::try_current().map_err(|_| ConvertError::NoRuntime)?;
        let guard = self.acquire(file_id)?;
        self.spawn_request(&handle, file_id, Some(guard), callback);
        Ok(())
    }

    /// Claim the in-flight slot for `file_id` without sending anything yet.
    ///
    /// The slot stays claimed until the [`Reservation`] is dropped, so the
    /// caller can inspect and update the file's state before and after the
    /// request with no other submission for it able to start.
    ///
    /// # Errors
    /// Same as [`Submitter::submit`].
    pub fn reserve(&self, file_id: &str) -> Result<Reservation, ConvertError> {
        let handle = Handle::try_current().map_err(|_| ConvertError::NoRuntime)?;
        let guard = self.acquire(file_id)?;
        Ok(Reservation {
            submitter: self.clone(),
            handle,
            guard,
            dispatched: false,
        })
    }

    /// `true` while a submission for `file_id` is unresolved.
    pub fn is_in_flight(&self, file_id: &str) -> bool {
        self.in_flight.contains_key(file_id)
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Send the request on `handle`. `guard`, when given, is released as
    /// soon as the dispatcher returns.
    fn spawn_request<F>(
        &self,
        handle: &Handle,
        file_id: &str,
        guard: Option<InFlightGuard>,
        callback: F,
    ) where
        F: FnOnce(SubmitResult) + Send + 'static,
    {
        let dispatcher = Arc::clone(&self.dispatcher);
        let request = StartConvertRequest::new(file_id, self.path.as_str());

        handle.spawn(async move {
            let result = send(dispatcher.as_ref(), &request).await;
            drop(guard);

            match result {
                Ok(ref response) => info!(
                    "Submitted conversion for {}: task {}",
                    request.file_uuid, response.task_uuid
                ),
                Err(ref e) => warn!("Conversion submission for {} failed: {}", request.file_uuid, e),
            }
            callback(result);
        });
    }

    fn acquire(&self, file_id: &str) -> Result<InFlightGuard, ConvertError> {
        if file_id.trim().is_empty() {
            return Err(ConvertError::InvalidFileId {
                file_id: file_id.to_string(),
            });
        }
        match self.in_flight.entry(file_id.to_string()) {
            Entry::Occupied(_) => Err(ConvertError::AlreadyInFlight {
                file_id: file_id.to_string(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(());
                Ok(InFlightGuard {
                    set: Arc::clone(&self.in_flight),
                    file_id: file_id.to_string(),
                })
            }
        }
    }
}

/// Frees the in-flight slot on drop, including when the task panics.
struct InFlightGuard {
    set: Arc<DashMap<String, ()>>,
    file_id: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.set.remove(&self.file_id);
    }
}

/// A claimed in-flight slot. See [`Submitter::reserve`].
#[must_use = "the slot is released as soon as the reservation is dropped"]
pub struct Reservation {
    submitter: Submitter,
    handle: Handle,
    guard: InFlightGuard,
    dispatched: bool,
}

impl Reservation {
    pub fn file_id(&self) -> &str {
        &self.guard.file_id
    }

    /// Send the start-conversion request for the reserved file.
    ///
    /// The slot is not released when the request finishes; it is held
    /// until the reservation itself is dropped.
    ///
    /// # Errors
    /// [`ConvertError::AlreadyInFlight`] if this reservation already sent
    /// its request.
    pub fn dispatch(&mut self) -> Result<Submission, ConvertError> {
        if self.dispatched {
            return Err(ConvertError::AlreadyInFlight {
                file_id: self.guard.file_id.clone(),
            });
        }
        let (callback, rx) = deliver_once();
        self.submitter
            .spawn_request(&self.handle, &self.guard.file_id, None, callback);
        self.dispatched = true;
        Ok(Submission {
            file_id: self.guard.file_id.clone(),
            rx,
        })
    }
}

/// A callback that forwards the result into a one-shot slot.
fn deliver_once() -> (
    impl FnOnce(SubmitResult) + Send + 'static,
    oneshot::Receiver<SubmitResult>,
) {
    let (tx, rx) = oneshot::channel::<SubmitResult>();
    let callback = move |result: SubmitResult| {
        // Receiver gone means the caller stopped caring; the outcome is already logged.
        let _ = tx.send(result);
    };
    (callback, rx)
}

/// A pending submission. Resolves exactly once.
///
/// Dropping it does not cancel the request.
#[must_use = "a Submission does nothing unless its outcome is awaited"]
#[derive(Debug)]
pub struct Submission {
    file_id: String,
    rx: oneshot::Receiver<SubmitResult>,
}

impl Submission {
    pub fn file_id(&self) -> &str {
        &self.file_id
    }

    /// Wait for the dispatcher's answer.
    ///
    /// Yields [`SubmitError::Dropped`] if the task ended without one.
    pub async fn outcome(self) -> SubmitResult {
        self.rx.await.unwrap_or(Err(SubmitError::Dropped))
    }
}
