//! Pipeline stages for submitting a document conversion.
//!
//! Each submodule implements exactly one step, so each can be tested on its
//! own and the orchestration in [`crate::tracker`] stays thin.
//!
//! ## Data Flow
//!
//! ```text
//! classify ──▶ eligibility ──▶ submit
//! (extension)  (step == none)  (one request, one result)
//! ```
//!
//! 1. [`classify`]   : map an extension to `static` / `dynamic` / not convertible
//! 2. [`eligibility`]: gate on the convertible set and the file's current step
//! 3. [`submit`]     : the only stage with network I/O; enforces one in-flight
//!    submission per file identifier

pub mod classify;
pub mod eligibility;
pub mod submit;
