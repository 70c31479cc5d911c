//! Error taxonomy for the orchestrator (§7).
//!
//! Only `InputInvalid` and `InvariantViolated` are fatal in the sense of
//! surfacing to the caller as an `Err`. `PrimitiveFailure` degrades the run
//! in place (§7 propagation policy) rather than aborting it; `ResourceLimit`
//! and `Cancelled` are not errors at all and are reported through
//! `DiffResult` instead (see `types::LimitInfo` and `DiffResult::cancelled`).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DiffError {
    #[error("invalid input: {0}")]
    InputInvalid(String),

    #[error("primitive failure: {0}")]
    PrimitiveFailure(String),

    #[error("internal invariant violated: {0}")]
    InvariantViolated(String),
}
