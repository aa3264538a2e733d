//! Shared error types for the services crate.

use thiserror::Error;

use api::ApiError;

/// Errors emitted by the session runner.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RunnerError {
    #[error("answer is required before moving on")]
    EmptyAnswer,

    #[error("no question is in progress")]
    NotInProgress,

    #[error("session is not awaiting confirmation")]
    NotConfirming,

    #[error(transparent)]
    Api(#[from] ApiError),
}
