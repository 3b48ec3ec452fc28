use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::openai::client::ApiError;

#[derive(Debug, Error)]
pub enum SolveError {
    #[error("failed to read problem image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("solver request failed: {0}")]
    Api(#[from] ApiError),
    #[error("solver returned an empty answer")]
    EmptyAnswer,
    #[error("solver timed out after {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Error)]
pub enum JudgeError {
    #[error("failed to read image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("judge request failed: {0}")]
    Api(#[from] ApiError),
    #[error("judge returned a malformed verdict: {0}")]
    MalformedVerdict(String),
    #[error("judge timed out after {0:?}")]
    Timeout(Duration),
}

/// Raised when the collected results no longer map one-to-one onto the task
/// records. Only a scheduler defect can produce it.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConsistencyError {
    #[error("expected {expected} results, got {actual}")]
    CountMismatch { expected: usize, actual: usize },
    #[error("duplicate result for task {0}")]
    DuplicateResult(String),
    #[error("no result for task {0}")]
    MissingResult(String),
}
