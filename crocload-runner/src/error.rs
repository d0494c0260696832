//! Runner error types

use thiserror::Error;

pub type RunnerResult<T> = Result<T, RunnerError>;

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Invalid threshold selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("Invalid threshold expression '{expression}': {reason}")]
    InvalidExpression { expression: String, reason: String },

    #[error("Setup failed: {0:#}")]
    Setup(anyhow::Error),

    #[error("Failed to write summary: {0}")]
    SummaryExport(#[from] std::io::Error),

    #[error("Failed to serialize summary: {0}")]
    SummarySerialize(#[from] serde_json::Error),
}
