use thiserror::Error;

/// Failures of a single judge invocation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum JudgeError {
    /// No response within the per-call deadline.
    #[error("judge call timed out after {0} ms")]
    Timeout(u64),
    /// Connection, DNS, TLS or body-read failure.
    #[error("judge transport failure: {0}")]
    Transport(String),
    /// The service answered with a non-success HTTP status.
    #[error("judge rejected request with status {status}: {message}")]
    Rejected { status: u16, message: String },
    /// The payload could not be read as a verdict.
    #[error("malformed judge response: {0}")]
    MalformedResponse(String),
    /// Judge configuration is unusable (missing URL, bad header value).
    #[error("invalid judge config: {0}")]
    InvalidConfig(String),
}

impl JudgeError {
    /// Transient failures worth another attempt.
    ///
    /// Malformed payloads count as transient: a second sample from the
    /// service often parses.
    pub fn is_retryable(&self) -> bool {
        match self {
            JudgeError::Timeout(_) | JudgeError::Transport(_) | JudgeError::MalformedResponse(_) => {
                true
            }
            JudgeError::Rejected { status, .. } => {
                matches!(status, 408 | 429) || (500..600).contains(status)
            }
            JudgeError::InvalidConfig(_) => false,
        }
    }
}
