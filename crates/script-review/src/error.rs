use thiserror::Error;

use crate::machine::ReviewState;

/// Failure talking to the remote script service.
///
/// The workflow treats every variant the same way: the request failed, local
/// state is left as it was before the call.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("service responded with {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ServiceError {
    pub fn transport(msg: impl Into<String>) -> Self {
        ServiceError::Transport(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        ServiceError::InvalidResponse(msg.into())
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        ServiceError::Transport(err.to_string())
    }
}

/// A user action the workflow refused to perform.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: ReviewState,
    },

    #[error("a request is already in flight")]
    RequestInFlight,

    #[error("no video is available for review")]
    NoVideo,

    #[error("invalid parameters: {0}")]
    InvalidParameters(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config format error: {0}")]
    Format(#[from] serde_json::Error),

    #[error("no config directory available on this platform")]
    NoConfigDir,
}

pub type Result<T> = std::result::Result<T, WorkflowError>;
