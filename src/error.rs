//! Turn-level error taxonomy

use crate::assistants::{ApiError, RunStatus};
use crate::tools::DispatchError;
use thiserror::Error;

/// Why a conversation turn produced no reply
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TurnError {
    #[error("Message is empty")]
    EmptyMessage,

    #[error("A turn is already in flight for this session")]
    Busy,

    #[error("Transport error: {0}")]
    Transport(#[source] ApiError),

    #[error("Unexpected response: {0}")]
    Decode(#[source] ApiError),

    #[error("Run {run_id} ended with status {status}")]
    RunFailure {
        run_id: String,
        status: RunStatus,
        #[source]
        cause: Option<ApiError>,
    },

    #[error("No tool registered as {0}")]
    UnknownTool(String),

    #[error("No assistant reply in thread {thread_id}")]
    NoReply { thread_id: String },

    #[error("Session was reset while the turn was in flight")]
    Stale,
}

impl TurnError {
    pub fn run_failure(run_id: impl Into<String>, status: RunStatus, cause: Option<ApiError>) -> Self {
        Self::RunFailure {
            run_id: run_id.into(),
            status,
            cause,
        }
    }
}

impl From<ApiError> for TurnError {
    fn from(error: ApiError) -> Self {
        if error.is_transport() {
            Self::Transport(error)
        } else {
            Self::Decode(error)
        }
    }
}

impl From<DispatchError> for TurnError {
    fn from(error: DispatchError) -> Self {
        match error {
            DispatchError::UnknownTool(name) => Self::UnknownTool(name),
        }
    }
}
