//! Events observed while driving a run

use crate::assistants::{ApiError, Run, ThreadMessage};
use crate::tools::DispatchError;

/// Events that trigger poll state transitions
#[derive(Debug, Clone)]
pub enum PollEvent {
    /// Run status observed (the freshly created run, or a re-fetch)
    RunObserved(Run),

    /// Tool outputs accepted by the remote side
    ToolOutputsSubmitted,

    /// Tool output submission failed; polling continues regardless
    ToolOutputsRejected { error: ApiError },

    /// No handler for a requested tool under the reject policy
    ToolDispatchFailed { error: DispatchError },

    /// Thread messages listed, newest first
    MessagesListed(Vec<ThreadMessage>),

    /// A status fetch or message listing failed
    ApiFailed(ApiError),
}
