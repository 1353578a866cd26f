//! Poll state types

use crate::assistants::{Run, RunStatus, ThreadMessage};
use crate::error::TurnError;
use std::time::Duration;

/// Identity and last known status of the run being driven
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRef {
    pub id: String,
    pub thread_id: String,
    pub status: RunStatus,
}

impl From<&Run> for RunRef {
    fn from(run: &Run) -> Self {
        Self {
            id: run.id.clone(),
            thread_id: run.thread_id.clone(),
            status: run.status,
        }
    }
}

/// Where a single turn's run currently stands
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PollState {
    /// Run created, first status not yet examined
    #[default]
    Submitted,

    /// Waiting to re-fetch a queued/in-progress/cancelling run
    Polling {
        run: RunRef,
        /// Re-fetches issued so far, including the pending one
        fetches: u32,
    },

    /// Tool outputs for a `requires_action` batch are being produced and submitted
    AwaitingToolOutputs { run: RunRef, fetches: u32 },

    /// Run completed, waiting for the thread's messages
    Settling { run: RunRef },

    /// Reply retrieved
    Finished { message: ThreadMessage },

    /// Turn ended without a usable reply
    Failed { error: TurnError },
}

impl PollState {
    /// No further events are accepted
    #[cfg(test)]
    pub fn is_terminal(&self) -> bool {
        matches!(self, PollState::Finished { .. } | PollState::Failed { .. })
    }

    /// Last known run, if one has been observed
    pub fn run(&self) -> Option<&RunRef> {
        match self {
            PollState::Polling { run, .. }
            | PollState::AwaitingToolOutputs { run, .. }
            | PollState::Settling { run } => Some(run),
            PollState::Submitted | PollState::Finished { .. } | PollState::Failed { .. } => None,
        }
    }
}

/// Default wait between status fetches
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Default wait between run completion and listing messages
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(7);

/// Default cap on status re-fetches for one run
pub const DEFAULT_MAX_POLLS: u32 = 600;

/// Timing configuration for driving a run (immutable)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollContext {
    /// Fixed wait before every re-fetch; no exponential backoff
    pub poll_interval: Duration,
    /// Wait after completion so the reply is listable
    pub settle_delay: Duration,
    pub max_polls: u32,
}

impl Default for PollContext {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            settle_delay: DEFAULT_SETTLE_DELAY,
            max_polls: DEFAULT_MAX_POLLS,
        }
    }
}

impl PollContext {
    /// Context with no waits, for tests
    #[cfg(test)]
    pub fn immediate() -> Self {
        Self {
            poll_interval: Duration::ZERO,
            settle_delay: Duration::ZERO,
            max_polls: DEFAULT_MAX_POLLS,
        }
    }
}
