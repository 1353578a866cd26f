//! Effects produced by poll transitions

use crate::assistants::ToolCall;
use std::time::Duration;

/// Work the executor performs after a transition
#[derive(Debug, Clone, PartialEq)]
pub enum PollEffect {
    /// Wait `delay`, then re-fetch the run
    FetchRun {
        thread_id: String,
        run_id: String,
        delay: Duration,
    },

    /// Dispatch the calls and submit their outputs as one batch
    RunTools {
        thread_id: String,
        run_id: String,
        calls: Vec<ToolCall>,
    },

    /// Wait `delay`, then list the thread's messages
    ListMessages { thread_id: String, delay: Duration },
}

impl PollEffect {
    pub fn fetch_run(run: &super::RunRef, delay: Duration) -> Self {
        PollEffect::FetchRun {
            thread_id: run.thread_id.clone(),
            run_id: run.id.clone(),
            delay,
        }
    }
}
