//! Conversation session: thread continuity across turns

use super::poller::RunPoller;
use crate::assistants::{AssistantsApi, Run, ThreadMessage};
use crate::error::TurnError;
use crate::render::{display_content, BrandColors, CallToAction, DisplayContent};
use crate::state_machine::PollContext;
use crate::tools::ToolRegistry;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// How replies are rendered for the page
#[derive(Debug, Clone, Default)]
pub struct ReplyStyle {
    pub brand: BrandColors,
    pub calls_to_action: Vec<CallToAction>,
}

#[derive(Debug, Default)]
struct SessionState {
    thread_id: Option<String>,
    /// Bumped by `reset`; turns started under an older generation are stale
    generation: u64,
    /// Generation of the turn currently in flight, if any
    in_flight: Option<u64>,
}

/// One visitor's conversation with the assistant.
///
/// Holds the remote thread id once the first run has been created and
/// reuses it for every later turn until `reset`.
pub struct ConversationSession<A: ?Sized> {
    assistant_id: String,
    api: Arc<A>,
    poller: RunPoller<A>,
    style: ReplyStyle,
    state: Arc<Mutex<SessionState>>,
}

/// Claim on the session's single in-flight slot, released when dropped.
///
/// Owned so it can be taken before a turn is spawned and moved into the task.
pub struct TurnGuard {
    state: Arc<Mutex<SessionState>>,
    generation: u64,
}

impl Drop for TurnGuard {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.in_flight == Some(self.generation) {
            state.in_flight = None;
        }
    }
}

impl<A: AssistantsApi + ?Sized> ConversationSession<A> {
    pub fn new(
        assistant_id: impl Into<String>,
        api: Arc<A>,
        tools: ToolRegistry,
        context: PollContext,
        style: ReplyStyle,
    ) -> Self {
        let poller = RunPoller::new(Arc::clone(&api), tools, context);
        Self {
            assistant_id: assistant_id.into(),
            api,
            poller,
            style,
            state: Arc::new(Mutex::new(SessionState::default())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Remote thread id, absent until the first turn created one
    pub fn thread_id(&self) -> Option<String> {
        self.lock().thread_id.clone()
    }

    /// A turn of the current generation is in flight
    pub fn is_busy(&self) -> bool {
        let state = self.lock();
        state.in_flight == Some(state.generation)
    }

    /// Forget the thread. A turn still in flight finishes but its result is discarded.
    pub fn reset(&self) {
        let mut state = self.lock();
        state.thread_id = None;
        state.generation += 1;
        tracing::info!(generation = state.generation, "Conversation reset");
    }

    /// Send one user message and wait for the assistant's rendered reply
    pub async fn submit_turn(&self, text: &str) -> Result<DisplayContent, TurnError> {
        if text.trim().is_empty() {
            return Err(TurnError::EmptyMessage);
        }
        let guard = self.try_begin()?;
        self.complete_turn(guard, text).await
    }

    /// Claim the in-flight slot for the current generation, or fail with `Busy`
    pub fn try_begin(&self) -> Result<TurnGuard, TurnError> {
        let mut state = self.lock();
        if state.in_flight == Some(state.generation) {
            return Err(TurnError::Busy);
        }
        state.in_flight = Some(state.generation);
        Ok(TurnGuard {
            state: Arc::clone(&self.state),
            generation: state.generation,
        })
    }

    /// Run a turn already claimed with [`try_begin`](Self::try_begin)
    pub async fn complete_turn(
        &self,
        guard: TurnGuard,
        text: &str,
    ) -> Result<DisplayContent, TurnError> {
        let generation = guard.generation;
        let thread_id = self.lock().thread_id.clone();

        let outcome = self.run_turn(text, thread_id, generation).await;

        if self.lock().generation != generation {
            tracing::debug!(generation, "Discarding result of a reset conversation");
            return Err(TurnError::Stale);
        }
        drop(guard);

        let message = outcome?;
        Ok(display_content(
            &message,
            &self.style.brand,
            &self.style.calls_to_action,
        ))
    }

    async fn run_turn(
        &self,
        text: &str,
        thread_id: Option<String>,
        generation: u64,
    ) -> Result<ThreadMessage, TurnError> {
        let run = self.start_run(text, thread_id.as_deref()).await?;
        self.remember_thread(&run, generation);
        self.poller.drive(run).await
    }

    async fn start_run(&self, text: &str, thread_id: Option<&str>) -> Result<Run, TurnError> {
        let run = match thread_id {
            Some(thread_id) => {
                tracing::debug!(thread_id, "Continuing thread");
                self.api
                    .create_run(&self.assistant_id, thread_id, text)
                    .await?
            }
            None => {
                tracing::debug!("Starting new thread");
                self.api
                    .create_thread_and_run(&self.assistant_id, text)
                    .await?
            }
        };
        Ok(run)
    }

    /// Keep the run's thread for later turns unless the session was reset meanwhile
    fn remember_thread(&self, run: &Run, generation: u64) {
        let mut state = self.lock();
        if state.generation == generation && state.thread_id.as_deref() != Some(&run.thread_id) {
            tracing::info!(thread_id = %run.thread_id, "Conversation thread established");
            state.thread_id = Some(run.thread_id.clone());
        }
    }
}
