//! Run poller: executes poll effects until the state machine settles

use crate::assistants::{ApiError, AssistantsApi, Run, ThreadMessage};
use crate::error::TurnError;
use crate::state_machine::{transition, PollContext, PollEffect, PollEvent, PollState};
use crate::tools::ToolRegistry;
use std::sync::Arc;

/// Drives one run from creation to a reply or a failure.
///
/// All decisions are made by `state_machine::transition`; the poller only
/// performs the effects it is handed and feeds the outcomes back in.
pub struct RunPoller<A: ?Sized> {
    api: Arc<A>,
    tools: ToolRegistry,
    context: PollContext,
}

impl<A: AssistantsApi + ?Sized> RunPoller<A> {
    pub fn new(api: Arc<A>, tools: ToolRegistry, context: PollContext) -> Self {
        Self {
            api,
            tools,
            context,
        }
    }

    /// Poll `run` until it finishes and return the most recent assistant message
    pub async fn drive(&self, run: Run) -> Result<ThreadMessage, TurnError> {
        tracing::info!(run_id = %run.id, thread_id = %run.thread_id, status = %run.status, "Driving run");

        let run_id = run.id.clone();
        let mut last_status = run.status;
        let mut state = PollState::Submitted;
        let mut pending = vec![PollEvent::RunObserved(run)];

        // Each transition emits at most one effect, so this is a plain loop
        while let Some(event) = pending.pop() {
            let result = transition(&state, &self.context, event).map_err(|e| {
                tracing::error!(run_id = %run_id, error = %e, "Poll transition rejected");
                TurnError::run_failure(&run_id, last_status, Some(ApiError::unknown(e.to_string())))
            })?;

            state = result.new_state;
            if let Some(run) = state.run() {
                last_status = run.status;
            }

            for effect in result.effects {
                pending.push(self.execute_effect(effect).await);
            }
        }

        match state {
            PollState::Finished { message } => {
                tracing::info!(run_id = %run_id, message_id = %message.id, "Run produced a reply");
                Ok(message)
            }
            PollState::Failed { error } => {
                tracing::warn!(run_id = %run_id, error = %error, "Run ended without a reply");
                Err(error)
            }
            other => Err(TurnError::run_failure(
                &run_id,
                last_status,
                Some(ApiError::unknown(format!("Poll loop stalled in {other:?}"))),
            )),
        }
    }

    async fn execute_effect(&self, effect: PollEffect) -> PollEvent {
        match effect {
            PollEffect::FetchRun {
                thread_id,
                run_id,
                delay,
            } => {
                tokio::time::sleep(delay).await;
                match self.api.retrieve_run(&thread_id, &run_id).await {
                    Ok(run) => {
                        tracing::debug!(
                            run_id = %run.id,
                            status = %run.status,
                            terminal = run.status.is_terminal(),
                            "Run status"
                        );
                        PollEvent::RunObserved(run)
                    }
                    Err(e) => PollEvent::ApiFailed(e),
                }
            }

            PollEffect::RunTools {
                thread_id,
                run_id,
                calls,
            } => {
                let outputs = match self.tools.dispatch(&calls) {
                    Ok(outputs) => outputs,
                    Err(error) => return PollEvent::ToolDispatchFailed { error },
                };

                tracing::info!(run_id = %run_id, outputs = outputs.len(), "Submitting tool outputs");
                match self.api.submit_tool_outputs(&thread_id, &run_id, &outputs).await {
                    Ok(_) => PollEvent::ToolOutputsSubmitted,
                    Err(error) => {
                        tracing::warn!(
                            run_id = %run_id,
                            error = %error,
                            "Tool output submission failed, continuing to poll"
                        );
                        PollEvent::ToolOutputsRejected { error }
                    }
                }
            }

            PollEffect::ListMessages { thread_id, delay } => {
                tokio::time::sleep(delay).await;
                match self.api.list_messages(&thread_id).await {
                    Ok(messages) => PollEvent::MessagesListed(messages),
                    Err(e) => PollEvent::ApiFailed(e),
                }
            }
        }
    }
}
