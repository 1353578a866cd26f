//! Pure poll transition function

use super::{PollContext, PollEffect, PollEvent, PollState, RunRef};
use crate::assistants::{ApiError, MessageRole, Run, RunStatus, ThreadMessage};
use crate::error::TurnError;
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: PollState,
    pub effects: Vec<PollEffect>,
}

impl TransitionResult {
    pub fn new(state: PollState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: PollEffect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Run is already finished")]
    AlreadyFinished,
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

/// Pure transition function
///
/// Given the same state, context and event it always produces the same
/// state and effects.
pub fn transition(
    state: &PollState,
    context: &PollContext,
    event: PollEvent,
) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        (PollState::Finished { .. } | PollState::Failed { .. }, _) => {
            Err(TransitionError::AlreadyFinished)
        }

        // ============================================================
        // Status observations
        // ============================================================
        (PollState::Submitted, PollEvent::RunObserved(run)) => Ok(observe(run, 0, context)),

        (PollState::Polling { fetches, .. }, PollEvent::RunObserved(run)) => {
            Ok(observe(run, *fetches, context))
        }

        // ============================================================
        // Tool output round trip
        // ============================================================

        // Submission failures are logged by the executor; polling continues
        (
            PollState::AwaitingToolOutputs { run, fetches },
            PollEvent::ToolOutputsSubmitted | PollEvent::ToolOutputsRejected { .. },
        ) => Ok(schedule_fetch(run.clone(), *fetches, context)),

        (PollState::AwaitingToolOutputs { .. }, PollEvent::ToolDispatchFailed { error }) => {
            Ok(fail(TurnError::from(error)))
        }

        // ============================================================
        // Reply retrieval
        // ============================================================
        (PollState::Settling { run }, PollEvent::MessagesListed(messages)) => {
            Ok(match latest_message(messages) {
                Some(message) if message.role == MessageRole::Assistant => {
                    TransitionResult::new(PollState::Finished { message })
                }
                _ => fail(TurnError::NoReply {
                    thread_id: run.thread_id.clone(),
                }),
            })
        }

        // ============================================================
        // Remote failures abort the turn with the last known run
        // ============================================================
        (
            PollState::Polling { run, .. }
            | PollState::AwaitingToolOutputs { run, .. }
            | PollState::Settling { run },
            PollEvent::ApiFailed(error),
        ) => Ok(abort(run, error)),

        (state, event) => Err(TransitionError::InvalidTransition(format!(
            "{event:?} in {state:?}"
        ))),
    }
}

fn observe(run: Run, fetches: u32, context: &PollContext) -> TransitionResult {
    let run_ref = RunRef::from(&run);

    match run.status {
        status if status.is_pending() => schedule_fetch(run_ref, fetches, context),

        RunStatus::RequiresAction => {
            let calls = run.required_action.unwrap_or_default();
            if calls.is_empty() {
                return fail(TurnError::run_failure(
                    run_ref.id,
                    run_ref.status,
                    Some(ApiError::decode("requires_action run carries no tool calls")),
                ));
            }
            let effect = PollEffect::RunTools {
                thread_id: run_ref.thread_id.clone(),
                run_id: run_ref.id.clone(),
                calls,
            };
            TransitionResult::new(PollState::AwaitingToolOutputs {
                run: run_ref,
                fetches,
            })
            .with_effect(effect)
        }

        RunStatus::Completed => {
            let effect = PollEffect::ListMessages {
                thread_id: run_ref.thread_id.clone(),
                delay: context.settle_delay,
            };
            TransitionResult::new(PollState::Settling { run: run_ref }).with_effect(effect)
        }

        status => fail(TurnError::run_failure(run_ref.id, status, None)),
    }
}

fn schedule_fetch(run: RunRef, fetches: u32, context: &PollContext) -> TransitionResult {
    if fetches >= context.max_polls {
        return fail(TurnError::run_failure(
            run.id,
            run.status,
            Some(ApiError::unknown(format!(
                "run still {} after {fetches} status checks",
                run.status
            ))),
        ));
    }
    let effect = PollEffect::fetch_run(&run, context.poll_interval);
    TransitionResult::new(PollState::Polling {
        run,
        fetches: fetches + 1,
    })
    .with_effect(effect)
}

fn abort(run: &RunRef, error: ApiError) -> TransitionResult {
    fail(TurnError::run_failure(run.id.clone(), run.status, Some(error)))
}

fn fail(error: TurnError) -> TransitionResult {
    TransitionResult::new(PollState::Failed { error })
}

/// Messages arrive newest first; put them in chronological order and take the last.
fn latest_message(mut messages: Vec<ThreadMessage>) -> Option<ThreadMessage> {
    messages.reverse();
    messages.pop()
}
