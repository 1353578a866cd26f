//! Property-based tests for the poll state machine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::state::*;
use super::transition::*;
use super::*;
use crate::assistants::{ApiError, Run, RunStatus, ThreadMessage, ToolCall};
use crate::error::TurnError;
use crate::tools::DispatchError;
use proptest::prelude::*;
use std::time::Duration;

// ============================================================================
// Test Helpers
// ============================================================================

fn test_context() -> PollContext {
    PollContext {
        poll_interval: Duration::from_millis(500),
        settle_delay: Duration::from_secs(7),
        max_polls: 50,
    }
}

fn run_with(status: RunStatus) -> Run {
    Run::new("run_1", "thread_1", status)
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_pending_status() -> impl Strategy<Value = RunStatus> {
    prop_oneof![
        Just(RunStatus::Queued),
        Just(RunStatus::InProgress),
        Just(RunStatus::Cancelling),
    ]
}

fn arb_status() -> impl Strategy<Value = RunStatus> {
    prop_oneof![
        arb_pending_status(),
        Just(RunStatus::RequiresAction),
        Just(RunStatus::Completed),
        Just(RunStatus::Failed),
        Just(RunStatus::Expired),
        Just(RunStatus::Cancelled),
        Just(RunStatus::Unknown),
    ]
}

fn arb_tool_call() -> impl Strategy<Value = ToolCall> {
    ("call_[a-z]{6}", "[a-z_]{3,12}")
        .prop_map(|(id, name)| ToolCall::new(id, name, serde_json::json!({})))
}

fn arb_run() -> impl Strategy<Value = Run> {
    (arb_status(), proptest::collection::vec(arb_tool_call(), 0..4)).prop_map(|(status, calls)| {
        let run = run_with(status);
        if status == RunStatus::RequiresAction {
            run.with_tool_calls(calls)
        } else {
            run
        }
    })
}

fn arb_run_ref() -> impl Strategy<Value = RunRef> {
    arb_status().prop_map(|status| RunRef::from(&run_with(status)))
}

fn arb_api_error() -> impl Strategy<Value = ApiError> {
    prop_oneof![
        "[a-z ]{1,20}".prop_map(ApiError::network),
        "[a-z ]{1,20}".prop_map(ApiError::decode),
        "[a-z ]{1,20}".prop_map(ApiError::server_error),
    ]
}

fn arb_message() -> impl Strategy<Value = ThreadMessage> {
    (any::<bool>(), "[a-zA-Z ]{0,30}").prop_map(|(assistant, text)| {
        if assistant {
            ThreadMessage::assistant("msg", text)
        } else {
            ThreadMessage::user("msg", text)
        }
    })
}

fn arb_state() -> impl Strategy<Value = PollState> {
    prop_oneof![
        Just(PollState::Submitted),
        (arb_run_ref(), 0u32..60).prop_map(|(run, fetches)| PollState::Polling { run, fetches }),
        (arb_run_ref(), 0u32..60)
            .prop_map(|(run, fetches)| PollState::AwaitingToolOutputs { run, fetches }),
        arb_run_ref().prop_map(|run| PollState::Settling { run }),
        arb_message().prop_map(|message| PollState::Finished { message }),
        Just(PollState::Failed {
            error: TurnError::Stale
        }),
    ]
}

fn arb_event() -> impl Strategy<Value = PollEvent> {
    prop_oneof![
        arb_run().prop_map(PollEvent::RunObserved),
        Just(PollEvent::ToolOutputsSubmitted),
        arb_api_error().prop_map(|error| PollEvent::ToolOutputsRejected { error }),
        "[a-z_]{3,10}".prop_map(|name| PollEvent::ToolDispatchFailed {
            error: DispatchError::UnknownTool(name)
        }),
        proptest::collection::vec(arb_message(), 0..4).prop_map(PollEvent::MessagesListed),
        arb_api_error().prop_map(PollEvent::ApiFailed),
    ]
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #[test]
    fn terminal_states_never_emit_effects(state in arb_state(), event in arb_event()) {
        if let Ok(result) = transition(&state, &test_context(), event) {
            if result.new_state.is_terminal() {
                prop_assert!(result.effects.is_empty());
            }
            prop_assert!(result.effects.len() <= 1);
        }
    }

    #[test]
    fn finished_and_failed_accept_nothing(event in arb_event(), message in arb_message()) {
        let finished = PollState::Finished { message };
        prop_assert_eq!(
            transition(&finished, &test_context(), event.clone()).unwrap_err(),
            TransitionError::AlreadyFinished
        );
        let failed = PollState::Failed { error: TurnError::Stale };
        prop_assert_eq!(
            transition(&failed, &test_context(), event).unwrap_err(),
            TransitionError::AlreadyFinished
        );
    }

    #[test]
    fn one_fetch_per_pending_observation(pending in proptest::collection::vec(arb_pending_status(), 0..20)) {
        let ctx = test_context();
        let mut state = PollState::Submitted;
        let mut fetches = 0;

        let statuses = pending.iter().copied().chain(std::iter::once(RunStatus::Completed));
        for status in statuses {
            let result = transition(&state, &ctx, PollEvent::RunObserved(run_with(status))).unwrap();
            fetches += result
                .effects
                .iter()
                .filter(|e| matches!(e, PollEffect::FetchRun { .. }))
                .count();
            state = result.new_state;
        }

        prop_assert_eq!(fetches, pending.len());
        let is_settling = matches!(state, PollState::Settling { .. });
        prop_assert!(is_settling);
    }

    #[test]
    fn tool_calls_pass_through_in_order(calls in proptest::collection::vec(arb_tool_call(), 1..6)) {
        let result = transition(
            &PollState::Submitted,
            &test_context(),
            PollEvent::RunObserved(run_with(RunStatus::RequiresAction).with_tool_calls(calls.clone())),
        )
        .unwrap();

        match &result.effects[..] {
            [PollEffect::RunTools { calls: emitted, .. }] => {
                prop_assert_eq!(emitted, &calls);
            }
            other => {
                prop_assert!(false, "unexpected effects {:?}", other);
            }
        }
    }

    #[test]
    fn api_failures_always_end_the_turn(state in arb_state(), error in arb_api_error()) {
        if let Ok(result) = transition(&state, &test_context(), PollEvent::ApiFailed(error)) {
            let failed_with_run = matches!(
                result.new_state,
                PollState::Failed { error: TurnError::RunFailure { .. } }
            );
            prop_assert!(failed_with_run);
        }
    }

    #[test]
    fn fetch_count_never_exceeds_limit(fetches in 0u32..100, status in arb_pending_status()) {
        let ctx = test_context();
        let state = PollState::Polling { run: RunRef::from(&run_with(status)), fetches };
        let result = transition(&state, &ctx, PollEvent::RunObserved(run_with(status))).unwrap();
        if let PollState::Polling { fetches: next, .. } = result.new_state {
            prop_assert!(next <= ctx.max_polls);
        }
    }
}
