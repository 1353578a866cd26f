//! Run polling state machine
//!
//! Pure transitions in the Elm style: `transition` maps the current poll
//! state and an observed event to a new state plus the effects the executor
//! must perform next. No I/O happens here.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::PollEffect;
pub use event::PollEvent;
pub use state::{PollContext, PollState, RunRef};
pub use transition::{transition, TransitionError, TransitionResult};
