//! Submission state machine
//!
//! Pure state transitions in the Elm Architecture style: the runtime feeds
//! events in, gets a new state plus effects back, and performs the I/O.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;


pub use effect::Effect;
pub use event::Event;
pub use state::{SessionContext, SubmitState};
pub use transition::{transition, TransitionError, TransitionResult};
