//! The voice-driven call state machine and its execution contexts.
//!
//! Three threads cooperate here: the recognition dispatch loop (sole owner
//! of the collection sub-state), one call-lifetime worker at a time, and
//! the incoming-call monitor. Everything they share crosses through
//! [`state::CallFlags`].

pub mod dispatch;
pub mod machine;
pub mod state;
pub mod worker;

pub use dispatch::{Controller, ControllerHandle};
pub use machine::CallStateMachine;
pub use state::{CallFlags, CallState, CollectPurpose, PhoneNumber};
pub use worker::{CallWorker, CallWorkerConfig};
