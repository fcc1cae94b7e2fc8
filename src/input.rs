//! Terminal input.
//!
//! Key events are read on a dedicated blocking thread and turned into [`InputAction`]s by a
//! small state machine (navigation vs. filter editing).

pub mod service;

pub use service::{
    spawn_input_thread, InputAction, InputService, InputState, InputStateMachine, ScrollDirection,
};
