//! Post edit synchronizer.
//!
//! [`machine`] holds the pure `transition(state, event) -> (state, effects)`
//! function; [`editor`] drives it from a tokio task, owning the debounce
//! timers, the update subscription and the network calls.

pub mod editor;
pub mod machine;

pub use editor::{EditorHandle, PostEditor};
pub use machine::{
    transition, EditBuffer, EditEffect, EditEvent, EditPhase, EditSeed, EditState, EditView,
    LiveEdit, PLACEHOLDER_MARKDOWN,
};
