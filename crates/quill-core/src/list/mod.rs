//! Post list synchronizer.

pub mod state;
pub mod sync;

pub use state::{ListEvent, ListState};
pub use sync::{ListHandle, PostList};
