//! quill-core: collaborative edit synchronization for the quill post editor.
//!
//! - **identity**: the per-process client id used to recognize echoes.
//! - **debounce**: the quiescence timer that collapses keystroke bursts.
//! - **edit**: the post edit synchronizer (pure state machine plus driver).
//! - **list**: the post list synchronizer.
//! - **route**: `/` and `/post/:id/:title?` paths.
//! - **memory**: an in-process backend implementing [`PostApi`].

pub mod config;
pub mod debounce;
pub mod edit;
pub mod error;
pub mod identity;
pub mod list;
pub mod memory;
pub mod route;
mod subscription;

pub use crate::config::Config;
pub use crate::debounce::Debouncer;
pub use crate::edit::{EditBuffer, EditPhase, EditSeed, EditView, EditorHandle, PostEditor};
pub use crate::error::{Result, SyncError};
pub use crate::identity::{ClientId, ClientSession};
pub use crate::list::{ListHandle, ListState, PostList};
pub use crate::memory::MemoryBackend;
pub use crate::route::Route;

pub use quill_graphql::{
    ClientConfig, CreatePostInput, GraphqlClient, GraphqlError, Post, PostApi, PostSummary,
    UpdatePostInput,
};
