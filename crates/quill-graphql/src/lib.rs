//! quill-graphql: GraphQL transport for the quill post editor.
//!
//! - **client**: HTTP client for queries/mutations, retry policy and SSE subscriptions.
//! - **protocol**: operation documents and the server-sent events parser.
//! - **types**: post records, mutation inputs and GraphQL envelopes.
//! - **traits**: the [`PostApi`] seam the synchronizers are written against.

pub mod client;
pub mod error;
pub mod protocol;
pub mod traits;
pub mod types;

pub use client::{ClientConfig, GraphqlClient, Subscription};
pub use error::{GraphqlError, Result};
pub use traits::PostApi;
pub use types::{CreatePostInput, Post, PostSummary, UpdatePostInput};
