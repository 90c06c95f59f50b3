use crate::client::Subscription;
use crate::error::Result;
use crate::types::{CreatePostInput, Post, PostSummary, UpdatePostInput};
use async_trait::async_trait;

/// Operations the post backend offers. Synchronizers only ever talk to this
/// trait, so the same code runs against the GraphQL client and the
/// in-process backend used in tests.
#[async_trait]
pub trait PostApi: Send + Sync + 'static {
    /// Fails with [`GraphqlError::Conflict`](crate::GraphqlError::Conflict)
    /// when `input.id` already exists.
    async fn create_post(&self, input: CreatePostInput) -> Result<Post>;
    async fn update_post(&self, input: UpdatePostInput) -> Result<Post>;
    async fn delete_post(&self, id: &str) -> Result<Post>;
    async fn get_post(&self, id: &str) -> Result<Option<Post>>;
    async fn list_posts(&self, limit: u32) -> Result<Vec<PostSummary>>;
    /// Every revision written to `id`, by any client, including this one.
    async fn subscribe_to_post_updates(&self, id: &str) -> Result<Subscription<Post>>;
    async fn subscribe_to_post_creations(&self) -> Result<Subscription<PostSummary>>;
}
