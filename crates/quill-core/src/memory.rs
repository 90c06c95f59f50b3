//! In-process post backend.
//!
//! Behaves like the hosted GraphQL backend as far as the synchronizers can
//! tell: ids are unique, `createdAt` is assigned on create, every write is
//! pushed to the subscribers of that post, and every create is announced.
//! Used by the integration tests and by `quill --memory`.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use quill_graphql::{
    CreatePostInput, GraphqlError, Post, PostApi, PostSummary, Result, Subscription,
    UpdatePostInput,
};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 256;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteKind {
    Create,
    Update,
    Delete,
}

/// One accepted mutation, in the order the backend applied it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WriteRecord {
    pub kind: WriteKind,
    pub post: Post,
}

#[derive(Default)]
struct Failures {
    writes: usize,
    reads: usize,
    subscriptions: usize,
}

struct Inner {
    posts: HashMap<String, Post>,
    /// Ids in creation order; `list_posts` returns them in this order.
    order: Vec<String>,
    updates: HashMap<String, broadcast::Sender<Post>>,
    creations: broadcast::Sender<PostSummary>,
    writes: Vec<WriteRecord>,
    failures: Failures,
    /// Time every create/update/delete spends in flight before it is applied.
    write_delay: Duration,
}

pub struct MemoryBackend {
    inner: Mutex<Inner>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        let (creations, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            inner: Mutex::new(Inner {
                posts: HashMap::new(),
                order: Vec::new(),
                updates: HashMap::new(),
                creations,
                writes: Vec::new(),
                failures: Failures::default(),
                write_delay: Duration::ZERO,
            }),
        }
    }

    /// Store `post` as-is, without announcing it or logging a write.
    pub fn insert(&self, post: Post) {
        let mut inner = self.inner.lock();
        if !inner.posts.contains_key(&post.id) {
            inner.order.push(post.id.clone());
        }
        inner.posts.insert(post.id.clone(), post);
    }

    pub fn post(&self, id: &str) -> Option<Post> {
        self.inner.lock().posts.get(id).cloned()
    }

    pub fn writes(&self) -> Vec<WriteRecord> {
        self.inner.lock().writes.clone()
    }

    /// Updates accepted for `id`, oldest first.
    pub fn updates_of(&self, id: &str) -> Vec<Post> {
        self.inner
            .lock()
            .writes
            .iter()
            .filter(|w| w.kind == WriteKind::Update && w.post.id == id)
            .map(|w| w.post.clone())
            .collect()
    }

    /// The next `count` creates/updates/deletes fail with a transport error.
    pub fn fail_writes(&self, count: usize) {
        self.inner.lock().failures.writes = count;
    }

    /// The next `count` gets/lists fail with a transport error.
    pub fn fail_reads(&self, count: usize) {
        self.inner.lock().failures.reads = count;
    }

    /// The next `count` subscribe calls fail.
    pub fn fail_subscriptions(&self, count: usize) {
        self.inner.lock().failures.subscriptions = count;
    }

    /// Hold every later create/update/delete for `delay` before applying it.
    pub fn set_write_delay(&self, delay: Duration) {
        self.inner.lock().write_delay = delay;
    }

    async fn write_latency(&self) {
        let delay = self.inner.lock().write_delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    /// End every open subscription, as a dropped connection would.
    pub fn disconnect_subscribers(&self) {
        let mut inner = self.inner.lock();
        inner.updates.clear();
        let (creations, _) = broadcast::channel(CHANNEL_CAPACITY);
        inner.creations = creations;
        tracing::debug!("[Memory] Disconnected all subscribers");
    }

    /// Push a revision to the subscribers of `post.id` as if another client
    /// wrote it, and store it.
    pub fn push_update(&self, post: Post) {
        let mut inner = self.inner.lock();
        if !inner.posts.contains_key(&post.id) {
            inner.order.push(post.id.clone());
        }
        inner.posts.insert(post.id.clone(), post.clone());
        inner.publish_update(post);
    }

    /// Announce a creation without storing anything.
    pub fn announce_creation(&self, summary: PostSummary) {
        let inner = self.inner.lock();
        // No receivers is fine.
        let _ = inner.creations.send(summary);
    }
}

impl Inner {
    fn take_failure(counter: &mut usize, what: &str) -> Result<()> {
        if *counter == 0 {
            return Ok(());
        }
        *counter -= 1;
        Err(GraphqlError::Http(format!("injected {} failure", what)))
    }

    fn publish_update(&mut self, post: Post) {
        let id = post.id.clone();
        let orphaned = match self.updates.get(&id) {
            Some(tx) => tx.send(post).is_err(),
            None => false,
        };
        if orphaned {
            self.updates.remove(&id);
        }
    }
}

/// Relay a broadcast receiver into the transport's subscription handle. The
/// relay stops once the handle is dropped, or reports the subscription closed
/// once the sender goes away.
fn relay<T: Clone + Send + 'static>(mut rx: broadcast::Receiver<T>) -> Subscription<T> {
    let (tx, out) = async_channel::unbounded();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(item) => {
                    if tx.send(Ok(item)).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("[Memory] Subscriber lagged, skipped {} items", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => {
                    let _ = tx.send(Err(GraphqlError::SubscriptionClosed)).await;
                    break;
                }
            }
        }
    });
    Subscription::new(out)
}

#[async_trait]
impl PostApi for MemoryBackend {
    async fn create_post(&self, input: CreatePostInput) -> Result<Post> {
        self.write_latency().await;
        let mut inner = self.inner.lock();
        Inner::take_failure(&mut inner.failures.writes, "write")?;
        if inner.posts.contains_key(&input.id) {
            return Err(GraphqlError::Conflict(input.id));
        }

        let post = Post {
            id: input.id,
            client_id: input.client_id,
            title: input.title,
            markdown: input.markdown,
            created_at: Utc::now(),
        };
        inner.order.push(post.id.clone());
        inner.posts.insert(post.id.clone(), post.clone());
        inner.writes.push(WriteRecord {
            kind: WriteKind::Create,
            post: post.clone(),
        });
        let _ = inner.creations.send(post.summary());
        tracing::debug!("[Memory] Created {}", post.id);
        Ok(post)
    }

    async fn update_post(&self, input: UpdatePostInput) -> Result<Post> {
        self.write_latency().await;
        let mut inner = self.inner.lock();
        Inner::take_failure(&mut inner.failures.writes, "write")?;
        if !inner.posts.contains_key(&input.id) {
            return Err(GraphqlError::NotFound(input.id));
        }

        let post = Post {
            id: input.id,
            client_id: input.client_id,
            title: input.title,
            markdown: input.markdown,
            created_at: input.created_at,
        };
        inner.posts.insert(post.id.clone(), post.clone());
        inner.writes.push(WriteRecord {
            kind: WriteKind::Update,
            post: post.clone(),
        });
        inner.publish_update(post.clone());
        tracing::trace!("[Memory] Updated {} for {}", post.id, post.client_id);
        Ok(post)
    }

    async fn delete_post(&self, id: &str) -> Result<Post> {
        self.write_latency().await;
        let mut inner = self.inner.lock();
        Inner::take_failure(&mut inner.failures.writes, "write")?;
        let post = inner
            .posts
            .remove(id)
            .ok_or_else(|| GraphqlError::NotFound(id.to_string()))?;
        inner.order.retain(|existing| existing != id);
        inner.updates.remove(id);
        inner.writes.push(WriteRecord {
            kind: WriteKind::Delete,
            post: post.clone(),
        });
        Ok(post)
    }

    async fn get_post(&self, id: &str) -> Result<Option<Post>> {
        let mut inner = self.inner.lock();
        Inner::take_failure(&mut inner.failures.reads, "read")?;
        Ok(inner.posts.get(id).cloned())
    }

    async fn list_posts(&self, limit: u32) -> Result<Vec<PostSummary>> {
        let mut inner = self.inner.lock();
        Inner::take_failure(&mut inner.failures.reads, "read")?;
        Ok(inner
            .order
            .iter()
            .filter_map(|id| inner.posts.get(id))
            .take(limit as usize)
            .map(Post::summary)
            .collect())
    }

    async fn subscribe_to_post_updates(&self, id: &str) -> Result<Subscription<Post>> {
        let mut inner = self.inner.lock();
        Inner::take_failure(&mut inner.failures.subscriptions, "subscription")
            .map_err(|e| GraphqlError::Subscription(e.to_string()))?;
        let rx = inner
            .updates
            .entry(id.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe();
        Ok(relay(rx))
    }

    async fn subscribe_to_post_creations(&self) -> Result<Subscription<PostSummary>> {
        let mut inner = self.inner.lock();
        Inner::take_failure(&mut inner.failures.subscriptions, "subscription")
            .map_err(|e| GraphqlError::Subscription(e.to_string()))?;
        Ok(relay(inner.creations.subscribe()))
    }
}
