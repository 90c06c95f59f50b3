//! Tokio driver for the list view.

use super::state::{ListEvent, ListState};
use crate::config::Config;
use crate::route::Route;
use crate::subscription::{next_item, wait_until};
use parking_lot::Mutex;
use quill_graphql::{PostApi, PostSummary, Subscription};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant};

struct Shared {
    state: Mutex<ListState>,
    view_tx: watch::Sender<ListState>,
}

impl Shared {
    fn apply(&self, event: ListEvent) {
        let mut state = self.state.lock();
        if state.apply(event) {
            self.view_tx.send_replace(state.clone());
        }
    }

    fn is_closed(&self) -> bool {
        self.state.lock().is_closed()
    }
}

pub struct PostList;

impl PostList {
    /// Fetch the list and follow creations. Must be called inside a tokio runtime.
    pub fn open(api: Arc<dyn PostApi>, config: &Config) -> ListHandle {
        let initial = ListState::loading();
        let (view_tx, view_rx) = watch::channel(initial.clone());
        let shared = Arc::new(Shared {
            state: Mutex::new(initial),
            view_tx,
        });
        let driver = Driver {
            shared: shared.clone(),
            api,
            limit: config.list_limit,
            resubscribe_delay: config.resubscribe_delay(),
        };
        let task = tokio::spawn(driver.run());

        ListHandle {
            shared,
            view_rx,
            task,
        }
    }
}

/// Handle to an open list. Dropping it closes the list.
pub struct ListHandle {
    shared: Arc<Shared>,
    view_rx: watch::Receiver<ListState>,
    task: JoinHandle<()>,
}

impl ListHandle {
    pub fn state(&self) -> ListState {
        self.view_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ListState> {
        self.view_rx.clone()
    }

    /// Route of a new post titled `title`, or `None` for an empty title.
    /// The post itself is created when its editor opens.
    pub fn create_post(&self, title: &str) -> Option<Route> {
        if title.is_empty() {
            return None;
        }
        let route = Route::new_post(title);
        tracing::info!("[PostList] New post requested at {}", route);
        Some(route)
    }

    pub fn is_closed(&self) -> bool {
        self.shared.is_closed() || self.task.is_finished()
    }

    pub fn close(self) {}
}

impl Drop for ListHandle {
    fn drop(&mut self) {
        if !self.shared.is_closed() {
            tracing::debug!("[PostList] Closing");
            self.shared.apply(ListEvent::Close);
        }
        self.task.abort();
    }
}

struct Driver {
    shared: Arc<Shared>,
    api: Arc<dyn PostApi>,
    limit: u32,
    resubscribe_delay: Duration,
}

impl Driver {
    async fn run(self) {
        // Subscribe first so nothing created during the fetch is missed.
        let mut creations = self.connect().await;
        let mut resubscribe_at = self.retry_deadline(&creations);

        let api = self.api.clone();
        let limit = self.limit;
        let fetch = async move { api.list_posts(limit).await };
        tokio::pin!(fetch);
        let mut fetched = false;

        loop {
            tokio::select! {
                result = &mut fetch, if !fetched => {
                    fetched = true;
                    match result {
                        Ok(posts) => {
                            tracing::info!("[PostList] Fetched {} posts", posts.len());
                            self.shared.apply(ListEvent::Fetched(posts));
                        }
                        Err(e) => {
                            tracing::error!("[PostList] Fetching posts failed: {}", e);
                            self.shared.apply(ListEvent::FetchFailed);
                        }
                    }
                }
                item = next_item(&mut creations) => match item {
                    Some(Ok(summary)) => {
                        tracing::debug!("[PostList] {} created by {}", summary.id, summary.client_id);
                        self.shared.apply(ListEvent::Created(summary));
                    }
                    Some(Err(e)) => {
                        tracing::warn!(
                            "[PostList] Creation subscription failed: {}. Retrying in {:?}",
                            e, self.resubscribe_delay
                        );
                        creations = None;
                        resubscribe_at = Some(Instant::now() + self.resubscribe_delay);
                    }
                    None => {
                        tracing::info!(
                            "[PostList] Creation subscription ended. Retrying in {:?}",
                            self.resubscribe_delay
                        );
                        creations = None;
                        resubscribe_at = Some(Instant::now() + self.resubscribe_delay);
                    }
                },
                _ = wait_until(resubscribe_at) => {
                    creations = self.connect().await;
                    resubscribe_at = self.retry_deadline(&creations);
                }
            }

            if self.shared.is_closed() {
                break;
            }
        }
    }

    async fn connect(&self) -> Option<Subscription<PostSummary>> {
        match self.api.subscribe_to_post_creations().await {
            Ok(subscription) => Some(subscription),
            Err(e) => {
                tracing::warn!("[PostList] Could not subscribe to creations: {}", e);
                None
            }
        }
    }

    fn retry_deadline(&self, subscription: &Option<Subscription<PostSummary>>) -> Option<Instant> {
        match subscription {
            Some(_) => None,
            None => Some(Instant::now() + self.resubscribe_delay),
        }
    }
}
