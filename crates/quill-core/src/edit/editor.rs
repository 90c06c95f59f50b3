//! Tokio driver for one open editor.
//!
//! Local edits go through [`EditorHandle`] and land in the shared state
//! synchronously. Everything asynchronous (debounce timers, the update
//! subscription, create/update/fetch calls) runs in one spawned task that
//! feeds outcomes back through [`transition`].

use super::machine::{
    transition, EditBuffer, EditEffect, EditEvent, EditSeed, EditState, EditView, LiveEdit,
};
use crate::config::Config;
use crate::debounce::Debouncer;
use crate::error::{Result, SyncError};
use crate::identity::{ClientId, ClientSession};
use crate::subscription::{next_item, wait_until};
use parking_lot::Mutex;
use quill_graphql::{Post, PostApi, Subscription};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant};

struct Shared {
    state: Mutex<EditState>,
    local: ClientId,
    view_tx: watch::Sender<EditView>,
}

impl Shared {
    fn apply(&self, event: EditEvent) -> Vec<EditEffect> {
        let mut guard = self.state.lock();
        let state = std::mem::replace(&mut *guard, EditState::TornDown);
        let (next, effects) = transition(state, event, &self.local);
        if let Some(view) = next.view() {
            self.view_tx.send_replace(view);
        }
        *guard = next;
        effects
    }

    fn fields(&self) -> Option<(String, String)> {
        self.state
            .lock()
            .buffer()
            .map(|buffer| (buffer.title.clone(), buffer.markdown.clone()))
    }

    fn is_torn_down(&self) -> bool {
        self.state.lock().is_torn_down()
    }
}

/// Opens editors. See [`PostEditor::open`].
pub struct PostEditor;

impl PostEditor {
    /// Start synchronizing one post. Must be called inside a tokio runtime.
    pub fn open(
        api: Arc<dyn PostApi>,
        session: &ClientSession,
        seed: EditSeed,
        config: &Config,
    ) -> EditorHandle {
        let local = session.current_client_id().clone();
        let (live, effects) = LiveEdit::open(seed, &local);
        let id = live.buffer.id.clone();
        let (view_tx, view_rx) = watch::channel(live.view());
        // Baselined on the seed now, so edits made before the task first runs still settle.
        let debouncers = Debouncers {
            title: Debouncer::new(live.buffer.title.clone(), config.debounce()),
            markdown: Debouncer::new(live.buffer.markdown.clone(), config.debounce()),
        };

        tracing::info!("[Editor] Opening {} as {}", id, local);

        let shared = Arc::new(Shared {
            state: Mutex::new(EditState::Live(live)),
            local,
            view_tx,
        });
        let (notify_tx, notify_rx) = mpsc::unbounded_channel();
        let driver = Driver {
            shared: shared.clone(),
            api,
            id: id.clone(),
            resubscribe_delay: config.resubscribe_delay(),
        };
        let task = tokio::spawn(driver.run(notify_rx, debouncers, effects));

        EditorHandle {
            id,
            shared,
            notify_tx,
            view_rx,
            task,
        }
    }
}

/// Handle to an open editor. Dropping it closes the editor.
pub struct EditorHandle {
    id: String,
    shared: Arc<Shared>,
    notify_tx: mpsc::UnboundedSender<()>,
    view_rx: watch::Receiver<EditView>,
    task: JoinHandle<()>,
}

impl EditorHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Applied to the buffer before this returns; the write follows once
    /// typing has been quiet for the debounce delay.
    ///
    /// Fails with [`SyncError::Closed`] once the driver has stopped, since
    /// the edit could never be written.
    pub fn set_title(&self, title: impl Into<String>) -> Result<()> {
        self.local_edit(EditEvent::TitleChanged(title.into()))
    }

    pub fn set_markdown(&self, markdown: impl Into<String>) -> Result<()> {
        self.local_edit(EditEvent::MarkdownChanged(markdown.into()))
    }

    pub fn toggle_editing(&self) {
        self.shared.apply(EditEvent::ToggleEditing);
    }

    pub fn view(&self) -> EditView {
        self.view_rx.borrow().clone()
    }

    pub fn buffer(&self) -> Option<EditBuffer> {
        self.shared.state.lock().buffer().cloned()
    }

    /// Receiver that wakes on every state change.
    pub fn subscribe(&self) -> watch::Receiver<EditView> {
        self.view_rx.clone()
    }

    /// Closed explicitly, or stopped because the driver task died.
    pub fn is_closed(&self) -> bool {
        self.shared.is_torn_down() || self.task.is_finished()
    }

    /// Stop the timers and the subscription. Results still in flight are discarded.
    pub fn close(self) {}

    fn local_edit(&self, event: EditEvent) -> Result<()> {
        if self.is_closed() {
            return Err(SyncError::Closed);
        }
        self.shared.apply(event);
        self.notify_tx.send(()).map_err(|_| SyncError::Closed)
    }

    fn shutdown(&self) {
        if !self.shared.is_torn_down() {
            tracing::info!("[Editor] Closing {}", self.id);
            self.shared.apply(EditEvent::Close);
        }
        self.task.abort();
    }
}

impl Drop for EditorHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

struct Debouncers {
    title: Debouncer<String>,
    markdown: Debouncer<String>,
}

struct Driver {
    shared: Arc<Shared>,
    api: Arc<dyn PostApi>,
    id: String,
    resubscribe_delay: Duration,
}

impl Driver {
    async fn run(
        self,
        mut notify_rx: mpsc::UnboundedReceiver<()>,
        debouncers: Debouncers,
        initial: Vec<EditEffect>,
    ) {
        let (results_tx, mut results_rx) = mpsc::unbounded_channel::<EditEvent>();
        let Debouncers {
            mut title,
            mut markdown,
        } = debouncers;

        // Subscribe before creating so no revision slips between the two.
        let mut subscription = self.connect().await;
        let mut resubscribe_at = match subscription {
            Some(_) => None,
            None => Some(Instant::now() + self.resubscribe_delay),
        };
        self.execute(initial, &results_tx);

        loop {
            tokio::select! {
                notice = notify_rx.recv() => {
                    if notice.is_none() {
                        break;
                    }
                    self.observe(&mut title, &mut markdown);
                }
                value = title.settled() => {
                    tracing::trace!("[Editor] {} title settled: {:?}", self.id, value);
                    let effects = self.shared.apply(EditEvent::DebounceSettled);
                    self.execute(effects, &results_tx);
                }
                value = markdown.settled() => {
                    tracing::trace!("[Editor] {} markdown settled ({} bytes)", self.id, value.len());
                    let effects = self.shared.apply(EditEvent::DebounceSettled);
                    self.execute(effects, &results_tx);
                }
                pushed = next_item(&mut subscription) => match pushed {
                    Some(Ok(post)) => {
                        let effects = self.shared.apply(EditEvent::RemotePush(post));
                        self.observe(&mut title, &mut markdown);
                        self.execute(effects, &results_tx);
                    }
                    Some(Err(e)) => {
                        tracing::warn!(
                            "[Editor] Subscription for {} failed: {}. Retrying in {:?}",
                            self.id, e, self.resubscribe_delay
                        );
                        subscription = None;
                        resubscribe_at = Some(Instant::now() + self.resubscribe_delay);
                    }
                    None => {
                        tracing::info!(
                            "[Editor] Subscription for {} ended. Retrying in {:?}",
                            self.id, self.resubscribe_delay
                        );
                        subscription = None;
                        resubscribe_at = Some(Instant::now() + self.resubscribe_delay);
                    }
                },
                _ = wait_until(resubscribe_at) => {
                    subscription = self.connect().await;
                    resubscribe_at = match subscription {
                        Some(_) => None,
                        None => Some(Instant::now() + self.resubscribe_delay),
                    };
                }
                Some(event) = results_rx.recv() => {
                    let adopts = matches!(
                        event,
                        EditEvent::Fetched(Some(_)) | EditEvent::CreateConflict(Some(_))
                    );
                    let effects = self.shared.apply(event);
                    if adopts {
                        // The server copy is the new baseline, not an edit.
                        self.rebase(&mut title, &mut markdown);
                    } else {
                        self.observe(&mut title, &mut markdown);
                    }
                    self.execute(effects, &results_tx);
                }
            }

            if self.shared.is_torn_down() {
                break;
            }
        }

        title.cancel();
        markdown.cancel();
        tracing::debug!("[Editor] Driver for {} stopped", self.id);
    }

    async fn connect(&self) -> Option<Subscription<Post>> {
        match self.api.subscribe_to_post_updates(&self.id).await {
            Ok(subscription) => {
                tracing::debug!("[Editor] Subscribed to updates of {}", self.id);
                Some(subscription)
            }
            Err(e) => {
                tracing::warn!("[Editor] Could not subscribe to {}: {}", self.id, e);
                None
            }
        }
    }

    fn observe(&self, title: &mut Debouncer<String>, markdown: &mut Debouncer<String>) {
        if let Some((t, m)) = self.shared.fields() {
            title.observe(t);
            markdown.observe(m);
        }
    }

    fn rebase(&self, title: &mut Debouncer<String>, markdown: &mut Debouncer<String>) {
        if let Some((t, m)) = self.shared.fields() {
            title.reset(t);
            markdown.reset(m);
        }
    }

    fn execute(&self, effects: Vec<EditEffect>, results: &mpsc::UnboundedSender<EditEvent>) {
        for effect in effects {
            let api = self.api.clone();
            let results = results.clone();
            tokio::spawn(async move {
                let event = perform(api.as_ref(), effect).await;
                // Closed once the editor is torn down; the outcome is moot then.
                let _ = results.send(event);
            });
        }
    }
}

async fn perform(api: &dyn PostApi, effect: EditEffect) -> EditEvent {
    match effect {
        EditEffect::Create(input) => {
            let id = input.id.clone();
            match api.create_post(input).await {
                Ok(post) => {
                    tracing::info!("[Editor] Created {}", post.id);
                    EditEvent::Created(post)
                }
                Err(e) if e.is_conflict() => {
                    tracing::info!("[Editor] {} already exists, reading it back", id);
                    match api.get_post(&id).await {
                        Ok(existing) => EditEvent::CreateConflict(existing),
                        Err(e) => {
                            tracing::warn!("[Editor] Reading {} after conflict failed: {}", id, e);
                            EditEvent::CreateConflict(None)
                        }
                    }
                }
                Err(e) => {
                    tracing::error!("[Editor] Create of {} failed: {}", id, e);
                    EditEvent::WriteFailed(SyncError::from(e))
                }
            }
        }
        EditEffect::Update(input) => {
            let id = input.id.clone();
            match api.update_post(input).await {
                Ok(post) => EditEvent::Written(post),
                Err(e) => {
                    tracing::error!("[Editor] Update of {} failed: {}", id, e);
                    EditEvent::WriteFailed(SyncError::from(e))
                }
            }
        }
        EditEffect::Fetch(id) => match api.get_post(&id).await {
            Ok(post) => EditEvent::Fetched(post),
            Err(e) => {
                tracing::error!("[Editor] Fetch of {} failed: {}", id, e);
                EditEvent::FetchFailed(SyncError::from(e))
            }
        },
    }
}
