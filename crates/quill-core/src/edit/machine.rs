//! Edit synchronizer state machine.
//!
//! Everything here is synchronous and free of I/O. Network work is described
//! by the [`EditEffect`]s a transition returns; the driver performs them and
//! feeds the outcome back in as another [`EditEvent`].

use crate::error::SyncError;
use crate::identity::ClientId;
use chrono::{DateTime, Utc};
use quill_graphql::{CreatePostInput, Post, UpdatePostInput};

/// Body a brand-new post starts with.
pub const PLACEHOLDER_MARKDOWN: &str = "# This is a header\n\nAnd this is a paragraph";

/// Working copy of one post inside one open editor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditBuffer {
    pub id: String,
    pub title: String,
    pub markdown: String,
    /// Unknown until the create (or first fetch) completes.
    pub created_at: Option<DateTime<Utc>>,
    /// Client that produced the current title/markdown.
    pub client_id: ClientId,
}

impl EditBuffer {
    fn adopt(&mut self, post: &Post) {
        self.title = post.title.clone();
        self.markdown = post.markdown.clone();
        self.created_at = Some(post.created_at);
        self.client_id = ClientId::from(post.client_id.as_str());
    }

    fn content(&self) -> (String, String) {
        (self.title.clone(), self.markdown.clone())
    }

    fn create_input(&self, local: &ClientId) -> CreatePostInput {
        CreatePostInput {
            id: self.id.clone(),
            client_id: local.to_string(),
            title: self.title.clone(),
            markdown: self.markdown.clone(),
        }
    }

    /// Full-record update carrying the local tag. `None` until `created_at` is known.
    pub fn update_input(&self, local: &ClientId) -> Option<UpdatePostInput> {
        Some(UpdatePostInput {
            id: self.id.clone(),
            client_id: local.to_string(),
            title: self.title.clone(),
            markdown: self.markdown.clone(),
            created_at: self.created_at?,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditPhase {
    /// Waiting for the first fetch of a post opened by route.
    Loading,
    Ready,
    /// The route named a post that does not exist and gave no title to create it with.
    NotFound,
}

/// How an editor comes to life.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EditSeed {
    /// Freshly minted id; the post is created on the backend right away.
    New { id: String, title: String },
    /// A post already fetched by the caller.
    Existing(Post),
    /// Opened from `/post/:id/:title?`. The post is fetched first and created
    /// only if it is missing and a title was given.
    Route { id: String, title: Option<String> },
}

#[derive(Clone, Debug, PartialEq)]
pub enum EditEvent {
    TitleChanged(String),
    MarkdownChanged(String),
    /// The debounced title or markdown changed.
    DebounceSettled,
    /// A revision pushed on this post's update subscription.
    RemotePush(Post),
    Created(Post),
    /// Create hit an existing id. Carries the existing record when it could be read.
    CreateConflict(Option<Post>),
    Fetched(Option<Post>),
    FetchFailed(SyncError),
    /// An update was accepted.
    Written(Post),
    WriteFailed(SyncError),
    ToggleEditing,
    Close,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EditEffect {
    Create(CreatePostInput),
    Update(UpdatePostInput),
    Fetch(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct LiveEdit {
    pub buffer: EditBuffer,
    pub phase: EditPhase,
    pub is_editing: bool,
    /// Most recent failed write or fetch. Never blocks editing.
    pub last_error: Option<SyncError>,
    /// A local change settled before `created_at` was known.
    pub write_deferred: bool,
    /// Create the post if a fetch finds nothing.
    create_if_missing: bool,
    /// Title and markdown the backend holds as far as this editor knows:
    /// the last write issued or the last server copy adopted.
    last_written: Option<(String, String)>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum EditState {
    Live(LiveEdit),
    TornDown,
}

/// Snapshot handed to the editor view.
#[derive(Clone, Debug, PartialEq)]
pub struct EditView {
    pub post: EditBuffer,
    pub phase: EditPhase,
    pub is_editing: bool,
    pub last_error: Option<SyncError>,
}

impl LiveEdit {
    /// Live state for `seed` along with the effects opening it requires.
    pub fn open(seed: EditSeed, local: &ClientId) -> (LiveEdit, Vec<EditEffect>) {
        let (buffer, phase, create_if_missing) = match seed {
            EditSeed::New { id, title } => (
                EditBuffer {
                    id,
                    title,
                    markdown: PLACEHOLDER_MARKDOWN.to_string(),
                    created_at: None,
                    client_id: local.clone(),
                },
                EditPhase::Ready,
                true,
            ),
            EditSeed::Existing(post) => {
                let mut buffer = EditBuffer {
                    id: post.id.clone(),
                    title: String::new(),
                    markdown: String::new(),
                    created_at: None,
                    client_id: local.clone(),
                };
                buffer.adopt(&post);
                (buffer, EditPhase::Ready, false)
            }
            EditSeed::Route { id, title } => {
                let create_if_missing = title.is_some();
                (
                    EditBuffer {
                        id,
                        title: title.unwrap_or_default(),
                        markdown: PLACEHOLDER_MARKDOWN.to_string(),
                        created_at: None,
                        client_id: local.clone(),
                    },
                    EditPhase::Loading,
                    create_if_missing,
                )
            }
        };

        let effects = match phase {
            EditPhase::Loading => vec![EditEffect::Fetch(buffer.id.clone())],
            _ if create_if_missing => vec![EditEffect::Create(buffer.create_input(local))],
            _ => Vec::new(),
        };

        // A fresh create or a fetched post means the backend already holds the buffer.
        let last_written = match phase {
            EditPhase::Loading => None,
            _ => Some(buffer.content()),
        };
        let live = LiveEdit {
            buffer,
            phase,
            is_editing: false,
            last_error: None,
            write_deferred: false,
            create_if_missing,
            last_written,
        };
        (live, effects)
    }

    fn adopt(&mut self, post: &Post) {
        self.buffer.adopt(post);
        self.phase = EditPhase::Ready;
        self.write_deferred = false;
        self.last_written = Some(self.buffer.content());
    }

    fn is_written(&self) -> bool {
        self.last_written
            .as_ref()
            .is_some_and(|(title, markdown)| *title == self.buffer.title && *markdown == self.buffer.markdown)
    }

    /// Update for the buffer, unless it is not ours or the backend already holds it.
    fn write(&mut self, local: &ClientId) -> Option<EditEffect> {
        if self.buffer.client_id != *local || self.is_written() {
            return None;
        }
        let input = self.buffer.update_input(local)?;
        self.last_written = Some(self.buffer.content());
        Some(EditEffect::Update(input))
    }

    pub fn view(&self) -> EditView {
        EditView {
            post: self.buffer.clone(),
            phase: self.phase,
            is_editing: self.is_editing,
            last_error: self.last_error.clone(),
        }
    }
}

impl EditState {
    pub fn initialize(seed: EditSeed, local: &ClientId) -> (EditState, Vec<EditEffect>) {
        let (live, effects) = LiveEdit::open(seed, local);
        (EditState::Live(live), effects)
    }

    pub fn live(&self) -> Option<&LiveEdit> {
        match self {
            EditState::Live(live) => Some(live),
            EditState::TornDown => None,
        }
    }

    pub fn buffer(&self) -> Option<&EditBuffer> {
        self.live().map(|live| &live.buffer)
    }

    pub fn is_torn_down(&self) -> bool {
        matches!(self, EditState::TornDown)
    }

    pub fn view(&self) -> Option<EditView> {
        self.live().map(LiveEdit::view)
    }
}

/// Next state and effects for `event`. Once torn down, every event is a no-op.
pub fn transition(
    state: EditState,
    event: EditEvent,
    local: &ClientId,
) -> (EditState, Vec<EditEffect>) {
    let EditState::Live(mut live) = state else {
        tracing::trace!("[Editor] Ignoring {:?} after teardown", event);
        return (EditState::TornDown, Vec::new());
    };

    let mut effects = Vec::new();
    match event {
        EditEvent::TitleChanged(title) => {
            live.buffer.title = title;
            live.buffer.client_id = local.clone();
        }
        EditEvent::MarkdownChanged(markdown) => {
            live.buffer.markdown = markdown;
            live.buffer.client_id = local.clone();
        }
        EditEvent::DebounceSettled => {
            if live.buffer.client_id != *local {
                // The settled value came in from another client; writing it
                // back would only re-broadcast it.
                tracing::debug!(
                    "[Editor] {} settled on a value from {}, not writing",
                    live.buffer.id,
                    live.buffer.client_id
                );
            } else if live.is_written() {
                tracing::trace!("[Editor] {} unchanged since last write", live.buffer.id);
            } else if let Some(update) = live.write(local) {
                effects.push(update);
            } else {
                tracing::debug!("[Editor] {} not created yet, deferring write", live.buffer.id);
                live.write_deferred = true;
            }
        }
        EditEvent::RemotePush(post) => {
            if post.id != live.buffer.id {
                tracing::warn!(
                    "[Editor] Dropping push for {} on editor for {}",
                    post.id,
                    live.buffer.id
                );
            } else if local.is_origin_of(&post) {
                tracing::debug!("[Editor] Ignoring echo of our own write to {}", post.id);
            } else {
                live.adopt(&post);
            }
        }
        EditEvent::Created(post) => {
            live.buffer.created_at = Some(post.created_at);
            live.phase = EditPhase::Ready;
            live.last_error = None;
            live.last_written = Some((post.title, post.markdown));
            if std::mem::take(&mut live.write_deferred) {
                effects.extend(live.write(local));
            }
        }
        EditEvent::CreateConflict(Some(existing)) => {
            tracing::info!("[Editor] {} already exists, adopting server copy", existing.id);
            live.adopt(&existing);
        }
        EditEvent::CreateConflict(None) => {
            effects.push(EditEffect::Fetch(live.buffer.id.clone()));
        }
        EditEvent::Fetched(Some(post)) => {
            live.adopt(&post);
            live.last_error = None;
        }
        EditEvent::Fetched(None) => {
            if live.create_if_missing {
                live.phase = EditPhase::Ready;
                live.last_written = Some(live.buffer.content());
                effects.push(EditEffect::Create(live.buffer.create_input(local)));
            } else {
                live.phase = EditPhase::NotFound;
            }
        }
        EditEvent::FetchFailed(error) => {
            live.last_error = Some(error);
        }
        EditEvent::WriteFailed(error) => {
            // The buffer is never rolled back; the next settle writes it again.
            live.last_written = None;
            live.last_error = Some(error);
        }
        EditEvent::Written(_) => {
            live.last_error = None;
        }
        EditEvent::ToggleEditing => {
            live.is_editing = !live.is_editing;
        }
        EditEvent::Close => return (EditState::TornDown, Vec::new()),
    }

    (EditState::Live(live), effects)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use quill_graphql::GraphqlError;

    fn local() -> ClientId {
        ClientId::from("A")
    }

    fn post(client: &str, title: &str, markdown: &str) -> Post {
        Post {
            id: "p1".into(),
            client_id: client.into(),
            title: title.into(),
            markdown: markdown.into(),
            created_at: Utc.with_ymd_and_hms(2019, 1, 2, 3, 4, 5).unwrap(),
        }
    }

    fn live_on(post: Post) -> EditState {
        EditState::initialize(EditSeed::Existing(post), &local()).0
    }

    fn apply(state: EditState, events: Vec<EditEvent>) -> (EditState, Vec<EditEffect>) {
        let mut all = Vec::new();
        let mut state = state;
        for event in events {
            let (next, effects) = transition(state, event, &local());
            state = next;
            all.extend(effects);
        }
        (state, all)
    }

    #[test]
    fn test_new_seed_issues_tagged_create() {
        let (state, effects) = EditState::initialize(
            EditSeed::New {
                id: "p1".into(),
                title: "My Title".into(),
            },
            &local(),
        );
        let buffer = state.buffer().unwrap();
        assert_eq!(buffer.title, "My Title");
        assert_eq!(buffer.markdown, PLACEHOLDER_MARKDOWN);
        assert_eq!(state.live().unwrap().phase, EditPhase::Ready);
        assert_eq!(
            effects,
            vec![EditEffect::Create(CreatePostInput {
                id: "p1".into(),
                client_id: "A".into(),
                title: "My Title".into(),
                markdown: PLACEHOLDER_MARKDOWN.into(),
            })]
        );
    }

    #[test]
    fn test_existing_seed_adopts_without_effects() {
        let (state, effects) = EditState::initialize(EditSeed::Existing(post("B", "T", "M")), &local());
        assert!(effects.is_empty());
        let buffer = state.buffer().unwrap();
        assert_eq!(buffer.client_id, ClientId::from("B"));
        assert!(buffer.created_at.is_some());
    }

    #[test]
    fn test_local_edit_applies_immediately_and_tags_local() {
        let (state, effects) = apply(
            live_on(post("B", "T", "M")),
            vec![EditEvent::MarkdownChanged("Hello".into())],
        );
        assert!(effects.is_empty());
        let buffer = state.buffer().unwrap();
        assert_eq!(buffer.markdown, "Hello");
        assert_eq!(buffer.client_id, local());
    }

    #[test]
    fn test_settle_after_local_edit_writes_full_record() {
        let seeded = post("B", "T", "M");
        let (_, effects) = apply(
            live_on(seeded.clone()),
            vec![
                EditEvent::MarkdownChanged("Hello".into()),
                EditEvent::DebounceSettled,
            ],
        );
        assert_eq!(
            effects,
            vec![EditEffect::Update(UpdatePostInput {
                id: "p1".into(),
                client_id: "A".into(),
                title: "T".into(),
                markdown: "Hello".into(),
                created_at: seeded.created_at,
            })]
        );
    }

    #[test]
    fn test_settle_after_remote_push_is_suppressed() {
        let (_, effects) = apply(
            live_on(post("A", "T", "M")),
            vec![
                EditEvent::RemotePush(post("B", "T", "from B")),
                EditEvent::DebounceSettled,
            ],
        );
        assert!(effects.is_empty());
    }

    #[test]
    fn test_own_echo_is_discarded() {
        let (state, _) = apply(
            live_on(post("A", "T", "M")),
            vec![EditEvent::MarkdownChanged("Hello wor".into())],
        );
        let before = state.buffer().cloned();
        let (state, effects) = apply(state, vec![EditEvent::RemotePush(post("A", "T", "Hello"))]);
        assert!(effects.is_empty());
        assert_eq!(state.buffer().cloned(), before);
    }

    #[test]
    fn test_foreign_push_replaces_buffer_and_is_idempotent() {
        let (once, _) = apply(
            live_on(post("A", "T", "M")),
            vec![
                EditEvent::MarkdownChanged("local".into()),
                EditEvent::RemotePush(post("B", "New title", "New body")),
            ],
        );
        let buffer = once.buffer().unwrap();
        assert_eq!(buffer.title, "New title");
        assert_eq!(buffer.markdown, "New body");
        assert_eq!(buffer.client_id, ClientId::from("B"));

        let (twice, _) = apply(once.clone(), vec![EditEvent::RemotePush(post("B", "New title", "New body"))]);
        assert_eq!(twice, once);
    }

    #[test]
    fn test_push_for_other_post_is_dropped() {
        let mut other = post("B", "X", "Y");
        other.id = "p2".into();
        let state = live_on(post("A", "T", "M"));
        let (next, _) = apply(state.clone(), vec![EditEvent::RemotePush(other)]);
        assert_eq!(next, state);
    }

    #[test]
    fn test_write_before_create_completes_is_deferred_then_flushed() {
        let (state, _) = EditState::initialize(
            EditSeed::New {
                id: "p1".into(),
                title: "T".into(),
            },
            &local(),
        );
        let (state, effects) = apply(
            state,
            vec![
                EditEvent::MarkdownChanged("typed early".into()),
                EditEvent::DebounceSettled,
            ],
        );
        assert!(effects.is_empty());
        assert!(state.live().unwrap().write_deferred);

        let created = post("A", "T", PLACEHOLDER_MARKDOWN);
        let (state, effects) = apply(state, vec![EditEvent::Created(created.clone())]);
        let buffer = state.buffer().unwrap();
        assert_eq!(buffer.markdown, "typed early");
        assert_eq!(buffer.created_at, Some(created.created_at));
        assert!(matches!(
            effects.as_slice(),
            [EditEffect::Update(input)] if input.markdown == "typed early"
        ));
    }

    #[test]
    fn test_create_conflict_adopts_existing_record() {
        let (state, _) = EditState::initialize(
            EditSeed::New {
                id: "p1".into(),
                title: "Mine".into(),
            },
            &local(),
        );
        let existing = post("B", "Theirs", "Server body");
        let (state, effects) = apply(state, vec![EditEvent::CreateConflict(Some(existing.clone()))]);
        assert!(effects.is_empty());
        let buffer = state.buffer().unwrap();
        assert_eq!(buffer.title, "Theirs");
        assert_eq!(buffer.markdown, "Server body");
        assert_eq!(buffer.created_at, Some(existing.created_at));
        assert_eq!(state.live().unwrap().last_error, None);
    }

    #[test]
    fn test_create_conflict_without_record_refetches() {
        let (state, _) = EditState::initialize(
            EditSeed::New {
                id: "p1".into(),
                title: "Mine".into(),
            },
            &local(),
        );
        let (_, effects) = apply(state, vec![EditEvent::CreateConflict(None)]);
        assert_eq!(effects, vec![EditEffect::Fetch("p1".into())]);
    }

    #[test]
    fn test_route_seed_fetches_then_creates_when_missing() {
        let (state, effects) = EditState::initialize(
            EditSeed::Route {
                id: "p1".into(),
                title: Some("From route".into()),
            },
            &local(),
        );
        assert_eq!(effects, vec![EditEffect::Fetch("p1".into())]);
        assert_eq!(state.live().unwrap().phase, EditPhase::Loading);
        assert_eq!(state.buffer().unwrap().title, "From route");

        let (state, effects) = apply(state, vec![EditEvent::Fetched(None)]);
        assert_eq!(state.live().unwrap().phase, EditPhase::Ready);
        assert!(matches!(
            effects.as_slice(),
            [EditEffect::Create(input)] if input.title == "From route" && input.client_id == "A"
        ));
    }

    #[test]
    fn test_route_seed_adopts_fetched_post() {
        let (state, _) = EditState::initialize(
            EditSeed::Route {
                id: "p1".into(),
                title: Some("stale title".into()),
            },
            &local(),
        );
        let (state, effects) = apply(state, vec![EditEvent::Fetched(Some(post("B", "Real", "Body")))]);
        assert!(effects.is_empty());
        assert_eq!(state.buffer().unwrap().title, "Real");
    }

    #[test]
    fn test_route_without_title_for_missing_post_is_not_found() {
        let (state, _) = EditState::initialize(
            EditSeed::Route {
                id: "p1".into(),
                title: None,
            },
            &local(),
        );
        let (state, effects) = apply(
            state,
            vec![
                EditEvent::Fetched(None),
                EditEvent::MarkdownChanged("x".into()),
                EditEvent::DebounceSettled,
            ],
        );
        assert!(effects.is_empty());
        assert_eq!(state.live().unwrap().phase, EditPhase::NotFound);
    }

    #[test]
    fn test_failed_write_keeps_local_edit() {
        let (state, _) = apply(
            live_on(post("A", "T", "M")),
            vec![
                EditEvent::MarkdownChanged("unsaved".into()),
                EditEvent::DebounceSettled,
                EditEvent::WriteFailed(SyncError::Network(GraphqlError::Timeout)),
            ],
        );
        let live = state.live().unwrap();
        assert_eq!(live.buffer.markdown, "unsaved");
        assert_eq!(live.last_error, Some(SyncError::Network(GraphqlError::Timeout)));

        // The failed content is not considered written, so it goes out again.
        let (state, effects) = apply(state, vec![EditEvent::DebounceSettled]);
        assert!(matches!(
            effects.as_slice(),
            [EditEffect::Update(input)] if input.markdown == "unsaved"
        ));

        let (state, _) = apply(state, vec![EditEvent::Written(post("A", "T", "unsaved"))]);
        assert_eq!(state.live().unwrap().last_error, None);
    }

    #[test]
    fn test_failed_fetch_is_reported() {
        let (state, _) = EditState::initialize(
            EditSeed::Route {
                id: "p1".into(),
                title: None,
            },
            &local(),
        );
        let (state, effects) = apply(
            state,
            vec![EditEvent::FetchFailed(SyncError::Network(GraphqlError::Status(502)))],
        );
        assert!(effects.is_empty());
        let view = state.view().unwrap();
        assert_eq!(view.phase, EditPhase::Loading);
        assert_eq!(view.last_error, Some(SyncError::Network(GraphqlError::Status(502))));
    }

    #[test]
    fn test_second_settle_on_same_content_is_not_written() {
        let (_, effects) = apply(
            live_on(post("A", "T", "M")),
            vec![
                EditEvent::TitleChanged("New".into()),
                EditEvent::MarkdownChanged("Body".into()),
                EditEvent::DebounceSettled,
                EditEvent::DebounceSettled,
            ],
        );
        assert_eq!(effects.len(), 1);
        assert!(matches!(
            effects.as_slice(),
            [EditEffect::Update(input)] if input.title == "New" && input.markdown == "Body"
        ));
    }

    #[test]
    fn test_edit_back_to_written_content_is_not_written() {
        let (_, effects) = apply(
            live_on(post("B", "T", "M")),
            vec![EditEvent::MarkdownChanged("M".into()), EditEvent::DebounceSettled],
        );
        assert!(effects.is_empty());
    }

    #[test]
    fn test_toggle_editing() {
        let (state, _) = apply(live_on(post("A", "T", "M")), vec![EditEvent::ToggleEditing]);
        assert!(state.view().unwrap().is_editing);
        let (state, _) = apply(state, vec![EditEvent::ToggleEditing]);
        assert!(!state.view().unwrap().is_editing);
    }

    #[test]
    fn test_events_after_close_are_no_ops() {
        let (state, effects) = apply(
            live_on(post("A", "T", "M")),
            vec![
                EditEvent::Close,
                EditEvent::MarkdownChanged("late".into()),
                EditEvent::DebounceSettled,
                EditEvent::Fetched(Some(post("B", "X", "Y"))),
            ],
        );
        assert!(state.is_torn_down());
        assert!(state.view().is_none());
        assert!(effects.is_empty());
    }
}
