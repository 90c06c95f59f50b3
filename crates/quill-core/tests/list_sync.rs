use quill_core::memory::MemoryBackend;
use quill_core::{
    ClientSession, Config, CreatePostInput, PostApi, PostEditor, PostList, PostSummary, Route,
};
use std::sync::Arc;
use std::time::Duration;

async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

async fn create(backend: &MemoryBackend, id: &str) {
    backend
        .create_post(CreatePostInput {
            id: id.into(),
            client_id: "client-b".into(),
            title: format!("Post {}", id),
            markdown: String::new(),
        })
        .await
        .unwrap();
}

fn ids(posts: &[PostSummary]) -> Vec<&str> {
    posts.iter().map(|p| p.id.as_str()).collect()
}

#[tokio::test(start_paused = true)]
async fn test_list_fetches_then_prepends_creations() {
    let backend = Arc::new(MemoryBackend::new());
    create(&backend, "p1").await;
    create(&backend, "p2").await;

    let list = PostList::open(backend.clone(), &Config::default());
    assert!(list.state().loading);
    settle().await;

    let state = list.state();
    assert!(!state.loading);
    assert!(!state.error);
    assert_eq!(ids(&state.posts), vec!["p1", "p2"]);

    create(&backend, "p3").await;
    settle().await;
    assert_eq!(ids(&list.state().posts), vec!["p3", "p1", "p2"]);
}

#[tokio::test(start_paused = true)]
async fn test_list_fetch_failure_shows_error() {
    let backend = Arc::new(MemoryBackend::new());
    backend.fail_reads(1);

    let list = PostList::open(backend.clone(), &Config::default());
    settle().await;

    let state = list.state();
    assert!(!state.loading);
    assert!(state.error);
    assert!(state.posts.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_list_respects_limit() {
    let backend = Arc::new(MemoryBackend::new());
    for id in ["p1", "p2", "p3"] {
        create(&backend, id).await;
    }
    let config = Config {
        list_limit: 2,
        ..Config::default()
    };

    let list = PostList::open(backend.clone(), &config);
    settle().await;
    assert_eq!(ids(&list.state().posts), vec!["p1", "p2"]);
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_announcement_listed_once() {
    let backend = Arc::new(MemoryBackend::new());
    let list = PostList::open(backend.clone(), &Config::default());
    settle().await;

    create(&backend, "p1").await;
    let summary = backend.post("p1").unwrap().summary();
    backend.announce_creation(summary);
    settle().await;

    assert_eq!(ids(&list.state().posts), vec!["p1"]);
}

#[tokio::test(start_paused = true)]
async fn test_create_request_routes_to_editor_that_creates() {
    let backend = Arc::new(MemoryBackend::new());
    let config = Config::default();
    let list = PostList::open(backend.clone(), &config);
    settle().await;

    assert_eq!(list.create_post(""), None);
    let route = list.create_post("Fresh idea").unwrap();
    let Route::Editor { id, title } = &route else {
        panic!("expected an editor route, got {:?}", route);
    };
    assert_eq!(title.as_deref(), Some("Fresh idea"));
    assert!(list.state().posts.is_empty());

    let _editor = PostEditor::open(
        backend.clone(),
        &ClientSession::with_client_id("client-a"),
        route.editor_seed().unwrap(),
        &config,
    );
    settle().await;

    let posts = list.state().posts;
    assert_eq!(ids(&posts), vec![id.as_str()]);
    assert_eq!(posts[0].title, "Fresh idea");
    assert_eq!(posts[0].client_id, "client-a");
}

#[tokio::test(start_paused = true)]
async fn test_closed_list_stops_updating() {
    let backend = Arc::new(MemoryBackend::new());
    let list = PostList::open(backend.clone(), &Config::default());
    settle().await;
    let views = list.subscribe();
    assert!(!list.is_closed());
    list.close();

    create(&backend, "p1").await;
    settle().await;
    assert!(views.borrow().posts.is_empty());
    // The driver is gone and took the sending side with it.
    assert!(views.has_changed().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_list_follows_creations_after_disconnect() {
    let backend = Arc::new(MemoryBackend::new());
    let config = Config::default();
    let list = PostList::open(backend.clone(), &config);
    settle().await;

    backend.disconnect_subscribers();
    tokio::time::sleep(config.resubscribe_delay() + Duration::from_millis(100)).await;
    assert!(!list.is_closed());

    create(&backend, "p1").await;
    settle().await;
    assert_eq!(ids(&list.state().posts), vec!["p1"]);
}
