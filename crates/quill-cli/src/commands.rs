use anyhow::Context;
use quill_core::{
    ClientSession, Config, EditPhase, EditView, PostApi, PostEditor, PostList, Route,
};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

pub async fn list(api: Arc<dyn PostApi>, config: &Config) -> anyhow::Result<()> {
    let list = PostList::open(api, config);
    let mut states = list.subscribe();
    let mut shown = 0usize;
    let mut loaded = false;

    loop {
        {
            let state = states.borrow_and_update();
            if !loaded && !state.loading {
                loaded = true;
                if state.error {
                    eprintln!("could not load posts");
                }
                for post in &state.posts {
                    println!("{}  {}", post.id, post.title);
                }
                shown = state.posts.len();
            } else if loaded && state.posts.len() > shown {
                // Announcements only ever go in front.
                for post in state.posts[..state.posts.len() - shown].iter().rev() {
                    println!("+ {}  {}", post.id, post.title);
                }
                shown = state.posts.len();
            }
        }

        tokio::select! {
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    list.close();
    Ok(())
}

pub fn new(title: &str) -> anyhow::Result<()> {
    if title.is_empty() {
        anyhow::bail!("a new post needs a title");
    }
    println!("{}", Route::new_post(title));
    Ok(())
}

pub async fn open(api: Arc<dyn PostApi>, config: &Config, path: &str) -> anyhow::Result<()> {
    let route = Route::parse(path).with_context(|| format!("not a route: {}", path))?;
    let seed = route
        .editor_seed()
        .with_context(|| format!("{} is the list, not a post", route))?;

    let session = ClientSession::new();
    let editor = PostEditor::open(api, &session, seed, config);
    let mut views = editor.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut last_shown: Option<EditView> = None;

    loop {
        {
            let view = views.borrow_and_update().clone();
            if should_show(&view, last_shown.as_ref(), &session) {
                show(&view);
            }
            last_shown = Some(view);
        }

        tokio::select! {
            changed = views.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line == ":quit" {
                    break;
                } else if line == ":toggle" {
                    editor.toggle_editing();
                } else if let Some(title) = line.strip_prefix(":title ") {
                    editor.set_title(title)?;
                } else {
                    let mut markdown = editor.view().post.markdown;
                    if !markdown.is_empty() {
                        markdown.push('\n');
                    }
                    markdown.push_str(&line);
                    editor.set_markdown(markdown)?;
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    editor.close();
    Ok(())
}

pub async fn delete(api: Arc<dyn PostApi>, id: &str) -> anyhow::Result<()> {
    let post = api
        .delete_post(id)
        .await
        .with_context(|| format!("deleting {}", id))?;
    println!("deleted {}  {}", post.id, post.title);
    Ok(())
}

/// Print on phase changes, remote content, toggles and errors; local typing
/// is already on screen.
fn should_show(view: &EditView, last: Option<&EditView>, session: &ClientSession) -> bool {
    let Some(last) = last else { return true };
    let remote = view.post.client_id != *session.current_client_id();
    view.phase != last.phase
        || view.is_editing != last.is_editing
        || (view.last_error.is_some() && view.last_error != last.last_error)
        || (remote && (view.post.title != last.post.title || view.post.markdown != last.post.markdown))
}

fn show(view: &EditView) {
    match view.phase {
        EditPhase::Loading => println!("loading {}...", view.post.id),
        EditPhase::NotFound => println!("post {} not found", view.post.id),
        EditPhase::Ready => {
            println!("# {}  ({})", view.post.title, if view.is_editing { "editing" } else { "viewing" });
            println!("{}", view.post.markdown);
            println!("---");
        }
    }
    if let Some(error) = &view.last_error {
        eprintln!("sync failed: {}", error);
    }
}
