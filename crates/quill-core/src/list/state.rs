//! List view state and its reducer.

use quill_graphql::PostSummary;
use std::collections::HashSet;

/// What the list view renders.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListState {
    /// Newest announcements first, then the fetched page in backend order.
    pub posts: Vec<PostSummary>,
    /// True until the initial fetch resolves either way.
    pub loading: bool,
    /// The initial fetch failed.
    pub error: bool,
    closed: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ListEvent {
    Fetched(Vec<PostSummary>),
    FetchFailed,
    Created(PostSummary),
    Close,
}

impl ListState {
    pub fn loading() -> Self {
        Self {
            loading: true,
            ..Self::default()
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn contains(&self, id: &str) -> bool {
        self.posts.iter().any(|post| post.id == id)
    }

    /// Returns whether anything changed.
    pub fn apply(&mut self, event: ListEvent) -> bool {
        if self.closed {
            return false;
        }

        match event {
            ListEvent::Fetched(fetched) => {
                // Anything already here arrived by subscription while the
                // fetch was in flight; it stays in front.
                let mut seen: HashSet<String> = self.posts.iter().map(|p| p.id.clone()).collect();
                for post in fetched {
                    if seen.insert(post.id.clone()) {
                        self.posts.push(post);
                    }
                }
                self.loading = false;
                self.error = false;
            }
            ListEvent::FetchFailed => {
                self.loading = false;
                self.error = true;
            }
            ListEvent::Created(summary) => {
                if self.contains(&summary.id) {
                    return false;
                }
                self.posts.insert(0, summary);
            }
            ListEvent::Close => {
                self.closed = true;
            }
        }
        true
    }
}
