//! Paths the view layer navigates between.
//!
//! `/` is the post list; `/post/:id/:title?` is the editor for one post. The
//! optional title seeds a post that does not exist on the backend yet.

use crate::edit::EditSeed;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use std::fmt;

const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Route {
    List,
    Editor { id: String, title: Option<String> },
}

impl Route {
    /// Parses a path, tolerating a leading `#` from hash routing.
    pub fn parse(path: &str) -> Option<Self> {
        let path = path.trim().trim_start_matches('#');
        let path = path.trim_end_matches('/');
        if path.is_empty() {
            return Some(Route::List);
        }

        let mut segments = path.strip_prefix('/')?.split('/');
        if segments.next()? != "post" {
            return None;
        }
        let id = decode(segments.next()?);
        if id.is_empty() {
            return None;
        }
        let title = segments.next().map(decode).filter(|t| !t.is_empty());
        if segments.next().is_some() {
            return None;
        }
        Some(Route::Editor { id, title })
    }

    /// Editor route for a brand-new post with a freshly minted id.
    pub fn new_post(title: impl Into<String>) -> Self {
        Route::Editor {
            id: uuid::Uuid::new_v4().to_string(),
            title: Some(title.into()),
        }
    }

    pub fn to_path(&self) -> String {
        match self {
            Route::List => "/".to_string(),
            Route::Editor { id, title: None } => format!("/post/{}", encode(id)),
            Route::Editor {
                id,
                title: Some(title),
            } => format!("/post/{}/{}", encode(id), encode(title)),
        }
    }

    /// Seed for an editor opened on this route. `None` for the list.
    pub fn editor_seed(&self) -> Option<EditSeed> {
        match self {
            Route::List => None,
            Route::Editor { id, title } => Some(EditSeed::Route {
                id: id.clone(),
                title: title.clone(),
            }),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_path())
    }
}

fn encode(segment: &str) -> String {
    utf8_percent_encode(segment, SEGMENT).to_string()
}

fn decode(segment: &str) -> String {
    percent_decode_str(segment).decode_utf8_lossy().into_owned()
}
