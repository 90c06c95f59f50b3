//! Client identity and origin tagging.
//!
//! Each running instance picks one random id at startup. Every write carries
//! it, and every pushed revision is compared against it: a match means the
//! push is the backend echoing our own write back.

use quill_graphql::Post;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque id of one running client. UUID v4 text, so 122 random bits.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(String);

impl ClientId {
    pub fn generate() -> Self {
        ClientId(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether `post` is a revision this client wrote.
    #[inline]
    pub fn is_origin_of(&self, post: &Post) -> bool {
        post.client_id == self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ClientId {
    fn from(value: String) -> Self {
        ClientId(value)
    }
}

impl From<&str> for ClientId {
    fn from(value: &str) -> Self {
        ClientId(value.to_string())
    }
}

/// One per running application. Created once and handed to every
/// synchronizer; nothing reads the id from global state.
#[derive(Clone, Debug)]
pub struct ClientSession {
    client_id: ClientId,
}

impl ClientSession {
    pub fn new() -> Self {
        let session = Self {
            client_id: ClientId::generate(),
        };
        tracing::info!("[Session] Client id {}", session.client_id);
        session
    }

    pub fn with_client_id(client_id: impl Into<ClientId>) -> Self {
        Self {
            client_id: client_id.into(),
        }
    }

    #[inline]
    pub fn current_client_id(&self) -> &ClientId {
        &self.client_id
    }
}

impl Default for ClientSession {
    fn default() -> Self {
        Self::new()
    }
}
