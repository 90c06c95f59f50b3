//! Post records and mutation inputs as they travel over the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A full post revision, as returned by queries, mutations and update pushes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    /// Client that wrote this revision. Only used to recognize echoes.
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub markdown: String,
    pub created_at: DateTime<Utc>,
}

impl Post {
    pub fn summary(&self) -> PostSummary {
        PostSummary {
            id: self.id.clone(),
            client_id: self.client_id.clone(),
            title: self.title.clone(),
            created_at: self.created_at,
        }
    }
}

/// The subset of a post the list query selects.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSummary {
    pub id: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub title: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostInput {
    pub id: String,
    pub client_id: String,
    pub title: String,
    pub markdown: String,
}

/// Full-record update. `created_at` is echoed back unchanged.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostInput {
    pub id: String,
    pub client_id: String,
    pub title: String,
    pub markdown: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletePostInput {
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_uses_camel_case_wire_names() {
        let json = r##"{
            "id": "p1",
            "clientId": "c1",
            "title": "Hello",
            "markdown": "# Hi",
            "createdAt": "2019-01-02T03:04:05.000Z"
        }"##;
        let post: Post = serde_json::from_str(json).unwrap();
        assert_eq!(post.client_id, "c1");
        assert_eq!(post.created_at.to_rfc3339(), "2019-01-02T03:04:05+00:00");

        let input = UpdatePostInput {
            id: post.id.clone(),
            client_id: "c2".into(),
            title: post.title.clone(),
            markdown: post.markdown.clone(),
            created_at: post.created_at,
        };
        let value = serde_json::to_value(&input).unwrap();
        assert_eq!(value["clientId"], "c2");
        assert!(value.get("createdAt").is_some());
    }

    #[test]
    fn test_summary_tolerates_missing_client_id() {
        let json = r#"{"id": "p1", "title": "T", "createdAt": "2019-01-02T03:04:05Z"}"#;
        let summary: PostSummary = serde_json::from_str(json).unwrap();
        assert_eq!(summary.client_id, "");
        assert_eq!(summary.title, "T");
    }
}
