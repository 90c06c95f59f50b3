//! GraphQL operation documents understood by the post backend.
//!
//! Every post selection carries `clientId`, which is what lets a client tell
//! its own echoes apart from other writers.

/// `errorType` the backend reports when `createPost` hits an existing id.
pub const CONFLICT_ERROR_TYPE: &str = "DynamoDB:ConditionalCheckFailedException";

/// Upper bound for the list query.
pub const DEFAULT_LIST_LIMIT: u32 = 500;

pub mod operations {
    pub const CREATE_POST: &str = "CreatePost";
    pub const UPDATE_POST: &str = "UpdatePost";
    pub const DELETE_POST: &str = "DeletePost";
    pub const GET_POST: &str = "GetPost";
    pub const LIST_POSTS: &str = "ListPosts";
    pub const ON_UPDATE_POST: &str = "OnUpdatePost";
    pub const ON_CREATE_POST: &str = "OnCreatePost";
}

/// Response field holding each operation's payload.
pub mod fields {
    pub const CREATE_POST: &str = "createPost";
    pub const UPDATE_POST: &str = "updatePost";
    pub const DELETE_POST: &str = "deletePost";
    pub const GET_POST: &str = "getPost";
    pub const LIST_POSTS: &str = "listPosts";
    pub const ON_UPDATE_POST: &str = "onUpdatePost";
    pub const ON_CREATE_POST: &str = "onCreatePost";
}

pub const CREATE_POST: &str = "mutation CreatePost($input: CreatePostInput!) {
  createPost(input: $input) {
    id
    clientId
    markdown
    title
    createdAt
  }
}";

pub const UPDATE_POST: &str = "mutation UpdatePost($input: UpdatePostInput!) {
  updatePost(input: $input) {
    id
    clientId
    markdown
    title
    createdAt
  }
}";

pub const DELETE_POST: &str = "mutation DeletePost($input: DeletePostInput!) {
  deletePost(input: $input) {
    id
    clientId
    markdown
    title
    createdAt
  }
}";

pub const GET_POST: &str = "query GetPost($id: ID!) {
  getPost(id: $id) {
    id
    clientId
    markdown
    title
    createdAt
  }
}";

pub const LIST_POSTS: &str = "query ListPosts($limit: Int) {
  listPosts(limit: $limit) {
    items {
      id
      clientId
      title
      createdAt
    }
  }
}";

pub const ON_UPDATE_POST: &str = "subscription OnUpdatePost($id: ID!) {
  onUpdatePost(id: $id) {
    id
    clientId
    markdown
    title
    createdAt
  }
}";

pub const ON_CREATE_POST: &str = "subscription OnCreatePost {
  onCreatePost {
    id
    clientId
    title
    createdAt
  }
}";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_documents_name_their_operations() {
        assert!(CREATE_POST.contains(operations::CREATE_POST));
        assert!(UPDATE_POST.contains(fields::UPDATE_POST));
        assert!(LIST_POSTS.contains(fields::LIST_POSTS));
        assert!(ON_UPDATE_POST.contains(fields::ON_UPDATE_POST));
        assert!(ON_CREATE_POST.starts_with("subscription"));
    }

    #[test]
    fn test_post_selections_carry_client_id() {
        for doc in [CREATE_POST, UPDATE_POST, GET_POST, ON_UPDATE_POST, ON_CREATE_POST] {
            assert!(doc.contains("clientId"));
        }
    }
}
