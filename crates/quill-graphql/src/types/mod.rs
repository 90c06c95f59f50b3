pub mod post;
pub mod request;
pub mod response;

pub use post::{CreatePostInput, DeletePostInput, Post, PostSummary, UpdatePostInput};
pub use request::GraphqlRequest;
pub use response::{GraphqlResponse, ResponseError};
