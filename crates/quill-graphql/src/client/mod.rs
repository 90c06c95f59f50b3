//! GraphQL HTTP client implementation.

mod config;
mod fetch;
pub mod native_network;
pub mod retry;
mod subscription;
mod utils;

pub use config::ClientConfig;
pub use fetch::GraphqlClient;
pub use retry::{parse_retry_after, RetryConfig, RetryDecision, RetryState};
pub use subscription::Subscription;
pub use utils::*;
