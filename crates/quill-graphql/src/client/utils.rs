//! Utility functions for the GraphQL client.

use std::time::Duration;

pub fn is_retryable_status(status: u16) -> bool {
    matches!(status, 408 | 425 | 429 | 502 | 503 | 504)
}

pub fn is_access_denied_status(status: u16) -> bool {
    matches!(status, 401 | 403)
}

pub async fn sleep(duration: Duration) {
    tokio::time::sleep(duration).await;
}
