//! Helpers for driving an optional, reconnecting subscription from `select!`.

use quill_graphql::{Result, Subscription};
use tokio::time::Instant;

/// Next item of `subscription`, or pending forever while disconnected.
pub(crate) async fn next_item<T>(subscription: &mut Option<Subscription<T>>) -> Option<Result<T>> {
    match subscription {
        Some(subscription) => subscription.next().await,
        None => std::future::pending().await,
    }
}

/// Sleep until `deadline`, or forever when there is none.
pub(crate) async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_disconnected_subscription_never_yields() {
        let mut none: Option<Subscription<u8>> = None;
        let waited = tokio::time::timeout(Duration::from_secs(60), next_item(&mut none)).await;
        assert!(waited.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_until_deadline() {
        let start = Instant::now();
        wait_until(Some(start + Duration::from_secs(5))).await;
        assert_eq!(start.elapsed(), Duration::from_secs(5));
    }
}
