//! Subscription handles for pushed GraphQL payloads.

use crate::error::{GraphqlError, Result};
use futures::{Stream, StreamExt};
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

/// A live subscription. Dropping it closes the underlying stream.
pub struct Subscription<T> {
    // `Receiver` is `!Unpin`; boxing it keeps `Subscription` usable as an `Unpin` stream.
    receiver: Pin<Box<async_channel::Receiver<Result<T>>>>,
    heartbeat_timeout: Option<Duration>,
}

impl<T> Subscription<T> {
    pub fn new(receiver: async_channel::Receiver<Result<T>>) -> Self {
        Subscription {
            receiver: Box::pin(receiver),
            heartbeat_timeout: None,
        }
    }

    /// Yield [`GraphqlError::Timeout`] when nothing arrives within `timeout`.
    pub fn with_heartbeat(receiver: async_channel::Receiver<Result<T>>, timeout: Duration) -> Self {
        Subscription {
            receiver: Box::pin(receiver),
            heartbeat_timeout: Some(timeout),
        }
    }

    /// Next pushed item. `None` once the server or the transport ends the stream.
    pub async fn next(&mut self) -> Option<Result<T>> {
        match self.heartbeat_timeout {
            Some(timeout) => match tokio::time::timeout(timeout, self.receiver.recv()).await {
                Ok(result) => result.ok(),
                Err(_) => Some(Err(GraphqlError::Timeout)),
            },
            None => self.receiver.recv().await.ok(),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.receiver.is_closed() && self.receiver.is_empty()
    }
}

impl<T> Stream for Subscription<T> {
    type Item = Result<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().receiver.poll_next_unpin(cx)
    }
}
