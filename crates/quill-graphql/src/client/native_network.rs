//! reqwest-backed transport: plain POSTs and streamed SSE bodies.

use crate::client::ClientConfig;
use crate::error::{GraphqlError, Result};
use crate::protocol::SseParser;
use crate::types::{GraphqlRequest, GraphqlResponse};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::header::{ACCEPT, CONTENT_TYPE, RETRY_AFTER};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Raw outcome of one HTTP exchange, before GraphQL interpretation.
#[derive(Clone, Debug)]
pub struct HttpReply {
    pub status: u16,
    pub retry_after: Option<Duration>,
    pub body: Bytes,
}

impl HttpReply {
    #[inline]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub struct NativeNetwork {
    client: Client,
    api_key: String,
}

impl NativeNetwork {
    pub fn new(client: Client, config: &ClientConfig) -> Self {
        Self {
            client,
            api_key: config.api_key.clone(),
        }
    }

    fn request(&self, url: &str, request: &GraphqlRequest) -> reqwest::RequestBuilder {
        let mut builder = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .json(request);
        if !self.api_key.is_empty() {
            builder = builder.header("x-api-key", &self.api_key);
        }
        builder
    }

    pub async fn post(&self, url: &str, request: &GraphqlRequest) -> Result<HttpReply> {
        tracing::debug!("[GraphQL-Out] {} {}", request.operation_name, url);

        let response = self.request(url, request).send().await?;
        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(crate::client::parse_retry_after);
        let body = response.bytes().await?;

        Ok(HttpReply {
            status,
            retry_after,
            body,
        })
    }

    /// Opens an SSE subscription and forwards every `next` payload's
    /// `data.<field>` through the returned channel.
    pub async fn subscribe<T>(
        &self,
        url: &str,
        request: GraphqlRequest,
        field: &'static str,
    ) -> Result<async_channel::Receiver<Result<T>>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        tracing::info!("[GraphQL-Sub-Out] {} {}", request.operation_name, url);

        // No request timeout: the body stays open for as long as the subscription lives.
        let response = self
            .request(url, &request)
            .header(ACCEPT, "text/event-stream")
            .timeout(Duration::from_secs(60 * 60 * 24))
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("[GraphQL-Sub] Response status: {}", status);
        if !status.is_success() {
            if crate::client::is_access_denied_status(status.as_u16()) {
                tracing::error!("[GraphQL-Sub] {} rejected; check the API key", request.operation_name);
            }
            return Err(GraphqlError::Status(status.as_u16()));
        }

        let (tx, rx) = async_channel::bounded(100);
        let stream = Box::pin(response.bytes_stream());
        let operation = request.operation_name;

        tokio::spawn(forward_events(stream, tx, field, operation));

        Ok(rx)
    }
}

/// Parse SSE chunks into decoded items until the body ends or the receiver
/// goes away. A body that ends without a `complete` event yields
/// [`GraphqlError::SubscriptionClosed`] so the subscriber knows to reconnect.
async fn forward_events<T, S, E>(
    mut stream: S,
    tx: async_channel::Sender<Result<T>>,
    field: &'static str,
    operation: &'static str,
) where
    T: DeserializeOwned,
    S: Stream<Item = std::result::Result<Bytes, E>> + Unpin,
    E: Into<GraphqlError>,
{
    let mut parser = SseParser::new();

    while let Some(chunk_res) = stream.next().await {
        let chunk = match chunk_res {
            Ok(chunk) => chunk,
            Err(e) => {
                let e = e.into();
                tracing::error!("[GraphQL-Sub] {} stream error: {}", operation, e);
                let _ = tx.send(Err(e)).await;
                return;
            }
        };

        for event in parser.feed(&chunk) {
            if event.is_complete() {
                tracing::debug!("[GraphQL-Sub] {} completed by server", operation);
                return;
            }
            if !event.is_next() {
                tracing::trace!("[GraphQL-Sub] Skipping event {:?}", event.event);
                continue;
            }
            let item = decode_payload::<T>(&event.data, field);
            if tx.send(item).await.is_err() {
                // Subscriber dropped its handle.
                tracing::debug!("[GraphQL-Sub] {} receiver gone, closing", operation);
                return;
            }
        }
    }
    tracing::warn!(
        "[GraphQL-Sub] {} stream ended after {} keep-alives",
        operation,
        parser.heartbeats()
    );
    let _ = tx.send(Err(GraphqlError::SubscriptionClosed)).await;
}

fn decode_payload<T: DeserializeOwned>(data: &str, field: &str) -> Result<T> {
    let response = GraphqlResponse::from_slice(data.as_bytes())?;
    response.check(None)?;
    response.required(field)
}
