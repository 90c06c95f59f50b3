//! Main GraphQL client implementation.

use crate::client::config::ClientConfig;
use crate::client::native_network::NativeNetwork;
use crate::client::retry::{RetryConfig, RetryDecision, RetryState};
use crate::client::Subscription;
use crate::error::{GraphqlError, Result};
use crate::protocol::documents::{self, fields, operations};
use crate::traits::PostApi;
use crate::types::{
    CreatePostInput, DeletePostInput, GraphqlRequest, GraphqlResponse, Post, PostSummary,
    UpdatePostInput,
};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

/// The main GraphQL client
#[derive(Clone)]
pub struct GraphqlClient {
    network: Arc<NativeNetwork>,
    config: Arc<ClientConfig>,
}

#[derive(Deserialize)]
struct Connection<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

impl GraphqlClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        url::Url::parse(&config.endpoint)
            .map_err(|e| GraphqlError::Config(format!("invalid endpoint {:?}: {}", config.endpoint, e)))?;
        url::Url::parse(config.subscription_url()).map_err(|e| {
            GraphqlError::Config(format!(
                "invalid subscription endpoint {:?}: {}",
                config.subscription_url(),
                e
            ))
        })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| GraphqlError::Config(e.to_string()))?;

        Ok(GraphqlClient {
            network: Arc::new(NativeNetwork::new(client, &config)),
            config: Arc::new(config),
        })
    }

    /// Runs a query, retrying transient failures. `id` names the post the
    /// operation targets so errors can be reported against it.
    pub async fn execute(&self, request: GraphqlRequest, id: Option<&str>) -> Result<GraphqlResponse> {
        self.execute_with(request, id, RetryConfig::from_client(&self.config))
            .await
    }

    /// Runs a mutation exactly once. A delayed retry could land after a newer
    /// write and roll the post back, so failures go straight to the caller.
    pub async fn execute_once(&self, request: GraphqlRequest, id: Option<&str>) -> Result<GraphqlResponse> {
        self.execute_with(request, id, RetryConfig::none()).await
    }

    async fn execute_with(
        &self,
        request: GraphqlRequest,
        id: Option<&str>,
        retry: RetryConfig,
    ) -> Result<GraphqlResponse> {
        let mut retry_state = RetryState::new(retry);

        loop {
            match self.network.post(&self.config.endpoint, &request).await {
                Ok(reply) if reply.is_success() => {
                    let response = GraphqlResponse::from_slice(&reply.body)?;
                    response.check(id)?;
                    return Ok(response);
                }
                Ok(reply) => match retry_state.should_retry_status(reply.status, reply.retry_after) {
                    RetryDecision::Retry(delay) => {
                        if self.config.enable_logging {
                            tracing::warn!(
                                "[GraphQL] {} status {} (attempt {}), retrying in {:?}",
                                request.operation_name,
                                reply.status,
                                retry_state.attempts,
                                delay
                            );
                        }
                        crate::client::utils::sleep(delay).await;
                    }
                    RetryDecision::DontRetry => {
                        if crate::client::is_access_denied_status(reply.status) {
                            tracing::error!(
                                "[GraphQL] {} rejected with {}; check the API key",
                                request.operation_name,
                                reply.status
                            );
                        }
                        // Error bodies often still carry a GraphQL `errors` array.
                        if let Ok(response) = GraphqlResponse::from_slice(&reply.body) {
                            response.check(id)?;
                        }
                        return Err(GraphqlError::Status(reply.status));
                    }
                },
                Err(e) => match retry_state.should_retry_error(!e.is_retryable()) {
                    RetryDecision::Retry(delay) => {
                        if self.config.enable_logging {
                            tracing::warn!(
                                "[GraphQL] {} failed (attempt {}), retrying in {:?}: {}",
                                request.operation_name,
                                retry_state.attempts,
                                delay,
                                e
                            );
                        }
                        crate::client::utils::sleep(delay).await;
                    }
                    RetryDecision::DontRetry => return Err(e),
                },
            }
        }
    }

    pub async fn subscribe<T>(&self, request: GraphqlRequest, field: &'static str) -> Result<Subscription<T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let rx = self
            .network
            .subscribe(self.config.subscription_url(), request, field)
            .await?;
        Ok(match self.config.heartbeat_timeout_secs {
            0 => Subscription::new(rx),
            secs => Subscription::with_heartbeat(rx, Duration::from_secs(secs)),
        })
    }
}

#[async_trait]
impl PostApi for GraphqlClient {
    async fn create_post(&self, input: CreatePostInput) -> Result<Post> {
        let request = GraphqlRequest::new(operations::CREATE_POST, documents::CREATE_POST).with_input(&input)?;
        self.execute_once(request, Some(&input.id))
            .await?
            .required(fields::CREATE_POST)
    }

    async fn update_post(&self, input: UpdatePostInput) -> Result<Post> {
        let request = GraphqlRequest::new(operations::UPDATE_POST, documents::UPDATE_POST).with_input(&input)?;
        self.execute_once(request, Some(&input.id))
            .await?
            .field(fields::UPDATE_POST)?
            .ok_or_else(|| GraphqlError::NotFound(input.id.clone()))
    }

    async fn delete_post(&self, id: &str) -> Result<Post> {
        let input = DeletePostInput { id: id.to_string() };
        let request = GraphqlRequest::new(operations::DELETE_POST, documents::DELETE_POST).with_input(&input)?;
        self.execute_once(request, Some(id))
            .await?
            .field(fields::DELETE_POST)?
            .ok_or_else(|| GraphqlError::NotFound(id.to_string()))
    }

    async fn get_post(&self, id: &str) -> Result<Option<Post>> {
        let request = GraphqlRequest::new(operations::GET_POST, documents::GET_POST)
            .with_variables(serde_json::json!({ "id": id }));
        self.execute(request, Some(id)).await?.field(fields::GET_POST)
    }

    async fn list_posts(&self, limit: u32) -> Result<Vec<PostSummary>> {
        let request = GraphqlRequest::new(operations::LIST_POSTS, documents::LIST_POSTS)
            .with_variables(serde_json::json!({ "limit": limit }));
        let connection: Option<Connection<PostSummary>> =
            self.execute(request, None).await?.field(fields::LIST_POSTS)?;
        Ok(connection.map(|c| c.items).unwrap_or_default())
    }

    async fn subscribe_to_post_updates(&self, id: &str) -> Result<Subscription<Post>> {
        let request = GraphqlRequest::new(operations::ON_UPDATE_POST, documents::ON_UPDATE_POST)
            .with_variables(serde_json::json!({ "id": id }));
        self.subscribe(request, fields::ON_UPDATE_POST).await
    }

    async fn subscribe_to_post_creations(&self) -> Result<Subscription<PostSummary>> {
        let request = GraphqlRequest::new(operations::ON_CREATE_POST, documents::ON_CREATE_POST);
        self.subscribe(request, fields::ON_CREATE_POST).await
    }
}
