//! HTTP implementation of the query client

use super::types::{
    rejection_message, Answer, HealthResponse, QueryRequest, QueryResponse, ToolInfo,
    ToolsResponse,
};
use super::{QueryClient, QueryError, ServiceProbe};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Query client speaking JSON over HTTP to the remote agent service
pub struct HttpQueryClient {
    client: Client,
    query_url: String,
    health_url: String,
    tools_url: String,
}

impl HttpQueryClient {
    /// Build a client for the service rooted at `base_url`.
    ///
    /// `timeout` bounds the whole request; hitting it is reported as
    /// `Unreachable`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let base = base_url.trim_end_matches('/');
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            query_url: format!("{base}/query"),
            health_url: format!("{base}/health"),
            tools_url: format!("{base}/tools"),
        })
    }

    fn classify_send_error(e: &reqwest::Error) -> QueryError {
        if e.is_timeout() {
            QueryError::unreachable(format!("Request timed out: {e}"))
        } else if e.is_connect() {
            QueryError::unreachable(format!(
                "Unable to connect to the server. Please make sure the backend is running ({e})"
            ))
        } else {
            QueryError::unreachable(format!("Request failed: {e}"))
        }
    }

    /// Turn a response into a typed body or a classified error
    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, QueryError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| QueryError::unreachable(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            let code = status.as_u16();
            return Err(QueryError::rejected(code, rejection_message(code, &body)));
        }

        serde_json::from_str(&body)
            .map_err(|e| QueryError::malformed(format!("Unexpected response from server: {e}")))
    }
}

#[async_trait]
impl QueryClient for HttpQueryClient {
    async fn ask(&self, question: &str) -> Result<Answer, QueryError> {
        let response = self
            .client
            .post(&self.query_url)
            .json(&QueryRequest { question })
            .send()
            .await
            .map_err(|e| Self::classify_send_error(&e))?;

        let body: QueryResponse = Self::read_json(response).await?;
        Ok(Answer::from(body))
    }

    fn endpoint(&self) -> &str {
        &self.query_url
    }
}

#[async_trait]
impl ServiceProbe for HttpQueryClient {
    async fn is_healthy(&self) -> bool {
        let response = match self.client.get(&self.health_url).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!(error = %e, "Health probe failed");
                return false;
            }
        };

        match Self::read_json::<HealthResponse>(response).await {
            Ok(health) => {
                tracing::debug!(status = %health.status, version = ?health.version, "Health probe");
                health.status == "healthy"
            }
            Err(e) => {
                tracing::debug!(error = %e, "Health probe rejected");
                false
            }
        }
    }

    async fn list_tools(&self) -> Result<Vec<ToolInfo>, QueryError> {
        let response = self
            .client
            .get(&self.tools_url)
            .send()
            .await
            .map_err(|e| Self::classify_send_error(&e))?;

        let body: ToolsResponse = Self::read_json(response).await?;
        Ok(body.tools)
    }
}
