//! Query transport
//!
//! [`ChatTransport`] is the seam between the retry loop and the network. The
//! HTTP implementation talks to an agent server that answers a streaming chat
//! request with newline-delimited JSON chunks.

use crate::graph::{parse_connectivity, ConnectivityEntry};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Everything needed to issue one query attempt
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryRequest {
    pub query: String,
    /// Requesting user, sent as the `user_id` header
    pub identity: String,
    /// Agent network the query is addressed to
    pub target: String,
    pub chat_context: Option<Value>,
    pub sly_data: Map<String, Value>,
}

impl QueryRequest {
    pub fn new(query: impl Into<String>, identity: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            identity: identity.into(),
            target: target.into(),
            ..Default::default()
        }
    }
}

/// Transport errors
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Request cancelled")]
    Cancelled,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to fetch: {reason} error code {status}")]
    Status { status: u16, reason: String },

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Parsing error: {0}")]
    Parse(String),
}

impl TransportError {
    /// Whether this error stems from the caller's cancellation signal
    pub fn is_cancellation(&self) -> bool {
        matches!(self, TransportError::Cancelled)
    }
}

/// Issues one streamed request.
///
/// `on_chunk` is invoked once per chunk, in arrival order. Implementations
/// must return [`TransportError::Cancelled`] when `cancel` fires.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send(
        &self,
        cancel: &CancellationToken,
        request: &QueryRequest,
        on_chunk: &mut (dyn for<'c> FnMut(&'c str) + Send),
    ) -> Result<(), TransportError>;
}

/// HTTP transport configuration
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    pub endpoint: String,
    pub timeout: Duration,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8080".to_string(),
            timeout: Duration::from_secs(300),
        }
    }
}

/// Sly data key carrying the requesting user, read by coded tools
pub const LOGIN_KEY: &str = "login";

#[derive(Debug, Serialize)]
struct UserMessage<'a> {
    #[serde(rename = "type")]
    message_type: &'static str,
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatFilter {
    chat_filter_type: &'static str,
}

#[derive(Debug, Serialize)]
struct StreamingChatRequest<'a> {
    user_message: UserMessage<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    chat_context: Option<&'a Value>,
    /// Caller's sly data with the requesting user merged in as `login`
    sly_data: Map<String, Value>,
    chat_filter: ChatFilter,
}

impl<'a> From<&'a QueryRequest> for StreamingChatRequest<'a> {
    fn from(request: &'a QueryRequest) -> Self {
        let mut sly_data = request.sly_data.clone();
        sly_data.insert(LOGIN_KEY.to_string(), Value::String(request.identity.clone()));

        Self {
            user_message: UserMessage {
                message_type: "HUMAN",
                text: &request.query,
            },
            chat_context: request.chat_context.as_ref(),
            sly_data,
            chat_filter: ChatFilter {
                chat_filter_type: "MAXIMAL",
            },
        }
    }
}

/// Agent server client over HTTP
#[derive(Debug, Clone)]
pub struct HttpChatTransport {
    client: Client,
    config: HttpTransportConfig,
}

impl HttpChatTransport {
    pub fn new(config: HttpTransportConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| TransportError::Network(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &HttpTransportConfig {
        &self.config
    }

    fn url(&self, target: &str, path: &str) -> String {
        format!(
            "{}/api/v1/{}/{}",
            self.config.endpoint.trim_end_matches('/'),
            target,
            path
        )
    }

    /// Names of the agent networks the server hosts
    pub async fn list_networks(
        &self,
        cancel: &CancellationToken,
        identity: &str,
    ) -> Result<Vec<String>, TransportError> {
        let url = format!("{}/api/v1/list", self.config.endpoint.trim_end_matches('/'));
        debug!("Listing agent networks from {}", url);

        let body = self.get_text(cancel, &url, identity).await?;
        let listing: NetworkListing =
            serde_json::from_str(&body).map_err(|e| TransportError::Parse(e.to_string()))?;
        Ok(listing.agents.into_iter().map(|agent| agent.agent_name).collect())
    }

    /// Fetch the connectivity list of an agent network
    pub async fn fetch_connectivity(
        &self,
        cancel: &CancellationToken,
        identity: &str,
        target: &str,
    ) -> Result<Vec<ConnectivityEntry>, TransportError> {
        let url = self.url(target, "connectivity");
        debug!("Fetching connectivity from {}", url);

        let body = self.get_text(cancel, &url, identity).await?;
        parse_connectivity(&body).map_err(|e| TransportError::Parse(e.to_string()))
    }

    async fn get_text(&self, cancel: &CancellationToken, url: &str, identity: &str) -> Result<String, TransportError> {
        let pending = self.client.get(url).header("user_id", identity).send();
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TransportError::Cancelled),
            result = pending => result.map_err(|e| TransportError::Network(e.to_string()))?,
        };
        check_status(&response)?;

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(TransportError::Cancelled),
            body = response.text() => body.map_err(|e| TransportError::Stream(e.to_string())),
        }
    }
}

#[derive(Debug, Deserialize)]
struct NetworkListing {
    #[serde(default)]
    agents: Vec<NetworkInfo>,
}

#[derive(Debug, Deserialize)]
struct NetworkInfo {
    agent_name: String,
}

fn check_status(response: &reqwest::Response) -> Result<(), TransportError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    Err(TransportError::Status {
        status: status.as_u16(),
        reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
    })
}

/// Split complete lines off the front of `buffer`, passing each non-empty one on.
///
/// `scanned` is how much of `buffer` is already known to hold no newline.
fn drain_lines(
    buffer: &mut Vec<u8>,
    scanned: &mut usize,
    on_chunk: &mut (dyn for<'c> FnMut(&'c str) + Send),
) {
    let mut start = 0;
    let mut from = (*scanned).min(buffer.len());
    while let Some(offset) = buffer[from..].iter().position(|b| *b == b'\n') {
        let end = from + offset;
        let line = String::from_utf8_lossy(&buffer[start..end]);
        let line = line.trim();
        if !line.is_empty() {
            on_chunk(line);
        }
        start = end + 1;
        from = start;
    }
    buffer.drain(..start);
    *scanned = buffer.len();
}

#[async_trait]
impl ChatTransport for HttpChatTransport {
    async fn send(
        &self,
        cancel: &CancellationToken,
        request: &QueryRequest,
        on_chunk: &mut (dyn for<'c> FnMut(&'c str) + Send),
    ) -> Result<(), TransportError> {
        let url = self.url(&request.target, "streaming_chat");
        let body = StreamingChatRequest::from(request);
        debug!("Sending streaming chat request to {}", url);

        let pending = self
            .client
            .post(&url)
            .header("user_id", request.identity.as_str())
            .json(&body)
            .send();

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TransportError::Cancelled),
            result = pending => result.map_err(|e| TransportError::Network(e.to_string()))?,
        };
        check_status(&response)?;

        let mut stream = Box::pin(response.bytes_stream());
        let mut buffer: Vec<u8> = Vec::new();
        let mut scanned = 0;

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(TransportError::Cancelled),
                next = stream.next() => next,
            };

            match next {
                Some(Ok(bytes)) => {
                    buffer.extend_from_slice(&bytes);
                    drain_lines(&mut buffer, &mut scanned, on_chunk);
                }
                Some(Err(e)) => return Err(TransportError::Stream(e.to_string())),
                None => break,
            }
        }

        // Trailing chunk without a newline
        let rest = String::from_utf8_lossy(&buffer);
        let rest = rest.trim();
        if !rest.is_empty() {
            on_chunk(rest);
        }

        Ok(())
    }
}
