//! Retry loop around a streamed query.
//!
//! One [`StreamingQueryExecutor::execute`] call drives up to `max_retries`
//! attempts. An attempt succeeds once any chunk has been accepted, unless a
//! later chunk in the same attempt carries an error block. Cancellation ends
//! the loop at once and is never reported as a failure here.

use super::alerts::{Alert, OutputSink};
use super::transport::{ChatTransport, QueryRequest};
use super::{chat_message_from_chunk, ChatMessageType};
use crate::graph::display_name;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

/// Attempts made before giving up
pub const MAX_RETRIES: u32 = 3;

/// Label used when a message carries no hop information
pub const DEFAULT_AGENT_LABEL: &str = "Agent message";

/// Executor lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExecutorState {
    #[default]
    Idle,
    Attempting,
    Retrying,
    Succeeded,
    Aborted,
    Exhausted,
}

impl ExecutorState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ExecutorState::Succeeded | ExecutorState::Aborted | ExecutorState::Exhausted
        )
    }
}

impl fmt::Display for ExecutorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExecutorState::Idle => "idle",
            ExecutorState::Attempting => "attempting",
            ExecutorState::Retrying => "retrying",
            ExecutorState::Succeeded => "succeeded",
            ExecutorState::Aborted => "aborted",
            ExecutorState::Exhausted => "exhausted",
        };
        write!(f, "{}", name)
    }
}

/// Result of one [`StreamingQueryExecutor::execute`] call
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOutcome {
    pub state: ExecutorState,
    pub attempts: u32,
    pub succeeded: bool,
    pub aborted: bool,
    /// Latest chat context received, to be sent with the next query
    pub chat_context: Option<Value>,
    pub sly_data: Map<String, Value>,
}

/// Mutable per-query state the chunk handler works on
struct QueryState<'s> {
    sink: &'s dyn OutputSink,
    succeeded: bool,
    chat_context: Option<Value>,
    sly_data: Map<String, Value>,
}

impl QueryState<'_> {
    fn handle_chunk(
        &mut self,
        chunk: &str,
        interceptor: &mut Option<&mut (dyn FnMut(&str) -> bool + Send)>,
    ) {
        let accepted = match interceptor.as_mut() {
            Some(intercept) => intercept(chunk),
            None => true,
        };
        self.succeeded = self.succeeded || accepted;

        let Some(message) = chat_message_from_chunk(chunk) else {
            return;
        };

        if message.message_type == ChatMessageType::AgentFramework && message.chat_context.is_some() {
            debug!("Received updated chat context");
            self.chat_context = message.chat_context;
            return;
        }

        if let Some(sly_data) = &message.sly_data {
            self.sly_data
                .extend(sly_data.iter().map(|(key, value)| (key.clone(), value.clone())));
        }

        if let Some(block) = message.error_block() {
            warn!("Agent reported an error: {}", block.error);
            self.sink.on_alert(Alert::warning(block.to_string()));
            self.succeeded = false;
            return;
        }

        if let Some(text) = message.text.as_deref().filter(|text| !text.trim().is_empty()) {
            let agent = message
                .last_agent()
                .map(display_name)
                .unwrap_or_else(|| DEFAULT_AGENT_LABEL.to_string());
            self.sink.on_agent_message(&agent, text);
        }
    }
}

/// Drives the retry state machine for streamed queries
pub struct StreamingQueryExecutor {
    transport: Arc<dyn ChatTransport>,
    sink: Arc<dyn OutputSink>,
    max_retries: u32,
    state: ExecutorState,
}

impl StreamingQueryExecutor {
    pub fn new(transport: Arc<dyn ChatTransport>, sink: Arc<dyn OutputSink>) -> Self {
        Self {
            transport,
            sink,
            max_retries: MAX_RETRIES,
            state: ExecutorState::Idle,
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn state(&self) -> ExecutorState {
        self.state
    }

    /// Run a query to completion.
    ///
    /// `interceptor` sees every chunk first; its return value is what marks
    /// an attempt successful. Without one, any received chunk does.
    pub async fn execute(
        &mut self,
        cancel: &CancellationToken,
        request: &QueryRequest,
        interceptor: Option<&mut (dyn FnMut(&str) -> bool + Send)>,
    ) -> QueryOutcome {
        let mut interceptor = interceptor;
        let mut query = QueryState {
            sink: self.sink.as_ref(),
            succeeded: false,
            chat_context: request.chat_context.clone(),
            sly_data: request.sly_data.clone(),
        };
        let mut attempts = 0;
        let mut aborted = false;

        loop {
            attempts += 1;
            self.state = ExecutorState::Attempting;
            debug!("Query attempt {}/{} to '{}'", attempts, self.max_retries, request.target);

            let attempt_request = QueryRequest {
                chat_context: query.chat_context.clone(),
                sly_data: query.sly_data.clone(),
                ..request.clone()
            };

            let result = self
                .transport
                .send(cancel, &attempt_request, &mut |chunk: &str| {
                    query.handle_chunk(chunk, &mut interceptor)
                })
                .await;

            match result {
                Ok(()) => {}
                Err(e) if e.is_cancellation() => {
                    debug!("Query to '{}' cancelled", request.target);
                    aborted = true;
                    break;
                }
                Err(e) => {
                    warn!("Query attempt {} failed: {}", attempts, e);
                    query.sink.on_alert(Alert::warning(format!("Error occurred: {}", e)));
                }
            }

            if query.succeeded || attempts >= self.max_retries {
                break;
            }
            self.state = ExecutorState::Retrying;
        }

        self.state = if aborted {
            ExecutorState::Aborted
        } else if query.succeeded {
            ExecutorState::Succeeded
        } else {
            error!("Giving up on '{}' after {} attempts", request.target, attempts);
            query
                .sink
                .on_alert(Alert::error(format!("Gave up after {} attempts.", self.max_retries)));
            ExecutorState::Exhausted
        };

        QueryOutcome {
            state: self.state,
            attempts,
            succeeded: query.succeeded,
            aborted,
            chat_context: query.chat_context,
            sly_data: query.sly_data,
        }
    }
}
