//! Streaming Chat Protocol
//!
//! Wire types for the chunk envelope produced by the agent server, plus the
//! helpers both the query executor and the conversation tracker use to
//! interpret a chunk.

pub mod alerts;
pub mod executor;
pub mod transport;

use crate::graph::AgentId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::fmt;

pub use alerts::{Alert, AlertLog, AlertSeverity, OutputSink, TracingSink};
pub use executor::{ExecutorState, QueryOutcome, StreamingQueryExecutor, MAX_RETRIES};
pub use transport::{ChatTransport, HttpChatTransport, QueryRequest, TransportError};

/// Message types understood by this client. Anything else is ignored.
pub const KNOWN_MESSAGE_TYPES: [ChatMessageType; 3] = [
    ChatMessageType::Ai,
    ChatMessageType::Agent,
    ChatMessageType::AgentFramework,
];

/// Kind of a streamed message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChatMessageType {
    Human,
    System,
    Ai,
    Agent,
    AgentFramework,
    AgentToolResult,
    #[default]
    #[serde(other)]
    Unknown,
}

impl ChatMessageType {
    pub fn is_known(self) -> bool {
        KNOWN_MESSAGE_TYPES.contains(&self)
    }
}

/// One step in a message's call chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Origin {
    #[serde(default)]
    pub tool: AgentId,
    /// Any JSON number; some servers send integral values as floats
    #[serde(default, alias = "instantiationIndex")]
    pub instantiation_index: Option<Number>,
}

impl Origin {
    pub fn new(tool: impl Into<AgentId>, instantiation_index: impl Into<Number>) -> Self {
        Self {
            tool: tool.into(),
            instantiation_index: Some(instantiation_index.into()),
        }
    }
}

/// Structured payload attached to a message
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MessageStructure {
    #[serde(default, alias = "totalTokens", skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<Number>,
    #[serde(default, alias = "toolEnd", skip_serializing_if = "Option::is_none")]
    pub tool_end: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A single streamed message
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(rename = "type", default)]
    pub message_type: ChatMessageType,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub origin: Option<Vec<Origin>>,
    #[serde(default)]
    pub structure: Option<MessageStructure>,
    #[serde(default, alias = "chatContext", skip_serializing_if = "Option::is_none")]
    pub chat_context: Option<Value>,
    #[serde(default, alias = "slyData", skip_serializing_if = "Option::is_none")]
    pub sly_data: Option<Map<String, Value>>,
}

/// Top-level chunk envelope
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub response: Option<ChatMessage>,
}

impl ChatMessage {
    /// Hop list, empty when absent
    pub fn hops(&self) -> &[Origin] {
        self.origin.as_deref().unwrap_or_default()
    }

    /// Agents named in the hop list, skipping blank tool names
    pub fn agent_names(&self) -> Vec<&str> {
        self.hops()
            .iter()
            .map(|hop| hop.tool.as_str())
            .filter(|tool| !tool.is_empty())
            .collect()
    }

    /// The agent that produced this message: the last hop
    pub fn last_agent(&self) -> Option<&str> {
        self.hops()
            .last()
            .map(|hop| hop.tool.as_str())
            .filter(|tool| !tool.is_empty())
    }

    /// End of an agent's turn: a non-zero token total or a coded-tool end marker
    pub fn is_final(&self) -> bool {
        self.structure.as_ref().is_some_and(|structure| {
            let spent = structure
                .total_tokens
                .as_ref()
                .and_then(Number::as_f64)
                .is_some_and(|tokens| tokens > 0.0);
            spent || structure.tool_end == Some(true)
        })
    }

    /// `structure.params.inquiry`, used by networks that exchange JSON requests
    pub fn inquiry(&self) -> Option<&str> {
        self.structure
            .as_ref()?
            .extra
            .get("params")?
            .get("inquiry")?
            .as_str()
    }

    /// Embedded error block, if any.
    ///
    /// Looks in `structure` first, then in the text parsed as JSON.
    pub fn error_block(&self) -> Option<AgentErrorBlock> {
        if let Some(block) = self
            .structure
            .as_ref()
            .and_then(|structure| AgentErrorBlock::from_object(&structure.extra))
        {
            return Some(block);
        }

        let text = self.text.as_deref()?;
        match serde_json::from_str::<Value>(&strip_code_fences(text)) {
            Ok(Value::Object(object)) => AgentErrorBlock::from_object(&object),
            _ => None,
        }
    }
}

/// Error block reported by an agent inside an otherwise well-formed message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentErrorBlock {
    pub error: String,
    pub traceback: Option<String>,
    pub tool: Option<String>,
}

impl AgentErrorBlock {
    fn from_object(object: &Map<String, Value>) -> Option<Self> {
        let error = object.get("error")?;
        Some(Self {
            error: value_text(error),
            traceback: object.get("traceback").map(value_text),
            tool: object.get("tool").map(value_text),
        })
    }
}

impl fmt::Display for AgentErrorBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Error occurred. Error: \"{}\", traceback: \"{}\", tool: \"{}\"",
            self.error,
            self.traceback.as_deref().unwrap_or_default(),
            self.tool.as_deref().unwrap_or_default()
        )
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Parse one chunk.
///
/// Returns `Ok(None)` for well-formed envelopes with no message or with a
/// message type this client does not handle.
pub fn parse_chunk(chunk: &str) -> Result<Option<ChatMessage>, serde_json::Error> {
    let envelope: ChatResponse = serde_json::from_str(chunk)?;
    Ok(envelope
        .response
        .filter(|message| message.message_type.is_known()))
}

/// Lenient variant of [`parse_chunk`] that treats malformed chunks as absent
pub fn chat_message_from_chunk(chunk: &str) -> Option<ChatMessage> {
    parse_chunk(chunk).ok().flatten()
}

/// Alert text for an error-bearing chunk, if it carries one
pub fn check_error(chunk: &str) -> Option<String> {
    chat_message_from_chunk(chunk)?
        .error_block()
        .map(|block| block.to_string())
}

/// Remove markdown code fences LLMs like to wrap JSON in
pub fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "")
}
