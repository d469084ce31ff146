//! Chat Session
//!
//! Glue between the query executor, the conversation tracker and whatever
//! draws the graph. The session is the single writer of the current
//! [`HighlightState`]; any number of [`HighlightReader`]s can read the latest
//! snapshot at any time without re-subscribing.

use crate::chat::executor::{QueryOutcome, StreamingQueryExecutor};
use crate::chat::transport::QueryRequest;
use crate::layout::HighlightState;
use crate::tracking::ConversationTracker;
use serde_json::{Map, Value};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Read side of the highlight cell
#[derive(Debug, Clone)]
pub struct HighlightReader {
    receiver: watch::Receiver<HighlightState>,
}

impl HighlightReader {
    /// Latest published snapshot
    pub fn get(&self) -> HighlightState {
        self.receiver.borrow().clone()
    }

    /// Wait for the next publication. Returns `false` once the session is gone.
    pub async fn changed(&mut self) -> bool {
        self.receiver.changed().await.is_ok()
    }
}

/// One user's conversation with one agent network
pub struct ChatSession {
    executor: StreamingQueryExecutor,
    tracker: ConversationTracker,
    highlight: watch::Sender<HighlightState>,
    identity: String,
    target: String,
    chat_context: Option<Value>,
    sly_data: Map<String, Value>,
}

impl ChatSession {
    pub fn new(executor: StreamingQueryExecutor, identity: impl Into<String>, target: impl Into<String>) -> Self {
        let (highlight, _) = watch::channel(HighlightState::default());
        Self {
            executor,
            tracker: ConversationTracker::new(),
            highlight,
            identity: identity.into(),
            target: target.into(),
            chat_context: None,
            sly_data: Map::new(),
        }
    }

    pub fn subscribe(&self) -> HighlightReader {
        HighlightReader {
            receiver: self.highlight.subscribe(),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Switch to another agent network. Conversation state does not carry over.
    pub fn set_target(&mut self, target: impl Into<String>) {
        self.target = target.into();
        self.clear_context();
    }

    pub fn chat_context(&self) -> Option<&Value> {
        self.chat_context.as_ref()
    }

    pub fn sly_data(&self) -> &Map<String, Value> {
        &self.sly_data
    }

    /// Start the next query with a blank conversation history
    pub fn clear_context(&mut self) {
        self.chat_context = None;
        self.sly_data.clear();
    }

    pub fn executor(&self) -> &StreamingQueryExecutor {
        &self.executor
    }

    /// Run one interaction.
    ///
    /// Every chunk goes through the tracker before the executor looks at it,
    /// and the highlight cell is republished after each one. Whatever the
    /// outcome, tracking state is cleared when the interaction ends.
    pub async fn send(&mut self, cancel: &CancellationToken, query: &str) -> QueryOutcome {
        let request = QueryRequest {
            query: query.to_string(),
            identity: self.identity.clone(),
            target: self.target.clone(),
            chat_context: self.chat_context.clone(),
            sly_data: self.sly_data.clone(),
        };

        self.tracker.reset();
        self.highlight.send_replace(self.tracker.highlight_state(true));
        info!("Sending query to '{}'", self.target);

        let tracker = &mut self.tracker;
        let highlight = &self.highlight;
        let mut track = |chunk: &str| {
            let accepted = tracker.process_chunk(chunk);
            highlight.send_replace(tracker.highlight_state(true));
            accepted
        };

        let outcome = self.executor.execute(cancel, &request, Some(&mut track)).await;

        self.chat_context = outcome.chat_context.clone();
        self.sly_data = outcome.sly_data.clone();

        self.tracker.reset();
        self.highlight.send_replace(HighlightState::default());
        debug!("Interaction with '{}' ended: {}", self.target, outcome.state);

        outcome
    }
}
