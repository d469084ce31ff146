//! Conversation Tracking
//!
//! Turns the chunk stream of one interaction into the set of agents that are
//! currently busy, grouped into "conversations" (one per traced call path),
//! plus cumulative per-agent invocation counters for heat-map coloring.

use crate::chat::parse_chunk;
use crate::graph::AgentId;
use crate::layout::HighlightState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, error};
use uuid::Uuid;

/// Per-agent invocation counts for one interaction
pub type AgentCounters = BTreeMap<AgentId, u64>;

/// Agents engaged along one traced call path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    pub agents: BTreeSet<AgentId>,
    pub started_at: DateTime<Utc>,
    /// Text shown alongside the path, if any
    pub text: Option<String>,
}

impl Conversation {
    pub fn new<I, S>(agents: I, text: Option<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<AgentId>,
    {
        Self {
            id: format!("conv_{}", Uuid::new_v4().simple()),
            agents: agents.into_iter().map(Into::into).collect(),
            started_at: Utc::now(),
            text,
        }
    }

    pub fn contains(&self, agent: &str) -> bool {
        self.agents.contains(agent)
    }
}

/// Tracks active conversations and invocation counters across chunks.
///
/// Chunks must be fed in arrival order. A conversation is removed as soon as
/// its agent set becomes empty.
#[derive(Debug, Clone, Default)]
pub struct ConversationTracker {
    conversations: Vec<Conversation>,
    counters: AgentCounters,
}

impl ConversationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one chunk.
    ///
    /// Returns `false` only when the chunk is not valid JSON, in which case
    /// nothing changes. Messages without hops or of an unhandled type are
    /// accepted and ignored.
    pub fn process_chunk(&mut self, chunk: &str) -> bool {
        let message = match parse_chunk(chunk) {
            Ok(Some(message)) => message,
            Ok(None) => return true,
            Err(e) => {
                error!("Agent conversation error: {}", e);
                return false;
            }
        };

        if message.hops().is_empty() {
            return true;
        }

        let agents = message.agent_names();
        for agent in &agents {
            *self.counters.entry(agent.to_string()).or_insert(0) += 1;
        }

        if message.is_final() {
            self.complete(&agents);
        } else if !agents.is_empty() {
            let text = message
                .inquiry()
                .map(str::to_string)
                .or_else(|| message.text.clone());
            let conversation = Conversation::new(agents.iter().copied(), text);
            debug!(
                "Started conversation {} with {} agents",
                conversation.id,
                conversation.agents.len()
            );
            self.conversations.push(conversation);
        }

        true
    }

    /// Remove finished agents from every conversation that holds them
    fn complete(&mut self, agents: &[&str]) {
        for conversation in &mut self.conversations {
            conversation.agents.retain(|agent| !agents.contains(&agent.as_str()));
        }

        let before = self.conversations.len();
        self.conversations
            .retain(|conversation| !conversation.agents.is_empty());
        if before != self.conversations.len() {
            debug!("Closed {} conversations", before - self.conversations.len());
        }
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn counters(&self) -> &AgentCounters {
        &self.counters
    }

    /// Union of all conversation members
    pub fn active_agents(&self) -> BTreeSet<AgentId> {
        self.conversations
            .iter()
            .flat_map(|conversation| conversation.agents.iter().cloned())
            .collect()
    }

    pub fn has_active_conversations(&self) -> bool {
        !self.conversations.is_empty()
    }

    /// Snapshot for the layout engines
    pub fn highlight_state(&self, awaiting_response: bool) -> HighlightState {
        HighlightState {
            active_agents: self.active_agents(),
            counters: self.counters.clone(),
            awaiting_response,
        }
    }

    /// Forget everything; called when an interaction ends
    pub fn reset(&mut self) {
        self.conversations.clear();
        self.counters.clear();
    }
}
