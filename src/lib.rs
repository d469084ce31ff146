// Agent network visualization library
//
// Lays out the call graph of a network of cooperating agents and tracks,
// from a streamed chat exchange, which of those agents are active right now.

pub mod chat;
pub mod config;
pub mod error;
pub mod graph;
pub mod layout;
pub mod session;
pub mod tracking;

#[cfg(test)]
pub mod testing;

// Re-export commonly used types
pub use chat::{
    Alert, AlertSeverity, ChatTransport, ExecutorState, HttpChatTransport, OutputSink, QueryOutcome,
    QueryRequest, StreamingQueryExecutor, TransportError,
};
pub use config::{Config, ConfigError, ConfigManager};
pub use error::{AgentFlowError, AgentFlowResult};
pub use graph::{
    display_name, parse_connectivity, AgentId, ConnectivityEntry, ConnectivityGraph, FrontmanPolicy,
    GraphError,
};
pub use layout::{
    layout_network, render_network, GraphLayout, HighlightState, LayoutEdge, LayoutError, LayoutMode,
    LayoutNode, LayoutSettings,
};
pub use session::{ChatSession, HighlightReader};
pub use tracking::{AgentCounters, Conversation, ConversationTracker};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
