//! Sample networks and chunk builders shared by unit tests.

use serde_json::{json, Value};

use crate::graph::ConnectivityEntry;

pub fn network(adjacency: &[(&str, &[&str])]) -> Vec<ConnectivityEntry> {
    adjacency.iter()
        .map(|(origin, tools)| ConnectivityEntry::new(*origin, tools))
        .collect()
}

/// Frontman with three children, each with one leaf
pub fn seven_agent_network() -> Vec<ConnectivityEntry> {
    network(&[
        ("agent1", &["agent2", "agent3", "agent4"]),
        ("agent2", &["agent5"]),
        ("agent3", &["agent6"]),
        ("agent4", &["agent7"]),
        ("agent5", &[]),
        ("agent6", &[]),
        ("agent7", &[]),
    ])
}

fn origins(hops: &[&str]) -> Value {
    Value::Array(
        hops.iter()
            .map(|tool| json!({"tool": tool, "instantiation_index": 1}))
            .collect(),
    )
}

/// AGENT message passing through `hops`, optionally marked final
pub fn agent_chunk(hops: &[&str], is_final: bool) -> String {
    let mut message = json!({
        "type": "AGENT",
        "text": format!("Invoking {}", hops.last().copied().unwrap_or_default()),
        "origin": origins(hops),
    });
    if is_final {
        message["structure"] = json!({"total_tokens": 42});
    }
    json!({ "response": message }).to_string()
}

/// Plain AI answer with no hop information
pub fn ai_chunk(text: &str) -> String {
    json!({"response": {"type": "AI", "text": text}}).to_string()
}

/// AI message whose text is an agent error block
pub fn error_chunk(error: &str) -> String {
    let block = json!({"error": error, "traceback": "Traceback ...", "tool": "calculator"});
    json!({"response": {"type": "AI", "text": block.to_string()}}).to_string()
}

/// Framework message carrying a new chat context
pub fn context_chunk(chat_context: Value) -> String {
    json!({"response": {"type": "AGENT_FRAMEWORK", "chat_context": chat_context}}).to_string()
}
