//! Shared helpers for the integration tests.

#![allow(dead_code)]

use agentflow::{ChatTransport, ConnectivityEntry, QueryRequest, TransportError};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// One attempt played back by [`PlaybackTransport`]
#[derive(Debug, Clone)]
pub enum Attempt {
    Deliver(Vec<String>),
    DeliverThenFail(Vec<String>),
    DeliverThenCancel(Vec<String>),
}

/// Transport that replays recorded attempts in order
#[derive(Debug, Default)]
pub struct PlaybackTransport {
    attempts: Mutex<VecDeque<Attempt>>,
    requests: Mutex<Vec<QueryRequest>>,
}

impl PlaybackTransport {
    pub fn new(attempts: Vec<Attempt>) -> Self {
        Self {
            attempts: Mutex::new(attempts.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<QueryRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatTransport for PlaybackTransport {
    async fn send(
        &self,
        cancel: &CancellationToken,
        request: &QueryRequest,
        on_chunk: &mut (dyn for<'c> FnMut(&'c str) + Send),
    ) -> Result<(), TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        if cancel.is_cancelled() {
            return Err(TransportError::Cancelled);
        }

        let attempt = self.attempts.lock().unwrap().pop_front();
        match attempt {
            None => Ok(()),
            Some(Attempt::Deliver(chunks)) => {
                chunks.iter().for_each(|chunk| on_chunk(chunk.as_str()));
                Ok(())
            }
            Some(Attempt::DeliverThenFail(chunks)) => {
                chunks.iter().for_each(|chunk| on_chunk(chunk.as_str()));
                Err(TransportError::Status {
                    status: 503,
                    reason: "Service Unavailable".to_string(),
                })
            }
            Some(Attempt::DeliverThenCancel(chunks)) => {
                chunks.iter().for_each(|chunk| on_chunk(chunk.as_str()));
                cancel.cancel();
                Err(TransportError::Cancelled)
            }
        }
    }
}

pub fn network(adjacency: &[(&str, &[&str])]) -> Vec<ConnectivityEntry> {
    adjacency.iter()
        .map(|(origin, tools)| ConnectivityEntry::new(*origin, tools))
        .collect()
}

/// Trip-planning network used across the integration tests
pub fn travel_network() -> Vec<ConnectivityEntry> {
    network(&[
        ("travel_planner", &["flight_search", "hotel_search", "budget"]),
        ("flight_search", &["airline_api"]),
        ("hotel_search", &["booking_api", "reviews"]),
        ("budget", &[]),
        ("airline_api", &[]),
        ("booking_api", &[]),
        ("reviews", &[]),
    ])
}

pub fn agent_chunk(hops: &[&str], is_final: bool) -> String {
    let origin: Vec<Value> = hops
        .iter()
        .map(|tool| json!({"tool": tool, "instantiationIndex": 1}))
        .collect();
    let mut message = json!({
        "type": "AGENT",
        "text": format!("{} is working", hops.last().copied().unwrap_or_default()),
        "origin": origin,
    });
    if is_final {
        message["structure"] = json!({"toolEnd": true});
    }
    json!({ "response": message }).to_string()
}

pub fn ai_chunk(hops: &[&str], text: &str) -> String {
    let origin: Vec<Value> = hops
        .iter()
        .map(|tool| json!({"tool": tool, "instantiation_index": 1}))
        .collect();
    json!({"response": {"type": "AI", "text": text, "origin": origin}}).to_string()
}

pub fn framework_chunk(chat_context: Value) -> String {
    json!({"response": {"type": "AGENT_FRAMEWORK", "chat_context": chat_context}}).to_string()
}

pub fn sly_data_chunk(sly_data: Value) -> String {
    json!({"response": {"type": "AGENT_FRAMEWORK", "sly_data": sly_data}}).to_string()
}
