//! Test doubles for the query transport.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::chat::transport::{ChatTransport, QueryRequest, TransportError};

/// What one scripted attempt does
#[derive(Debug, Clone)]
pub enum ScriptedAttempt {
    /// Deliver the chunks, then finish normally
    Chunks(Vec<String>),
    /// Deliver the chunks, then fail with a network error
    ChunksThenFail(Vec<String>, String),
    /// Fail immediately with a network error
    Fail(String),
    /// Fire the cancellation token and report cancellation
    Cancelled,
    /// Deliver the chunks, then fire the cancellation token
    ChunksThenCancel(Vec<String>),
}

/// Transport that plays back a fixed script, one entry per attempt
#[derive(Debug)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<ScriptedAttempt>>,
    fallback: Option<ScriptedAttempt>,
    requests: Mutex<Vec<QueryRequest>>,
    calls: AtomicU32,
}

impl ScriptedTransport {
    pub fn new(script: Vec<ScriptedAttempt>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback: None,
            requests: Mutex::new(Vec::new()),
            calls: AtomicU32::new(0),
        }
    }

    /// Every attempt behaves the same
    pub fn repeating(attempt: ScriptedAttempt) -> Self {
        Self {
            fallback: Some(attempt),
            ..Self::new(Vec::new())
        }
    }

    /// Every attempt fails with a network error
    pub fn failing(message: &str) -> Self {
        Self::repeating(ScriptedAttempt::Fail(message.to_string()))
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<QueryRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatTransport for ScriptedTransport {
    async fn send(
        &self,
        cancel: &CancellationToken,
        request: &QueryRequest,
        on_chunk: &mut (dyn for<'c> FnMut(&'c str) + Send),
    ) -> Result<(), TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        if cancel.is_cancelled() {
            return Err(TransportError::Cancelled);
        }

        let attempt = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .or_else(|| self.fallback.clone())
            .unwrap_or(ScriptedAttempt::Chunks(Vec::new()));

        match attempt {
            ScriptedAttempt::Chunks(chunks) => {
                chunks.iter().for_each(|chunk| on_chunk(chunk.as_str()));
                Ok(())
            }
            ScriptedAttempt::ChunksThenFail(chunks, message) => {
                chunks.iter().for_each(|chunk| on_chunk(chunk.as_str()));
                Err(TransportError::Network(message))
            }
            ScriptedAttempt::Fail(message) => Err(TransportError::Network(message)),
            ScriptedAttempt::Cancelled => {
                cancel.cancel();
                Err(TransportError::Cancelled)
            }
            ScriptedAttempt::ChunksThenCancel(chunks) => {
                chunks.iter().for_each(|chunk| on_chunk(chunk.as_str()));
                cancel.cancel();
                Err(TransportError::Cancelled)
            }
        }
    }
}
