//! In-memory doubles for the completion service and corpus store.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::corpus::{CorpusError, CorpusStore};
use crate::llm_client::{CompletionService, LlmError};

/// Replays queued responses in order and records every prompt it receives.
/// Once the queue is drained, further calls fail with `EmptyContent`.
pub struct ScriptedCompletion {
    responses: Mutex<VecDeque<Result<String, LlmError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedCompletion {
    pub fn new(responses: Vec<Result<String, LlmError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionService for ScriptedCompletion {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(LlmError::EmptyContent))
    }
}

/// Never answers within any reasonable deadline.
pub struct SlowCompletion(pub Duration);

#[async_trait]
impl CompletionService for SlowCompletion {
    async fn complete(&self, _prompt: &str) -> Result<String, LlmError> {
        tokio::time::sleep(self.0).await;
        Ok(String::new())
    }
}

/// Returns a fixed description (or fails) and records the queries it sees.
#[derive(Clone)]
pub struct StaticCorpus {
    description: Option<String>,
    queries: Arc<Mutex<Vec<String>>>,
}

impl StaticCorpus {
    pub fn ok(description: &str) -> Self {
        Self {
            description: Some(description.to_string()),
            queries: Arc::default(),
        }
    }

    pub fn failing() -> Self {
        Self {
            description: None,
            queries: Arc::default(),
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl CorpusStore for StaticCorpus {
    async fn retrieve(&self, query: &str) -> Result<String, CorpusError> {
        self.queries.lock().unwrap().push(query.to_string());
        self.description
            .clone()
            .ok_or_else(|| CorpusError::NoMatch(query.to_string()))
    }
}

/// Takes longer than any retrieval deadline used in tests.
pub struct SlowCorpus(pub Duration);

#[async_trait]
impl CorpusStore for SlowCorpus {
    async fn retrieve(&self, _query: &str) -> Result<String, CorpusError> {
        tokio::time::sleep(self.0).await;
        Ok("late".to_string())
    }
}
