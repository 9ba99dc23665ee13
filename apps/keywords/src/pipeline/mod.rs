// Keyword pipeline: generate -> cluster -> refine, then strict parse and persist.
// All completions go through llm_client::CompletionService and all retrieval
// through corpus::CorpusStore; nothing here talks to the network directly.

use std::fmt;

pub mod artifact;
pub mod handlers;
pub mod orchestrator;
pub mod parser;
pub mod prompts;
pub mod stages;

pub use orchestrator::{KeywordPipeline, PipelineOptions, DEFAULT_NUM_KEYWORDS};

/// Two-outcome status printed by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Success,
    Error,
}

impl RunStatus {
    pub fn of<T, E>(result: &Result<T, E>) -> Self {
        match result {
            Ok(_) => RunStatus::Success,
            Err(_) => RunStatus::Error,
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Success => f.write_str("SUCCESS"),
            RunStatus::Error => f.write_str("ERROR"),
        }
    }
}
