//! Corpus Store: retrieval over the ingested role documents.
//!
//! `DirectoryCorpus` ranks the `*.txt` files written by `ingest` against a
//! free-text query. `SynthesizingCorpus` layers a completion call on top so the
//! pipeline receives one focused description instead of raw documents.
//!
//! `KeywordPipeline` holds an `Arc<dyn CorpusStore>`, so either backend (or a
//! test double) can be plugged in.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::llm_client::prompts::render_template;
use crate::llm_client::{CompletionService, LlmError};

pub mod index;
pub mod prompts;

pub use index::DirectoryCorpus;

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("Failed to read corpus at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No .txt documents found in {0}")]
    EmptyCorpus(PathBuf),

    #[error("No document matches query '{0}'")]
    NoMatch(String),

    #[error("Retrieval returned empty text")]
    Empty,

    #[error("Answer synthesis failed: {0}")]
    Synthesis(#[from] LlmError),
}

/// Free-text retrieval over role descriptions.
#[async_trait]
pub trait CorpusStore: Send + Sync {
    async fn retrieve(&self, query: &str) -> Result<String, CorpusError>;
}

#[async_trait]
impl CorpusStore for DirectoryCorpus {
    async fn retrieve(&self, query: &str) -> Result<String, CorpusError> {
        let hits = self.search(query);
        if hits.is_empty() {
            return Err(CorpusError::NoMatch(query.to_string()));
        }
        Ok(index::render_context(&hits))
    }
}

/// Retrieves the best-matching documents, then asks the completion service to
/// answer the query from that context alone.
pub struct SynthesizingCorpus {
    index: DirectoryCorpus,
    llm: Arc<dyn CompletionService>,
}

impl SynthesizingCorpus {
    pub fn new(index: DirectoryCorpus, llm: Arc<dyn CompletionService>) -> Self {
        Self { index, llm }
    }
}

#[async_trait]
impl CorpusStore for SynthesizingCorpus {
    async fn retrieve(&self, query: &str) -> Result<String, CorpusError> {
        let hits = self.index.search(query);
        if hits.is_empty() {
            return Err(CorpusError::NoMatch(query.to_string()));
        }
        debug!(
            "Synthesizing answer from {} documents: {:?}",
            hits.len(),
            hits.iter().map(|d| d.title.as_str()).collect::<Vec<_>>()
        );

        let context = index::render_context(&hits);
        let prompt = render_template(
            prompts::ANSWER_FROM_CONTEXT_TEMPLATE,
            &[("context", context.as_str()), ("question", query)],
        );

        let answer = self.llm.complete(&prompt).await?;
        if answer.trim().is_empty() {
            return Err(CorpusError::Empty);
        }
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedCompletion;

    fn corpus() -> DirectoryCorpus {
        DirectoryCorpus::from_documents(
            vec![
                (
                    "Data Scientists".to_string(),
                    "Analyze data with statistics and machine learning.".to_string(),
                ),
                (
                    "Bakers".to_string(),
                    "Mix dough and operate ovens.".to_string(),
                ),
            ],
            2,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_directory_corpus_returns_matching_document() {
        let text = corpus()
            .retrieve("All requirements and description for role Data Scientist")
            .await
            .unwrap();
        assert!(text.contains("machine learning"));
        assert!(!text.contains("dough"));
    }

    #[tokio::test]
    async fn test_directory_corpus_no_match() {
        let err = corpus().retrieve("astronaut").await.unwrap_err();
        assert!(matches!(err, CorpusError::NoMatch(_)));
    }

    #[tokio::test]
    async fn test_synthesizing_corpus_embeds_context_and_question() {
        let llm = Arc::new(ScriptedCompletion::new(vec![Ok("Summary".to_string())]));
        let store = SynthesizingCorpus::new(corpus(), llm.clone());

        let answer = store.retrieve("requirements for Bakers").await.unwrap();

        assert_eq!(answer, "Summary");
        let prompts = llm.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("operate ovens"));
        assert!(prompts[0].contains("requirements for Bakers"));
    }

    #[tokio::test]
    async fn test_synthesizing_corpus_skips_llm_without_match() {
        let llm = Arc::new(ScriptedCompletion::new(vec![]));
        let store = SynthesizingCorpus::new(corpus(), llm.clone());

        assert!(store.retrieve("astronaut").await.is_err());
        assert!(llm.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_synthesizing_corpus_surfaces_llm_failure() {
        let llm = Arc::new(ScriptedCompletion::new(vec![Err(LlmError::EmptyContent)]));
        let store = SynthesizingCorpus::new(corpus(), llm);

        let err = store.retrieve("Bakers").await.unwrap_err();
        assert!(matches!(err, CorpusError::Synthesis(LlmError::EmptyContent)));
    }
}
