use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::Config;
use crate::corpus::{DirectoryCorpus, SynthesizingCorpus};
use crate::llm_client::{CompletionService, LlmClient};
use crate::pipeline::artifact::ArtifactStore;
use crate::pipeline::{KeywordPipeline, PipelineOptions};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<KeywordPipeline>,
    /// Used when a request does not set `num_keywords`.
    pub default_num_keywords: u32,
}

/// Wires the production pipeline: Anthropic client, indexed corpus with answer
/// synthesis, and the on-disk artifact store.
pub fn build_pipeline(config: &Config) -> Result<KeywordPipeline> {
    let llm: Arc<dyn CompletionService> = Arc::new(
        LlmClient::new(
            config.anthropic_api_key.clone(),
            config.llm_model.clone(),
            config.llm_timeout,
            config.llm_max_retries,
        )
        .context("Failed to build HTTP client")?,
    );
    info!("LLM client initialized (model: {})", config.llm_model);

    info!(
        "Loading corpus from '{}'. Indexing may take a moment.",
        config.corpus_dir.display()
    );
    let index = DirectoryCorpus::load(&config.corpus_dir, config.corpus_top_k)
        .with_context(|| format!("Failed to load corpus from {}", config.corpus_dir.display()))?;
    let corpus = Arc::new(SynthesizingCorpus::new(index, llm.clone()));

    Ok(KeywordPipeline::new(
        corpus,
        llm,
        ArtifactStore::new(&config.output_dir),
        PipelineOptions {
            retrieval_timeout: config.retrieval_timeout,
            completion_timeout: config.stage_timeout,
            emit_intermediates: config.emit_intermediates,
        },
    ))
}
