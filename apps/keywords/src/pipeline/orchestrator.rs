//! Keyword pipeline: orchestrates a full run for one role.
//!
//! Flow: retrieve description → generate → cluster → refine →
//!       parse refined output → persist plan (→ optional run record).
//!
//! Strictly sequential. Any failure aborts the run before the plan is written.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::corpus::{CorpusError, CorpusStore};
use crate::errors::PipelineError;
use crate::llm_client::prompts::render_template;
use crate::llm_client::CompletionService;
use crate::pipeline::artifact::{ArtifactStore, RunRecord};
use crate::pipeline::parser::{parse_plan, Plan};
use crate::pipeline::prompts::RETRIEVAL_QUERY_TEMPLATE;
use crate::pipeline::stages::{Field, RunContext, StageName, STAGES};

pub const DEFAULT_NUM_KEYWORDS: u32 = 250;

/// Per-instance settings. Nothing here is process-global.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub retrieval_timeout: Duration,
    pub completion_timeout: Duration,
    pub emit_intermediates: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            retrieval_timeout: Duration::from_secs(120),
            completion_timeout: Duration::from_secs(120),
            emit_intermediates: false,
        }
    }
}

/// Result of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutcome {
    pub run_id: Uuid,
    pub plan: Plan,
    pub artifact_path: std::path::PathBuf,
    /// Every intermediate value of the run, whether or not it was written to disk.
    pub intermediates: RunRecord,
}

pub struct KeywordPipeline {
    corpus: Arc<dyn CorpusStore>,
    llm: Arc<dyn CompletionService>,
    artifacts: ArtifactStore,
    options: PipelineOptions,
}

impl KeywordPipeline {
    pub fn new(
        corpus: Arc<dyn CorpusStore>,
        llm: Arc<dyn CompletionService>,
        artifacts: ArtifactStore,
        options: PipelineOptions,
    ) -> Self {
        Self {
            corpus,
            llm,
            artifacts,
            options,
        }
    }

    /// Runs the full pipeline for `role` and persists the resulting plan.
    ///
    /// Steps:
    /// 1. corpus.retrieve() → description
    /// 2. generate → keywords
    /// 3. cluster → curated_keywords
    /// 4. refine → refined_keywords
    /// 5. parse_plan(refined_keywords) → Plan
    /// 6. write `<slug>.json` (and `<slug>.run.json` when enabled)
    pub async fn run(
        &self,
        role: &str,
        num_keywords: u32,
    ) -> Result<PipelineOutcome, PipelineError> {
        let role = role.trim();
        if role.is_empty() {
            return Err(PipelineError::EmptyRole);
        }

        let mut ctx = RunContext::new(role, num_keywords);
        info!(
            "Run {} started for role '{}' ({} keywords)",
            ctx.run_id, ctx.role, ctx.num_keywords
        );

        // Step 1: retrieve the role description
        let query = render_template(RETRIEVAL_QUERY_TEMPLATE, &[("role", role)]);
        let description = with_deadline(
            StageName::Retrieval,
            self.options.retrieval_timeout,
            self.corpus.retrieve(&query),
        )
        .await?
        .map_err(PipelineError::Retrieval)?;
        if description.trim().is_empty() {
            return Err(PipelineError::Retrieval(CorpusError::Empty));
        }
        debug!("Retrieved description ({} chars)", description.len());
        ctx.set(Field::Description, description);

        // Steps 2-4: prompt stages, each consuming the previous output
        for stage in &STAGES {
            let prompt = stage
                .check_inputs(&ctx)
                .and_then(|_| (stage.render)(&ctx))
                .map_err(|missing| PipelineError::MissingInput {
                    stage: stage.name,
                    field: missing.0,
                })?;

            let started = Instant::now();
            let output = with_deadline(
                stage.name,
                self.options.completion_timeout,
                self.llm.complete(&prompt),
            )
            .await?
            .map_err(|source| PipelineError::Completion {
                stage: stage.name,
                source,
            })?;

            info!(
                "Stage {} finished in {}ms ({} chars)",
                stage.name,
                started.elapsed().as_millis(),
                output.len()
            );
            ctx.set(stage.produces, output);
        }

        // Step 5: strict parse of the final stage
        let refined = ctx
            .require(Field::RefinedKeywords)
            .map_err(|missing| PipelineError::MissingInput {
                stage: StageName::Parse,
                field: missing.0,
            })?;
        let plan = parse_plan(refined)?;
        info!(
            "Parsed plan: {} items, {} keywords",
            plan.items().len(),
            plan.keyword_count()
        );

        // Step 6: persist
        let artifact_path = self.artifacts.write_plan(role, &plan)?;
        let intermediates = RunRecord::from_context(&ctx, Utc::now());
        if self.options.emit_intermediates {
            match self.artifacts.write_run_record(&intermediates) {
                Ok(path) => debug!("Run record written to {}", path.display()),
                Err(e) => warn!("Plan saved but run record was not: {e}"),
            }
        }

        info!(
            "Run {} stored plan at {}",
            ctx.run_id,
            artifact_path.display()
        );

        Ok(PipelineOutcome {
            run_id: ctx.run_id,
            plan,
            artifact_path,
            intermediates,
        })
    }
}

/// Wraps an external call with a deadline; elapsing becomes `PipelineError::Timeout`.
async fn with_deadline<F, T>(stage: StageName, after: Duration, call: F) -> Result<T, PipelineError>
where
    F: Future<Output = T>,
{
    tokio::time::timeout(after, call)
        .await
        .map_err(|_| PipelineError::Timeout { stage, after })
}
