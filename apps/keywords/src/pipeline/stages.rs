//! Typed stage list for the keyword pipeline.
//!
//! Each stage declares the context fields it reads and the one it produces.
//! The orchestrator walks `STAGES` in order; nothing is resolved by name.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::llm_client::prompts::{render_template, KEEP_EVERY_KEYWORD_INSTRUCTION};
use crate::pipeline::prompts::{
    CLUSTER_PROMPT_TEMPLATE, GENERATE_PROMPT_TEMPLATE, PLAN_FORMAT_INSTRUCTIONS,
    REFINE_PROMPT_TEMPLATE,
};

/// Every step a run passes through, in order. Used to label failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageName {
    Retrieval,
    Generate,
    Cluster,
    Refine,
    Parse,
    Persist,
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StageName::Retrieval => "retrieval",
            StageName::Generate => "generate",
            StageName::Cluster => "cluster",
            StageName::Refine => "refine",
            StageName::Parse => "parse",
            StageName::Persist => "persist",
        };
        f.write_str(name)
    }
}

/// Text values produced during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Description,
    Keywords,
    CuratedKeywords,
    RefinedKeywords,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Description => "description",
            Field::Keywords => "keywords",
            Field::CuratedKeywords => "curated_keywords",
            Field::RefinedKeywords => "refined_keywords",
        };
        f.write_str(name)
    }
}

/// A required field was read before any stage produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissingField(pub Field);

/// Working set of a single run. Every produced value is kept until the run ends.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: Uuid,
    pub role: String,
    pub num_keywords: u32,
    pub started_at: DateTime<Utc>,
    pub description: Option<String>,
    pub keywords: Option<String>,
    pub curated_keywords: Option<String>,
    pub refined_keywords: Option<String>,
}

impl RunContext {
    pub fn new(role: impl Into<String>, num_keywords: u32) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            role: role.into(),
            num_keywords,
            started_at: Utc::now(),
            description: None,
            keywords: None,
            curated_keywords: None,
            refined_keywords: None,
        }
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        match field {
            Field::Description => self.description.as_deref(),
            Field::Keywords => self.keywords.as_deref(),
            Field::CuratedKeywords => self.curated_keywords.as_deref(),
            Field::RefinedKeywords => self.refined_keywords.as_deref(),
        }
    }

    pub fn require(&self, field: Field) -> Result<&str, MissingField> {
        self.get(field).ok_or(MissingField(field))
    }

    pub fn set(&mut self, field: Field, value: String) {
        let slot = match field {
            Field::Description => &mut self.description,
            Field::Keywords => &mut self.keywords,
            Field::CuratedKeywords => &mut self.curated_keywords,
            Field::RefinedKeywords => &mut self.refined_keywords,
        };
        *slot = Some(value);
    }
}

/// One prompt-and-completion step.
#[derive(Clone, Copy)]
pub struct Stage {
    pub name: StageName,
    pub requires: &'static [Field],
    pub produces: Field,
    pub render: fn(&RunContext) -> Result<String, MissingField>,
}

impl Stage {
    /// Checks the declared inputs before the prompt is built.
    pub fn check_inputs(&self, ctx: &RunContext) -> Result<(), MissingField> {
        self.requires
            .iter()
            .try_for_each(|&field| ctx.require(field).map(|_| ()))
    }
}

impl fmt::Debug for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stage")
            .field("name", &self.name)
            .field("requires", &self.requires)
            .field("produces", &self.produces)
            .finish()
    }
}

/// generate → cluster → refine
pub const STAGES: [Stage; 3] = [
    Stage {
        name: StageName::Generate,
        requires: &[Field::Description],
        produces: Field::Keywords,
        render: render_generate,
    },
    Stage {
        name: StageName::Cluster,
        requires: &[Field::Keywords],
        produces: Field::CuratedKeywords,
        render: render_cluster,
    },
    Stage {
        name: StageName::Refine,
        requires: &[Field::CuratedKeywords],
        produces: Field::RefinedKeywords,
        render: render_refine,
    },
];

fn render_generate(ctx: &RunContext) -> Result<String, MissingField> {
    let num_keywords = ctx.num_keywords.to_string();
    Ok(render_template(
        GENERATE_PROMPT_TEMPLATE,
        &[
            ("num_keywords", num_keywords.as_str()),
            ("role", ctx.role.as_str()),
            ("description", ctx.require(Field::Description)?),
        ],
    ))
}

fn render_cluster(ctx: &RunContext) -> Result<String, MissingField> {
    Ok(render_template(
        CLUSTER_PROMPT_TEMPLATE,
        &[
            ("keep_instruction", KEEP_EVERY_KEYWORD_INSTRUCTION),
            ("format_instructions", PLAN_FORMAT_INSTRUCTIONS),
            ("role", ctx.role.as_str()),
            ("keywords", ctx.require(Field::Keywords)?),
        ],
    ))
}

fn render_refine(ctx: &RunContext) -> Result<String, MissingField> {
    Ok(render_template(
        REFINE_PROMPT_TEMPLATE,
        &[
            ("keep_instruction", KEEP_EVERY_KEYWORD_INSTRUCTION),
            ("format_instructions", PLAN_FORMAT_INSTRUCTIONS),
            ("role", ctx.role.as_str()),
            ("curated_keywords", ctx.require(Field::CuratedKeywords)?),
        ],
    ))
}
