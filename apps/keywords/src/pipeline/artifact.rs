//! Persisted run artifacts.
//!
//! One plan file per role (`<key>.json`, overwritten on each run) plus an
//! optional diagnostics record (`<key>.run.json`). See `artifact_key`. Writes
//! go through a temp file in the target directory and are renamed into place,
//! so readers never observe a half-written plan.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use thiserror::Error;
use uuid::Uuid;

use crate::pipeline::parser::Plan;
use crate::pipeline::stages::RunContext;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("Failed to create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize artifact: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Full working set of a finished run, kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: Uuid,
    pub role: String,
    pub num_keywords: u32,
    pub description: Option<String>,
    pub keywords: Option<String>,
    pub curated_keywords: Option<String>,
    pub refined_keywords: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunRecord {
    pub fn from_context(ctx: &RunContext, finished_at: DateTime<Utc>) -> Self {
        Self {
            run_id: ctx.run_id,
            role: ctx.role.clone(),
            num_keywords: ctx.num_keywords,
            description: ctx.description.clone(),
            keywords: ctx.keywords.clone(),
            curated_keywords: ctx.curated_keywords.clone(),
            refined_keywords: ctx.refined_keywords.clone(),
            started_at: ctx.started_at,
            finished_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn plan_path(&self, role: &str) -> PathBuf {
        self.dir.join(format!("{}.json", artifact_key(role)))
    }

    pub fn run_record_path(&self, role: &str) -> PathBuf {
        self.dir.join(format!("{}.run.json", artifact_key(role)))
    }

    pub fn write_plan(&self, role: &str, plan: &Plan) -> Result<PathBuf, ArtifactError> {
        let path = self.plan_path(role);
        self.write_atomic(&path, &serde_json::to_vec_pretty(plan)?)?;
        Ok(path)
    }

    pub fn write_run_record(&self, record: &RunRecord) -> Result<PathBuf, ArtifactError> {
        let path = self.run_record_path(&record.role);
        self.write_atomic(&path, &serde_json::to_vec_pretty(record)?)?;
        Ok(path)
    }

    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> Result<(), ArtifactError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| ArtifactError::CreateDir {
            path: self.dir.clone(),
            source,
        })?;

        let write_err = |source| ArtifactError::Write {
            path: path.to_path_buf(),
            source,
        };

        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(write_err)?;
        tmp.write_all(bytes).map_err(write_err)?;
        tmp.as_file().sync_all().map_err(write_err)?;
        tmp.persist(path).map_err(|e| write_err(e.error))?;
        Ok(())
    }
}

/// File-name key for a role: the readable slug plus a fingerprint of the
/// trimmed role, so roles that slug alike ("C++ Developer", "C Developer")
/// still get their own files.
pub fn artifact_key(role: &str) -> String {
    format!("{}-{}", role_slug(role), role_fingerprint(role))
}

/// First four bytes of the SHA-256 of the trimmed role, as hex.
fn role_fingerprint(role: &str) -> String {
    let digest = Sha256::digest(role.trim().as_bytes());
    digest[..4].iter().map(|b| format!("{b:02x}")).collect()
}

/// Lower-case, runs of non-alphanumerics folded to `-`.
pub fn role_slug(role: &str) -> String {
    let mut slug = String::with_capacity(role.len());
    for c in role.trim().chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        "role".to_string()
    } else {
        slug
    }
}
