//! Error types for artifact loading and the analysis pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Failure to bring a model artifact into memory.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("artifact file '{}' not found", path.display())]
    NotFound { path: PathBuf },

    #[error("artifact file '{}' could not be read: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("artifact file '{}' is corrupt: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },
}

impl ArtifactError {
    pub fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        ArtifactError::Corrupt {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Failure of a single analysis run. Every variant aborts the run.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Artifacts were absent or corrupt at load time; the pipeline is not ready.
    #[error("model artifacts are not loaded: {0}")]
    MissingArtifact(String),

    /// The transform could not produce every column the model expects.
    #[error("feature columns do not match the model schema, missing: {}", missing.join(", "))]
    SchemaMismatch { missing: Vec<String> },

    #[error("scoring failed: {0}")]
    Scoring(String),

    #[error("invalid transaction input: {0}")]
    InvalidInput(String),
}

/// The attribution plot could not be built. Shown as a warning, never fatal.
#[derive(Debug, Error)]
#[error("attribution plot could not be rendered: {0}")]
pub struct ExplanationRenderFailure(pub String);
