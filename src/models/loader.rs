//! Model artifact loader and the process-wide artifact cache

use crate::config::ArtifactsConfig;
use crate::error::{AnalysisError, ArtifactError};
use crate::models::booster::TreeEnsemble;
use crate::models::schema::FeatureSchema;
use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

/// Classifier and the column list it was trained on
#[derive(Debug)]
pub struct ModelArtifacts {
    pub model: TreeEnsemble,
    pub schema: FeatureSchema,
}

/// Loader for the two artifact files
#[derive(Debug, Clone)]
pub struct ArtifactLoader {
    model_path: PathBuf,
    columns_path: PathBuf,
}

impl ArtifactLoader {
    pub fn new(model_path: impl Into<PathBuf>, columns_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            columns_path: columns_path.into(),
        }
    }

    pub fn from_config(config: &ArtifactsConfig) -> Self {
        Self::new(&config.model_path, &config.columns_path)
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    pub fn columns_path(&self) -> &Path {
        &self.columns_path
    }

    /// Read both artifacts and check that they describe the same features.
    pub fn load(&self) -> Result<ModelArtifacts, ArtifactError> {
        info!(
            model = %self.model_path.display(),
            columns = %self.columns_path.display(),
            "Loading model artifacts"
        );

        let model_bytes = read_artifact(&self.model_path)?;
        let columns_bytes = read_artifact(&self.columns_path)?;

        let model = TreeEnsemble::from_xgboost_json(&model_bytes)
            .map_err(|reason| ArtifactError::corrupt(&self.model_path, reason))?;
        let schema = FeatureSchema::from_json(&columns_bytes)
            .map_err(|reason| ArtifactError::corrupt(&self.columns_path, reason))?;

        if schema.len() != model.num_features() {
            return Err(ArtifactError::corrupt(
                &self.columns_path,
                format!(
                    "lists {} columns but the model was trained on {} features",
                    schema.len(),
                    model.num_features()
                ),
            ));
        }
        if !model.feature_names().is_empty() && model.feature_names() != schema.columns() {
            return Err(ArtifactError::corrupt(
                &self.columns_path,
                format!(
                    "column order {:?} differs from the model's feature names {:?}",
                    schema.columns(),
                    model.feature_names()
                ),
            ));
        }

        info!(
            trees = model.trees().len(),
            features = schema.len(),
            schema_version = schema.version().unwrap_or("unversioned"),
            "Model artifacts loaded successfully"
        );

        Ok(ModelArtifacts { model, schema })
    }
}

fn read_artifact(path: &Path) -> Result<Vec<u8>, ArtifactError> {
    std::fs::read(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            ArtifactError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            ArtifactError::Unreadable {
                path: path.to_path_buf(),
                source,
            }
        }
    })
}

/// Outcome of the one load attempt
#[derive(Debug, Clone)]
pub enum ArtifactState {
    Ready(Arc<ModelArtifacts>),
    /// Load failed; holds the user-facing diagnostic
    Unavailable(String),
}

impl ArtifactState {
    /// The artifacts, or `MissingArtifact` if the load failed.
    pub fn ready(&self) -> Result<&ModelArtifacts, AnalysisError> {
        match self {
            ArtifactState::Ready(artifacts) => Ok(artifacts.as_ref()),
            ArtifactState::Unavailable(reason) => {
                Err(AnalysisError::MissingArtifact(reason.clone()))
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, ArtifactState::Ready(_))
    }

    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            ArtifactState::Ready(_) => None,
            ArtifactState::Unavailable(reason) => Some(reason),
        }
    }
}

/// Initialize-once holder for the loaded artifacts.
///
/// The first call to [`ArtifactCache::get_or_load`] runs the loader; every
/// later call returns that outcome, including a failure.
#[derive(Debug, Default)]
pub struct ArtifactCache {
    cell: OnceCell<ArtifactState>,
}

impl ArtifactCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_load(&self, loader: &ArtifactLoader) -> &ArtifactState {
        self.cell.get_or_init(|| match loader.load() {
            Ok(artifacts) => ArtifactState::Ready(Arc::new(artifacts)),
            Err(e) => {
                error!(error = %e, "Failed to load model artifacts, analysis disabled");
                ArtifactState::Unavailable(e.to_string())
            }
        })
    }

    /// The cached outcome, if a load was attempted.
    pub fn get(&self) -> Option<&ArtifactState> {
        self.cell.get()
    }
}
