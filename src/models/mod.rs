//! Model artifacts, scoring and explanation

pub mod booster;
pub mod explainer;
pub mod inference;
pub mod loader;
pub mod schema;

pub use booster::TreeEnsemble;
pub use explainer::{Attribution, FeatureContribution, TreeExplainer};
pub use inference::InferenceEngine;
pub use loader::{ArtifactCache, ArtifactLoader, ArtifactState, ModelArtifacts};
pub use schema::FeatureSchema;
