//! Fraud Analysis Dashboard Library
//!
//! Scores one transaction at a time with a pre-trained gradient-boosted tree
//! classifier and explains the verdict with exact tree Shapley attributions.

pub mod config;
pub mod dashboard;
pub mod error;
pub mod feature_extractor;
pub mod models;
pub mod pipeline;
pub mod types;

pub use config::AppConfig;
pub use error::{AnalysisError, ArtifactError, ExplanationRenderFailure};
pub use feature_extractor::{FeatureExtractor, FeatureRow};
pub use models::inference::InferenceEngine;
pub use pipeline::{analyze, Analysis};
pub use types::{prediction::Prediction, transaction::RawTransaction};
