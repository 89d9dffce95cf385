//! One analysis run: transform, score, explain.
//!
//! Runs are independent; the only shared input is the loaded artifacts.

use crate::error::AnalysisError;
use crate::feature_extractor::{FeatureExtractor, FeatureRow};
use crate::models::explainer::{Attribution, TreeExplainer};
use crate::models::inference::InferenceEngine;
use crate::models::loader::ArtifactState;
use crate::types::prediction::Prediction;
use crate::types::transaction::RawTransaction;
use chrono::{DateTime, Utc};
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Everything one analysis action produces
#[derive(Debug, Clone)]
pub struct Analysis {
    pub analysis_id: Uuid,
    pub analyzed_at: DateTime<Utc>,
    pub transaction: RawTransaction,
    pub features: FeatureRow,
    pub prediction: Prediction,
    pub attribution: Attribution,
}

/// Run the full pipeline for one transaction.
///
/// Refuses to run unless the artifacts are loaded; any stage failure aborts
/// the run with no partial result.
pub fn analyze(state: &ArtifactState, tx: &RawTransaction) -> Result<Analysis, AnalysisError> {
    let analysis_id = Uuid::new_v4();
    let start_time = Instant::now();

    let result = run(state, tx, analysis_id);

    match &result {
        Ok(analysis) => info!(
            analysis_id = %analysis_id,
            label = ?analysis.prediction.label,
            fraud_probability = analysis.prediction.probabilities[1],
            processing_time_us = start_time.elapsed().as_micros(),
            "Transaction analyzed"
        ),
        Err(e) => warn!(analysis_id = %analysis_id, error = %e, "Analysis aborted"),
    }

    result
}

fn run(
    state: &ArtifactState,
    tx: &RawTransaction,
    analysis_id: Uuid,
) -> Result<Analysis, AnalysisError> {
    let artifacts = state.ready()?;
    tx.validate()?;

    debug!(analysis_id = %analysis_id, transaction = ?tx, "Running analysis");

    let features = FeatureExtractor::new().extract(tx, &artifacts.schema)?;
    let prediction = InferenceEngine::new(&artifacts.model).predict(&features)?;
    let attribution = TreeExplainer::new(&artifacts.model).explain(&features)?;

    Ok(Analysis {
        analysis_id,
        analyzed_at: Utc::now(),
        transaction: tx.clone(),
        features,
        prediction,
        attribution,
    })
}
