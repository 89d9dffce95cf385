//! HTTP handlers for the dashboard

use crate::config::ExplanationConfig;
use crate::dashboard::form::TransactionForm;
use crate::dashboard::page::{render_page, Outcome, Report};
use crate::error::AnalysisError;
use crate::models::loader::{ArtifactCache, ArtifactLoader, ArtifactState};
use crate::pipeline;
use crate::types::transaction::RawTransaction;
use axum::extract::rejection::FormRejection;
use axum::extract::{Form, State};
use axum::http::StatusCode;
use axum::response::{Html, Json};
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub artifacts: Arc<ArtifactCache>,
    pub loader: Arc<ArtifactLoader>,
    pub explanation: ExplanationConfig,
}

impl AppState {
    pub fn new(loader: ArtifactLoader, explanation: ExplanationConfig) -> Self {
        Self {
            artifacts: Arc::new(ArtifactCache::new()),
            loader: Arc::new(loader),
            explanation,
        }
    }

    /// Loaded artifacts; the first caller triggers the load.
    pub fn artifacts(&self) -> &ArtifactState {
        self.artifacts.get_or_load(&self.loader)
    }
}

/// GET / - the empty form with defaults
pub async fn index(State(state): State<AppState>) -> Html<String> {
    let artifacts = state.artifacts();
    Html(render_page(
        artifacts.diagnostic(),
        &RawTransaction::default(),
        None,
    ))
}

/// POST /analyze - run the pipeline on the submitted form
pub async fn analyze(
    State(state): State<AppState>,
    form: Result<Form<TransactionForm>, FormRejection>,
) -> (StatusCode, Html<String>) {
    let artifacts = state.artifacts();

    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            warn!(error = %rejection, "Rejected analysis form");
            let outcome = Outcome::Failed(format!(
                "invalid transaction input: {}",
                rejection.body_text()
            ));
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Html(render_page(
                    artifacts.diagnostic(),
                    &RawTransaction::default(),
                    Some(&outcome),
                )),
            );
        }
    };

    let tx = match form.parse() {
        Ok(tx) => tx,
        Err(e) => {
            warn!(error = %e, "Rejected analysis form");
            let outcome = Outcome::Failed(e.to_string());
            return (
                status_for(&e),
                Html(render_page(
                    artifacts.diagnostic(),
                    &form.prefill(),
                    Some(&outcome),
                )),
            );
        }
    };

    let (status, outcome) = match pipeline::analyze(artifacts, &tx) {
        Ok(analysis) => (
            StatusCode::OK,
            Outcome::Completed(Box::new(Report::from_analysis(
                &analysis,
                &state.explanation,
            ))),
        ),
        Err(e) => (status_for(&e), Outcome::Failed(e.to_string())),
    };

    (
        status,
        Html(render_page(artifacts.diagnostic(), &tx, Some(&outcome))),
    )
}

/// HTTP status for a failed analysis
pub fn status_for(error: &AnalysisError) -> StatusCode {
    match error {
        AnalysisError::MissingArtifact(_) => StatusCode::SERVICE_UNAVAILABLE,
        AnalysisError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
        AnalysisError::SchemaMismatch { .. } | AnalysisError::Scoring(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub artifacts_loaded: bool,
    pub feature_count: usize,
    pub timestamp: i64,
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let (status, feature_count) = match state.artifacts() {
        ArtifactState::Ready(artifacts) => ("healthy", artifacts.schema.len()),
        ArtifactState::Unavailable(_) => ("degraded", 0),
    };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        artifacts_loaded: status == "healthy",
        feature_count,
        timestamp: chrono::Utc::now().timestamp(),
    })
}
