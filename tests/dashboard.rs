//! HTTP surface of the dashboard

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use fraud_xai_dashboard::config::ExplanationConfig;
use fraud_xai_dashboard::dashboard::{self, AppState};
use fraud_xai_dashboard::models::loader::ArtifactLoader;
use std::path::PathBuf;
use tower::ServiceExt;

const DEFAULT_FORM: &str = "type=TRANSFER&amount=5000000&step=10&oldbalanceOrg=5000000\
    &newbalanceOrig=0&oldbalanceDest=10000&newbalanceDest=5010000";

fn app_with(model: &str) -> Router {
    let fixtures = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures");
    let loader = ArtifactLoader::new(fixtures.join(model), fixtures.join("model_columns.json"));
    dashboard::router(AppState::new(loader, ExplanationConfig::default()))
}

fn app() -> Router {
    app_with("xgboost_model.json")
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn post_form(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/analyze")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_index_shows_form() {
    let response = app()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("<form method=\"post\" action=\"/analyze\">"));
    assert!(html.contains("<option value=\"TRANSFER\" selected>"));
    assert!(!html.contains("class=\"error\""));
}

#[tokio::test]
async fn test_analyze_renders_results() {
    let response = app().oneshot(post_form(DEFAULT_FORM)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("banner fraud\">Prediction: FRAUD (Probability: 72.31%)"));
    assert!(html.contains("<figure><svg"));
    assert!(html.contains("<details>"));
    assert!(html.contains("<tr><td>type_TRANSFER</td><td>1</td></tr>"));
}

#[tokio::test]
async fn test_analyze_keeps_submitted_values() {
    let form = DEFAULT_FORM.replace("type=TRANSFER", "type=CASH_OUT");
    let response = app().oneshot(post_form(&form)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("<option value=\"CASH_OUT\" selected>"));
    assert!(html.contains("banner legit\">Prediction: Not fraud"));
}

#[tokio::test]
async fn test_malformed_form_is_unprocessable() {
    let form = DEFAULT_FORM.replace("type=TRANSFER", "type=PAYMENT");
    let response = app().oneshot(post_form(&form)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let html = body_text(response).await;
    assert!(html.contains("invalid transaction input"));
}

#[tokio::test]
async fn test_rejected_form_keeps_submitted_values() {
    let form = DEFAULT_FORM
        .replace("type=TRANSFER", "type=PAYMENT")
        .replace("amount=5000000", "amount=181.5")
        .replace("step=10", "step=7");
    let response = app().oneshot(post_form(&form)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let html = body_text(response).await;
    assert!(html.contains("unknown transaction type &#39;PAYMENT&#39;"));
    assert!(html.contains("name=\"amount\" min=\"0\" step=\"any\" value=\"181.5\""));
    assert!(html.contains("name=\"step\" min=\"1\" step=\"1\" value=\"7\""));
}

#[tokio::test]
async fn test_missing_field_is_unprocessable() {
    let form = DEFAULT_FORM.replace("&newbalanceOrig=0", "");
    let response = app().oneshot(post_form(&form)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let html = body_text(response).await;
    assert!(html.contains("newbalanceOrig is required"));
}

#[tokio::test]
async fn test_out_of_range_value_is_unprocessable() {
    let form = DEFAULT_FORM.replace("step=10", "step=0");
    let response = app().oneshot(post_form(&form)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let html = body_text(response).await;
    assert!(html.contains("step must be at least 1"));
}

#[tokio::test]
async fn test_missing_model_is_unavailable() {
    let response = app_with("absent_model.json")
        .oneshot(post_form(DEFAULT_FORM))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let html = body_text(response).await;
    assert!(html.contains("Model artifacts could not be loaded"));
    assert!(!html.contains("class=\"banner"));
}

#[tokio::test]
async fn test_health_reports_artifacts() {
    let response = app()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["artifacts_loaded"], true);
    assert_eq!(json["feature_count"], 9);
}

#[tokio::test]
async fn test_health_degraded_without_model() {
    let response = app_with("absent_model.json")
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["artifacts_loaded"], false);
}
