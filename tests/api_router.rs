use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, NaiveDate};
use eco_save::{
    api::{self, AppState},
    config::ServerConfig,
    ingest::MeterFeedReader,
    ml::WindowMeanModel,
    pipeline::{AnalysisPipeline, PipelineSettings},
    savings::SustainabilityRecommender,
};
use serde_json::{json, Value};
use tower::ServiceExt;

fn write_feed(name: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("eco-save-{}-{}.txt", name, std::process::id()));
    let start = NaiveDate::from_ymd_opt(2010, 3, 1).unwrap();
    let mut feed = String::from("Date;Time;Global_active_power\n");
    for d in 0..20 {
        let date = (start + Duration::days(d)).format("%d/%m/%Y").to_string();
        feed.push_str(&format!("{};12:00:00;{}\n", date, 100 + d * 5));
    }
    std::fs::write(&path, feed).unwrap();
    path
}

fn app(feed_path: PathBuf) -> Router {
    let pipeline = AnalysisPipeline::new(
        Arc::new(WindowMeanModel::new(7)),
        PipelineSettings::default(),
        SustainabilityRecommender::default(),
    )
    .unwrap();
    let state = AppState::new(pipeline, MeterFeedReader::default(), feed_path);
    let server = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        request_timeout_secs: 10,
    };
    api::router(state, &server)
}

async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let response = app.oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn healthz_reports_feed_status() {
    let path = write_feed("healthz");
    let (status, body) = send(app(path), Method::GET, "/api/v1/healthz", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let missing = std::env::temp_dir().join("eco-save-does-not-exist.txt");
    let (status, body) = send(app(missing), Method::GET, "/api/v1/healthz", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "degraded");
}

#[tokio::test]
async fn analysis_returns_report_envelope() {
    let path = write_feed("analysis");
    let (status, body) = send(
        app(path),
        Method::GET,
        "/api/v1/analysis?kwh=350&cost=110.25&percentage=10",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let report = &body["data"];
    assert_eq!(report["ingestion"]["days"], 20);
    assert_eq!(report["forecasts"].as_array().unwrap().len(), 12);
    assert_eq!(report["savings"]["interactive"]["mode"], "interactive");
}

#[tokio::test]
async fn analysis_without_feed_is_unavailable() {
    let missing = std::env::temp_dir().join("eco-save-no-feed.txt");
    let (status, body) = send(app(missing), Method::GET, "/api/v1/analysis", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "ServiceUnavailable");
}

#[tokio::test]
async fn lists_action_catalogue() {
    let path = write_feed("actions");
    let (status, body) = send(app(path), Method::GET, "/api/v1/savings/actions", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 4);
    assert_eq!(body["metadata"]["total_count"], 4);
}

#[tokio::test]
async fn interactive_projection() {
    let path = write_feed("interactive");
    let (status, body) = send(
        app(path),
        Method::POST,
        "/api/v1/savings/interactive",
        Some(json!({ "kwh": 350.0, "cost": 110.25, "percentage": 10 })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let yearly = body["data"]["monetary_saving_yearly"].as_f64().unwrap();
    assert!((yearly - 132.3).abs() < 1e-9);
}

#[tokio::test]
async fn zero_invoice_is_insufficient_input() {
    let path = write_feed("zero");
    let (status, body) = send(
        app(path),
        Method::POST,
        "/api/v1/savings/interactive",
        Some(json!({ "kwh": 0.0, "cost": 110.25, "percentage": 500 })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "insufficient input");
}

#[tokio::test]
async fn out_of_range_percentage_is_rejected() {
    let path = write_feed("range");
    let (status, body) = send(
        app(path),
        Method::POST,
        "/api/v1/savings/interactive",
        Some(json!({ "kwh": 350.0, "cost": 110.25, "percentage": 0 })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "ValidationError");
}

#[tokio::test]
async fn action_plan_projection() {
    let path = write_feed("plan");
    let (status, body) = send(
        app(path.clone()),
        Method::POST,
        "/api/v1/savings/action-plan",
        Some(json!({ "kwh": 350.0, "cost": 110.25, "actions": ["led_lighting", "dishwasher_eco"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_percent"], 13);
    assert_eq!(body["data"]["exceeds_consumption"], false);

    let (status, body) = send(
        app(path),
        Method::POST,
        "/api/v1/savings/action-plan",
        Some(json!({ "kwh": 350.0, "cost": 110.25, "actions": ["solar_roof"] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadRequest");
}

#[tokio::test]
async fn unknown_routes_are_not_found() {
    let path = write_feed("unknown");
    let (status, body) = send(app(path.clone()), Method::GET, "/api/v1/forecast", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NotFound");
    assert_eq!(body["message"], "Resource not found: /api/v1/forecast");

    let (status, body) = send(app(path), Method::GET, "/metrics", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NotFound");
}
