pub mod analysis;
pub mod error;
pub mod health;
pub mod response;
pub mod savings;
pub mod v1;

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::Result;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::{
    config::{Config, ServerConfig},
    ingest::MeterFeedReader,
    ml,
    pipeline::AnalysisPipeline,
};

/// Shared, read-only state. Every request builds its own run from it.
#[derive(Debug, Clone)]
pub struct AppState {
    pub pipeline: Arc<AnalysisPipeline>,
    pub reader: MeterFeedReader,
    pub feed_path: PathBuf,
}

impl AppState {
    pub fn new(pipeline: AnalysisPipeline, reader: MeterFeedReader, feed_path: PathBuf) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            reader,
            feed_path,
        }
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        let oracle = ml::load_oracle(
            cfg.forecast.model,
            cfg.forecast.model_path.as_deref(),
            cfg.forecast.look_back,
        )?;
        let pipeline = AnalysisPipeline::new(oracle, cfg.pipeline_settings(), cfg.recommender()?)?;
        let reader = MeterFeedReader::new(cfg.feed_format())?;
        Ok(Self::new(pipeline, reader, cfg.data.path.clone()))
    }
}

pub fn router(state: AppState, cfg: &ServerConfig) -> Router {
    Router::new()
        .nest("/api/v1", v1::router(state))
        .fallback(v1::not_found)
        .layer(
            ServiceBuilder::new()
                .layer(axum::extract::DefaultBodyLimit::max(64 * 1024))
                .layer(TimeoutLayer::new(Duration::from_secs(cfg.request_timeout_secs))),
        )
        .layer(TraceLayer::new_for_http())
}
