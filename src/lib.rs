//! Eco-Save: household consumption forecasting, anomaly detection and
//! savings projection.
//!
//! The [`pipeline::AnalysisPipeline`] turns a raw meter feed into an
//! [`pipeline::AnalysisReport`]; the [`savings`] recommender projects what a
//! consumption reduction is worth. The CLI and the HTTP [`api`] are thin
//! callers of both.

pub mod api;
pub mod config;
pub mod domain;
pub mod forecast;
pub mod ingest;
pub mod ml;
pub mod pipeline;
pub mod savings;
pub mod telemetry;
