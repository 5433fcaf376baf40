//! Runtime forecast models
//!
//! Inference only. Weights for [`LinearWindowModel`] come from an offline
//! training job and are loaded from a JSON artifact.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::{ForecastOracle, ModelMetadata, ModelType, WindowBatch};

fn check_window_len(expected: usize, batch: &WindowBatch) -> Result<()> {
    if batch.window_len() != expected {
        anyhow::bail!(
            "Window length mismatch: expected {}, got {}",
            expected,
            batch.window_len()
        );
    }
    Ok(())
}

/// Naive baseline: tomorrow looks like the last day of the window
#[derive(Debug, Clone)]
pub struct PersistenceModel {
    pub metadata: ModelMetadata,
}

impl PersistenceModel {
    pub fn new(look_back: usize) -> Self {
        Self {
            metadata: ModelMetadata::builtin(ModelType::Persistence, look_back),
        }
    }
}

impl ForecastOracle for PersistenceModel {
    fn predict(&self, batch: &WindowBatch) -> Result<Vec<f64>> {
        check_window_len(self.metadata.look_back, batch)?;
        Ok(batch
            .windows()
            .map(|w| w.last().copied().unwrap_or_default())
            .collect())
    }
}

/// Mean of the window
#[derive(Debug, Clone)]
pub struct WindowMeanModel {
    pub metadata: ModelMetadata,
}

impl WindowMeanModel {
    pub fn new(look_back: usize) -> Self {
        Self {
            metadata: ModelMetadata::builtin(ModelType::WindowMean, look_back),
        }
    }
}

impl ForecastOracle for WindowMeanModel {
    fn predict(&self, batch: &WindowBatch) -> Result<Vec<f64>> {
        check_window_len(self.metadata.look_back, batch)?;
        Ok(batch
            .windows()
            .map(|w| w.iter().sum::<f64>() / w.len() as f64)
            .collect())
    }
}

/// Pretrained linear regressor over one window.
///
/// Coefficient `i` weights the `i`-th value of the window (oldest first).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearWindowModel {
    pub metadata: ModelMetadata,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl LinearWindowModel {
    pub fn new(coefficients: Vec<f64>, intercept: f64, metadata: ModelMetadata) -> Result<Self> {
        if coefficients.len() != metadata.look_back {
            anyhow::bail!(
                "Coefficient count mismatch: {} coefficients, look_back {}",
                coefficients.len(),
                metadata.look_back
            );
        }
        Ok(Self {
            metadata,
            coefficients,
            intercept,
        })
    }

    /// Read a JSON artifact from disk
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading model artifact {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("parsing model artifact {}", path.display()))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let model: Self = serde_json::from_str(raw)?;
        Self::new(model.coefficients, model.intercept, model.metadata)
    }

    pub fn look_back(&self) -> usize {
        self.coefficients.len()
    }
}

impl ForecastOracle for LinearWindowModel {
    fn predict(&self, batch: &WindowBatch) -> Result<Vec<f64>> {
        check_window_len(self.coefficients.len(), batch)?;
        Ok(batch
            .windows()
            .map(|w| {
                w.iter()
                    .zip(self.coefficients.iter())
                    .map(|(x, c)| x * c)
                    .sum::<f64>()
                    + self.intercept
            })
            .collect())
    }
}
