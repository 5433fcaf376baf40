//! Forecast model boundary
//!
//! The pipeline depends only on [`ForecastOracle`]: a deterministic,
//! order-preserving mapping from a batch of scaled windows to one scaled
//! prediction per window. How a model was trained is not this crate's
//! concern; [`models`] holds the runtime implementations shipped with it.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

pub mod models;

pub use models::{LinearWindowModel, PersistenceModel, WindowMeanModel};

/// Sequence regressor consumed as a black box
#[cfg_attr(test, mockall::automock)]
pub trait ForecastOracle: Send + Sync {
    /// One scaled prediction per window, in input order.
    fn predict(&self, batch: &WindowBatch) -> Result<Vec<f64>>;
}

/// Model family selectable from configuration
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ModelType {
    /// Repeats the last value of the window
    Persistence,
    /// Mean of the window
    WindowMean,
    /// Pretrained linear weights over the window
    Linear,
}

/// Descriptive metadata carried by a pretrained artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub model_id: String,
    pub model_type: ModelType,
    pub version: String,
    #[serde(default)]
    pub trained_at: Option<chrono::DateTime<chrono::Utc>>,
    /// Window length the model was trained on
    pub look_back: usize,
    /// Test-set RMSE in consumption units, if known
    #[serde(default)]
    pub validation_rmse: Option<f64>,
}

impl ModelMetadata {
    pub fn builtin(model_type: ModelType, look_back: usize) -> Self {
        Self {
            model_id: model_type.to_string(),
            model_type,
            version: env!("CARGO_PKG_VERSION").to_string(),
            trained_at: None,
            look_back,
            validation_rmse: None,
        }
    }
}

/// Row-major batch of equally sized input windows
#[derive(Debug, Clone, PartialEq)]
pub struct WindowBatch {
    window_len: usize,
    data: Vec<f64>,
}

impl WindowBatch {
    /// Callers guarantee `window_len > 0`; `windows()` cannot chunk by zero.
    pub(crate) fn with_capacity(window_len: usize, windows: usize) -> Self {
        debug_assert!(window_len > 0, "window length must be positive");
        Self {
            window_len,
            data: Vec::with_capacity(window_len * windows),
        }
    }

    /// Build a batch from explicit windows; every window must have `window_len` values.
    pub fn from_windows<W: AsRef<[f64]>>(window_len: usize, windows: &[W]) -> Result<Self> {
        if window_len == 0 {
            anyhow::bail!("Window length must be positive");
        }
        let mut batch = Self::with_capacity(window_len, windows.len());
        for (i, window) in windows.iter().enumerate() {
            let window = window.as_ref();
            if window.len() != window_len {
                anyhow::bail!(
                    "Window {} has {} values, expected {}",
                    i,
                    window.len(),
                    window_len
                );
            }
            batch.data.extend_from_slice(window);
        }
        Ok(batch)
    }

    pub(crate) fn push(&mut self, window: &[f64]) {
        debug_assert_eq!(window.len(), self.window_len);
        self.data.extend_from_slice(window);
    }

    pub fn window_len(&self) -> usize {
        self.window_len
    }

    pub fn len(&self) -> usize {
        self.data.len() / self.window_len
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn windows(&self) -> std::slice::ChunksExact<'_, f64> {
        self.data.chunks_exact(self.window_len)
    }
}

/// Build the oracle named by `model_type`.
///
/// `Linear` needs a JSON artifact at `model_path`; its window length must
/// match `look_back`.
pub fn load_oracle(
    model_type: ModelType,
    model_path: Option<&Path>,
    look_back: usize,
) -> Result<Arc<dyn ForecastOracle>> {
    let oracle: Arc<dyn ForecastOracle> = match model_type {
        ModelType::Persistence => Arc::new(PersistenceModel::new(look_back)),
        ModelType::WindowMean => Arc::new(WindowMeanModel::new(look_back)),
        ModelType::Linear => {
            let path = model_path
                .context("forecast.model_path is required for the linear model")?;
            let model = LinearWindowModel::load(path)?;
            if model.look_back() != look_back {
                anyhow::bail!(
                    "Model {} was trained on windows of {} days, pipeline uses {}",
                    model.metadata.model_id,
                    model.look_back(),
                    look_back
                );
            }
            Arc::new(model)
        }
    };
    tracing::info!(%model_type, look_back, "forecast oracle ready");
    Ok(oracle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_window_batch_from_windows() {
        let batch = WindowBatch::from_windows(2, &[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert_eq!(batch.len(), 2);
        let windows: Vec<&[f64]> = batch.windows().collect();
        assert_eq!(windows, vec![&[1.0, 2.0][..], &[3.0, 4.0][..]]);
    }

    #[test]
    fn test_window_batch_rejects_ragged_windows() {
        let result = WindowBatch::from_windows(2, &[vec![1.0, 2.0], vec![3.0]]);
        assert!(result.is_err());
    }

    #[test]
    fn test_window_batch_rejects_zero_length() {
        let result = WindowBatch::from_windows::<[f64; 0]>(0, &[]);
        assert!(result.is_err());
    }

    #[test]
    fn test_model_type_parsing() {
        assert_eq!(ModelType::from_str("window_mean").unwrap(), ModelType::WindowMean);
        assert_eq!(ModelType::Linear.to_string(), "linear");
        assert!(ModelType::from_str("lstm").is_err());
    }

    #[test]
    fn test_linear_requires_model_path() {
        let result = load_oracle(ModelType::Linear, None, 7);
        assert!(result.is_err());
    }

    #[test]
    fn test_builtin_oracles_load() {
        assert!(load_oracle(ModelType::Persistence, None, 7).is_ok());
        assert!(load_oracle(ModelType::WindowMean, None, 7).is_ok());
    }

    #[test]
    fn test_mock_oracle() {
        let mut oracle = MockForecastOracle::new();
        oracle
            .expect_predict()
            .returning(|batch| Ok(vec![0.5; batch.len()]));

        let batch = WindowBatch::from_windows(3, &[[0.1, 0.2, 0.3]]).unwrap();
        assert_eq!(oracle.predict(&batch).unwrap(), vec![0.5]);
    }
}
