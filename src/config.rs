use anyhow::{Context, Result};
use figment::{providers::{Env, Format, Toml}, Figment};
use serde::Deserialize;
use std::{net::SocketAddr, path::PathBuf};

use crate::{
    ingest::FeedFormat,
    ml::ModelType,
    pipeline::{AnomalyThreshold, PipelineSettings},
    savings::{ActionCatalogue, EmissionFactors, SavingAction, SustainabilityRecommender},
};

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub data: DataConfig,
    pub forecast: ForecastConfig,
    pub anomaly: AnomalyConfig,
    pub savings: SavingsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
}
impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    /// Meter feed analysed by `analyze` and `GET /analysis`
    pub path: PathBuf,
    pub delimiter: char,
    pub missing_token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForecastConfig {
    pub look_back: usize,
    pub model: ModelType,
    pub model_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnomalyConfig {
    /// Typical forecast RMSE the threshold is derived from
    pub typical_rmse_kwh: f64,
    pub rmse_multiplier: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SavingsConfig {
    pub target_percent: f64,
    pub recent_window_days: usize,
    pub trend_factor: f64,
    pub co2_per_kwh: f64,
    pub co2_per_tree_year: f64,
    pub co2_per_car_km: f64,
    #[serde(default)]
    pub actions: Vec<SavingAction>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::from_figment(
            Figment::new()
                .merge(Toml::file(DEFAULT_CONFIG_PATH))
                .merge(Env::prefixed("ECOSAVE__").split("__")),
        )
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let cfg: Self = figment.extract().context("invalid configuration")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.forecast.look_back == 0 {
            anyhow::bail!("forecast.look_back must be at least 1");
        }
        if self.forecast.model == ModelType::Linear && self.forecast.model_path.is_none() {
            anyhow::bail!("forecast.model_path is required when forecast.model = \"linear\"");
        }
        if !(self.anomaly.typical_rmse_kwh >= 0.0 && self.anomaly.rmse_multiplier > 0.0) {
            anyhow::bail!("anomaly.typical_rmse_kwh and anomaly.rmse_multiplier must be positive");
        }
        if !(0.0..=100.0).contains(&self.savings.target_percent) {
            anyhow::bail!("savings.target_percent must lie in 0..=100");
        }
        self.pipeline_settings().validate()?;
        Ok(())
    }

    pub fn threshold(&self) -> AnomalyThreshold {
        AnomalyThreshold::from_rmse(self.anomaly.typical_rmse_kwh, self.anomaly.rmse_multiplier)
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            look_back: self.forecast.look_back,
            threshold: self.threshold(),
            recent_window_days: self.savings.recent_window_days,
            trend_factor: self.savings.trend_factor,
        }
    }

    pub fn feed_format(&self) -> FeedFormat {
        FeedFormat {
            delimiter: self.data.delimiter,
            missing_token: self.data.missing_token.clone(),
        }
    }

    pub fn emission_factors(&self) -> EmissionFactors {
        EmissionFactors {
            co2_per_kwh: self.savings.co2_per_kwh,
            co2_per_tree_year: self.savings.co2_per_tree_year,
            co2_per_car_km: self.savings.co2_per_car_km,
        }
    }

    /// Recommender built from the configured factors; an empty action list
    /// falls back to the built-in catalogue.
    pub fn recommender(&self) -> Result<SustainabilityRecommender> {
        let catalogue = if self.savings.actions.is_empty() {
            ActionCatalogue::default()
        } else {
            ActionCatalogue::new(self.savings.actions.clone())?
        };
        Ok(SustainabilityRecommender::new(
            self.emission_factors(),
            catalogue,
            self.savings.target_percent,
            self.savings.recent_window_days,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = r#"
        [server]
        host = "127.0.0.1"
        port = 8080
        request_timeout_secs = 30

        [data]
        path = "data/household_power_consumption.txt"
        delimiter = ";"
        missing_token = "?"

        [forecast]
        look_back = 7
        model = "persistence"

        [anomaly]
        typical_rmse_kwh = 405.0
        rmse_multiplier = 2.5

        [savings]
        target_percent = 10.0
        recent_window_days = 30
        trend_factor = 1.1
        co2_per_kwh = 0.475
        co2_per_tree_year = 22.0
        co2_per_car_km = 0.18
    "#;

    fn load(extra: &str) -> Result<Config> {
        Config::from_figment(
            Figment::new()
                .merge(Toml::string(BASE))
                .merge(Toml::string(extra)),
        )
    }

    #[test]
    fn test_defaults_reproduce_reference_policy() {
        let cfg = load("").unwrap();
        assert_eq!(cfg.threshold().value(), 1012.5);
        assert_eq!(cfg.feed_format(), FeedFormat::default());
        assert_eq!(cfg.pipeline_settings(), PipelineSettings::default());
        assert_eq!(cfg.recommender().unwrap().catalogue(), &ActionCatalogue::default());
    }

    #[test]
    fn test_linear_model_requires_path() {
        let err = load("[forecast]\nmodel = \"linear\"").unwrap_err();
        assert!(err.to_string().contains("model_path"));
    }

    #[test]
    fn test_zero_look_back_rejected() {
        assert!(load("[forecast]\nlook_back = 0").is_err());
    }

    #[test]
    fn test_custom_action_catalogue() {
        let cfg = load(
            r#"
            [[savings.actions]]
            id = "heat_pump"
            label = "Replace the boiler"
            percent = 30
            "#,
        )
        .unwrap();
        let recommender = cfg.recommender().unwrap();
        assert_eq!(recommender.catalogue().actions().len(), 1);
        assert_eq!(recommender.catalogue().get("heat_pump").unwrap().percent, 30);
    }

    #[test]
    fn test_socket_addr() {
        let cfg = load("").unwrap();
        assert_eq!(cfg.server.socket_addr().unwrap().port(), 8080);
    }
}
