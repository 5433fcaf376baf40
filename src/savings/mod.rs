//! Sustainability recommender
//!
//! Converts a hypothetical consumption reduction into avoided CO2, tree and
//! car equivalents and, when a tariff is known, money saved. Three entry
//! modes exist (baseline goal, interactive percentage, action plan); all of
//! them funnel through [`derive_impact`] so the formulas cannot drift apart.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod actions;
pub mod recommender;

pub use actions::{ActionCatalogue, ActionPlan, SavingAction};
pub use recommender::{InvoiceInput, SustainabilityRecommender};

/// Average grid emissions per kWh generated (kg CO2)
pub const CO2_PER_KWH: f64 = 0.475;
/// CO2 absorbed by one mature tree in a year (kg)
pub const CO2_PER_TREE_YEAR: f64 = 22.0;
/// CO2 emitted by an average passenger car per km (kg)
pub const CO2_PER_CAR_KM: f64 = 0.18;

/// Emission factors used for every projection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmissionFactors {
    pub co2_per_kwh: f64,
    pub co2_per_tree_year: f64,
    pub co2_per_car_km: f64,
}

impl Default for EmissionFactors {
    fn default() -> Self {
        Self {
            co2_per_kwh: CO2_PER_KWH,
            co2_per_tree_year: CO2_PER_TREE_YEAR,
            co2_per_car_km: CO2_PER_CAR_KM,
        }
    }
}

impl EmissionFactors {
    pub fn impact(&self, kwh_saved: f64) -> EnvironmentalImpact {
        derive_impact(
            kwh_saved,
            self.co2_per_kwh,
            self.co2_per_tree_year,
            self.co2_per_car_km,
        )
    }
}

/// Environmental equivalents of a saved amount of energy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentalImpact {
    pub kwh_saved: f64,
    /// kg CO2 avoided
    pub co2_saved: f64,
    /// Trees absorbing the same CO2 over one month
    pub tree_equivalent: f64,
    /// km driven by an average car emitting the same CO2
    pub car_km_equivalent: f64,
}

/// The single derivation shared by every recommender mode.
///
/// Non-positive tree or car factors yield a zero equivalent instead of a
/// division by zero.
pub fn derive_impact(
    kwh: f64,
    co2_factor: f64,
    tree_year_factor: f64,
    car_km_factor: f64,
) -> EnvironmentalImpact {
    let co2_saved = kwh * co2_factor;
    let tree_equivalent = if tree_year_factor > 0.0 {
        co2_saved / (tree_year_factor / 12.0)
    } else {
        0.0
    };
    let car_km_equivalent = if car_km_factor > 0.0 {
        co2_saved / car_km_factor
    } else {
        0.0
    };

    EnvironmentalImpact {
        kwh_saved: kwh,
        co2_saved,
        tree_equivalent,
        car_km_equivalent,
    }
}

/// Which recommender entry point produced a projection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionMode {
    BaselineGoal,
    Interactive,
    ActionPlan,
}

/// Savings projection, recomputed on every query and never stored
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SavingsProjection {
    pub mode: ProjectionMode,
    /// Reduction applied, in percent of the base consumption
    pub percentage: f64,
    pub kwh_saved: f64,
    pub co2_saved: f64,
    pub tree_equivalent: f64,
    pub car_km_equivalent: f64,
    /// Cost per kWh, when a bill amount was supplied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monetary_saving_monthly: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monetary_saving_yearly: Option<f64>,
}

impl SavingsProjection {
    pub(crate) fn new(
        mode: ProjectionMode,
        percentage: f64,
        impact: EnvironmentalImpact,
        unit_price: Option<f64>,
    ) -> Self {
        let monthly = unit_price.map(|price| impact.kwh_saved * price);
        Self {
            mode,
            percentage,
            kwh_saved: impact.kwh_saved,
            co2_saved: impact.co2_saved,
            tree_equivalent: impact.tree_equivalent,
            car_km_equivalent: impact.car_km_equivalent,
            unit_price,
            monetary_saving_monthly: monthly,
            monetary_saving_yearly: monthly.map(|m| m * 12.0),
        }
    }
}

/// Recoverable recommender failures. No projection is produced.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecommenderError {
    #[error("insufficient input: consumption ({kwh}) and cost ({cost}) must both be positive")]
    InsufficientInput { kwh: f64, cost: f64 },

    #[error("percentage {value} outside {min}..={max}")]
    PercentageOutOfRange { value: u32, min: u32, max: u32 },

    #[error("unknown saving action: {0}")]
    UnknownAction(String),

    #[error("duplicate saving action in catalogue: {0}")]
    DuplicateAction(String),
}
