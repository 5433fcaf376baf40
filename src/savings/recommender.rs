use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    ActionCatalogue, ActionPlan, EmissionFactors, ProjectionMode, RecommenderError,
    SavingsProjection,
};
use crate::pipeline::trend::{tail_mean, DEFAULT_RECENT_WINDOW_DAYS};

/// Smallest percentage accepted by the interactive mode
pub const MIN_PERCENTAGE: u32 = 1;
/// Largest percentage accepted by the interactive mode
pub const MAX_PERCENTAGE: u32 = 100;
/// Reduction target used for the baseline goal
pub const DEFAULT_TARGET_PERCENT: f64 = 10.0;
/// Days in the projected month
pub const DAYS_PER_MONTH: f64 = 30.0;

/// Monthly invoice figures entered by a user
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InvoiceInput {
    /// Monthly consumption (kWh)
    pub kwh: f64,
    /// Monthly bill amount
    pub cost: f64,
}

impl InvoiceInput {
    pub fn new(kwh: f64, cost: f64) -> Self {
        Self { kwh, cost }
    }

    /// Cost per kWh. Both figures must be strictly positive.
    pub fn unit_price(&self) -> Result<f64, RecommenderError> {
        let valid = self.kwh.is_finite() && self.cost.is_finite() && self.kwh > 0.0 && self.cost > 0.0;
        if !valid {
            return Err(RecommenderError::InsufficientInput {
                kwh: self.kwh,
                cost: self.cost,
            });
        }
        Ok(self.cost / self.kwh)
    }
}

/// Stateless projector of consumption reductions
#[derive(Debug, Clone)]
pub struct SustainabilityRecommender {
    factors: EmissionFactors,
    catalogue: ActionCatalogue,
    target_percent: f64,
    recent_window_days: usize,
}

impl Default for SustainabilityRecommender {
    fn default() -> Self {
        Self {
            factors: EmissionFactors::default(),
            catalogue: ActionCatalogue::default(),
            target_percent: DEFAULT_TARGET_PERCENT,
            recent_window_days: DEFAULT_RECENT_WINDOW_DAYS,
        }
    }
}

impl SustainabilityRecommender {
    pub fn new(
        factors: EmissionFactors,
        catalogue: ActionCatalogue,
        target_percent: f64,
        recent_window_days: usize,
    ) -> Self {
        Self {
            factors,
            catalogue,
            target_percent,
            recent_window_days,
        }
    }

    pub fn factors(&self) -> &EmissionFactors {
        &self.factors
    }

    pub fn catalogue(&self) -> &ActionCatalogue {
        &self.catalogue
    }

    pub fn target_percent(&self) -> f64 {
        self.target_percent
    }

    /// Savings from cutting the recent daily mean by the target percentage
    /// over a 30-day month.
    ///
    /// No tariff is known here, so the money fields stay empty.
    pub fn baseline_goal(&self, daily_actuals: &[f64]) -> Option<SavingsProjection> {
        let recent_mean = tail_mean(daily_actuals, self.recent_window_days)?;
        let kwh_saved = recent_mean * (self.target_percent / 100.0) * DAYS_PER_MONTH;

        debug!(recent_mean, kwh_saved, "Baseline goal projected");
        Some(SavingsProjection::new(
            ProjectionMode::BaselineGoal,
            self.target_percent,
            self.factors.impact(kwh_saved),
            None,
        ))
    }

    /// Savings for a user-chosen percentage of their monthly invoice
    pub fn interactive(
        &self,
        invoice: &InvoiceInput,
        percentage: u32,
    ) -> Result<SavingsProjection, RecommenderError> {
        let unit_price = invoice.unit_price()?;
        if !(MIN_PERCENTAGE..=MAX_PERCENTAGE).contains(&percentage) {
            return Err(RecommenderError::PercentageOutOfRange {
                value: percentage,
                min: MIN_PERCENTAGE,
                max: MAX_PERCENTAGE,
            });
        }

        Ok(self.project(ProjectionMode::Interactive, invoice, unit_price, percentage))
    }

    /// Savings for a set of catalogue actions, their percentages summed
    pub fn action_plan<S: AsRef<str>>(
        &self,
        invoice: &InvoiceInput,
        action_ids: &[S],
    ) -> Result<ActionPlan, RecommenderError> {
        let unit_price = invoice.unit_price()?;
        let selected = self.catalogue.select(action_ids)?;
        let total_percent: u32 = selected.iter().map(|a| a.percent).sum();

        let projection = (!selected.is_empty())
            .then(|| self.project(ProjectionMode::ActionPlan, invoice, unit_price, total_percent));

        Ok(ActionPlan {
            selected: selected.into_iter().cloned().collect(),
            total_percent,
            exceeds_consumption: total_percent > MAX_PERCENTAGE,
            projection,
        })
    }

    fn project(
        &self,
        mode: ProjectionMode,
        invoice: &InvoiceInput,
        unit_price: f64,
        percentage: u32,
    ) -> SavingsProjection {
        let percentage = f64::from(percentage);
        let kwh_saved = invoice.kwh * percentage / 100.0;
        SavingsProjection::new(mode, percentage, self.factors.impact(kwh_saved), Some(unit_price))
    }
}
