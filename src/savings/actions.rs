//! Catalogue of household saving actions
//!
//! Each action contributes a fixed number of percentage points. A plan's
//! reduction is the plain sum over the selected actions; nothing caps it at
//! 100, so an oversized catalogue can promise savings above consumption.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{RecommenderError, SavingsProjection};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavingAction {
    pub id: String,
    pub label: String,
    /// Percentage points of consumption this action is expected to save
    pub percent: u32,
}

impl SavingAction {
    pub fn new(id: &str, label: &str, percent: u32) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            percent,
        }
    }
}

/// Ordered mapping from action id to its contribution
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionCatalogue {
    actions: Vec<SavingAction>,
}

impl Default for ActionCatalogue {
    fn default() -> Self {
        Self {
            actions: vec![
                SavingAction::new("led_lighting", "Switch to A-class LED bulbs", 8),
                SavingAction::new("dishwasher_eco", "Run the dishwasher in eco mode", 5),
                SavingAction::new(
                    "thermostat_plus_one",
                    "Set the air conditioner 1°C higher in summer",
                    4,
                ),
                SavingAction::new("unplug_idle", "Unplug devices that are not in use", 3),
            ],
        }
    }
}

impl ActionCatalogue {
    pub fn new(actions: Vec<SavingAction>) -> Result<Self, RecommenderError> {
        let mut seen = BTreeSet::new();
        for action in &actions {
            if !seen.insert(action.id.as_str()) {
                return Err(RecommenderError::DuplicateAction(action.id.clone()));
            }
        }
        Ok(Self { actions })
    }

    pub fn actions(&self) -> &[SavingAction] {
        &self.actions
    }

    pub fn get(&self, id: &str) -> Option<&SavingAction> {
        self.actions.iter().find(|a| a.id == id)
    }

    /// Resolve a selection into catalogue entries, in catalogue order.
    ///
    /// Repeated ids count once; unknown ids are rejected.
    pub fn select<S: AsRef<str>>(&self, ids: &[S]) -> Result<Vec<&SavingAction>, RecommenderError> {
        let mut wanted = BTreeSet::new();
        for id in ids {
            let id = id.as_ref();
            if self.get(id).is_none() {
                return Err(RecommenderError::UnknownAction(id.to_string()));
            }
            wanted.insert(id);
        }
        Ok(self
            .actions
            .iter()
            .filter(|a| wanted.contains(a.id.as_str()))
            .collect())
    }
}

/// Outcome of an action-plan query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionPlan {
    pub selected: Vec<SavingAction>,
    pub total_percent: u32,
    /// Summed reduction is above 100% of consumption
    pub exceeds_consumption: bool,
    /// `None` when nothing was selected
    pub projection: Option<SavingsProjection>,
}
