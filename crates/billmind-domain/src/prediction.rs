//! Ephemeral spending forecast values.

use serde::{Deserialize, Serialize};

/// Recomputed on demand; never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub next_period_spending: f64,
    /// Share of bills that are overdue, in `[0, 1]`.
    pub overdue_risk_ratio: f64,
    pub savings_potential: f64,
}

impl PredictionResult {
    pub fn with_overdue_risk(self, overdue_risk_ratio: f64) -> Self {
        Self {
            overdue_risk_ratio,
            ..self
        }
    }
}
