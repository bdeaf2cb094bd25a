//! Spending forecast with an optional pluggable overdue-risk model.

use std::collections::BTreeMap;

use chrono::Datelike;
use tracing::warn;

use billmind_domain::{
    start_of_month, total_amount, Bill, BillCategory, PredictionResult, Transaction,
};

use crate::{time::Clock, RiskModelError};

/// Inputs handed to an [`OverdueRiskModel`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictionFeatures {
    pub total_spent: f64,
    pub average_bill: f64,
    pub overdue_count: u32,
    pub groceries_spent: f64,
    pub utilities_spent: f64,
    pub entertainment_spent: f64,
    pub transportation_spent: f64,
    /// Local day of month falls in 22..=28.
    pub near_payday: bool,
    pub month: u32,
}

/// Scores the probability that bills go overdue. Only the overdue ratio of a
/// prediction is ever taken from a model.
pub trait OverdueRiskModel: Send + Sync {
    fn score_overdue_risk(&self, features: &PredictionFeatures) -> Result<f64, RiskModelError>;
}

pub struct SpendingPredictor<'a> {
    clock: &'a dyn Clock,
    model: Option<&'a dyn OverdueRiskModel>,
}

impl<'a> SpendingPredictor<'a> {
    pub fn new(clock: &'a dyn Clock) -> Self {
        Self { clock, model: None }
    }

    pub fn with_model(mut self, model: &'a dyn OverdueRiskModel) -> Self {
        self.model = Some(model);
        self
    }

    /// Heuristic forecast, with the overdue ratio replaced by the model score
    /// when a model is present and returns a usable value.
    pub fn predict(&self, bills: &[Bill], _transactions: &[Transaction]) -> PredictionResult {
        let heuristic = self.heuristic(bills);
        let Some(model) = self.model else {
            return heuristic;
        };

        let features = self.features(bills);
        match model.score_overdue_risk(&features) {
            Ok(score) if score.is_finite() && (0.0..=1.0).contains(&score) => {
                heuristic.with_overdue_risk(score)
            }
            Ok(score) => {
                warn!(score, "risk model score out of range, using heuristic");
                heuristic
            }
            Err(err) => {
                warn!(error = %err, "risk model failed, using heuristic");
                heuristic
            }
        }
    }

    pub fn heuristic(&self, bills: &[Bill]) -> PredictionResult {
        let total = total_amount(bills);
        let average = average(total, bills.len());
        let now = self.clock.now();

        let next_period_spending = self
            .monthly_totals(bills)
            .last()
            .copied()
            .unwrap_or(total);

        let overdue = bills.iter().filter(|bill| bill.is_overdue(now)).count();
        let overdue_risk_ratio = if bills.is_empty() {
            0.0
        } else {
            overdue as f64 / bills.len() as f64
        };

        let mut by_category: BTreeMap<BillCategory, f64> = BTreeMap::new();
        for bill in bills {
            *by_category.entry(bill.category).or_default() += bill.amount;
        }
        let savings_potential = by_category
            .values()
            .filter(|sum| **sum > average * 2.0)
            .map(|sum| sum * 0.1)
            .sum();

        PredictionResult {
            next_period_spending,
            overdue_risk_ratio,
            savings_potential,
        }
    }

    pub fn features(&self, bills: &[Bill]) -> PredictionFeatures {
        let now = self.clock.now();
        let today = self.clock.today();
        let total_spent = total_amount(bills);
        let spent = |category: BillCategory| -> f64 {
            bills
                .iter()
                .filter(|bill| bill.category == category)
                .map(|bill| bill.amount)
                .sum()
        };

        PredictionFeatures {
            total_spent,
            average_bill: average(total_spent, bills.len()),
            overdue_count: bills.iter().filter(|bill| bill.is_overdue(now)).count() as u32,
            groceries_spent: spent(BillCategory::Groceries),
            utilities_spent: spent(BillCategory::Utilities),
            entertainment_spent: spent(BillCategory::Entertainment),
            transportation_spent: spent(BillCategory::Transportation),
            near_payday: (22..=28).contains(&today.day()),
            month: today.month(),
        }
    }

    /// Per-month bill totals in the clock's zone, smallest first.
    fn monthly_totals(&self, bills: &[Bill]) -> Vec<f64> {
        let tz = self.clock.time_zone();
        let mut months: BTreeMap<_, f64> = BTreeMap::new();
        for bill in bills {
            let month = start_of_month(bill.due_at.with_timezone(&tz).date_naive());
            *months.entry(month).or_default() += bill.amount;
        }
        let mut totals: Vec<f64> = months.into_values().collect();
        totals.sort_by(|a, b| a.total_cmp(b));
        totals
    }
}

fn average(total: f64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        total / count as f64
    }
}
