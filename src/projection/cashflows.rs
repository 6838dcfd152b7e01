//! Projection output structures

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single month of projection output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyProjection {
    /// 0 = initial state, then 1..=years*12
    pub month: u32,
    pub date: NaiveDate,
    pub balance: f64,
    pub cumulative_contributions: f64,
    pub cumulative_interest: f64,

    // This month only
    pub contribution: f64,
    pub interest: f64,

    /// Inflation-adjusted balance, when inflation is configured
    pub real_value: Option<f64>,
}

/// Complete projection result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioProjection {
    pub scenario_name: String,

    /// Monthly snapshots, month 0 first
    pub monthly_data: Vec<MonthlyProjection>,

    pub final_amount: f64,
    pub total_contributions: f64,
    pub total_interest: f64,

    /// Real value of the final amount, when inflation is configured
    pub real_final_amount: Option<f64>,
}

impl ScenarioProjection {
    pub fn new(scenario_name: impl Into<String>) -> Self {
        Self {
            scenario_name: scenario_name.into(),
            monthly_data: Vec::new(),
            final_amount: 0.0,
            total_contributions: 0.0,
            total_interest: 0.0,
            real_final_amount: None,
        }
    }

    /// Add a snapshot and roll the summary totals forward to it
    pub fn add_snapshot(&mut self, snapshot: MonthlyProjection) {
        self.final_amount = snapshot.balance;
        self.total_contributions = snapshot.cumulative_contributions;
        self.total_interest = snapshot.cumulative_interest;
        self.real_final_amount = snapshot.real_value;
        self.monthly_data.push(snapshot);
    }

    /// Snapshot at the end of projection year `year` (0 = start)
    pub fn snapshot_at_year(&self, year: u32) -> Option<&MonthlyProjection> {
        self.monthly_data.get((year as usize) * 12)
    }

    /// Year-end snapshots including the initial state
    pub fn yearly(&self) -> Vec<&MonthlyProjection> {
        self.monthly_data.iter().step_by(12).collect()
    }

    /// Share of the final amount that came from interest
    pub fn interest_share(&self) -> f64 {
        if self.final_amount.abs() < f64::EPSILON {
            0.0
        } else {
            self.total_interest / self.final_amount
        }
    }
}
