//! Core projection engine for monthly savings projections

use chrono::{Months, NaiveDate, Utc};

use super::cashflows::{MonthlyProjection, ScenarioProjection};
use super::inputs::CashFlowScenario;
use super::state::ProjectionState;
use crate::config::EngineLimits;
use crate::error::{FinanceError, FinanceResult};

/// Configuration for a projection run
#[derive(Debug, Clone)]
pub struct ProjectionConfig {
    /// Date of month 0; month m is dated `start_date + m months`
    pub start_date: NaiveDate,

    /// Longest horizon accepted
    pub max_months: u32,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            start_date: Utc::now().date_naive(),
            max_months: EngineLimits::default().max_projection_months,
        }
    }
}

impl ProjectionConfig {
    pub fn starting(start_date: NaiveDate) -> Self {
        Self {
            start_date,
            ..Default::default()
        }
    }
}

/// Main projection engine
#[derive(Debug, Clone, Default)]
pub struct ProjectionEngine {
    config: ProjectionConfig,
}

impl ProjectionEngine {
    pub fn new(config: ProjectionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProjectionConfig {
        &self.config
    }

    /// Run projection for a single scenario
    ///
    /// Returns `years * 12 + 1` snapshots. Nothing is computed for a scenario
    /// that fails validation.
    pub fn project(&self, scenario: &CashFlowScenario) -> FinanceResult<ScenarioProjection> {
        scenario.validate()?;

        let total_months = scenario.total_months();
        if total_months > self.config.max_months {
            log::warn!(
                "Scenario '{}' spans {} months, ceiling is {}",
                scenario.name,
                total_months,
                self.config.max_months
            );
            return Err(FinanceError::Undeterminable {
                months: self.config.max_months,
            });
        }

        // Dates are checked up front so a failure can't leave a half-built result
        if self.date_for(total_months).is_none() {
            return Err(FinanceError::invalid(format!(
                "scenario '{}' runs past the supported calendar range",
                scenario.name
            )));
        }

        log::debug!(
            "Projecting '{}' over {} months from {}",
            scenario.name,
            total_months,
            self.config.start_date
        );

        let monthly_rate = scenario.monthly_rate();
        let inflation = scenario.monthly_inflation();

        let mut result = ScenarioProjection::new(scenario.name.clone());
        let mut state = ProjectionState::from_scenario(scenario);

        result.add_snapshot(self.snapshot(&state, 0.0, 0.0, inflation)?);

        for _month in 1..=total_months {
            state.advance_month(scenario);

            let contribution = state.contribution(scenario);
            let interest = state.apply_month(contribution, monthly_rate);

            result.add_snapshot(self.snapshot(&state, contribution, interest, inflation)?);
        }

        Ok(result)
    }

    fn snapshot(
        &self,
        state: &ProjectionState,
        contribution: f64,
        interest: f64,
        monthly_inflation: Option<f64>,
    ) -> FinanceResult<MonthlyProjection> {
        let date = self.date_for(state.month).ok_or_else(|| {
            FinanceError::invalid(format!("month {} is outside the calendar range", state.month))
        })?;

        Ok(MonthlyProjection {
            month: state.month,
            date,
            balance: state.balance,
            cumulative_contributions: state.total_contributions,
            cumulative_interest: state.total_interest,
            contribution,
            interest,
            real_value: monthly_inflation.map(|r| real_value(state.balance, r, state.month)),
        })
    }

    fn date_for(&self, month: u32) -> Option<NaiveDate> {
        self.config.start_date.checked_add_months(Months::new(month))
    }
}

/// Balance discounted by monthly inflation compounded from scenario start
pub fn real_value(balance: f64, monthly_inflation: f64, month: u32) -> f64 {
    balance * (1.0 - monthly_inflation).powi(month as i32)
}
