//! Savings scenario input

use serde::{Deserialize, Serialize};

use crate::error::{FinanceError, FinanceResult};

/// One-time deposit made in a specific projection month
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExtraContribution {
    pub amount: f64,
    /// Projection month (1-indexed) the deposit lands in
    pub month: u32,
}

/// A savings scenario to project month by month
///
/// All rates are percentages (`3.0` = 3 %).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowScenario {
    pub name: String,

    /// Balance before the first month
    pub initial_amount: f64,

    /// Deposit made every month (may be zero or negative)
    pub monthly_savings: f64,

    /// Nominal annual interest rate
    pub annual_interest_rate: f64,

    /// Projection horizon in whole years
    pub years: u32,

    /// Annual inflation rate used for the real-value column
    #[serde(default)]
    pub inflation_rate: Option<f64>,

    /// Yearly raise applied to the monthly deposit
    #[serde(default)]
    pub annual_savings_increase: Option<f64>,

    #[serde(default)]
    pub extra_contribution: Option<ExtraContribution>,
}

impl CashFlowScenario {
    /// Create a plain scenario with no inflation, raises or extra deposits
    pub fn new(
        name: impl Into<String>,
        initial_amount: f64,
        monthly_savings: f64,
        annual_interest_rate: f64,
        years: u32,
    ) -> Self {
        Self {
            name: name.into(),
            initial_amount,
            monthly_savings,
            annual_interest_rate,
            years,
            inflation_rate: None,
            annual_savings_increase: None,
            extra_contribution: None,
        }
    }

    pub fn with_inflation(mut self, rate: f64) -> Self {
        self.inflation_rate = Some(rate);
        self
    }

    pub fn with_annual_increase(mut self, rate: f64) -> Self {
        self.annual_savings_increase = Some(rate);
        self
    }

    pub fn with_extra_contribution(mut self, amount: f64, month: u32) -> Self {
        self.extra_contribution = Some(ExtraContribution { amount, month });
        self
    }

    /// Number of monthly steps in the projection
    pub fn total_months(&self) -> u32 {
        self.years.saturating_mul(12)
    }

    /// Monthly interest rate as a decimal
    pub fn monthly_rate(&self) -> f64 {
        self.annual_interest_rate / 100.0 / 12.0
    }

    /// Monthly inflation rate as a decimal, if inflation is configured
    pub fn monthly_inflation(&self) -> Option<f64> {
        self.inflation_rate.map(|rate| rate / 100.0 / 12.0)
    }

    /// Reject malformed scenarios before any month is simulated
    pub fn validate(&self) -> FinanceResult<()> {
        if self.years == 0 {
            return Err(FinanceError::invalid(format!(
                "scenario '{}': years must be greater than zero",
                self.name
            )));
        }

        let finite = [self.initial_amount, self.monthly_savings, self.annual_interest_rate]
            .iter()
            .chain(self.inflation_rate.iter())
            .chain(self.annual_savings_increase.iter())
            .all(|v| v.is_finite());
        if !finite {
            return Err(FinanceError::invalid(format!(
                "scenario '{}': amounts and rates must be finite",
                self.name
            )));
        }

        if self.initial_amount < 0.0 {
            return Err(FinanceError::invalid(format!(
                "scenario '{}': initial amount cannot be negative",
                self.name
            )));
        }

        if self.annual_interest_rate <= -100.0 {
            return Err(FinanceError::invalid(format!(
                "scenario '{}': interest rate must be above -100%",
                self.name
            )));
        }

        if let Some(inflation) = self.inflation_rate {
            // Monthly discount factor (1 - r/12) must stay positive
            if inflation <= -100.0 || inflation >= 1200.0 {
                return Err(FinanceError::invalid(format!(
                    "scenario '{}': inflation rate {} is out of range",
                    self.name, inflation
                )));
            }
        }

        if let Some(increase) = self.annual_savings_increase {
            if increase <= -100.0 {
                return Err(FinanceError::invalid(format!(
                    "scenario '{}': annual savings increase must be above -100%",
                    self.name
                )));
            }
        }

        if let Some(extra) = &self.extra_contribution {
            if !extra.amount.is_finite() {
                return Err(FinanceError::invalid(format!(
                    "scenario '{}': extra contribution must be finite",
                    self.name
                )));
            }
            if extra.month == 0 || extra.month > self.total_months() {
                return Err(FinanceError::invalid(format!(
                    "scenario '{}': extra contribution month {} outside 1..={}",
                    self.name,
                    extra.month,
                    self.total_months()
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_conversions() {
        let scenario = CashFlowScenario::new("base", 0.0, 1000.0, 3.0, 10).with_inflation(2.4);
        assert!((scenario.monthly_rate() - 0.0025).abs() < 1e-12);
        assert!((scenario.monthly_inflation().unwrap() - 0.002).abs() < 1e-12);
        assert_eq!(scenario.total_months(), 120);
    }

    #[test]
    fn test_zero_years_rejected() {
        let scenario = CashFlowScenario::new("empty", 1000.0, 100.0, 3.0, 0);
        assert!(scenario.validate().is_err());
    }

    #[test]
    fn test_extra_month_out_of_range_rejected() {
        let scenario =
            CashFlowScenario::new("bonus", 0.0, 100.0, 3.0, 1).with_extra_contribution(5000.0, 13);
        assert!(scenario.validate().is_err());

        let scenario =
            CashFlowScenario::new("bonus", 0.0, 100.0, 3.0, 1).with_extra_contribution(5000.0, 12);
        assert!(scenario.validate().is_ok());
    }

    #[test]
    fn test_negative_savings_allowed() {
        let scenario = CashFlowScenario::new("withdrawals", 50_000.0, -500.0, 4.0, 5);
        assert!(scenario.validate().is_ok());
    }

    #[test]
    fn test_non_finite_rejected() {
        let scenario = CashFlowScenario::new("nan", 0.0, f64::NAN, 3.0, 5);
        assert!(scenario.validate().is_err());
    }
}
