//! Running totals carried from one projection month to the next

use super::inputs::CashFlowScenario;

/// State of a savings scenario at a point in time during projection
#[derive(Debug, Clone)]
pub struct ProjectionState {
    /// Current projection month (0 = before the first deposit)
    pub month: u32,

    /// Balance after this month's deposit and interest
    pub balance: f64,

    /// Monthly deposit currently in effect (grows with yearly raises)
    pub monthly_savings: f64,

    /// Sum of all deposits including the initial amount
    pub total_contributions: f64,

    /// Sum of all interest credited
    pub total_interest: f64,
}

impl ProjectionState {
    /// Initialize state from a scenario at projection start
    pub fn from_scenario(scenario: &CashFlowScenario) -> Self {
        Self {
            month: 0,
            balance: scenario.initial_amount,
            monthly_savings: scenario.monthly_savings,
            total_contributions: scenario.initial_amount,
            total_interest: 0.0,
        }
    }

    /// Advance to next month, applying the yearly savings raise when a new
    /// projection year starts (months 13, 25, ...)
    pub fn advance_month(&mut self, scenario: &CashFlowScenario) {
        self.month += 1;

        if let Some(increase) = scenario.annual_savings_increase {
            if self.month > 1 && (self.month - 1) % 12 == 0 {
                self.monthly_savings *= 1.0 + increase / 100.0;
            }
        }
    }

    /// Deposit for the current month, including any one-time extra
    pub fn contribution(&self, scenario: &CashFlowScenario) -> f64 {
        let extra = scenario
            .extra_contribution
            .filter(|extra| extra.month == self.month)
            .map(|extra| extra.amount)
            .unwrap_or(0.0);
        self.monthly_savings + extra
    }

    /// Book a deposit and the interest it earns this month; returns the interest
    pub fn apply_month(&mut self, contribution: f64, monthly_rate: f64) -> f64 {
        self.balance += contribution;
        self.total_contributions += contribution;

        let interest = self.balance * monthly_rate;
        self.balance += interest;
        self.total_interest += interest;
        interest
    }
}
