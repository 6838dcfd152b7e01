//! Month-by-month payoff simulation under a fixed total budget

use chrono::{Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::strategy::{order_loans, DebtFreeOutcome, DebtPayoffStrategy, LoanPayoff, StrategyKind};
use crate::config::EngineLimits;
use crate::error::{FinanceError, FinanceResult};
use crate::loans::{Loan, BALANCE_EPSILON};

/// Configuration for a payoff simulation
#[derive(Debug, Clone)]
pub struct PayoffConfig {
    /// Month 0; payoff month m is dated `start_date + m months`
    pub start_date: NaiveDate,

    /// Simulation ceiling
    pub max_months: u32,
}

impl Default for PayoffConfig {
    fn default() -> Self {
        Self {
            start_date: Utc::now().date_naive(),
            max_months: EngineLimits::default().max_payoff_months,
        }
    }
}

impl PayoffConfig {
    pub fn starting(start_date: NaiveDate) -> Self {
        Self {
            start_date,
            ..Default::default()
        }
    }
}

/// Working state of one loan during the simulation
#[derive(Debug, Clone)]
struct LoanState {
    balance: f64,
    monthly_rate: f64,
    minimum: f64,
    interest_paid: f64,
    payoff_month: Option<u32>,
}

impl LoanState {
    fn from_loan(loan: &Loan) -> Self {
        let repaid = loan.is_paid_off();
        Self {
            balance: if repaid { 0.0 } else { loan.principal },
            monthly_rate: loan.monthly_rate(),
            minimum: if repaid { 0.0 } else { loan.minimum_payment() },
            interest_paid: 0.0,
            payoff_month: if repaid { Some(0) } else { None },
        }
    }

    fn is_open(&self) -> bool {
        self.payoff_month.is_none()
    }

    /// Pay up to `amount`; returns what was actually applied
    fn pay(&mut self, amount: f64) -> f64 {
        let applied = amount.min(self.balance).max(0.0);
        self.balance -= applied;
        applied
    }
}

/// Sum of minimum payments across all open loans
pub fn required_minimum(loans: &[Loan]) -> f64 {
    loans
        .iter()
        .filter(|l| !l.is_paid_off())
        .map(|l| l.minimum_payment())
        .sum()
}

/// Simulate paying off `loans` with `available` per month plus `extra`
///
/// Every open loan gets its minimum payment; the head of the strategy order
/// gets everything else. When a loan is cleared its allocation rolls to the
/// next loan in the same month.
pub fn simulate_payoff(
    kind: StrategyKind,
    loans: &[Loan],
    available: f64,
    extra: f64,
    config: &PayoffConfig,
) -> FinanceResult<DebtPayoffStrategy> {
    if !available.is_finite() || available < 0.0 {
        return Err(FinanceError::invalid("available payment must be a non-negative number"));
    }
    if !extra.is_finite() || extra < 0.0 {
        return Err(FinanceError::invalid("extra payment must be a non-negative number"));
    }
    if loans.iter().any(|l| !l.principal.is_finite() || l.principal < 0.0) {
        return Err(FinanceError::invalid("loan balances must be non-negative numbers"));
    }

    let required = required_minimum(loans);
    if available + 1e-9 < required {
        log::warn!(
            "{} plan rejected: minimum payments {:.2} exceed budget {:.2}",
            kind,
            required,
            available
        );
        return Err(FinanceError::InsufficientBudget { required, available });
    }

    let ordered = order_loans(kind, loans);
    let mut states: Vec<LoanState> = ordered.iter().map(LoanState::from_loan).collect();
    let budget = available + extra;

    log::debug!(
        "Simulating {} payoff of {} loans with budget {:.2}",
        kind,
        ordered.len(),
        budget
    );

    let mut month = 0u32;
    let mut total_paid = 0.0;

    while states.iter().any(LoanState::is_open) {
        if month >= config.max_months {
            log::warn!("{} plan not finished after {} months", kind, config.max_months);
            return Err(FinanceError::Undeterminable { months: config.max_months });
        }
        month += 1;

        let balance_before: f64 = states.iter().map(|s| s.balance).sum();

        for state in states.iter_mut().filter(|s| s.is_open()) {
            let interest = state.balance * state.monthly_rate;
            state.balance += interest;
            state.interest_paid += interest;
        }

        let target = states.iter().position(LoanState::is_open);
        let mut remaining = budget;

        for (i, state) in states.iter_mut().enumerate() {
            if Some(i) != target && state.is_open() {
                let minimum = state.minimum.min(remaining);
                remaining -= state.pay(minimum);
            }
        }

        // Target first, then any leftover cascades down the order
        if let Some(start) = target {
            for state in states[start..].iter_mut().filter(|s| s.is_open()) {
                if remaining <= 0.0 {
                    break;
                }
                remaining -= state.pay(remaining);
            }
        }

        total_paid += budget - remaining;

        for state in states.iter_mut().filter(|s| s.is_open()) {
            if state.balance <= BALANCE_EPSILON {
                state.balance = 0.0;
                state.payoff_month = Some(month);
            }
        }

        let balance_after: f64 = states.iter().map(|s| s.balance).sum();
        if balance_after > 0.0 && balance_after >= balance_before {
            log::warn!(
                "{} plan stalled in month {}: balance {:.2} -> {:.2}",
                kind,
                month,
                balance_before,
                balance_after
            );
            return Err(FinanceError::Undeterminable { months: month });
        }
    }

    let date_for = |m: u32| {
        config
            .start_date
            .checked_add_months(Months::new(m))
            .ok_or_else(|| FinanceError::invalid("payoff runs past the supported calendar range"))
    };

    let mut payoffs = Vec::with_capacity(ordered.len());
    for (loan, state) in ordered.iter().zip(&states) {
        let payoff_month = state.payoff_month.unwrap_or(month);
        payoffs.push(LoanPayoff {
            loan_id: loan.loan_id,
            name: loan.name.clone(),
            starting_balance: loan.principal,
            interest_rate: loan.interest_rate,
            minimum_payment: state.minimum,
            payoff_month,
            payoff_date: date_for(payoff_month)?,
            interest_paid: state.interest_paid,
        });
    }

    Ok(DebtPayoffStrategy {
        kind,
        monthly_budget: budget,
        total_interest: payoffs.iter().map(|p| p.interest_paid).sum(),
        loans: payoffs,
        total_months: month,
        total_paid,
        debt_free_date: date_for(month)?,
    })
}

/// When the loan set reaches zero total balance under `kind`
///
/// Budget and convergence problems come back as outcomes, not errors.
pub fn calculate_debt_free_date(
    kind: StrategyKind,
    loans: &[Loan],
    available: f64,
    config: &PayoffConfig,
) -> FinanceResult<DebtFreeOutcome> {
    match simulate_payoff(kind, loans, available, 0.0, config) {
        Ok(plan) => Ok(DebtFreeOutcome::DebtFree(plan.debt_free_date)),
        Err(FinanceError::InsufficientBudget { required, available }) => {
            Ok(DebtFreeOutcome::InsufficientBudget { required, available })
        }
        Err(FinanceError::Undeterminable { months }) => Ok(DebtFreeOutcome::Undeterminable {
            months_simulated: months,
        }),
        Err(e) => Err(e),
    }
}

/// Both strategies run against the same loans and budget
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyComparison {
    pub snowball: DebtPayoffStrategy,
    pub avalanche: DebtPayoffStrategy,

    /// Interest avoided by choosing avalanche over snowball
    pub interest_saved: f64,

    /// Months avalanche finishes before snowball (negative if later)
    pub months_saved: i64,

    /// Avalanche when it saves at least a cent, otherwise snowball
    pub recommended: StrategyKind,
}

pub fn compare_strategies(
    loans: &[Loan],
    available: f64,
    extra: f64,
    config: &PayoffConfig,
) -> FinanceResult<StrategyComparison> {
    let (snowball, avalanche) = rayon::join(
        || simulate_payoff(StrategyKind::Snowball, loans, available, extra, config),
        || simulate_payoff(StrategyKind::Avalanche, loans, available, extra, config),
    );
    let (snowball, avalanche) = (snowball?, avalanche?);

    let interest_saved = snowball.total_interest - avalanche.total_interest;
    let months_saved = snowball.total_months as i64 - avalanche.total_months as i64;
    let recommended = if interest_saved >= 0.01 {
        StrategyKind::Avalanche
    } else {
        StrategyKind::Snowball
    };

    Ok(StrategyComparison {
        snowball,
        avalanche,
        interest_saved,
        months_saved,
        recommended,
    })
}
