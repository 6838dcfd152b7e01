//! Payoff orderings and their results

use std::cmp::Ordering;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::loans::Loan;

/// Policy deciding which loan receives the freed-up budget first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrategyKind {
    /// Smallest balance first
    Snowball,
    /// Highest interest rate first
    Avalanche,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::Snowball => write!(f, "Snowball"),
            StrategyKind::Avalanche => write!(f, "Avalanche"),
        }
    }
}

impl std::str::FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "snowball" => Ok(StrategyKind::Snowball),
            "avalanche" => Ok(StrategyKind::Avalanche),
            other => Err(format!("Unknown strategy: {}", other)),
        }
    }
}

impl StrategyKind {
    /// Comparator implementing this strategy's order and tie-breaks
    ///
    /// Snowball: balance asc, rate desc, id. Avalanche: rate desc, balance asc, id.
    pub fn compare(&self, a: &Loan, b: &Loan) -> Ordering {
        let by_balance = a.principal.total_cmp(&b.principal);
        let by_rate_desc = b.interest_rate.total_cmp(&a.interest_rate);
        let by_id = a.loan_id.cmp(&b.loan_id);

        match self {
            StrategyKind::Snowball => by_balance.then(by_rate_desc).then(by_id),
            StrategyKind::Avalanche => by_rate_desc.then(by_balance).then(by_id),
        }
    }
}

/// Loans sorted into payoff order for the given strategy
pub fn order_loans(kind: StrategyKind, loans: &[Loan]) -> Vec<Loan> {
    let mut ordered = loans.to_vec();
    ordered.sort_by(|a, b| kind.compare(a, b));
    ordered
}

/// Per-loan outcome of a payoff simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanPayoff {
    pub loan_id: u32,
    pub name: String,
    pub starting_balance: f64,
    pub interest_rate: f64,
    pub minimum_payment: f64,

    /// Month (1-indexed) the balance reached zero; 0 for loans already repaid
    pub payoff_month: u32,
    pub payoff_date: NaiveDate,
    pub interest_paid: f64,
}

/// Simulated payoff plan; `loans` is in the strategy's target order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebtPayoffStrategy {
    pub kind: StrategyKind,
    pub monthly_budget: f64,
    pub loans: Vec<LoanPayoff>,
    pub total_months: u32,
    pub total_interest: f64,
    pub total_paid: f64,
    pub debt_free_date: NaiveDate,
}

impl DebtPayoffStrategy {
    /// Loan ids in target order
    pub fn order(&self) -> Vec<u32> {
        self.loans.iter().map(|l| l.loan_id).collect()
    }

    pub fn payoff_for(&self, loan_id: u32) -> Option<&LoanPayoff> {
        self.loans.iter().find(|l| l.loan_id == loan_id)
    }
}

/// Result of asking when the household becomes debt free
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DebtFreeOutcome {
    DebtFree(NaiveDate),
    /// Minimum payments exceed the budget; nothing was simulated
    InsufficientBudget { required: f64, available: f64 },
    /// The balance stopped falling or the month ceiling was reached
    Undeterminable { months_simulated: u32 },
}

impl DebtFreeOutcome {
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            DebtFreeOutcome::DebtFree(date) => Some(*date),
            _ => None,
        }
    }
}
