//! Debt payoff strategies (snowball and avalanche)
//!
//! Loans are ordered by a strategy, then paid down month by month under one
//! fixed budget: minimums everywhere, everything else to the head of the
//! order, freed payments rolling onto the next loan.

mod strategy;
mod simulation;
mod extra_payment;

pub use strategy::{
    order_loans, DebtFreeOutcome, DebtPayoffStrategy, LoanPayoff, StrategyKind,
};
pub use simulation::{
    calculate_debt_free_date, compare_strategies, required_minimum, simulate_payoff,
    PayoffConfig, StrategyComparison,
};
pub use extra_payment::{analyze_extra_payment, ExtraPaymentAnalysis, ScheduleSummary};
