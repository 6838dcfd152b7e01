//! Hushåll Core - calculation engine for household finance
//!
//! This library provides:
//! - Month-by-month savings projections with inflation-adjusted values
//! - Batch scenario runs
//! - Loan amortization schedules and effective interest rates
//! - Snowball and avalanche debt payoff simulation
//! - Temporal versioning of rates and prices with optimistic concurrency
//! - Swedish tax calculations (ISK, ROT/RUT, K4) and KALP affordability

pub mod error;
pub mod config;
pub mod scope;
pub mod projection;
pub mod scenario;
pub mod loans;
pub mod debt;
pub mod temporal;
pub mod audit;
pub mod tax;

// Re-export commonly used types
pub use error::{ErrorKind, FinanceError, FinanceResult};
pub use config::{EngineLimits, Settings};
pub use scope::{Scope, UserId};
pub use projection::{CashFlowScenario, ProjectionConfig, ProjectionEngine, ScenarioProjection};
pub use scenario::ScenarioRunner;
pub use loans::{AmortizationSchedule, Loan, LoanType};
pub use debt::{DebtFreeOutcome, DebtPayoffStrategy, PayoffConfig, StrategyKind};
pub use temporal::{InMemoryTemporalStore, Temporal, TemporalService, TemporalStore};
