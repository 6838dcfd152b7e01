//! Month-by-month savings projection

mod inputs;
mod state;
mod engine;
mod cashflows;

pub use inputs::{CashFlowScenario, ExtraContribution};
pub use state::ProjectionState;
pub use engine::{ProjectionEngine, ProjectionConfig, real_value};
pub use cashflows::{MonthlyProjection, ScenarioProjection};
