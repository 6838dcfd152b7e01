//! Scenario runner for batch projections
//!
//! Holds one projection config and runs many savings scenarios against it,
//! in parallel when given a batch.

use rayon::prelude::*;

use crate::error::FinanceResult;
use crate::projection::{CashFlowScenario, ProjectionConfig, ProjectionEngine, ScenarioProjection};

/// Pre-configured runner for comparing savings scenarios
///
/// # Example
/// ```ignore
/// let runner = ScenarioRunner::new();
///
/// let scenarios: Vec<_> = [2.0, 4.0, 6.0]
///     .iter()
///     .map(|&rate| CashFlowScenario::new(format!("{rate}%"), 0.0, 1000.0, rate, 20))
///     .collect();
/// let results = runner.run_batch(&scenarios);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScenarioRunner {
    engine: ProjectionEngine,
}

impl ScenarioRunner {
    /// Create runner with default config (starts today)
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ProjectionConfig) -> Self {
        Self {
            engine: ProjectionEngine::new(config),
        }
    }

    /// Run a single scenario
    pub fn run(&self, scenario: &CashFlowScenario) -> FinanceResult<ScenarioProjection> {
        self.engine.project(scenario)
    }

    /// Run many scenarios in parallel; results keep the input order and a
    /// rejected scenario does not affect the others
    pub fn run_batch(&self, scenarios: &[CashFlowScenario]) -> Vec<FinanceResult<ScenarioProjection>> {
        scenarios
            .par_iter()
            .map(|scenario| self.engine.project(scenario))
            .collect()
    }

    /// Project every scenario and return the one ending with the highest balance
    pub fn best(&self, scenarios: &[CashFlowScenario]) -> FinanceResult<Option<ScenarioProjection>> {
        let results = self.run_batch(scenarios).into_iter().collect::<FinanceResult<Vec<_>>>()?;
        Ok(results
            .into_iter()
            .max_by(|a, b| a.final_amount.total_cmp(&b.final_amount)))
    }

    pub fn config(&self) -> &ProjectionConfig {
        self.engine.config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn runner() -> ScenarioRunner {
        ScenarioRunner::with_config(ProjectionConfig::starting(
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        ))
    }

    #[test]
    fn test_scenario_runner_batch() {
        let scenarios: Vec<_> = [2.0, 4.0, 6.0]
            .iter()
            .map(|&rate| CashFlowScenario::new(format!("{}%", rate), 10_000.0, 1_000.0, rate, 10))
            .collect();

        let results = runner().run_batch(&scenarios);
        assert_eq!(results.len(), 3);

        let finals: Vec<f64> = results.iter().map(|r| r.as_ref().unwrap().final_amount).collect();
        // Higher rate should result in higher final amount
        assert!(finals[2] > finals[1] && finals[1] > finals[0]);
        assert_eq!(results[0].as_ref().unwrap().scenario_name, "2%");
    }

    #[test]
    fn test_invalid_scenario_isolated_in_batch() {
        let scenarios = vec![
            CashFlowScenario::new("ok", 0.0, 100.0, 3.0, 1),
            CashFlowScenario::new("bad", 0.0, 100.0, 3.0, 0),
        ];

        let results = runner().run_batch(&scenarios);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
    }

    #[test]
    fn test_best_scenario() {
        let scenarios = vec![
            CashFlowScenario::new("low", 0.0, 500.0, 3.0, 5),
            CashFlowScenario::new("high", 0.0, 1500.0, 3.0, 5),
        ];

        let best = runner().best(&scenarios).unwrap().unwrap();
        assert_eq!(best.scenario_name, "high");
        assert!(runner().best(&[]).unwrap().is_none());
    }
}
