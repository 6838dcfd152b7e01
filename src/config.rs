//! Engine limits and tax parameters
//!
//! Everything has a `Default` so library users can ignore configuration
//! entirely; the CLI can override values from a JSON settings file.

use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::FinanceResult;
use crate::tax::TaxParameters;

/// Hard iteration ceilings for every month-stepping loop
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineLimits {
    /// Longest savings projection accepted (months)
    pub max_projection_months: u32,

    /// Longest debt payoff simulation before giving up (months)
    pub max_payoff_months: u32,

    /// Longest single-loan amortization schedule (periods)
    pub max_amortization_periods: u32,
}

impl Default for EngineLimits {
    fn default() -> Self {
        Self {
            max_projection_months: 1200, // 100 years
            max_payoff_months: 1200,
            max_amortization_periods: 1200,
        }
    }
}

/// Settings file contents
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub limits: EngineLimits,
    pub tax: TaxParameters,
}

impl Settings {
    /// Load settings from a JSON file; missing keys fall back to defaults
    pub fn load(path: &Path) -> FinanceResult<Self> {
        let file = File::open(path)?;
        let settings: Settings = serde_json::from_reader(file)?;
        log::debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Load settings if a path was given, otherwise use defaults
    pub fn load_or_default(path: Option<&Path>) -> FinanceResult<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }
}
