//! ISK/KF schablon tax

use serde::{Deserialize, Serialize};

use super::check_amount;
use crate::error::FinanceResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IskParameters {
    /// Statslåneräntan on 30 November of the previous year, percent
    pub government_borrowing_rate: f64,
    /// Added to the borrowing rate, percentage points
    pub surcharge: f64,
    /// Lowest schablon rate, percent
    pub floor_rate: f64,
    /// Capital income tax rate, percent
    pub tax_rate: f64,
    /// Capital base exempt from tax, shared by all ISK/KF accounts
    pub tax_free_allowance: f64,
}

impl Default for IskParameters {
    fn default() -> Self {
        Self {
            government_borrowing_rate: 1.96,
            surcharge: 1.0,
            floor_rate: 1.25,
            tax_rate: 30.0,
            tax_free_allowance: 150_000.0,
        }
    }
}

impl IskParameters {
    /// Schablon rate in percent
    pub fn schablon_rate(&self) -> f64 {
        (self.government_borrowing_rate + self.surcharge).max(self.floor_rate)
    }
}

/// Account values for one income year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IskStatement {
    /// Value at the start of each quarter
    pub quarter_values: [f64; 4],
    /// Deposits made during the year
    pub deposits: f64,
}

impl IskStatement {
    pub fn new(quarter_values: [f64; 4], deposits: f64) -> Self {
        Self {
            quarter_values,
            deposits,
        }
    }

    /// (sum of quarterly values + deposits) / 4
    pub fn capital_base(&self) -> f64 {
        (self.quarter_values.iter().sum::<f64>() + self.deposits) / 4.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IskTaxResult {
    pub capital_base: f64,
    pub taxable_base: f64,
    /// Percent
    pub schablon_rate: f64,
    pub schablon_income: f64,
    pub tax: f64,
}

/// Schablon tax for one or more accounts sharing the allowance
pub fn calculate_isk_tax(
    statements: &[IskStatement],
    params: &IskParameters,
) -> FinanceResult<IskTaxResult> {
    for statement in statements {
        for value in statement.quarter_values {
            check_amount("quarter value", value)?;
        }
        check_amount("deposits", statement.deposits)?;
    }

    let capital_base: f64 = statements.iter().map(IskStatement::capital_base).sum();
    let taxable_base = (capital_base - params.tax_free_allowance).max(0.0);
    let schablon_rate = params.schablon_rate();
    let schablon_income = taxable_base * schablon_rate / 100.0;
    let tax = schablon_income * params.tax_rate / 100.0;

    Ok(IskTaxResult {
        capital_base,
        taxable_base,
        schablon_rate,
        schablon_income,
        tax,
    })
}
