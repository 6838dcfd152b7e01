//! Swedish household tax and affordability calculations
//!
//! Rates and caps live in [`TaxParameters`] so a settings file can move them
//! forward a tax year without a rebuild. Defaults are the 2025 values.

mod isk;
mod rot_rut;
mod k4;
mod kalp;

use serde::{Deserialize, Serialize};

pub use isk::{calculate_isk_tax, IskParameters, IskStatement, IskTaxResult};
pub use rot_rut::{
    calculate_deductions, ClaimOutcome, DeductionOutcome, HouseholdServiceClaim,
    HouseholdServiceParameters, ServiceKind,
};
pub use k4::{AverageCostBook, CostMethod, K4Line, K4Parameters, K4Summary, SecuritySale};
pub use kalp::{calculate_kalp, KalpInput, KalpParameters, KalpResult};

/// All tax-year dependent constants
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxParameters {
    pub isk: IskParameters,
    pub household_services: HouseholdServiceParameters,
    pub k4: K4Parameters,
    pub kalp: KalpParameters,
}

pub(crate) fn check_amount(name: &str, value: f64) -> crate::error::FinanceResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(crate::error::FinanceError::invalid(format!(
            "{} must be a non-negative number, got {}",
            name, value
        )));
    }
    Ok(())
}
