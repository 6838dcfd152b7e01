//! ROT and RUT tax deductions for household services

use serde::{Deserialize, Serialize};

use super::check_amount;
use crate::error::FinanceResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceKind {
    /// Repairs, conversion, extension
    Rot,
    /// Cleaning, maintenance, laundry
    Rut,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HouseholdServiceParameters {
    /// Percent of labour cost
    pub rot_rate: f64,
    /// Percent of labour cost
    pub rut_rate: f64,
    /// ROT share of the yearly cap
    pub rot_cap: f64,
    /// ROT + RUT per person and year
    pub combined_cap: f64,
}

impl Default for HouseholdServiceParameters {
    fn default() -> Self {
        Self {
            rot_rate: 30.0,
            rut_rate: 50.0,
            rot_cap: 50_000.0,
            combined_cap: 75_000.0,
        }
    }
}

impl HouseholdServiceParameters {
    fn rate(&self, kind: ServiceKind) -> f64 {
        match kind {
            ServiceKind::Rot => self.rot_rate,
            ServiceKind::Rut => self.rut_rate,
        }
    }
}

/// One invoice; only the labour part qualifies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HouseholdServiceClaim {
    pub kind: ServiceKind,
    pub labor_cost: f64,
}

impl HouseholdServiceClaim {
    pub fn rot(labor_cost: f64) -> Self {
        Self {
            kind: ServiceKind::Rot,
            labor_cost,
        }
    }

    pub fn rut(labor_cost: f64) -> Self {
        Self {
            kind: ServiceKind::Rut,
            labor_cost,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimOutcome {
    pub kind: ServiceKind,
    pub requested: f64,
    pub granted: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeductionOutcome {
    pub claims: Vec<ClaimOutcome>,
    pub rot_total: f64,
    pub rut_total: f64,
    /// Room left under the combined cap
    pub remaining: f64,
}

impl DeductionOutcome {
    pub fn total(&self) -> f64 {
        self.rot_total + self.rut_total
    }
}

/// Grant claims for one person in invoice order until the caps are used up
pub fn calculate_deductions(
    claims: &[HouseholdServiceClaim],
    params: &HouseholdServiceParameters,
) -> FinanceResult<DeductionOutcome> {
    let mut rot_total = 0.0;
    let mut rut_total = 0.0;
    let mut outcomes = Vec::with_capacity(claims.len());

    for claim in claims {
        check_amount("labor cost", claim.labor_cost)?;

        let requested = claim.labor_cost * params.rate(claim.kind) / 100.0;
        let combined_room = params.combined_cap - rot_total - rut_total;
        let room = match claim.kind {
            ServiceKind::Rot => combined_room.min(params.rot_cap - rot_total),
            ServiceKind::Rut => combined_room,
        };
        let granted = requested.min(room.max(0.0));

        match claim.kind {
            ServiceKind::Rot => rot_total += granted,
            ServiceKind::Rut => rut_total += granted,
        }
        outcomes.push(ClaimOutcome {
            kind: claim.kind,
            requested,
            granted,
        });
    }

    Ok(DeductionOutcome {
        claims: outcomes,
        rot_total,
        rut_total,
        remaining: (params.combined_cap - rot_total - rut_total).max(0.0),
    })
}
