//! KALP ("kvar att leva på"): monthly margin left after living costs and
//! loan costs at a stressed interest rate

use serde::{Deserialize, Serialize};

use super::check_amount;
use crate::error::FinanceResult;
use crate::loans::Loan;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KalpParameters {
    /// Interest rate used for every loan instead of its own, percent
    pub stress_rate: f64,
    /// Standard living cost per adult and month
    pub adult_living_cost: f64,
    /// Standard living cost per child and month
    pub child_living_cost: f64,
}

impl Default for KalpParameters {
    fn default() -> Self {
        Self {
            stress_rate: 7.0,
            adult_living_cost: 10_300.0,
            child_living_cost: 3_700.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KalpInput {
    /// Household income after tax, per month
    pub net_monthly_income: f64,
    pub adults: u32,
    pub children: u32,
    /// Operating cost, fee or rent of the home, per month
    pub housing_cost: f64,
    /// Other recurring commitments, per month
    pub other_fixed_costs: f64,
    /// Existing loans plus any loan being applied for
    pub loans: Vec<Loan>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KalpResult {
    pub income: f64,
    pub living_costs: f64,
    pub fixed_costs: f64,
    pub stressed_interest: f64,
    pub amortization: f64,
    pub margin: f64,
}

impl KalpResult {
    /// Whether the household can carry its loans at the stressed rate
    pub fn is_positive(&self) -> bool {
        self.margin >= 0.0
    }
}

pub fn calculate_kalp(input: &KalpInput, params: &KalpParameters) -> FinanceResult<KalpResult> {
    check_amount("net monthly income", input.net_monthly_income)?;
    check_amount("housing cost", input.housing_cost)?;
    check_amount("other fixed costs", input.other_fixed_costs)?;
    for loan in &input.loans {
        check_amount("loan principal", loan.principal)?;
        check_amount("loan amortization", loan.monthly_amortization)?;
    }

    let living_costs = input.adults as f64 * params.adult_living_cost
        + input.children as f64 * params.child_living_cost;
    let fixed_costs = input.housing_cost + input.other_fixed_costs;
    let stressed_interest: f64 = input
        .loans
        .iter()
        .map(|l| l.principal * params.stress_rate / 100.0 / 12.0)
        .sum();
    let amortization: f64 = input.loans.iter().map(|l| l.monthly_amortization).sum();

    let margin =
        input.net_monthly_income - living_costs - fixed_costs - stressed_interest - amortization;
    if margin < 0.0 {
        log::debug!("KALP margin negative: {:.2}", margin);
    }

    Ok(KalpResult {
        income: input.net_monthly_income,
        living_costs,
        fixed_costs,
        stressed_interest,
        amortization,
        margin,
    })
}
