//! Payment schedule for a single loan
//!
//! Each period accrues one month of interest on the remaining balance; the
//! rest of the payment reduces principal. The final period pays exactly the
//! remaining balance so the schedule never overshoots.

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

use super::Loan;
use crate::config::EngineLimits;
use crate::error::{FinanceError, FinanceResult};

/// Balances below this are treated as fully repaid
pub const BALANCE_EPSILON: f64 = 1e-6;

/// Inputs for one amortization schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationRequest {
    pub principal: f64,

    /// Annual interest rate in percent
    pub annual_rate: f64,

    /// Regular monthly payment (interest + principal)
    pub payment: f64,

    /// Extra fixed amount paid on top of the regular payment
    pub extra_payment: f64,

    /// The first payment falls one month after this date
    pub start_date: NaiveDate,
}

impl AmortizationRequest {
    pub fn new(principal: f64, annual_rate: f64, payment: f64, start_date: NaiveDate) -> Self {
        Self {
            principal,
            annual_rate,
            payment,
            extra_payment: 0.0,
            start_date,
        }
    }

    /// Schedule for a loan paying its current minimum payment every month
    pub fn for_loan(loan: &Loan, start_date: NaiveDate) -> Self {
        Self::new(loan.principal, loan.interest_rate, loan.minimum_payment(), start_date)
    }

    pub fn with_extra(mut self, extra_payment: f64) -> Self {
        self.extra_payment = extra_payment;
        self
    }

    fn monthly_rate(&self) -> f64 {
        self.annual_rate / 12.0 / 100.0
    }

    fn validate(&self) -> FinanceResult<()> {
        let values = [self.principal, self.annual_rate, self.payment, self.extra_payment];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(FinanceError::invalid("amortization inputs must be finite"));
        }
        if self.principal < 0.0 {
            return Err(FinanceError::invalid("principal cannot be negative"));
        }
        if self.annual_rate < 0.0 {
            return Err(FinanceError::invalid("interest rate cannot be negative"));
        }
        if self.extra_payment < 0.0 {
            return Err(FinanceError::invalid("extra payment cannot be negative"));
        }
        Ok(())
    }
}

/// One payment period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationScheduleEntry {
    /// 1-indexed period number
    pub period: u32,
    pub date: NaiveDate,
    pub payment: f64,
    pub interest: f64,
    pub principal: f64,
    pub remaining_balance: f64,
}

/// Full payment schedule, ending when the balance reaches zero
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    pub entries: Vec<AmortizationScheduleEntry>,
}

impl AmortizationSchedule {
    pub fn periods(&self) -> u32 {
        self.entries.len() as u32
    }

    pub fn total_paid(&self) -> f64 {
        self.entries.iter().map(|e| e.payment).sum()
    }

    pub fn total_interest(&self) -> f64 {
        self.entries.iter().map(|e| e.interest).sum()
    }

    pub fn payoff_date(&self) -> Option<NaiveDate> {
        self.entries.last().map(|e| e.date)
    }

    pub fn payments(&self) -> impl Iterator<Item = f64> + '_ {
        self.entries.iter().map(|e| e.payment)
    }
}

/// Generate the schedule with the default period ceiling
pub fn amortization_schedule(request: &AmortizationRequest) -> FinanceResult<AmortizationSchedule> {
    generate_schedule(request, EngineLimits::default().max_amortization_periods)
}

/// Generate the payment schedule for one loan
///
/// Fails with `CannotAmortize` as soon as a period's payment does not exceed
/// its interest, and with `Undeterminable` if `max_periods` is reached first.
pub fn generate_schedule(
    request: &AmortizationRequest,
    max_periods: u32,
) -> FinanceResult<AmortizationSchedule> {
    request.validate()?;

    let rate = request.monthly_rate();
    let total_payment = request.payment + request.extra_payment;

    let mut schedule = AmortizationSchedule::default();
    let mut balance = request.principal;
    let mut period = 0u32;

    while balance > BALANCE_EPSILON {
        if period >= max_periods {
            log::warn!(
                "Amortization of {:.2} at {}% not finished after {} periods",
                request.principal,
                request.annual_rate,
                max_periods
            );
            return Err(FinanceError::Undeterminable { months: max_periods });
        }
        period += 1;

        let interest = balance * rate;
        if total_payment <= interest {
            return Err(FinanceError::CannotAmortize {
                payment: total_payment,
                interest,
            });
        }

        let principal = (total_payment - interest).min(balance);
        let previous = balance;
        balance -= principal;
        if balance < BALANCE_EPSILON {
            balance = 0.0;
        }
        if balance >= previous {
            // Principal portion vanished in rounding
            return Err(FinanceError::CannotAmortize {
                payment: total_payment,
                interest,
            });
        }

        let date = request
            .start_date
            .checked_add_months(Months::new(period))
            .ok_or_else(|| FinanceError::invalid("schedule runs past the supported calendar range"))?;

        schedule.entries.push(AmortizationScheduleEntry {
            period,
            date,
            payment: interest + principal,
            interest,
            principal,
            remaining_balance: balance,
        });
    }

    Ok(schedule)
}

/// Level monthly payment repaying `principal` over `months` (annuity loan)
pub fn annuity_payment(principal: f64, annual_rate: f64, months: u32) -> FinanceResult<f64> {
    if months == 0 {
        return Err(FinanceError::invalid("loan term must be at least one month"));
    }
    let rate = annual_rate / 12.0 / 100.0;
    if rate.abs() < 1e-12 {
        return Ok(principal / months as f64);
    }

    let v = 1.0 / (1.0 + rate);
    Ok(principal * rate / (1.0 - v.powi(months as i32)))
}
