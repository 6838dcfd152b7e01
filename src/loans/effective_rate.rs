//! Effective annual interest rate (effektiv ränta)
//!
//! The effective rate is the monthly rate at which the borrower's payments,
//! fees included, discount back to the amount actually disbursed, compounded
//! to a year. Banks quote it alongside the nominal rate.

use super::AmortizationSchedule;

const TOLERANCE: f64 = 1e-12;
const MAX_NEWTON_STEPS: usize = 50;
const MAX_BISECTION_STEPS: usize = 200;

/// Fees charged on top of interest
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoanFees {
    /// One-time setup fee (uppläggningsavgift), deducted at disbursement
    pub setup_fee: f64,
    /// Fee added to every payment (aviavgift)
    pub monthly_fee: f64,
}

/// Effective annual rate in percent, or None when no rate reproduces the
/// disbursed amount (empty schedule, fees eating the whole loan)
pub fn effective_annual_rate(principal: f64, schedule: &AmortizationSchedule, fees: LoanFees) -> Option<f64> {
    let disbursed = principal - fees.setup_fee;
    let first = schedule.entries.first()?;
    if !(disbursed > 0.0) || !(principal > 0.0) {
        return None;
    }

    let payments: Vec<f64> = schedule.payments().map(|p| p + fees.monthly_fee).collect();
    // Nominal monthly rate of the schedule; the fee-free answer
    let nominal = first.interest / principal;

    let monthly = solve_monthly_rate(disbursed, &payments, nominal)?;
    Some(((1.0 + monthly).powi(12) - 1.0) * 100.0)
}

/// Monthly rate r with Σ payment_k / (1 + r)^k = disbursed, k = 1..n
///
/// Newton from the nominal rate normally lands in a few steps; a bracketing
/// search takes over if it wanders off.
fn solve_monthly_rate(disbursed: f64, payments: &[f64], nominal: f64) -> Option<f64> {
    let mut rate = nominal;
    for _ in 0..MAX_NEWTON_STEPS {
        let (value, slope) = present_value(payments, rate);
        let gap = value - disbursed;
        if gap.abs() < TOLERANCE * disbursed {
            return Some(rate);
        }
        if slope >= 0.0 {
            break;
        }
        rate -= gap / slope;
        if !rate.is_finite() || rate <= -0.99 {
            break;
        }
    }

    bisect_monthly_rate(disbursed, payments)
}

/// Present value of the payments one month apart, and its derivative in r
fn present_value(payments: &[f64], rate: f64) -> (f64, f64) {
    let growth = 1.0 + rate;
    let mut discount = 1.0;
    let mut value = 0.0;
    let mut slope = 0.0;

    for (k, payment) in payments.iter().enumerate() {
        discount /= growth;
        value += payment * discount;
        slope -= (k + 1) as f64 * payment * discount / growth;
    }

    (value, slope)
}

/// Present value falls as the rate rises, so widen `high` until the target is
/// bracketed and halve from there
fn bisect_monthly_rate(disbursed: f64, payments: &[f64]) -> Option<f64> {
    let mut low = -0.5;
    if present_value(payments, low).0 < disbursed {
        return None;
    }

    let mut high = 0.01;
    while present_value(payments, high).0 > disbursed {
        high *= 2.0;
        if high > 100.0 {
            return None;
        }
    }

    for _ in 0..MAX_BISECTION_STEPS {
        let mid = (low + high) / 2.0;
        if present_value(payments, mid).0 > disbursed {
            low = mid;
        } else {
            high = mid;
        }
        if high - low < TOLERANCE {
            break;
        }
    }

    Some((low + high) / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loans::{amortization_schedule, annuity_payment, AmortizationRequest};
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
    }

    fn annuity_schedule(principal: f64, rate: f64, months: u32) -> AmortizationSchedule {
        let payment = annuity_payment(principal, rate, months).unwrap();
        amortization_schedule(&AmortizationRequest::new(principal, rate, payment, start())).unwrap()
    }

    #[test]
    fn test_fee_free_loan_matches_nominal() {
        let schedule = annuity_schedule(100_000.0, 6.0, 60);
        let effective = effective_annual_rate(100_000.0, &schedule, LoanFees::default()).unwrap();

        // 0.5% per month compounded
        let expected = (1.005_f64.powi(12) - 1.0) * 100.0;
        assert_relative_eq!(effective, expected, epsilon = 1e-6);
    }

    #[test]
    fn test_fees_raise_effective_rate() {
        let schedule = annuity_schedule(50_000.0, 7.5, 36);
        let plain = effective_annual_rate(50_000.0, &schedule, LoanFees::default()).unwrap();
        let with_fees = effective_annual_rate(
            50_000.0,
            &schedule,
            LoanFees {
                setup_fee: 695.0,
                monthly_fee: 29.0,
            },
        )
        .unwrap();

        assert!(with_fees > plain + 1.0);
    }

    #[test]
    fn test_solved_rate_discounts_to_disbursed_amount() {
        let schedule = annuity_schedule(150_000.0, 5.95, 84);
        let fees = LoanFees {
            setup_fee: 1_500.0,
            monthly_fee: 45.0,
        };
        let effective = effective_annual_rate(150_000.0, &schedule, fees).unwrap();

        let monthly = (1.0 + effective / 100.0).powf(1.0 / 12.0) - 1.0;
        let payments: Vec<f64> = schedule.payments().map(|p| p + 45.0).collect();
        let (value, _) = present_value(&payments, monthly);
        assert_relative_eq!(value, 148_500.0, epsilon = 1e-4);
    }

    #[test]
    fn test_interest_free_loan_with_setup_fee() {
        // 12 000 interest-free over 12 months: 0% without fees, positive with one
        let request = AmortizationRequest::new(12_000.0, 0.0, 1_000.0, start());
        let schedule = amortization_schedule(&request).unwrap();

        let plain = effective_annual_rate(12_000.0, &schedule, LoanFees::default()).unwrap();
        assert!(plain.abs() < 1e-9);

        let fees = LoanFees {
            setup_fee: 300.0,
            monthly_fee: 0.0,
        };
        let with_fee = effective_annual_rate(12_000.0, &schedule, fees).unwrap();
        assert!(with_fee > 4.0 && with_fee < 6.0, "got {}", with_fee);
    }

    #[test]
    fn test_fees_consuming_loan_have_no_rate() {
        let schedule = annuity_schedule(10_000.0, 5.0, 12);
        let fees = LoanFees {
            setup_fee: 10_000.0,
            monthly_fee: 0.0,
        };
        assert!(effective_annual_rate(10_000.0, &schedule, fees).is_none());
        assert!(effective_annual_rate(10_000.0, &AmortizationSchedule::default(), LoanFees::default()).is_none());
    }
}
