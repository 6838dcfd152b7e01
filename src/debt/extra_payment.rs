//! What an extra monthly amount does to a single loan

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{FinanceError, FinanceResult};
use crate::loans::{generate_schedule, AmortizationRequest, AmortizationSchedule, Loan};

/// Headline numbers of one amortization schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSummary {
    pub months: u32,
    pub total_interest: f64,
    pub total_paid: f64,
    pub payoff_date: Option<NaiveDate>,
}

impl From<&AmortizationSchedule> for ScheduleSummary {
    fn from(schedule: &AmortizationSchedule) -> Self {
        Self {
            months: schedule.periods(),
            total_interest: schedule.total_interest(),
            total_paid: schedule.total_paid(),
            payoff_date: schedule.payoff_date(),
        }
    }
}

/// Baseline against accelerated schedule
///
/// `baseline` is `None` when the minimum payment alone never clears the loan
/// (interest-only mortgages, or a payoff beyond the period ceiling); the
/// savings are then unbounded and left as `None` too.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtraPaymentAnalysis {
    pub loan_id: u32,
    pub extra_payment: f64,
    pub baseline: Option<ScheduleSummary>,
    pub accelerated: ScheduleSummary,
    pub months_saved: Option<u32>,
    pub interest_saved: Option<f64>,
}

/// Compare the loan's schedule at its minimum payment with and without `extra`
pub fn analyze_extra_payment(
    loan: &Loan,
    extra: f64,
    start_date: NaiveDate,
    max_periods: u32,
) -> FinanceResult<ExtraPaymentAnalysis> {
    if !extra.is_finite() || extra < 0.0 {
        return Err(FinanceError::invalid("extra payment must be a non-negative number"));
    }

    let request = AmortizationRequest::for_loan(loan, start_date);
    let baseline = match generate_schedule(&request, max_periods) {
        Ok(schedule) => Some(ScheduleSummary::from(&schedule)),
        Err(e @ (FinanceError::CannotAmortize { .. } | FinanceError::Undeterminable { .. })) => {
            log::debug!("Loan {} has no baseline payoff: {}", loan.loan_id, e);
            None
        }
        Err(e) => return Err(e),
    };
    let accelerated = ScheduleSummary::from(&generate_schedule(&request.with_extra(extra), max_periods)?);

    Ok(ExtraPaymentAnalysis {
        loan_id: loan.loan_id,
        extra_payment: extra,
        months_saved: baseline
            .as_ref()
            .map(|b| b.months.saturating_sub(accelerated.months)),
        interest_saved: baseline
            .as_ref()
            .map(|b| b.total_interest - accelerated.total_interest),
        baseline,
        accelerated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loans::LoanType;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
    }

    #[test]
    fn test_zero_extra_matches_baseline() {
        let loan = Loan::new(1, "Car", LoanType::Car, 150_000.0, 5.95, 2_000.0);
        let analysis = analyze_extra_payment(&loan, 0.0, start(), 1200).unwrap();

        let baseline = analysis.baseline.unwrap();
        assert_eq!(baseline.months, analysis.accelerated.months);
        assert_eq!(analysis.months_saved, Some(0));
        assert_eq!(analysis.interest_saved, Some(0.0));
    }

    #[test]
    fn test_extra_saves_time_and_interest() {
        let loan = Loan::new(2, "Privatlån", LoanType::Personal, 80_000.0, 8.5, 1_000.0);
        let analysis = analyze_extra_payment(&loan, 1_000.0, start(), 1200).unwrap();

        assert!(analysis.months_saved.unwrap() > 0);
        assert!(analysis.interest_saved.unwrap() > 0.0);
        assert!(analysis.accelerated.payoff_date < analysis.baseline.unwrap().payoff_date);
    }

    #[test]
    fn test_interest_only_baseline_never_pays_off() {
        // 2 000 000 at 4% with no amortization: minimum payment is pure interest
        let loan = Loan::new(4, "Bolån", LoanType::Mortgage, 2_000_000.0, 4.0, 0.0);
        let analysis = analyze_extra_payment(&loan, 5_000.0, start(), 1200).unwrap();

        assert!(analysis.baseline.is_none());
        assert_eq!(analysis.months_saved, None);
        assert_eq!(analysis.interest_saved, None);
        assert!(analysis.accelerated.months > 0 && analysis.accelerated.months < 1200);
        assert!(analysis.accelerated.payoff_date.is_some());
    }

    #[test]
    fn test_baseline_past_ceiling_is_none() {
        let loan = Loan::new(5, "Bolån", LoanType::Mortgage, 2_000_000.0, 4.0, 500.0);
        let analysis = analyze_extra_payment(&loan, 20_000.0, start(), 240).unwrap();

        assert!(analysis.baseline.is_none());
        assert!(analysis.accelerated.months <= 240);
    }

    #[test]
    fn test_extra_too_small_still_fails() {
        let loan = Loan::new(6, "Bolån", LoanType::Mortgage, 2_000_000.0, 4.0, 0.0);
        let err = analyze_extra_payment(&loan, 0.0, start(), 1200).unwrap_err();
        assert!(matches!(err, FinanceError::CannotAmortize { .. }));
    }

    #[test]
    fn test_negative_extra_rejected() {
        let loan = Loan::new(3, "X", LoanType::Other, 1_000.0, 1.0, 100.0);
        assert!(analyze_extra_payment(&loan, -5.0, start(), 1200).is_err());
    }
}
