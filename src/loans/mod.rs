//! Loan records, CSV loading and single-loan amortization

mod loan;
mod amortization;
mod effective_rate;
pub mod loader;

pub use loan::{Loan, LoanType};
pub use amortization::{
    AmortizationRequest, AmortizationSchedule, AmortizationScheduleEntry,
    amortization_schedule, generate_schedule, annuity_payment, BALANCE_EPSILON,
};
pub use effective_rate::{effective_annual_rate, LoanFees};
pub use loader::{
    load_loans, load_loans_from_reader, load_rate_changes, load_rate_changes_from_reader, RateChange,
};
