//! Loan records consumed by the amortization and debt strategy engines

use serde::{Deserialize, Serialize};

use super::BALANCE_EPSILON;
use crate::scope::UserId;

/// Kind of loan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoanType {
    /// Bolån
    Mortgage,
    /// Billån
    Car,
    /// CSN
    Student,
    /// Privatlån
    Personal,
    CreditCard,
    Other,
}

impl LoanType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanType::Mortgage => "Mortgage",
            LoanType::Car => "Car",
            LoanType::Student => "Student",
            LoanType::Personal => "Personal",
            LoanType::CreditCard => "CreditCard",
            LoanType::Other => "Other",
        }
    }
}

impl std::str::FromStr for LoanType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Mortgage" => Ok(LoanType::Mortgage),
            "Car" => Ok(LoanType::Car),
            "Student" => Ok(LoanType::Student),
            "Personal" => Ok(LoanType::Personal),
            "CreditCard" => Ok(LoanType::CreditCard),
            "Other" => Ok(LoanType::Other),
            other => Err(format!("Unknown LoanType: {}", other)),
        }
    }
}

/// A single outstanding loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    pub loan_id: u32,
    pub name: String,
    pub loan_type: LoanType,

    /// Current outstanding balance
    pub principal: f64,

    /// Annual interest rate in percent
    pub interest_rate: f64,

    /// Contractual principal repayment per month
    pub monthly_amortization: f64,

    pub owner: UserId,
}

impl Loan {
    pub fn new(
        loan_id: u32,
        name: impl Into<String>,
        loan_type: LoanType,
        principal: f64,
        interest_rate: f64,
        monthly_amortization: f64,
    ) -> Self {
        Self {
            loan_id,
            name: name.into(),
            loan_type,
            principal,
            interest_rate,
            monthly_amortization,
            owner: UserId(0),
        }
    }

    pub fn owned_by(mut self, owner: UserId) -> Self {
        self.owner = owner;
        self
    }

    /// Monthly interest rate as a decimal
    pub fn monthly_rate(&self) -> f64 {
        self.interest_rate / 12.0 / 100.0
    }

    /// Interest accrued over one month on the current balance
    pub fn monthly_interest(&self) -> f64 {
        self.principal * self.monthly_rate()
    }

    /// Amortization plus this month's interest
    pub fn minimum_payment(&self) -> f64 {
        self.monthly_amortization + self.monthly_interest()
    }

    /// Balance below the amortization residual counts as repaid
    pub fn is_paid_off(&self) -> bool {
        self.principal <= BALANCE_EPSILON
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimum_payment() {
        // 2 400 000 at 3.6% with 4 000/month amortization
        let loan = Loan::new(1, "Bolån", LoanType::Mortgage, 2_400_000.0, 3.6, 4_000.0);

        assert!((loan.monthly_rate() - 0.003).abs() < 1e-12);
        assert!((loan.monthly_interest() - 7_200.0).abs() < 1e-6);
        assert!((loan.minimum_payment() - 11_200.0).abs() < 1e-6);
    }

    #[test]
    fn test_paid_off_threshold() {
        let mut loan = Loan::new(2, "CSN", LoanType::Student, 1e-9, 0.5, 0.0);
        assert!(loan.is_paid_off());

        loan.principal = 0.01;
        assert!(!loan.is_paid_off());
    }

    #[test]
    fn test_owned_by() {
        let loan = Loan::new(3, "Billån", LoanType::Car, 90_000.0, 6.0, 1_500.0);
        assert_eq!(loan.owner, UserId(0));
        assert_eq!(loan.owned_by(UserId(12)).owner, UserId(12));
    }

    #[test]
    fn test_loan_type_parse() {
        assert_eq!("Car".parse::<LoanType>().unwrap(), LoanType::Car);
        assert!("Boat".parse::<LoanType>().is_err());
        assert_eq!(LoanType::CreditCard.as_str(), "CreditCard");
    }
}
