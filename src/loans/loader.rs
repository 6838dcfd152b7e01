//! Load loans from CSV

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use csv::Reader;

use super::{Loan, LoanType};
use crate::error::{FinanceError, FinanceResult};
use crate::scope::UserId;
use crate::temporal::RateRecord;

/// Raw CSV row matching the loans.csv columns
#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    #[serde(rename = "LoanID")]
    loan_id: u32,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "LoanType")]
    loan_type: String,
    #[serde(rename = "Principal")]
    principal: f64,
    #[serde(rename = "InterestRate")]
    interest_rate: f64,
    #[serde(rename = "MonthlyAmortization")]
    monthly_amortization: f64,
    #[serde(rename = "Owner", default)]
    owner: Option<u32>,
}

impl CsvRow {
    fn into_loan(self) -> FinanceResult<Loan> {
        let loan_type: LoanType = self.loan_type.parse().map_err(FinanceError::InvalidInput)?;

        if self.principal < 0.0 || !self.principal.is_finite() {
            return Err(FinanceError::invalid(format!(
                "loan {}: principal must be a non-negative number",
                self.loan_id
            )));
        }
        if self.monthly_amortization < 0.0 || !self.monthly_amortization.is_finite() {
            return Err(FinanceError::invalid(format!(
                "loan {}: monthly amortization must be a non-negative number",
                self.loan_id
            )));
        }
        if !self.interest_rate.is_finite() {
            return Err(FinanceError::invalid(format!(
                "loan {}: interest rate must be finite",
                self.loan_id
            )));
        }

        let loan = Loan::new(
            self.loan_id,
            self.name,
            loan_type,
            self.principal,
            self.interest_rate,
            self.monthly_amortization,
        );
        Ok(loan.owned_by(UserId(self.owner.unwrap_or(0))))
    }
}

/// Load loans from any CSV reader
pub fn load_loans_from_reader<R: Read>(reader: R) -> FinanceResult<Vec<Loan>> {
    let mut csv_reader = Reader::from_reader(reader);
    let mut loans = Vec::new();

    for result in csv_reader.deserialize() {
        let row: CsvRow = result?;
        loans.push(row.into_loan()?);
    }

    Ok(loans)
}

/// Load loans from a CSV file
pub fn load_loans(path: &Path) -> FinanceResult<Vec<Loan>> {
    let file = File::open(path)?;
    let loans = load_loans_from_reader(file)?;
    log::debug!("Loaded {} loans from {}", loans.len(), path.display());
    Ok(loans)
}

/// One row of a rate change file: a loan's new rate from a given day
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct RateChange {
    #[serde(rename = "LoanID")]
    pub loan_id: u32,
    #[serde(rename = "Owner", default)]
    pub owner: Option<u32>,
    #[serde(rename = "InterestRate")]
    pub interest_rate: f64,
    #[serde(rename = "EffectiveFrom")]
    pub effective_from: NaiveDate,
}

impl RateChange {
    /// Midnight UTC of the effective day
    pub fn effective(&self) -> DateTime<Utc> {
        self.effective_from.and_time(chrono::NaiveTime::MIN).and_utc()
    }

    pub fn to_record(&self) -> RateRecord {
        RateRecord::new(self.loan_id, UserId(self.owner.unwrap_or(0)), self.interest_rate)
    }
}

/// Load rate changes, ordered by loan and effective day
pub fn load_rate_changes_from_reader<R: Read>(reader: R) -> FinanceResult<Vec<RateChange>> {
    let mut csv_reader = Reader::from_reader(reader);
    let mut changes = Vec::new();

    for result in csv_reader.deserialize() {
        let change: RateChange = result?;
        if !change.interest_rate.is_finite() || change.interest_rate < 0.0 {
            return Err(FinanceError::invalid(format!(
                "loan {}: interest rate must be a non-negative number",
                change.loan_id
            )));
        }
        changes.push(change);
    }

    changes.sort_by_key(|c| (c.loan_id, c.effective_from));
    Ok(changes)
}

/// Load rate changes from a CSV file
pub fn load_rate_changes(path: &Path) -> FinanceResult<Vec<RateChange>> {
    let file = File::open(path)?;
    let changes = load_rate_changes_from_reader(file)?;
    log::debug!("Loaded {} rate changes from {}", changes.len(), path.display());
    Ok(changes)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
LoanID,Name,LoanType,Principal,InterestRate,MonthlyAmortization,Owner
1,Bolån,Mortgage,1800000,3.9,3000,7
2,Billån,Car,120000,6.5,2500,7
3,Kreditkort,CreditCard,15000,18.9,500,
";

    #[test]
    fn test_load_from_reader() {
        let loans = load_loans_from_reader(SAMPLE.as_bytes()).unwrap();

        assert_eq!(loans.len(), 3);
        assert_eq!(loans[0].loan_type, LoanType::Mortgage);
        assert_eq!(loans[1].principal, 120_000.0);
        assert_eq!(loans[1].owner, UserId(7));
        assert_eq!(loans[2].interest_rate, 18.9);
    }

    #[test]
    fn test_unknown_loan_type_rejected() {
        let csv = "LoanID,Name,LoanType,Principal,InterestRate,MonthlyAmortization,Owner\n1,X,Boat,100,1,1,1\n";
        let err = load_loans_from_reader(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("Unknown LoanType"));
    }

    #[test]
    fn test_missing_owner_defaults_to_zero() {
        let loans = load_loans_from_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(loans[0].owner, UserId(7));
        assert_eq!(loans[2].owner, UserId(0));
    }

    #[test]
    fn test_rate_changes_sorted() {
        let csv = "\
LoanID,Owner,InterestRate,EffectiveFrom
1,7,4.25,2024-09-01
2,,6.1,2024-01-01
1,7,3.9,2024-01-01
";
        let changes = load_rate_changes_from_reader(csv.as_bytes()).unwrap();

        assert_eq!(changes.len(), 3);
        assert_eq!(changes[0].interest_rate, 3.9);
        assert_eq!(changes[1].effective_from, NaiveDate::from_ymd_opt(2024, 9, 1).unwrap());
        assert_eq!(changes[2].to_record().owner, UserId(0));
        assert_eq!(changes[0].effective().to_rfc3339(), "2024-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_negative_rate_change_rejected() {
        let csv = "LoanID,Owner,InterestRate,EffectiveFrom\n1,1,-0.5,2024-01-01\n";
        assert!(load_rate_changes_from_reader(csv.as_bytes()).is_err());
    }

    #[test]
    fn test_negative_principal_rejected() {
        let csv = "LoanID,Name,LoanType,Principal,InterestRate,MonthlyAmortization,Owner\n1,X,Car,-100,1,1,1\n";
        assert!(load_loans_from_reader(csv.as_bytes()).is_err());
    }
}
