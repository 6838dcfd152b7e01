//! Records carrying a validity interval

use std::fmt;
use std::hash::Hash;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::scope::UserId;

/// Validity interval of one version; `valid_to == None` marks the open version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Validity {
    pub version_id: Uuid,
    pub valid_from: DateTime<Utc>,
    pub valid_to: Option<DateTime<Utc>>,
}

impl Validity {
    pub fn new(valid_from: DateTime<Utc>) -> Self {
        Self {
            version_id: Uuid::new_v4(),
            valid_from,
            valid_to: None,
        }
    }

    /// Start a fresh open version at `at`
    pub fn open_at(&mut self, at: DateTime<Utc>) {
        self.version_id = Uuid::new_v4();
        self.valid_from = at;
        self.valid_to = None;
    }

    pub fn close_at(&mut self, at: DateTime<Utc>) {
        self.valid_to = Some(at);
    }

    pub fn is_open(&self) -> bool {
        self.valid_to.is_none()
    }

    /// `valid_from <= at < valid_to`
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.valid_from <= at && self.valid_to.map_or(true, |to| to > at)
    }
}

impl Default for Validity {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

/// An entity whose history is kept as non-overlapping versions
pub trait Temporal: Clone + fmt::Debug + Send + Sync + 'static {
    /// Logical identity shared by all versions
    type Key: Clone + Eq + Hash + fmt::Display + fmt::Debug + Send + Sync;

    /// Entity name used in errors and audit events
    const ENTITY: &'static str;

    fn key(&self) -> Self::Key;

    fn owner(&self) -> UserId;

    fn validity(&self) -> &Validity;

    fn validity_mut(&mut self) -> &mut Validity;

    fn is_open(&self) -> bool {
        self.validity().is_open()
    }

    fn is_valid_at(&self, at: DateTime<Utc>) -> bool {
        self.validity().contains(at)
    }
}

/// Interest rate of a loan over time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateRecord {
    pub loan_id: u32,
    pub owner: UserId,
    /// Annual rate in percent
    pub interest_rate: f64,
    pub validity: Validity,
}

impl RateRecord {
    pub fn new(loan_id: u32, owner: UserId, interest_rate: f64) -> Self {
        Self {
            loan_id,
            owner,
            interest_rate,
            validity: Validity::default(),
        }
    }
}

impl Temporal for RateRecord {
    type Key = u32;
    const ENTITY: &'static str = "LoanRate";

    fn key(&self) -> u32 {
        self.loan_id
    }

    fn owner(&self) -> UserId {
        self.owner
    }

    fn validity(&self) -> &Validity {
        &self.validity
    }

    fn validity_mut(&mut self) -> &mut Validity {
        &mut self.validity
    }
}

/// Quoted price of a security over time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    /// Ticker or ISIN
    pub symbol: String,
    pub owner: UserId,
    pub price: f64,
    pub currency: String,
    pub validity: Validity,
}

impl PriceRecord {
    pub fn new(symbol: impl Into<String>, owner: UserId, price: f64, currency: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            owner,
            price,
            currency: currency.into(),
            validity: Validity::default(),
        }
    }
}

impl Temporal for PriceRecord {
    type Key = String;
    const ENTITY: &'static str = "SecurityPrice";

    fn key(&self) -> String {
        self.symbol.clone()
    }

    fn owner(&self) -> UserId {
        self.owner
    }

    fn validity(&self) -> &Validity {
        &self.validity
    }

    fn validity_mut(&mut self) -> &mut Validity {
        &mut self.validity
    }
}
