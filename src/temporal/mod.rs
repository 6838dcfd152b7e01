//! Temporal versioning of slowly changing values
//!
//! A logical record (a loan's rate, a security's price) is stored as a chain
//! of versions with half-open validity intervals `[valid_from, valid_to)`.
//! At most one version per key is open at any time.

mod record;
mod store;
mod service;

pub use record::{PriceRecord, RateRecord, Temporal, Validity};
pub use store::{CloseVersion, InMemoryTemporalStore, Snapshot, TemporalStore, WriteBatch};
pub use service::TemporalService;
