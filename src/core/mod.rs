//! Core business logic: records, the session store, aggregation, import and export

pub mod analytics;
pub mod config;
pub mod error;
pub mod export;
pub mod holding;
pub mod import;
pub mod log;
pub mod store;

// Re-export main types for cleaner imports
pub use error::{EngineError, ErrorKind};
pub use holding::{Category, Crypto, Equity, FixedIncome, ForeignCurrency, Holding, Record};
pub use store::{RecordStore, UpsertOutcome};
