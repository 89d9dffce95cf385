//! Type definitions for the fraud analysis pipeline

pub mod prediction;
pub mod transaction;

pub use prediction::{FraudLabel, Prediction};
pub use transaction::{RawTransaction, TransactionType};
