//! Error types for the aggregation core

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalyticsError {
    /// A referenced entity could not be resolved by the snapshot provider
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Date window with its start after its end
    #[error("invalid date range: {from} is after {to}")]
    InvalidRange { from: NaiveDate, to: NaiveDate },

    /// The snapshot provider failed to materialize a collection
    #[error("snapshot error: {0}")]
    Snapshot(String),
}

pub type Result<T> = std::result::Result<T, AnalyticsError>;
