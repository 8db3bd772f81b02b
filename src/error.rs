//! Error types shared by the scoring core and its collaborators.
//!
//! Missing data is not an error anywhere in this crate: it is `None` or
//! [`Grade::NotAvailable`](crate::scoring::grade::Grade). These variants cover
//! unknown references, rejected rows, storage failures and configuration.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RaterError {
    #[error("unknown route '{0}'")]
    UnknownRoute(String),

    #[error("unknown stop '{0}'")]
    UnknownStop(String),

    #[error("unknown trip '{0}'")]
    UnknownTrip(String),

    #[error("invalid arrival prediction: {0}")]
    InvalidPrediction(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("invalid configuration for {field}: {reason}")]
    Config { field: &'static str, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, RaterError>;
