//! Error types for the transfer tracker

use thiserror::Error;

/// Main error type for the tracker core
#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing transfer parameter: {field}")]
    InvalidIntent { field: &'static str },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Ledger query failed for {hash}: {message}")]
    LedgerQuery { hash: String, message: String },

    #[error("Wallet error: {0}")]
    Wallet(String),

    #[error("Transaction {id} not found")]
    RecordNotFound { id: String },

    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for tracker operations
pub type TrackerResult<T> = Result<T, TrackerError>;
