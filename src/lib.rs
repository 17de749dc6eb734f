//! Client-side transfer lifecycle tracker
//!
//! Records a transfer's identity and intent before it is signed, reconciles
//! asynchronous signer callbacks with that record, polls the ledger for
//! finality, and survives restarts without losing or duplicating records.
//! Signing and ledger access live behind trait boundaries; the tracker only
//! orchestrates them and owns the local record of outcomes.

pub mod config;
pub mod error;
pub mod history;
pub mod host;
pub mod ledger;
pub mod poller;
pub mod store;
pub mod submit;
pub mod wallet;

pub use config::Settings;
pub use error::{TrackerError, TrackerResult};
