//! Ledger access
//!
//! The poller depends only on the [`LedgerClient`] trait; the production
//! implementation queries Ethereum JSON-RPC endpoints.

mod provider;

pub use provider::EthersLedger;

use crate::error::TrackerResult;
use async_trait::async_trait;

/// Finality verdict carried by a mined receipt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Finality {
    Success,
    Failed,
}

/// A mined transaction receipt
#[derive(Debug, Clone)]
pub struct Receipt {
    pub finality: Finality,
    pub block_number: Option<u64>,
}

/// Read-only ledger queries
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Fetch the receipt for a transaction hash, `None` while unmined
    async fn get_receipt(&self, hash: &str) -> TrackerResult<Option<Receipt>>;
}
