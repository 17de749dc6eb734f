//! Ethereum JSON-RPC ledger client with multi-endpoint failover

use super::{Finality, LedgerClient, Receipt};
use crate::config::LedgerConfig;
use crate::error::{TrackerError, TrackerResult};

use async_trait::async_trait;
use ethers::providers::{Http, Middleware, Provider};
use ethers::types::H256;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

/// Receipt queries over one or more HTTP endpoints with automatic failover
pub struct EthersLedger {
    providers: Vec<Provider<Http>>,
    current: AtomicUsize,
}

impl EthersLedger {
    pub fn new(config: &LedgerConfig) -> TrackerResult<Self> {
        let mut providers = Vec::new();
        for url in &config.rpc_urls {
            match Provider::<Http>::try_from(url.as_str()) {
                Ok(provider) => {
                    providers.push(provider.interval(Duration::from_millis(100)));
                    debug!("Added ledger RPC endpoint {}", url);
                }
                Err(e) => {
                    warn!("Skipping invalid RPC url {}: {}", url, e);
                }
            }
        }

        if providers.is_empty() {
            return Err(TrackerError::Config("No valid ledger RPC endpoints".to_string()));
        }

        Ok(Self {
            providers,
            current: AtomicUsize::new(0),
        })
    }

    fn active(&self) -> &Provider<Http> {
        let idx = self.current.load(Ordering::Relaxed);
        &self.providers[idx % self.providers.len()]
    }

    /// Switch to the next endpoint
    fn failover(&self) {
        let current = self.current.load(Ordering::Relaxed);
        let next = (current + 1) % self.providers.len();
        self.current.store(next, Ordering::Relaxed);
        warn!("Ledger failover to endpoint {}", next);
    }

    /// Liveness probe against the active endpoint
    pub async fn health_check(&self) -> bool {
        self.active().get_block_number().await.is_ok()
    }
}

#[async_trait]
impl LedgerClient for EthersLedger {
    async fn get_receipt(&self, hash: &str) -> TrackerResult<Option<Receipt>> {
        let tx_hash = H256::from_str(hash).map_err(|e| TrackerError::LedgerQuery {
            hash: hash.to_string(),
            message: format!("invalid transaction hash: {}", e),
        })?;

        let mut last_error = None;
        for _ in 0..self.providers.len() {
            match self.active().get_transaction_receipt(tx_hash).await {
                Ok(Some(receipt)) => {
                    let finality = match receipt.status.map(|s| s.as_u64()) {
                        Some(1) => Finality::Success,
                        _ => Finality::Failed,
                    };
                    return Ok(Some(Receipt {
                        finality,
                        block_number: receipt.block_number.map(|b| b.as_u64()),
                    }));
                }
                Ok(None) => return Ok(None),
                Err(e) => {
                    warn!("Receipt query failed for {}: {}", hash, e);
                    last_error = Some(e.to_string());
                    self.failover();
                }
            }
        }

        Err(TrackerError::LedgerQuery {
            hash: hash.to_string(),
            message: last_error.unwrap_or_else(|| "all endpoints failed".to_string()),
        })
    }
}
