//! Local-key wallet connector over an Ethereum JSON-RPC endpoint

use super::{ConnectionStatus, SendOutcome, WalletConnector};
use crate::config::WalletConfig;
use crate::error::{TrackerError, TrackerResult};

use async_trait::async_trait;
use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Middleware, Provider};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, TransactionRequest};
use ethers::utils::parse_ether;
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};
use tracing::{info, warn};

const DISCONNECTED: u8 = 0;
const CONNECTING: u8 = 1;
const CONNECTED: u8 = 2;

/// Signs transfers with a key loaded from the environment
pub struct LocalWalletConnector {
    client: SignerMiddleware<Provider<Http>, LocalWallet>,
    address: Address,
    status: AtomicU8,
}

impl LocalWalletConnector {
    pub fn new(config: &WalletConfig, rpc_url: &str, chain_id: u64) -> TrackerResult<Self> {
        let key_env = config
            .private_key_env
            .as_deref()
            .unwrap_or("TRACKER_PRIVATE_KEY");
        let key = std::env::var(key_env)
            .map_err(|_| TrackerError::Wallet(format!("No signing key: set {}", key_env)))?;
        let wallet = key
            .parse::<LocalWallet>()
            .map_err(|e| TrackerError::Wallet(format!("Invalid private key: {}", e)))?
            .with_chain_id(chain_id);
        let provider = Provider::<Http>::try_from(rpc_url)
            .map_err(|e| TrackerError::Wallet(format!("Invalid RPC url: {}", e)))?;

        let address = wallet.address();
        Ok(Self {
            client: SignerMiddleware::new(provider, wallet),
            address,
            status: AtomicU8::new(DISCONNECTED),
        })
    }
}

#[async_trait]
impl WalletConnector for LocalWalletConnector {
    fn status(&self) -> ConnectionStatus {
        match self.status.load(Ordering::Relaxed) {
            CONNECTED => ConnectionStatus::Connected,
            CONNECTING => ConnectionStatus::Connecting,
            _ => ConnectionStatus::Disconnected,
        }
    }

    fn address(&self) -> Option<String> {
        Some(format!("{:?}", self.address))
    }

    async fn connect(&self) -> TrackerResult<()> {
        self.status.store(CONNECTING, Ordering::Relaxed);
        match self.client.get_chainid().await {
            Ok(chain_id) => {
                self.status.store(CONNECTED, Ordering::Relaxed);
                info!("Wallet connected as {:?} (chain {})", self.address, chain_id);
                Ok(())
            }
            Err(e) => {
                self.status.store(DISCONNECTED, Ordering::Relaxed);
                Err(TrackerError::Wallet(e.to_string()))
            }
        }
    }

    async fn send(&self, to: &str, value: &str, token: &str) -> SendOutcome {
        // Native-asset transfers only; the token symbol rides along for
        // display in history.
        let to_addr = match Address::from_str(to) {
            Ok(addr) => addr,
            Err(e) => {
                return SendOutcome::Error {
                    message: format!("Invalid recipient address: {}", e),
                }
            }
        };
        let amount = match parse_ether(value) {
            Ok(amount) => amount,
            Err(e) => {
                return SendOutcome::Error {
                    message: format!("Invalid amount: {}", e),
                }
            }
        };

        let tx = TransactionRequest::new().to(to_addr).value(amount);
        match self.client.send_transaction(tx, None).await {
            Ok(pending) => {
                let hash = format!("{:?}", pending.tx_hash());
                info!("Transfer broadcast: {} {} -> {} ({})", value, token, to, hash);
                SendOutcome::Sent { hash }
            }
            Err(e) => {
                warn!("Send failed: {}", e);
                SendOutcome::Error {
                    message: e.to_string(),
                }
            }
        }
    }
}
