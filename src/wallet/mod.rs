//! Wallet connector boundary and the deep-link signing handoff

mod connector;
pub mod handoff;

pub use connector::LocalWalletConnector;

use crate::error::TrackerResult;
use async_trait::async_trait;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connected,
    Connecting,
    Disconnected,
}

/// Outcome of a signing request, delivered asynchronously
#[derive(Debug, Clone)]
pub enum SendOutcome {
    /// Broadcast accepted, transaction hash returned
    Sent { hash: String },
    /// Signer declined or the send itself failed
    Error { message: String },
}

/// External wallet the flow hands signing to
#[async_trait]
pub trait WalletConnector: Send + Sync {
    fn status(&self) -> ConnectionStatus;

    fn address(&self) -> Option<String>;

    async fn connect(&self) -> TrackerResult<()>;

    /// Sign and broadcast a transfer. Errors are part of the outcome, not
    /// the return channel: the caller records them as a rejection.
    async fn send(&self, to: &str, value: &str, token: &str) -> SendOutcome;
}
