//! End-to-end transfer flow
//!
//! Drives one transfer link from intent validation through the device-class
//! signing policy to an attached hash or a recorded rejection. Signer errors
//! end up as record state, never as a crash of the enclosing view.

use super::coordinator::SubmissionCoordinator;
use super::intent::TransferLink;
use crate::config::{DeviceClass, Settings};
use crate::error::TrackerResult;
use crate::host::HostShell;
use crate::store::{TxRecord, TxStatus};
use crate::wallet::handoff::{self, HandoffOutcome};
use crate::wallet::{ConnectionStatus, SendOutcome, WalletConnector};

use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct TransferFlow {
    coordinator: SubmissionCoordinator,
    connector: Arc<dyn WalletConnector>,
    shell: Arc<dyn HostShell>,
    settings: Settings,
}

impl TransferFlow {
    pub fn new(
        coordinator: SubmissionCoordinator,
        connector: Arc<dyn WalletConnector>,
        shell: Arc<dyn HostShell>,
        settings: Settings,
    ) -> Self {
        Self {
            coordinator,
            connector,
            shell,
            settings,
        }
    }

    /// Run one transfer link to completion of the signing stage
    pub async fn run(&self, link: &TransferLink) -> TrackerResult<TxRecord> {
        let record = self
            .coordinator
            .begin_or_resume(&link.intent, link.id.as_deref())
            .await?;

        if record.status.is_terminal() || record.hash.is_some() {
            // nothing left to sign; the poller takes it from here
            debug!("Transaction {} already past signing ({})", record.id, record.status);
            return Ok(record);
        }

        if self.connector.status() != ConnectionStatus::Connected {
            self.connector.connect().await?;
        }

        match self.shell.device_class() {
            DeviceClass::Mobile => {
                let outcome = handoff::run(
                    self.shell.as_ref(),
                    &self.settings.tracker,
                    &self.settings.wallet.deep_link,
                    &self.settings.wallet.fallback_link,
                    &self.settings.wallet.install_link,
                )
                .await?;
                if let HandoffOutcome::InstallPrompted { .. } = outcome {
                    warn!("Wallet handoff failed for {}", record.id);
                    return self
                        .coordinator
                        .confirm_send(
                            &record.id,
                            SendOutcome::Error {
                                message: "Wallet handoff not detected".to_string(),
                            },
                        )
                        .await;
                }
            }
            DeviceClass::Desktop => {
                let approved = self
                    .shell
                    .confirm(
                        "Confirm transaction",
                        "Continue to your wallet to sign the transfer",
                    )
                    .await;
                if !approved {
                    info!("Transfer {} declined before signing", record.id);
                    return self.coordinator.reject(&record.id).await;
                }
            }
        }

        let outcome = self
            .connector
            .send(&record.to, &record.value, &record.token)
            .await;
        let updated = self.coordinator.confirm_send(&record.id, outcome).await?;

        if updated.status == TxStatus::Rejected {
            self.shell.notify("Transaction was not sent");
        }
        Ok(updated)
    }
}
