//! Submission coordinator
//!
//! Turns a validated transfer intent into a persisted record and drives it
//! to hash attachment or rejection. Every mutation is a read-modify-write
//! through the store, never a write-back of a stale snapshot.

use super::intent::TransferIntent;
use crate::error::{TrackerError, TrackerResult};
use crate::store::{TxRecord, TxStore};
use crate::wallet::SendOutcome;

use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub struct SubmissionCoordinator {
    store: Arc<TxStore>,
}

impl SubmissionCoordinator {
    pub fn new(store: Arc<TxStore>) -> Self {
        Self { store }
    }

    /// Create a fresh pending record, or return the stored one unmodified
    /// when `existing_id` resumes a known transaction.
    ///
    /// A supplied id that is not in the store is kept for the new record so
    /// the deep link that carried it stays stable across reopens.
    pub async fn begin_or_resume(
        &self,
        intent: &TransferIntent,
        existing_id: Option<&str>,
    ) -> TrackerResult<TxRecord> {
        if let Some(id) = existing_id {
            if let Some(record) = self.store.get(id).await {
                debug!("Resuming transaction {}", id);
                return Ok(record);
            }
        }

        let id = existing_id
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let record = TxRecord::new(&id, intent);

        let records = self
            .store
            .update(move |records| {
                // a concurrent begin with the same id must not duplicate
                if records.iter().any(|r| r.id == record.id) {
                    return Ok(());
                }
                records.push(record);
                Ok(())
            })
            .await?;

        let created = records
            .into_iter()
            .find(|r| r.id == id)
            .ok_or_else(|| TrackerError::Internal(format!("record {} vanished after create", id)))?;
        info!(
            "Created transaction {} ({} {} -> {})",
            created.id, created.value, created.token, created.to
        );
        Ok(created)
    }

    /// Record the signer's outcome: attach the hash (status stays pending
    /// until the local receipt is observed) or reject with the signer's
    /// message.
    pub async fn confirm_send(&self, id: &str, outcome: SendOutcome) -> TrackerResult<TxRecord> {
        let target = id.to_string();
        let records = self
            .store
            .update(move |records| {
                let record = records
                    .iter_mut()
                    .find(|r| r.id == target)
                    .ok_or(TrackerError::RecordNotFound { id: target.clone() })?;
                match &outcome {
                    SendOutcome::Sent { hash } => record.attach_hash(hash),
                    SendOutcome::Error { message } => {
                        if record.status.is_terminal() {
                            warn!(
                                "Ignoring late signer error for {} ({}): {}",
                                record.id, record.status, message
                            );
                            Ok(())
                        } else {
                            record.mark_rejected(Some(message.clone()))
                        }
                    }
                }
            })
            .await?;

        let updated = records
            .into_iter()
            .find(|r| r.id == id)
            .ok_or_else(|| TrackerError::RecordNotFound { id: id.to_string() })?;
        match (&updated.hash, &updated.error) {
            (Some(hash), _) => info!("Transaction {} broadcast as {}", updated.id, hash),
            (None, Some(error)) => info!("Transaction {} rejected: {}", updated.id, error),
            _ => {}
        }
        Ok(updated)
    }

    /// User-initiated decline before any signer interaction. Carries no
    /// error message. A record whose hash is already on the wire cannot be
    /// recalled, so the decline is ignored for it.
    pub async fn reject(&self, id: &str) -> TrackerResult<TxRecord> {
        let target = id.to_string();
        let records = self
            .store
            .update(move |records| {
                let record = records
                    .iter_mut()
                    .find(|r| r.id == target)
                    .ok_or(TrackerError::RecordNotFound { id: target.clone() })?;
                if record.hash.is_some() {
                    debug!("Decline after broadcast for {}, keeping lifecycle", record.id);
                    return Ok(());
                }
                if !record.status.is_terminal() {
                    record.mark_rejected(None)?;
                }
                Ok(())
            })
            .await?;

        records
            .into_iter()
            .find(|r| r.id == id)
            .ok_or_else(|| TrackerError::RecordNotFound { id: id.to_string() })
    }
}
