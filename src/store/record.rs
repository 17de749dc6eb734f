//! Transaction records and their lifecycle state machine

use crate::error::{TrackerError, TrackerResult};
use crate::submit::TransferIntent;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a tracked transaction
///
/// `rejected` and `success` are terminal. The only legal moves are
/// `pending -> waiting -> success` and `pending|waiting -> rejected`;
/// attaching a hash does not change status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    Rejected,
    Pending,
    Waiting,
    Success,
}

impl TxStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, TxStatus::Rejected | TxStatus::Success)
    }

    /// Whether `next` is a legal forward transition from this status
    pub fn can_advance_to(self, next: TxStatus) -> bool {
        use TxStatus::*;
        matches!(
            (self, next),
            (Pending, Waiting) | (Pending, Rejected) | (Waiting, Rejected) | (Waiting, Success)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TxStatus::Rejected => "rejected",
            TxStatus::Pending => "pending",
            TxStatus::Waiting => "waiting",
            TxStatus::Success => "success",
        }
    }
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One persisted transaction attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TxRecord {
    pub id: String,
    pub to: String,
    /// Decimal string, never a float; precision is preserved end to end
    pub value: String,
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    pub status: TxStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Records persisted by older versions carry no timestamp
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl TxRecord {
    /// Create a fresh pending record for a validated intent
    pub fn new(id: impl Into<String>, intent: &TransferIntent) -> Self {
        Self {
            id: id.into(),
            to: intent.to.clone(),
            value: intent.value.clone(),
            token: intent.token.clone(),
            hash: None,
            status: TxStatus::Pending,
            error: None,
            created_at: Utc::now(),
        }
    }

    /// Attach the broadcast hash. A hash, once set, never changes: a second
    /// attach with the same hash is a no-op, a conflicting one is refused.
    /// Status is left alone so an out-of-order hash arriving after a local
    /// rejection still gets recorded against the rejected record.
    pub fn attach_hash(&mut self, hash: &str) -> TrackerResult<()> {
        match &self.hash {
            Some(existing) if existing == hash => Ok(()),
            Some(existing) => Err(TrackerError::Internal(format!(
                "hash conflict on {}: {} already set, got {}",
                self.id, existing, hash
            ))),
            None => {
                self.hash = Some(hash.to_string());
                Ok(())
            }
        }
    }

    /// Advance to `next`, enforcing the transition table. Re-asserting the
    /// current status is accepted so duplicate event delivery stays harmless.
    pub fn transition(&mut self, next: TxStatus) -> TrackerResult<()> {
        if self.status == next {
            return Ok(());
        }
        if !self.status.can_advance_to(next) {
            return Err(TrackerError::InvalidStateTransition {
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        self.status = next;
        Ok(())
    }

    pub fn mark_rejected(&mut self, error: Option<String>) -> TrackerResult<()> {
        self.transition(TxStatus::Rejected)?;
        self.error = error;
        Ok(())
    }

    /// Record ledger finality. A record still in `pending` passes through
    /// `waiting` within the same update so no observable state change ever
    /// leaves the transition table.
    pub fn mark_finalized(&mut self) -> TrackerResult<()> {
        if self.status == TxStatus::Pending {
            self.transition(TxStatus::Waiting)?;
        }
        self.transition(TxStatus::Success)
    }

    /// Whether the confirmation poller should be watching this record
    pub fn needs_confirmation(&self) -> bool {
        matches!(self.status, TxStatus::Pending | TxStatus::Waiting) && self.hash.is_some()
    }
}
