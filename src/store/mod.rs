//! Durable transaction history
//!
//! The store is the single shared mutable resource in the system. Every
//! mutation path goes through [`TxStore::update`], which re-reads the
//! current collection before merging its change, so no caller can write
//! back a snapshot captured before a suspension point.

mod backend;
mod record;

pub use backend::{FileBackend, MemoryBackend, StorageBackend};
pub use record::{TxRecord, TxStatus};

use crate::error::{TrackerError, TrackerResult};

use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Owner of the persisted transaction collection
pub struct TxStore {
    backend: Arc<dyn StorageBackend>,
    // once the primary medium refuses a write, records live here for the
    // rest of the session
    session: MemoryBackend,
    degraded: AtomicBool,
    // serializes read-modify-write cycles across concurrent tasks
    write_lock: Mutex<()>,
}

impl TxStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            backend,
            session: MemoryBackend::new(),
            degraded: AtomicBool::new(false),
            write_lock: Mutex::new(()),
        }
    }

    fn medium(&self) -> &dyn StorageBackend {
        if self.degraded.load(Ordering::Acquire) {
            &self.session
        } else {
            self.backend.as_ref()
        }
    }

    /// Load all records in storage order, oldest first.
    ///
    /// Never fails: an unreadable medium yields an empty collection and
    /// malformed elements are discarded rather than surfaced.
    pub async fn load_all(&self) -> Vec<TxRecord> {
        let raw = match self.medium().read().await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!("Transaction history unreadable: {}", e);
                return Vec::new();
            }
        };
        decode(&raw)
    }

    /// Atomically replace the persisted collection.
    ///
    /// An unavailable medium does not fail the operation: the collection
    /// moves to session memory and every later read and write stays there,
    /// so the caller's mutation survives until the process exits.
    pub async fn save_all(&self, records: &[TxRecord]) -> TrackerResult<()> {
        let payload =
            serde_json::to_string(records).map_err(|e| TrackerError::Storage(e.to_string()))?;
        if self.degraded.load(Ordering::Acquire) {
            return self.session.write(&payload).await;
        }
        if let Err(e) = self.backend.write(&payload).await {
            warn!("Storage unavailable, keeping transaction history in memory for this session: {}", e);
            self.degraded.store(true, Ordering::Release);
            return self.session.write(&payload).await;
        }
        Ok(())
    }

    /// Read-modify-write against the current collection.
    ///
    /// The closure sees the latest persisted state, not anything the caller
    /// captured earlier. Returns the collection as written.
    pub async fn update<F>(&self, mutate: F) -> TrackerResult<Vec<TxRecord>>
    where
        F: FnOnce(&mut Vec<TxRecord>) -> TrackerResult<()> + Send,
    {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load_all().await;
        mutate(&mut records)?;
        self.save_all(&records).await?;
        Ok(records)
    }

    /// Fetch a single record by id
    pub async fn get(&self, id: &str) -> Option<TxRecord> {
        self.load_all().await.into_iter().find(|r| r.id == id)
    }
}

/// Lenient decode: non-array content is discarded wholesale, elements that
/// fail schema validation are dropped individually.
fn decode(raw: &str) -> Vec<TxRecord> {
    let parsed: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            warn!("Transaction history corrupt, starting empty: {}", e);
            return Vec::new();
        }
    };

    let items = match parsed {
        Value::Array(items) => items,
        other => {
            warn!("Transaction history is not an array ({}), starting empty", json_kind(&other));
            return Vec::new();
        }
    };

    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<TxRecord>(item) {
            Ok(record) => Some(record),
            Err(e) => {
                debug!("Dropping malformed history entry: {}", e);
                None
            }
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
