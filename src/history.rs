//! History view model
//!
//! Pure derive layer over the store: most recent first, deduplicated by id
//! with the latest stored write winning. Holds no source of truth of its
//! own; the poller persists its own discoveries.

use crate::store::{TxRecord, TxStatus, TxStore};

use std::collections::HashSet;
use std::sync::Arc;

pub struct HistoryView {
    store: Arc<TxStore>,
    explorer_base: String,
    resume_base: String,
}

/// One display-ready history row
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub record: TxRecord,
    /// Explorer link once broadcast, resume deep link while unsigned,
    /// nothing for rejected records
    pub link: Option<String>,
}

impl HistoryView {
    pub fn new(
        store: Arc<TxStore>,
        explorer_base: impl Into<String>,
        resume_base: impl Into<String>,
    ) -> Self {
        Self {
            store,
            explorer_base: explorer_base.into(),
            resume_base: resume_base.into(),
        }
    }

    /// Project the store into a display-ordered list, newest first
    pub async fn load(&self) -> Vec<HistoryEntry> {
        let records = self.store.load_all().await;

        let mut seen = HashSet::new();
        let mut entries = Vec::new();
        // storage order is oldest first; walking backwards both reverses
        // for display and lets later writes shadow earlier duplicates
        for record in records.into_iter().rev() {
            if !seen.insert(record.id.clone()) {
                continue;
            }
            let link = self.link_for(&record);
            entries.push(HistoryEntry { record, link });
        }
        entries
    }

    fn link_for(&self, record: &TxRecord) -> Option<String> {
        if record.status == TxStatus::Rejected {
            return None;
        }
        Some(match &record.hash {
            Some(hash) => format!("{}{}", self.explorer_base, hash),
            None => format!(
                "{}?to={}&value={}&token={}&id={}",
                self.resume_base, record.to, record.value, record.token, record.id
            ),
        })
    }
}

/// Shorten an address or hash for display: `0xAB...1234`
pub fn truncate_hex(value: &str) -> String {
    if value.len() < 9 || !value.is_ascii() {
        return value.to_string();
    }
    format!("{}...{}", &value[..4], &value[value.len() - 4..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryBackend;
    use crate::submit::TransferIntent;

    fn record(id: &str) -> TxRecord {
        let intent = TransferIntent::new("0xABC0000000000000000000000000000000001234", "0.5", "ETH")
            .expect("valid intent");
        TxRecord::new(id, &intent)
    }

    fn view(store: Arc<TxStore>) -> HistoryView {
        HistoryView::new(
            store,
            "https://etherscan.io/tx/",
            "https://tracker.example/transaction",
        )
    }

    #[tokio::test]
    async fn entries_come_back_newest_first() {
        let store = Arc::new(TxStore::new(Arc::new(MemoryBackend::new())));
        store
            .save_all(&[record("old"), record("mid"), record("new")])
            .await
            .expect("seed");

        let entries = view(store).load().await;
        let ids: Vec<_> = entries.iter().map(|e| e.record.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);
    }

    #[tokio::test]
    async fn duplicate_ids_collapse_to_the_latest_write() {
        let store = Arc::new(TxStore::new(Arc::new(MemoryBackend::new())));
        let stale = record("dup");
        let mut fresh = record("dup");
        fresh.attach_hash("0xHASH1").expect("attach");
        store.save_all(&[stale, fresh]).await.expect("seed");

        let entries = view(store).load().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].record.hash.as_deref(), Some("0xHASH1"));
    }

    #[tokio::test]
    async fn link_selection_follows_record_state() {
        let store = Arc::new(TxStore::new(Arc::new(MemoryBackend::new())));
        let unsigned = record("unsigned");
        let mut broadcast = record("broadcast");
        broadcast.attach_hash("0xHASH1").expect("attach");
        let mut rejected = record("rejected");
        rejected.mark_rejected(None).expect("reject");
        store
            .save_all(&[unsigned, broadcast, rejected])
            .await
            .expect("seed");

        let entries = view(store).load().await;
        let by_id = |id: &str| {
            entries
                .iter()
                .find(|e| e.record.id == id)
                .expect("entry present")
        };
        assert_eq!(by_id("rejected").link, None);
        assert_eq!(
            by_id("broadcast").link.as_deref(),
            Some("https://etherscan.io/tx/0xHASH1")
        );
        assert_eq!(
            by_id("unsigned").link.as_deref(),
            Some(
                "https://tracker.example/transaction?to=0xABC0000000000000000000000000000000001234&value=0.5&token=ETH&id=unsigned"
            )
        );
    }

    #[test]
    fn truncates_long_hex_strings_only() {
        assert_eq!(
            truncate_hex("0xABC0000000000000000000000000000000001234"),
            "0xAB...1234"
        );
        assert_eq!(truncate_hex("0xAB12"), "0xAB12");
    }
}
