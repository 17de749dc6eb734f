//! End-to-end lifecycle scenarios over in-memory collaborators

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use transfer_tracker::config::{
    DeviceClass, LedgerConfig, Settings, StorageConfig, TrackerConfig, WalletConfig,
};
use transfer_tracker::error::TrackerResult;
use transfer_tracker::host::NullShell;
use transfer_tracker::ledger::{Finality, LedgerClient, Receipt};
use transfer_tracker::poller::ConfirmationPoller;
use transfer_tracker::store::{MemoryBackend, StorageBackend, TxStatus, TxStore};
use transfer_tracker::submit::{
    SubmissionCoordinator, TransferFlow, TransferIntent, TransferLink,
};
use transfer_tracker::wallet::{ConnectionStatus, SendOutcome, WalletConnector};

struct FakeLedger {
    receipts: Mutex<HashMap<String, Receipt>>,
}

impl FakeLedger {
    fn new() -> Self {
        Self {
            receipts: Mutex::new(HashMap::new()),
        }
    }

    async fn finalize(&self, hash: &str) {
        self.receipts.lock().await.insert(
            hash.to_string(),
            Receipt {
                finality: Finality::Success,
                block_number: Some(100),
            },
        );
    }
}

#[async_trait]
impl LedgerClient for FakeLedger {
    async fn get_receipt(&self, hash: &str) -> TrackerResult<Option<Receipt>> {
        Ok(self.receipts.lock().await.get(hash).cloned())
    }
}

struct FakeConnector {
    outcome: SendOutcome,
}

#[async_trait]
impl WalletConnector for FakeConnector {
    fn status(&self) -> ConnectionStatus {
        ConnectionStatus::Connected
    }

    fn address(&self) -> Option<String> {
        Some("0xFEED000000000000000000000000000000000001".to_string())
    }

    async fn connect(&self) -> TrackerResult<()> {
        Ok(())
    }

    async fn send(&self, _to: &str, _value: &str, _token: &str) -> SendOutcome {
        self.outcome.clone()
    }
}

fn settings() -> Settings {
    Settings {
        tracker: TrackerConfig {
            poll_interval_secs: 1,
            max_backoff_cycles: 8,
            handoff_fallback_ms: 30,
            handoff_install_ms: 80,
            device_class: DeviceClass::Desktop,
            resume_link_base: "https://tracker.example/transaction".to_string(),
        },
        storage: StorageConfig {
            path: "/tmp/unused.json".into(),
        },
        ledger: LedgerConfig {
            chain_id: 1,
            rpc_urls: vec!["https://rpc.example".to_string()],
            explorer_base: "https://etherscan.io/tx/".to_string(),
        },
        wallet: WalletConfig {
            deep_link: "wallet://".to_string(),
            fallback_link: "https://wallet.example/open".to_string(),
            install_link: "https://wallet.example/install".to_string(),
            private_key_env: None,
        },
    }
}

fn store() -> Arc<TxStore> {
    Arc::new(TxStore::new(Arc::new(MemoryBackend::new())))
}

fn intent() -> TransferIntent {
    TransferIntent::new("0xABC0000000000000000000000000000000001234", "0.5", "ETH")
        .expect("valid intent")
}

#[tokio::test]
async fn happy_path_pending_to_hash_to_success() {
    let store = store();
    let coordinator = SubmissionCoordinator::new(store.clone());
    let ledger = Arc::new(FakeLedger::new());

    // intent with no id: fresh pending record, hash absent
    let record = coordinator.begin_or_resume(&intent(), None).await.expect("begin");
    assert_eq!(record.status, TxStatus::Pending);
    assert!(record.hash.is_none());

    // signer returns a hash: attached, status still pending
    let record = coordinator
        .confirm_send(&record.id, SendOutcome::Sent { hash: "0xHASH1".into() })
        .await
        .expect("confirm");
    assert_eq!(record.status, TxStatus::Pending);
    assert_eq!(record.hash.as_deref(), Some("0xHASH1"));

    // ledger reports a finalized-success receipt: poller advances to success
    ledger.finalize("0xHASH1").await;
    let poller = ConfirmationPoller::new(store.clone(), ledger, &settings().tracker);
    poller.run_once().await;

    let record = store.get(&record.id).await.expect("record present");
    assert_eq!(record.status, TxStatus::Success);
}

#[tokio::test]
async fn signer_error_scenario_records_rejection() {
    let store = store();
    let coordinator = SubmissionCoordinator::new(store.clone());

    let record = coordinator.begin_or_resume(&intent(), None).await.expect("begin");
    let record = coordinator
        .confirm_send(
            &record.id,
            SendOutcome::Error { message: "User rejected".into() },
        )
        .await
        .expect("confirm");

    assert_eq!(record.status, TxStatus::Rejected);
    assert_eq!(record.error.as_deref(), Some("User rejected"));
    assert!(record.hash.is_none());
}

#[tokio::test]
async fn concurrent_signer_and_poller_updates_do_not_clobber() {
    let store = store();
    let coordinator = Arc::new(SubmissionCoordinator::new(store.clone()));
    let ledger = Arc::new(FakeLedger::new());

    // A is awaiting its hash, B is already broadcast and about to finalize
    let a = coordinator.begin_or_resume(&intent(), None).await.expect("begin a");
    let b = coordinator.begin_or_resume(&intent(), None).await.expect("begin b");
    coordinator
        .confirm_send(&b.id, SendOutcome::Sent { hash: "0xHASHB".into() })
        .await
        .expect("broadcast b");
    ledger.finalize("0xHASHB").await;

    let poller = Arc::new(ConfirmationPoller::new(
        store.clone(),
        ledger,
        &settings().tracker,
    ));

    let coord = coordinator.clone();
    let a_id = a.id.clone();
    let attach = tokio::spawn(async move {
        coord
            .confirm_send(&a_id, SendOutcome::Sent { hash: "0xHASHA".into() })
            .await
    });
    let confirm = tokio::spawn(async move { poller.run_once().await });

    attach.await.expect("join").expect("attach a");
    confirm.await.expect("join");

    let a = store.get(&a.id).await.expect("a present");
    let b = store.get(&b.id).await.expect("b present");
    assert_eq!(a.hash.as_deref(), Some("0xHASHA"));
    assert_eq!(b.status, TxStatus::Success);
}

#[tokio::test]
async fn restart_resumes_records_from_the_same_backend() {
    let backend: Arc<dyn StorageBackend> = Arc::new(MemoryBackend::new());

    let first = TxStore::new(backend.clone());
    let coordinator = SubmissionCoordinator::new(Arc::new(first));
    let record = coordinator.begin_or_resume(&intent(), None).await.expect("begin");
    coordinator
        .confirm_send(&record.id, SendOutcome::Sent { hash: "0xHASH1".into() })
        .await
        .expect("confirm");

    // "restart": a fresh store over the same medium sees the same record
    let second = Arc::new(TxStore::new(backend));
    let resumed = SubmissionCoordinator::new(second.clone())
        .begin_or_resume(&intent(), Some(&record.id))
        .await
        .expect("resume");
    assert_eq!(resumed.id, record.id);
    assert_eq!(resumed.hash.as_deref(), Some("0xHASH1"));
    assert_eq!(second.load_all().await.len(), 1);
}

#[tokio::test]
async fn corrupt_medium_degrades_to_an_empty_history() {
    let backend = Arc::new(MemoryBackend::new());
    backend.write("][ truncated garbage").await.expect("seed");
    let store = Arc::new(TxStore::new(backend));

    assert!(store.load_all().await.is_empty());

    // and the flow still works on top of it
    let coordinator = SubmissionCoordinator::new(store.clone());
    let record = coordinator.begin_or_resume(&intent(), None).await.expect("begin");
    assert_eq!(store.load_all().await.len(), 1);
    assert_eq!(record.status, TxStatus::Pending);
}

#[tokio::test]
async fn desktop_flow_runs_link_to_broadcast() {
    let store = store();
    let flow = TransferFlow::new(
        SubmissionCoordinator::new(store.clone()),
        Arc::new(FakeConnector {
            outcome: SendOutcome::Sent { hash: "0xHASH1".into() },
        }),
        Arc::new(NullShell::new(DeviceClass::Desktop)),
        settings(),
    );

    let link = TransferLink::parse(
        "https://tracker.example/transaction?to=0xABC0000000000000000000000000000000001234&value=0.5&token=ETH&id=link-1",
    )
    .expect("valid link");

    let record = flow.run(&link).await.expect("flow");
    assert_eq!(record.id, "link-1");
    assert_eq!(record.status, TxStatus::Pending);
    assert_eq!(record.hash.as_deref(), Some("0xHASH1"));

    // re-running the same link resumes instead of signing again
    let resumed = flow.run(&link).await.expect("flow again");
    assert_eq!(resumed, record);
    assert_eq!(store.load_all().await.len(), 1);
}

#[tokio::test]
async fn mobile_flow_without_handoff_records_soft_rejection() {
    let store = store();
    let mut settings = settings();
    settings.tracker.device_class = DeviceClass::Mobile;

    // NullShell never reports backgrounding, so the handoff times out
    let flow = TransferFlow::new(
        SubmissionCoordinator::new(store.clone()),
        Arc::new(FakeConnector {
            outcome: SendOutcome::Sent { hash: "0xNEVER".into() },
        }),
        Arc::new(NullShell::new(DeviceClass::Mobile)),
        settings,
    );

    let link = TransferLink::parse(
        "https://tracker.example/transaction?to=0xABC0000000000000000000000000000000001234&value=0.5&token=ETH",
    )
    .expect("valid link");

    let record = flow.run(&link).await.expect("flow");
    assert_eq!(record.status, TxStatus::Rejected);
    assert_eq!(record.error.as_deref(), Some("Wallet handoff not detected"));
    assert!(record.hash.is_none());
}
