//! Transfer Tracker - client-side transaction lifecycle tracking
//!
//! With a transfer deep link on the command line, runs the submission flow
//! (wallet handoff, signing, outcome capture) for it; with no argument,
//! only resumes confirmation tracking for the stored history. Either way
//! the confirmation poller keeps running until shutdown or until every
//! record is terminal.

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

use transfer_tracker::config::Settings;
use transfer_tracker::history::{truncate_hex, HistoryView};
use transfer_tracker::host::NullShell;
use transfer_tracker::ledger::EthersLedger;
use transfer_tracker::poller::ConfirmationPoller;
use transfer_tracker::store::{FileBackend, TxStore};
use transfer_tracker::submit::{SubmissionCoordinator, TransferFlow, TransferLink};
use transfer_tracker::wallet::LocalWalletConnector;

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    info!("Starting Transfer Tracker v{}", env!("CARGO_PKG_VERSION"));

    let settings = Settings::load()?;

    let store = Arc::new(TxStore::new(Arc::new(FileBackend::new(
        &settings.storage.path,
    ))));
    let ledger = Arc::new(EthersLedger::new(&settings.ledger)?);
    if !ledger.health_check().await {
        warn!("Active ledger endpoint unhealthy, relying on failover");
    }
    let shell = Arc::new(NullShell::new(settings.tracker.device_class));

    let poller = Arc::new(ConfirmationPoller::new(
        store.clone(),
        ledger.clone(),
        &settings.tracker,
    ));
    poller.poke().await;

    if let Some(raw_link) = std::env::args().nth(1) {
        let link = TransferLink::parse(&raw_link).context("Invalid transfer link")?;
        // rpc_urls is validated non-empty at config load
        let rpc_url = settings.ledger.rpc_urls.first().cloned().unwrap_or_default();
        let connector = Arc::new(LocalWalletConnector::new(
            &settings.wallet,
            &rpc_url,
            settings.ledger.chain_id,
        )?);
        let flow = TransferFlow::new(
            SubmissionCoordinator::new(store.clone()),
            connector,
            shell.clone(),
            settings.clone(),
        );
        match flow.run(&link).await {
            Ok(record) => {
                info!("Transaction {} recorded with status {}", record.id, record.status);
                // a newly attached hash may need watching
                poller.poke().await;
            }
            Err(e) => error!("Transfer flow failed: {}", e),
        }
    }

    let history = HistoryView::new(
        store.clone(),
        &settings.ledger.explorer_base,
        &settings.tracker.resume_link_base,
    );
    for entry in history.load().await {
        info!(
            "{:8} {} {} -> {} {}",
            entry.record.status.to_string(),
            entry.record.value,
            entry.record.token,
            truncate_hex(&entry.record.to),
            entry.link.as_deref().unwrap_or("-"),
        );
    }

    info!("Tracking confirmations; Ctrl+C to exit");
    shutdown_signal().await;

    info!("Shutdown signal received, stopping...");
    poller.stop().await;
    info!("Transfer Tracker stopped");
    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,transfer_tracker=debug,hyper=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
