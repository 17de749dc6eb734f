//! Confirmation poller
//!
//! On a fixed interval, re-reads every non-terminal record with a known
//! hash, queries the ledger, and persists terminal success immediately. The
//! loop exits when no qualifying record remains and is restarted with
//! [`ConfirmationPoller::poke`]; [`ConfirmationPoller::stop`] cancels it on
//! view teardown so no timer fires afterwards.

use crate::config::TrackerConfig;
use crate::error::TrackerResult;
use crate::ledger::{Finality, LedgerClient};
use crate::store::{TxRecord, TxStore};

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, error, info, warn};

pub struct ConfirmationPoller {
    store: Arc<TxStore>,
    ledger: Arc<dyn LedgerClient>,
    poll_interval: Duration,
    max_backoff_cycles: u32,
    shutdown: watch::Sender<bool>,
    // bumped by poke() while the loop runs; the loop re-reads it before
    // parking so a wakeup sent mid-cycle is never lost
    wake: watch::Sender<u64>,
    task: Mutex<PollTask>,
}

#[derive(Default)]
struct PollTask {
    handle: Option<JoinHandle<()>>,
    running: bool,
}

enum CycleResult {
    /// At least one record still awaits confirmation
    Active,
    /// Nothing qualifies; the loop can park
    Idle,
}

/// Per-record query failure bookkeeping for backoff
#[derive(Default)]
struct BackoffState {
    failures: HashMap<String, u32>,
    skip_cycles: HashMap<String, u32>,
}

impl ConfirmationPoller {
    pub fn new(store: Arc<TxStore>, ledger: Arc<dyn LedgerClient>, config: &TrackerConfig) -> Self {
        let (shutdown, _) = watch::channel(false);
        let (wake, _) = watch::channel(0);
        Self {
            store,
            ledger,
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            max_backoff_cycles: config.max_backoff_cycles.max(1),
            shutdown,
            wake,
            task: Mutex::new(PollTask::default()),
        }
    }

    /// Start the loop if it is not running, or signal the running loop so a
    /// record that gained its hash mid-cycle is picked up instead of the
    /// loop parking. Safe to call whenever a record gains a hash.
    pub async fn poke(self: &Arc<Self>) {
        let mut task = self.task.lock().await;
        if task.running {
            self.wake.send_modify(|generation| *generation += 1);
            return;
        }
        let _ = self.shutdown.send(false);
        task.running = true;
        let poller = Arc::clone(self);
        task.handle = Some(tokio::spawn(async move { poller.run().await }));
    }

    /// Cancel the loop and wait for it to wind down. No tick fires after
    /// this returns.
    pub async fn stop(&self) {
        let _ = self.shutdown.send(true);
        let handle = self.task.lock().await.handle.take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    /// One immediate pass over the qualifying records, outside the interval
    /// loop. Returns `true` if any record still awaits confirmation.
    pub async fn run_once(&self) -> bool {
        let mut backoff = BackoffState::default();
        matches!(self.cycle(&mut backoff).await, CycleResult::Active)
    }

    async fn run(&self) {
        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut shutdown = self.shutdown.subscribe();
        let wake = self.wake.subscribe();
        let mut backoff = BackoffState::default();

        info!("Confirmation poller started");
        loop {
            let wake_generation = *wake.borrow();
            tokio::select! {
                _ = ticker.tick() => {
                    if let CycleResult::Idle = self.cycle(&mut backoff).await {
                        // the park decision and poke() serialize on the task
                        // lock; a poke that landed during this cycle bumped
                        // the generation and keeps the loop alive
                        let mut task = self.task.lock().await;
                        if *wake.borrow() != wake_generation {
                            continue;
                        }
                        task.running = false;
                        info!("No transactions awaiting confirmation, poller parked");
                        break;
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        self.task.lock().await.running = false;
                        debug!("Confirmation poller cancelled");
                        break;
                    }
                }
            }
        }
    }

    /// One poll cycle: sequential receipt queries, immediate persistence of
    /// any finalized success. A failing query never aborts the cycle for
    /// the other records.
    async fn cycle(&self, backoff: &mut BackoffState) -> CycleResult {
        let candidates: Vec<TxRecord> = self
            .store
            .load_all()
            .await
            .into_iter()
            .filter(|r| r.needs_confirmation())
            .collect();
        if candidates.is_empty() {
            return CycleResult::Idle;
        }

        for record in candidates {
            if let Some(skip) = backoff.skip_cycles.get_mut(&record.id) {
                if *skip > 0 {
                    *skip -= 1;
                    continue;
                }
            }
            let hash = match &record.hash {
                Some(hash) => hash.clone(),
                None => continue,
            };

            match self.ledger.get_receipt(&hash).await {
                Ok(Some(receipt)) if receipt.finality == Finality::Success => {
                    backoff.failures.remove(&record.id);
                    backoff.skip_cycles.remove(&record.id);
                    if let Err(e) = self.mark_success(&record.id).await {
                        error!("Failed to persist confirmation for {}: {}", record.id, e);
                    }
                }
                Ok(Some(_)) => {
                    // mined but not successful; keep watching in case a
                    // replacement under the same hash view lands
                    debug!("Receipt for {} reports failure, leaving record as-is", record.id);
                    backoff.failures.remove(&record.id);
                }
                Ok(None) => {
                    backoff.failures.remove(&record.id);
                    backoff.skip_cycles.remove(&record.id);
                    debug!("Transaction {} not yet mined", record.id);
                }
                Err(e) => {
                    let count = backoff.failures.entry(record.id.clone()).or_insert(0);
                    *count += 1;
                    let cycles = backoff_cycles(*count, self.max_backoff_cycles);
                    backoff.skip_cycles.insert(record.id.clone(), cycles);
                    if cycles >= self.max_backoff_cycles {
                        warn!(
                            "Ledger query for {} failing persistently ({} attempts): {}",
                            record.id, count, e
                        );
                    } else {
                        debug!(
                            "Ledger query for {} failed (attempt {}), next try in {} cycles: {}",
                            record.id, count, cycles, e
                        );
                    }
                }
            }
        }

        CycleResult::Active
    }

    /// Persist finality against the current stored state. Another path may
    /// have advanced the record since this cycle loaded it, so terminal
    /// records are left alone.
    async fn mark_success(&self, id: &str) -> TrackerResult<()> {
        let target = id.to_string();
        self.store
            .update(move |records| {
                if let Some(record) = records.iter_mut().find(|r| r.id == target) {
                    if !record.status.is_terminal() {
                        record.mark_finalized()?;
                    }
                }
                Ok(())
            })
            .await?;
        info!("Transaction {} confirmed", id);
        Ok(())
    }
}

/// Cycles to skip after `consecutive_failures` failed queries, doubling up
/// to the configured cap
fn backoff_cycles(consecutive_failures: u32, cap: u32) -> u32 {
    2u32.saturating_pow(consecutive_failures.saturating_sub(1)).min(cap)
}
