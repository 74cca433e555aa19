//! Recurring execution of the maintenance scan.
//!
//! The scheduler owns a `tokio` interval and runs one scan per tick. Scans
//! never overlap: ticks that fire while a scan is still running are skipped,
//! and a manual [`MaintenanceScheduler::run_once`] that races a running scan
//! returns `None` instead of starting a second one.

use crate::scanner::{MaintenanceScanner, ScanReport};
use crate::store::StoreError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Shortest period the scan loop accepts.
pub const MIN_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Clone)]
pub struct MaintenanceScheduler {
    scanner: Arc<MaintenanceScanner>,
    interval: Duration,
    in_flight: Arc<Mutex<()>>,
}

impl MaintenanceScheduler {
    /// Creates a scheduler that scans every `interval`; the first scan runs
    /// immediately. Intervals shorter than [`MIN_INTERVAL`] are raised to it.
    pub fn new(scanner: Arc<MaintenanceScanner>, interval: Duration) -> Self {
        let interval = if interval < MIN_INTERVAL {
            warn!(
                "Scan interval {:?} is below the minimum; using {:?}.",
                interval, MIN_INTERVAL
            );
            MIN_INTERVAL
        } else {
            interval
        };
        Self {
            scanner,
            interval,
            in_flight: Arc::new(Mutex::new(())),
        }
    }

    /// Runs a single scan unless one is already in progress.
    ///
    /// # Returns
    /// * `None` if another scan holds the guard
    /// * `Some(result)` with the outcome of the scan otherwise
    pub async fn run_once(&self) -> Option<Result<ScanReport, StoreError>> {
        let Ok(_guard) = self.in_flight.try_lock() else {
            warn!("Maintenance scan already running; skipping this trigger.");
            return None;
        };
        Some(self.scanner.scan_today().await)
    }

    /// Runs the scan loop until `shutdown_rx` changes or its sender is dropped.
    pub async fn run(self, mut shutdown_rx: watch::Receiver<bool>) {
        let mut timer = interval(self.interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(
            "Maintenance scheduler started with a {}s interval.",
            self.interval.as_secs()
        );

        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.changed() => {
                    info!("Maintenance scheduler received shutdown signal.");
                    break;
                }
                _ = timer.tick() => {
                    match self.run_once().await {
                        Some(Ok(report)) => {
                            debug!(dispatched = report.dispatched, "Scheduled scan finished");
                        }
                        Some(Err(e)) => {
                            error!("Scheduled maintenance scan failed: {}", e);
                        }
                        None => {}
                    }
                }
            }
        }
        info!("Maintenance scheduler finished.");
    }

    /// Spawns the scan loop and returns a handle that stops it.
    pub fn start(self) -> SchedulerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let join = tokio::spawn(self.run(shutdown_rx));
        SchedulerHandle { shutdown_tx, join }
    }
}

/// Controls a scheduler spawned with [`MaintenanceScheduler::start`].
pub struct SchedulerHandle {
    shutdown_tx: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Signals the loop to stop and waits for the current scan to finish.
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.join.await {
            error!("Maintenance scheduler task panicked: {:?}", e);
        }
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}
