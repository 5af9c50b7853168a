//! Periodic expiry sweep.
//!
//! Expiry is settled by a recurring scan over the store rather than a
//! per-payment timer. A timer fires once and is lost on restart; the
//! sweep re-derives the expirable set from persisted deadlines on every
//! tick, so a missed tick only delays an expiry, never loses it.

use crate::payment::PaymentManager;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Handle to a running expiry sweeper.
pub struct ExpirySweeper {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl ExpirySweeper {
    /// Spawn the sweep loop. The interval comes from the manager's
    /// configuration. Housekeeping piggybacks on the same tick.
    #[must_use]
    pub fn spawn(manager: Arc<PaymentManager>) -> Self {
        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let interval = std::time::Duration::from_secs(manager.config().sweep_interval_secs);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The immediate first tick catches payments that expired while
            // the process was down.
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = manager.sweep_expired().await {
                            warn!("Expiry sweep failed: {e}");
                        }
                        if let Err(e) = manager.housekeep().await {
                            warn!("Housekeeping failed: {e}");
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            debug!("Expiry sweeper shutting down");
                            break;
                        }
                    }
                }
            }
        });

        info!("Expiry sweeper started (interval {}s)", interval.as_secs());
        Self { shutdown, handle }
    }

    /// Stop the sweep loop and wait for it to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.handle.await {
            warn!("Expiry sweeper task panicked: {e}");
        }
    }
}
