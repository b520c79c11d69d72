use tokio::time::{Duration, interval};
use tracing::{debug, error};

use super::refresh::CrlRefresher;

/// Scheduler for periodic CRL refresh
pub struct CrlScheduler {
    refresher: CrlRefresher,
    check_interval: Duration,
}

impl CrlScheduler {
    pub fn new(refresher: CrlRefresher, check_interval_secs: u64) -> Self {
        Self {
            refresher,
            check_interval: Duration::from_secs(check_interval_secs),
        }
    }

    /// Start the scheduler (spawns background task)
    pub fn start(self) -> tokio::task::JoinHandle<()> {
        debug!(
            "Starting CRL scheduler with interval of {} seconds",
            self.check_interval.as_secs()
        );

        tokio::spawn(async move {
            let mut ticker = interval(self.check_interval);
            ticker.tick().await; // First tick completes immediately

            loop {
                ticker.tick().await;
                debug!("Running scheduled CRL refresh");

                if let Err(e) = self.refresher.refresh_crl().await {
                    error!("Scheduled CRL refresh failed: {}", e);
                }
            }
        })
    }
}
