//! Periodic reaping of expired refresh tokens

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{error, info};

use super::ledger::RefreshTokenLedger;

/// Delete expired refresh tokens once; returns how many went
pub async fn run_cleanup(ledger: &RefreshTokenLedger) -> u64 {
    match ledger.delete_expired().await {
        Ok(count) => {
            if count > 0 {
                info!(count, "Cleaned up expired refresh tokens");
            }
            count
        }
        Err(e) => {
            error!(error = %e, "Failed to clean up expired refresh tokens");
            0
        }
    }
}

/// Run [`run_cleanup`] every `every`, starting immediately.
/// Abort the returned handle to stop it.
pub fn spawn_cleanup_scheduler(ledger: RefreshTokenLedger, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            run_cleanup(&ledger).await;
        }
    })
}
