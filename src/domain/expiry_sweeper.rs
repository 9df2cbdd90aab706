//! Background task that periodically purges expired aliases.
//!
//! Resolution and listing already hide expired records, so the sweep only
//! reclaims storage and frees codes.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, warn};

use crate::domain::repositories::AliasRepository;

/// Runs the sweep loop until `shutdown` flips to `true` or its sender is dropped.
///
/// Each tick deletes every record whose `expires_at` has passed. Store errors
/// are logged and the loop continues on the next tick.
pub async fn run_expiry_sweeper(
    repository: Arc<dyn AliasRepository>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(period_secs = period.as_secs(), "Expiry sweeper started");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                sweep_once(repository.as_ref()).await;
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }

    info!("Expiry sweeper stopped");
}

/// Performs a single sweep pass and returns how many records were removed.
pub async fn sweep_once(repository: &dyn AliasRepository) -> u64 {
    match repository.delete_expired(Utc::now()).await {
        Ok(0) => {
            debug!("Expiry sweep: nothing to delete");
            0
        }
        Ok(n) => {
            info!(deleted = n, "Expiry sweep removed expired aliases");
            n
        }
        Err(e) => {
            warn!(error = %e, "Expiry sweep failed");
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::MockAliasRepository;
    use crate::error::AppError;
    use serde_json::json;

    #[tokio::test]
    async fn test_sweep_once_reports_deleted_count() {
        let mut repo = MockAliasRepository::new();
        repo.expect_delete_expired().times(1).returning(|_| Ok(3));

        assert_eq!(sweep_once(&repo).await, 3);
    }

    #[tokio::test]
    async fn test_sweep_once_swallows_store_errors() {
        let mut repo = MockAliasRepository::new();
        repo.expect_delete_expired()
            .times(1)
            .returning(|_| Err(AppError::internal("db down", json!({}))));

        assert_eq!(sweep_once(&repo).await, 0);
    }

    #[tokio::test]
    async fn test_sweeper_stops_on_shutdown() {
        let mut repo = MockAliasRepository::new();
        repo.expect_delete_expired().returning(|_| Ok(0));

        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(run_expiry_sweeper(
            Arc::new(repo),
            Duration::from_secs(3600),
            rx,
        ));

        tx.send(true).unwrap();

        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("sweeper did not stop")
            .unwrap();
    }
}
