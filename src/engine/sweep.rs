//! Background sweep that retires idle channels.

use super::channels::announce_deleted;
use crate::db::{DbError, channels};
use crate::state::Hub;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Soft-delete every live channel whose last activity is older than
/// the configured window. Each channel is swept in its own
/// transaction, so one failure never blocks the rest of the pass.
/// Returns how many channels were retired.
pub async fn run_once(hub: &Hub) -> Result<usize, DbError> {
    let cutoff = chrono::Utc::now().timestamp() - hub.config.sweep.inactive_days * 86_400;

    let stale = {
        let mut conn = hub.db.conn().await?;
        channels::inactive_since(&mut conn, cutoff).await?
    };

    let mut swept = 0;
    for channel in &stale {
        let result = async {
            let mut tx = hub.db.begin().await?;
            let deleted = channels::soft_delete(&mut tx, &channel.id).await?;
            tx.commit().await?;
            Ok::<bool, DbError>(deleted)
        }
        .await;

        match result {
            Ok(true) => {
                announce_deleted(hub, channel);
                info!(channel = %channel.name, "Inactive channel retired");
                swept += 1;
            }
            Ok(false) => {}
            Err(e) => {
                warn!(channel = %channel.name, error = %e, "Sweep failed for channel");
            }
        }
    }
    Ok(swept)
}

/// Run the sweep once at startup, then on the configured interval.
pub fn spawn(hub: Arc<Hub>) {
    let interval = Duration::from_secs(hub.config.sweep.interval_secs);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            match run_once(&hub).await {
                Ok(0) => {}
                Ok(n) => info!(swept = n, "Inactivity sweep finished"),
                Err(e) => warn!(error = %e, "Inactivity sweep failed"),
            }
        }
    });
}
