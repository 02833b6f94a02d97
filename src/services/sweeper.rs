use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::core::Coordinator;
use crate::services::Outbox;

/// Run one expiry pass and queue the resulting notices; returns how many were queued
pub async fn sweep_once(coordinator: &Coordinator, outbox: &Outbox, now: DateTime<Utc>) -> usize {
    let expired = coordinator.expire_stale(now).await;
    let count = expired.len();

    if count > 0 {
        tracing::info!("Expiry sweep produced {} notices", count);
        outbox.deliver(expired).await;
    }

    count
}

/// Periodically expire stale waiting requests and pending pairs
pub fn spawn_expiry_sweeper(
    coordinator: Arc<Coordinator>,
    outbox: Arc<Outbox>,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            sweep_once(&coordinator, &outbox, Utc::now()).await;
        }
    })
}
