use std::{sync::Arc, time::Duration};

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::usecases::subscriptions::ExpirySweeper;

/// Runs the subscription expiry sweep every `interval` for the life of the process.
pub fn spawn_expiry_sweep(sweeper: Arc<dyn ExpirySweeper>, interval: Duration) -> JoinHandle<()> {
    info!(interval_secs = interval.as_secs(), "expiry_sweep: background sweep scheduled");
    tokio::spawn(run_expiry_sweep_loop(sweeper, interval))
}

async fn run_expiry_sweep_loop(sweeper: Arc<dyn ExpirySweeper>, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        sweep_once(sweeper.as_ref()).await;
    }
}

async fn sweep_once(sweeper: &dyn ExpirySweeper) {
    let today = Utc::now().date_naive();
    match sweeper.expire_old_subscriptions(today).await {
        Ok(0) => info!(%today, "expiry_sweep: nothing to expire"),
        Ok(expired) => info!(%today, expired, "expiry_sweep: subscriptions expired"),
        Err(err) => error!(%today, error = ?err, "expiry_sweep: sweep failed, retrying next tick"),
    }
}
