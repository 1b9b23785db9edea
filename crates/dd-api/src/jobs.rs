//! Background maintenance tasks.

use std::time::Duration;

use tokio::{
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};

use crate::{config::ApiConfig, session::SessionRegistry};

/// Start all background jobs
///
/// Returns the join handles so the caller can abort them on shutdown
pub fn start_background_jobs(sessions: SessionRegistry, config: &ApiConfig) -> Vec<JoinHandle<()>> {
    vec![tokio::spawn(session_sweep_job(
        sessions,
        config.session_ttl(),
        config.session_sweep_interval(),
    ))]
}

/// Drop finished and abandoned sessions every `every`
async fn session_sweep_job(sessions: SessionRegistry, ttl: Duration, every: Duration) {
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let evicted = sessions.sweep(ttl).await;
        if evicted > 0 {
            tracing::info!(evicted, ttl_secs = ttl.as_secs(), "Idle sessions dropped");
        } else {
            tracing::debug!("Session sweep found nothing idle");
        }
    }
}
