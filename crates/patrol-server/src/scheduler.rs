//! Daily assignment trigger.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDateTime, NaiveTime};
use tokio::task::JoinHandle;

use patrol_core::AssignmentEngine;

/// Spawn the background loop that fires the assignment engine once per day
/// at the given local wall-clock time. A failed run is logged and the loop
/// keeps ticking; nothing in here can take the process down.
pub fn spawn_daily(engine: Arc<AssignmentEngine>, at: NaiveTime) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let wait = duration_until_next(Local::now().naive_local(), at);
            tracing::debug!(seconds = wait.as_secs(), "sleeping until next assignment run");
            tokio::time::sleep(wait).await;

            let today = Local::now().date_naive();
            match engine.run_daily(today).await {
                Ok(created) => {
                    tracing::info!(count = created.len(), %today, "daily assignment run complete");
                }
                Err(err) => {
                    tracing::error!(error = %err, %today, "daily assignment run failed");
                }
            }
        }
    })
}

/// Time until the next occurrence of `at`, strictly in the future.
fn duration_until_next(now: NaiveDateTime, at: NaiveTime) -> Duration {
    let today_fire = now.date().and_time(at);
    let next = if today_fire > now {
        today_fire
    } else {
        now.date().succ_opt().unwrap_or(now.date()).and_time(at)
    };
    (next - now).to_std().unwrap_or_default()
}
