//! Daily job loops.

use chrono::{DateTime, Duration, Local, NaiveTime, TimeZone};
use tokio_util::sync::CancellationToken;

use super::{ActivitySimulator, DiscountDigest};
use crate::services::today;

/// Next local instant at `hour:00` strictly after `now`.
pub fn next_run_after<Tz: TimeZone>(now: &DateTime<Tz>, hour: u32) -> DateTime<Tz> {
    let at = NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN);
    let tz = now.timezone();
    let mut day = now.date_naive();
    loop {
        // Skip days where the hour does not exist locally (DST gaps).
        if let Some(candidate) = tz.from_local_datetime(&day.and_time(at)).earliest() {
            if candidate > *now {
                return candidate;
            }
        }
        day += Duration::days(1);
    }
}

/// Run the discount digest every day at `hour` local time until cancelled.
/// Failures are logged and the loop continues.
pub async fn run_daily_digest(digest: DiscountDigest, hour: u32, shutdown: CancellationToken) {
    loop {
        let now = Local::now();
        let next = next_run_after(&now, hour);
        let wait = (next.clone() - now).to_std().unwrap_or_default();
        tracing::info!(next_run = %next, "Discount digest scheduled");

        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            _ = shutdown.cancelled() => {
                tracing::info!("Scheduler stopping");
                return;
            }
        }

        match digest.run().await {
            Ok(outcome) => tracing::info!(?outcome, "Discount digest finished"),
            Err(e) => tracing::error!(error = %e, "Discount digest failed"),
        }
    }
}

/// Backfill simulated activity through yesterday right away, then again
/// every day at `hour` local time until cancelled.
pub async fn run_daily_backfill(
    simulator: ActivitySimulator,
    hour: u32,
    shutdown: CancellationToken,
) {
    loop {
        let yesterday = today() - Duration::days(1);
        match simulator.run(yesterday).await {
            Ok(written) => tracing::info!(written, through = %yesterday, "Activity backfill finished"),
            Err(e) => tracing::error!(error = %e, "Activity backfill failed"),
        }

        let now = Local::now();
        let next = next_run_after(&now, hour);
        let wait = (next.clone() - now).to_std().unwrap_or_default();
        tracing::info!(next_run = %next, "Activity backfill scheduled");

        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            _ = shutdown.cancelled() => {
                tracing::info!("Activity backfill stopping");
                return;
            }
        }
    }
}
