//! Periodic theater status reconciliation.
//!
//! Dashboards read derived statuses without writing anything back. This
//! background task persists what the derivation observes: bookings that
//! have started or run past their end, and theater labels that no longer
//! match. It runs on a fixed `tokio::time::interval` until cancelled.

use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use super::TheaterService;

/// Runs the reconciliation loop until `cancel` is triggered.
///
/// A failed pass is logged and the loop carries on with the next tick.
pub async fn run(service: TheaterService, every: Duration, cancel: CancellationToken) {
    tracing::info!(interval_secs = every.as_secs(), "status reconciler started");

    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                tracing::info!("status reconciler stopping");
                break;
            }
            _ = interval.tick() => {
                match service.reconcile(Utc::now()).await {
                    Ok(report) if report.changes > 0 => {
                        tracing::info!(
                            theaters = report.theaters,
                            changes = report.changes,
                            "status reconciliation applied changes"
                        );
                    }
                    Ok(report) => {
                        tracing::debug!(theaters = report.theaters, "status reconciliation: nothing to do");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "status reconciliation failed");
                    }
                }
            }
        }
    }
}
