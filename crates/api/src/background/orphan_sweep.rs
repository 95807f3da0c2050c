//! Periodic removal of stored blobs that no document row references.
//!
//! An upload writes the blob before the row. When the row insert fails and
//! the compensating delete fails too, the blob is left behind; this job
//! reclaims it once it is older than the grace period.

use std::time::Duration;

use dealroom_core::services::DocumentService;
use tokio_util::sync::CancellationToken;

/// Run the sweep loop until `cancel` is triggered.
///
/// The first sweep runs immediately, then once per `interval`.
pub async fn run(
    documents: DocumentService,
    interval: Duration,
    grace: Duration,
    cancel: CancellationToken,
) {
    let grace = match chrono::Duration::from_std(grace) {
        Ok(grace) => grace,
        Err(e) => {
            tracing::error!(error = %e, "Orphan sweep: grace period out of range, job disabled");
            return;
        }
    };

    tracing::info!(
        interval_secs = interval.as_secs(),
        grace_secs = grace.num_seconds(),
        "Orphan sweep job started"
    );

    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Orphan sweep job stopping");
                break;
            }
            _ = ticker.tick() => {
                match documents.sweep_orphans(None, grace).await {
                    Ok(report) if report.deleted > 0 || report.failed > 0 => {
                        tracing::info!(
                            scanned = report.scanned,
                            deleted = report.deleted,
                            failed = report.failed,
                            "Orphan sweep: removed unreferenced blobs"
                        );
                    }
                    Ok(report) => {
                        tracing::debug!(scanned = report.scanned, "Orphan sweep: nothing to remove");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Orphan sweep failed");
                    }
                }
            }
        }
    }
}
