//! The headless TV loop: poll the resolver on a fixed cadence and report
//! what should be on screen. Polling is the only refresh mechanism (there
//! is no push channel), so a failed poll is simply retried on the next
//! tick, never queued.

use std::sync::Arc;

use jiff::tz::TimeZone;
use jiff::Timestamp;
use tracing::{debug, info, warn};

use crate::limits::PLAYOUT_POLL_INTERVAL;
use crate::model::{ScheduleEntry, TenantId};
use crate::observability;
use crate::schedule::ScheduleService;

/// One poll step: resolve the active entry and report whether playback
/// changed compared to `current`.
pub async fn poll_once(
    service: &ScheduleService,
    tenant: &TenantId,
    now: Timestamp,
    tz: &TimeZone,
    current: &mut Option<ScheduleEntry>,
) -> bool {
    match service.resolve_now(tenant, now, tz).await {
        Ok(next) => {
            metrics::counter!(observability::PLAYOUT_POLLS_TOTAL, "status" => "ok").increment(1);
            let changed = next.as_ref().map(|e| &e.media.url)
                != current.as_ref().map(|e| &e.media.url);
            if changed {
                match &next {
                    Some(entry) => info!(
                        video = %entry.media.name,
                        until = %crate::grid::slot_to_label(entry.range.end),
                        "now playing"
                    ),
                    None => info!("no video scheduled"),
                }
                metrics::counter!(observability::PLAYOUT_SWITCHES_TOTAL).increment(1);
                *current = next;
            } else {
                debug!("playback unchanged");
            }
            changed
        }
        Err(e) => {
            metrics::counter!(observability::PLAYOUT_POLLS_TOTAL, "status" => "error")
                .increment(1);
            warn!(error = %e, "playout poll failed, retrying next tick");
            false
        }
    }
}

/// Run the display loop for one tenant until the task is dropped.
pub async fn run_playout(service: Arc<ScheduleService>, tenant: TenantId, tz: TimeZone) {
    let mut interval = tokio::time::interval(PLAYOUT_POLL_INTERVAL);
    let mut current: Option<ScheduleEntry> = None;
    loop {
        interval.tick().await;
        poll_once(&service, &tenant, Timestamp::now(), &tz, &mut current).await;
    }
}
