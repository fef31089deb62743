use std::net::SocketAddr;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: schedule commits. Labels: status (`ok`, `incomplete`).
pub const COMMITS_TOTAL: &str = "slotcast_commits_total";

/// Counter: stagings rejected by the conflict detector.
pub const CONFLICTS_REJECTED_TOTAL: &str = "slotcast_conflicts_rejected_total";

/// Counter: uploads accepted and stored.
pub const UPLOADS_TOTAL: &str = "slotcast_uploads_total";

/// Counter: uploads rejected before any network call. Labels: reason
/// (`format`, `size`).
pub const UPLOADS_REJECTED_TOTAL: &str = "slotcast_uploads_rejected_total";

// ── Playout (the TV loop) ───────────────────────────────────────

/// Counter: resolver polls. Labels: status (`ok`, `error`).
pub const PLAYOUT_POLLS_TOTAL: &str = "slotcast_playout_polls_total";

/// Counter: playback transitions (including to "nothing scheduled").
pub const PLAYOUT_SWITCHES_TOTAL: &str = "slotcast_playout_switches_total";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) {
    let Some(port) = port else { return };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .expect("failed to install Prometheus metrics exporter");
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
}
