use std::sync::Arc;

use jiff::tz::TimeZone;
use tracing::info;

use slotcast::backend::memory::MemoryBackend;
use slotcast::backend::supabase::SupabaseBackend;
use slotcast::backend::RowStore;
use slotcast::model::TenantId;
use slotcast::schedule::ScheduleService;
use slotcast::{limits, observability, playout};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let metrics_port: Option<u16> = std::env::var("SLOTCAST_METRICS_PORT")
        .ok()
        .and_then(|s| s.parse().ok());
    observability::init(metrics_port);

    let tenant = TenantId::new(std::env::var("SLOTCAST_TENANT").unwrap_or_else(|_| "demo".into()));
    let backend_kind = std::env::var("SLOTCAST_BACKEND").unwrap_or_else(|_| "memory".into());

    let rows: Arc<dyn RowStore> = match backend_kind.as_str() {
        "supabase" => {
            let url = std::env::var("SLOTCAST_SUPABASE_URL")?;
            let key = std::env::var("SLOTCAST_SUPABASE_KEY")?;
            Arc::new(SupabaseBackend::new(url, key))
        }
        _ => Arc::new(MemoryBackend::new()),
    };

    let tz = TimeZone::get(limits::DISPLAY_TZ)?;
    let service = Arc::new(ScheduleService::new(rows));

    info!("slotcast playout starting");
    info!("  tenant: {tenant}");
    info!("  backend: {backend_kind}");
    info!("  timezone: {}", limits::DISPLAY_TZ);
    info!("  poll interval: {:?}", limits::PLAYOUT_POLL_INTERVAL);
    info!("  metrics: {}", metrics_port.map_or("disabled".to_string(), |p| format!("http://0.0.0.0:{p}/metrics")));

    // Graceful shutdown: stop the playout loop on SIGTERM/ctrl-c.
    let shutdown = async {
        let ctrl_c = tokio::signal::ctrl_c();
        #[cfg(unix)]
        {
            let mut sigterm =
                tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                    .expect("failed to register SIGTERM handler");
            tokio::select! {
                _ = ctrl_c => {}
                _ = sigterm.recv() => {}
            }
        }
        #[cfg(not(unix))]
        {
            ctrl_c.await.ok();
        }
    };

    tokio::select! {
        _ = playout::run_playout(service, tenant, tz) => {}
        _ = shutdown => {
            info!("shutdown signal received");
        }
    }

    info!("slotcast stopped");
    Ok(())
}
