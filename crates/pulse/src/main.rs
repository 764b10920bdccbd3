//! Pulse daemon entry point.
//!
//! Wires the pieces together: settings, store, protocol session, tracker
//! registry, event fan-out, and the HTTP/WebSocket server. Shut down with
//! Ctrl-C (or SIGTERM); sessions are cancelled before the listener closes.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;

use pulse_core::hub::EventHub;
use pulse_protocol::sim::SimulatedClient;
use pulse_protocol::{BackoffConfig, ProtocolClient, SessionSupervisor};
use pulse_server::websocket::{BroadcastManager, run_event_bridge};
use pulse_server::{AppState, router};
use pulse_settings::{PulseSettings, load_settings_from_path};
use pulse_store::{ConnectionConfig, MetricStore, new_in_memory, new_pool, run_migrations};
use pulse_tracker::TrackerRegistry;

/// Presence monitor daemon.
#[derive(Debug, Parser)]
#[command(name = "pulse", version, about)]
struct Cli {
    /// Settings file (default: ~/.pulse/settings.json).
    #[arg(long)]
    settings: Option<PathBuf>,

    /// SQLite database path; `:memory:` for an ephemeral store.
    #[arg(long)]
    db: Option<String>,

    /// HTTP port for REST and WebSocket.
    #[arg(long)]
    port: Option<u16>,

    /// Bind address.
    #[arg(long)]
    bind: Option<String>,

    /// Probe cadence in milliseconds.
    #[arg(long)]
    probe_interval_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pulse_core::logging::init("info,pulse=debug");
    let cli = Cli::parse();

    let settings: Arc<PulseSettings> = match &cli.settings {
        Some(path) => Arc::new(
            load_settings_from_path(path)
                .with_context(|| format!("loading settings from {}", path.display()))?,
        ),
        None => pulse_settings::get_settings(),
    };

    let db_path = cli.db.unwrap_or_else(|| settings.store.db_path.clone());
    let port = cli.port.unwrap_or(settings.server.http_port);
    let bind = cli.bind.unwrap_or_else(|| settings.server.bind.clone());
    let probe_interval =
        Duration::from_millis(cli.probe_interval_ms.unwrap_or(settings.probe.interval_ms));

    let prometheus = match pulse_server::metrics::install() {
        Ok(handle) => Some(handle),
        Err(e) => {
            tracing::warn!(error = %e, "prometheus recorder unavailable, /metrics disabled");
            None
        }
    };

    let pool = if db_path == ":memory:" {
        new_in_memory(&ConnectionConfig::default())
    } else {
        new_pool(Path::new(&db_path), &ConnectionConfig::default())
    }
    .with_context(|| format!("opening metric store at {db_path}"))?;
    {
        let conn = pool.get().context("checking out a store connection")?;
        run_migrations(&conn).context("running store migrations")?;
    }
    let store = Arc::new(MetricStore::new(pool));
    info!(db = %db_path, "metric store ready");

    let hub = Arc::new(EventHub::new());
    let client: Arc<dyn ProtocolClient> = Arc::new(SimulatedClient::new());
    let supervisor = Arc::new(SessionSupervisor::new(
        Arc::clone(&client),
        Arc::clone(&hub),
        BackoffConfig {
            base: Duration::from_millis(settings.session.reconnect_base_ms),
            max: Duration::from_millis(settings.session.reconnect_max_ms),
        },
    ));
    let registry = Arc::new(TrackerRegistry::new(
        client,
        Arc::clone(&store),
        Arc::clone(&hub),
        probe_interval,
    ));
    let broadcast = Arc::new(BroadcastManager::new());

    let cancel = CancellationToken::new();
    let supervision = {
        let supervisor = Arc::clone(&supervisor);
        let token = cancel.child_token();
        tokio::spawn(async move { supervisor.run(token).await })
    };
    let bridge = tokio::spawn(run_event_bridge(
        Arc::clone(&hub),
        Arc::clone(&broadcast),
        cancel.child_token(),
    ));

    let state = AppState {
        registry: Arc::clone(&registry),
        store,
        hub,
        supervisor,
        broadcast,
        gap_threshold: Duration::from_millis(settings.analytics.gap_threshold_ms),
        default_range: Duration::from_secs(settings.analytics.default_range_hours * 3600),
        prometheus,
    };
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(format!("{bind}:{port}"))
        .await
        .with_context(|| format!("binding {bind}:{port}"))?;
    info!(addr = %listener.local_addr()?, "pulse listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel, registry))
        .await
        .context("server error")?;

    let _ = supervision.await;
    let _ = bridge.await;
    info!("pulse stopped");
    Ok(())
}

/// Resolve on Ctrl-C or SIGTERM; cancels every session before the
/// listener drains.
async fn shutdown_signal(cancel: CancellationToken, registry: Arc<TrackerRegistry>) {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                let _ = signal.recv().await;
            }
            Err(_) => std::future::pending().await,
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    info!("shutdown requested");
    registry.shutdown();
    cancel.cancel();
}
