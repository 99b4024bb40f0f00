//! Application entry point — Posture Monitor.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Create [`tokio`] runtime (multi-thread, 2 workers).
//! 4. Build the relay channel, the [`DetectionHost`] and the coordinator.
//! 5. Subscribe a terminal presentation surface and spawn it.
//! 6. Send `StartMonitoring` and report the outcome.
//! 7. Block until Ctrl-C, then send `StopMonitoring` for a clean teardown.

use std::sync::Arc;

use anyhow::{bail, Context};
use tokio::sync::mpsc;

use posture_monitor::{
    config::{AppConfig, AppPaths},
    pose::DetectionHost,
    relay::{ChannelSubscriber, Coordinator, Envelope, RelayHandle, StatusStore, SurfaceUpdate},
    surface::{run_surface, PresentationSurface},
};

fn main() -> anyhow::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Posture Monitor starting up");

    // 2. Configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });

    // 3. Tokio runtime (2 workers — detection tick + coordinator/surfaces)
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    rt.block_on(run(config))
}

async fn run(config: AppConfig) -> anyhow::Result<()> {
    let paths = AppPaths::new();

    // 4. Relay wiring: handle → coordinator → host → detection loops
    let (relay_tx, relay_rx) = mpsc::channel::<Envelope>(32);
    let relay = RelayHandle::new(relay_tx);

    let host = Arc::new(DetectionHost::new(config.clone(), relay.clone()));
    let mut coordinator = Coordinator::new(host, StatusStore::new(paths.status_file));

    // 5. Presentation surface fed by the coordinator's fan-out
    let (surface_tx, surface_rx) = mpsc::channel::<SurfaceUpdate>(64);
    coordinator.subscribe(Box::new(ChannelSubscriber::new("terminal", surface_tx)));
    tokio::spawn(run_surface(
        PresentationSurface::new("terminal", &config.feedback),
        surface_rx,
    ));

    tokio::spawn(coordinator.run(relay_rx));

    // 6. Start monitoring
    let ack = relay.start_monitoring().await;
    if !ack.success {
        bail!(
            "could not start monitoring: {}",
            ack.error.unwrap_or_else(|| "unknown error".into())
        );
    }
    log::info!("Monitoring active — press Ctrl-C to stop");

    // 7. Clean shutdown on Ctrl-C
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    log::info!("Shutting down");
    relay.stop_monitoring().await;

    Ok(())
}
