use anyhow::Result;
use resonator_core::config::load_config;
use resonator_core::types::Urgency;
use resonator_recur::monitor::ProgressMonitor;
use resonator_recur::{Entry, ProgressSnapshot};
use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, reload, util::SubscriberInitExt};

mod store;

#[tokio::main]
async fn main() -> Result<()> {
    let (filter_layer, filter_handle) = reload::Layer::new(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt::layer().with_target(true))
        .init();

    tracing::info!("Starting Resonator progress watcher");

    let config = load_config()?;

    tracing::info!(config = ?config, "Configuration loaded");

    if let Ok(filter) = EnvFilter::try_new(config.logging.level.as_str()) {
        if let Err(e) = filter_handle.modify(|current| *current = filter) {
            tracing::warn!(error = %e, "Failed to update log filter from config");
        }
    } else {
        tracing::warn!(level = %config.logging.level, "Invalid log level in config, keeping debug");
    }

    let entries = store::load_entries(&config.entries.path).await?;

    tracing::info!(count = entries.len(), "Entries loaded");

    let poll_interval = config.monitor.poll_interval();
    let mut monitors = Vec::new();
    let mut reporters = Vec::new();
    for entry in entries {
        let monitor = ProgressMonitor::spawn(entry.interval, entry.last_complete_time, poll_interval)?;
        reporters.push(tokio::spawn(report_transitions(entry, monitor.subscribe())));
        monitors.push(monitor);
    }

    tokio::signal::ctrl_c().await?;

    tracing::info!("Shutting down monitors");

    for monitor in monitors {
        monitor.stop().await;
    }
    for reporter in reporters {
        reporter.await.ok();
    }

    Ok(())
}

/// Logs a line whenever an entry crosses into another urgency band.
async fn report_transitions(entry: Entry, mut snapshots: watch::Receiver<ProgressSnapshot>) {
    let mut last_urgency: Option<Urgency> = None;
    loop {
        let snapshot = *snapshots.borrow_and_update();
        if last_urgency != Some(snapshot.urgency) {
            tracing::info!(
                entry = %entry.name,
                owner = %entry.owner,
                interval = %entry.interval,
                percent = snapshot.percent_complete,
                urgency = %snapshot.urgency,
                expected = %snapshot.expected_completion,
                "Progress update"
            );
            last_urgency = Some(snapshot.urgency);
        }
        if snapshots.changed().await.is_err() {
            break;
        }
    }
}
