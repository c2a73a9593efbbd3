//! # Photon Correlation Demo
//!
//! Runs a session over the simulated counter: display trace, periodic
//! correlation, optional recording, summary at the end.

mod cli;

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use contracts::SessionConfig;
use observability::ObservabilityConfig;
use session::{Session, SessionCommand, SessionRunner};
use tracing::{info, warn};

use cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let default_log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    observability::init_with_config(ObservabilityConfig {
        log_format: cli.log_format.into(),
        metrics_port: (cli.metrics_port != 0).then_some(cli.metrics_port),
        default_log_level: default_log_level.to_string(),
    })?;

    let config = load_config(&cli)?;
    info!(
        channels = config.acquisition.channels,
        acquisition_rate = config.acquisition.acquisition_rate,
        correlation = config.correlation.enabled,
        sink = ?config.recording.sink,
        "configuration loaded"
    );

    let session = Session::simulated(config).context("Failed to start session")?;
    let measurement = session.measurement();
    let (runner, controls) = SessionRunner::new(session);
    let task = tokio::spawn(runner.run());

    if let Some(secs) = cli.correlation_interval {
        controls.correlation.set_seconds(secs);
    }
    if cli.record {
        controls
            .commands
            .send(SessionCommand::StartRecording)
            .await
            .context("Session stopped before recording could start")?;
    }
    if let Some(secs) = cli.measure {
        match measurement.measure(Duration::from_secs(secs)).await {
            Some(rate) => info!(rate = format!("{:.3}", rate), "count rate measured"),
            None => warn!("no samples during measurement"),
        }
    }

    let run_for = async {
        if cli.seconds == 0 {
            std::future::pending::<()>().await
        } else {
            tokio::time::sleep(Duration::from_secs(cli.seconds)).await
        }
    };
    tokio::select! {
        _ = run_for => info!("run time elapsed"),
        _ = tokio::signal::ctrl_c() => warn!("received Ctrl+C, stopping"),
    }

    controls.shutdown.cancel();
    let summary = task.await.context("Session task panicked")??;
    println!("{}", summary);
    Ok(())
}

/// Defaults plus live correlation of both channels
fn demo_config() -> SessionConfig {
    let mut config = SessionConfig::default();
    config.correlation.enabled = true;
    config.correlation.cross = true;
    config
}

fn load_config(cli: &Cli) -> Result<SessionConfig> {
    let Some(path) = &cli.config else {
        return Ok(demo_config());
    };
    config_loader::ConfigLoader::load_from_path(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))
}
