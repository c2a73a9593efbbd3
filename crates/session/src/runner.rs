//! Async session runner
//!
//! Drives a `Session` from two poll timers until shutdown:
//! - display timer: display trace and recorder
//! - correlation timer: live correlation, restartable at run time
//!
//! Recording start/stop arrives as `SessionCommand`s so the session keeps a
//! single owner.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::error::Result;
use crate::scheduler::{period_from_secs, poll_timer, PollTimer, TimerControl};
use crate::session::Session;
use crate::stats::SessionSummary;

const COMMAND_QUEUE: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    StartRecording,
    StopRecording,
}

/// Handles for steering a running session
#[derive(Debug, Clone)]
pub struct RunnerControls {
    pub display: TimerControl,
    pub correlation: TimerControl,
    pub commands: mpsc::Sender<SessionCommand>,
    pub shutdown: CancellationToken,
}

pub struct SessionRunner {
    session: Session,
    display_timer: PollTimer,
    correlation_timer: PollTimer,
    commands: mpsc::Receiver<SessionCommand>,
    shutdown: CancellationToken,
}

impl SessionRunner {
    /// Timers start at the configured periods; a disabled correlation poll
    /// starts stopped.
    pub fn new(session: Session) -> (Self, RunnerControls) {
        let config = session.config();
        let display_period = Some(Duration::from_millis(config.display.poll_interval_ms));
        let correlation_period = if config.correlation.enabled {
            period_from_secs(config.correlation.poll_interval_s)
        } else {
            None
        };

        let (display_timer, display) = poll_timer("display", display_period);
        let (correlation_timer, correlation) = poll_timer("correlation", correlation_period);
        let (command_tx, commands) = mpsc::channel(COMMAND_QUEUE);
        let shutdown = CancellationToken::new();

        let controls = RunnerControls {
            display,
            correlation,
            commands: command_tx,
            shutdown: shutdown.clone(),
        };
        let runner = Self {
            session,
            display_timer,
            correlation_timer,
            commands,
            shutdown,
        };
        (runner, controls)
    }

    /// Run until the shutdown token is cancelled
    #[instrument(name = "session_run", skip(self))]
    pub async fn run(self) -> Result<SessionSummary> {
        let Self {
            mut session,
            mut display_timer,
            mut correlation_timer,
            mut commands,
            shutdown,
        } = self;

        let mut display_live = true;
        let mut correlation_live = true;
        let mut commands_open = true;

        info!("session running");
        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => break,

                command = commands.recv(), if commands_open => match command {
                    Some(command) => handle_command(&mut session, command).await,
                    None => commands_open = false,
                },

                tick = display_timer.tick(), if display_live => match tick {
                    Some(_) => {
                        session.poll_display()?;
                        if let Some(summary) = session.poll_recording().await {
                            info!(
                                ticks = summary.ticks,
                                photons = summary.photons,
                                path = ?summary.path,
                                "recording complete"
                            );
                        }
                    }
                    None => display_live = false,
                },

                tick = correlation_timer.tick(), if correlation_live => match tick {
                    Some(_) => {
                        session.poll_correlation();
                    }
                    None => correlation_live = false,
                },
            }
        }

        info!("session stopping");
        session.shutdown().await
    }
}

async fn handle_command(session: &mut Session, command: SessionCommand) {
    match command {
        SessionCommand::StartRecording => {
            if let Err(e) = session.start_recording() {
                warn!(error = %e, "cannot start recording");
            }
        }
        SessionCommand::StopRecording => match session.stop_recording().await {
            Ok(summary) => info!(
                ticks = summary.ticks,
                photons = summary.photons,
                path = ?summary.path,
                "recording stopped"
            ),
            Err(e) => warn!(error = %e, "cannot stop recording"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{SampleBuffer, SessionConfig};
    use std::sync::Arc;

    fn config() -> SessionConfig {
        let mut config = SessionConfig::default();
        config.acquisition.channels = 1;
        config.acquisition.acquisition_rate = 1_000;
        config.acquisition.buffer_size = 1_000;
        config.display.bin_size = 100;
        config.display.poll_interval_ms = 5;
        config.correlation.enabled = false;
        config.recording.sink = contracts::SinkType::Log;
        config
    }

    #[tokio::test]
    async fn test_runs_until_shutdown() {
        let config = config();
        let (mut writer, buffer) = SampleBuffer::allocate(1_000, 1);
        for i in 0..100 {
            writer.store(i, 1);
        }
        writer.publish(100);

        let session = Session::new(config, Arc::new(buffer)).unwrap();
        let (runner, controls) = SessionRunner::new(session);
        assert_eq!(controls.correlation.period(), None);

        let task = tokio::spawn(runner.run());
        tokio::time::sleep(Duration::from_millis(40)).await;
        controls.shutdown.cancel();

        let summary = task.await.unwrap().unwrap();
        assert!(summary.display_polls >= 1);
        assert_eq!(summary.display_bins, 10);
        assert_eq!(summary.channel_photons, vec![100]);
        assert_eq!(summary.correlation.total_polls, 0);
    }

    #[tokio::test]
    async fn test_commands_drive_recording() {
        let config = config();
        let (mut writer, buffer) = SampleBuffer::allocate(1_000, 1);
        let session = Session::new(config, Arc::new(buffer)).unwrap();
        let (runner, controls) = SessionRunner::new(session);
        let task = tokio::spawn(runner.run());

        controls
            .commands
            .send(SessionCommand::StartRecording)
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        for i in 0..50 {
            writer.store(i, 2);
        }
        writer.publish(50);
        tokio::time::sleep(Duration::from_millis(30)).await;

        controls
            .commands
            .send(SessionCommand::StopRecording)
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        controls.shutdown.cancel();

        let summary = task.await.unwrap().unwrap();
        assert_eq!(summary.recordings, 1);
        assert_eq!(summary.recorded_photons, 100);
    }

    #[tokio::test]
    async fn test_correlation_timer_restart() {
        let mut config = config();
        config.correlation.enabled = true;
        config.correlation.poll_interval_s = 0;
        config.correlation.tmax = 0.01;

        let (_writer, buffer) = SampleBuffer::allocate(1_000, 1);
        let session = Session::new(config, Arc::new(buffer)).unwrap();
        let (runner, controls) = SessionRunner::new(session);
        assert_eq!(controls.correlation.period(), None);

        let task = tokio::spawn(runner.run());
        controls
            .correlation
            .set_period(Some(Duration::from_millis(5)));
        tokio::time::sleep(Duration::from_millis(40)).await;
        controls.shutdown.cancel();

        let summary = task.await.unwrap().unwrap();
        assert!(summary.correlation.total_polls >= 1);
        // nothing was written: every poll skipped its curve
        assert_eq!(summary.correlation.curves_computed, 0);
    }
}
