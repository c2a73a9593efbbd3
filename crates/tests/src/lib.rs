//! # Integration Tests
//!
//! Cross-crate tests over the whole acquisition path:
//! - configuration file to running session
//! - live correlation against the correlation of the saved recording
//! - simulated producer through the async runner into a CSV file

#[cfg(test)]
mod contract_tests {
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::SessionConfig;

    #[test]
    fn test_default_config_is_valid() {
        ConfigLoader::validate(&SessionConfig::default()).unwrap();
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = SessionConfig::default();
        config.acquisition.channels = 1;
        config.correlation.enabled = true;
        config.correlation.nbins = 12;

        let text = ConfigLoader::to_toml(&config).unwrap();
        let loaded = ConfigLoader::load_from_str(&text, ConfigFormat::Toml).unwrap();
        assert_eq!(loaded.acquisition.channels, 1);
        assert_eq!(loaded.correlation.nbins, 12);
        assert_eq!(loaded.buffer_len(), config.buffer_len());
    }

    #[test]
    fn test_cross_on_single_channel_rejected() {
        let text = r#"
            [acquisition]
            channels = 1

            [correlation]
            enabled = true
            cross = true
        "#;
        assert!(ConfigLoader::load_from_str(text, ConfigFormat::Toml).is_err());
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{SampleBuffer, SessionConfig, SinkType};
    use correlation_engine::{correlate_stream, CorrelationEngine, CurveKind, DetectorSelection};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use recorder::load_photon_csv;
    use session::{Session, SessionCommand, SessionRunner};
    use tempfile::tempdir;

    const CONFIG: &str = r#"
        [acquisition]
        channels = 2
        acquisition_rate = 10000
        buffer_size = 20000

        [display]
        bin_size = 100
        trace_width = 200

        [correlation]
        enabled = true
        cross = true
        nbins = 6
        tmax = 0.01

        [recording]
        sink = "csv"
        duration_s = 1
        file_stem = "e2e"
    "#;

    fn config(output_dir: &std::path::Path) -> SessionConfig {
        let mut config = ConfigLoader::load_from_str(CONFIG, ConfigFormat::Toml).unwrap();
        config.recording.output_dir = output_dir.to_path_buf();
        config
    }

    /// Live correlation of one window equals the correlation of the same
    /// samples recorded to CSV and loaded back.
    #[tokio::test]
    async fn test_live_and_recorded_correlation_agree() {
        let dir = tempdir().unwrap();
        let config = config(dir.path());
        let bins = CorrelationEngine::from_config(&config).bins().clone();

        let (mut writer, buffer) = SampleBuffer::allocate(
            config.acquisition.buffer_size,
            config.acquisition.channels,
        );
        let mut session = Session::new(config.clone(), Arc::new(buffer)).unwrap();
        session.start_recording().unwrap();

        let mut rng = StdRng::seed_from_u64(11);
        let samples = 10_000;
        for slot in 0..samples * 2 {
            let count = if rng.random_bool(0.2) { rng.random_range(1..=2) } else { 0 };
            writer.store(slot, count);
        }
        writer.publish(samples * 2);

        let display = session.poll_display().unwrap();
        assert_eq!(display.bins, 100);

        let live = session.poll_correlation();
        assert_eq!(live.window_samples, samples);
        assert_eq!(live.report.curves.len(), 3);

        let summary = session.poll_recording().await.unwrap();
        assert_eq!(summary.ticks, samples as i64);
        assert_eq!(summary.sink.dropped_batches, 0);
        let path = summary.path.unwrap();

        let loaded = load_photon_csv(&path, false, config.clock_period()).unwrap();
        assert_eq!(loaded.expand_by, 1);
        assert_eq!(loaded.batch.len() as u64, summary.photons);
        assert_eq!(
            loaded.batch.counts_per_detector().iter().sum::<usize>() as u64,
            display.photons.iter().sum::<u64>()
        );

        let batch = &loaded.batch;
        for channel in 0..2u8 {
            let recorded = correlate_stream(
                &batch.timestamps,
                &batch.detectors,
                &DetectorSelection::Auto {
                    detectors: Some(vec![channel]),
                },
                &bins,
            )
            .unwrap();
            let curve = live
                .report
                .curve(CurveKind::Auto {
                    channel: channel as usize,
                })
                .unwrap();
            assert_eq!(recorded.values, curve.values);
            assert_eq!(recorded.lag_centers, live.report.lag_centers);
        }

        let recorded_cross = correlate_stream(
            &batch.timestamps,
            &batch.detectors,
            &DetectorSelection::Cross { a: None, b: None },
            &bins,
        )
        .unwrap();
        let live_cross = live
            .report
            .curve(CurveKind::Cross {
                reference: 0,
                target: 1,
            })
            .unwrap();
        assert_eq!(recorded_cross.values, live_cross.values);

        session.shutdown().await.unwrap();
    }

    /// Simulated counter -> runner -> CSV recording -> loader
    #[tokio::test]
    async fn test_simulated_recording_round_trip() {
        let dir = tempdir().unwrap();
        let mut config = config(dir.path());
        config.simulator.burst_probability = 0.5;
        config.simulator.dark_count_probability = 0.001;
        config.simulator.seed = Some(3);

        let session = Session::simulated(config.clone()).unwrap();
        let measurement = session.measurement();
        let (runner, controls) = SessionRunner::new(session);
        let task = tokio::spawn(runner.run());

        controls
            .commands
            .send(SessionCommand::StartRecording)
            .await
            .unwrap();

        let rate = measurement.measure(Duration::from_millis(200)).await;
        assert!(rate.is_some());

        // 1 s recording plus margin for the last display poll
        tokio::time::sleep(Duration::from_millis(1_600)).await;
        controls.shutdown.cancel();
        let summary = task.await.unwrap().unwrap();
        assert_eq!(summary.recordings, 1);
        assert_eq!(summary.dropped_batches, 0);

        let files: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect();
        assert_eq!(files.len(), 1);
        let name = files[0].file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("e2e_") && name.ends_with(".csv"));

        let loaded = load_photon_csv(&files[0], true, config.clock_period()).unwrap();
        assert_eq!(loaded.batch.len() as u64, summary.recorded_photons);
        assert!(loaded
            .batch
            .timestamps
            .windows(2)
            .all(|pair| pair[0] < pair[1]));
    }

    /// One-second polls on the default buffer and lag range still produce
    /// curves once more than the largest lag has been acquired.
    #[test]
    fn test_fast_correlation_polls_on_default_config() {
        let mut config = SessionConfig::default();
        config.correlation.enabled = true;
        config.correlation.poll_interval_s = 1;
        ConfigLoader::validate(&config).unwrap();

        let (mut writer, buffer) = SampleBuffer::allocate(
            config.acquisition.buffer_size,
            config.acquisition.channels,
        );
        let mut session = Session::new(config, Arc::new(buffer)).unwrap();
        let second = writer.len() / 2;

        for slot in 0..second {
            writer.store(slot, 1);
        }
        writer.publish(second);
        let first = session.poll_correlation();
        assert!(first.report.is_empty());

        for slot in second..2 * second {
            writer.store(slot, 1);
        }
        writer.publish(2 * second);
        let next = session.poll_correlation();
        assert!(next.window_samples > second / 2);
        assert!(!next.report.is_empty());
        assert!(next.report.skipped.is_empty());
    }

    #[tokio::test]
    async fn test_log_sink_saves_nothing() {
        let dir = tempdir().unwrap();
        let mut config = config(dir.path());
        config.recording.sink = SinkType::Log;

        let (mut writer, buffer) = SampleBuffer::allocate(
            config.acquisition.buffer_size,
            config.acquisition.channels,
        );
        let mut session = Session::new(config, Arc::new(buffer)).unwrap();
        session.start_recording().unwrap();
        writer.store(0, 4);
        writer.publish(10);

        let summary = session.stop_recording().await.unwrap();
        assert_eq!(summary.photons, 4);
        assert!(summary.path.is_none());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
