//! Configuration validation
//!
//! Rules:
//! - channels >= 1 and fit a detector id
//! - acquisition_rate >= display bin_size > 0
//! - buffer_size > 0 and a whole number of display bins
//! - trace_width > 0, poll intervals > 0
//! - correlation: nbins >= 1, cross needs two channels, tmax fits in the buffer
//! - recording: 1 <= duration_s <= 301, queue_capacity > 0, file_stem non-empty
//! - simulator probabilities in [0, 1]

use contracts::{ContractError, SessionConfig};

/// Longest recording the session accepts, in seconds
pub const MAX_RECORDING_SECONDS: u64 = 301;

/// Validate a SessionConfig
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(config: &SessionConfig) -> Result<(), ContractError> {
    validate_acquisition(config)?;
    validate_display(config)?;
    validate_correlation(config)?;
    validate_recording(config)?;
    validate_simulator(config)?;
    Ok(())
}

fn validate_acquisition(config: &SessionConfig) -> Result<(), ContractError> {
    let acq = &config.acquisition;
    if acq.channels == 0 || acq.channels > usize::from(u8::MAX) + 1 {
        return Err(ContractError::config_validation(
            "acquisition.channels",
            format!("channels must be in 1..=256, got {}", acq.channels),
        ));
    }
    if acq.acquisition_rate == 0 {
        return Err(ContractError::config_validation(
            "acquisition.acquisition_rate",
            "acquisition_rate must be > 0",
        ));
    }
    if acq.buffer_size == 0 {
        return Err(ContractError::config_validation(
            "acquisition.buffer_size",
            "buffer_size must be > 0",
        ));
    }
    Ok(())
}

fn validate_display(config: &SessionConfig) -> Result<(), ContractError> {
    let display = &config.display;
    if display.bin_size == 0 {
        return Err(ContractError::config_validation(
            "display.bin_size",
            "bin_size must be > 0",
        ));
    }
    if config.acquisition.acquisition_rate < display.bin_size {
        return Err(ContractError::config_validation(
            "display.bin_size",
            format!(
                "trying to show more bins ({}) than samples acquired per second ({})",
                display.bin_size, config.acquisition.acquisition_rate
            ),
        ));
    }
    let samples_per_bin = config.samples_per_bin();
    if config.acquisition.buffer_size % samples_per_bin != 0 {
        return Err(ContractError::config_validation(
            "acquisition.buffer_size",
            format!(
                "buffer_size ({}) must be a multiple of samples per display bin ({samples_per_bin})",
                config.acquisition.buffer_size
            ),
        ));
    }
    if display.trace_width == 0 {
        return Err(ContractError::config_validation(
            "display.trace_width",
            "trace_width must be > 0",
        ));
    }
    if display.poll_interval_ms == 0 {
        return Err(ContractError::config_validation(
            "display.poll_interval_ms",
            "poll_interval_ms must be > 0",
        ));
    }
    Ok(())
}

fn validate_correlation(config: &SessionConfig) -> Result<(), ContractError> {
    let corr = &config.correlation;
    if !corr.enabled {
        return Ok(());
    }
    if corr.nbins == 0 {
        return Err(ContractError::config_validation(
            "correlation.nbins",
            "nbins must be >= 1",
        ));
    }
    if corr.cross && config.acquisition.channels < 2 {
        return Err(ContractError::config_validation(
            "correlation.cross",
            "cannot show cross correlation for single channel setups",
        ));
    }
    if !corr.tmax.is_finite() || !corr.tmin.is_finite() {
        return Err(ContractError::config_validation(
            "correlation.tmin / correlation.tmax",
            "lag range must be finite",
        ));
    }
    let buffer_span_s =
        config.acquisition.buffer_size as f64 / config.acquisition.acquisition_rate as f64;
    if corr.tmax >= buffer_span_s {
        return Err(ContractError::config_validation(
            "correlation.tmax",
            format!(
                "tmax ({}) must be shorter than the buffer span ({} s)",
                corr.tmax, buffer_span_s
            ),
        ));
    }
    Ok(())
}

fn validate_recording(config: &SessionConfig) -> Result<(), ContractError> {
    let rec = &config.recording;
    if rec.duration_s == 0 || rec.duration_s > MAX_RECORDING_SECONDS {
        return Err(ContractError::config_validation(
            "recording.duration_s",
            format!(
                "duration_s must be in 1..={MAX_RECORDING_SECONDS}, got {}",
                rec.duration_s
            ),
        ));
    }
    if rec.queue_capacity == 0 {
        return Err(ContractError::config_validation(
            "recording.queue_capacity",
            "queue_capacity must be > 0",
        ));
    }
    if rec.file_stem.is_empty() {
        return Err(ContractError::config_validation(
            "recording.file_stem",
            "file_stem cannot be empty",
        ));
    }
    Ok(())
}

fn validate_simulator(config: &SessionConfig) -> Result<(), ContractError> {
    let sim = &config.simulator;
    for (field, value) in [
        ("simulator.burst_probability", sim.burst_probability),
        ("simulator.dark_count_probability", sim.dark_count_probability),
    ] {
        if !(0.0..=1.0).contains(&value) {
            return Err(ContractError::config_validation(
                field,
                format!("probability must be in [0, 1], got {value}"),
            ));
        }
    }
    if sim.burst_width_s <= 0.0 {
        return Err(ContractError::config_validation(
            "simulator.burst_width_s",
            "burst_width_s must be > 0",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&SessionConfig::default()).is_ok());
    }

    #[test]
    fn test_zero_channels_rejected() {
        let mut config = SessionConfig::default();
        config.acquisition.channels = 0;
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("acquisition.channels"));
    }

    #[test]
    fn test_bin_size_above_rate_rejected() {
        let mut config = SessionConfig::default();
        config.acquisition.acquisition_rate = 500;
        config.display.bin_size = 1000;
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("more bins"));
    }

    #[test]
    fn test_buffer_must_hold_whole_bins() {
        let mut config = SessionConfig::default();
        config.acquisition.buffer_size = 150_050;
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("multiple of samples per display bin"));
    }

    #[test]
    fn test_cross_needs_two_channels() {
        let mut config = SessionConfig::default();
        config.acquisition.channels = 1;
        config.correlation.enabled = true;
        config.correlation.cross = true;
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("single channel"));
    }

    #[test]
    fn test_cross_ignored_when_correlation_disabled() {
        let mut config = SessionConfig::default();
        config.acquisition.channels = 1;
        config.correlation.cross = true;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_tmax_must_fit_buffer() {
        let mut config = SessionConfig::default();
        config.correlation.enabled = true;
        config.correlation.tmax = 2.0;
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("buffer span"));
    }

    #[test]
    fn test_recording_duration_bounds() {
        let mut config = SessionConfig::default();
        config.recording.duration_s = MAX_RECORDING_SECONDS + 1;
        assert!(validate(&config).is_err());
        config.recording.duration_s = MAX_RECORDING_SECONDS;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_probability_range() {
        let mut config = SessionConfig::default();
        config.simulator.burst_probability = 1.5;
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("burst_probability"));
    }
}
