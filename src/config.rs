//! Estimator configuration
//!
//! Holds the sync word, its sample rate relative to the symbol rate, and the
//! detection knobs. Everything here is validated before the engine touches it.

use num::complex::Complex32;
use snafu::ensure;

use crate::error::{InvalidConfigurationSnafu, Result};
use crate::reference::PulseShape;

/// Default correlation threshold, relative to a perfect match (1.0)
pub const DEFAULT_THRESHOLD: f32 = 0.9;

/// Minimum reference length at which `CorrelatorMode::Auto` switches to FFT correlation
pub const FFT_MIN_TAPS: usize = 64;

/// How the sliding correlator computes its inner products
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CorrelatorMode {
    /// One inner product per sample against the history ring
    Direct,
    /// Overlap-save FFT convolution over the whole block
    Fft,
    /// FFT for long references and blocks, direct otherwise
    #[default]
    Auto,
}

impl CorrelatorMode {
    /// Whether a block of `block_len` samples against `taps` taps goes through the FFT path
    pub fn use_fft(self, taps: usize, block_len: usize) -> bool {
        match self {
            CorrelatorMode::Direct => false,
            CorrelatorMode::Fft => block_len > 0,
            CorrelatorMode::Auto => taps >= FFT_MIN_TAPS && block_len >= taps,
        }
    }
}

/// Configuration for the correlation estimator
#[derive(Debug, Clone, PartialEq)]
pub struct CorrEstConfig {
    /// Ideal symbol values of the sync word
    pub symbols: Vec<Complex32>,
    /// Samples per symbol (>= 1, may be fractional)
    pub samples_per_symbol: f32,
    /// Tag delay in samples after `corr_start` for `phase_est`/`time_est`/`corr_est`
    pub mark_delay: u32,
    /// Detection threshold in (0, 1]
    pub threshold: f32,
    /// Pulse used to shape symbols into the reference waveform
    pub pulse_shape: PulseShape,
    /// Inner-product strategy
    pub correlator: CorrelatorMode,
    /// Produce the per-sample correlation stream as a second output
    pub emit_correlation: bool,
}

impl CorrEstConfig {
    /// Configuration with default threshold, rectangular pulses and automatic correlator choice
    pub fn new(symbols: Vec<Complex32>, samples_per_symbol: f32, mark_delay: u32) -> Self {
        Self {
            symbols,
            samples_per_symbol,
            mark_delay,
            threshold: DEFAULT_THRESHOLD,
            pulse_shape: PulseShape::default(),
            correlator: CorrelatorMode::default(),
            emit_correlation: false,
        }
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_pulse_shape(mut self, pulse_shape: PulseShape) -> Self {
        self.pulse_shape = pulse_shape;
        self
    }

    pub fn with_correlator(mut self, correlator: CorrelatorMode) -> Self {
        self.correlator = correlator;
        self
    }

    pub fn with_correlation_output(mut self, enabled: bool) -> Self {
        self.emit_correlation = enabled;
        self
    }

    /// Check every field, returning `InvalidConfiguration` on the first violation
    pub fn validate(&self) -> Result<()> {
        validate_symbols(&self.symbols)?;
        validate_samples_per_symbol(self.samples_per_symbol)?;
        validate_threshold(self.threshold)?;
        self.pulse_shape.validate()
    }
}

pub(crate) fn validate_symbols(symbols: &[Complex32]) -> Result<()> {
    ensure!(
        !symbols.is_empty(),
        InvalidConfigurationSnafu { reason: "symbol sequence is empty" }
    );
    ensure!(
        symbols.iter().all(|s| s.re.is_finite() && s.im.is_finite()),
        InvalidConfigurationSnafu { reason: "symbol sequence contains non-finite values" }
    );
    ensure!(
        symbols.iter().any(|s| s.norm_sqr() > 0.0),
        InvalidConfigurationSnafu { reason: "symbol sequence has zero energy" }
    );
    Ok(())
}

pub(crate) fn validate_samples_per_symbol(sps: f32) -> Result<()> {
    ensure!(
        sps.is_finite() && sps >= 1.0,
        InvalidConfigurationSnafu {
            reason: format!("samples_per_symbol must be a finite value >= 1, got {sps}"),
        }
    );
    Ok(())
}

pub(crate) fn validate_threshold(threshold: f32) -> Result<()> {
    ensure!(
        threshold > 0.0 && threshold <= 1.0,
        InvalidConfigurationSnafu {
            reason: format!("threshold must be in (0, 1], got {threshold}"),
        }
    );
    Ok(())
}
