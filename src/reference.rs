//! Reference Waveform Builder
//!
//! Expands a sync word of ideal symbols into the oversampled, pulse-shaped
//! waveform we expect to receive over the air. The correlator slides this
//! waveform (conjugated) against the input stream.
//!
//! **Timing convention**:
//! - Tap `i` samples the shaped waveform at `t = i` (sample units)
//! - Symbol `m` is centred at `t = (m + 0.5) * sps - 0.5`
//! - Waveform length is `round(symbols * sps)` samples
//!
//! The same continuous-time definition is exposed through [`shaped_sample`] so
//! fractionally delayed copies of the sync word can be synthesized with exactly
//! the shaping the correlator expects.

use num::complex::Complex32;
use snafu::ensure;

use crate::config::{validate_samples_per_symbol, validate_symbols};
use crate::error::{InvalidConfigurationSnafu, Result};

/// Pulse used to turn each ideal symbol into `samples_per_symbol` samples
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PulseShape {
    /// Zero-order hold: each symbol held constant for its span
    #[default]
    Rectangular,
    /// `cos(pi * t)` over one symbol period
    HalfSine,
    /// Gaussian-filtered rectangle with bandwidth-time product `bt`, truncated to 3 symbols
    Gaussian { bt: f32 },
}

impl PulseShape {
    /// Total support of the pulse, in symbol periods
    pub fn span(&self) -> f32 {
        match self {
            PulseShape::Rectangular | PulseShape::HalfSine => 1.0,
            PulseShape::Gaussian { .. } => 3.0,
        }
    }

    /// Pulse amplitude at `t`, measured in symbol periods from the symbol centre
    pub fn amplitude(&self, t: f32) -> f32 {
        match *self {
            PulseShape::Rectangular => {
                if (-0.5..0.5).contains(&t) {
                    1.0
                } else {
                    0.0
                }
            }
            PulseShape::HalfSine => {
                if t.abs() <= 0.5 {
                    libm::cosf(core::f32::consts::PI * t)
                } else {
                    0.0
                }
            }
            PulseShape::Gaussian { bt } => {
                if t.abs() < 1.5 {
                    gaussian_pulse(bt, t)
                } else {
                    0.0
                }
            }
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if let PulseShape::Gaussian { bt } = *self {
            ensure!(
                bt.is_finite() && bt > 0.0,
                InvalidConfigurationSnafu {
                    reason: format!("gaussian pulse needs a positive bandwidth-time product, got {bt}"),
                }
            );
        }
        Ok(())
    }
}

/// Gaussian-filtered rectangular pulse
///
/// `pulse(t) = 0.5 * (erf(c*b*(t+0.5)) - erf(c*b*(t-0.5)))`
/// where `c = pi * sqrt(2 / ln(2))` and `b` is the bandwidth-time product.
fn gaussian_pulse(bt: f32, t: f32) -> f32 {
    use core::f32::consts::PI;

    let c = PI * libm::sqrtf(2.0 / libm::logf(2.0));
    let arg1 = c * bt * (t + 0.5);
    let arg2 = c * bt * (t - 0.5);

    0.5 * (libm::erff(arg1) - libm::erff(arg2))
}

/// Evaluate the shaped sync-word waveform at (possibly fractional) sample time `t`
///
/// Sums the contribution of every symbol whose pulse covers `t`. Outside the
/// pulses the waveform is zero.
pub fn shaped_sample(symbols: &[Complex32], sps: f32, pulse: PulseShape, t: f32) -> Complex32 {
    let mut acc = Complex32::new(0.0, 0.0);
    if symbols.is_empty() {
        return acc;
    }

    let half_span = pulse.span() / 2.0;
    let centre = (t + 0.5) / sps - 0.5; // t expressed as a fractional symbol index
    let first = libm::ceilf(centre - half_span).max(0.0) as usize;
    let last = libm::floorf(centre + half_span);
    if last < 0.0 {
        return acc;
    }
    let last = (last as usize).min(symbols.len() - 1);

    for m in first..=last {
        let u = centre - m as f32;
        let a = pulse.amplitude(u);
        if a != 0.0 {
            acc += symbols[m] * a;
        }
    }
    acc
}

/// Barker-13 chip signs, the classic low-sidelobe BPSK sync word
pub const BARKER_13: [i8; 13] = [1, 1, 1, 1, 1, -1, -1, 1, 1, -1, 1, -1, 1];

/// Map chip signs to BPSK symbols (`+1` to `1 + 0j`, anything else to `-1 + 0j`)
pub fn bpsk_symbols(chips: &[i8]) -> Vec<Complex32> {
    chips
        .iter()
        .map(|&c| Complex32::new(if c > 0 { 1.0 } else { -1.0 }, 0.0))
        .collect()
}

/// Oversampled correlation reference derived from a sync word
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceWaveform {
    taps: Vec<Complex32>,
    energy: f64,
    symbols: Vec<Complex32>,
    samples_per_symbol: f32,
    pulse: PulseShape,
}

impl ReferenceWaveform {
    /// Build a rectangular-pulse reference
    ///
    /// # Example
    /// ```
    /// use corr_est::reference::ReferenceWaveform;
    /// use num::complex::Complex32;
    ///
    /// let symbols = vec![Complex32::new(1.0, 0.0), Complex32::new(-1.0, 0.0)];
    /// let reference = ReferenceWaveform::build(&symbols, 4.0)?;
    /// assert_eq!(reference.len(), 8);
    /// # Ok::<(), corr_est::CorrEstError>(())
    /// ```
    pub fn build(symbols: &[Complex32], samples_per_symbol: f32) -> Result<Self> {
        Self::build_with_pulse(symbols, samples_per_symbol, PulseShape::Rectangular)
    }

    /// Build a reference with an explicit pulse shape
    pub fn build_with_pulse(
        symbols: &[Complex32],
        samples_per_symbol: f32,
        pulse: PulseShape,
    ) -> Result<Self> {
        validate_symbols(symbols)?;
        validate_samples_per_symbol(samples_per_symbol)?;
        pulse.validate()?;

        let len = ((symbols.len() as f32 * samples_per_symbol).round() as usize).max(1);
        let taps: Vec<Complex32> = (0..len)
            .map(|i| shaped_sample(symbols, samples_per_symbol, pulse, i as f32))
            .collect();

        let energy: f64 = taps.iter().map(|t| t.norm_sqr() as f64).sum();
        ensure!(
            energy > 0.0,
            InvalidConfigurationSnafu { reason: "reference waveform has zero energy" }
        );

        Ok(Self {
            taps,
            energy,
            symbols: symbols.to_vec(),
            samples_per_symbol,
            pulse,
        })
    }

    pub fn taps(&self) -> &[Complex32] {
        &self.taps
    }

    pub fn len(&self) -> usize {
        self.taps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.taps.is_empty()
    }

    /// Sum of squared tap magnitudes
    pub fn energy(&self) -> f64 {
        self.energy
    }

    pub fn symbols(&self) -> &[Complex32] {
        &self.symbols
    }

    pub fn samples_per_symbol(&self) -> f32 {
        self.samples_per_symbol
    }

    pub fn pulse_shape(&self) -> PulseShape {
        self.pulse
    }

    /// Shaped waveform at fractional sample time `t` (see [`shaped_sample`])
    pub fn sample_at(&self, t: f32) -> Complex32 {
        shaped_sample(&self.symbols, self.samples_per_symbol, self.pulse, t)
    }
}
