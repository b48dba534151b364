//! Error types for the correlation estimator.

use snafu::Snafu;

/// Errors raised while configuring or driving the correlation estimator.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CorrEstError {
    /// Rejected configuration (symbols, rate or threshold)
    #[snafu(display("invalid configuration: {reason}"))]
    InvalidConfiguration { reason: String },

    /// A detection whose correlation window starts before the available history
    #[snafu(display("correlation window starts at {start}, before the first available sample {origin}"))]
    InsufficientHistory { start: i64, origin: u64 },

    /// Block start index does not continue the previous block
    #[snafu(display("block starts at sample {got}, expected {expected}"))]
    Discontinuity { expected: u64, got: u64 },

    /// Output buffer length differs from the input block length
    #[snafu(display("output buffer holds {output} samples, input block has {input}"))]
    BufferMismatch { input: usize, output: usize },

    /// I/Q WAV file could not be read or written
    #[snafu(display("I/Q WAV file '{path}': {source}"))]
    Wav { path: String, source: hound::Error },

    /// Unsupported WAV layout
    #[snafu(display("I/Q WAV file '{path}': {reason}"))]
    WavFormat { path: String, reason: String },

    /// Noise distribution could not be built
    #[snafu(display("noise model: {source}"))]
    NoiseModel { source: rand_distr::NormalError },
}

pub type Result<T, E = CorrEstError> = std::result::Result<T, E>;
