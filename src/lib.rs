//! Sync-word correlation estimator for complex baseband streams
//!
//! Correlates a stream against a known, pulse-shaped symbol sequence and tags
//! each detection with carrier phase, sub-sample timing and correlation
//! strength, passing the samples through unchanged.
//!
//! **Module Organization**:
//! - `reference` - symbols to oversampled matched-filter taps
//! - `correlator` - sliding normalized correlation, direct or overlap-save
//! - `peak` - peak detection with phase and timing estimation
//! - `tags` - stream annotations for each detection
//! - `engine` - block-oriented driver tying the above together
//! - `simulation`, `wav` - test signal generation and I/Q files

pub mod config;
pub mod correlator;
pub mod engine;
pub mod error;
pub mod peak;
pub mod reference;
pub mod simulation;
pub mod tags;
pub mod tracing_init;
pub mod wav;

pub use config::{CorrEstConfig, CorrelatorMode, DEFAULT_THRESHOLD, FFT_MIN_TAPS};
pub use engine::{CorrEst, ProcessedBlock, WorkOutput};
pub use error::{CorrEstError, Result};
pub use num::complex::Complex32;
pub use peak::DetectionEvent;
pub use reference::{PulseShape, ReferenceWaveform};
pub use tags::{Tag, TagKey, TagValue};
