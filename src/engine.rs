//! Correlation estimator engine
//!
//! Streams complex baseband samples through the sliding correlator, the peak
//! estimator and the tag emitter, one block per call:
//!
//! 1. Copy the block unmodified to the primary output
//! 2. Correlate every sample against the sync-word reference
//! 3. Scan the correlation magnitudes for peaks
//! 4. Tag accepted peaks with phase, timing and strength estimates
//! 5. Optionally copy the normalized correlation to a diagnostic output
//!
//! The engine is single-threaded and never blocks. Reconfiguration happens
//! between calls and applies from the next processed sample.

use num::complex::Complex32;
use snafu::ensure;
use tracing::{debug, info, instrument, warn};

use crate::config::{validate_threshold, CorrEstConfig, CorrelatorMode};
use crate::correlator::{CorrelationSample, SlidingCorrelator};
use crate::error::{BufferMismatchSnafu, CorrEstError, DiscontinuitySnafu, Result};
use crate::peak::PeakEstimator;
use crate::reference::{PulseShape, ReferenceWaveform};
use crate::tags::{Tag, TagEmitter};

/// Result of [`CorrEst::work`]
#[derive(Debug, Clone, PartialEq)]
pub struct WorkOutput {
    /// Samples consumed (always the full block)
    pub consumed: usize,
    /// Tags produced during this call, ordered by offset
    pub tags: Vec<Tag>,
}

/// Result of [`CorrEst::process`]
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedBlock {
    pub consumed: usize,
    /// Passthrough copy of the input block
    pub samples: Vec<Complex32>,
    pub tags: Vec<Tag>,
    /// Normalized correlation per input sample, when enabled
    pub correlation: Option<Vec<Complex32>>,
}

/// Sync-word correlator with phase and timing estimation
#[derive(Debug)]
pub struct CorrEst {
    config: CorrEstConfig,
    correlator: SlidingCorrelator,
    detector: PeakEstimator,
    emitter: TagEmitter,
    /// Absolute index of the first sample seen since construction or reset
    origin: Option<u64>,
    next_index: Option<u64>,
    scratch: Vec<CorrelationSample>,
}

impl CorrEst {
    /// Build an engine, rejecting invalid configurations before any processing
    ///
    /// # Example
    /// ```
    /// use corr_est::{CorrEst, CorrEstConfig, Complex32};
    ///
    /// let symbols = vec![
    ///     Complex32::new(1.0, 0.0),
    ///     Complex32::new(0.0, 1.0),
    ///     Complex32::new(-1.0, 0.0),
    ///     Complex32::new(0.0, 1.0),
    /// ];
    /// let mut engine = CorrEst::new(CorrEstConfig::new(symbols, 4.0, 0))?;
    ///
    /// let mut stream = engine.reference().taps().to_vec();
    /// stream.extend(vec![Complex32::new(0.0, 0.0); 50]);
    /// let block = engine.process(100, &stream)?;
    ///
    /// assert_eq!(block.consumed, stream.len());
    /// assert_eq!(block.tags.len(), 4);
    /// # Ok::<(), corr_est::CorrEstError>(())
    /// ```
    pub fn new(config: CorrEstConfig) -> Result<Self> {
        config.validate()?;
        let reference =
            ReferenceWaveform::build_with_pulse(&config.symbols, config.samples_per_symbol, config.pulse_shape)?;
        let taps = reference.len();

        info!(
            symbols = config.symbols.len(),
            sps = config.samples_per_symbol,
            taps,
            threshold = config.threshold,
            mark_delay = config.mark_delay,
            "correlation estimator configured"
        );

        let engine = Self {
            detector: PeakEstimator::new(config.threshold, taps),
            emitter: TagEmitter::new(config.mark_delay),
            correlator: SlidingCorrelator::new(reference),
            config,
            origin: None,
            next_index: None,
            scratch: Vec::new(),
        };
        engine.check_mark_delay();
        Ok(engine)
    }

    pub fn config(&self) -> &CorrEstConfig {
        &self.config
    }

    /// Current correlation reference
    pub fn reference(&self) -> &ReferenceWaveform {
        self.correlator.reference()
    }

    pub fn symbols(&self) -> &[Complex32] {
        &self.config.symbols
    }

    pub fn set_symbols(&mut self, symbols: Vec<Complex32>) -> Result<()> {
        self.rebuild(symbols, self.config.samples_per_symbol, self.config.pulse_shape)
    }

    pub fn samples_per_symbol(&self) -> f32 {
        self.config.samples_per_symbol
    }

    pub fn set_samples_per_symbol(&mut self, samples_per_symbol: f32) -> Result<()> {
        let symbols = self.config.symbols.clone();
        self.rebuild(symbols, samples_per_symbol, self.config.pulse_shape)
    }

    pub fn pulse_shape(&self) -> PulseShape {
        self.config.pulse_shape
    }

    pub fn set_pulse_shape(&mut self, pulse_shape: PulseShape) -> Result<()> {
        let symbols = self.config.symbols.clone();
        self.rebuild(symbols, self.config.samples_per_symbol, pulse_shape)
    }

    pub fn mark_delay(&self) -> u32 {
        self.config.mark_delay
    }

    pub fn set_mark_delay(&mut self, mark_delay: u32) {
        self.config.mark_delay = mark_delay;
        self.emitter.set_mark_delay(mark_delay);
        self.check_mark_delay();
    }

    pub fn threshold(&self) -> f32 {
        self.config.threshold
    }

    /// New threshold applies from the next processed sample
    pub fn set_threshold(&mut self, threshold: f32) -> Result<()> {
        validate_threshold(threshold)?;
        self.config.threshold = threshold;
        self.detector.set_threshold(threshold);
        debug!(threshold, "threshold updated");
        Ok(())
    }

    pub fn correlator_mode(&self) -> CorrelatorMode {
        self.config.correlator
    }

    pub fn set_correlator_mode(&mut self, mode: CorrelatorMode) {
        self.config.correlator = mode;
    }

    /// Whether [`CorrEst::process`] returns the correlation stream
    pub fn emit_correlation(&self) -> bool {
        self.config.emit_correlation
    }

    pub fn set_emit_correlation(&mut self, enabled: bool) {
        self.config.emit_correlation = enabled;
    }

    /// Absolute index the next block must start at, once streaming has begun
    pub fn next_index(&self) -> Option<u64> {
        self.next_index
    }

    /// Drop all history and stream position; the next block starts a new stream
    pub fn reset(&mut self) {
        self.correlator.clear();
        self.detector.reset(self.correlator.reference().len());
        self.origin = None;
        self.next_index = None;
        debug!("correlation estimator reset");
    }

    /// Process one block into caller-supplied buffers
    ///
    /// `output` receives the passthrough copy of `input`; `correlation`, when given,
    /// receives the normalized correlation per sample. Blocks must be contiguous:
    /// `start` has to continue where the previous block ended.
    #[instrument(level = "trace", skip_all, fields(start = start, len = input.len()))]
    pub fn work(
        &mut self,
        start: u64,
        input: &[Complex32],
        output: &mut [Complex32],
        correlation: Option<&mut [Complex32]>,
    ) -> Result<WorkOutput> {
        ensure!(
            output.len() == input.len(),
            BufferMismatchSnafu { input: input.len(), output: output.len() }
        );
        if let Some(corr) = correlation.as_deref() {
            ensure!(
                corr.len() == input.len(),
                BufferMismatchSnafu { input: input.len(), output: corr.len() }
            );
        }
        match self.next_index {
            Some(expected) => ensure!(start == expected, DiscontinuitySnafu { expected, got: start }),
            None => {
                self.origin = Some(start);
                self.correlator.seek(start);
            }
        }

        output.copy_from_slice(input);

        let mut samples = std::mem::take(&mut self.scratch);
        self.correlator.correlate_block(input, self.config.correlator, &mut samples);

        // Windows must start at or after the first sample of the stream and of the kept history
        let origin = self.origin.unwrap_or(start).max(self.correlator.valid_from());
        let window_len = self.correlator.reference().len();
        let mut tags = Vec::new();
        for sample in &samples {
            let Some(event) = self.detector.process(sample) else {
                continue;
            };
            match self.emitter.emit(&event, origin, window_len) {
                Ok(event_tags) => {
                    debug!(
                        corr_start = event.correlation_start,
                        phase = event.phase_estimate,
                        timing = event.timing_estimate,
                        strength = event.correlation_strength,
                        "sync word detected"
                    );
                    tags.extend_from_slice(&event_tags);
                }
                Err(CorrEstError::InsufficientHistory { start, origin }) => {
                    debug!(start, origin, "suppressing detection without full history");
                }
                Err(err) => {
                    self.scratch = samples;
                    return Err(err);
                }
            }
        }

        if let Some(corr) = correlation {
            for (c, s) in corr.iter_mut().zip(&samples) {
                *c = s.value;
            }
        }

        self.next_index = Some(start + input.len() as u64);
        self.scratch = samples;

        Ok(WorkOutput {
            consumed: input.len(),
            tags,
        })
    }

    /// Process one block, allocating the passthrough and correlation outputs
    pub fn process(&mut self, start: u64, input: &[Complex32]) -> Result<ProcessedBlock> {
        let mut samples = vec![Complex32::new(0.0, 0.0); input.len()];
        let mut correlation = self
            .config
            .emit_correlation
            .then(|| vec![Complex32::new(0.0, 0.0); input.len()]);

        let WorkOutput { consumed, tags } = self.work(start, input, &mut samples, correlation.as_deref_mut())?;

        Ok(ProcessedBlock {
            consumed,
            samples,
            tags,
            correlation,
        })
    }

    fn rebuild(&mut self, symbols: Vec<Complex32>, samples_per_symbol: f32, pulse_shape: PulseShape) -> Result<()> {
        let reference = ReferenceWaveform::build_with_pulse(&symbols, samples_per_symbol, pulse_shape)?;
        let taps = reference.len();

        self.correlator.retarget(reference);
        self.detector.reset(taps);
        self.config.symbols = symbols;
        self.config.samples_per_symbol = samples_per_symbol;
        self.config.pulse_shape = pulse_shape;

        info!(
            symbols = self.config.symbols.len(),
            sps = samples_per_symbol,
            taps,
            "correlation reference rebuilt"
        );
        self.check_mark_delay();
        Ok(())
    }

    fn check_mark_delay(&self) {
        let window_len = self.correlator.reference().len();
        let effective = self.emitter.effective_mark_delay(window_len);
        if effective != self.emitter.mark_delay() {
            warn!(
                mark_delay = self.emitter.mark_delay(),
                effective,
                "mark delay exceeds the correlation window; clamping"
            );
        }
    }
}
