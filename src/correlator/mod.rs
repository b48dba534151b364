//! Sliding Correlator
//!
//! Keeps the trailing window of input samples and produces one normalized
//! complex correlation per input sample:
//!
//! `c[k] = sum_j x[k-L+1+j] * conj(r[j]) / sqrt(E_ref * E_win[k])`
//!
//! so an exact (scaled, rotated) copy of the reference yields `|c| = 1`.
//!
//! **Module Organization**:
//! - `history` - ring buffer holding the trailing window
//! - `fft` - overlap-save block correlation
//!
//! The window energy `E_win` is tracked incrementally (add the new sample,
//! subtract the evicted one) in `f64`, and recomputed exactly once per
//! history length to bound accumulated rounding. A window counts as silent
//! when its energy is within that rounding residue of zero, measured against
//! the largest window energy since the last exact recomputation, so the
//! result does not depend on the input or reference scale.

mod fft;
mod history;

pub use history::HistoryBuffer;

use num::complex::Complex32;
use num::Zero;
use tracing::trace;

use crate::config::CorrelatorMode;
use crate::reference::ReferenceWaveform;
use fft::OverlapSave;

/// Window energies below this fraction of the recent peak window energy count as silence
const SILENCE_FLOOR: f64 = 1e-12;

/// One correlator output
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrelationSample {
    /// Absolute index of the newest sample in the correlated window
    pub index: u64,
    /// Normalized complex correlation
    pub value: Complex32,
    /// `|value|`, clamped to 1.0
    pub magnitude: f32,
}

#[derive(Debug)]
pub struct SlidingCorrelator {
    reference: ReferenceWaveform,
    history: HistoryBuffer,
    window_energy: f64,
    /// Largest window energy since the last exact recomputation
    energy_scale: f64,
    since_refresh: usize,
    next_index: u64,
    /// Absolute index of the oldest sample the history really holds after a retarget
    valid_from: u64,
    fft: Option<OverlapSave>,
}

impl SlidingCorrelator {
    pub fn new(reference: ReferenceWaveform) -> Self {
        let history = HistoryBuffer::new(reference.len());
        Self {
            reference,
            history,
            window_energy: 0.0,
            energy_scale: 0.0,
            since_refresh: 0,
            next_index: 0,
            valid_from: 0,
            fft: None,
        }
    }

    pub fn reference(&self) -> &ReferenceWaveform {
        &self.reference
    }

    pub fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    /// Absolute index the next pushed sample will carry
    pub fn next_index(&self) -> u64 {
        self.next_index
    }

    pub fn seek(&mut self, index: u64) {
        self.next_index = index;
    }

    /// Earliest absolute index a complete correlation window may start at
    ///
    /// Growing the reference pads the history with zeros standing in for samples
    /// that were never kept; windows reaching back into that padding are partial.
    pub fn valid_from(&self) -> u64 {
        self.valid_from
    }

    /// Incrementally tracked energy of the current window
    pub fn window_energy(&self) -> f64 {
        self.window_energy
    }

    /// Append one sample and correlate the trailing window against the reference
    pub fn push_sample(&mut self, x: Complex32) -> CorrelationSample {
        self.advance(x);
        let dot = self.history.dot_conj(self.reference.taps());
        self.normalize(dot)
    }

    /// Correlate a whole block, appending one sample per input to `out`
    pub fn correlate_block(
        &mut self,
        input: &[Complex32],
        mode: CorrelatorMode,
        out: &mut Vec<CorrelationSample>,
    ) {
        out.clear();
        out.reserve(input.len());

        if !mode.use_fft(self.reference.len(), input.len()) {
            out.extend(input.iter().map(|&x| self.push_sample(x)));
            return;
        }

        let taps = self.reference.taps();
        let plan = self.fft.get_or_insert_with(|| {
            let plan = OverlapSave::new(taps);
            trace!(taps = taps.len(), nfft = plan.nfft(), "planned overlap-save correlator");
            plan
        });
        let dots = plan.correlate(&self.history, input);

        for (&x, dot) in input.iter().zip(dots) {
            self.advance(x);
            out.push(self.normalize(dot));
        }
    }

    /// Switch to a new reference, keeping the most recent history samples
    pub fn retarget(&mut self, reference: ReferenceWaveform) {
        let kept = self.history.capacity().min(reference.len());
        self.valid_from = self.valid_from.max(self.next_index.saturating_sub(kept as u64));
        self.history = self.history.resized(reference.len());
        self.window_energy = self.history.energy();
        self.energy_scale = self.window_energy;
        self.since_refresh = 0;
        self.reference = reference;
        self.fft = None;
    }

    /// Forget all history; the stream position is left to the caller
    pub fn clear(&mut self) {
        self.history.clear();
        self.window_energy = 0.0;
        self.energy_scale = 0.0;
        self.since_refresh = 0;
        self.valid_from = 0;
    }

    fn advance(&mut self, x: Complex32) {
        let evicted = self.history.push(x);
        self.since_refresh += 1;
        if self.since_refresh >= self.history.capacity() {
            self.window_energy = self.history.energy();
            self.energy_scale = self.window_energy;
            self.since_refresh = 0;
        } else {
            self.window_energy += x.norm_sqr() as f64 - evicted.norm_sqr() as f64;
            if self.window_energy < 0.0 {
                self.window_energy = 0.0;
            }
            self.energy_scale = self.energy_scale.max(self.window_energy);
        }
    }

    fn normalize(&mut self, dot: Complex32) -> CorrelationSample {
        let index = self.next_index;
        self.next_index += 1;

        let ref_energy = self.reference.energy();
        let floor = (SILENCE_FLOOR * self.energy_scale).max(f64::MIN_POSITIVE);
        if self.window_energy <= floor {
            return CorrelationSample {
                index,
                value: Complex32::zero(),
                magnitude: 0.0,
            };
        }

        let scale = (ref_energy * self.window_energy).sqrt();
        let value = Complex32::new((dot.re as f64 / scale) as f32, (dot.im as f64 / scale) as f32);
        CorrelationSample {
            index,
            value,
            magnitude: value.norm().min(1.0),
        }
    }
}
