//! Overlap-save block correlation
//!
//! Computes the same inner products as the direct path, one per input sample,
//! by convolving the block with the time-reversed conjugated reference in the
//! frequency domain. Each FFT segment carries `taps - 1` samples of overlap and
//! yields `nfft - taps + 1` new outputs.

use std::sync::Arc;

use num::complex::Complex32;
use num::Zero;
use rustfft::{Fft, FftPlanner};

use super::history::HistoryBuffer;

/// Smallest FFT size we plan, to keep per-segment overhead reasonable for short references
const MIN_FFT_SIZE: usize = 64;

pub(crate) struct OverlapSave {
    taps_len: usize,
    nfft: usize,
    /// FFT of the correlation kernel, pre-scaled by 1/nfft
    kernel: Vec<Complex32>,
    forward: Arc<dyn Fft<f32>>,
    inverse: Arc<dyn Fft<f32>>,
    segment: Vec<Complex32>,
}

impl std::fmt::Debug for OverlapSave {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlapSave")
            .field("taps_len", &self.taps_len)
            .field("nfft", &self.nfft)
            .finish()
    }
}

impl OverlapSave {
    pub(crate) fn new(taps: &[Complex32]) -> Self {
        let taps_len = taps.len();
        let nfft = (2 * taps_len).next_power_of_two().max(MIN_FFT_SIZE);

        let mut planner = FftPlanner::new();
        let forward = planner.plan_fft_forward(nfft);
        let inverse = planner.plan_fft_inverse(nfft);

        // h[m] = conj(r[L-1-m]) turns convolution into correlation against r
        let mut kernel = vec![Complex32::zero(); nfft];
        for (k, tap) in kernel.iter_mut().zip(taps.iter().rev()) {
            *k = tap.conj();
        }
        forward.process(&mut kernel);

        // RustFFT does not normalize the inverse transform
        let scale = 1.0 / nfft as f32;
        for k in kernel.iter_mut() {
            *k *= scale;
        }

        Self {
            taps_len,
            nfft,
            kernel,
            forward,
            inverse,
            segment: vec![Complex32::zero(); nfft],
        }
    }

    pub(crate) fn nfft(&self) -> usize {
        self.nfft
    }

    /// Raw inner products for every sample of `input`, continuing from `history`
    ///
    /// `history` holds the window that precedes the block; its capacity must equal
    /// the reference length.
    pub(crate) fn correlate(&mut self, history: &HistoryBuffer, input: &[Complex32]) -> Vec<Complex32> {
        debug_assert_eq!(history.capacity(), self.taps_len);

        let overlap = self.taps_len - 1;
        let step = self.nfft - overlap;

        // Extended stream: the last L-1 history samples followed by the block
        let extended: Vec<Complex32> = history
            .iter()
            .skip(1)
            .copied()
            .chain(input.iter().copied())
            .collect();

        let mut out = Vec::with_capacity(input.len());
        let mut start = 0;
        while start < input.len() {
            for (i, s) in self.segment.iter_mut().enumerate() {
                *s = extended.get(start + i).copied().unwrap_or_else(Complex32::zero);
            }

            self.forward.process(&mut self.segment);
            for (s, k) in self.segment.iter_mut().zip(self.kernel.iter()) {
                *s *= *k;
            }
            self.inverse.process(&mut self.segment);

            let take = step.min(input.len() - start);
            out.extend_from_slice(&self.segment[overlap..overlap + take]);
            start += step;
        }

        out
    }
}
