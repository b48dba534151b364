//! Fixed-capacity history of the most recent input samples.

use num::complex::Complex32;
use num::Zero;

/// Ring buffer holding the trailing correlation window, oldest sample first
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    buf: Vec<Complex32>,
    /// Index of the oldest sample
    head: usize,
}

impl HistoryBuffer {
    /// Zero-filled history of `capacity` samples (at least one)
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: vec![Complex32::zero(); capacity.max(1)],
            head: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Append `x`, returning the evicted oldest sample
    pub fn push(&mut self, x: Complex32) -> Complex32 {
        let evicted = core::mem::replace(&mut self.buf[self.head], x);
        self.head += 1;
        if self.head == self.buf.len() {
            self.head = 0;
        }
        evicted
    }

    /// Window contents as two slices, oldest to newest
    pub fn as_slices(&self) -> (&[Complex32], &[Complex32]) {
        (&self.buf[self.head..], &self.buf[..self.head])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Complex32> + '_ {
        let (older, newer) = self.as_slices();
        older.iter().chain(newer.iter())
    }

    /// Inner product of the window against the conjugated `taps`
    ///
    /// `taps` must have the same length as the history.
    pub fn dot_conj(&self, taps: &[Complex32]) -> Complex32 {
        debug_assert_eq!(taps.len(), self.buf.len());
        let (older, newer) = self.as_slices();
        let (taps_a, taps_b) = taps.split_at(older.len());

        let mut acc = Complex32::zero();
        for (x, t) in older.iter().zip(taps_a).chain(newer.iter().zip(taps_b)) {
            acc += *x * t.conj();
        }
        acc
    }

    /// Exact window energy
    pub fn energy(&self) -> f64 {
        self.buf.iter().map(|x| x.norm_sqr() as f64).sum()
    }

    /// Copy into a new capacity, keeping the newest samples and zero-filling the rest
    pub fn resized(&self, capacity: usize) -> Self {
        let mut out = Self::new(capacity);
        let keep = self.buf.len().min(out.capacity());
        for &x in self.iter().skip(self.buf.len() - keep) {
            out.push(x);
        }
        out
    }

    pub fn clear(&mut self) {
        self.buf.iter_mut().for_each(|x| *x = Complex32::zero());
        self.head = 0;
    }
}
