use num::complex::Complex32;

/// Rotate every sample by a carrier phase offset in radians
pub fn rotate(samples: &mut [Complex32], phase: f32) {
    let rotation = Complex32::from_polar(1.0, phase);
    for s in samples.iter_mut() {
        *s *= rotation;
    }
}

pub fn scale(samples: &mut [Complex32], gain: f32) {
    for s in samples.iter_mut() {
        *s *= gain;
    }
}

/// Add `burst` into `samples` starting at `start_index`
///
/// Samples that would fall past the end of the buffer are dropped. Returns the
/// number of burst samples actually mixed in.
pub fn mix_burst(samples: &mut [Complex32], burst: &[Complex32], start_index: usize) -> usize {
    let Some(tail) = samples.get_mut(start_index..) else {
        return 0;
    };
    let n = tail.len().min(burst.len());
    for (s, b) in tail.iter_mut().zip(burst) {
        *s += *b;
    }
    n
}
