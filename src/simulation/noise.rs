use num::complex::Complex32;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use snafu::ResultExt;

use crate::error::{NoiseModelSnafu, Result};

/// Mean power `|x|^2` of a complex signal
pub fn mean_power(signal: &[Complex32]) -> f32 {
    if signal.is_empty() {
        return 0.0;
    }
    let sum: f64 = signal.iter().map(|x| x.norm_sqr() as f64).sum();
    (sum / signal.len() as f64) as f32
}

/// Compute RMS (Root Mean Square) amplitude of a complex signal
pub fn rms_power(signal: &[Complex32]) -> f32 {
    mean_power(signal).sqrt()
}

/// Circular complex Gaussian noise with total power `sigma^2` per sample
pub fn complex_noise(num_samples: usize, sigma: f32, seed: u64) -> Result<Vec<Complex32>> {
    // Split the power evenly between I and Q
    let normal = Normal::new(0.0, sigma / std::f32::consts::SQRT_2).context(NoiseModelSnafu)?;
    let mut rng = StdRng::seed_from_u64(seed);

    Ok((0..num_samples)
        .map(|_| Complex32::new(normal.sample(&mut rng), normal.sample(&mut rng)))
        .collect())
}

/// Add white Gaussian noise so that `signal_power / noise_power` equals `snr_db`
///
/// `signal_power` is the mean power of the wanted signal (for example the
/// sync-word burst), not of the whole buffer, which may be mostly silence.
pub fn add_awgn(samples: &mut [Complex32], signal_power: f32, snr_db: f32, seed: u64) -> Result<()> {
    let noise_power = signal_power / 10.0_f32.powf(snr_db / 10.0);
    let noise = complex_noise(samples.len(), noise_power.sqrt(), seed)?;
    for (s, n) in samples.iter_mut().zip(noise) {
        *s += n;
    }
    Ok(())
}
