//! Channel Simulation
//!
//! Builds synthetic complex baseband test streams: sync-word bursts placed at
//! chosen positions, rotated by a carrier phase offset, buried in seeded white
//! Gaussian noise.
//!
//! **Module Organization**:
//! - `noise` - seeded complex AWGN and power measurements
//! - `channel` - phase rotation, scaling and burst mixing

mod channel;
mod noise;

pub use channel::{mix_burst, rotate, scale};
pub use noise::{add_awgn, complex_noise, mean_power, rms_power};
