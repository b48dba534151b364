//! I/Q WAV Files
//!
//! Complex baseband streams stored as two-channel WAV files:
//!
//! **Format**:
//! - Channel 0: in-phase (I), channel 1: quadrature (Q), interleaved
//! - Read: 32-bit float, or 16-bit PCM scaled to [-1.0, 1.0)
//! - Write: 32-bit float, so amplitudes above 1.0 survive unclipped

use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use num::complex::Complex32;
use snafu::{ensure, ResultExt};

use crate::error::{Result, WavFormatSnafu, WavSnafu};

/// Samples and sample rate of an I/Q recording
#[derive(Debug, Clone, PartialEq)]
pub struct IqRecording {
    pub sample_rate: u32,
    pub samples: Vec<Complex32>,
}

/// Read a stereo I/Q WAV file
pub fn read_iq_wav(path: impl AsRef<Path>) -> Result<IqRecording> {
    let path = path.as_ref();
    let name = path.display().to_string();
    let reader = WavReader::open(path).context(WavSnafu { path: name.as_str() })?;
    let spec = reader.spec();

    ensure!(
        spec.channels == 2,
        WavFormatSnafu {
            path: name.as_str(),
            reason: format!("expected 2 channels (I/Q), got {}", spec.channels),
        }
    );

    let interleaved: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, 32) => reader
            .into_samples::<f32>()
            .collect::<Result<_, _>>()
            .context(WavSnafu { path: name.as_str() })?,
        (SampleFormat::Int, 16) => reader
            .into_samples::<i16>()
            .map(|s| s.map(|v| v as f32 / 32768.0))
            .collect::<Result<_, _>>()
            .context(WavSnafu { path: name.as_str() })?,
        (format, bits) => {
            return WavFormatSnafu {
                path: name.as_str(),
                reason: format!("unsupported sample format {format:?} with {bits} bits"),
            }
            .fail()
        }
    };

    let samples = interleaved
        .chunks_exact(2)
        .map(|iq| Complex32::new(iq[0], iq[1]))
        .collect();

    Ok(IqRecording {
        sample_rate: spec.sample_rate,
        samples,
    })
}

/// Write samples as a stereo 32-bit float I/Q WAV file
pub fn write_iq_wav(path: impl AsRef<Path>, samples: &[Complex32], sample_rate: u32) -> Result<()> {
    let path = path.as_ref();
    let name = path.display().to_string();
    let spec = WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };

    let mut writer = WavWriter::create(path, spec).context(WavSnafu { path: name.as_str() })?;
    for s in samples {
        writer.write_sample(s.re).context(WavSnafu { path: name.as_str() })?;
        writer.write_sample(s.im).context(WavSnafu { path: name.as_str() })?;
    }
    writer.finalize().context(WavSnafu { path: name.as_str() })
}
