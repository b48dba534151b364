//! Annotation Emitter
//!
//! Turns each accepted peak into stream tags for downstream synchronization:
//!
//! | key          | offset                      | value                          |
//! |--------------|-----------------------------|--------------------------------|
//! | `corr_start` | correlation start           | (start index, strength)        |
//! | `phase_est`  | correlation start + delay   | phase offset, radians          |
//! | `time_est`   | correlation start + delay   | timing offset, samples         |
//! | `corr_est`   | correlation start + delay   | normalized strength            |
//!
//! The correlator cannot know which sample of the sync word downstream blocks
//! treat as the reference instant (pulses with intentional ISI move it), so the
//! mark delay is a manual setting. Inspect the passthrough output against the
//! `corr_start` tag to choose it.

use std::fmt;

use snafu::ensure;

use crate::error::{InsufficientHistorySnafu, Result};
use crate::peak::DetectionEvent;

/// Tag keys understood by downstream synchronization blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKey {
    PhaseEst,
    TimeEst,
    CorrEst,
    CorrStart,
}

impl TagKey {
    pub const fn as_str(&self) -> &'static str {
        match self {
            TagKey::PhaseEst => "phase_est",
            TagKey::TimeEst => "time_est",
            TagKey::CorrEst => "corr_est",
            TagKey::CorrStart => "corr_start",
        }
    }
}

impl fmt::Display for TagKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TagValue {
    Real(f32),
    /// `corr_start` payload: absolute start index and correlation strength
    StartAndStrength { start: u64, strength: f32 },
}

impl TagValue {
    /// The real payload, if this is a scalar tag
    pub fn as_real(&self) -> Option<f32> {
        match *self {
            TagValue::Real(v) => Some(v),
            TagValue::StartAndStrength { .. } => None,
        }
    }
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagValue::Real(v) => write!(f, "{v:.6}"),
            TagValue::StartAndStrength { start, strength } => write!(f, "({start}, {strength:.6})"),
        }
    }
}

/// A (key, absolute sample index, value) annotation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tag {
    pub offset: u64,
    pub key: TagKey,
    pub value: TagValue,
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {}: {}", self.key, self.offset, self.value)
    }
}

#[derive(Debug, Clone)]
pub struct TagEmitter {
    mark_delay: u32,
}

impl TagEmitter {
    pub fn new(mark_delay: u32) -> Self {
        Self { mark_delay }
    }

    pub fn mark_delay(&self) -> u32 {
        self.mark_delay
    }

    pub fn set_mark_delay(&mut self, mark_delay: u32) {
        self.mark_delay = mark_delay;
    }

    /// Mark delay actually applied, kept inside the correlation window
    pub fn effective_mark_delay(&self, window_len: usize) -> u32 {
        let max = window_len.saturating_sub(1).min(u32::MAX as usize) as u32;
        self.mark_delay.min(max)
    }

    /// Tags for one detection, ordered by offset
    ///
    /// Fails with `InsufficientHistory` when the correlation window begins before
    /// `origin`, the first sample actually held in history (stream start, or the
    /// oldest sample kept across a reference change).
    pub fn emit(&self, event: &DetectionEvent, origin: u64, window_len: usize) -> Result<[Tag; 4]> {
        ensure!(
            event.correlation_start >= 0 && event.correlation_start as u64 >= origin,
            InsufficientHistorySnafu { start: event.correlation_start, origin }
        );

        let start = event.correlation_start as u64;
        let mark = start + self.effective_mark_delay(window_len) as u64;
        let strength = event.correlation_strength;

        Ok([
            Tag {
                offset: start,
                key: TagKey::CorrStart,
                value: TagValue::StartAndStrength { start, strength },
            },
            Tag {
                offset: mark,
                key: TagKey::PhaseEst,
                value: TagValue::Real(event.phase_estimate),
            },
            Tag {
                offset: mark,
                key: TagKey::TimeEst,
                value: TagValue::Real(event.timing_estimate),
            },
            Tag {
                offset: mark,
                key: TagKey::CorrEst,
                value: TagValue::Real(strength),
            },
        ])
    }
}
