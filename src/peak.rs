//! Peak Estimator
//!
//! Scans the correlation magnitude stream for sync-word peaks and, for each
//! accepted peak, estimates carrier phase and sub-sample timing.
//!
//! **States**:
//! - below threshold: waiting for `magnitude >= threshold`
//! - tracking: above threshold, waiting for the magnitude to turn down after a rise
//! - refractory: a peak was just reported; ignore the next reference-length samples
//!
//! **Decision rule**:
//! A peak is the sample where the magnitude last rose strictly, declared as soon
//! as a later sample is strictly smaller. On a plateau of equal values the
//! earliest sample wins. A candidate that never rose while tracking (the
//! decaying tail of an earlier correlation) is dropped once it falls below
//! threshold.

use tracing::trace;

use crate::correlator::CorrelationSample;

/// An accepted correlation peak
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionEvent {
    /// Absolute index of the peak correlation sample
    pub peak_index: u64,
    /// Carrier phase offset in radians, in (-pi, pi]
    pub phase_estimate: f32,
    /// Sub-sample timing offset in samples, in [-0.5, 0.5]
    pub timing_estimate: f32,
    /// Normalized correlation magnitude at the peak
    pub correlation_strength: f32,
    /// Absolute index of the first sample in the peak's correlation window
    pub correlation_start: i64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PeakCandidate {
    sample: CorrelationSample,
    /// Magnitude of the sample before the peak
    before: f32,
    /// Magnitude of the sample after the peak, once seen
    after: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum State {
    BelowThreshold,
    Tracking { candidate: Option<PeakCandidate> },
    Refractory { until: u64 },
}

#[derive(Debug, Clone)]
pub struct PeakEstimator {
    threshold: f32,
    window_len: usize,
    state: State,
    previous: Option<f32>,
}

impl PeakEstimator {
    /// `window_len` is the reference length: it sets the refractory period and
    /// locates the start of each peak's correlation window.
    pub fn new(threshold: f32, window_len: usize) -> Self {
        Self {
            threshold,
            window_len: window_len.max(1),
            state: State::BelowThreshold,
            previous: None,
        }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Takes effect from the next processed sample
    pub fn set_threshold(&mut self, threshold: f32) {
        self.threshold = threshold;
    }

    pub fn window_len(&self) -> usize {
        self.window_len
    }

    /// Whether a candidate peak is currently being tracked
    pub fn is_tracking(&self) -> bool {
        matches!(self.state, State::Tracking { .. })
    }

    /// Whether detections are currently suppressed after a recent peak
    pub fn is_refractory(&self) -> bool {
        matches!(self.state, State::Refractory { .. })
    }

    /// Return to the below-threshold state, forgetting the magnitude history
    pub fn reset(&mut self, window_len: usize) {
        self.window_len = window_len.max(1);
        self.state = State::BelowThreshold;
        self.previous = None;
    }

    /// Feed one correlation sample; returns an event when a peak is declared
    pub fn process(&mut self, sample: &CorrelationSample) -> Option<DetectionEvent> {
        let m = sample.magnitude;
        let prev = self.previous.replace(m);

        let mut state = self.state;
        if let State::Refractory { until } = state {
            if sample.index < until {
                return None;
            }
            state = State::BelowThreshold;
        }

        let (next, event) = match state {
            State::BelowThreshold | State::Refractory { .. } => {
                if m >= self.threshold {
                    // Entering on a rise makes this sample the first candidate
                    let candidate = prev.filter(|&p| m > p).map(|p| PeakCandidate {
                        sample: *sample,
                        before: p,
                        after: None,
                    });
                    trace!(index = sample.index, magnitude = m, rising = candidate.is_some(), "tracking");
                    (State::Tracking { candidate }, None)
                } else {
                    (State::BelowThreshold, None)
                }
            }
            State::Tracking { mut candidate } => {
                let p = prev.unwrap_or(0.0);
                if m > p {
                    candidate = Some(PeakCandidate {
                        sample: *sample,
                        before: p,
                        after: None,
                    });
                } else if m == p {
                    if let Some(c) = candidate.as_mut() {
                        c.after.get_or_insert(m);
                    }
                } else if let Some(c) = candidate {
                    let event = self.declare(&c, c.after.unwrap_or(m));
                    let until = c.sample.index + self.window_len as u64;
                    return self.finish(State::Refractory { until }, Some(event));
                }

                if m < self.threshold {
                    trace!(index = sample.index, magnitude = m, "dropping candidate without a turn-down");
                    (State::BelowThreshold, None)
                } else {
                    (State::Tracking { candidate }, None)
                }
            }
        };

        self.finish(next, event)
    }

    fn finish(&mut self, state: State, event: Option<DetectionEvent>) -> Option<DetectionEvent> {
        self.state = state;
        event
    }

    fn declare(&self, c: &PeakCandidate, after: f32) -> DetectionEvent {
        DetectionEvent {
            peak_index: c.sample.index,
            phase_estimate: c.sample.value.arg(),
            timing_estimate: parabolic_offset(c.before, c.sample.magnitude, after),
            correlation_strength: c.sample.magnitude,
            correlation_start: c.sample.index as i64 - (self.window_len as i64 - 1),
        }
    }
}

/// Vertex of the parabola through three equally spaced samples, relative to the middle one
///
/// `offset = 0.5 * (y0 - y2) / (y0 - 2*y1 + y2)`, clamped to [-0.5, 0.5].
/// A flat (degenerate) fit yields 0.
pub fn parabolic_offset(y0: f32, y1: f32, y2: f32) -> f32 {
    let denom = y0 - 2.0 * y1 + y2;
    if denom.abs() < 1e-9 {
        return 0.0;
    }
    let offset = 0.5 * (y0 - y2) / denom;
    if offset.is_nan() {
        return 0.0;
    }
    offset.clamp(-0.5, 0.5)
}
