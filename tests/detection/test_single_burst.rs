//! A single clean sync word: strength, phase, timing and tag placement

use corr_est::{CorrEst, CorrEstConfig, Complex32, PulseShape, ReferenceWaveform};

#[path = "../test_utils.rs"]
mod test_utils;
use test_utils::{detections, phase_error, qpsk, run_in_blocks, zeros};

#[test]
fn test_exact_copy_at_stream_start() {
    // 16-tap reference fed at absolute index 100 into an empty history
    let mut engine = CorrEst::new(CorrEstConfig::new(qpsk(), 4.0, 3)).unwrap();
    let mut stream = engine.reference().taps().to_vec();
    stream.extend(zeros(50));

    let found = detections(&run_in_blocks(&mut engine, 100, &stream, stream.len()));
    assert_eq!(found.len(), 1);
    let d = found[0];
    assert_eq!(d.start, 100);
    assert_eq!(d.mark, 103);
    assert!((d.strength - 1.0).abs() < 1e-5);
    assert!(d.phase.abs() < 1e-5);
    // Neighbours at +-1 sample are equal, so the vertex sits on the peak
    assert!(d.timing.abs() < 1e-3);
}

#[test]
fn test_amplitude_and_phase_offset() {
    let mut engine = CorrEst::new(CorrEstConfig::new(qpsk(), 4.0, 0)).unwrap();
    let rotation = Complex32::from_polar(0.3, 1.0);
    let burst: Vec<Complex32> = engine.reference().taps().iter().map(|&t| t * rotation).collect();
    let stream = test_utils::place_bursts(300, &burst, &[50]);

    let found = detections(&run_in_blocks(&mut engine, 0, &stream, 64));
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].start, 50);
    assert!((found[0].strength - 1.0).abs() < 1e-4);
    assert!(phase_error(found[0].phase, 1.0) < 1e-4);
}

#[test]
fn test_tiny_and_huge_amplitudes() {
    for gain in [1e-7f32, 5e-7, 1e-3, 1e4] {
        let mut engine = CorrEst::new(CorrEstConfig::new(qpsk(), 4.0, 0)).unwrap();
        let burst: Vec<Complex32> = engine.reference().taps().iter().map(|&t| t * gain).collect();
        let stream = test_utils::place_bursts(120, &burst, &[40]);

        let found = detections(&run_in_blocks(&mut engine, 0, &stream, 120));
        assert_eq!(found.len(), 1, "gain {}", gain);
        assert_eq!(found[0].start, 40);
        assert!((found[0].strength - 1.0).abs() < 1e-4, "gain {}: {}", gain, found[0].strength);
    }
}

#[test]
fn test_large_symbol_values() {
    let symbols: Vec<Complex32> = qpsk().iter().map(|&s| s * 1e8).collect();
    let mut engine = CorrEst::new(CorrEstConfig::new(symbols, 4.0, 0)).unwrap();
    let unit = ReferenceWaveform::build(&qpsk(), 4.0).unwrap();
    let stream = test_utils::place_bursts(100, unit.taps(), &[30]);

    let found = detections(&run_in_blocks(&mut engine, 0, &stream, 100));
    assert_eq!(found.len(), 1);
    assert!((found[0].strength - 1.0).abs() < 1e-4);
}

#[test]
fn test_phase_wraps_into_principal_range() {
    let mut engine = CorrEst::new(CorrEstConfig::new(qpsk(), 4.0, 0)).unwrap();
    let rotation = Complex32::from_polar(1.0, -2.5);
    let burst: Vec<Complex32> = engine.reference().taps().iter().map(|&t| t * rotation).collect();
    let stream = test_utils::place_bursts(200, &burst, &[40]);

    let found = detections(&run_in_blocks(&mut engine, 0, &stream, 200));
    assert_eq!(found.len(), 1);
    let phase = found[0].phase;
    assert!(phase > -std::f32::consts::PI && phase <= std::f32::consts::PI);
    assert!(phase_error(phase, -2.5) < 1e-4);
}

#[test]
fn test_fractional_delay_timing() {
    // Half-sine shaping gives a smooth correlation peak for interpolation
    let symbols: Vec<Complex32> = [0, 1, 1, 3, 2, 0, 3, 3, 1, 2, 0, 0, 2, 1, 3, 2]
        .iter()
        .map(|&k| Complex32::from_polar(1.0, k as f32 * std::f32::consts::FRAC_PI_2))
        .collect();
    let reference = ReferenceWaveform::build_with_pulse(&symbols, 8.0, PulseShape::HalfSine).unwrap();
    let len = reference.len();
    assert_eq!(len, 128);

    for delay in [0.3f32, -0.25, 0.0] {
        let config = CorrEstConfig::new(symbols.clone(), 8.0, 0)
            .with_pulse_shape(PulseShape::HalfSine)
            .with_threshold(0.8);
        let mut engine = CorrEst::new(config).unwrap();

        let position = 200usize;
        let mut stream = zeros(position + len + 100);
        for j in -4..(len as i32 + 4) {
            stream[(position as i32 + j) as usize] = reference.sample_at(j as f32 - delay);
        }

        let found = detections(&run_in_blocks(&mut engine, 0, &stream, 256));
        assert_eq!(found.len(), 1, "delay {}", delay);
        assert_eq!(found[0].start, position as u64, "delay {}", delay);
        assert!(
            (found[0].timing - delay).abs() < 0.1,
            "delay {}: estimated {}", delay, found[0].timing
        );
        assert!(found[0].strength > 0.95);
        assert!(found[0].phase.abs() < 1e-3);
    }
}

#[test]
fn test_below_threshold_is_silent() {
    // Sync word missing its first sample peaks at sqrt(15/16) ~ 0.968
    let config = CorrEstConfig::new(qpsk(), 4.0, 0).with_threshold(0.99);
    let mut engine = CorrEst::new(config).unwrap();
    let mut burst = engine.reference().taps().to_vec();
    burst[0] = Complex32::new(0.0, 0.0);
    let stream = test_utils::place_bursts(100, &burst, &[40]);

    assert!(run_in_blocks(&mut engine, 0, &stream, 100).is_empty());
}

#[test]
fn test_threshold_of_one_detects_exact_copy() {
    let config = CorrEstConfig::new(qpsk(), 4.0, 0).with_threshold(1.0);
    let mut engine = CorrEst::new(config).unwrap();
    let stream = test_utils::place_bursts(100, engine.reference().taps(), &[30]);

    let found = detections(&run_in_blocks(&mut engine, 0, &stream, 100));
    // Rounding may leave the peak a hair under 1.0; it must never fire elsewhere
    assert!(found.len() <= 1);
    if let Some(d) = found.first() {
        assert_eq!(d.start, 30);
    }
}

#[test]
fn test_correlation_output_matches_tags() {
    let config = CorrEstConfig::new(qpsk(), 4.0, 0).with_correlation_output(true);
    let mut engine = CorrEst::new(config).unwrap();
    let stream = test_utils::place_bursts(80, engine.reference().taps(), &[20]);

    let out = engine.process(0, &stream).unwrap();
    let corr = out.correlation.expect("correlation output enabled");
    assert_eq!(corr.len(), stream.len());

    let (peak, _) = corr
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.norm().total_cmp(&b.1.norm()))
        .unwrap();
    assert_eq!(peak, 35);
    assert!((corr[peak].norm() - 1.0).abs() < 1e-5);
    assert!(corr.iter().all(|c| c.norm() <= 1.0 + 1e-5));

    let found = detections(&out.tags);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].start, 20);
}
