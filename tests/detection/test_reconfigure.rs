//! Configuration changes between blocks

use corr_est::{CorrEst, CorrEstConfig, Complex32, CorrEstError, PulseShape};

#[path = "../test_utils.rs"]
mod test_utils;
use test_utils::{detections, place_bursts, qpsk, run_in_blocks, zeros};

fn weakened_burst(engine: &CorrEst) -> Vec<Complex32> {
    // Dropping the first sample caps the correlation at sqrt(15/16) ~ 0.968
    let mut burst = engine.reference().taps().to_vec();
    burst[0] = Complex32::new(0.0, 0.0);
    burst
}

#[test]
fn test_threshold_change_is_not_retroactive() {
    let config = CorrEstConfig::new(qpsk(), 4.0, 0).with_threshold(0.99);
    let mut engine = CorrEst::new(config).unwrap();
    let stream = place_bursts(100, &weakened_burst(&engine), &[40]);

    assert!(run_in_blocks(&mut engine, 0, &stream, 100).is_empty());
    engine.set_threshold(0.9).unwrap();
    assert!(run_in_blocks(&mut engine, 100, &zeros(50), 50).is_empty());
}

#[test]
fn test_threshold_change_applies_from_next_sample() {
    let config = CorrEstConfig::new(qpsk(), 4.0, 0).with_threshold(0.99);
    let mut engine = CorrEst::new(config).unwrap();
    let stream = place_bursts(100, &weakened_burst(&engine), &[40]);

    // Peak lands at index 55, the first sample of the second block
    assert!(engine.process(0, &stream[..55]).unwrap().tags.is_empty());
    engine.set_threshold(0.9).unwrap();
    let found = detections(&engine.process(55, &stream[55..]).unwrap().tags);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].start, 40);
    assert!((found[0].strength - (15.0f32 / 16.0).sqrt()).abs() < 1e-4);
}

#[test]
fn test_invalid_threshold_keeps_previous() {
    let mut engine = CorrEst::new(CorrEstConfig::new(qpsk(), 4.0, 0)).unwrap();
    for bad in [0.0, -0.5, 1.01, f32::NAN] {
        let err = engine.set_threshold(bad).unwrap_err();
        assert!(matches!(err, CorrEstError::InvalidConfiguration { .. }));
    }
    assert_eq!(engine.threshold(), corr_est::DEFAULT_THRESHOLD);
}

#[test]
fn test_new_symbols_take_effect_between_blocks() {
    let other = vec![
        Complex32::new(1.0, 0.0),
        Complex32::new(1.0, 0.0),
        Complex32::new(-1.0, 0.0),
        Complex32::new(-1.0, 0.0),
    ];
    let mut engine = CorrEst::new(CorrEstConfig::new(qpsk(), 4.0, 0)).unwrap();
    let word_a = engine.reference().taps().to_vec();
    let word_b = corr_est::ReferenceWaveform::build(&other, 4.0).unwrap().taps().to_vec();

    let mut stream = place_bursts(400, &word_a, &[50, 250]);
    corr_est::simulation::mix_burst(&mut stream, &word_b, 150);

    let before = detections(&engine.process(0, &stream[..100]).unwrap().tags);
    assert_eq!(before.iter().map(|d| d.start).collect::<Vec<_>>(), vec![50]);

    engine.set_symbols(other.clone()).unwrap();
    assert_eq!(engine.symbols(), other.as_slice());
    let after = detections(&engine.process(100, &stream[100..]).unwrap().tags);
    assert_eq!(after.iter().map(|d| d.start).collect::<Vec<_>>(), vec![150]);
}

#[test]
fn test_rate_change_resizes_reference() {
    let mut engine = CorrEst::new(CorrEstConfig::new(qpsk(), 4.0, 0)).unwrap();
    assert!(engine.process(0, &zeros(50)).unwrap().tags.is_empty());

    engine.set_samples_per_symbol(8.0).unwrap();
    assert_eq!(engine.reference().len(), 32);
    let stream = place_bursts(150, engine.reference().taps(), &[10]);

    let found = detections(&engine.process(50, &stream).unwrap().tags);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].start, 60);
}

#[test]
fn test_growing_reference_ignores_padded_history() {
    let symbols = qpsk();
    let long = corr_est::ReferenceWaveform::build(&symbols, 8.0).unwrap().taps().to_vec();
    let mut engine = CorrEst::new(CorrEstConfig::new(symbols, 4.0, 0)).unwrap();

    // Real samples fill the short history: garbage, then the first half of the long word
    let mut head = vec![Complex32::new(10.0, -10.0); 84];
    head.extend_from_slice(&long[1..17]);
    assert!(engine.process(0, &head).unwrap().tags.is_empty());

    // History grows from 16 to 32 samples; only indices 84.. are really held
    engine.set_samples_per_symbol(8.0).unwrap();
    let mut tail = long[17..].to_vec();
    tail.extend(zeros(40));
    tail.extend_from_slice(&long);
    tail.extend(zeros(40));

    let found = detections(&run_in_blocks(&mut engine, 100, &tail, 32));
    let starts: Vec<u64> = found.iter().map(|d| d.start).collect();
    assert_eq!(starts, vec![155]);
    assert!(found.iter().all(|d| d.start >= 84));
}

#[test]
fn test_invalid_symbols_keep_previous_reference() {
    let mut engine = CorrEst::new(CorrEstConfig::new(qpsk(), 4.0, 0)).unwrap();
    let taps = engine.reference().taps().to_vec();

    assert!(engine.set_symbols(Vec::new()).is_err());
    assert!(engine.set_symbols(vec![Complex32::new(0.0, 0.0); 4]).is_err());
    assert!(engine.set_samples_per_symbol(0.25).is_err());
    assert!(engine.set_pulse_shape(PulseShape::Gaussian { bt: 0.0 }).is_err());

    assert_eq!(engine.reference().taps(), taps.as_slice());
    let stream = place_bursts(60, &taps, &[10]);
    assert_eq!(detections(&engine.process(0, &stream).unwrap().tags).len(), 1);
}

#[test]
fn test_mark_delay_change_and_clamp() {
    let mut engine = CorrEst::new(CorrEstConfig::new(qpsk(), 4.0, 2)).unwrap();
    let taps = engine.reference().taps().to_vec();
    let stream = place_bursts(100, &taps, &[10, 60]);

    let first = detections(&engine.process(0, &stream[..50]).unwrap().tags);
    assert_eq!(first[0].mark, 12);

    // Past the end of the window the tags stay on its last sample
    engine.set_mark_delay(100);
    assert_eq!(engine.mark_delay(), 100);
    let second = detections(&engine.process(50, &stream[50..]).unwrap().tags);
    assert_eq!(second[0].start, 60);
    assert_eq!(second[0].mark, 75);
}

#[test]
fn test_gaussian_pulse_reference_detects_itself() {
    let config = CorrEstConfig::new(qpsk(), 8.0, 0).with_pulse_shape(PulseShape::Gaussian { bt: 0.5 });
    let mut engine = CorrEst::new(config).unwrap();
    let stream = place_bursts(200, engine.reference().taps(), &[70]);

    let found = detections(&run_in_blocks(&mut engine, 0, &stream, 33));
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].start, 70);
    assert!((found[0].strength - 1.0).abs() < 1e-4);
}
