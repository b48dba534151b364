//! End-to-end: simulated bursts written to an I/Q WAV file, read back and detected

use corr_est::{simulation, wav, CorrEst, CorrEstConfig};

#[path = "../test_utils.rs"]
mod test_utils;
use test_utils::{barker, detections, place_bursts, run_in_blocks};

#[test]
fn test_detect_from_iq_wav() {
    let config = CorrEstConfig::new(barker(), 4.0, 0);
    let mut engine = CorrEst::new(config).unwrap();

    let mut burst = engine.reference().taps().to_vec();
    simulation::scale(&mut burst, 0.25);
    simulation::rotate(&mut burst, -1.2);
    let mut samples = place_bursts(4000, &burst, &[1000, 3000]);
    simulation::add_awgn(&mut samples, simulation::mean_power(&burst), 20.0, 5).unwrap();

    let path = std::env::temp_dir().join(format!("corr_est_iq_{}.wav", std::process::id()));
    wav::write_iq_wav(&path, &samples, 48_000).unwrap();
    let recording = wav::read_iq_wav(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(recording.sample_rate, 48_000);
    assert_eq!(recording.samples, samples);

    let found = detections(&run_in_blocks(&mut engine, 0, &recording.samples, 4096));
    let starts: Vec<u64> = found.iter().map(|d| d.start).collect();
    assert_eq!(starts, vec![1000, 3000]);
    assert!(found.iter().all(|d| test_utils::phase_error(d.phase, -1.2) < 0.1));
}
