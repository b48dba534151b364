//! Sync-Word Detector
//!
//! Streams an I/Q WAV file through the correlation estimator in fixed-size
//! blocks and prints every tag, one per line.
//!
//! **Usage**:
//! ```bash
//! cargo run --bin corrdetect -- [OPTIONS] input.wav
//! ```
//!
//! Options:
//!   -r, --sps <n>           Samples per symbol (default: 8)
//!   -t, --threshold <x>     Detection threshold in (0, 1] (default: 0.9)
//!   -d, --mark-delay <n>    Tag offset from the correlation start (default: 0)
//!   -b, --block <n>         Block size in samples (default: 4096)
//!       --pulse <shape>     rect, halfsine or gauss:<bt> (default: rect)
//!
//! The sync word is Barker-13, as written by `corrsim`.

use corr_est::reference::{bpsk_symbols, BARKER_13};
use corr_est::{tracing_init, wav, CorrEst, CorrEstConfig, PulseShape, DEFAULT_THRESHOLD};

struct DetectConfig {
    input_path: String,
    samples_per_symbol: f32,
    threshold: f32,
    mark_delay: u32,
    block_size: usize,
    pulse: PulseShape,
}

fn parse_pulse(raw: &str) -> Result<PulseShape, String> {
    match raw {
        "rect" => Ok(PulseShape::Rectangular),
        "halfsine" => Ok(PulseShape::HalfSine),
        _ => {
            let bt = raw
                .strip_prefix("gauss:")
                .and_then(|bt| bt.parse().ok())
                .ok_or_else(|| format!("Invalid pulse shape: {}", raw))?;
            Ok(PulseShape::Gaussian { bt })
        }
    }
}

fn parse_value<T: std::str::FromStr>(args: &[String], i: &mut usize, name: &str) -> Result<T, String> {
    *i += 1;
    let raw = args.get(*i).ok_or_else(|| format!("Missing value for {}", name))?;
    raw.parse().map_err(|_| format!("Invalid value for {}: {}", name, raw))
}

impl DetectConfig {
    fn parse_args() -> Result<Self, String> {
        let args: Vec<String> = std::env::args().collect();

        let mut config = DetectConfig {
            input_path: String::new(),
            samples_per_symbol: 8.0,
            threshold: DEFAULT_THRESHOLD,
            mark_delay: 0,
            block_size: 4096,
            pulse: PulseShape::Rectangular,
        };
        let mut input_path = None;

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "-r" | "--sps" => config.samples_per_symbol = parse_value(&args, &mut i, "--sps")?,
                "-t" | "--threshold" => config.threshold = parse_value(&args, &mut i, "--threshold")?,
                "-d" | "--mark-delay" => config.mark_delay = parse_value(&args, &mut i, "--mark-delay")?,
                "-b" | "--block" => config.block_size = parse_value(&args, &mut i, "--block")?,
                "--pulse" => {
                    let raw: String = parse_value(&args, &mut i, "--pulse")?;
                    config.pulse = parse_pulse(&raw)?;
                }
                arg if !arg.starts_with('-') => {
                    if input_path.is_some() {
                        return Err(format!("Unexpected argument: {}", arg));
                    }
                    input_path = Some(arg.to_string());
                }
                arg => return Err(format!("Unknown option: {}", arg)),
            }
            i += 1;
        }

        if config.block_size == 0 {
            return Err("Block size must be at least 1".to_string());
        }
        config.input_path = input_path.ok_or("Missing input file argument")?;
        Ok(config)
    }
}

fn run(config: &DetectConfig) -> corr_est::Result<usize> {
    let recording = wav::read_iq_wav(&config.input_path)?;
    println!(
        "Read {} samples at {} Hz from {}",
        recording.samples.len(),
        recording.sample_rate,
        config.input_path
    );

    let engine_config = CorrEstConfig::new(bpsk_symbols(&BARKER_13), config.samples_per_symbol, config.mark_delay)
        .with_threshold(config.threshold)
        .with_pulse_shape(config.pulse);
    let mut engine = CorrEst::new(engine_config)?;
    println!("Reference: {} samples, threshold {:.2}", engine.reference().len(), engine.threshold());
    println!();

    let mut detections = 0;
    let mut start = 0u64;
    for block in recording.samples.chunks(config.block_size) {
        let processed = engine.process(start, block)?;
        for tag in &processed.tags {
            println!("  {}", tag);
        }
        detections += processed.tags.iter().filter(|t| t.key == corr_est::TagKey::CorrStart).count();
        start += processed.consumed as u64;
    }

    Ok(detections)
}

fn main() {
    tracing_init::init_tracing();

    let config = match DetectConfig::parse_args() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!();
            eprintln!("Usage: corrdetect [-r sps] [-t threshold] [-d mark_delay] [-b block] [--pulse shape] <input.wav>");
            std::process::exit(1);
        }
    };

    match run(&config) {
        Ok(0) => println!("No sync words detected."),
        Ok(n) => {
            println!();
            println!("Detected {} sync word(s)", n);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
