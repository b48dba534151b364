//! I/Q Test Signal Simulator
//!
//! Writes a complex baseband WAV file containing Barker-13 sync-word bursts,
//! rotated by a carrier phase offset and buried in white Gaussian noise.
//!
//! Usage:
//!   cargo run --bin corrsim -- [OPTIONS] <output.wav>
//!
//! Options:
//!   -s, --snr <dB>        Burst SNR in dB (default: 10)
//!   -r, --sps <n>         Samples per symbol (default: 8)
//!   -p, --phase <rad>     Carrier phase offset (default: 0.5)
//!   -b, --bursts <n>      Number of bursts (default: 3)
//!   -l, --length <n>      Total samples (default: 20000)
//!   -n, --no-noise        Write clean bursts only
//!       --seed <n>        Noise seed (default: 1)
//!   -h, --help            Show this help message
//!
//! The absolute start index of each burst is printed so `corrdetect` output can
//! be checked against it.

use corr_est::reference::{bpsk_symbols, ReferenceWaveform, BARKER_13};
use corr_est::{simulation, tracing_init, wav, Complex32};

const SAMPLE_RATE: u32 = 48_000;

struct SimConfig {
    output_path: String,
    snr_db: f32,
    samples_per_symbol: f32,
    phase: f32,
    bursts: usize,
    length: usize,
    add_noise: bool,
    seed: u64,
}

fn parse_value<T: std::str::FromStr>(args: &[String], i: &mut usize, name: &str) -> Result<T, String> {
    *i += 1;
    let raw = args.get(*i).ok_or_else(|| format!("Missing value for {}", name))?;
    raw.parse().map_err(|_| format!("Invalid value for {}: {}", name, raw))
}

impl SimConfig {
    fn parse_args() -> Result<Self, String> {
        let args: Vec<String> = std::env::args().collect();

        let mut config = SimConfig {
            output_path: String::new(),
            snr_db: 10.0,
            samples_per_symbol: 8.0,
            phase: 0.5,
            bursts: 3,
            length: 20_000,
            add_noise: true,
            seed: 1,
        };
        let mut output_path = None;

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "-s" | "--snr" => config.snr_db = parse_value(&args, &mut i, "--snr")?,
                "-r" | "--sps" => config.samples_per_symbol = parse_value(&args, &mut i, "--sps")?,
                "-p" | "--phase" => config.phase = parse_value(&args, &mut i, "--phase")?,
                "-b" | "--bursts" => config.bursts = parse_value(&args, &mut i, "--bursts")?,
                "-l" | "--length" => config.length = parse_value(&args, &mut i, "--length")?,
                "--seed" => config.seed = parse_value(&args, &mut i, "--seed")?,
                "-n" | "--no-noise" => config.add_noise = false,
                "-h" | "--help" => {
                    print_help(&args[0]);
                    std::process::exit(0);
                }
                arg if !arg.starts_with('-') => {
                    if output_path.is_some() {
                        return Err(format!("Unexpected argument: {}", arg));
                    }
                    output_path = Some(arg.to_string());
                }
                arg => return Err(format!("Unknown option: {}", arg)),
            }
            i += 1;
        }

        config.output_path = output_path.ok_or("Missing output file argument")?;
        Ok(config)
    }
}

fn print_help(program: &str) {
    eprintln!("I/Q Test Signal Simulator");
    eprintln!();
    eprintln!("Usage: {} [OPTIONS] <output.wav>", program);
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -s, --snr <dB>      Burst SNR in dB (default: 10)");
    eprintln!("  -r, --sps <n>       Samples per symbol (default: 8)");
    eprintln!("  -p, --phase <rad>   Carrier phase offset (default: 0.5)");
    eprintln!("  -b, --bursts <n>    Number of bursts (default: 3)");
    eprintln!("  -l, --length <n>    Total samples (default: 20000)");
    eprintln!("  -n, --no-noise      Write clean bursts only");
    eprintln!("      --seed <n>      Noise seed (default: 1)");
}

fn run(config: &SimConfig) -> corr_est::Result<()> {
    let reference = ReferenceWaveform::build(&bpsk_symbols(&BARKER_13), config.samples_per_symbol)?;
    let mut burst = reference.taps().to_vec();
    simulation::rotate(&mut burst, config.phase);
    let burst_power = simulation::mean_power(&burst);

    let mut samples = vec![Complex32::new(0.0, 0.0); config.length];
    let spacing = config.length / (config.bursts + 1);

    println!("Sync word: Barker-13, {} samples", reference.len());
    println!("Burst starts:");
    for n in 1..=config.bursts {
        let start = n * spacing;
        let mixed = simulation::mix_burst(&mut samples, &burst, start);
        if mixed < burst.len() {
            println!("  {:8} (truncated to {} samples)", start, mixed);
        } else {
            println!("  {:8}", start);
        }
    }

    if config.add_noise {
        simulation::add_awgn(&mut samples, burst_power, config.snr_db, config.seed)?;
        println!("Noise: {:.1} dB SNR, seed {}", config.snr_db, config.seed);
    }

    wav::write_iq_wav(&config.output_path, &samples, SAMPLE_RATE)?;
    println!("Wrote {} samples to {}", samples.len(), config.output_path);
    Ok(())
}

fn main() {
    tracing_init::init_tracing();

    let config = match SimConfig::parse_args() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!();
            print_help("corrsim");
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&config) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
