use clap::Parser;
use procrsr::config::RsrConfig;
use procrsr::process_track_file;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

pub type BinResult<T, E = Box<dyn std::error::Error + Send + Sync>> = Result<T, E>;

fn main() {
    if let Err(e) = bin_main() {
        eprintln!("error: {e}");
        if let Some(e) = e.source() {
            eprintln!("error: {e}");
        }
        std::process::exit(1);
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Track file to process
    #[arg()]
    infile: PathBuf,

    /// Number of consecutive bins in a computing window
    #[arg(short = 'w', long, default_value_t = 1000)]
    winsize: usize,

    /// Number of bins between each computing window
    #[arg(short = 's', long, default_value_t = 250)]
    sampling: usize,

    /// Number of simultaneous cores to use
    #[arg(short = 'n', long, default_value_t = 8)]
    nbcores: usize,

    /// Calibrated system gain in dB
    #[arg(long, default_value_t = -30.0, allow_negative_numbers = true)]
    gain: f64,

    /// Round-trip attenuation rate in dB/km
    #[arg(long, default_value_t = -10.0, allow_negative_numbers = true)]
    att_rate: f64,
}

fn bin_main() -> BinResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let args = Args::parse();

    let cfg = RsrConfig {
        window_size: args.winsize,
        stride: args.sampling,
        workers: args.nbcores,
        gain_db: args.gain,
        attenuation_rate: args.att_rate,
        ..RsrConfig::default()
    };

    let outfile = process_track_file(&args.infile, &cfg)?;
    println!("CREATED: {}", outfile.display());
    Ok(())
}
