//! CLI for seedpool — a persisted, forward-secret CSPRNG.
//!
//! The seed file stands in for the EEPROM of an embedded deployment: the
//! 49-byte record at offset 0 survives process restarts, so repeated
//! invocations keep accumulating entropy the way a fielded device does
//! across power cycles.

use std::error::Error;
use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use seedpool_core::sources::{OsEntropySource, TimingJitterSource};
use seedpool_core::{FileStorage, Rng, SEED_SIZE};

#[derive(Parser)]
#[command(name = "seedpool")]
#[command(about = "seedpool — persisted, forward-secret random number generation")]
#[command(version = seedpool_core::VERSION)]
struct Cli {
    /// Seed record file (stands in for EEPROM).
    #[arg(long, global = true, default_value = "seedpool.seed")]
    seed_file: PathBuf,

    /// Application tag stirred into the pool at initialization.
    #[arg(long, global = true, default_value = concat!("seedpool-cli ", env!("CARGO_PKG_VERSION")))]
    tag: String,

    /// Also bridge the OS CSPRNG into the pool (saturates credits quickly).
    #[arg(long, global = true)]
    os_entropy: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate random bytes
    Gen {
        /// Number of bytes to generate
        #[arg(default_value_t = 32)]
        count: usize,

        /// Write raw bytes to stdout instead of hex
        #[arg(long)]
        raw: bool,

        /// Housekeeping passes to run before generating
        #[arg(long, default_value_t = 8)]
        warmup: usize,

        /// Fail instead of generating when entropy credits don't cover the request
        #[arg(long)]
        require_entropy: bool,
    },

    /// Poll noise sources and report pool status
    Status {
        /// Housekeeping passes to run before reporting
        #[arg(long, default_value_t = 8)]
        warmup: usize,
    },

    /// Stir a hex string into the pool (device serials, MAC addresses, ...)
    Stir {
        /// Hex-encoded bytes to mix in
        data: String,

        /// Entropy credit to claim for the data, in bits
        #[arg(long, default_value_t = 0)]
        credit: u16,
    },

    /// Erase the pool and overwrite the persisted seed record
    Destroy,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let storage = FileStorage::open(&cli.seed_file, u64::from(SEED_SIZE))?;
    let mut rng = Rng::new(Box::new(storage));
    rng.begin(&cli.tag, 0);
    rng.add_noise_source(Box::new(TimingJitterSource));
    if cli.os_entropy {
        rng.add_noise_source(Box::new(OsEntropySource));
    }

    match cli.command {
        Commands::Gen {
            count,
            raw,
            warmup,
            require_entropy,
        } => {
            for _ in 0..warmup {
                rng.loop_once();
            }
            if require_entropy && !rng.available(count) {
                return Err(format!(
                    "only {} bits of entropy credit for a {} byte request; \
                     stir in more noise or drop --require-entropy",
                    rng.credits(),
                    count
                )
                .into());
            }
            let mut out = vec![0u8; count];
            rng.rand(&mut out);
            if raw {
                std::io::stdout().write_all(&out)?;
            } else {
                println!("{}", to_hex(&out));
            }
        }

        Commands::Status { warmup } => {
            for _ in 0..warmup {
                rng.loop_once();
            }
            println!("seed file:     {}", cli.seed_file.display());
            println!("noise sources: {}", rng.source_count());
            println!("credits:       {} / 384 bits", rng.credits());
            for len in [16usize, 32, 48] {
                let mark = if rng.available(len) { "yes" } else { "no" };
                println!("covers {len:>2} bytes: {mark}");
            }
        }

        Commands::Stir { data, credit } => {
            let bytes = from_hex(&data)?;
            rng.stir(&bytes, credit);
            rng.save();
            println!(
                "stirred {} bytes, credits now {} bits",
                bytes.len(),
                rng.credits()
            );
        }

        Commands::Destroy => {
            rng.destroy();
            println!("pool destroyed, seed record erased");
        }
    }

    Ok(())
}

fn to_hex(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 2);
    for byte in data {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

fn from_hex(text: &str) -> Result<Vec<u8>, Box<dyn Error>> {
    let text: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if text.len() % 2 != 0 {
        return Err("hex input must have an even number of digits".into());
    }
    (0..text.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&text[i..i + 2], 16).map_err(Into::into))
        .collect()
}
