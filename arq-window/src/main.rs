//! Entry point for `arq-window`.
//!
//! Parses CLI arguments into a [`SimulatorConfig`], runs one simulation, and
//! prints the counters.  All protocol work is delegated to the library;
//! `main.rs` owns only process setup (logging, argument parsing).

use anyhow::{Context, Result};
use clap::Parser;

use arq_window::SimulatorConfig;
use arq_window::Simulation;

/// Sliding-window ARQ over a simulated lossy channel.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Number of messages the sending application generates.
    #[arg(short, long, default_value_t = 20)]
    messages: usize,

    /// Probability that the channel drops a packet.
    #[arg(short, long, default_value_t = 0.0)]
    loss: f64,

    /// Probability that the channel corrupts a packet.
    #[arg(short, long, default_value_t = 0.0)]
    corrupt: f64,

    /// Mean time between messages from the sending application.
    #[arg(short, long, default_value_t = 10.0)]
    interarrival: f64,

    /// Seed for the channel and message generator.
    #[arg(short, long, default_value_t = 1234)]
    seed: u64,

    /// Stop processing events scheduled after this time.
    #[arg(short, long, default_value_t = 1_000_000.0)]
    time_limit: f64,

    /// Increase log verbosity (-v debug, -vv trace).  RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn config(&self) -> SimulatorConfig {
        SimulatorConfig {
            messages: self.messages,
            loss_prob: self.loss,
            corrupt_prob: self.corrupt,
            mean_interarrival: self.interarrival,
            seed: self.seed,
            time_limit: self.time_limit,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let sim = Simulation::new(cli.config()).context("invalid simulation parameters")?;
    let report = sim.run();

    println!("{}", report.counters);
    println!("simulated time:            {:.3}", report.end_time);
    report.verify().context("delivery check failed")?;
    println!(
        "all {} accepted message(s) delivered in order",
        report.accepted.len()
    );
    Ok(())
}
