use std::fs;
use std::io::{self, Read};

use anyhow::Context;
use clap::{Parser, ValueEnum};

use contigsim::{Simulator, Workload};

#[derive(Parser)]
#[command(
    name = "contigsim",
    version,
    about = "Simulates contiguous memory allocation with round-robin scheduling"
)]
struct Args {
    /// Workload file, or '-' to read from stdin.
    #[arg(default_value = "-")]
    input: String,

    /// Input format.
    #[arg(long, value_enum, default_value = "text")]
    format: Format,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    /// Whitespace-separated integers.
    Text,
    /// A JSON workload document.
    Json,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let input = read_input(&args.input)?;
    let workload = match args.format {
        Format::Text => Workload::from_text(&input),
        Format::Json => Workload::from_json(&input),
    }
    .with_context(|| format!("failed to parse workload from {}", args.input))?;

    let stdout = io::stdout();
    let mut simulator = Simulator::new(workload, stdout.lock());
    simulator.run().context("failed to write trace")?;

    Ok(())
}

fn read_input(path: &str) -> anyhow::Result<String> {
    if path == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("failed to read stdin")?;
        Ok(buffer)
    } else {
        fs::read_to_string(path).with_context(|| format!("failed to read {path}"))
    }
}
