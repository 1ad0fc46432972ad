mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{convert, init, text, ConvertArgs, InitArgs, TextArgs};
use tracing_subscriber::EnvFilter;

/// Raqam CLI - Persian digits for documents and text
#[derive(Parser, Debug)]
#[command(name = "raqam")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a default raqam.config.json
    Init(InitArgs),

    /// Convert a JSON document snapshot
    Convert(ConvertArgs),

    /// Convert strings given on the command line
    Text(TextArgs),
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("RAQAM_LOG")
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let cwd = std::env::current_dir()?;

    match cli.command {
        Command::Init(args) => init(args, &cwd),
        Command::Convert(args) => convert(args, &cwd),
        Command::Text(args) => text(args),
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli) {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
