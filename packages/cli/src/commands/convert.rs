use anyhow::{anyhow, Context, Result};
use clap::{Args, ValueEnum};
use colored::Colorize;
use raqam_dom::{document_to_html, Document, NodeSnapshot};
use raqam_engine::{Activation, Bootstrapper, ConversionStats, EngineConfig};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Args)]
pub struct ConvertArgs {
    /// Document snapshot (JSON) to convert
    pub input: PathBuf,

    /// Write the result here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Config file (defaults to raqam.config.json in the current directory)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Html,
}

pub fn convert(args: ConvertArgs, cwd: &Path) -> Result<()> {
    let config = match &args.config {
        Some(path) => EngineConfig::from_file(cwd.join(path))?,
        None => EngineConfig::load(cwd)?,
    };

    let input = cwd.join(&args.input);
    let source = fs::read_to_string(&input)
        .with_context(|| format!("Failed to read {}", input.display()))?;

    let (rendered, stats) = convert_source(&source, &config, args.format)?;

    match &args.output {
        Some(path) => {
            let output = cwd.join(path);
            fs::write(&output, rendered)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!(
                "  {} {} → {} ({} of {} text nodes converted)",
                "✓".green(),
                args.input.display(),
                path.display(),
                stats.converted,
                stats.visited
            );
        }
        None => println!("{rendered}"),
    }

    Ok(())
}

/// Parse a snapshot, run one static pass and render the result
pub fn convert_source(
    source: &str,
    config: &EngineConfig,
    format: OutputFormat,
) -> Result<(String, ConversionStats)> {
    let snapshot: NodeSnapshot =
        serde_json::from_str(source).context("Input is not a valid document snapshot")?;
    let mut doc = Document::from_snapshot(&snapshot)?;

    let mut engine = Bootstrapper::new(config, None);
    let stats = match engine.start(&mut doc) {
        Activation::Static(stats) | Activation::Live(stats) => stats,
        Activation::Deferred => return Err(anyhow!("Document never finished loading")),
    };
    info!(visited = stats.visited, converted = stats.converted, "Snapshot converted");

    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(&doc.snapshot())?,
        OutputFormat::Html => document_to_html(&doc),
    };
    Ok((rendered, stats))
}
