//! CLI tool for building PowerPoint files from JSON deck descriptions.

mod deck;

use anyhow::{Context, Result};
use clap::Parser;
use deck::DeckSpec;
use deckgen_pptx::PackageReader;
use std::path::{Path, PathBuf};

/// Build .pptx files from JSON deck descriptions.
#[derive(Parser, Debug)]
#[command(name = "deckgen")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input deck description(s) (.json)
    #[arg(required = true)]
    input: Vec<PathBuf>,

    /// Output directory (default: same as input file)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Re-open each written file and report its slides
    #[arg(short, long)]
    check: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let mut failures = 0;
    for input_path in &args.input {
        log::debug!("Processing: {}", input_path.display());

        match process_file(input_path, &args).await {
            Ok(written) => println!("{}", written),
            Err(e) => {
                eprintln!("Error processing {}: {:#}", input_path.display(), e);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} decks failed", failures, args.input.len());
    }
    Ok(())
}

/// Build and write a single deck.
async fn process_file(input_path: &Path, args: &Args) -> Result<String> {
    let json = tokio::fs::read_to_string(input_path)
        .await
        .with_context(|| format!("Failed to open {}", input_path.display()))?;
    let deck: DeckSpec = serde_json::from_str(&json)
        .with_context(|| format!("Invalid deck description in {}", input_path.display()))?;

    let presentation = deck.build().context("Failed to build presentation")?;
    log::debug!("Built {} slides", presentation.slides().len());

    let output_path = get_output_path(input_path, args.output.as_ref())?;
    log::debug!("Writing to {}", output_path.display());
    let written = presentation
        .write_file(&output_path.to_string_lossy())
        .await
        .with_context(|| format!("Failed to write {}", output_path.display()))?;

    if args.check {
        let bytes = tokio::fs::read(&written)
            .await
            .with_context(|| format!("Failed to re-open {}", written))?;
        let mut reader = PackageReader::open(bytes)?;
        for slide in reader.slide_paths()? {
            let shapes = reader.slide_text(&slide)?;
            eprintln!("  {}: {} shapes", slide, shapes.len());
        }
    }

    Ok(written)
}

/// Determine the output path for a deck.
fn get_output_path(input_path: &Path, output_dir: Option<&PathBuf>) -> Result<PathBuf> {
    let stem = input_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");

    let output_filename = format!("{}.pptx", stem);

    let output_path = match output_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
            dir.join(output_filename)
        }
        None => match input_path.parent() {
            Some(parent) => parent.join(output_filename),
            None => PathBuf::from(output_filename),
        },
    };

    Ok(output_path)
}
