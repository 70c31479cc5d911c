//! diffweave - semantic line-diff enrichment CLI
//!
//! Reads two files, runs the enrichment pipeline, and reports modified
//! pairs, moves, and slider corrections as a table; `--json` instead
//! emits the full `DiffResult` for downstream tooling.

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table};
use console::style;
use diffweave::config::ModeToggles;
use diffweave::types::Classification;
use diffweave::{Config, DefaultPrimitives, DiffPipeline, Primitives, RunOptions};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Semantic line-diff enrichment: modification pairing, block-move
/// detection, and slider-corrected alignment.
#[derive(Parser)]
#[command(name = "diffweave")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Old-side file
    old_path: PathBuf,

    /// New-side file
    new_path: PathBuf,

    /// Force a language tag instead of auto-detecting one
    #[arg(short, long)]
    language: Option<String>,

    /// Emit the full result as JSON instead of a summary table
    #[arg(long)]
    json: bool,

    /// Disable slider correction
    #[arg(long)]
    no_sliders: bool,

    /// Disable fast-mode degradation even for oversized inputs
    #[arg(long)]
    no_fast_mode: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let old_text = fs::read_to_string(&cli.old_path)
        .with_context(|| format!("reading {}", cli.old_path.display()))?;
    let new_text = fs::read_to_string(&cli.new_path)
        .with_context(|| format!("reading {}", cli.new_path.display()))?;

    let mut config = Config::default();
    if cli.no_sliders {
        config.correct_sliders = false;
    }
    if cli.no_fast_mode {
        config.enable_fast_mode = false;
    }

    let primitives = DefaultPrimitives;
    let filename_old = cli.old_path.to_str();
    let filename_new = cli.new_path.to_str();
    let language_owned;
    let language = match &cli.language {
        Some(l) => l.as_str(),
        None => {
            language_owned = primitives.detect_file_type(&old_text, filename_old.or(filename_new));
            language_owned
        }
    };

    let options = RunOptions {
        language,
        filename_old,
        filename_new,
        cancel: None,
        mode_toggles: ModeToggles::default(),
    };

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message("diffing...");
    spinner.enable_steady_tick(Duration::from_millis(80));

    let pipeline = DiffPipeline::new(&config);
    let result = pipeline
        .run(&old_text, &new_text, &primitives, &options)
        .context("running diff pipeline")?;

    spinner.finish_and_clear();

    if cli.json {
        let payload = serde_json::json!({
            "generated_at": Local::now().to_rfc3339(),
            "language": language,
            "result": result,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    print_summary(&result, language);
    Ok(())
}

fn print_summary(result: &diffweave::DiffResult, language: &str) {
    println!(
        "{} {} vs {} ({})",
        style("diffweave").bold().cyan(),
        style("old").dim(),
        style("new").dim(),
        language
    );

    if result.cancelled {
        println!("{}", style("cancelled before completion").yellow());
    }
    if result.limit_info.fast_mode {
        println!(
            "{} {:?}",
            style("fast mode engaged:").yellow(),
            result.limit_info.reason
        );
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec!["metric", "count"]);
    table.add_row(vec![Cell::new("added"), Cell::new(result.stats.added)]);
    table.add_row(vec![Cell::new("removed"), Cell::new(result.stats.removed)]);
    table.add_row(vec![
        Cell::new("modified").fg(Color::Yellow),
        Cell::new(result.stats.modified),
    ]);
    table.add_row(vec![
        Cell::new("moved").fg(Color::Blue),
        Cell::new(result.stats.moved),
    ]);
    table.add_row(vec![
        Cell::new("slider corrections"),
        Cell::new(result.stats.slider_corrections),
    ]);
    println!("{table}");

    for entry in &result.results {
        match entry.classification {
            Classification::Modified | Classification::MovedModified => {
                if let Some(m) = &entry.modified {
                    println!(
                        "{} {}",
                        style("~").yellow(),
                        style(format!("{:.2}", m.similarity)).dim()
                    );
                    println!("  {} {}", style("-").red(), m.removed_line);
                    println!("  {} {}", style("+").green(), m.added_line);
                }
            }
            Classification::Removed => {
                if let Some(v) = &entry.value {
                    println!("{} {}", style("-").red(), v);
                }
            }
            Classification::Added => {
                if let Some(v) = &entry.value {
                    println!("{} {}", style("+").green(), v);
                }
            }
            Classification::Moved => {
                if let Some(v) = &entry.value {
                    println!("{} {}", style("~move~").blue(), v);
                }
            }
            Classification::Unchanged => {}
        }
    }
}
