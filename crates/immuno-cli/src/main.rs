//! `immuno`: offline tools for inventory and history exports.
//!
//! # Usage
//!
//! ```text
//! immuno schedule --entry stock.json --history patient-42.json --on 2026-10-14
//! immuno schedule --entry catalog.json --stock 12 --history patient-42.json
//! immuno parse-catalog catalog.json
//! ```

mod preview;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use immuno_core::{catalog::StockId, schedule::today};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "immuno", about = "Offline dose scheduler for immunization exports")]
struct Args {
  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Derive the next dose and follow-up for one catalog entry.
  Schedule {
    /// Catalog JSON: one entry, or an array of entries.
    #[arg(long, value_name = "FILE")]
    entry: PathBuf,

    /// Patient history JSON (array of dose records). Omit for a new patient.
    #[arg(long, value_name = "FILE")]
    history: Option<PathBuf>,

    /// Stock id to pick when the catalog file holds several entries.
    #[arg(long)]
    stock: Option<i64>,

    /// Reference date (YYYY-MM-DD). Defaults to today (UTC).
    #[arg(long)]
    on: Option<NaiveDate>,
  },

  /// Validate a catalog file and print the typed entries.
  ParseCatalog {
    #[arg(value_name = "FILE")]
    file: PathBuf,
  },
}

// ─── Entry point ──────────────────────────────────────────────────────────────

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  match Args::parse().command {
    Command::Schedule { entry, history, stock, on } => {
      let catalog = preview::load_catalog(&read(&entry)?)?;
      let selected = preview::select_entry(&catalog, stock.map(StockId))?;
      let history = match history {
        Some(path) => preview::load_history(&read(&path)?)?,
        None => Vec::new(),
      };
      let reference = on.unwrap_or_else(today);

      let result = preview::preview(selected, &history, reference);
      if let Some(warning) = &result.warning {
        eprintln!("warning: {warning}");
      }
      println!("{}", serde_json::to_string_pretty(&result)?);
    }
    Command::ParseCatalog { file } => {
      let catalog = preview::load_catalog(&read(&file)?)?;
      tracing::info!(entries = catalog.len(), "catalog parsed");
      println!("{}", serde_json::to_string_pretty(&catalog)?);
    }
  }

  Ok(())
}

fn read(path: &Path) -> Result<String> {
  std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}
