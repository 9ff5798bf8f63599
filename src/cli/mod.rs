pub mod import;
pub mod init;
pub mod inspect;
pub mod records;
pub mod status;

use std::path::Path;

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};

use crate::error::FinsiftError;
use crate::importer::columns::ColumnType;
use crate::importer::validate::RecordShape;
use crate::importer::{parse_bytes, ParseOptions, ParsedDataset};
use crate::settings::Settings;

/// File bytes plus the dataset parsed from them.
pub(crate) struct LoadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
    pub dataset: ParsedDataset,
}

/// Reads and parses `file`, refusing files over the configured size limit.
pub(crate) fn load_file(file: &str, settings: &Settings, options: &ParseOptions) -> anyhow::Result<LoadedFile> {
    let path = Path::new(file);
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(file)
        .to_string();

    let size = std::fs::metadata(path)
        .with_context(|| format!("cannot read {file}"))?
        .len();
    let limit = settings.max_file_bytes();
    if size > limit {
        return Err(FinsiftError::FileTooLarge { size, limit }.into());
    }

    let bytes = std::fs::read(path).with_context(|| format!("cannot read {file}"))?;
    let dataset = parse_bytes(&name, &bytes, options).with_context(|| format!("cannot import {name}"))?;
    Ok(LoadedFile { name, bytes, dataset })
}

/// Parses a `--map` override of the form `IDX=TYPE`, e.g. `0=date`.
pub(crate) fn parse_override(raw: &str) -> anyhow::Result<(usize, ColumnType)> {
    let (index, tag) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("expected IDX=TYPE, got `{raw}`"))?;
    let index: usize = index
        .trim()
        .parse()
        .with_context(|| format!("column index `{}` is not a number", index.trim()))?;
    let column_type: ColumnType = tag.trim().parse()?;
    Ok((index, column_type))
}

#[derive(Parser)]
#[command(
    name = "finsift",
    version,
    about = "Import bank statements, financial statements and simple ledgers from CSV or spreadsheets."
)]
pub struct Cli {
    /// Log pipeline decisions to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write settings and create the record database.
    Init {
        /// Path for finsift data (default: ~/Documents/finsift)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Show detected column types, suggestions, confidence and layout.
    Inspect {
        /// Path to a .csv, .xlsx or .xls file
        file: String,
        /// Print JSON instead of tables
        #[arg(long)]
        json: bool,
    },
    /// Parse and validate a file, optionally committing valid rows.
    Import {
        /// Path to a .csv, .xlsx or .xls file
        file: String,
        /// Override a detected column type, e.g. `--map 0=date` (repeatable)
        #[arg(long = "map", value_name = "IDX=TYPE")]
        overrides: Vec<String>,
        /// Record shape to validate against (default from settings)
        #[arg(long, value_enum)]
        shape: Option<RecordShape>,
        /// Year assumed for month columns without one
        #[arg(long)]
        year: Option<i32>,
        /// Print JSON instead of tables
        #[arg(long)]
        json: bool,
        /// Store valid rows in the record database
        #[arg(long)]
        commit: bool,
    },
    /// Work with stored records.
    Records {
        #[command(subcommand)]
        command: RecordsCommands,
    },
    /// Show settings, database location and record counts.
    Status,
}

#[derive(Subcommand)]
pub enum RecordsCommands {
    /// List stored records.
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Delete a record by ID.
    Delete {
        /// Record ID (shown in `finsift records list`)
        id: i64,
    },
}
