use anyhow::{Context, Result};
use colored::Colorize;
use comfy_table::{Cell, Table};
use serde::Serialize;
use tracing::warn;

use crate::cli::{load_file, parse_override};
use crate::db::{commit_import, find_import, CommitSummary, SqliteStore};
use crate::fmt::{clip, confidence};
use crate::importer::format::FileFormat;
use crate::importer::validate::{validate_dataset, RecordShape, ValidationReport};
use crate::importer::{remap, ParseOptions};
use crate::models::{Field, NormalizedRow};
use crate::records::NewRecord;
use crate::settings::Settings;

#[derive(Serialize)]
struct ImportOutput<'a> {
    file: &'a str,
    format: FileFormat,
    confidence: Option<u8>,
    shape: RecordShape,
    headers: &'a [Field],
    rows: &'a [NormalizedRow],
    validation: &'a ValidationReport,
    committed: Option<CommitSummary>,
}

pub struct ImportArgs {
    pub file: String,
    pub overrides: Vec<String>,
    pub shape: Option<RecordShape>,
    pub year: Option<i32>,
    pub json: bool,
    pub commit: bool,
}

pub fn run(args: ImportArgs) -> Result<()> {
    let settings = Settings::load();
    let options = ParseOptions {
        anchor_year: args.year.unwrap_or_else(|| settings.anchor_year()),
    };
    let shape = args.shape.unwrap_or(settings.default_shape);

    let mut loaded = load_file(&args.file, &settings, &options)?;
    for raw in &args.overrides {
        let (index, column_type) = parse_override(raw).with_context(|| format!("invalid --map `{raw}`"))?;
        loaded.dataset = remap(&loaded.dataset, index, column_type, &options)?;
    }
    let dataset = &loaded.dataset;
    if dataset.format == FileFormat::Unknown {
        warn!(file = %loaded.name, "layout not recognized");
    }

    let report = validate_dataset(dataset, shape);

    let committed = if args.commit {
        let records: Vec<NewRecord> = report
            .valid
            .iter()
            .filter_map(|v| {
                NewRecord::from_row(&dataset.rows[v.index], v.result.inferred_type, &loaded.name)
            })
            .collect();
        let db_path = settings.db_path();
        let mut store = SqliteStore::open(&db_path)
            .with_context(|| format!("opening {}", db_path.display()))?;
        Some(commit_import(&mut store, &loaded.name, &loaded.bytes, dataset.format.key(), &records)?)
    } else {
        None
    };

    if args.json {
        let output = ImportOutput {
            file: &loaded.name,
            format: dataset.format,
            confidence: dataset.confidence_percent,
            shape,
            headers: &dataset.headers,
            rows: &dataset.rows,
            validation: &report,
            committed,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{}", loaded.name.bold());
    print!("Format: {}", dataset.format);
    if let Some(percent) = dataset.confidence_percent {
        print!("  Confidence: {}", confidence(percent));
    }
    println!("  Shape: {}", shape.key());

    if dataset.format == FileFormat::Unknown {
        println!(
            "{}",
            "Layout not recognized; rows below use the detected columns as-is. \
             Try `--map IDX=TYPE` to assign columns."
                .yellow()
        );
    }

    if !report.valid.is_empty() {
        let mut table = Table::new();
        table.set_header(vec!["Line", "Type", "Date", "Name", "Amount", "Category", "Frequency"]);
        for verdict in &report.valid {
            let row = &dataset.rows[verdict.index];
            let kind = row
                .text(Field::Type)
                .or_else(|| verdict.result.inferred_type.map(|k| k.label().to_string()))
                .unwrap_or_default();
            table.add_row(vec![
                Cell::new(verdict.line),
                Cell::new(kind),
                Cell::new(row.text(Field::Date).unwrap_or_default()),
                Cell::new(clip(&row.text(Field::Name).unwrap_or_default(), 40)),
                Cell::new(row.text(Field::Amount).unwrap_or_default()),
                Cell::new(row.text(Field::Category).unwrap_or_default()),
                Cell::new(row.text(Field::Frequency).unwrap_or_default()),
            ]);
        }
        println!("{}\n{table}", "Valid rows".green().bold());
    }

    if !report.invalid.is_empty() {
        let mut table = Table::new();
        table.set_header(vec!["Line", "Problems"]);
        for verdict in &report.invalid {
            table.add_row(vec![
                Cell::new(verdict.line),
                Cell::new(verdict.result.errors.join("\n")),
            ]);
        }
        println!("{}\n{table}", "Invalid rows".red().bold());
    }

    println!("{} valid, {} invalid", report.valid.len(), report.invalid.len());
    if let Some(summary) = committed {
        println!("Committed {} records (import #{})", summary.inserted, summary.import_id);
    } else if let Some(previous) = previous_import(&settings, &loaded.bytes)? {
        println!("{}", format!("Already imported as {previous}.").yellow());
    } else if !report.valid.is_empty() {
        println!("Run again with --commit to store the valid rows.");
    }
    Ok(())
}

fn previous_import(settings: &Settings, bytes: &[u8]) -> Result<Option<String>> {
    let db_path = settings.db_path();
    if !db_path.exists() {
        return Ok(None);
    }
    let store = SqliteStore::open(&db_path)?;
    Ok(find_import(&store, bytes)?)
}
