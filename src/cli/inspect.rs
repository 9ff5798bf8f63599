use anyhow::Result;
use colored::Colorize;
use comfy_table::{Cell, Table};
use serde::Serialize;

use crate::cli::load_file;
use crate::fmt::confidence;
use crate::importer::columns::DetectedColumns;
use crate::importer::format::FileFormat;
use crate::importer::ParseOptions;
use crate::settings::Settings;

#[derive(Serialize)]
struct InspectOutput<'a> {
    file: &'a str,
    headers: &'a [String],
    format: FileFormat,
    detected: Option<&'a DetectedColumns>,
}

pub fn run(file: &str, json: bool) -> Result<()> {
    let settings = Settings::load();
    let options = ParseOptions {
        anchor_year: settings.anchor_year(),
    };
    let loaded = load_file(file, &settings, &options)?;
    let dataset = &loaded.dataset;
    let headers = dataset.raw_grid.headers();

    if json {
        let output = InspectOutput {
            file: &loaded.name,
            headers,
            format: dataset.format,
            detected: dataset.detected_columns.as_ref(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["#", "Header", "Type", "Suggestions"]);
    if let Some(detected) = &dataset.detected_columns {
        for (index, header) in headers.iter().enumerate() {
            let column_type = detected.mapping.get(&index).map(|t| t.as_str()).unwrap_or("ignore");
            let suggestions = detected
                .suggestions
                .get(&index)
                .map(|s| s.iter().map(|t| t.as_str()).collect::<Vec<_>>().join(", "))
                .unwrap_or_default();
            table.add_row(vec![
                Cell::new(index),
                Cell::new(header),
                Cell::new(column_type),
                Cell::new(suggestions),
            ]);
        }
    }

    println!("{}\n{table}", loaded.name.bold());
    println!("Format:      {}", dataset.format);
    if let Some(percent) = dataset.confidence_percent {
        println!("Confidence:  {}", confidence(percent));
    }
    println!("Rows:        {}", dataset.rows.len());
    if dataset.format == FileFormat::Unknown {
        println!(
            "{}",
            "Layout not recognized. Use `finsift import --map IDX=TYPE` to assign columns.".yellow()
        );
    }
    Ok(())
}
