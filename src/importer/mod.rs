//! Import pipeline: raw file to grid, grid to detected columns and layout,
//! then per-layout extraction into normalized rows.

pub mod columns;
pub mod extract;
pub mod format;
#[cfg(feature = "spreadsheet")]
pub mod sheet;
pub mod tokenize;
pub mod validate;
pub mod values;

use std::collections::BTreeSet;
use std::path::Path;

use chrono::Datelike;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{FinsiftError, Result};
use crate::models::{Field, Grid, NormalizedRow};
use columns::{detect_columns, ColumnType, DetectedColumns};
use format::{classify_format, FileFormat};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Year assumed for month headers that carry no year of their own.
    pub anchor_year: i32,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            anchor_year: chrono::Local::now().year(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParsedDataset {
    /// Canonical fields holding a non-blank value in at least one row, in
    /// canonical order.
    pub headers: Vec<Field>,
    pub rows: Vec<NormalizedRow>,
    pub raw_grid: Grid,
    pub format: FileFormat,
    pub detected_columns: Option<DetectedColumns>,
    pub confidence_percent: Option<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceKind {
    Text,
    Spreadsheet,
}

fn source_kind(file_name: &str) -> Result<SourceKind> {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "csv" => Ok(SourceKind::Text),
        "xlsx" | "xls" => Ok(SourceKind::Spreadsheet),
        _ => Err(FinsiftError::UnsupportedFormat(ext)),
    }
}

pub fn parse_path(path: &Path, options: &ParseOptions) -> Result<ParsedDataset> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    // Reject the extension before touching the file.
    source_kind(file_name)?;
    let bytes = std::fs::read(path)?;
    parse_bytes(file_name, &bytes, options)
}

/// Dispatches on the file name's extension. CSV bytes are decoded lossily
/// as UTF-8.
pub fn parse_bytes(file_name: &str, bytes: &[u8], options: &ParseOptions) -> Result<ParsedDataset> {
    match source_kind(file_name)? {
        SourceKind::Text => parse_text(&String::from_utf8_lossy(bytes), options),
        SourceKind::Spreadsheet => {
            let grid = read_spreadsheet(bytes)?;
            parse_grid(grid, options)
        }
    }
}

#[cfg(feature = "spreadsheet")]
fn read_spreadsheet(bytes: &[u8]) -> Result<Grid> {
    sheet::read_first_sheet(bytes)
}

#[cfg(not(feature = "spreadsheet"))]
fn read_spreadsheet(_bytes: &[u8]) -> Result<Grid> {
    Err(FinsiftError::SpreadsheetDisabled)
}

pub fn parse_text(text: &str, options: &ParseOptions) -> Result<ParsedDataset> {
    parse_grid(tokenize::text_to_grid(text), options)
}

pub fn parse_grid(grid: Grid, options: &ParseOptions) -> Result<ParsedDataset> {
    if grid.is_empty() {
        return Err(FinsiftError::EmptyInput);
    }
    debug!(rows = grid.rows.len(), columns = grid.headers().len(), "tokenized grid");
    let detected = detect_columns(grid.headers());
    info!(format = %detected.format, confidence = detected.confidence, "detected layout");
    Ok(build(grid, detected, options))
}

/// Applies a manual column override and re-runs extraction on the retained
/// grid. The layout is re-classified from the edited mapping; confidence and
/// suggestions stay as originally scored.
pub fn remap(
    dataset: &ParsedDataset,
    index: usize,
    column_type: ColumnType,
    options: &ParseOptions,
) -> Result<ParsedDataset> {
    let current = match &dataset.detected_columns {
        Some(detected) => detected.clone(),
        None => detect_columns(dataset.raw_grid.headers()),
    };
    let mut detected = current.override_column(index, column_type)?;
    detected.format = classify_format(&detected.mapping, dataset.raw_grid.headers());
    debug!(index, column = %column_type, format = %detected.format, "remapped column");
    Ok(build(dataset.raw_grid.clone(), detected, options))
}

fn build(grid: Grid, detected: DetectedColumns, options: &ParseOptions) -> ParsedDataset {
    let format = detected.format;
    let rows = extract::extract(format, &grid, &detected.mapping, options);
    debug!(rows = rows.len(), %format, "extracted rows");

    let populated: BTreeSet<Field> = rows
        .iter()
        .flat_map(|row| Field::ALL.iter().copied().filter(move |f| row.text(*f).is_some()))
        .collect();

    ParsedDataset {
        headers: populated.into_iter().collect(),
        rows,
        raw_grid: grid,
        format,
        confidence_percent: Some(detected.confidence),
        detected_columns: Some(detected),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(year: i32) -> ParseOptions {
        ParseOptions { anchor_year: year }
    }

    #[test]
    fn test_financial_statement_month_explosion() {
        let text = "Account Name,Jan 2025,Feb 2025,Mar 2025,Total\n\
                    Income\n\
                    \"Salary\",5000,5000,5000,15000\n";
        let dataset = parse_text(text, &opts(2025)).unwrap();
        assert_eq!(dataset.format, FileFormat::FinancialStatement);
        assert_eq!(dataset.rows.len(), 3);
        let amounts: Vec<_> = dataset
            .rows
            .iter()
            .map(|r| r.get(Field::Amount).unwrap().into_owned())
            .collect();
        assert_eq!(amounts, vec!["5000", "5000", "5000"]);
        assert_eq!(
            dataset.headers,
            vec![
                Field::Type,
                Field::Date,
                Field::Name,
                Field::Amount,
                Field::Category,
                Field::Frequency,
                Field::Status
            ]
        );
    }

    #[test]
    fn test_bank_statement_single_row() {
        let dataset =
            parse_text("Date,Description,Amount\n2025-11-15,\"Salary Deposit\",5000\n", &opts(2025))
                .unwrap();
        assert_eq!(dataset.format, FileFormat::BankStatement);
        assert_eq!(dataset.rows.len(), 1);
        assert_eq!(dataset.rows[0].get(Field::Name).as_deref(), Some("Salary Deposit"));
        assert_eq!(dataset.confidence_percent, Some(100));
    }

    #[test]
    fn test_spaced_quoted_description_keeps_columns_aligned() {
        let text = "Date, Description, Amount\n2025-11-15, \"Salary, Nov\", 5000\n";
        let dataset = parse_text(text, &opts(2025)).unwrap();
        assert_eq!(dataset.format, FileFormat::BankStatement);
        let row = &dataset.rows[0];
        assert_eq!(row.get(Field::Name).as_deref(), Some("Salary, Nov"));
        assert_eq!(row.get(Field::Amount).as_deref(), Some("5000"));
        assert_eq!(row.get(Field::Date).as_deref(), Some("2025-11-15"));
    }

    #[test]
    fn test_headers_skip_fields_that_are_always_blank() {
        let text = "Type,Name,Amount,Frequency,Category\n\
                    Income,Salary,5000,monthly,\n\
                    Expense,Rent,1500,monthly, \n";
        let dataset = parse_text(text, &opts(2025)).unwrap();
        assert_eq!(dataset.format, FileFormat::Simple);
        assert_eq!(
            dataset.headers,
            vec![Field::Type, Field::Name, Field::Amount, Field::Frequency]
        );
    }

    #[test]
    fn test_statement_zero_month_skipped() {
        let text = "Account,Jan 2025,Feb 2025,Total\nExpense\n\"Entertainment\",0,100,100\n";
        let dataset = parse_text(text, &opts(2025)).unwrap();
        assert_eq!(dataset.rows.len(), 1);
        assert_eq!(dataset.rows[0].get(Field::Date).as_deref(), Some("2025-02-01"));
    }

    #[test]
    fn test_transaction_date_memo_amount() {
        let dataset = parse_text("Transaction Date,Memo,Amount\n01/05/2025,Coffee,4.50\n", &opts(2025))
            .unwrap();
        let detected = dataset.detected_columns.as_ref().unwrap();
        assert_eq!(detected.mapping[&0], ColumnType::Date);
        assert_eq!(detected.mapping[&1], ColumnType::Description);
        assert_eq!(detected.mapping[&2], ColumnType::Amount);
        assert_eq!(dataset.format, FileFormat::BankStatement);
    }

    #[test]
    fn test_empty_input_is_rejected() {
        assert!(matches!(parse_text("", &opts(2025)), Err(FinsiftError::EmptyInput)));
        assert!(matches!(parse_text("\n ,, \n\n", &opts(2025)), Err(FinsiftError::EmptyInput)));
    }

    #[test]
    fn test_unsupported_extension() {
        let err = parse_bytes("ledger.txt", b"a,b\n1,2\n", &opts(2025)).unwrap_err();
        assert!(matches!(err, FinsiftError::UnsupportedFormat(ref ext) if ext == "txt"));
        assert!(matches!(
            parse_path(Path::new("/nonexistent/ledger.pdf"), &opts(2025)),
            Err(FinsiftError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_extension_match_ignores_case() {
        let dataset = parse_bytes("EXPORT.CSV", b"Date,Description,Amount\n2025-01-01,X,1\n", &opts(2025))
            .unwrap();
        assert_eq!(dataset.rows.len(), 1);
    }

    #[test]
    fn test_csv_bytes_with_bom() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(b"Date,Description,Amount\n2025-01-01,Rent,1200\n");
        let dataset = parse_bytes("bank.csv", &bytes, &opts(2025)).unwrap();
        assert_eq!(dataset.format, FileFormat::BankStatement);
    }

    #[test]
    fn test_parse_path_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("simple.csv");
        std::fs::write(&path, "Type,Name,Amount,Frequency\nIncome,Salary,5000,monthly\n").unwrap();
        let dataset = parse_path(&path, &opts(2025)).unwrap();
        assert_eq!(dataset.format, FileFormat::Simple);
        assert_eq!(dataset.rows[0].get(Field::Type).as_deref(), Some("Income"));
    }

    #[test]
    fn test_unknown_still_extracts_candidates() {
        let dataset = parse_text("Foo,Bar\nx,y\n", &opts(2025)).unwrap();
        assert_eq!(dataset.format, FileFormat::Unknown);
        assert_eq!(dataset.confidence_percent, Some(0));
        assert!(dataset.rows.is_empty());
        assert_eq!(dataset.raw_grid.rows.len(), 2);
    }

    #[test]
    fn test_remap_reclassifies_and_reextracts() {
        let dataset = parse_text("When,Memo,Amount\n2025-03-01,Lunch,12\n", &opts(2025)).unwrap();
        assert_ne!(dataset.format, FileFormat::BankStatement);
        let confidence = dataset.confidence_percent;

        let remapped = remap(&dataset, 0, ColumnType::Date, &opts(2025)).unwrap();
        assert_eq!(remapped.format, FileFormat::BankStatement);
        assert_eq!(remapped.confidence_percent, confidence);
        assert_eq!(remapped.rows[0].get(Field::Date).as_deref(), Some("2025-03-01"));
        assert_eq!(remapped.rows[0].get(Field::Frequency).as_deref(), Some("one-time"));
    }

    #[test]
    fn test_remap_out_of_range() {
        let dataset = parse_text("Date,Description,Amount\n2025-01-01,X,1\n", &opts(2025)).unwrap();
        assert!(matches!(
            remap(&dataset, 7, ColumnType::Ignore, &opts(2025)),
            Err(FinsiftError::ColumnOutOfRange { index: 7, len: 3 })
        ));
    }

    #[test]
    fn test_month_only_headers_use_anchor() {
        let text = "Account,Nov,Dec,Jan\nIncome\nRent,1,2,3\n";
        let dataset = parse_text(text, &opts(2024)).unwrap();
        let dates: Vec<_> = dataset
            .rows
            .iter()
            .map(|r| r.get(Field::Date).unwrap().into_owned())
            .collect();
        assert_eq!(dates, vec!["2024-11-01", "2024-12-01", "2025-01-01"]);
    }
}
