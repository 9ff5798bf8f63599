use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::importer::values::{parse_amount, parse_month_header};
use crate::models::{EntryKind, Grid, NormalizedRow, StatementRow};

static SUMMARY_ROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(total\b|noi\b|net operating|operating income|operating expense)")
        .expect("summary row pattern")
});

/// Explodes each line item into one row per month with a non-zero value.
///
/// Line items live under `Income` / `Expense` marker rows; rows before the
/// first marker and subtotal rows are skipped. Month headers without a year
/// start at `anchor_year` and roll forward when the month sequence wraps.
pub fn extract(grid: &Grid, anchor_year: i32) -> Vec<NormalizedRow> {
    let headers = grid.headers();
    let total_index = headers.iter().position(|h| h.trim().eq_ignore_ascii_case("total"));
    let months = month_columns(headers, anchor_year, total_index);
    debug!(months = months.len(), ?total_index, "financial statement columns");

    let mut section: Option<EntryKind> = None;
    let mut rows = Vec::new();
    for source in grid.data_rows() {
        let label = source.cell(0);
        if let Some(kind) = section_marker(label) {
            section = Some(kind);
            continue;
        }
        if label.is_empty() || SUMMARY_ROW.is_match(label) {
            continue;
        }
        let Some(kind) = section else {
            debug!(line = source.line, "skipped line item before first section");
            continue;
        };
        for (index, date) in &months {
            let Some(amount) = parse_amount(source.cell(*index)) else {
                continue;
            };
            if amount == 0.0 {
                continue;
            }
            rows.push(NormalizedRow::Statement(StatementRow {
                line: source.line,
                kind,
                name: label.to_string(),
                amount,
                date: *date,
            }));
        }
    }
    rows
}

fn section_marker(label: &str) -> Option<EntryKind> {
    if label.eq_ignore_ascii_case("income") {
        Some(EntryKind::Income)
    } else if label.eq_ignore_ascii_case("expense") || label.eq_ignore_ascii_case("expenses") {
        Some(EntryKind::Expense)
    } else {
        None
    }
}

/// Month columns in header order, each resolved to the first of its month.
/// An explicit year resets the running year; a month that does not come
/// after the previous one starts the next year.
pub(crate) fn month_columns(
    headers: &[String],
    anchor_year: i32,
    total_index: Option<usize>,
) -> Vec<(usize, NaiveDate)> {
    let mut year = anchor_year;
    let mut previous: Option<u32> = None;
    let mut columns = Vec::new();
    for (index, header) in headers.iter().enumerate() {
        if Some(index) == total_index {
            continue;
        }
        let Some(token) = parse_month_header(header) else {
            continue;
        };
        match token.year {
            Some(explicit) => year = explicit,
            None => {
                if previous.is_some_and(|p| token.month <= p) {
                    year += 1;
                }
            }
        }
        previous = Some(token.month);
        if let Some(date) = NaiveDate::from_ymd_opt(year, token.month, 1) {
            columns.push((index, date));
        }
    }
    columns
}
