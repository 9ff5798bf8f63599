use tracing::debug;

use crate::importer::columns::ColumnMapping;
use crate::importer::extract::map_row;
use crate::models::{Grid, NormalizedRow, SimpleRow};

/// Straight column mapping, no inference and no defaults.
pub fn extract(grid: &Grid, mapping: &ColumnMapping) -> Vec<NormalizedRow> {
    let mut rows = Vec::new();
    let mut dropped = 0usize;
    for source in grid.data_rows() {
        match map_row(source, mapping) {
            Some(fields) => rows.push(NormalizedRow::Simple(SimpleRow {
                line: source.line,
                fields,
            })),
            None => dropped += 1,
        }
    }
    if dropped > 0 {
        debug!(dropped, "skipped rows with no mapped values");
    }
    rows
}
