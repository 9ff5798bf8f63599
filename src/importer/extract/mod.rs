//! Per-format row extraction. Each extractor turns the raw grid into
//! normalized rows in source order.

pub mod bank;
pub mod simple;
pub mod statement;

use crate::importer::columns::ColumnMapping;
use crate::importer::format::FileFormat;
use crate::importer::ParseOptions;
use crate::models::{FieldMap, Grid, GridRow, NormalizedRow};

pub fn extract(
    format: FileFormat,
    grid: &Grid,
    mapping: &ColumnMapping,
    options: &ParseOptions,
) -> Vec<NormalizedRow> {
    match format {
        FileFormat::BankStatement => bank::extract(grid, mapping),
        FileFormat::FinancialStatement => statement::extract(grid, options.anchor_year),
        FileFormat::Simple | FileFormat::Unknown => simple::extract(grid, mapping),
    }
}

/// Copies each mapped cell into its canonical field, columns in index order.
/// When two columns feed the same field the first non-blank value is kept.
/// Returns `None` when every produced value is blank.
pub(crate) fn map_row(row: &GridRow, mapping: &ColumnMapping) -> Option<FieldMap> {
    let mut fields = FieldMap::default();
    for (&index, column_type) in mapping {
        let Some(field) = column_type.field() else {
            continue;
        };
        fields.fill(field, row.cell(index));
    }
    if fields.all_blank() {
        None
    } else {
        Some(fields)
    }
}
