use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use tracing::debug;

use crate::error::{FinsiftError, Result};
use crate::importer::values::excel_serial_to_date;
use crate::models::Grid;

/// Reads the first worksheet of an `.xlsx`/`.xls` workbook held in memory.
pub fn read_first_sheet(data: &[u8]) -> Result<Grid> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(data))
        .map_err(|e| FinsiftError::Spreadsheet(e.to_string()))?;
    let Some(name) = workbook.sheet_names().first().cloned() else {
        return Err(FinsiftError::NoSheets);
    };
    debug!(sheet = %name, "reading first worksheet");
    let range = workbook
        .worksheet_range(&name)
        .map_err(|e| FinsiftError::Spreadsheet(e.to_string()))?;
    Ok(range_to_grid(&range))
}

/// Row-major cell strings; line numbers follow the sheet's own row numbers.
pub fn range_to_grid(range: &Range<Data>) -> Grid {
    let first_row = range.start().map(|(row, _)| row as usize).unwrap_or(0);
    let mut grid = Grid::default();
    for (i, row) in range.rows().enumerate() {
        grid.push(first_row + i + 1, row.iter().map(cell_to_string).collect());
    }
    grid
}

pub fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
                format!("{}", *f as i64)
            } else {
                f.to_string()
            }
        }
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => excel_serial_to_date(dt.as_f64()).unwrap_or_default(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
    }
}
