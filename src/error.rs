use thiserror::Error;

#[derive(Error, Debug)]
pub enum FinsiftError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("File is empty: no rows to import")]
    EmptyInput,

    #[error("Unsupported format: .{0} (expected .csv, .xlsx or .xls)")]
    UnsupportedFormat(String),

    #[error("Could not read spreadsheet: {0}")]
    Spreadsheet(String),

    #[error("Spreadsheet contains no sheets")]
    NoSheets,

    #[error("Spreadsheet support is not enabled in this build")]
    SpreadsheetDisabled,

    #[error("Column {index} does not exist (file has {len} columns)")]
    ColumnOutOfRange { index: usize, len: usize },

    #[error("Unknown column type: {0}")]
    UnknownColumnType(String),

    #[error("File is {size} bytes, over the {limit} byte limit")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("This file has already been imported: {0}")]
    DuplicateFile(String),

    #[error("Unknown record: {0}")]
    UnknownRecord(i64),

    #[error("Settings error: {0}")]
    Settings(String),
}

pub type Result<T> = std::result::Result<T, FinsiftError>;
