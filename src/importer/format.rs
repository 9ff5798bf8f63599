use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::importer::columns::{ColumnMapping, ColumnType};
use crate::importer::values::mentions_month;

/// Overall layout of an imported file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FileFormat {
    /// Dated transactions: date, description, and an amount or debit/credit pair.
    BankStatement,
    /// Line items with one column per month and usually a total.
    FinancialStatement,
    /// Explicit type/name/amount/frequency columns.
    Simple,
    #[default]
    Unknown,
}

impl FileFormat {
    pub fn key(&self) -> &'static str {
        match self {
            Self::BankStatement => "bank-statement",
            Self::FinancialStatement => "financial-statement",
            Self::Simple => "simple",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

static TOTAL_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\btotal\b").expect("total pattern"));

/// First matching rule wins. Bank statements are checked before simple
/// exports so a file with date, description, type and amount columns is
/// treated as dated transactions rather than a flat list of entries.
pub fn classify_format(mapping: &ColumnMapping, headers: &[String]) -> FileFormat {
    let has = |wanted: ColumnType| mapping.values().any(|t| *t == wanted);
    let has_amount = has(ColumnType::Amount) || has(ColumnType::Debit) || has(ColumnType::Credit);

    if has(ColumnType::Date) && has(ColumnType::Description) && has_amount {
        return FileFormat::BankStatement;
    }

    let joined = headers.join(" ").to_lowercase();
    if mentions_month(&joined) || (TOTAL_WORD.is_match(&joined) && has(ColumnType::Total)) {
        return FileFormat::FinancialStatement;
    }

    if (has(ColumnType::Type) || has(ColumnType::Category))
        && (has(ColumnType::Name) || has(ColumnType::Description))
        && has_amount
    {
        return FileFormat::Simple;
    }

    FileFormat::Unknown
}
