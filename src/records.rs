use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::importer::values::{normalize_date, parse_amount};
use crate::models::{EntryKind, Field, NormalizedRow};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Frequency {
    #[default]
    OneTime,
    Daily,
    Weekly,
    Biweekly,
    Monthly,
    Quarterly,
    Yearly,
}

impl Frequency {
    pub fn key(&self) -> &'static str {
        match self {
            Self::OneTime => "one-time",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Biweekly => "biweekly",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Yearly => "yearly",
        }
    }

    /// Unrecognized text is treated as one-time.
    pub fn from_text(raw: &str) -> Self {
        let squashed: String = raw
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        match squashed.as_str() {
            "daily" => Self::Daily,
            "weekly" => Self::Weekly,
            "biweekly" | "fortnightly" => Self::Biweekly,
            "monthly" => Self::Monthly,
            "quarterly" => Self::Quarterly,
            "yearly" | "annual" | "annually" => Self::Yearly,
            _ => Self::OneTime,
        }
    }
}

/// Values for a record that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewRecord {
    pub kind: EntryKind,
    pub name: String,
    pub amount: f64,
    pub frequency: Frequency,
    pub category: String,
    pub date: Option<String>,
    pub status: String,
    pub source: Option<String>,
}

impl NewRecord {
    /// Coerces a normalized row into typed values. Returns `None` when the
    /// row yields no kind, name or amount.
    pub fn from_row(row: &NormalizedRow, inferred: Option<EntryKind>, source: &str) -> Option<Self> {
        let kind = row
            .text(Field::Type)
            .and_then(|t| EntryKind::from_text(&t))
            .or(inferred)?;
        let name = row.text(Field::Name)?;
        let amount = match row.text(Field::Amount) {
            Some(raw) => parse_amount(&raw)?,
            None => [Field::Debit, Field::Credit]
                .iter()
                .filter_map(|f| row.text(*f).and_then(|v| parse_amount(&v)))
                .fold(None, |best: Option<f64>, v| Some(best.map_or(v, |b| b.max(v))))?,
        };
        let date = row.text(Field::Date).map(|raw| match normalize_date(&raw) {
            Some(d) => d.format("%Y-%m-%d").to_string(),
            None => raw,
        });

        Some(Self {
            kind,
            name,
            amount: amount.abs(),
            frequency: Frequency::from_text(&row.text(Field::Frequency).unwrap_or_default()),
            category: row.text(Field::Category).unwrap_or_else(|| "Other".to_string()),
            date,
            status: row.text(Field::Status).unwrap_or_else(|| "Active".to_string()),
            source: Some(source.to_string()).filter(|s| !s.is_empty()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub id: i64,
    #[serde(flatten)]
    pub values: NewRecord,
    pub created_at: String,
}

/// Keyed record storage.
pub trait RecordStore {
    fn add(&mut self, record: &NewRecord) -> Result<i64>;
    fn update(&mut self, id: i64, record: &NewRecord) -> Result<()>;
    fn delete(&mut self, id: i64) -> Result<()>;
    fn scan(&self) -> Result<Vec<Record>>;
}
