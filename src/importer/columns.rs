use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{FinsiftError, Result};
use crate::importer::format::{classify_format, FileFormat};
use crate::models::Field;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Type,
    Date,
    Description,
    Amount,
    Debit,
    Credit,
    Category,
    Account,
    Frequency,
    Name,
    Balance,
    Total,
    Ignore,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Type => "type",
            Self::Date => "date",
            Self::Description => "description",
            Self::Amount => "amount",
            Self::Debit => "debit",
            Self::Credit => "credit",
            Self::Category => "category",
            Self::Account => "account",
            Self::Frequency => "frequency",
            Self::Name => "name",
            Self::Balance => "balance",
            Self::Total => "total",
            Self::Ignore => "ignore",
        }
    }

    /// Canonical field a column of this type writes to. `description` and
    /// `name` share the `Name` field.
    pub fn field(&self) -> Option<Field> {
        match self {
            Self::Type => Some(Field::Type),
            Self::Date => Some(Field::Date),
            Self::Description | Self::Name => Some(Field::Name),
            Self::Amount => Some(Field::Amount),
            Self::Debit => Some(Field::Debit),
            Self::Credit => Some(Field::Credit),
            Self::Category => Some(Field::Category),
            Self::Account => Some(Field::Account),
            Self::Frequency => Some(Field::Frequency),
            Self::Balance => Some(Field::Balance),
            Self::Total => Some(Field::Total),
            Self::Ignore => None,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColumnType {
    type Err = FinsiftError;

    fn from_str(s: &str) -> Result<Self> {
        let tag = s.trim().to_lowercase();
        CATALOG
            .iter()
            .map(|(t, _)| *t)
            .chain(std::iter::once(ColumnType::Ignore))
            .find(|t| t.as_str() == tag)
            .ok_or_else(|| FinsiftError::UnknownColumnType(s.to_string()))
    }
}

/// Alias catalog in priority order: when two types score the same for a
/// header, the one listed first wins. Aliases are stored pre-normalized.
pub const CATALOG: &[(ColumnType, &[&str])] = &[
    (
        ColumnType::Type,
        &["type", "transaction type", "entry type", "record type", "kind", "income expense"],
    ),
    (
        ColumnType::Date,
        &[
            "date",
            "transaction date",
            "posting date",
            "date posted",
            "posted date",
            "post date",
            "trans date",
            "value date",
            "effective date",
            "start date",
        ],
    ),
    (
        ColumnType::Description,
        &[
            "description",
            "memo",
            "details",
            "narrative",
            "payee",
            "merchant",
            "transaction description",
            "particulars",
            "reference",
        ],
    ),
    (
        ColumnType::Amount,
        &["amount", "transaction amount", "net amount", "value", "sum", "amt"],
    ),
    (
        ColumnType::Debit,
        &["debit", "debits", "debit amount", "withdrawal", "withdrawals", "money out", "paid out", "outflow"],
    ),
    (
        ColumnType::Credit,
        &["credit", "credits", "credit amount", "deposit", "deposits", "money in", "paid in", "inflow"],
    ),
    (
        ColumnType::Category,
        &["category", "budget category", "group", "classification"],
    ),
    (
        ColumnType::Account,
        &["account", "account name", "account number", "acct", "line item"],
    ),
    (
        ColumnType::Frequency,
        &["frequency", "recurrence", "interval", "period", "repeat"],
    ),
    (
        ColumnType::Name,
        &["name", "title", "item", "label", "source", "payee name"],
    ),
    (
        ColumnType::Balance,
        &["balance", "running balance", "running bal", "available balance", "ending balance"],
    ),
    (
        ColumnType::Total,
        &["total", "grand total", "annual total", "year total", "ytd"],
    ),
];

pub const SIMILARITY_THRESHOLD: f64 = 0.7;
const MAX_SUGGESTIONS: usize = 3;

pub type ColumnMapping = BTreeMap<usize, ColumnType>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectedColumns {
    pub mapping: ColumnMapping,
    pub confidence: u8,
    pub format: FileFormat,
    pub suggestions: BTreeMap<usize, Vec<ColumnType>>,
}

impl DetectedColumns {
    /// Replaces one column's type. Confidence and suggestions are kept as
    /// scored; the format is left for the caller to re-classify.
    pub fn override_column(&self, index: usize, column_type: ColumnType) -> Result<Self> {
        if !self.mapping.contains_key(&index) {
            return Err(FinsiftError::ColumnOutOfRange {
                index,
                len: self.mapping.len(),
            });
        }
        let mut updated = self.clone();
        updated.mapping.insert(index, column_type);
        Ok(updated)
    }
}

/// Lowercases, trims, and folds runs of whitespace and `_ - / \` into single
/// spaces.
pub fn normalize_header(header: &str) -> String {
    header
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || matches!(c, '_' | '-' | '/' | '\\'))
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Character-overlap ratio: characters of the shorter string that occur
/// anywhere in the longer one, over the longer string's length.
pub fn similarity(a: &str, b: &str) -> f64 {
    let (shorter, longer) = if a.chars().count() <= b.chars().count() {
        (a, b)
    } else {
        (b, a)
    };
    let longer_len = longer.chars().count();
    if longer_len == 0 {
        return 1.0;
    }
    let hits = shorter.chars().filter(|c| longer.contains(*c)).count();
    hits as f64 / longer_len as f64
}

fn alias_score(header: &str, alias: &str) -> u8 {
    if header == alias {
        100
    } else if header.contains(alias) {
        80
    } else if alias.contains(header) {
        60
    } else if similarity(header, alias) >= SIMILARITY_THRESHOLD {
        40
    } else {
        0
    }
}

#[derive(Debug, Clone, PartialEq)]
struct ColumnGuess {
    column_type: ColumnType,
    score: u8,
    suggestions: Vec<ColumnType>,
}

fn score_header(header: &str) -> ColumnGuess {
    let normalized = normalize_header(header);
    if normalized.is_empty() {
        return ColumnGuess {
            column_type: ColumnType::Ignore,
            score: 0,
            suggestions: Vec::new(),
        };
    }

    let mut best = (ColumnType::Ignore, 0u8);
    let mut scored: Vec<(ColumnType, u8)> = Vec::new();
    for (column_type, aliases) in CATALOG {
        let score = aliases
            .iter()
            .map(|alias| alias_score(&normalized, alias))
            .max()
            .unwrap_or(0);
        if score > 0 {
            scored.push((*column_type, score));
        }
        if score > best.1 {
            best = (*column_type, score);
        }
        if score == 100 {
            break;
        }
    }

    // Stable sort: equal scores stay in catalog order.
    scored.sort_by(|a, b| b.1.cmp(&a.1));
    ColumnGuess {
        column_type: best.0,
        score: best.1.min(100),
        suggestions: scored.into_iter().take(MAX_SUGGESTIONS).map(|(t, _)| t).collect(),
    }
}

/// Guesses a type for every header column and classifies the layout.
pub fn detect_columns(headers: &[String]) -> DetectedColumns {
    let mut mapping = ColumnMapping::new();
    let mut suggestions = BTreeMap::new();
    let mut total: u32 = 0;

    for (index, header) in headers.iter().enumerate() {
        let guess = score_header(header);
        total += u32::from(guess.score);
        mapping.insert(index, guess.column_type);
        if !guess.suggestions.is_empty() {
            suggestions.insert(index, guess.suggestions);
        }
    }

    let confidence = if headers.is_empty() {
        0
    } else {
        (f64::from(total) / headers.len() as f64).round() as u8
    };
    let format = classify_format(&mapping, headers);

    DetectedColumns {
        mapping,
        confidence,
        format,
        suggestions,
    }
}
