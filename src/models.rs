use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

/// Canonical field names shared by every row shape. Declaration order is the
/// order fields are listed in dataset headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Field {
    Type,
    Date,
    Name,
    Amount,
    Debit,
    Credit,
    Category,
    Account,
    Frequency,
    Balance,
    Total,
    Status,
}

impl Field {
    pub const ALL: [Field; 12] = [
        Field::Type,
        Field::Date,
        Field::Name,
        Field::Amount,
        Field::Debit,
        Field::Credit,
        Field::Category,
        Field::Account,
        Field::Frequency,
        Field::Balance,
        Field::Total,
        Field::Status,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Type => "Type",
            Self::Date => "Date",
            Self::Name => "Name",
            Self::Amount => "Amount",
            Self::Debit => "Debit",
            Self::Credit => "Credit",
            Self::Category => "Category",
            Self::Account => "Account",
            Self::Frequency => "Frequency",
            Self::Balance => "Balance",
            Self::Total => "Total",
            Self::Status => "Status",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Income,
    Expense,
}

impl EntryKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Income => "Income",
            Self::Expense => "Expense",
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    /// Loose match: any value mentioning "income" or "expense".
    pub fn from_text(raw: &str) -> Option<Self> {
        let lower = raw.to_lowercase();
        if lower.contains("income") {
            Some(Self::Income)
        } else if lower.contains("expense") {
            Some(Self::Expense)
        } else {
            None
        }
    }
}

/// Field values copied out of mapped columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMap(BTreeMap<Field, String>);

impl FieldMap {
    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: Field) -> bool {
        self.0.contains_key(&field)
    }

    /// True when the field holds a non-blank value.
    pub fn is_set(&self, field: Field) -> bool {
        self.get(field).is_some_and(|v| !v.trim().is_empty())
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        self.0.insert(field, value.into());
    }

    /// Writes the value only when the field is absent or blank.
    pub fn fill(&mut self, field: Field, value: &str) {
        if !self.is_set(field) {
            self.0.insert(field, value.to_string());
        }
    }

    pub fn all_blank(&self) -> bool {
        self.0.values().all(|v| v.trim().is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.0.iter().map(|(f, v)| (*f, v.as_str()))
    }
}

/// Row from a flexible/simple export: whatever the mapping produced.
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleRow {
    pub line: usize,
    pub fields: FieldMap,
}

/// Bank-statement transaction after debit/credit inference and defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct BankRow {
    pub line: usize,
    pub fields: FieldMap,
}

/// One month of one financial-statement line item.
#[derive(Debug, Clone, PartialEq)]
pub struct StatementRow {
    pub line: usize,
    pub kind: EntryKind,
    pub name: String,
    pub amount: f64,
    pub date: NaiveDate,
}

impl StatementRow {
    pub const FREQUENCY: &'static str = "monthly";
    pub const CATEGORY: &'static str = "Other";
    pub const STATUS: &'static str = "Active";
}

#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedRow {
    Simple(SimpleRow),
    Bank(BankRow),
    Statement(StatementRow),
}

impl NormalizedRow {
    /// 1-based line in the source file (header is line 1 for CSV input).
    pub fn line(&self) -> usize {
        match self {
            Self::Simple(r) => r.line,
            Self::Bank(r) => r.line,
            Self::Statement(r) => r.line,
        }
    }

    pub fn get(&self, field: Field) -> Option<Cow<'_, str>> {
        match self {
            Self::Simple(r) => r.fields.get(field).map(Cow::Borrowed),
            Self::Bank(r) => r.fields.get(field).map(Cow::Borrowed),
            Self::Statement(r) => match field {
                Field::Type => Some(Cow::Borrowed(r.kind.label())),
                Field::Date => Some(Cow::Owned(r.date.format("%Y-%m-%d").to_string())),
                Field::Name => Some(Cow::Borrowed(r.name.as_str())),
                Field::Amount => Some(Cow::Owned(r.amount.to_string())),
                Field::Frequency => Some(Cow::Borrowed(StatementRow::FREQUENCY)),
                Field::Category => Some(Cow::Borrowed(StatementRow::CATEGORY)),
                Field::Status => Some(Cow::Borrowed(StatementRow::STATUS)),
                _ => None,
            },
        }
    }

    /// Non-blank value of a field, trimmed.
    pub fn text(&self, field: Field) -> Option<String> {
        self.get(field)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Populated fields in canonical order.
    pub fn fields(&self) -> Vec<(Field, Cow<'_, str>)> {
        Field::ALL
            .iter()
            .filter_map(|f| self.get(*f).map(|v| (*f, v)))
            .collect()
    }
}

impl Serialize for NormalizedRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let fields = self.fields();
        let mut map = serializer.serialize_map(Some(fields.len()))?;
        for (field, value) in &fields {
            map.serialize_entry(field.as_str(), value.as_ref())?;
        }
        map.end()
    }
}

/// One row of raw cells, tagged with its 1-based source line.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GridRow {
    pub line: usize,
    pub cells: Vec<String>,
}

impl GridRow {
    /// Missing trailing cells read as empty.
    pub fn cell(&self, index: usize) -> &str {
        self.cells.get(index).map(|c| c.trim()).unwrap_or("")
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|c| c.trim().is_empty())
    }
}

/// Raw tabular content; the first row holds the headers.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Grid {
    pub rows: Vec<GridRow>,
}

impl Grid {
    /// Appends a row unless every cell is blank.
    pub fn push(&mut self, line: usize, cells: Vec<String>) {
        let row = GridRow { line, cells };
        if !row.is_blank() {
            self.rows.push(row);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn headers(&self) -> &[String] {
        self.rows.first().map(|r| r.cells.as_slice()).unwrap_or(&[])
    }

    pub fn data_rows(&self) -> &[GridRow] {
        self.rows.get(1..).unwrap_or(&[])
    }
}
