use serde::{Deserialize, Serialize};

use crate::importer::values::recognize_date_shape;
use crate::importer::ParsedDataset;
use crate::models::{EntryKind, Field, NormalizedRow};

/// Record contract a row is checked against.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum RecordShape {
    #[default]
    IncomeExpense,
    BankStatement,
}

impl RecordShape {
    pub fn key(&self) -> &'static str {
        match self {
            Self::IncomeExpense => "income-expense",
            Self::BankStatement => "bank-statement",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
    pub inferred_type: Option<EntryKind>,
}

/// Checks one row. Every applicable error is collected, in field order
/// Type, Name, Amount, Date.
pub fn validate(row: &NormalizedRow, shape: RecordShape) -> ValidationResult {
    let mut errors = Vec::new();
    let inferred_type = infer_kind(row);

    match row.text(Field::Type) {
        Some(raw) if EntryKind::from_text(&raw).is_some() => {}
        Some(raw) if inferred_type.is_none() => {
            errors.push(format!("Type \"{raw}\" must be income or expense"));
        }
        None if inferred_type.is_none() => errors.push("Type is required".to_string()),
        _ => {}
    }

    if row.text(Field::Name).is_none() {
        errors.push("Name is required".to_string());
    }

    // Debit/credit stand in for Amount only when one side is positive.
    let has_debit_credit = inferred_type.is_some();
    match row.text(Field::Amount) {
        Some(raw) => match clean_amount(&raw) {
            None => errors.push(format!("Amount \"{raw}\" is not a number")),
            Some(value) if value < 0.0 && shape == RecordShape::IncomeExpense => {
                errors.push(format!("Amount \"{raw}\" must not be negative"));
            }
            Some(_) => {}
        },
        None if !has_debit_credit => errors.push("Amount is required".to_string()),
        None => {}
    }

    match row.text(Field::Date) {
        Some(raw) if !recognize_date_shape(&raw) => {
            errors.push(format!("Date \"{raw}\" is not a recognized date"));
        }
        None if shape == RecordShape::BankStatement => {
            errors.push("Date is required".to_string());
        }
        _ => {}
    }

    ValidationResult {
        valid: errors.is_empty(),
        errors,
        inferred_type,
    }
}

/// Strips `$ , ( ) € £` and whitespace before parsing, so parentheses do
/// not flip the sign here.
fn clean_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | '(' | ')' | '€' | '£') && !c.is_whitespace())
        .collect();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Larger positive side of a debit/credit pair; debit wins a tie.
fn infer_kind(row: &NormalizedRow) -> Option<EntryKind> {
    let side = |field| {
        row.text(field)
            .and_then(|v| clean_amount(&v))
            .unwrap_or(0.0)
    };
    let (debit, credit) = (side(Field::Debit), side(Field::Credit));
    if debit > 0.0 && debit >= credit {
        Some(EntryKind::Expense)
    } else if credit > 0.0 {
        Some(EntryKind::Income)
    } else {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowVerdict {
    /// Position in `ParsedDataset::rows`.
    pub index: usize,
    /// 1-based source line.
    pub line: usize,
    #[serde(flatten)]
    pub result: ValidationResult,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    pub valid: Vec<RowVerdict>,
    pub invalid: Vec<RowVerdict>,
}

impl ValidationReport {
    pub fn total(&self) -> usize {
        self.valid.len() + self.invalid.len()
    }
}

pub fn validate_dataset(dataset: &ParsedDataset, shape: RecordShape) -> ValidationReport {
    let mut report = ValidationReport::default();
    for (index, row) in dataset.rows.iter().enumerate() {
        let result = validate(row, shape);
        let verdict = RowVerdict {
            index,
            line: row.line(),
            result,
        };
        if verdict.result.valid {
            report.valid.push(verdict);
        } else {
            report.invalid.push(verdict);
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FieldMap, SimpleRow};

    fn row(pairs: &[(Field, &str)]) -> NormalizedRow {
        let mut fields = FieldMap::default();
        for (field, value) in pairs {
            fields.set(*field, *value);
        }
        NormalizedRow::Simple(SimpleRow { line: 2, fields })
    }

    #[test]
    fn test_complete_row_is_valid() {
        let r = row(&[
            (Field::Type, "Income"),
            (Field::Name, "Salary"),
            (Field::Amount, "$5,000.00"),
            (Field::Frequency, "fortnightly"),
            (Field::Date, "2025-01-15"),
        ]);
        let result = validate(&r, RecordShape::IncomeExpense);
        assert!(result.valid, "{:?}", result.errors);
        assert!(result.inferred_type.is_none());
    }

    #[test]
    fn test_all_errors_are_collected_in_order() {
        let r = row(&[
            (Field::Type, "Transfer"),
            (Field::Name, "   "),
            (Field::Amount, "abc"),
            (Field::Date, "someday"),
        ]);
        let result = validate(&r, RecordShape::IncomeExpense);
        assert!(!result.valid);
        assert_eq!(result.errors.len(), 4);
        assert!(result.errors[0].starts_with("Type"));
        assert_eq!(result.errors[1], "Name is required");
        assert!(result.errors[2].contains("not a number"));
        assert!(result.errors[3].starts_with("Date"));
    }

    #[test]
    fn test_type_matches_loosely() {
        let r = row(&[(Field::Type, "other income"), (Field::Name, "Tips"), (Field::Amount, "20")]);
        assert!(validate(&r, RecordShape::IncomeExpense).valid);
    }

    #[test]
    fn test_type_inferred_from_debit_credit() {
        let r = row(&[(Field::Name, "Refund"), (Field::Debit, ""), (Field::Credit, "40")]);
        let result = validate(&r, RecordShape::IncomeExpense);
        assert!(result.valid, "{:?}", result.errors);
        assert_eq!(result.inferred_type, Some(EntryKind::Income));

        let tie = row(&[(Field::Name, "Odd"), (Field::Debit, "10"), (Field::Credit, "10")]);
        assert_eq!(
            validate(&tie, RecordShape::IncomeExpense).inferred_type,
            Some(EntryKind::Expense)
        );
    }

    #[test]
    fn test_blank_or_zero_debit_credit_needs_amount() {
        let blank = row(&[
            (Field::Type, "Expense"),
            (Field::Name, "Pending"),
            (Field::Debit, ""),
            (Field::Credit, ""),
        ]);
        assert_eq!(validate(&blank, RecordShape::IncomeExpense).errors, vec!["Amount is required"]);

        let zero = row(&[
            (Field::Type, "Expense"),
            (Field::Name, "Zero"),
            (Field::Debit, "0"),
            (Field::Credit, "0.00"),
        ]);
        assert_eq!(validate(&zero, RecordShape::IncomeExpense).errors, vec!["Amount is required"]);
    }

    #[test]
    fn test_bank_rows_without_movement_are_reported() {
        let text = "Date,Description,Debit,Credit\n\
                    2025-01-04,Coffee,4.50,\n\
                    2025-01-05,Pending,,\n\
                    2025-01-06,Zero,0,0\n";
        let dataset = crate::importer::parse_text(text, &Default::default()).unwrap();
        assert_eq!(dataset.rows.len(), 3);

        let report = validate_dataset(&dataset, RecordShape::IncomeExpense);
        assert_eq!(report.valid.len(), 1);
        assert_eq!(report.valid[0].line, 2);
        let lines: Vec<_> = report.invalid.iter().map(|v| v.line).collect();
        assert_eq!(lines, vec![3, 4]);
        for verdict in &report.invalid {
            assert_eq!(verdict.result.errors, vec!["Amount is required"]);
        }
    }

    #[test]
    fn test_missing_type_and_amount() {
        let r = row(&[(Field::Name, "Mystery")]);
        let result = validate(&r, RecordShape::IncomeExpense);
        assert_eq!(result.errors, vec!["Type is required", "Amount is required"]);
    }

    #[test]
    fn test_negative_amount_depends_on_shape() {
        let r = row(&[
            (Field::Type, "Expense"),
            (Field::Name, "Fee"),
            (Field::Amount, "-12.50"),
            (Field::Date, "03/04/2025"),
        ]);
        assert!(!validate(&r, RecordShape::IncomeExpense).valid);
        assert!(validate(&r, RecordShape::BankStatement).valid);
    }

    #[test]
    fn test_parentheses_are_stripped_not_negated() {
        let r = row(&[(Field::Type, "Expense"), (Field::Name, "Repairs"), (Field::Amount, "(500)")]);
        assert!(validate(&r, RecordShape::IncomeExpense).valid);
    }

    #[test]
    fn test_bank_statement_requires_date() {
        let r = row(&[(Field::Type, "Expense"), (Field::Name, "Coffee"), (Field::Amount, "4")]);
        let result = validate(&r, RecordShape::BankStatement);
        assert_eq!(result.errors, vec!["Date is required"]);
        assert!(validate(&r, RecordShape::IncomeExpense).valid);
    }

    #[test]
    fn test_month_name_dates_are_accepted() {
        let r = row(&[
            (Field::Type, "Expense"),
            (Field::Name, "Coffee"),
            (Field::Amount, "4"),
            (Field::Date, "Jan 15, 2025"),
        ]);
        assert!(validate(&r, RecordShape::BankStatement).valid);
    }

    #[test]
    fn test_one_bad_amount_does_not_spoil_the_dataset() {
        let mut dataset = ParsedDataset::default();
        for i in 1..=10 {
            let amount = if i == 3 { "12..5".to_string() } else { format!("{i}00") };
            let mut fields = FieldMap::default();
            fields.set(Field::Type, "Expense");
            fields.set(Field::Name, format!("Item {i}"));
            fields.set(Field::Amount, amount);
            dataset.rows.push(NormalizedRow::Simple(SimpleRow { line: i + 1, fields }));
        }
        let report = validate_dataset(&dataset, RecordShape::IncomeExpense);
        assert_eq!(report.total(), 10);
        assert_eq!(report.valid.len(), 9);
        assert_eq!(report.invalid.len(), 1);
        assert_eq!(report.invalid[0].index, 2);
        assert_eq!(report.invalid[0].line, 4);
    }
}
