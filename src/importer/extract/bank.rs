use tracing::debug;

use crate::importer::columns::ColumnMapping;
use crate::importer::extract::map_row;
use crate::importer::values::parse_amount;
use crate::models::{BankRow, EntryKind, Field, FieldMap, Grid, NormalizedRow};

/// Column mapping plus debit/credit direction and transaction defaults.
/// Dates are passed through untouched.
pub fn extract(grid: &Grid, mapping: &ColumnMapping) -> Vec<NormalizedRow> {
    let mut rows = Vec::new();
    for source in grid.data_rows() {
        let Some(mut fields) = map_row(source, mapping) else {
            debug!(line = source.line, "skipped row with no mapped values");
            continue;
        };
        infer_direction(&mut fields);
        apply_defaults(&mut fields);
        rows.push(NormalizedRow::Bank(BankRow {
            line: source.line,
            fields,
        }));
    }
    rows
}

/// A positive debit makes the row an expense for that amount; otherwise a
/// positive credit makes it income. Blank or unparseable values count as 0.
pub(crate) fn infer_direction(fields: &mut FieldMap) {
    if !fields.contains(Field::Debit) && !fields.contains(Field::Credit) {
        return;
    }
    let value = |fields: &FieldMap, field| fields.get(field).and_then(parse_amount).unwrap_or(0.0);
    let (kind, source) = if value(fields, Field::Debit) > 0.0 {
        (EntryKind::Expense, Field::Debit)
    } else if value(fields, Field::Credit) > 0.0 {
        (EntryKind::Income, Field::Credit)
    } else {
        return;
    };
    let amount = fields.get(source).unwrap_or_default().trim().to_string();
    fields.set(Field::Type, kind.label());
    fields.set(Field::Amount, amount);
}

fn apply_defaults(fields: &mut FieldMap) {
    fields.fill(Field::Type, EntryKind::Expense.label());
    fields.fill(Field::Frequency, "one-time");
    fields.fill(Field::Category, "Other");
    fields.fill(Field::Name, "Transaction");
}
