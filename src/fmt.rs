use colored::{ColoredString, Colorize};

use crate::models::EntryKind;

/// `$1,234.56`, with a leading `-` for negatives.
pub fn money(val: f64) -> String {
    let cents = format!("{:.2}", val.abs());
    let (whole, frac) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if val < 0.0 { "-" } else { "" };
    format!("{sign}${grouped}.{frac}")
}

/// Green for income, red for expense.
pub fn kind_amount(kind: EntryKind, amount: f64) -> ColoredString {
    match kind {
        EntryKind::Income => money(amount).green(),
        EntryKind::Expense => money(amount).red(),
    }
}

pub fn confidence(percent: u8) -> ColoredString {
    let text = format!("{percent}%");
    match percent {
        80..=100 => text.green().bold(),
        50..=79 => text.yellow(),
        _ => text.red(),
    }
}

/// Cuts `text` to at most `width` characters, marking the cut with `…`.
pub fn clip(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let kept: String = text.chars().take(width.saturating_sub(1)).collect();
    format!("{kept}…")
}
