use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

// ---------------------------------------------------------------------------
// Amounts
// ---------------------------------------------------------------------------

/// Parses a money cell. Thousands separators, currency symbols and quotes are
/// ignored; `(500)` is accounting notation for -500. Blank, unparseable and
/// non-finite input yields `None`.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, ',' | '"' | '$' | '€' | '£') && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    let (negative, body) = match cleaned.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        Some(inner) => (true, inner),
        None => (false, cleaned.as_str()),
    };
    let value: f64 = body.parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some(if negative { -value } else { value })
}

// ---------------------------------------------------------------------------
// Months
// ---------------------------------------------------------------------------

const MONTH_NAMES: &str = r"jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?";

const MONTH_PREFIXES: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

static MONTH_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)^({MONTH_NAMES})\.?(?:[\s\-/']+(\d{{4}}|\d{{2}}))?$"))
        .expect("month header pattern")
});

static MONTH_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"(?i)\b({MONTH_NAMES})\b")).expect("month word pattern"));

static MONTH_LEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"(?i)^({MONTH_NAMES})\b")).expect("month prefix pattern"));

/// Month named by a statement column header such as `Jan 2025` or `February`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthToken {
    pub month: u32,
    pub year: Option<i32>,
}

fn month_number(name: &str) -> Option<u32> {
    let lower = name.to_lowercase();
    MONTH_PREFIXES
        .iter()
        .position(|p| lower.starts_with(p))
        .map(|i| i as u32 + 1)
}

fn expand_year(digits: &str) -> Option<i32> {
    let year: i32 = digits.parse().ok()?;
    Some(if digits.len() == 2 { 2000 + year } else { year })
}

pub fn parse_month_header(header: &str) -> Option<MonthToken> {
    let caps = MONTH_HEADER.captures(header.trim())?;
    let month = month_number(&caps[1])?;
    let year = caps.get(2).and_then(|m| expand_year(m.as_str()));
    Some(MonthToken { month, year })
}

/// True when the text contains a month name as a standalone word.
pub fn mentions_month(text: &str) -> bool {
    MONTH_WORD.is_match(text)
}

// ---------------------------------------------------------------------------
// Dates
// ---------------------------------------------------------------------------

static ISO_DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}").expect("iso pattern"));
static SLASH_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{4}|\d{2})$").expect("slash pattern"));
static DASH_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})-(\d{1,2})-(\d{4}|\d{2})$").expect("dash pattern"));

/// Accepts ISO `YYYY-MM-DD` prefixes, `M/D/YY(YY)`, `M-D-YY(YY)`, or text
/// starting with a month name. Shape only; calendar validity is not checked.
pub fn recognize_date_shape(raw: &str) -> bool {
    let s = raw.trim();
    ISO_DATE.is_match(s) || SLASH_DATE.is_match(s) || DASH_DATE.is_match(s) || MONTH_LEADING.is_match(s)
}

const NAMED_DATE_FORMATS: &[&str] = &["%b %d, %Y", "%b %d %Y", "%d %b %Y", "%d %b, %Y"];

/// Best-effort conversion of a loosely formatted date to a calendar date.
pub fn normalize_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if ISO_DATE.is_match(s) {
        return NaiveDate::parse_from_str(s.get(..10)?, "%Y-%m-%d").ok();
    }
    if let Some(caps) = SLASH_DATE.captures(s).or_else(|| DASH_DATE.captures(s)) {
        let m: u32 = caps[1].parse().ok()?;
        let d: u32 = caps[2].parse().ok()?;
        let y = expand_year(&caps[3])?;
        return NaiveDate::from_ymd_opt(y, m, d);
    }
    if let Some(token) = parse_month_header(s) {
        return NaiveDate::from_ymd_opt(token.year?, token.month, 1);
    }
    NAMED_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// Excel serial day number to ISO date. The 1899-12-30 epoch absorbs the
/// 1900 leap-year bug for every date after February 1900.
pub fn excel_serial_to_date(serial: f64) -> Option<String> {
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    let date = base.checked_add_signed(chrono::Duration::days(serial.trunc() as i64))?;
    Some(date.format("%Y-%m-%d").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1,234.56"), Some(1234.56));
        assert_eq!(parse_amount("\"500.00\""), Some(500.0));
        assert_eq!(parse_amount("  -42.50  "), Some(-42.5));
        assert_eq!(parse_amount("0"), Some(0.0));
        assert_eq!(parse_amount("not_a_number"), None);
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("NaN"), None);
    }

    #[test]
    fn test_parse_amount_accounting_notation() {
        assert_eq!(parse_amount("(500)"), Some(-500.0));
        assert_eq!(parse_amount("500"), Some(500.0));
        assert_eq!(parse_amount("($1,234.56)"), Some(-1234.56));
    }

    #[test]
    fn test_parse_amount_currency_symbol() {
        assert_eq!(parse_amount("$1,234.56"), Some(1234.56));
        assert_eq!(parse_amount("-$50.00"), Some(-50.0));
        assert_eq!(parse_amount("€ 12"), Some(12.0));
    }

    #[test]
    fn test_parse_month_header() {
        assert_eq!(parse_month_header("Jan 2025"), Some(MonthToken { month: 1, year: Some(2025) }));
        assert_eq!(parse_month_header("february"), Some(MonthToken { month: 2, year: None }));
        assert_eq!(parse_month_header("Sept-24"), Some(MonthToken { month: 9, year: Some(2024) }));
        assert_eq!(parse_month_header("Dec. 2024"), Some(MonthToken { month: 12, year: Some(2024) }));
        assert_eq!(parse_month_header("Total"), None);
        assert_eq!(parse_month_header("Market"), None);
        assert_eq!(parse_month_header("Account Name"), None);
    }

    #[test]
    fn test_mentions_month_needs_whole_word() {
        assert!(mentions_month("account name jan 2025 total"));
        assert!(mentions_month("description march"));
        assert!(!mentions_month("summary primary decimal"));
    }

    #[test]
    fn test_recognize_date_shape() {
        assert!(recognize_date_shape("2025-11-15"));
        assert!(recognize_date_shape("2025-11-15T08:00:00"));
        assert!(recognize_date_shape("1/5/25"));
        assert!(recognize_date_shape("12-31-2024"));
        assert!(recognize_date_shape("Jan 15, 2025"));
        assert!(!recognize_date_shape("15.01.2025"));
        assert!(!recognize_date_shape("yesterday"));
        assert!(!recognize_date_shape("Market day"));
    }

    #[test]
    fn test_normalize_date() {
        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day);
        assert_eq!(normalize_date("01/15/2025"), d(2025, 1, 15));
        assert_eq!(normalize_date("1-5-25"), d(2025, 1, 5));
        assert_eq!(normalize_date("2025-03-09"), d(2025, 3, 9));
        assert_eq!(normalize_date("Jan 15, 2025"), d(2025, 1, 15));
        assert_eq!(normalize_date("Mar 2025"), d(2025, 3, 1));
        assert_eq!(normalize_date("13/01/2025"), None);
        assert_eq!(normalize_date("02/30/2025"), None);
    }

    #[test]
    fn test_excel_serial_to_date() {
        assert_eq!(excel_serial_to_date(45667.0).as_deref(), Some("2025-01-10"));
        assert_eq!(excel_serial_to_date(45667.75).as_deref(), Some("2025-01-10"));
    }
}
