use std::borrow::Cow;

use tracing::{debug, warn};

use crate::models::Grid;

/// Splits one comma-delimited line into trimmed cells. Quoted fields may hold
/// commas, `""` is an escaped quote, and an unterminated quote runs to the end
/// of the line. An empty line yields a single empty cell.
pub fn tokenize_line(line: &str) -> Vec<String> {
    let lifted = lift_quotes(line);
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(lifted.as_bytes());
    let mut record = csv::StringRecord::new();
    match rdr.read_record(&mut record) {
        Ok(true) => record.iter().map(|c| c.to_string()).collect(),
        Ok(false) => vec![String::new()],
        Err(e) => {
            warn!("falling back to plain split for malformed line: {e}");
            line.split(',').map(|c| c.trim().to_string()).collect()
        }
    }
}

/// Drops whitespace between a field boundary and an opening quote, so that
/// `a, "b, c"` reads as two fields. Quoted sections are copied verbatim.
fn lift_quotes(line: &str) -> Cow<'_, str> {
    if !line.contains('"') {
        return Cow::Borrowed(line);
    }
    let mut out = String::with_capacity(line.len());
    let mut rest = line;
    loop {
        let trimmed = rest.trim_start();
        if let Some(body) = trimmed.strip_prefix('"') {
            out.push('"');
            let mut chars = body.char_indices().peekable();
            let mut close = None;
            while let Some((i, c)) = chars.next() {
                if c != '"' {
                    continue;
                }
                if matches!(chars.peek(), Some((_, '"'))) {
                    chars.next();
                } else {
                    close = Some(i + 1);
                    break;
                }
            }
            let Some(close) = close else {
                out.push_str(body);
                return Cow::Owned(out);
            };
            out.push_str(&body[..close]);
            rest = &body[close..];
        }
        match rest.find(',') {
            Some(comma) => {
                out.push_str(&rest[..=comma]);
                rest = &rest[comma + 1..];
            }
            None => {
                out.push_str(rest);
                return Cow::Owned(out);
            }
        }
    }
}

/// Tokenizes delimited text line by line, dropping rows whose cells are all
/// blank. A leading byte-order mark is ignored.
pub fn text_to_grid(text: &str) -> Grid {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut grid = Grid::default();
    for (i, line) in text.lines().enumerate() {
        grid.push(i + 1, tokenize_line(line));
    }
    debug!(rows = grid.rows.len(), "tokenized delimited text");
    grid
}
