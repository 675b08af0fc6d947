//! Fallback catalog text parser
//!
//! Columns: category, name, protein, fat, carbs, calories, image.
//! The first line is a header. Quoted fields may contain commas.

use tracing::warn;

use crate::error::MenuError;
use crate::types::MenuItem;

/// Minimum number of columns for a usable row (category..carbs)
const MIN_COLUMNS: usize = 5;

/// Parse catalog text, discarding malformed rows one at a time
pub fn parse_catalog_text(text: &str) -> Vec<MenuItem> {
    let mut items = Vec::new();

    for (index, line) in text.lines().enumerate().skip(1) {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match parse_row(line) {
            Ok(item) => items.push(item),
            Err(e) => {
                // Line numbers are 1-based, header included
                warn!(line = index + 1, error = %e, "Skipping malformed catalog row");
            }
        }
    }

    items
}

fn parse_row(line: &str) -> Result<MenuItem, MenuError> {
    let fields = split_fields(line);
    if fields.len() < MIN_COLUMNS {
        return Err(MenuError::malformed(
            "catalog row",
            format!("expected at least {MIN_COLUMNS} columns, found {}", fields.len()),
        ));
    }

    let category = fields[0].trim();
    let name = fields[1].trim();
    if category.is_empty() || name.is_empty() {
        return Err(MenuError::malformed("catalog row", "empty category or name"));
    }

    let number = |index: usize, column: &str| -> Result<f64, MenuError> {
        let raw = fields.get(index).map(|s| s.trim()).unwrap_or("");
        if raw.is_empty() {
            return Ok(0.0);
        }
        raw.parse::<f64>()
            .map_err(|e| MenuError::malformed(format!("catalog column '{column}'"), format!("{raw:?}: {e}")))
    };

    let item = MenuItem::new(
        category,
        name,
        number(2, "protein")?,
        number(3, "fat")?,
        number(4, "carbs")?,
        number(5, "calories")?,
    )
    .with_image(fields.get(6).map(|s| s.trim()).unwrap_or(""));

    Ok(item)
}

/// Split one line on commas outside double quotes
///
/// A doubled quote inside a quoted field is a literal quote.
fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);

    fields
}
