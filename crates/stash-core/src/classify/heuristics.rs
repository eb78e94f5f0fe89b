//! Content-shape heuristics for text-safe headers.

use crate::domain::FileType;

/// Weight of a recognised shape (JSON export, HTML, CSV).
pub(crate) const SHAPE_WEIGHT: f64 = 2.0;
/// Weight of "text, but no particular shape".
pub(crate) const PLAIN_TEXT_WEIGHT: f64 = 1.0;

/// Average commas per newline above which text is treated as CSV.
const CSV_COMMA_RATIO: f64 = 1.0;

/// Guess a type from the shape of a text header.
///
/// Abstains on empty or binary-looking headers.
pub(crate) fn shape(header: &[u8]) -> Option<(FileType, f64)> {
    let text = as_text(header)?;
    let text = text.trim_start_matches('\u{feff}').trim_start();
    if text.is_empty() {
        return None;
    }

    if text.starts_with('{') {
        return Some((FileType::DOCUMENT, SHAPE_WEIGHT));
    }
    if looks_like_html(text) {
        return Some((FileType::HTML, SHAPE_WEIGHT));
    }
    if looks_like_csv(text) {
        return Some((FileType::CSV, SHAPE_WEIGHT));
    }
    Some((FileType::TXT, PLAIN_TEXT_WEIGHT))
}

/// UTF-8 without control characters (tab / newline / carriage return / form feed allowed).
///
/// The header may cut a multi-byte character in half; the valid prefix is used then.
fn as_text(header: &[u8]) -> Option<&str> {
    let text = match std::str::from_utf8(header) {
        Ok(text) => text,
        Err(err) if err.error_len().is_none() => {
            // valid_up_to は文字境界
            std::str::from_utf8(&header[..err.valid_up_to()]).ok()?
        }
        Err(_) => return None,
    };
    let safe = text
        .chars()
        .all(|c| !c.is_control() || matches!(c, '\t' | '\n' | '\r' | '\u{0c}'));
    safe.then_some(text)
}

fn looks_like_html(text: &str) -> bool {
    let lower = text.to_ascii_lowercase();
    lower.starts_with("<!doctype html") || lower.contains("<html")
}

fn looks_like_csv(text: &str) -> bool {
    let newlines = text.matches('\n').count();
    if newlines == 0 {
        return false;
    }
    let first_line_has_comma = text.lines().next().is_some_and(|line| line.contains(','));
    let commas = text.matches(',').count();
    first_line_has_comma && commas as f64 / newlines as f64 >= CSV_COMMA_RATIO
}
