//! Heuristic extraction of structured records from free-form completions.
//!
//! Every parser here is total: malformed input yields a documented default
//! (or `None` for grids), never an error.

mod dual_answer;
mod grid;
mod rules;

pub use dual_answer::*;
pub use grid::*;
pub use rules::*;

/// Text after the first colon, trimmed.
///
/// The closing `**` of a bold label (`**Pattern:** ...`) is dropped; the value
/// itself is kept as written.
pub(crate) fn label_value(line: &str) -> &str {
    let value = line.split_once(':').map(|(_, value)| value).unwrap_or("");
    value.strip_prefix("**").unwrap_or(value).trim()
}

/// Parse a confidence value, ignoring anything that is not a finite number.
pub(crate) fn parse_confidence(value: &str) -> Option<f64> {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(|v| v.clamp(0.0, 1.0))
}
