use serde_json::Value;

use crate::grid::{Cell, Grid};

/// Extract an integer grid from a completion.
///
/// The whole text is tried as JSON first. Otherwise every balanced
/// `[...]` span is tried in order of its opening bracket, so an outer grid
/// is preferred over the rows inside it. The first span that is a
/// non-empty, rectangular array of integer-coercible cells wins.
pub fn extract_grid(text: &str) -> Option<Grid> {
    if let Ok(value) = serde_json::from_str::<Value>(text.trim()) {
        if let Some(grid) = grid_from_value(&value) {
            return Some(grid);
        }
    }

    bracketed_spans(text).find_map(|span| {
        serde_json::from_str::<Value>(span)
            .ok()
            .and_then(|value| grid_from_value(&value))
    })
}

/// Interpret a JSON value as a grid, coercing cells to integers.
pub fn grid_from_value(value: &Value) -> Option<Grid> {
    let rows = value.as_array()?;
    let rows: Option<Vec<Vec<Cell>>> = rows
        .iter()
        .map(|row| row.as_array()?.iter().map(coerce_cell).collect())
        .collect();
    Grid::new(rows?).ok()
}

fn coerce_cell(value: &Value) -> Option<Cell> {
    match value {
        Value::Number(n) => {
            if let Some(v) = n.as_u64() {
                Cell::try_from(v).ok()
            } else {
                n.as_f64()
                    .filter(|f| f.is_finite() && f.fract() == 0.0 && *f >= 0.0 && *f <= Cell::MAX as f64)
                    .map(|f| f as Cell)
            }
        }
        Value::String(s) => s.trim().parse::<Cell>().ok(),
        _ => None,
    }
}

/// Every balanced bracket span, ordered by opening position.
fn bracketed_spans(text: &str) -> impl Iterator<Item = &str> {
    let bytes = text.as_bytes();
    bytes
        .iter()
        .enumerate()
        .filter(|(_, b)| **b == b'[')
        .filter_map(move |(start, _)| {
            let mut depth = 0usize;
            for (offset, b) in bytes[start..].iter().enumerate() {
                match b {
                    b'[' => depth += 1,
                    b']' => {
                        depth -= 1;
                        if depth == 0 {
                            return Some(&text[start..=start + offset]);
                        }
                    }
                    _ => {}
                }
            }
            None
        })
}
