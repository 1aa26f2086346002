use std::collections::HashMap;

use crate::grid::{Cell, Grid};
use crate::parsing::extract_grid;

/// Neutral fill used when padding grids for scoring.
pub const BACKGROUND: Cell = 0;

/// Outcome of voting over a batch of completions.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    /// Modal grid, or `None` when no sample parsed.
    pub candidate: Option<Grid>,
    /// Number of samples that yielded a grid.
    pub parsed: usize,
    /// Number of parsed samples that agreed with the candidate.
    pub votes: usize,
}

/// Majority vote over independently drawn completions for one query.
#[derive(Debug, Clone, Copy, Default)]
pub struct SampleAggregator;

impl SampleAggregator {
    pub fn new() -> Self {
        Self
    }

    /// Parse every sample, drop those without a grid and pick the most
    /// frequent grid by canonical form. Ties go to the grid seen first.
    pub fn aggregate<S: AsRef<str>>(&self, samples: &[S]) -> Aggregation {
        let grids: Vec<Grid> = samples
            .iter()
            .filter_map(|s| extract_grid(s.as_ref()))
            .collect();
        let parsed = grids.len();

        // canonical key -> (first index, count)
        let mut tally: HashMap<String, (usize, usize)> = HashMap::new();
        for (idx, grid) in grids.iter().enumerate() {
            tally.entry(grid.canonical()).or_insert((idx, 0)).1 += 1;
        }

        let winner = tally
            .into_values()
            .max_by(|(first_a, count_a), (first_b, count_b)| {
                count_a.cmp(count_b).then(first_b.cmp(first_a))
            });

        match winner {
            Some((first, votes)) => Aggregation {
                candidate: grids.into_iter().nth(first),
                parsed,
                votes,
            },
            None => Aggregation {
                candidate: None,
                parsed: 0,
                votes: 0,
            },
        }
    }
}

/// Exact match: same shape and same cells.
pub fn grids_equal(a: &Grid, b: &Grid) -> bool {
    a == b
}

/// Fraction of matching cells after padding both grids to their shared
/// maximum height and width with `background`.
pub fn padded_accuracy(candidate: &Grid, truth: &Grid, background: Cell) -> f64 {
    let height = candidate.height().max(truth.height());
    let width = candidate.width().max(truth.width());

    let a = candidate.padded(height, width, background);
    let b = truth.padded(height, width, background);

    let matching = a
        .iter()
        .zip(&b)
        .flat_map(|(row_a, row_b)| row_a.iter().zip(row_b))
        .filter(|(x, y)| x == y)
        .count();

    matching as f64 / (height * width) as f64
}
