use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::{AppError, AppResult};
use crate::grid::Grid;

/// A demonstration pair from a task's training section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TrainPair {
    pub input: Grid,
    pub output: Grid,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TestInput {
    pub input: Grid,
}

/// One task in a challenges file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TaskSpec {
    #[serde(default)]
    pub train: Vec<TrainPair>,
    #[serde(default)]
    pub test: Vec<TestInput>,
}

/// Challenges keyed by task id.
pub type Challenges = BTreeMap<String, TaskSpec>;

/// Expected test outputs keyed by task id, in test-item order.
pub type Solutions = BTreeMap<String, Vec<Grid>>;

/// A single scored query: one test item of one task.
#[derive(Debug, Clone, PartialEq)]
pub struct ArcExample {
    pub task_id: String,
    pub train_pairs: Vec<(Grid, Grid)>,
    pub test_input: Grid,
    pub expected: Grid,
}

pub fn load_challenges(path: impl AsRef<Path>) -> AppResult<Challenges> {
    load_json(path.as_ref())
}

pub fn load_solutions(path: impl AsRef<Path>) -> AppResult<Solutions> {
    load_json(path.as_ref())
}

fn load_json<T: serde::de::DeserializeOwned>(path: &Path) -> AppResult<T> {
    let raw = std::fs::read_to_string(path).map_err(|e| AppError::Dataset {
        message: format!("Failed to read {}: {}", path.display(), e),
    })?;

    serde_json::from_str(&raw).map_err(|e| AppError::Dataset {
        message: format!("Failed to parse {}: {}", path.display(), e),
    })
}

/// Flatten challenges and solutions into one example per test item.
///
/// Tasks whose test count differs from their solution count (including tasks
/// with no solutions) are skipped.
pub fn examples(challenges: &Challenges, solutions: &Solutions) -> Vec<ArcExample> {
    let mut out = Vec::new();

    for (task_id, task) in challenges {
        let expected = solutions.get(task_id).map(Vec::as_slice).unwrap_or(&[]);
        if task.test.len() != expected.len() {
            warn!(
                task_id = %task_id,
                tests = task.test.len(),
                solutions = expected.len(),
                "Skipping task with mismatched solutions"
            );
            continue;
        }

        let train_pairs: Vec<(Grid, Grid)> = task
            .train
            .iter()
            .map(|pair| (pair.input.clone(), pair.output.clone()))
            .collect();

        for (test, solution) in task.test.iter().zip(expected) {
            out.push(ArcExample {
                task_id: task_id.clone(),
                train_pairs: train_pairs.clone(),
                test_input: test.input.clone(),
                expected: solution.clone(),
            });
        }
    }

    debug!(examples = out.len(), tasks = challenges.len(), "Dataset flattened");
    out
}

/// Load both files and flatten them.
pub fn load_examples(
    challenges: impl AsRef<Path>,
    solutions: impl AsRef<Path>,
) -> AppResult<Vec<ArcExample>> {
    let challenges = load_challenges(challenges)?;
    let solutions = load_solutions(solutions)?;
    Ok(examples(&challenges, &solutions))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHALLENGES: &str = r#"{
        "b": {"train": [{"input": [[1]], "output": [[2]]}], "test": [{"input": [[3]]}, {"input": [[4]]}]},
        "a": {"train": [], "test": [{"input": [[0, 1]]}]},
        "c": {"train": [], "test": [{"input": [[5]]}]}
    }"#;

    const SOLUTIONS: &str = r#"{
        "a": [[[1, 0]]],
        "b": [[[6]], [[8]]],
        "c": [[[1]], [[2]]]
    }"#;

    #[test]
    fn test_examples_flatten_and_skip_mismatched() {
        let challenges: Challenges = serde_json::from_str(CHALLENGES).unwrap();
        let solutions: Solutions = serde_json::from_str(SOLUTIONS).unwrap();

        let examples = examples(&challenges, &solutions);
        let ids: Vec<&str> = examples.iter().map(|e| e.task_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "b"]);

        assert_eq!(examples[1].train_pairs.len(), 1);
        assert_eq!(examples[2].test_input, Grid::new(vec![vec![4]]).unwrap());
        assert_eq!(examples[2].expected, Grid::new(vec![vec![8]]).unwrap());
    }

    #[test]
    fn test_missing_solution_entry_skips_task() {
        let challenges: Challenges = serde_json::from_str(CHALLENGES).unwrap();
        let examples = examples(&challenges, &Solutions::new());
        assert!(examples.is_empty());
    }

    #[test]
    fn test_ragged_grid_rejected() {
        let result: Result<Solutions, _> = serde_json::from_str(r#"{"a": [[[1, 2], [3]]]}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_load_missing_file_is_dataset_error() {
        let err = load_challenges("/nonexistent/challenges.json").unwrap_err();
        assert!(matches!(err, AppError::Dataset { .. }));
    }
}
