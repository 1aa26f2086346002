use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::aggregate::{grids_equal, padded_accuracy, SampleAggregator, BACKGROUND};
use super::dataset::ArcExample;
use crate::error::{AppError, AppResult};
use crate::grid::Grid;
use crate::llm::{CompletionOptions, Message, TextCompletion};
use crate::parsing::extract_grid;
use crate::prompts::{
    arc_meta_user_prompt, arc_pipeline_problem, arc_user_prompt, ARC_META_SYSTEM_PROMPT,
    ARC_PIPELINE_CONTEXT, ARC_SYSTEM_PROMPT,
};
use crate::reasoning::ReasoningEngine;

/// How a task is framed for the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum PromptMode {
    /// Show the pairs, ask for the output grid.
    #[default]
    Plain,
    /// Ask the model to infer the rule first.
    Meta,
}

impl PromptMode {
    fn messages(self, example: &ArcExample) -> Vec<Message> {
        match self {
            PromptMode::Plain => vec![
                Message::system(ARC_SYSTEM_PROMPT),
                Message::user(arc_user_prompt(
                    &example.task_id,
                    &example.train_pairs,
                    &example.test_input,
                )),
            ],
            PromptMode::Meta => vec![
                Message::system(ARC_META_SYSTEM_PROMPT),
                Message::user(arc_meta_user_prompt(
                    &example.task_id,
                    &example.train_pairs,
                    &example.test_input,
                )),
            ],
        }
    }
}

/// Result for a single example.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExampleOutcome {
    pub task_id: String,
    pub candidate: Option<Grid>,
    pub correct: bool,
    /// Padded cell accuracy; 0.0 when nothing parsed.
    pub cell_accuracy: f64,
    pub parsed: usize,
    pub votes: usize,
    /// Wall time spent on this example.
    pub latency_ms: u64,
}

impl ExampleOutcome {
    fn score(
        example: &ArcExample,
        candidate: Option<Grid>,
        parsed: usize,
        votes: usize,
        start: Instant,
    ) -> Self {
        let (correct, cell_accuracy) = match &candidate {
            Some(candidate) => (
                grids_equal(candidate, &example.expected),
                padded_accuracy(candidate, &example.expected, BACKGROUND),
            ),
            None => (false, 0.0),
        };

        Self {
            task_id: example.task_id.clone(),
            candidate,
            correct,
            cell_accuracy,
            parsed,
            votes,
            latency_ms: start.elapsed().as_millis() as u64,
        }
    }
}

/// Aggregate results of an evaluation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EvaluationStats {
    pub total: usize,
    pub correct: usize,
    pub accuracy: f64,
    pub mean_cell_accuracy: f64,
    /// Examples where no sample yielded a grid.
    pub unparsed: usize,
}

impl EvaluationStats {
    pub fn from_outcomes(outcomes: &[ExampleOutcome]) -> Self {
        let total = outcomes.len();
        if total == 0 {
            return Self::default();
        }

        let correct = outcomes.iter().filter(|o| o.correct).count();
        let unparsed = outcomes.iter().filter(|o| o.candidate.is_none()).count();
        let cell_sum: f64 = outcomes.iter().map(|o| o.cell_accuracy).sum();

        Self {
            total,
            correct,
            accuracy: correct as f64 / total as f64,
            mean_cell_accuracy: cell_sum / total as f64,
            unparsed,
        }
    }
}

/// Per-example outcomes of a run plus their summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub stats: EvaluationStats,
    pub outcomes: Vec<ExampleOutcome>,
}

impl EvaluationReport {
    pub fn from_outcomes(outcomes: Vec<ExampleOutcome>) -> Self {
        Self {
            stats: EvaluationStats::from_outcomes(&outcomes),
            outcomes,
        }
    }

    /// Write the report as pretty-printed JSON, creating parent directories.
    pub async fn write_json(&self, path: &Path) -> AppResult<()> {
        let report_error = |e: &dyn std::fmt::Display| AppError::Report {
            message: format!("{}: {}", path.display(), e),
        };

        let text = serde_json::to_string_pretty(self).map_err(|e| report_error(&e))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| report_error(&e))?;
        }
        tokio::fs::write(path, text)
            .await
            .map_err(|e| report_error(&e))?;

        info!(path = %path.display(), examples = self.outcomes.len(), "Evaluation report saved");
        Ok(())
    }

    fn finish(outcomes: Vec<ExampleOutcome>, start: Instant) -> Self {
        let report = Self::from_outcomes(outcomes);
        info!(
            total = report.stats.total,
            correct = report.stats.correct,
            accuracy = report.stats.accuracy,
            unparsed = report.stats.unparsed,
            latency_ms = start.elapsed().as_millis(),
            "Evaluation completed"
        );
        report
    }
}

fn log_outcome(index: usize, outcome: &ExampleOutcome) {
    debug!(
        index,
        task_id = %outcome.task_id,
        correct = outcome.correct,
        cell_accuracy = outcome.cell_accuracy,
        latency_ms = outcome.latency_ms,
        "Example scored"
    );
}

/// Scores a model on grid puzzles by sampling, voting and comparing.
pub struct Evaluator {
    completion: Arc<dyn TextCompletion>,
    aggregator: SampleAggregator,
    samples: usize,
    options: CompletionOptions,
    mode: PromptMode,
}

impl Evaluator {
    /// One sample per example at temperature 0.0 in plain mode.
    pub fn new(completion: Arc<dyn TextCompletion>) -> Self {
        Self {
            completion,
            aggregator: SampleAggregator::new(),
            samples: 1,
            options: CompletionOptions::with_temperature(0.0),
            mode: PromptMode::Plain,
        }
    }

    /// Completions drawn per example (minimum 1).
    pub fn with_samples(mut self, samples: usize) -> Self {
        self.samples = samples.max(1);
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.options.temperature = temperature;
        self
    }

    pub fn with_mode(mut self, mode: PromptMode) -> Self {
        self.mode = mode;
        self
    }

    /// Evaluate every example in order.
    pub async fn run(&self, examples: &[ArcExample]) -> EvaluationReport {
        let start = Instant::now();
        let mut outcomes = Vec::with_capacity(examples.len());

        for (i, example) in examples.iter().enumerate() {
            let outcome = self.evaluate(example).await;
            log_outcome(i, &outcome);
            outcomes.push(outcome);
        }

        EvaluationReport::finish(outcomes, start)
    }

    /// Draw samples for one example, vote, and score the winner.
    pub async fn evaluate(&self, example: &ArcExample) -> ExampleOutcome {
        let start = Instant::now();
        let messages = self.mode.messages(example);

        let mut texts = Vec::with_capacity(self.samples);
        for _ in 0..self.samples {
            match self
                .completion
                .complete_chat(messages.clone(), self.options)
                .await
            {
                Ok(text) => texts.push(text),
                Err(e) => {
                    warn!(task_id = %example.task_id, error = %e, "Sample failed");
                    texts.push(String::new());
                }
            }
        }

        let aggregation = self.aggregator.aggregate(&texts);
        ExampleOutcome::score(
            example,
            aggregation.candidate,
            aggregation.parsed,
            aggregation.votes,
            start,
        )
    }
}

/// Solves grid puzzles with the full reasoning pipeline, one run per example.
///
/// The grid is read from the primary answer, falling back to the recommended
/// answer. Runs feed the engine's history and rule memory like any other solve.
pub struct PipelineEvaluator<'a> {
    engine: &'a mut ReasoningEngine,
}

impl<'a> PipelineEvaluator<'a> {
    pub fn new(engine: &'a mut ReasoningEngine) -> Self {
        Self { engine }
    }

    /// Evaluate every example in order.
    pub async fn run(&mut self, examples: &[ArcExample]) -> EvaluationReport {
        let start = Instant::now();
        let mut outcomes = Vec::with_capacity(examples.len());

        for (i, example) in examples.iter().enumerate() {
            let outcome = self.evaluate(example).await;
            log_outcome(i, &outcome);
            outcomes.push(outcome);
        }

        EvaluationReport::finish(outcomes, start)
    }

    /// Solve one example through the pipeline and score its answer.
    pub async fn evaluate(&mut self, example: &ArcExample) -> ExampleOutcome {
        let start = Instant::now();
        let problem =
            arc_pipeline_problem(&example.task_id, &example.train_pairs, &example.test_input);
        let result = self.engine.solve(&problem, ARC_PIPELINE_CONTEXT).await;

        let answers = &result.dual_answers;
        let candidate = extract_grid(&answers.primary_answer)
            .or_else(|| extract_grid(&answers.recommended_answer));
        if candidate.is_none() {
            warn!(task_id = %example.task_id, "No grid in the pipeline answer");
        }

        let parsed = usize::from(candidate.is_some());
        ExampleOutcome::score(example, candidate, parsed, parsed, start)
    }
}
