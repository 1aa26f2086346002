//! Command-line surface for the reasoning engine and the evaluation workload.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::error;

use crate::evaluation::{load_examples, EvaluationStats, Evaluator, PipelineEvaluator, PromptMode};
use crate::llm::TextCompletion;
use crate::reasoning::{ReasoningEngine, ReasoningStep, RunResult};
use crate::store::RuleRecord;

const RULE: &str = "════════════════════════════════════════════════════════════\n";

/// Multi-perspective reasoning with a persistent rule memory.
#[derive(Parser, Debug)]
#[command(name = "novel-reasoning", version, about)]
pub struct Cli {
    /// Override the completion model (defaults to LLM_MODEL)
    #[arg(long, short = 'm', global = true)]
    pub model: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the reasoning pipeline on one problem
    Solve {
        /// Problem to solve
        #[arg(long, short = 'p')]
        problem: String,

        /// Additional context for the problem
        #[arg(long, short = 'c', default_value = "")]
        context: String,

        /// Print the raw run result as JSON
        #[arg(long)]
        json: bool,
    },

    /// List learned rules or show one
    Rules {
        /// Rule to show in full
        #[arg(long, short = 'r')]
        rule_id: Option<String>,
    },

    /// Score the model on an ARC evaluation split
    Evaluate {
        /// Challenges JSON file
        #[arg(long)]
        challenges: PathBuf,

        /// Solutions JSON file
        #[arg(long)]
        solutions: PathBuf,

        /// Maximum examples to evaluate (0 = all)
        #[arg(long, default_value = "50")]
        limit: usize,

        /// Samples per example; the majority grid is scored
        #[arg(long, default_value = "1")]
        samples: usize,

        /// Sampling temperature
        #[arg(long, default_value = "0.0")]
        temperature: f64,

        /// Prompting mode
        #[arg(long, value_enum, default_value_t = PromptMode::Plain)]
        mode: PromptMode,

        /// Solve each task with the full reasoning pipeline instead of direct sampling
        #[arg(long)]
        pipeline: bool,

        /// Write per-task results as JSON
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Read commands from stdin
    Interactive,
}

/// Result of CLI command execution.
pub struct CliResult {
    /// Exit code (0 = success)
    pub exit_code: i32,
    /// Output message
    pub message: String,
}

impl CliResult {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            exit_code: 0,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            exit_code: 1,
            message: message.into(),
        }
    }
}

/// Execute `solve`.
pub async fn execute_solve(
    engine: &mut ReasoningEngine,
    problem: &str,
    context: &str,
    json: bool,
) -> CliResult {
    if problem.trim().is_empty() {
        return CliResult::error("A problem is required");
    }

    let result = engine.solve(problem, context).await;

    if json {
        return match serde_json::to_string_pretty(&result) {
            Ok(text) => CliResult::success(text),
            Err(e) => CliResult::error(format!("Failed to serialize result: {}", e)),
        };
    }

    CliResult::success(format_run(&result))
}

/// Execute `rules`.
pub fn execute_rules(engine: &ReasoningEngine, rule_id: Option<&str>) -> CliResult {
    let rules = engine.rules();

    match rule_id {
        Some(id) => match engine.store().get(id) {
            Some(rule) => CliResult::success(format_rule(rule)),
            None => CliResult::error(format!("Rule with ID '{}' not found", id)),
        },
        None if rules.is_empty() => CliResult::success("No rules have been learned yet."),
        None => CliResult::success(format_rules(rules)),
    }
}

/// How `evaluate` produces an answer for each task.
pub enum EvaluationDriver<'a> {
    /// Draw completions directly and vote.
    Sampling {
        completion: Arc<dyn TextCompletion>,
        samples: usize,
        temperature: f64,
        mode: PromptMode,
    },
    /// Run the reasoning pipeline once per task.
    Pipeline(&'a mut ReasoningEngine),
}

/// Execute `evaluate`.
pub async fn execute_evaluate(
    driver: EvaluationDriver<'_>,
    challenges: &Path,
    solutions: &Path,
    limit: usize,
    output: Option<&Path>,
) -> CliResult {
    let mut examples = match load_examples(challenges, solutions) {
        Ok(examples) => examples,
        Err(e) => {
            error!(error = %e, "Failed to load dataset");
            return CliResult::error(format!("Failed to load dataset: {}", e));
        }
    };
    if limit > 0 {
        examples.truncate(limit);
    }

    let report = match driver {
        EvaluationDriver::Sampling {
            completion,
            samples,
            temperature,
            mode,
        } => {
            Evaluator::new(completion)
                .with_samples(samples)
                .with_temperature(temperature)
                .with_mode(mode)
                .run(&examples)
                .await
        }
        EvaluationDriver::Pipeline(engine) => PipelineEvaluator::new(engine).run(&examples).await,
    };

    let mut message = format_stats(&report.stats);
    if let Some(path) = output {
        if let Err(e) = report.write_json(path).await {
            error!(error = %e, "Failed to save evaluation report");
            return CliResult::error(format!("{}\nFailed to save results: {}", message, e));
        }
        message.push_str(&format!("\nResults saved to {}", path.display()));
    }
    CliResult::success(message)
}

/// A parsed line of interactive input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractiveCommand {
    Solve(String),
    Rules,
    History,
    Clear,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

impl InteractiveCommand {
    /// Commands are case-insensitive; the problem text after `solve` is kept as typed.
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };

        match verb.to_lowercase().as_str() {
            "" => InteractiveCommand::Empty,
            "solve" => InteractiveCommand::Solve(rest.to_string()),
            "rules" => InteractiveCommand::Rules,
            "history" => InteractiveCommand::History,
            "clear" => InteractiveCommand::Clear,
            "help" => InteractiveCommand::Help,
            "quit" | "exit" => InteractiveCommand::Quit,
            _ => InteractiveCommand::Unknown(line.to_string()),
        }
    }
}

/// Run the interactive loop until `quit` or end of input.
pub async fn run_interactive<R>(engine: &mut ReasoningEngine, input: R) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    println!("Interactive reasoning mode. Type 'help' for commands, 'quit' to exit.");

    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        let output = match InteractiveCommand::parse(&line) {
            InteractiveCommand::Quit => break,
            InteractiveCommand::Empty => continue,
            InteractiveCommand::Solve(problem) if problem.is_empty() => {
                "Please provide a problem to solve.".to_string()
            }
            InteractiveCommand::Solve(problem) => {
                execute_solve(engine, &problem, "", false).await.message
            }
            InteractiveCommand::Rules => execute_rules(engine, None).message,
            InteractiveCommand::History => format_history(engine.history(), 10),
            InteractiveCommand::Clear => {
                engine.clear_history();
                "Reasoning history cleared.".to_string()
            }
            InteractiveCommand::Help => HELP.to_string(),
            InteractiveCommand::Unknown(_) => {
                "Unknown command. Type 'help' for available commands.".to_string()
            }
        };
        println!("{}", output);
    }

    println!("Goodbye!");
    Ok(())
}

const HELP: &str = "Available commands:
  solve <problem>  Solve a problem
  rules            View all learned rules
  history          View reasoning history
  clear            Clear reasoning history
  quit             Exit interactive mode";

/// Human-readable summary of a run.
pub fn format_run(result: &RunResult) -> String {
    let mut output = String::new();
    let dual = &result.dual_answers;

    output.push_str("\nReasoning Results\n");
    output.push_str(RULE);

    output.push_str("\nPerspectives:\n");
    for t in &result.character_thoughts {
        output.push_str(&format!(
            "\n{}:\n  {}\n",
            t.character.to_uppercase(),
            truncate(&t.thought, 300)
        ));
    }

    output.push_str(&format!("\nHypotheses:\n  {}\n", truncate(&result.hypotheses, 400)));

    output.push_str("\nDual Answers:\n");
    output.push_str(&format!("  Primary Answer: {}\n", dual.primary_answer));
    output.push_str(&format!("  Alternative Answer: {}\n", dual.alternative_answer));
    output.push_str(&format!("  Primary Confidence: {:.2}\n", dual.primary_confidence));
    output.push_str(&format!(
        "  Alternative Confidence: {:.2}\n",
        dual.alternative_confidence
    ));
    output.push_str(&format!("  Recommended: {}\n", dual.recommended_answer));
    output.push_str(&format!(
        "\nReasoning Comparison:\n  {}\n",
        truncate(&dual.reasoning_comparison, 300)
    ));

    output.push_str("\nLearning Summary:\n");
    output.push_str(&format!("  New Rules Learned: {}\n", result.new_rules_learned));
    output.push_str(&format!("  Total Rules: {}\n", result.total_rules));
    output.push_str(&format!("  Reasoning Steps: {}\n", result.reasoning_steps));

    output
}

pub fn format_rules(rules: &[RuleRecord]) -> String {
    let mut output = format!("\nLearned Rules ({} total)\n", rules.len());
    output.push_str(RULE);

    for (i, rule) in rules.iter().enumerate() {
        output.push_str(&format!("\n{}. {}\n", i + 1, rule.rule_id));
        output.push_str(&format!("   Description: {}\n", truncate(&rule.description, 100)));
        output.push_str(&format!(
            "   Confidence: {:.2} | Usage: {} | Success: {:.2}\n",
            rule.confidence, rule.usage_count, rule.success_rate
        ));
    }

    output
}

pub fn format_rule(rule: &RuleRecord) -> String {
    let mut output = format!("\nRule: {}\n", rule.rule_id);
    output.push_str(RULE);
    output.push_str(&format!("Description: {}\n", rule.description));
    output.push_str(&format!("Pattern: {}\n", rule.pattern));
    output.push_str(&format!("Confidence: {:.2}\n", rule.confidence));
    output.push_str(&format!("Usage Count: {}\n", rule.usage_count));
    output.push_str(&format!("Success Rate: {:.2}\n", rule.success_rate));
    output.push_str(&format!("Created: {}\n", rule.created_at.to_rfc3339()));
    output.push_str(&format!("Last Used: {}\n", rule.last_used.to_rfc3339()));
    output
}

/// The most recent `limit` steps, oldest first.
pub fn format_history(history: &[ReasoningStep], limit: usize) -> String {
    if history.is_empty() {
        return "No reasoning history available.".to_string();
    }

    let recent = &history[history.len().saturating_sub(limit)..];
    let mut output = format!("\nRecent Reasoning Steps (showing last {})\n", recent.len());
    output.push_str(RULE);

    for (i, step) in recent.iter().enumerate() {
        output.push_str(&format!(
            "\n{}. {} - {}\n   {}\n",
            i + 1,
            step.character.to_uppercase(),
            step.timestamp.to_rfc3339(),
            truncate(&step.thought, 150)
        ));
    }

    output
}

pub fn format_stats(stats: &EvaluationStats) -> String {
    format!(
        "Total: {}  Correct: {}  Acc: {:.3}  Cell Acc: {:.3}  Unparsed: {}",
        stats.total, stats.correct, stats.accuracy, stats.mean_cell_accuracy, stats.unparsed
    )
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
