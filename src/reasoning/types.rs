use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::llm::CompletionOptions;
use crate::parsing::DualAnswerBundle;

/// The five sequential stages of a reasoning run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Perspectives,
    Hypotheses,
    DualApproaches,
    DualAnswers,
    RuleAbstraction,
}

impl Stage {
    /// Sampling settings: creative stages run hotter, rule abstraction coolest.
    pub fn options(self) -> CompletionOptions {
        match self {
            Stage::Perspectives => CompletionOptions::new(0.7, 1000),
            Stage::Hypotheses => CompletionOptions::new(0.8, 800),
            Stage::DualApproaches => CompletionOptions::new(0.9, 1500),
            Stage::DualAnswers => CompletionOptions::new(0.7, 1200),
            Stage::RuleAbstraction => CompletionOptions::new(0.6, 1000),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Perspectives => "perspectives",
            Stage::Hypotheses => "hypotheses",
            Stage::DualApproaches => "dual_approaches",
            Stage::DualAnswers => "dual_answers",
            Stage::RuleAbstraction => "rule_abstraction",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One character's contribution to a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterThought {
    /// Registry key of the character.
    pub character: String,
    pub thought: String,
}

/// A single entry in the engine's reasoning history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasoningStep {
    /// `step_{n}_{character}`, where `n` is the history length at insertion.
    pub step_id: String,
    /// Registry key of the character.
    pub character: String,
    pub thought: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hypothesis: Option<String>,
    /// Confidence score (0.0-1.0).
    pub confidence: f64,
    pub timestamp: DateTime<Utc>,
}

/// Everything a full reasoning run produced.
///
/// Every field is populated even when stages degraded; check the dual
/// answer confidences and texts to tell a degraded run from a real one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub problem: String,
    pub context: String,
    pub timestamp: DateTime<Utc>,
    /// Perspectives in registry order.
    pub character_thoughts: Vec<CharacterThought>,
    pub hypotheses: String,
    pub dual_answers: DualAnswerBundle,
    pub new_rules_learned: usize,
    pub total_rules: usize,
    pub reasoning_steps: usize,
}

impl RunResult {
    /// The thought produced by the character registered under `key`.
    pub fn thought_for(&self, key: &str) -> Option<&str> {
        self.character_thoughts
            .iter()
            .find(|t| t.character == key)
            .map(|t| t.thought.as_str())
    }
}
