use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use super::character::CharacterRegistry;
use super::perspective::PerspectiveGenerator;
use super::types::{CharacterThought, ReasoningStep, RunResult, Stage};
use crate::config::PipelineConfig;
use crate::error::CompletionResult;
use crate::llm::{Message, TextCompletion};
use crate::parsing::{parse_dual_answer, parse_rules_at, DualAnswerBundle};
use crate::prompts;
use crate::store::{RuleRecord, RuleStore};

/// Drives the five-stage reasoning protocol.
///
/// Stages run strictly in order: perspectives, hypotheses, dual approaches,
/// dual answers, rule abstraction. A failing completion call degrades its
/// stage to placeholder text and the run carries on, so [`ReasoningEngine::solve`]
/// always returns a complete [`RunResult`].
pub struct ReasoningEngine {
    completion: Arc<dyn TextCompletion>,
    perspectives: PerspectiveGenerator,
    registry: CharacterRegistry,
    store: RuleStore,
    history: Vec<ReasoningStep>,
    concurrency: usize,
}

impl ReasoningEngine {
    /// Create an engine with the reference philosophers and default concurrency.
    pub fn new(completion: Arc<dyn TextCompletion>, store: RuleStore) -> Self {
        Self {
            perspectives: PerspectiveGenerator::new(Arc::clone(&completion)),
            completion,
            registry: CharacterRegistry::default(),
            store,
            history: Vec::new(),
            concurrency: PipelineConfig::default().perspective_concurrency,
        }
    }

    /// Consult a different set of characters.
    pub fn with_registry(mut self, registry: CharacterRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Bound the number of perspective calls in flight (minimum 1).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Apply pipeline settings from configuration.
    pub fn with_pipeline_config(self, config: &PipelineConfig) -> Self {
        self.with_concurrency(config.perspective_concurrency)
    }

    /// Run the full protocol on `problem`.
    pub async fn solve(&mut self, problem: &str, context: &str) -> RunResult {
        let start = Instant::now();
        info!(
            problem = %preview(problem, 100),
            characters = self.registry.len(),
            "Starting reasoning run"
        );

        info!(stage = %Stage::Perspectives, "Generating perspectives");
        let thoughts = self.gather_perspectives(problem, context).await;
        self.record_steps(&thoughts);

        info!(stage = %Stage::Hypotheses, "Generating hypotheses");
        let hypotheses = self.generate_hypotheses(problem, &thoughts).await;

        info!(stage = %Stage::DualApproaches, "Simulating approaches");
        let (approach_one, approach_two) =
            self.simulate_approaches(problem, &hypotheses, &thoughts).await;

        info!(stage = %Stage::DualAnswers, "Reconciling dual answers");
        let dual_answers = self
            .reconcile_answers(problem, &approach_one, &approach_two, &thoughts)
            .await;

        info!(stage = %Stage::RuleAbstraction, "Abstracting rules");
        let new_rules_learned = self
            .abstract_rules(problem, &dual_answers.recommended_answer, &thoughts)
            .await;

        info!(
            new_rules = new_rules_learned,
            total_rules = self.store.len(),
            latency_ms = start.elapsed().as_millis(),
            "Reasoning run completed"
        );

        RunResult {
            problem: problem.to_string(),
            context: context.to_string(),
            timestamp: Utc::now(),
            character_thoughts: thoughts,
            hypotheses,
            dual_answers,
            new_rules_learned,
            total_rules: self.store.len(),
            reasoning_steps: self.history.len(),
        }
    }

    /// Stage 1: one thought per character, returned in registry order.
    async fn gather_perspectives(&self, problem: &str, context: &str) -> Vec<CharacterThought> {
        let generator = &self.perspectives;

        stream::iter(self.registry.iter())
            .map(|(key, character)| async move {
                debug!(character = %key, "Generating perspective");
                let thought = generator.generate(character, problem, context).await;
                CharacterThought {
                    character: key.to_string(),
                    thought,
                }
            })
            .buffered(self.concurrency)
            .collect()
            .await
    }

    fn record_steps(&mut self, thoughts: &[CharacterThought]) {
        for t in thoughts {
            let step = ReasoningStep {
                step_id: format!("step_{}_{}", self.history.len(), t.character),
                character: t.character.clone(),
                thought: t.thought.clone(),
                hypothesis: None,
                confidence: 0.0,
                timestamp: Utc::now(),
            };
            self.history.push(step);
        }
    }

    /// Stage 2: free-text hypotheses, kept opaque.
    async fn generate_hypotheses(&self, problem: &str, thoughts: &[CharacterThought]) -> String {
        let prompt = prompts::hypotheses_prompt(problem, thoughts);
        match self.call_stage(Stage::Hypotheses, prompt).await {
            Ok(text) => text,
            Err(e) => format!("Error generating hypotheses: {}", e),
        }
    }

    /// Stage 3: two contrasting approaches from a single completion.
    async fn simulate_approaches(
        &self,
        problem: &str,
        hypotheses: &str,
        thoughts: &[CharacterThought],
    ) -> (String, String) {
        let prompt = prompts::dual_approach_prompt(problem, hypotheses, thoughts);
        match self.call_stage(Stage::DualApproaches, prompt).await {
            Ok(text) => split_approaches(&text),
            Err(e) => (
                format!("Error in approach 1: {}", e),
                format!("Error in approach 2: {}", e),
            ),
        }
    }

    /// Stage 4: labelled dual answers, or the all-error bundle on failure.
    async fn reconcile_answers(
        &self,
        problem: &str,
        approach_one: &str,
        approach_two: &str,
        thoughts: &[CharacterThought],
    ) -> DualAnswerBundle {
        let prompt = prompts::dual_answer_prompt(problem, approach_one, approach_two, thoughts);
        match self.call_stage(Stage::DualAnswers, prompt).await {
            Ok(text) => parse_dual_answer(&text),
            Err(_) => failed_dual_answer(),
        }
    }

    /// Stage 5: parse rules, append them and persist the store. Returns the number learned.
    async fn abstract_rules(
        &mut self,
        problem: &str,
        solution: &str,
        thoughts: &[CharacterThought],
    ) -> usize {
        let prompt = prompts::rule_abstraction_prompt(problem, solution, thoughts);
        let text = match self.call_stage(Stage::RuleAbstraction, prompt).await {
            Ok(text) => text,
            Err(_) => return 0,
        };

        let rules = parse_rules_at(&text, Utc::now());
        if rules.is_empty() {
            warn!("Rule abstraction produced no parseable rules");
        }
        let learned = self.store.append(rules);

        if let Err(e) = self.store.persist().await {
            error!(
                location = %self.store.location(),
                error = %e,
                "Could not save rules"
            );
        }

        learned
    }

    async fn call_stage(&self, stage: Stage, prompt: String) -> CompletionResult<String> {
        let start = Instant::now();
        let result = self
            .completion
            .complete_chat(vec![Message::user(prompt)], stage.options())
            .await;

        match &result {
            Ok(text) => debug!(
                stage = %stage,
                chars = text.len(),
                latency_ms = start.elapsed().as_millis(),
                "Stage completion received"
            ),
            Err(e) => error!(
                stage = %stage,
                error = %e,
                latency_ms = start.elapsed().as_millis(),
                "Stage completion failed"
            ),
        }

        result
    }

    /// All learned rules, oldest first.
    pub fn rules(&self) -> &[RuleRecord] {
        self.store.records()
    }

    /// Reasoning steps recorded since construction or the last clear.
    pub fn history(&self) -> &[ReasoningStep] {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
        info!("Reasoning history cleared");
    }

    pub fn registry(&self) -> &CharacterRegistry {
        &self.registry
    }

    pub fn store(&self) -> &RuleStore {
        &self.store
    }
}

/// Split a two-approach completion into its halves.
///
/// Splits at the first line after the opening one that starts with
/// "approach 2" (ignoring case and leading markdown). Without such a line the
/// text is cut at half its line count. This is a structural cut, not a
/// semantic one. Non-blank input always yields two non-blank texts: when a
/// cut would leave one side blank, both sides get the whole text. Blank
/// input yields two empty strings.
pub fn split_approaches(text: &str) -> (String, String) {
    if text.trim().is_empty() {
        return (String::new(), String::new());
    }

    let lines: Vec<&str> = text.lines().collect();
    let split_at = lines
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, line)| is_second_approach_heading(line))
        .map(|(i, _)| i)
        .unwrap_or(lines.len() / 2);

    let first = lines[..split_at].join("\n");
    let second = lines[split_at..].join("\n");

    if first.trim().is_empty() || second.trim().is_empty() {
        return (text.to_string(), text.to_string());
    }

    (first, second)
}

fn is_second_approach_heading(line: &str) -> bool {
    line.trim_start_matches(|c: char| c.is_whitespace() || matches!(c, '#' | '*' | '-'))
        .to_lowercase()
        .starts_with("approach 2")
}

fn failed_dual_answer() -> DualAnswerBundle {
    DualAnswerBundle {
        primary_answer: "Error generating primary answer".to_string(),
        alternative_answer: "Error generating alternative answer".to_string(),
        primary_confidence: 0.0,
        alternative_confidence: 0.0,
        reasoning_comparison: "Error in dual answer generation".to_string(),
        recommended_answer: "Error".to_string(),
    }
}

fn preview(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    match trimmed.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}
