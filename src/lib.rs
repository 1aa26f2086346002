//! # Novel Reasoning
//!
//! A multi-perspective reasoning pipeline over a text-completion service,
//! with a persistent memory of abstracted rules and a grid-puzzle
//! evaluation workload.
//!
//! ## Pipeline
//!
//! ```text
//! problem ─► perspectives (one per character, concurrent)
//!         ─► hypotheses ─► dual approaches ─► dual answers
//!         ─► rule abstraction ─► RuleStore (JSON file or SQLite)
//! ```
//!
//! Every stage tolerates completion failures by substituting placeholder
//! text, so a run always produces a complete [`reasoning::RunResult`].
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use novel_reasoning::{Config, OpenAiClient, ReasoningEngine, RuleStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let client = OpenAiClient::new(&config.llm, config.request.clone())?;
//!     let store = RuleStore::from_config(&config.rules).await?;
//!     let mut engine = ReasoningEngine::new(Arc::new(client), store);
//!     let result = engine.solve("What comes next: 2, 4, 8, 16?", "").await;
//!     println!("{}", result.dual_answers.recommended_answer);
//!     Ok(())
//! }
//! ```

/// Command-line subcommands and output formatting.
pub mod cli;
/// Configuration loaded from the environment.
pub mod config;
/// Error types and result aliases.
pub mod error;
/// Dataset loading, sample voting and grid scoring.
pub mod evaluation;
/// Validated integer grids.
pub mod grid;
/// Text-completion client and message types.
pub mod llm;
/// Heuristic parsers for rules, dual answers and grids.
pub mod parsing;
/// Prompt templates for every stage and the evaluation workload.
pub mod prompts;
/// Characters, perspectives and the reasoning engine.
pub mod reasoning;
/// Persistent rule memory.
pub mod store;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use grid::Grid;
pub use llm::{OpenAiClient, TextCompletion};
pub use reasoning::{CharacterRegistry, ReasoningEngine, RunResult};
pub use store::{RuleRecord, RuleStore};
