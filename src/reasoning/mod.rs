//! Multi-perspective reasoning pipeline.
//!
//! - [`PhilosophicalCharacter`] / [`CharacterRegistry`]: persona configuration
//! - [`PerspectiveGenerator`]: one character's analysis, failure-tolerant
//! - [`ReasoningEngine`]: the five-stage protocol and the reasoning history

mod character;
mod engine;
mod perspective;
mod types;

pub use character::*;
pub use engine::*;
pub use perspective::*;
pub use types::*;
