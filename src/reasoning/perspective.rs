use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error};

use super::character::PhilosophicalCharacter;
use super::types::Stage;
use crate::llm::{Message, TextCompletion};
use crate::prompts::perspective_prompt;

/// Asks the completion service for one character's analysis.
#[derive(Clone)]
pub struct PerspectiveGenerator {
    completion: Arc<dyn TextCompletion>,
}

impl PerspectiveGenerator {
    pub fn new(completion: Arc<dyn TextCompletion>) -> Self {
        Self { completion }
    }

    /// Produce `character`'s analysis of `problem`.
    ///
    /// Never fails: a service error becomes a placeholder naming the
    /// character and the error. No retries happen here.
    pub async fn generate(
        &self,
        character: &PhilosophicalCharacter,
        problem: &str,
        context: &str,
    ) -> String {
        let prompt = perspective_prompt(character, problem, context);
        let start = Instant::now();

        match self
            .completion
            .complete_chat(vec![Message::user(prompt)], Stage::Perspectives.options())
            .await
        {
            Ok(thought) => {
                debug!(
                    character = %character.name(),
                    latency_ms = start.elapsed().as_millis(),
                    "Perspective generated"
                );
                thought
            }
            Err(e) => {
                error!(
                    character = %character.name(),
                    error = %e,
                    "Error generating perspective"
                );
                format!("Error in {}'s analysis: {}", character.name(), e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CompletionError, CompletionResult};
    use crate::llm::CompletionOptions;
    use async_trait::async_trait;
    use mockall::mock;

    mock! {
        Completer {}

        #[async_trait]
        impl TextCompletion for Completer {
            async fn complete_chat(
                &self,
                messages: Vec<Message>,
                options: CompletionOptions,
            ) -> CompletionResult<String>;
        }
    }

    fn socrates() -> PhilosophicalCharacter {
        PhilosophicalCharacter::new("Socrates", "a questioner", "Dialectical", ["logic"])
    }

    #[tokio::test]
    async fn test_generate_frames_persona_and_problem() {
        let mut completer = MockCompleter::new();
        completer
            .expect_complete_chat()
            .withf(|messages, options| {
                messages.len() == 1
                    && messages[0].content.starts_with("You are Socrates")
                    && messages[0].content.contains("PROBLEM TO ANALYZE:\n2, 4, 8")
                    && messages[0].content.contains("CONTEXT (if any):\nsequence")
                    && *options == Stage::Perspectives.options()
            })
            .times(1)
            .returning(|_, _| Ok("Doubling each time.".to_string()));

        let generator = PerspectiveGenerator::new(Arc::new(completer));
        let thought = generator.generate(&socrates(), "2, 4, 8", "sequence").await;
        assert_eq!(thought, "Doubling each time.");
    }

    #[tokio::test]
    async fn test_generate_failure_is_placeholder() {
        let mut completer = MockCompleter::new();
        completer
            .expect_complete_chat()
            .times(1)
            .returning(|_, _| Err(CompletionError::Timeout { timeout_ms: 10 }));

        let generator = PerspectiveGenerator::new(Arc::new(completer));
        let thought = generator.generate(&socrates(), "p", "").await;
        assert_eq!(
            thought,
            "Error in Socrates's analysis: Request timeout after 10ms"
        );
    }
}
