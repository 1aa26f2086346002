//! Text-completion collaborator.
//!
//! The reasoning pipeline and the evaluator only see the [`TextCompletion`]
//! trait; [`OpenAiClient`] is the HTTP implementation used by the binary.

mod client;
mod types;

pub use client::OpenAiClient;
pub use types::*;

use async_trait::async_trait;

use crate::error::CompletionResult;

/// A service that turns a conversation into one free-form text completion.
///
/// Implementations own their retry and timeout policy. Callers treat any
/// `Err` as a single failed attempt.
#[async_trait]
pub trait TextCompletion: Send + Sync {
    /// Complete an ordered list of role-tagged messages.
    async fn complete_chat(
        &self,
        messages: Vec<Message>,
        options: CompletionOptions,
    ) -> CompletionResult<String>;

    /// Complete a single user prompt.
    async fn complete(
        &self,
        prompt: &str,
        temperature: f64,
        max_tokens: u32,
    ) -> CompletionResult<String> {
        self.complete_chat(
            vec![Message::user(prompt)],
            CompletionOptions::new(temperature, max_tokens),
        )
        .await
    }
}
