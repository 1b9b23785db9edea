//! Text-generation collaborators: quiz generation, free-response grading and
//! mistake explanations.
//!
//! Callers go through [`FallbackAssistant`], which never fails.

pub mod fallback;
pub mod gemini;
pub mod generation;

use async_trait::async_trait;
use dd_db::models::{Difficulty, Question, Recipe};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use fallback::FallbackAssistant;
pub use gemini::GeminiAssistant;

#[derive(Error, Debug)]
pub enum AssistantError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Service responded with {0}")]
    Status(reqwest::StatusCode),
    #[error("Service returned no content")]
    Empty,
    #[error("Unusable response: {0}")]
    Parse(String),
    #[error("No API key configured")]
    MissingApiKey,
}

impl From<serde_json::Error> for AssistantError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e.to_string())
    }
}

/// Verdict on a free-response answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    pub is_correct: bool,
    pub feedback: String,
}

#[async_trait]
pub trait Assistant: Send + Sync {
    /// Generate up to `count` questions about `recipe`.
    ///
    /// `seed` varies the questions between sessions and namespaces their ids.
    async fn generate_quiz(
        &self,
        recipe: &Recipe,
        difficulty: Difficulty,
        seed: u32,
        count: usize,
    ) -> Result<Vec<Question>, AssistantError>;

    /// Grade an open answer with tolerance for synonyms and typos.
    async fn evaluate_free_response(
        &self,
        answer: &str,
        correct_answer: &str,
        question: &str,
    ) -> Result<Evaluation, AssistantError>;

    /// Short explanation of why `wrong_answer` misses the point.
    async fn explain_mistake(
        &self,
        question: &str,
        wrong_answer: &str,
        correct_answer: &str,
    ) -> Result<String, AssistantError>;
}
