//! Google Generative Language client.

use std::time::Duration;

use async_trait::async_trait;
use dd_db::models::{Difficulty, Question, Recipe};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::{Assistant, AssistantError, Evaluation, generation};
use crate::config::ApiConfig;

/// `generateContent` client for one model
#[derive(Debug, Clone)]
pub struct GeminiAssistant {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: Value,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GeminiAssistant {
    pub fn new(
        api_key: Option<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, AssistantError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            model: model.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self, AssistantError> {
        Self::new(
            config.gemini_api_key.clone(),
            config.gemini_model.clone(),
            config.gemini_base_url.clone(),
            config.request_timeout(),
        )
    }

    /// Run one prompt and return the concatenated text of the first candidate.
    async fn generate_content(
        &self,
        prompt: &str,
        schema: Option<Value>,
    ) -> Result<String, AssistantError> {
        let api_key = self.api_key.as_deref().ok_or(AssistantError::MissingApiKey)?;
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        let body = GenerateRequest {
            contents: [Content {
                parts: [Part { text: prompt }],
            }],
            generation_config: schema.map(|response_schema| GenerationConfig {
                response_mime_type: "application/json",
                response_schema,
            }),
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AssistantError::Status(status));
        }

        let payload: GenerateResponse = response.json().await?;
        let text: String = payload
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect()
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(AssistantError::Empty);
        }
        Ok(text)
    }
}

#[async_trait]
impl Assistant for GeminiAssistant {
    async fn generate_quiz(
        &self,
        recipe: &Recipe,
        difficulty: Difficulty,
        seed: u32,
        count: usize,
    ) -> Result<Vec<Question>, AssistantError> {
        let prompt = quiz_prompt(recipe, difficulty, seed, count)?;
        let text = self.generate_content(&prompt, Some(quiz_schema())).await?;
        let raw: Value = serde_json::from_str(text.trim())?;

        let mut questions = generation::parse_questions(&raw, &recipe.id, seed)?;
        questions.truncate(count.max(1));

        tracing::debug!(
            recipe_id = %recipe.id,
            %difficulty,
            count = questions.len(),
            "Generated quiz"
        );
        Ok(questions)
    }

    async fn evaluate_free_response(
        &self,
        answer: &str,
        correct_answer: &str,
        question: &str,
    ) -> Result<Evaluation, AssistantError> {
        let prompt = format!(
            "Decide whether a learner's answer to a baking question is correct, \
             accepting answers with the same meaning (synonyms such as \"plain flour\" \
             for \"all-purpose flour\", small spelling mistakes).\n\
             Question: \"{question}\"\n\
             Expected answer: \"{correct_answer}\"\n\
             Learner's answer: \"{answer}\"\n\
             Reply with JSON {{\"isCorrect\": boolean, \"feedback\": string}}."
        );

        let schema = json!({
            "type": "OBJECT",
            "properties": {
                "isCorrect": { "type": "BOOLEAN" },
                "feedback": { "type": "STRING" }
            },
            "required": ["isCorrect", "feedback"]
        });

        let text = self.generate_content(&prompt, Some(schema)).await?;
        Ok(serde_json::from_str(text.trim())?)
    }

    async fn explain_mistake(
        &self,
        question: &str,
        wrong_answer: &str,
        correct_answer: &str,
    ) -> Result<String, AssistantError> {
        let prompt = format!(
            "A learner answered a baking question incorrectly.\n\
             Question: \"{question}\"\n\
             Their answer: \"{wrong_answer}\"\n\
             Correct answer: \"{correct_answer}\"\n\
             In two or three encouraging sentences, explain why this is a common \
             mistake and restate the culinary or scientific idea behind the correct answer."
        );

        let text = self.generate_content(&prompt, None).await?;
        Ok(text.trim().to_string())
    }
}

fn difficulty_guidance(difficulty: Difficulty) -> &'static str {
    match difficulty {
        Difficulty::Beginner => {
            "Ask about the core ingredients, basic temperatures and the major steps. \
             Use multiple-choice questions."
        }
        Difficulty::Intermediate => {
            "Ask about exact quantities and ratios, technique nuances such as folding \
             versus stirring, and timing. Use fill-in-blank or demanding multiple-choice questions."
        }
        Difficulty::Advanced => {
            "Ask about the chemistry behind the bake, troubleshooting, and baker's \
             percentages. Use free-response questions and difficult scenarios."
        }
    }
}

fn quiz_prompt(
    recipe: &Recipe,
    difficulty: Difficulty,
    seed: u32,
    count: usize,
) -> Result<String, AssistantError> {
    let context = serde_json::to_string(recipe)?;
    Ok(format!(
        "Write a {count}-question baking quiz about the recipe \"{name}\".\n\
         Difficulty: {difficulty}. {guidance}\n\
         Variation seed: {seed}. Pick different parts of the recipe to test \
         (ingredients, steps, temperatures, reasoning) and vary the wording between seeds.\n\
         Multiple-choice questions must list options that include the correct answer.\n\
         Recipe: {context}\n\
         Return only a JSON array matching the schema.",
        name = recipe.name,
        guidance = difficulty_guidance(difficulty),
    ))
}

fn quiz_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "id": { "type": "STRING" },
                "type": {
                    "type": "STRING",
                    "enum": ["multiple-choice", "fill-in-blank", "free-response"]
                },
                "question": { "type": "STRING" },
                "correctAnswer": { "type": "STRING" },
                "options": {
                    "type": "ARRAY",
                    "items": { "type": "STRING" },
                    "description": "Required for multiple-choice questions"
                },
                "hint": { "type": "STRING" },
                "explanation": { "type": "STRING" }
            },
            "required": ["id", "type", "question", "correctAnswer", "explanation"]
        }
    })
}
