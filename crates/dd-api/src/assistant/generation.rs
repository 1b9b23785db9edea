//! Conversion of generated quiz JSON into strict [`Question`] values.
//!
//! Generated output is loosely typed: fields go missing, type names drift and
//! option lists forget the correct answer. Entries are repaired where possible
//! and dropped otherwise.

use std::{collections::HashSet, sync::LazyLock};

use dd_db::models::{Question, QuestionKind};
use regex::Regex;
use serde_json::Value;

use super::AssistantError;

static SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s_]+").expect("valid separator pattern"));

/// Question type as named by the generator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KindTag {
    MultipleChoice,
    FillInBlank,
    FreeResponse,
}

/// Parse a generator response into questions.
///
/// Accepts a bare array or an object with a `questions` array. Question ids
/// become `<recipe_id>-<seed>-<raw id or position>`, unique within the batch.
///
/// # Errors
///
/// `AssistantError::Parse` when the payload has no question list or no entry
/// survives validation.
pub fn parse_questions(
    raw: &Value,
    recipe_id: &str,
    seed: u32,
) -> Result<Vec<Question>, AssistantError> {
    let entries = match raw {
        Value::Array(entries) => entries,
        Value::Object(map) => map
            .get("questions")
            .and_then(Value::as_array)
            .ok_or_else(|| AssistantError::Parse("no question list in response".into()))?,
        _ => return Err(AssistantError::Parse("expected a JSON array".into())),
    };

    let mut seen_ids = HashSet::new();
    let mut questions = Vec::with_capacity(entries.len());

    for (index, entry) in entries.iter().enumerate() {
        let Some(mut question) = parse_entry(entry, seed) else {
            tracing::debug!(index, "Dropping malformed generated question");
            continue;
        };

        let local = text_field(entry, &["id"]).unwrap_or_else(|| (index + 1).to_string());
        question.id = unique_id(format!("{recipe_id}-{seed}-{local}"), &mut seen_ids);
        questions.push(question);
    }

    if questions.is_empty() {
        return Err(AssistantError::Parse(
            "response contained no usable questions".into(),
        ));
    }

    Ok(questions)
}

fn parse_entry(entry: &Value, seed: u32) -> Option<Question> {
    let prompt = text_field(entry, &["question", "prompt"])?;
    let correct_answer = text_field(entry, &["correctAnswer", "correct_answer", "answer"])?;

    let options = entry
        .get("options")
        .and_then(Value::as_array)
        .map(|values| clean_options(values))
        .unwrap_or_default();

    let tag = entry
        .get("type")
        .and_then(Value::as_str)
        .and_then(parse_kind)
        .unwrap_or(if options.is_empty() {
            KindTag::FillInBlank
        } else {
            KindTag::MultipleChoice
        });

    let kind = match tag {
        KindTag::MultipleChoice => {
            let options = with_correct_answer(options, &correct_answer, seed);
            if options.len() < 2 {
                QuestionKind::FillInBlank
            } else {
                QuestionKind::MultipleChoice { options }
            }
        }
        KindTag::FillInBlank => QuestionKind::FillInBlank,
        KindTag::FreeResponse => QuestionKind::FreeResponse,
    };

    Some(Question {
        id: String::new(),
        kind,
        prompt,
        correct_answer,
        hint: text_field(entry, &["hint"]),
        explanation: text_field(entry, &["explanation"]).unwrap_or_default(),
    })
}

/// Match a type name, tolerating case and separator variants.
fn parse_kind(raw: &str) -> Option<KindTag> {
    let normalized = SEPARATORS
        .replace_all(raw.trim(), "-")
        .to_lowercase();

    match normalized.as_str() {
        "multiple-choice" | "multiplechoice" | "mcq" | "choice" => Some(KindTag::MultipleChoice),
        "fill-in-blank" | "fill-in-the-blank" | "fill-blank" | "fillintheblank" | "fillinblank" => {
            Some(KindTag::FillInBlank)
        }
        "free-response" | "freeresponse" | "open" | "open-ended" => Some(KindTag::FreeResponse),
        _ => None,
    }
}

/// Trim, drop blanks and case-insensitive duplicates; first spelling wins.
fn clean_options(values: &[Value]) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .iter()
        .filter_map(scalar_text)
        .filter(|option| seen.insert(option.to_lowercase()))
        .collect()
}

/// Ensure the correct answer is offered, at a seed-dependent position.
fn with_correct_answer(mut options: Vec<String>, correct_answer: &str, seed: u32) -> Vec<String> {
    let wanted = correct_answer.to_lowercase();
    let present = options
        .iter()
        .any(|option| option.to_lowercase() == wanted);
    if !present {
        let at = seed as usize % (options.len() + 1);
        options.insert(at, correct_answer.to_string());
    }
    options
}

fn unique_id(candidate: String, seen: &mut HashSet<String>) -> String {
    if seen.insert(candidate.clone()) {
        return candidate;
    }
    let mut n = 2;
    loop {
        let id = format!("{candidate}-{n}");
        if seen.insert(id.clone()) {
            return id;
        }
        n += 1;
    }
}

/// First non-blank scalar among `keys`
fn text_field(entry: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| entry.get(*key))
        .find_map(scalar_text)
}

fn scalar_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}
