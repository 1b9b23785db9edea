use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, Utc};
use dd_srs::ReviewState;
use serde::{Deserialize, Serialize};

/// Quiz difficulty, also used as the user's preferred level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    /// All levels, easiest first
    pub const ALL: [Self; 3] = [Self::Beginner, Self::Intermediate, Self::Advanced];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Beginner => "Beginner",
            Self::Intermediate => "Intermediate",
            Self::Advanced => "Advanced",
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recipe category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecipeCategory {
    Bread,
    Cakes,
    Cookies,
    Pastries,
    Pies,
}

impl RecipeCategory {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bread => "Bread",
            Self::Cakes => "Cakes",
            Self::Cookies => "Cookies",
            Self::Pastries => "Pastries",
            Self::Pies => "Pies",
        }
    }
}

/// Recipe ingredient line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub unit: String,
    /// What the ingredient does in the bake (e.g. "Leavening")
    #[serde(default)]
    pub importance: String,
}

/// Recipe method step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// 1-based position
    pub id: u32,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Recipe model - built-in catalog entry or user-authored recipe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    /// Unique recipe identifier (user recipes are prefixed with `user-`)
    pub id: String,
    pub name: String,
    pub category: RecipeCategory,
    pub difficulty: Difficulty,
    pub description: String,
    pub ingredients: Vec<Ingredient>,
    pub steps: Vec<Step>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bake_temp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bake_time: Option<String>,
    /// Only user-authored recipes can be deleted
    #[serde(default)]
    pub is_user_created: bool,
}

/// Question variant, with the data only that variant carries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum QuestionKind {
    /// Pick one of `options`; always contains the correct answer
    MultipleChoice {
        #[serde(default)]
        options: Vec<String>,
    },
    /// Short typed answer, graded by exact match
    FillInBlank,
    /// Open answer, graded by the evaluation service
    FreeResponse,
}

impl QuestionKind {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::MultipleChoice { .. } => "multiple-choice",
            Self::FillInBlank => "fill-in-blank",
            Self::FreeResponse => "free-response",
        }
    }
}

/// Quiz question. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Unique question identifier, also the SRS queue key
    pub id: String,
    #[serde(flatten)]
    pub kind: QuestionKind,
    /// Prompt text
    #[serde(rename = "question")]
    pub prompt: String,
    pub correct_answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(default)]
    pub explanation: String,
}

impl Question {
    /// Options to display, empty for typed answers
    pub fn options(&self) -> &[String] {
        match &self.kind {
            QuestionKind::MultipleChoice { options } => options,
            _ => &[],
        }
    }
}

/// Correctness of one answered question within a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizOutcome {
    pub question: Question,
    pub is_correct: bool,
}

/// Review queue entry, unique per question id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SrsItem {
    pub question: Question,
    /// Recipe the question was last answered under
    pub recipe_id: String,
    pub recipe_name: String,
    /// Position on the interval ladder
    pub interval_index: usize,
    pub next_review_date: DateTime<Utc>,
}

impl SrsItem {
    pub fn review_state(&self) -> ReviewState {
        ReviewState {
            interval_index: self.interval_index,
            next_review_date: self.next_review_date,
        }
    }

    pub fn set_review_state(&mut self, state: ReviewState) {
        self.interval_index = state.interval_index;
        self.next_review_date = state.next_review_date;
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        dd_srs::is_due(self.next_review_date, now)
    }
}

/// Timed challenge definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Challenge {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Recipe ids the questions are drawn from
    pub recipes: Vec<String>,
    /// Countdown length in seconds
    pub time_limit: u32,
    pub bonus_points: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// Badge catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Badge {
    pub id: &'static str,
    pub name: &'static str,
    pub icon: &'static str,
    pub description: &'static str,
}

/// User progress - the single persisted aggregate.
///
/// Missing fields in stored data fall back to their defaults, which is how
/// older saves are migrated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserStats {
    pub points: u64,
    /// Consecutive calendar days with a completed session
    pub streak: u32,
    /// Earned badge ids
    pub badges: BTreeSet<String>,
    #[serde(rename = "lastCompletedRecipe", skip_serializing_if = "Option::is_none")]
    pub last_completed_recipe_id: Option<String>,
    pub preferred_difficulty: Difficulty,
    pub srs_items: Vec<SrsItem>,
    pub user_recipes: Vec<Recipe>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_activity_date: Option<DateTime<Utc>>,
    pub best_challenge_score: u64,
}

impl UserStats {
    /// Look up the review entry for a question
    pub fn srs_item(&self, question_id: &str) -> Option<&SrsItem> {
        self.srs_items.iter().find(|item| item.question.id == question_id)
    }

    /// Review entries due at `now`, in queue order
    pub fn due_items(&self, now: DateTime<Utc>) -> Vec<&SrsItem> {
        self.srs_items.iter().filter(|item| item.is_due(now)).collect()
    }

    pub fn has_badge(&self, badge_id: &str) -> bool {
        self.badges.contains(badge_id)
    }

    /// Restore queue invariants on loaded data.
    ///
    /// Clamps interval indices onto the ladder and drops later duplicates of a
    /// question id. Returns `true` when anything changed.
    pub fn repair(&mut self) -> bool {
        let mut changed = false;

        for item in &mut self.srs_items {
            let clamped = dd_srs::clamp_index(item.interval_index);
            if clamped != item.interval_index {
                item.interval_index = clamped;
                changed = true;
            }
        }

        let before = self.srs_items.len();
        let mut seen = HashSet::new();
        self.srs_items
            .retain(|item| seen.insert(item.question.id.clone()));
        changed |= self.srs_items.len() != before;

        changed
    }
}
