use dd_db::models::{Difficulty, Question, QuizOutcome};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Phase, Session, SessionKind};
use crate::{assistant::Evaluation, progress::aggregator::Completion};

/// Question as shown while it is open; the answer is withheld
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub question: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl From<&Question> for QuestionView {
    fn from(question: &Question) -> Self {
        Self {
            id: question.id.clone(),
            kind: question.kind.label(),
            question: question.prompt.clone(),
            options: question.options().to_vec(),
            hint: question.hint.clone(),
        }
    }
}

/// Grading result for the last answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackView {
    pub is_correct: bool,
    pub feedback: String,
    pub correct_answer: String,
    pub explanation: String,
    /// Detailed explanation of a missed review question
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insight: Option<String>,
}

impl FeedbackView {
    pub fn new(question: &Question, evaluation: Evaluation) -> Self {
        Self {
            is_correct: evaluation.is_correct,
            feedback: evaluation.feedback,
            correct_answer: question.correct_answer.clone(),
            explanation: question.explanation.clone(),
            insight: None,
        }
    }
}

/// End-of-session report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub kind: SessionKind,
    pub correct: usize,
    pub total: usize,
    /// Points actually awarded, bonuses included
    pub points_earned: u64,
    /// Prompts of the questions answered incorrectly
    pub missed: Vec<String>,
    pub badges_earned: Vec<String>,
    pub streak: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_bonus: Option<u64>,
    /// Challenge ended by the clock
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub timed_out: bool,
}

impl Summary {
    pub fn new(kind: SessionKind, outcomes: &[QuizOutcome], total: usize, completion: &Completion) -> Self {
        Self {
            kind,
            correct: outcomes.iter().filter(|o| o.is_correct).count(),
            total,
            points_earned: completion.points_earned,
            missed: outcomes
                .iter()
                .filter(|o| !o.is_correct)
                .map(|o| o.question.prompt.clone())
                .collect(),
            badges_earned: completion.badges_earned.clone(),
            streak: completion.stats.streak,
            time_bonus: None,
            timed_out: false,
        }
    }

    /// Report for a session with nothing to answer; progress is unchanged
    pub fn empty(kind: SessionKind, streak: u32) -> Self {
        Self {
            kind,
            correct: 0,
            total: 0,
            points_earned: 0,
            missed: Vec::new(),
            badges_earned: Vec::new(),
            streak,
            time_bonus: None,
            timed_out: false,
        }
    }
}

/// Current state of a session as served to the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub id: Uuid,
    pub kind: SessionKind,
    pub phase: Phase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipe_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipe_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub challenge_id: Option<String>,
    /// 1-based index of the current question
    pub position: usize,
    pub total: usize,
    /// Correct answers so far
    pub score: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<QuestionView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<FeedbackView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_seconds: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<Summary>,
}

impl SessionView {
    pub fn of(id: Uuid, session: &Session) -> Self {
        match session {
            Session::Drill(drill) => drill.view(id),
            Session::Challenge(challenge) => challenge.view(id),
            Session::Finished(summary) => Self::finished(id, summary.clone()),
        }
    }

    pub fn finished(id: Uuid, summary: Summary) -> Self {
        Self {
            id,
            kind: summary.kind,
            phase: Phase::Complete,
            recipe_id: None,
            recipe_name: None,
            difficulty: None,
            challenge_id: None,
            position: summary.total,
            total: summary.total,
            score: summary.correct,
            question: None,
            feedback: None,
            remaining_seconds: None,
            summary: Some(summary),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartQuizRequest {
    /// Omitted for a random drill
    pub recipe_id: Option<String>,
    pub difficulty: Option<Difficulty>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartChallengeRequest {
    pub challenge_id: String,
}

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub answer: String,
}
