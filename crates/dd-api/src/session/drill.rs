//! Untimed quiz and review sessions.

use dd_db::models::{Difficulty, Question, QuestionKind, QuizOutcome, Recipe, SrsItem};
use uuid::Uuid;

use super::{
    Phase, SessionError, SessionKind,
    grading,
    model::{FeedbackView, QuestionView, SessionView},
};
use crate::assistant::Evaluation;

/// What a drill is about
#[derive(Debug, Clone)]
pub enum DrillMode {
    /// Questions generated for one recipe
    Quiz {
        recipe: Recipe,
        difficulty: Difficulty,
    },
    /// Due review items, each under its own recipe
    Review,
}

/// Question with the recipe it is asked under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrillItem {
    pub question: Question,
    pub recipe_id: String,
    pub recipe_name: String,
}

impl DrillItem {
    /// Ask `question` under `recipe`
    pub fn for_recipe(question: Question, recipe: &Recipe) -> Self {
        Self {
            question,
            recipe_id: recipe.id.clone(),
            recipe_name: recipe.name.clone(),
        }
    }
}

impl From<&SrsItem> for DrillItem {
    fn from(item: &SrsItem) -> Self {
        Self {
            question: item.question.clone(),
            recipe_id: item.recipe_id.clone(),
            recipe_name: item.recipe_name.clone(),
        }
    }
}

/// Answer accepted for grading
#[derive(Debug, Clone)]
pub struct Submission {
    pub question: Question,
    pub answer: String,
    /// Local verdict; `None` when the evaluation service must decide
    pub local: Option<Evaluation>,
}

/// Untimed run through a list of questions
#[derive(Debug)]
pub struct DrillSession {
    mode: DrillMode,
    items: Vec<DrillItem>,
    current: usize,
    phase: Phase,
    outcomes: Vec<QuizOutcome>,
    feedback: Option<FeedbackView>,
}

impl DrillSession {
    /// Quiz on one recipe, awaiting its questions
    pub fn quiz(recipe: Recipe, difficulty: Difficulty) -> Self {
        Self::loading(DrillMode::Quiz { recipe, difficulty })
    }

    /// Review of due items, awaiting its questions
    pub fn review() -> Self {
        Self::loading(DrillMode::Review)
    }

    fn loading(mode: DrillMode) -> Self {
        Self {
            mode,
            items: Vec::new(),
            current: 0,
            phase: Phase::Loading,
            outcomes: Vec::new(),
            feedback: None,
        }
    }

    /// Hand over the questions. An empty list completes the session at once.
    pub fn start(&mut self, items: Vec<DrillItem>) -> Result<Phase, SessionError> {
        if self.phase != Phase::Loading {
            return Err(SessionError::NotActive);
        }
        self.phase = if items.is_empty() {
            Phase::Complete
        } else {
            Phase::Active
        };
        self.items = items;
        Ok(self.phase)
    }

    /// Quiz or review
    pub const fn kind(&self) -> SessionKind {
        match self.mode {
            DrillMode::Quiz { .. } => SessionKind::Quiz,
            DrillMode::Review => SessionKind::Review,
        }
    }

    /// Recipe and difficulty of a quiz
    pub const fn mode(&self) -> &DrillMode {
        &self.mode
    }

    /// Current lifecycle phase
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Number of questions
    pub fn total(&self) -> usize {
        self.items.len()
    }

    /// Question being asked, if any
    pub fn current_item(&self) -> Option<&DrillItem> {
        self.items.get(self.current)
    }

    /// Graded answers so far
    pub fn outcomes(&self) -> &[QuizOutcome] {
        &self.outcomes
    }

    /// Grading result of the answered question
    pub const fn feedback(&self) -> Option<&FeedbackView> {
        self.feedback.as_ref()
    }

    /// Accept an answer for the current question and move to `Evaluating`.
    ///
    /// Multiple-choice and fill-in-blank answers are graded on the spot.
    pub fn begin_answer(&mut self, answer: &str) -> Result<Submission, SessionError> {
        match self.phase {
            Phase::Active => {}
            Phase::Evaluating => return Err(SessionError::Evaluating),
            Phase::Answered => return Err(SessionError::AlreadyAnswered),
            Phase::Emitted => return Err(SessionError::AlreadyEmitted),
            Phase::Loading | Phase::Complete | Phase::Exited => {
                return Err(SessionError::NotActive);
            }
        }

        let answer = answer.trim();
        if answer.is_empty() {
            return Err(SessionError::EmptyAnswer);
        }

        let question = self
            .current_item()
            .map(|item| item.question.clone())
            .ok_or(SessionError::NotActive)?;

        let local = match question.kind {
            QuestionKind::FreeResponse => None,
            QuestionKind::MultipleChoice { .. } | QuestionKind::FillInBlank => {
                Some(grading::grade_locally(&question, answer))
            }
        };

        self.phase = Phase::Evaluating;
        Ok(Submission {
            question,
            answer: answer.to_string(),
            local,
        })
    }

    /// Record the verdict for the pending answer.
    pub fn record_answer(&mut self, evaluation: Evaluation) -> Result<&FeedbackView, SessionError> {
        if self.phase != Phase::Evaluating {
            return Err(SessionError::NotActive);
        }
        let question = self
            .current_item()
            .map(|item| item.question.clone())
            .ok_or(SessionError::NotActive)?;

        self.outcomes.push(QuizOutcome {
            question: question.clone(),
            is_correct: evaluation.is_correct,
        });
        self.phase = Phase::Answered;
        Ok(self.feedback.insert(FeedbackView::new(&question, evaluation)))
    }

    /// Return to `Active` when grading was abandoned.
    pub fn cancel_evaluation(&mut self) {
        if self.phase == Phase::Evaluating {
            self.phase = Phase::Active;
        }
    }

    /// Review misses get a detailed explanation
    pub fn wants_insight(&self) -> bool {
        matches!(self.mode, DrillMode::Review)
            && self.phase == Phase::Answered
            && self.feedback.as_ref().is_some_and(|f| !f.is_correct)
    }

    /// Add a detailed explanation to the last feedback
    pub fn attach_insight(&mut self, insight: String) -> Result<(), SessionError> {
        match (self.phase, self.feedback.as_mut()) {
            (Phase::Answered, Some(feedback)) => {
                feedback.insight = Some(insight);
                Ok(())
            }
            _ => Err(SessionError::NotAnswered),
        }
    }

    /// Move past the answered question; `Complete` after the last one.
    pub fn advance(&mut self) -> Result<Phase, SessionError> {
        match self.phase {
            Phase::Answered => {}
            Phase::Active => return Err(SessionError::NotAnswered),
            Phase::Evaluating => return Err(SessionError::Evaluating),
            Phase::Emitted => return Err(SessionError::AlreadyEmitted),
            Phase::Loading | Phase::Complete | Phase::Exited => {
                return Err(SessionError::NotActive);
            }
        }

        self.feedback = None;
        if self.current + 1 < self.items.len() {
            self.current += 1;
            self.phase = Phase::Active;
        } else {
            self.phase = Phase::Complete;
        }
        Ok(self.phase)
    }

    /// Hand the outcomes to the aggregator. Succeeds once.
    pub fn take_outcomes(&mut self) -> Result<Vec<QuizOutcome>, SessionError> {
        match self.phase {
            Phase::Complete => {
                self.phase = Phase::Emitted;
                Ok(std::mem::take(&mut self.outcomes))
            }
            Phase::Emitted => Err(SessionError::AlreadyEmitted),
            _ => Err(SessionError::NotActive),
        }
    }

    /// Abandon the session; outcomes are discarded.
    pub fn exit(&mut self) -> Result<(), SessionError> {
        match self.phase {
            Phase::Emitted => Err(SessionError::AlreadyEmitted),
            Phase::Exited => Err(SessionError::NotActive),
            _ => {
                self.outcomes.clear();
                self.feedback = None;
                self.phase = Phase::Exited;
                Ok(())
            }
        }
    }

    /// Client view under `id`
    pub fn view(&self, id: Uuid) -> SessionView {
        let (recipe_id, recipe_name, difficulty) = match &self.mode {
            DrillMode::Quiz { recipe, difficulty } => (
                Some(recipe.id.clone()),
                Some(recipe.name.clone()),
                Some(*difficulty),
            ),
            DrillMode::Review => (
                self.current_item().map(|item| item.recipe_id.clone()),
                self.current_item().map(|item| item.recipe_name.clone()),
                None,
            ),
        };

        let open = matches!(
            self.phase,
            Phase::Active | Phase::Evaluating | Phase::Answered
        );

        SessionView {
            id,
            kind: self.kind(),
            phase: self.phase,
            recipe_id,
            recipe_name,
            difficulty,
            challenge_id: None,
            position: if open { self.current + 1 } else { self.outcomes.len() },
            total: self.items.len(),
            score: self.outcomes.iter().filter(|o| o.is_correct).count(),
            question: open
                .then(|| self.current_item().map(|item| QuestionView::from(&item.question)))
                .flatten(),
            feedback: self.feedback.clone(),
            remaining_seconds: None,
            summary: None,
        }
    }
}
