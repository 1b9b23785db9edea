//! Timed challenge sessions.

use dd_db::models::{Challenge, Question, QuizOutcome};
use uuid::Uuid;

use super::{
    Countdown, Phase, SessionError, SessionKind,
    grading,
    model::{FeedbackView, QuestionView, SessionView},
};

/// Bonus points per second left on the clock
pub const TIME_BONUS_PER_SECOND: u64 = 2;

/// Final tally handed to the aggregator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeResult {
    pub outcomes: Vec<QuizOutcome>,
    pub total: usize,
    pub time_bonus: u64,
    pub timed_out: bool,
}

impl ChallengeResult {
    pub fn correct(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_correct).count()
    }
}

/// What an answer led to
#[derive(Debug)]
pub enum ChallengeStep {
    /// Graded; the next question is open
    Next(FeedbackView),
    /// Last question answered in time
    Finished(FeedbackView, ChallengeResult),
}

#[derive(Debug)]
pub struct ChallengeSession {
    challenge: Challenge,
    questions: Vec<Question>,
    current: usize,
    phase: Phase,
    outcomes: Vec<QuizOutcome>,
    last_feedback: Option<FeedbackView>,
    countdown: Option<Countdown>,
}

pub fn time_bonus(remaining_seconds: u32) -> u64 {
    u64::from(remaining_seconds) * TIME_BONUS_PER_SECOND
}

impl ChallengeSession {
    /// Open a challenge over already assembled questions.
    pub fn new(challenge: Challenge, questions: Vec<Question>) -> Self {
        Self {
            challenge,
            questions,
            current: 0,
            phase: Phase::Active,
            outcomes: Vec::new(),
            last_feedback: None,
            countdown: None,
        }
    }

    /// Attach the running clock; it is cancelled on every way out.
    pub fn attach_countdown(&mut self, countdown: Countdown) {
        if self.phase == Phase::Active {
            self.countdown = Some(countdown);
        } else {
            countdown.cancel();
        }
    }

    pub const fn challenge(&self) -> &Challenge {
        &self.challenge
    }

    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Seconds left; the full limit before the clock starts
    pub fn remaining_seconds(&self) -> u32 {
        self.countdown
            .as_ref()
            .map_or(self.challenge.time_limit, Countdown::remaining)
    }

    fn is_time_up(&self) -> bool {
        self.countdown.as_ref().is_some_and(Countdown::is_expired)
    }

    /// Grade the answer and move on. The last answer finishes the challenge.
    pub fn answer(&mut self, answer: &str) -> Result<ChallengeStep, SessionError> {
        match self.phase {
            Phase::Active => {}
            Phase::Emitted => return Err(SessionError::AlreadyEmitted),
            _ => return Err(SessionError::NotActive),
        }
        if self.is_time_up() {
            return Err(SessionError::TimeUp);
        }

        let answer = answer.trim();
        if answer.is_empty() {
            return Err(SessionError::EmptyAnswer);
        }

        let question = self
            .questions
            .get(self.current)
            .cloned()
            .ok_or(SessionError::NotActive)?;

        let evaluation = grading::grade_locally(&question, answer);
        let feedback = FeedbackView::new(&question, evaluation);
        self.outcomes.push(QuizOutcome {
            is_correct: feedback.is_correct,
            question,
        });
        self.last_feedback = Some(feedback.clone());
        self.current += 1;

        if self.current < self.questions.len() {
            return Ok(ChallengeStep::Next(feedback));
        }

        let bonus = time_bonus(self.remaining_seconds());
        Ok(ChallengeStep::Finished(feedback, self.finish(bonus, false)))
    }

    /// Clock ran out; `None` if the challenge already ended.
    pub fn expire(&mut self) -> Option<ChallengeResult> {
        (self.phase == Phase::Active).then(|| self.finish(0, true))
    }

    /// Abandon the challenge; outcomes are discarded.
    pub fn exit(&mut self) -> Result<(), SessionError> {
        match self.phase {
            Phase::Emitted => Err(SessionError::AlreadyEmitted),
            Phase::Exited => Err(SessionError::NotActive),
            _ => {
                self.stop_clock();
                self.outcomes.clear();
                self.phase = Phase::Exited;
                Ok(())
            }
        }
    }

    fn finish(&mut self, time_bonus: u64, timed_out: bool) -> ChallengeResult {
        self.stop_clock();
        self.phase = Phase::Emitted;
        ChallengeResult {
            outcomes: std::mem::take(&mut self.outcomes),
            total: self.questions.len(),
            time_bonus,
            timed_out,
        }
    }

    fn stop_clock(&self) {
        if let Some(countdown) = &self.countdown {
            countdown.cancel();
        }
    }

    pub fn view(&self, id: Uuid) -> SessionView {
        let open = self.phase == Phase::Active;
        SessionView {
            id,
            kind: SessionKind::Challenge,
            phase: self.phase,
            recipe_id: None,
            recipe_name: None,
            difficulty: None,
            challenge_id: Some(self.challenge.id.clone()),
            position: (self.current + 1).min(self.questions.len()),
            total: self.questions.len(),
            score: self.outcomes.iter().filter(|o| o.is_correct).count(),
            question: open
                .then(|| self.questions.get(self.current).map(QuestionView::from))
                .flatten(),
            feedback: self.last_feedback.clone(),
            remaining_seconds: open.then(|| self.remaining_seconds()),
            summary: None,
        }
    }
}
