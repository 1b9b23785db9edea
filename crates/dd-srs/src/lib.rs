//! SRS (Spaced Repetition System) library for Dough Drills
//!
//! This crate provides the review scheduling ladder used for missed quiz
//! questions, and the calendar-day streak rules applied when a session completes.
//! Everything here is pure: the current time is always passed in.

pub mod streak;

use chrono::{DateTime, Duration, Utc};

/// Review interval ladder, in days.
pub const SRS_INTERVALS: [i64; 6] = [1, 3, 7, 14, 30, 90];

/// Highest valid interval index.
pub const MAX_INTERVAL_INDEX: usize = SRS_INTERVALS.len() - 1;

/// Scheduling state of one tracked question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewState {
    /// Position on the interval ladder (0..=5)
    pub interval_index: usize,
    /// When the question becomes due again
    pub next_review_date: DateTime<Utc>,
}

impl ReviewState {
    /// Build a state at `interval_index`, scheduled from `now`.
    ///
    /// Out-of-range indices are clamped onto the ladder.
    pub fn scheduled_at(interval_index: usize, now: DateTime<Utc>) -> Self {
        let interval_index = clamp_index(interval_index);
        Self {
            interval_index,
            next_review_date: now + interval_for_index(interval_index),
        }
    }

    /// Whether this question should be offered for review at `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        is_due(self.next_review_date, now)
    }
}

/// Compute the next scheduling state for a question.
///
/// # Arguments
///
/// * `existing` - Current state, or `None` if the question is not tracked yet
/// * `is_correct` - Whether the latest answer was correct
/// * `now` - Evaluation time
///
/// # Returns
///
/// The new state, or `None` when nothing changes (a first-time correct answer
/// is not tracked).
///
/// # Algorithm
///
/// * Incorrect: back to index 0, due in 1 day, whether tracked or not
/// * Correct and tracked: index advances by one, capped at the top of the ladder
/// * Correct and untracked: no entry
pub fn next_review_state(
    existing: Option<&ReviewState>,
    is_correct: bool,
    now: DateTime<Utc>,
) -> Option<ReviewState> {
    match (existing, is_correct) {
        (_, false) => Some(ReviewState::scheduled_at(0, now)),
        (Some(state), true) => Some(ReviewState::scheduled_at(
            (state.interval_index + 1).min(MAX_INTERVAL_INDEX),
            now,
        )),
        (None, true) => None,
    }
}

/// Get the interval for a ladder position.
///
/// # Arguments
///
/// * `interval_index` - Ladder position; values past the top use the top interval
///
/// # Returns
///
/// The interval as a `Duration`
pub fn interval_for_index(interval_index: usize) -> Duration {
    Duration::days(SRS_INTERVALS[clamp_index(interval_index)])
}

/// An item is due once its review date is reached.
pub fn is_due(next_review_date: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    next_review_date <= now
}

/// Clamp an index onto the ladder.
pub fn clamp_index(interval_index: usize) -> usize {
    interval_index.min(MAX_INTERVAL_INDEX)
}
