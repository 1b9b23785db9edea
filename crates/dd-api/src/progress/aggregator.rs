//! Transitions that fold a finished session into user progress.
//!
//! Every function takes the prior stats by reference and returns a new value.
//! Re-applying the same outcomes counts them again; only badges are
//! idempotent.

use chrono::{DateTime, TimeZone, Utc};
use dd_db::{
    catalog::{BADGE_OVEN_OVERLORD, BADGE_SPEED_BAKER, BADGE_YEAST_MASTER},
    models::{Challenge, Difficulty, QuizOutcome, Recipe, RecipeCategory, SrsItem, UserStats},
};
use dd_srs::streak;

/// Points per correct quiz or review answer
pub const QUIZ_POINTS_PER_CORRECT: u64 = 20;

/// Points per correct challenge answer
pub const CHALLENGE_POINTS_PER_CORRECT: u64 = 50;

/// Recipe recorded for review items created without a known owner
const UNKNOWN_RECIPE_ID: &str = "unknown";
const UNKNOWN_RECIPE_NAME: &str = "Unknown Recipe";

/// Result of applying one session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// Stats after the session
    pub stats: UserStats,
    /// Points awarded, bonuses included
    pub points_earned: u64,
    /// Badges granted by this session that were not held before
    pub badges_earned: Vec<String>,
}

impl Completion {
    fn new(prior: &UserStats, stats: UserStats, points_earned: u64) -> Self {
        let badges_earned = stats
            .badges
            .difference(&prior.badges)
            .cloned()
            .collect();

        Self {
            stats,
            points_earned,
            badges_earned,
        }
    }
}

/// Flat bonus for finishing a quiz at `difficulty`
pub const fn difficulty_bonus(difficulty: Difficulty) -> u64 {
    match difficulty {
        Difficulty::Beginner => 0,
        Difficulty::Intermediate => 50,
        Difficulty::Advanced => 100,
    }
}

/// Fold a completed recipe quiz into the stats.
pub fn complete_quiz<Tz: TimeZone>(
    prior: &UserStats,
    recipe: &Recipe,
    difficulty: Difficulty,
    outcomes: &[QuizOutcome],
    now: DateTime<Utc>,
    tz: &Tz,
) -> Completion {
    let mut stats = prior.clone();

    let correct = count_correct(outcomes);
    let points = correct * QUIZ_POINTS_PER_CORRECT + difficulty_bonus(difficulty);
    stats.points = stats.points.saturating_add(points);

    for outcome in outcomes {
        schedule(&mut stats.srs_items, outcome, &recipe.id, &recipe.name, now);
    }

    if recipe.category == RecipeCategory::Bread {
        stats.badges.insert(BADGE_YEAST_MASTER.to_string());
    }

    let flawless = !outcomes.is_empty() && outcomes.iter().all(|o| o.is_correct);
    if flawless && difficulty == Difficulty::Advanced {
        stats.badges.insert(BADGE_OVEN_OVERLORD.to_string());
    }

    record_activity(&mut stats, now, tz);
    stats.last_completed_recipe_id = Some(recipe.id.clone());

    Completion::new(prior, stats, points)
}

/// Fold a completed review of due items into the stats.
///
/// Each outcome keeps the recipe of its existing review item. No points or
/// badges are awarded.
pub fn complete_review<Tz: TimeZone>(
    prior: &UserStats,
    outcomes: &[QuizOutcome],
    now: DateTime<Utc>,
    tz: &Tz,
) -> Completion {
    let mut stats = prior.clone();

    for outcome in outcomes {
        let (recipe_id, recipe_name) = stats
            .srs_item(&outcome.question.id)
            .map(|item| (item.recipe_id.clone(), item.recipe_name.clone()))
            .unwrap_or_else(|| (UNKNOWN_RECIPE_ID.to_string(), UNKNOWN_RECIPE_NAME.to_string()));

        schedule(&mut stats.srs_items, outcome, &recipe_id, &recipe_name, now);
    }

    record_activity(&mut stats, now, tz);

    Completion::new(prior, stats, 0)
}

/// Fold a finished timed challenge into the stats.
///
/// `time_bonus` is computed by the caller from the remaining time and is zero
/// when the clock ran out.
pub fn complete_challenge<Tz: TimeZone>(
    prior: &UserStats,
    challenge: &Challenge,
    correct: usize,
    time_bonus: u64,
    now: DateTime<Utc>,
    tz: &Tz,
) -> Completion {
    let mut stats = prior.clone();

    let points = correct as u64 * CHALLENGE_POINTS_PER_CORRECT + time_bonus + challenge.bonus_points;
    stats.points = stats.points.saturating_add(points);
    stats.badges.insert(BADGE_SPEED_BAKER.to_string());
    stats.best_challenge_score = stats.best_challenge_score.max(points);

    record_activity(&mut stats, now, tz);

    Completion::new(prior, stats, points)
}

fn count_correct(outcomes: &[QuizOutcome]) -> u64 {
    outcomes.iter().filter(|o| o.is_correct).count() as u64
}

fn record_activity<Tz: TimeZone>(stats: &mut UserStats, now: DateTime<Utc>, tz: &Tz) {
    let update = streak::record_activity(stats.streak, stats.last_activity_date, now, tz);
    stats.streak = update.streak;
    stats.last_activity_date = Some(update.last_activity_date);
}

/// Apply one answer to the review queue.
///
/// Incorrect answers (re)start the item and refresh its content and owner.
/// Correct answers only advance items that already exist.
fn schedule(
    items: &mut Vec<SrsItem>,
    outcome: &QuizOutcome,
    recipe_id: &str,
    recipe_name: &str,
    now: DateTime<Utc>,
) {
    let position = items
        .iter()
        .position(|item| item.question.id == outcome.question.id);
    let existing = position.map(|i| items[i].review_state());

    let Some(next) = dd_srs::next_review_state(existing.as_ref(), outcome.is_correct, now) else {
        return;
    };

    match position {
        Some(i) => {
            let item = &mut items[i];
            item.set_review_state(next);
            if !outcome.is_correct {
                item.question = outcome.question.clone();
                item.recipe_id = recipe_id.to_string();
                item.recipe_name = recipe_name.to_string();
            }
        }
        None => items.push(SrsItem {
            question: outcome.question.clone(),
            recipe_id: recipe_id.to_string(),
            recipe_name: recipe_name.to_string(),
            interval_index: next.interval_index,
            next_review_date: next.next_review_date,
        }),
    }
}
