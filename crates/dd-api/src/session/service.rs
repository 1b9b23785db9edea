//! Session orchestration: question loading, grading through the assistant,
//! and handing finished sessions to the aggregator.
//!
//! Lock order is always session slot first, then stats.

use std::sync::{Arc, Weak};

use dd_db::{
    catalog,
    models::{Challenge, Difficulty, Question, UserStats},
};
use rand::{Rng, seq::SliceRandom};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::{
    ChallengeSession, Countdown, DrillSession, Phase, Session, SessionError, SessionKind,
    SessionSlot, Summary,
    challenge::{ChallengeResult, ChallengeStep},
    drill::{DrillItem, DrillMode},
    model::{SessionView, StartQuizRequest},
};
use crate::{ApiState, error::ApiError, metrics, progress::aggregator};

/// Questions drawn from each challenge recipe
pub const QUESTIONS_PER_RECIPE: usize = 3;

/// Challenges always use this level
const CHALLENGE_DIFFICULTY: Difficulty = Difficulty::Intermediate;

fn fresh_seed() -> u32 {
    rand::thread_rng().gen_range(0..1_000_000)
}

/// Start a recipe quiz. Without a recipe id a random recipe is drilled at the
/// preferred difficulty. The chosen difficulty becomes the preferred one.
pub async fn start_quiz(state: &ApiState, request: StartQuizRequest) -> Result<SessionView, ApiError> {
    let (recipe, difficulty) = {
        let mut container = state.stats.lock().await;
        let stats = container.stats();

        let recipe = match request.recipe_id.as_deref() {
            Some(id) => catalog::find_recipe(stats, id)
                .ok_or_else(|| ApiError::NotFound(format!("Recipe {id} not found")))?,
            None => catalog::all_recipes(stats)
                .choose(&mut rand::thread_rng())
                .cloned()
                .ok_or_else(|| ApiError::NotFound("No recipes available".to_string()))?,
        };
        let difficulty = request.difficulty.unwrap_or(stats.preferred_difficulty);

        if difficulty != stats.preferred_difficulty {
            container.apply(|stats| UserStats {
                preferred_difficulty: difficulty,
                ..stats.clone()
            });
        }
        (recipe, difficulty)
    };

    let questions = state
        .assistant
        .generate_quiz(&recipe, difficulty, fresh_seed(), state.quiz_length)
        .await;

    let items = questions
        .into_iter()
        .map(|question| DrillItem::for_recipe(question, &recipe))
        .collect();

    tracing::info!(recipe_id = %recipe.id, %difficulty, "Starting quiz");
    let mut drill = DrillSession::quiz(recipe, difficulty);
    drill.start(items)?;
    register_drill(state, drill).await
}

/// Start a review of every due item. An empty queue completes at once
/// without touching progress.
pub async fn start_review(state: &ApiState) -> Result<SessionView, ApiError> {
    let now = state.now();
    let items: Vec<DrillItem> = {
        let container = state.stats.lock().await;
        container
            .stats()
            .due_items(now)
            .into_iter()
            .map(DrillItem::from)
            .collect()
    };

    tracing::info!(due = items.len(), "Starting review");
    let mut drill = DrillSession::review();
    drill.start(items)?;
    register_drill(state, drill).await
}

/// Start a timed challenge and its countdown.
pub async fn start_challenge(state: &ApiState, challenge_id: &str) -> Result<SessionView, ApiError> {
    let challenge = catalog::challenge(challenge_id)
        .cloned()
        .ok_or_else(|| ApiError::NotFound(format!("Challenge {challenge_id} not found")))?;

    let questions = assemble_challenge(state, &challenge).await;
    if questions.is_empty() {
        return Err(ApiError::Validation(format!(
            "Challenge {challenge_id} has no questions"
        )));
    }

    let time_limit = challenge.time_limit;
    let session = ChallengeSession::new(challenge, questions);
    let (id, slot) = state.sessions.insert(Session::Challenge(session)).await;

    let expiry_state = state.clone();
    let weak = Arc::downgrade(&slot);
    let countdown = Countdown::start(time_limit, move || async move {
        expire_challenge(expiry_state, weak).await;
    });

    let mut session = slot.lock().await;
    if let Session::Challenge(challenge) = &mut *session {
        challenge.attach_countdown(countdown);
    }

    tracing::info!(session_id = %id, %challenge_id, time_limit, "Challenge started");
    Ok(SessionView::of(id, &session))
}

/// Current view of a session
pub async fn view(state: &ApiState, id: Uuid) -> Result<SessionView, ApiError> {
    let slot = session_slot(state, id).await?;
    let session = slot.lock().await;
    Ok(SessionView::of(id, &session))
}

/// Answer the open question.
///
/// Grading runs on its own task so an abandoned request cannot strand the
/// session mid-evaluation. A second answer while one is pending is rejected.
pub async fn submit_answer(state: &ApiState, id: Uuid, answer: String) -> Result<SessionView, ApiError> {
    let slot = session_slot(state, id).await?;
    let guard = Arc::clone(&slot)
        .try_lock_owned()
        .map_err(|_| SessionError::Evaluating)?;

    let task_state = state.clone();
    let task = tokio::spawn(async move { answer_locked(&task_state, id, guard, answer).await });

    match task.await {
        Ok(result) => result,
        Err(e) => {
            if let Session::Drill(drill) = &mut *slot.lock().await {
                drill.cancel_evaluation();
            }
            Err(ApiError::Internal(anyhow::anyhow!("Answer task failed: {e}")))
        }
    }
}

async fn answer_locked(
    state: &ApiState,
    id: Uuid,
    mut guard: OwnedMutexGuard<Session>,
    answer: String,
) -> Result<SessionView, ApiError> {
    match &mut *guard {
        Session::Drill(drill) => {
            let submission = drill.begin_answer(&answer)?;
            let evaluation = match submission.local {
                Some(evaluation) => evaluation,
                None => {
                    state
                        .assistant
                        .evaluate_free_response(
                            &submission.answer,
                            &submission.question.correct_answer,
                            &submission.question.prompt,
                        )
                        .await
                }
            };
            drill.record_answer(evaluation)?;

            if drill.wants_insight() {
                let insight = state
                    .assistant
                    .explain_mistake(&submission.question, &submission.answer)
                    .await;
                drill.attach_insight(insight)?;
            }
            Ok(drill.view(id))
        }
        Session::Challenge(challenge) => match challenge.answer(&answer)? {
            ChallengeStep::Next(_) => Ok(challenge.view(id)),
            ChallengeStep::Finished(feedback, result) => {
                let definition = challenge.challenge().clone();
                let summary = finish_challenge(state, &definition, result).await;
                *guard = Session::Finished(summary.clone());

                let mut view = SessionView::finished(id, summary);
                view.feedback = Some(feedback);
                Ok(view)
            }
        },
        Session::Finished(_) => Err(SessionError::AlreadyEmitted.into()),
    }
}

/// Move to the next question; the last step records the session.
pub async fn advance(state: &ApiState, id: Uuid) -> Result<SessionView, ApiError> {
    let slot = session_slot(state, id).await?;
    let guard = slot
        .try_lock_owned()
        .map_err(|_| SessionError::Evaluating)?;

    let task_state = state.clone();
    tokio::spawn(async move { advance_locked(&task_state, id, guard).await })
        .await
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("Advance task failed: {e}")))?
}

async fn advance_locked(
    state: &ApiState,
    id: Uuid,
    mut guard: OwnedMutexGuard<Session>,
) -> Result<SessionView, ApiError> {
    match &mut *guard {
        Session::Drill(drill) => {
            if drill.advance()? != Phase::Complete {
                return Ok(drill.view(id));
            }
            let summary = finish_drill(state, drill).await?;
            *guard = Session::Finished(summary.clone());
            Ok(SessionView::finished(id, summary))
        }
        // Challenges move on as soon as an answer is graded
        Session::Challenge(challenge) => Ok(challenge.view(id)),
        Session::Finished(summary) => Ok(SessionView::finished(id, summary.clone())),
    }
}

/// Leave a session. Unrecorded outcomes are discarded and the clock stopped.
pub async fn exit(state: &ApiState, id: Uuid) -> Result<(), ApiError> {
    let slot = state
        .sessions
        .remove(id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Session {id} not found")))?;

    // Waits for a pending evaluation
    let mut session = slot.lock().await;
    let kind = session.kind();
    match &mut *session {
        Session::Drill(drill) => drill.exit()?,
        Session::Challenge(challenge) => challenge.exit()?,
        Session::Finished(_) => return Ok(()),
    }

    metrics::record_session_exited(kind);
    tracing::info!(session_id = %id, kind = kind.as_str(), "Session exited");
    Ok(())
}

async fn session_slot(state: &ApiState, id: Uuid) -> Result<SessionSlot, ApiError> {
    state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Session {id} not found")))
}

/// Register a drill. One that starts complete had nothing to answer and
/// leaves streak and activity as they were.
async fn register_drill(state: &ApiState, drill: DrillSession) -> Result<SessionView, ApiError> {
    if drill.phase() == Phase::Complete {
        let streak = state.stats.lock().await.stats().streak;
        let summary = Summary::empty(drill.kind(), streak);
        tracing::info!(kind = drill.kind().as_str(), "Nothing to answer, session closed");
        let (id, _) = state
            .sessions
            .insert(Session::Finished(summary.clone()))
            .await;
        return Ok(SessionView::finished(id, summary));
    }

    let (id, slot) = state.sessions.insert(Session::Drill(drill)).await;
    let session = slot.lock().await;
    Ok(SessionView::of(id, &session))
}

/// Emit the drill's outcomes into the stats.
async fn finish_drill(state: &ApiState, drill: &mut DrillSession) -> Result<Summary, ApiError> {
    let outcomes = drill.take_outcomes()?;
    let kind = drill.kind();
    let now = state.now();

    let completion = {
        let mut container = state.stats.lock().await;
        match drill.mode() {
            DrillMode::Quiz { recipe, difficulty } => container.complete(|stats, tz| {
                aggregator::complete_quiz(stats, recipe, *difficulty, &outcomes, now, tz)
            }),
            DrillMode::Review => container.complete(|stats, tz| {
                aggregator::complete_review(stats, &outcomes, now, tz)
            }),
        }
    };

    metrics::record_session_completed(kind, completion.points_earned);
    tracing::info!(
        kind = kind.as_str(),
        answered = outcomes.len(),
        points = completion.points_earned,
        streak = completion.stats.streak,
        "Session completed"
    );
    Ok(Summary::new(kind, &outcomes, drill.total(), &completion))
}

async fn finish_challenge(state: &ApiState, challenge: &Challenge, result: ChallengeResult) -> Summary {
    let now = state.now();
    let completion = state.stats.lock().await.complete(|stats, tz| {
        aggregator::complete_challenge(
            stats,
            challenge,
            result.correct(),
            result.time_bonus,
            now,
            tz,
        )
    });

    metrics::record_session_completed(SessionKind::Challenge, completion.points_earned);
    tracing::info!(
        challenge_id = %challenge.id,
        correct = result.correct(),
        time_bonus = result.time_bonus,
        timed_out = result.timed_out,
        points = completion.points_earned,
        "Challenge completed"
    );

    let mut summary = Summary::new(SessionKind::Challenge, &result.outcomes, result.total, &completion);
    summary.time_bonus = Some(result.time_bonus);
    summary.timed_out = result.timed_out;
    summary
}

/// Countdown expiry: record the partial score with no time bonus.
async fn expire_challenge(state: ApiState, slot: Weak<Mutex<Session>>) {
    let Some(slot) = slot.upgrade() else {
        return;
    };
    let mut session = slot.lock().await;

    let Session::Challenge(challenge) = &mut *session else {
        return;
    };
    let Some(result) = challenge.expire() else {
        return;
    };
    let definition = challenge.challenge().clone();

    let summary = finish_challenge(&state, &definition, result).await;
    *session = Session::Finished(summary);
}

/// First questions of each challenge recipe, shuffled.
async fn assemble_challenge(state: &ApiState, challenge: &Challenge) -> Vec<Question> {
    let mut questions = Vec::new();

    for recipe_id in &challenge.recipes {
        let Some(recipe) = catalog::builtin_recipe(recipe_id) else {
            tracing::warn!(challenge_id = %challenge.id, %recipe_id, "Challenge recipe missing from catalog");
            continue;
        };

        let generated = state
            .assistant
            .generate_quiz(recipe, CHALLENGE_DIFFICULTY, fresh_seed(), state.quiz_length)
            .await;
        questions.extend(generated.into_iter().take(QUESTIONS_PER_RECIPE));
    }

    questions.shuffle(&mut rand::thread_rng());
    questions
}
