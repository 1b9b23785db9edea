use axum::{
    Json, Router,
    extract::State,
    routing::{get, put},
};
use dd_db::{
    catalog,
    models::{Badge, Challenge, Difficulty, Recipe, SrsItem, UserStats},
};
use serde::{Deserialize, Serialize};

use crate::ApiState;

pub fn routes() -> Router<ApiState> {
    Router::new()
        .route("/stats", get(get_stats))
        .route("/stats/difficulty", put(set_difficulty))
        .route("/badges", get(get_badges))
        .route("/challenges", get(get_challenges))
        .route("/reviews/due", get(get_due_reviews))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub stats: UserStats,
    pub due_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_recipe: Option<Recipe>,
    pub badges_earned: usize,
    pub badges_total: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgeView {
    #[serde(flatten)]
    pub badge: Badge,
    pub earned: bool,
}

#[derive(Debug, Deserialize)]
pub struct DifficultyRequest {
    pub difficulty: Difficulty,
}

/// Dashboard snapshot
async fn get_stats(State(state): State<ApiState>) -> Json<DashboardResponse> {
    let now = state.now();
    let container = state.stats.lock().await;
    let stats = container.stats();

    let last_recipe = stats
        .last_completed_recipe_id
        .as_deref()
        .and_then(|id| catalog::find_recipe(stats, id));

    Json(DashboardResponse {
        due_count: stats.due_items(now).len(),
        last_recipe,
        badges_earned: stats.badges.len(),
        badges_total: catalog::BADGES.len(),
        stats: stats.clone(),
    })
}

async fn set_difficulty(
    State(state): State<ApiState>,
    Json(payload): Json<DifficultyRequest>,
) -> Json<UserStats> {
    let mut container = state.stats.lock().await;
    let stats = container.apply(|stats| UserStats {
        preferred_difficulty: payload.difficulty,
        ..stats.clone()
    });

    tracing::info!(difficulty = %payload.difficulty, "Preferred difficulty updated");
    Json(stats.clone())
}

/// Badge catalog with earned flags
async fn get_badges(State(state): State<ApiState>) -> Json<Vec<BadgeView>> {
    let container = state.stats.lock().await;
    let stats = container.stats();

    let badges = catalog::BADGES
        .iter()
        .map(|badge| BadgeView {
            badge: *badge,
            earned: stats.has_badge(badge.id),
        })
        .collect();

    Json(badges)
}

async fn get_challenges() -> Json<&'static [Challenge]> {
    Json(catalog::challenges())
}

/// Review items due now
async fn get_due_reviews(State(state): State<ApiState>) -> Json<Vec<SrsItem>> {
    let now = state.now();
    let container = state.stats.lock().await;
    let due = container
        .stats()
        .due_items(now)
        .into_iter()
        .cloned()
        .collect();

    Json(due)
}
