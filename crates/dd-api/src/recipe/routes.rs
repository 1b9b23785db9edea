use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use dd_db::{catalog, models::Recipe};

use super::model::{self, NewRecipe};
use crate::{ApiState, error::ApiError};

/// Create the recipe routes
pub fn routes() -> Router<ApiState> {
    Router::new()
        .route("/recipes", get(get_all_recipes).post(create_recipe))
        .route("/recipes/{id}", get(get_recipe_by_id).delete(delete_recipe))
}

/// Built-in recipes followed by the user's own
async fn get_all_recipes(State(state): State<ApiState>) -> Json<Vec<Recipe>> {
    let container = state.stats.lock().await;
    Json(catalog::all_recipes(container.stats()))
}

async fn get_recipe_by_id(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<Recipe>, ApiError> {
    let container = state.stats.lock().await;
    catalog::find_recipe(container.stats(), &id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Recipe {id} not found")))
}

async fn create_recipe(
    State(state): State<ApiState>,
    Json(payload): Json<NewRecipe>,
) -> Result<(StatusCode, Json<Recipe>), ApiError> {
    let now = state.now();
    let mut container = state.stats.lock().await;

    let id = model::next_recipe_id(container.stats(), now);
    let recipe = payload.into_recipe(id)?;
    container.apply(|stats| model::add_user_recipe(stats, recipe.clone()));

    tracing::info!(recipe_id = %recipe.id, "User recipe created");
    Ok((StatusCode::CREATED, Json(recipe)))
}

async fn delete_recipe(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let mut container = state.stats.lock().await;
    container.try_apply(|stats| model::remove_user_recipe(stats, &id))?;

    tracing::info!(recipe_id = %id, "User recipe deleted");
    Ok(StatusCode::NO_CONTENT)
}
