use chrono::{DateTime, Utc};
use dd_db::{
    catalog,
    models::{Difficulty, Ingredient, Recipe, RecipeCategory, Step, UserStats},
};
use serde::Deserialize;
use validator::Validate;

use crate::error::ApiError;

/// Prefix of user-authored recipe ids
pub const USER_RECIPE_PREFIX: &str = "user-";

#[derive(Debug, Clone, Deserialize)]
pub struct NewIngredient {
    pub name: String,
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub importance: String,
}

/// Recipe submitted by the user
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewRecipe {
    #[validate(length(min = 1, max = 120, message = "Name must be 1-120 characters"))]
    pub name: String,
    pub category: RecipeCategory,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub ingredients: Vec<NewIngredient>,
    /// Step texts in order
    #[serde(default)]
    pub steps: Vec<String>,
    pub bake_temp: Option<String>,
    pub bake_time: Option<String>,
}

impl NewRecipe {
    /// Validate and build the stored recipe.
    ///
    /// Blank ingredients and steps are dropped; steps are renumbered from 1.
    pub fn into_recipe(self, id: String) -> Result<Recipe, ApiError> {
        self.validate()?;

        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(ApiError::Validation("Name cannot be blank".to_string()));
        }

        let ingredients = self
            .ingredients
            .into_iter()
            .filter(|i| !i.name.trim().is_empty())
            .map(|i| Ingredient {
                name: i.name.trim().to_string(),
                amount: i.amount.trim().to_string(),
                unit: i.unit.trim().to_string(),
                importance: i.importance.trim().to_string(),
            })
            .collect();

        let steps = self
            .steps
            .iter()
            .map(|text| text.trim())
            .filter(|text| !text.is_empty())
            .zip(1..)
            .map(|(text, id)| Step {
                id,
                text: text.to_string(),
                image: None,
            })
            .collect();

        Ok(Recipe {
            id,
            name,
            category: self.category,
            difficulty: self.difficulty,
            description: self.description.trim().to_string(),
            ingredients,
            steps,
            bake_temp: non_blank(self.bake_temp),
            bake_time: non_blank(self.bake_time),
            is_user_created: true,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// `user-<unix millis>`, bumped until it is free
pub fn next_recipe_id(stats: &UserStats, now: DateTime<Utc>) -> String {
    let mut millis = now.timestamp_millis();
    loop {
        let id = format!("{USER_RECIPE_PREFIX}{millis}");
        if catalog::find_recipe(stats, &id).is_none() {
            return id;
        }
        millis += 1;
    }
}

/// Append a user recipe
pub fn add_user_recipe(stats: &UserStats, recipe: Recipe) -> UserStats {
    let mut next = stats.clone();
    next.user_recipes.push(recipe);
    next
}

/// Remove a user recipe. Review items that reference it are kept.
pub fn remove_user_recipe(stats: &UserStats, id: &str) -> Result<UserStats, ApiError> {
    if catalog::builtin_recipe(id).is_some() {
        return Err(ApiError::Forbidden(
            "Built-in recipes cannot be deleted".to_string(),
        ));
    }

    let mut next = stats.clone();
    let before = next.user_recipes.len();
    next.user_recipes.retain(|recipe| recipe.id != id);
    if next.user_recipes.len() == before {
        return Err(ApiError::NotFound(format!("Recipe {id} not found")));
    }
    Ok(next)
}
