//! Built-in content: recipes, timed challenges and badges.
//!
//! Recipes and challenges ship as JSON next to this crate and are parsed once on
//! first access. None of this is ever persisted.

use std::sync::LazyLock;

use crate::models::{Badge, Challenge, Recipe, UserStats};

/// Granted for completing a quiz on a bread recipe
pub const BADGE_YEAST_MASTER: &str = "yeast-master";
/// Granted for a perfect Advanced quiz
pub const BADGE_OVEN_OVERLORD: &str = "oven-overlord";
/// Granted for finishing a timed challenge
pub const BADGE_SPEED_BAKER: &str = "speed-baker";

pub const BADGES: &[Badge] = &[
    Badge {
        id: BADGE_YEAST_MASTER,
        name: "Yeast Master",
        icon: "🍞",
        description: "Perfectly recalled a bread recipe.",
    },
    Badge {
        id: "sugar-sweet",
        name: "Sugar Sweet",
        icon: "🍪",
        description: "Mastered 3 cookie recipes.",
    },
    Badge {
        id: "flour-power",
        name: "Flour Power",
        icon: "🥖",
        description: "Achieved a 5-day streak.",
    },
    Badge {
        id: BADGE_OVEN_OVERLORD,
        name: "Oven Overlord",
        icon: "👑",
        description: "Finished an advanced quiz with 100%.",
    },
    Badge {
        id: BADGE_SPEED_BAKER,
        name: "Speed Baker",
        icon: "⚡",
        description: "Completed a Challenge Mode session.",
    },
];

static RECIPES: LazyLock<Vec<Recipe>> = LazyLock::new(|| {
    serde_json::from_str(include_str!("../data/recipes.json"))
        .expect("embedded recipes.json must be valid")
});

static CHALLENGES: LazyLock<Vec<Challenge>> = LazyLock::new(|| {
    serde_json::from_str(include_str!("../data/challenges.json"))
        .expect("embedded challenges.json must be valid")
});

/// Built-in recipes in catalog order
pub fn builtin_recipes() -> &'static [Recipe] {
    &RECIPES
}

/// Built-in recipe by id
pub fn builtin_recipe(id: &str) -> Option<&'static Recipe> {
    RECIPES.iter().find(|r| r.id == id)
}

/// Timed challenges in catalog order
pub fn challenges() -> &'static [Challenge] {
    &CHALLENGES
}

/// Timed challenge by id
pub fn challenge(id: &str) -> Option<&'static Challenge> {
    CHALLENGES.iter().find(|c| c.id == id)
}

/// Badge definition by id
pub fn badge(id: &str) -> Option<&'static Badge> {
    BADGES.iter().find(|b| b.id == id)
}

/// Built-in recipes followed by the user's own
pub fn all_recipes(stats: &UserStats) -> Vec<Recipe> {
    builtin_recipes()
        .iter()
        .chain(&stats.user_recipes)
        .cloned()
        .collect()
}

/// Find a recipe by id among built-ins and the user's recipes
pub fn find_recipe(stats: &UserStats, id: &str) -> Option<Recipe> {
    builtin_recipe(id)
        .or_else(|| stats.user_recipes.iter().find(|r| r.id == id))
        .cloned()
}
