use axum::http::StatusCode;
use dd_db::models::Recipe;
use serde_json::json;

use crate::common::{StubAssistant, TestApp, bread_questions, session_id};

fn lemon_tart() -> serde_json::Value {
    json!({
        "name": "Lemon Tart",
        "category": "Pies",
        "difficulty": "Intermediate",
        "description": "Sharp and silky.",
        "ingredients": [
            { "name": "Lemons", "amount": "3", "unit": "whole" },
            { "name": "Butter", "amount": "100", "unit": "g" }
        ],
        "steps": ["Blind bake the shell", "Fill and bake"],
        "bakeTemp": "160°C"
    })
}

#[tokio::test]
async fn test_list_and_get_builtin() {
    let app = TestApp::new(StubAssistant::default());

    let recipes: Vec<Recipe> = app.client.get("/recipes").await.json();
    assert!(recipes.iter().any(|r| r.id == "basic-bread"));
    assert!(recipes.iter().all(|r| !r.is_user_created));

    let response = app.client.get("/recipes/basic-bread").await;
    response.assert_status(StatusCode::OK);
    let recipe: Recipe = response.json();
    assert_eq!(recipe.ingredients[0].name, "Strong White Flour");

    app.client
        .get("/recipes/no-such-bake")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_and_delete_user_recipe() {
    let app = TestApp::new(StubAssistant::default());

    let response = app.client.post_json("/recipes", &lemon_tart()).await;
    response.assert_status(StatusCode::CREATED);
    let created: Recipe = response.json();
    assert!(created.id.starts_with("user-"));
    assert!(created.is_user_created);
    assert_eq!(created.steps.len(), 2);
    assert_eq!(app.saved_stats().user_recipes, vec![created.clone()]);

    let recipes: Vec<Recipe> = app.client.get("/recipes").await.json();
    assert_eq!(recipes.last().map(|r| r.id.as_str()), Some(created.id.as_str()));

    let uri = format!("/recipes/{}", created.id);
    app.client.delete(&uri).await.assert_status(StatusCode::NO_CONTENT);
    app.client.delete(&uri).await.assert_status(StatusCode::NOT_FOUND);
    assert!(app.saved_stats().user_recipes.is_empty());
}

#[tokio::test]
async fn test_builtin_recipes_cannot_be_deleted() {
    let app = TestApp::new(StubAssistant::default());

    let response = app.client.delete("/recipes/basic-bread").await;
    response.assert_status(StatusCode::FORBIDDEN);
    assert!(response.value()["error"].is_string());
}

#[tokio::test]
async fn test_rejects_blank_name() {
    let app = TestApp::new(StubAssistant::default());

    let mut payload = lemon_tart();
    payload["name"] = json!("   ");
    app.client
        .post_json("/recipes", &payload)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    assert!(app.saved_stats().user_recipes.is_empty());
}

#[tokio::test]
async fn test_quiz_on_user_recipe() {
    let app = TestApp::new(StubAssistant::with_questions(bread_questions()));

    let created: Recipe = app.client.post_json("/recipes", &lemon_tart()).await.json();

    let response = app
        .client
        .post_json("/sessions/quiz", &json!({ "recipeId": created.id }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let body = response.value();
    assert_eq!(body["recipeName"], "Lemon Tart");
    assert_eq!(body["difficulty"], "Beginner");

    let id = session_id(&response);
    app.client.answer(&id, "Strong White Flour").await;
    app.client.next(&id).await;
    app.client.answer(&id, "230°C").await;
    let done = app.client.next(&id).await.value();
    assert_eq!(done["summary"]["correct"], 2);
    // Not a bread recipe
    assert_eq!(done["summary"]["badgesEarned"], json!([]));

    let dashboard = app.client.get("/stats").await.value();
    assert_eq!(dashboard["lastRecipe"]["id"], created.id.as_str());
}
