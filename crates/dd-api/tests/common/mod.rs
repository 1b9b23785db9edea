use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use chrono::{DateTime, TimeZone, Utc};
use dd_api::{
    ApiConfig, ApiState,
    assistant::{Assistant, AssistantError, Evaluation},
    clock::FixedClock,
    router,
};
use dd_db::{
    models::{Difficulty, Question, QuestionKind, Recipe, UserStats},
    store::MemoryStore,
};
use http_body_util::BodyExt;
use serde::Deserialize;
use serde_json::Value;
use tower::ServiceExt;

/// Scripted stand-in for the text-generation service
#[derive(Debug, Clone, Default)]
pub struct StubAssistant {
    /// Served for every recipe, ids prefixed with the recipe id
    pub questions: Vec<Question>,
    /// Verdict for free-response answers
    pub accept_free_response: bool,
    /// Every call fails
    pub offline: bool,
}

impl StubAssistant {
    pub fn with_questions(questions: Vec<Question>) -> Self {
        Self {
            questions,
            ..Default::default()
        }
    }

    pub fn offline() -> Self {
        Self {
            offline: true,
            ..Default::default()
        }
    }
}

#[async_trait]
impl Assistant for StubAssistant {
    async fn generate_quiz(
        &self,
        recipe: &Recipe,
        _difficulty: Difficulty,
        _seed: u32,
        count: usize,
    ) -> Result<Vec<Question>, AssistantError> {
        if self.offline {
            return Err(AssistantError::MissingApiKey);
        }
        Ok(self
            .questions
            .iter()
            .take(count)
            .map(|q| Question {
                id: format!("{}-{}", recipe.id, q.id),
                ..q.clone()
            })
            .collect())
    }

    async fn evaluate_free_response(
        &self,
        _answer: &str,
        _correct_answer: &str,
        _question: &str,
    ) -> Result<Evaluation, AssistantError> {
        if self.offline {
            return Err(AssistantError::MissingApiKey);
        }
        Ok(Evaluation {
            is_correct: self.accept_free_response,
            feedback: "Judged by the stub".to_string(),
        })
    }

    async fn explain_mistake(
        &self,
        _question: &str,
        _wrong_answer: &str,
        correct_answer: &str,
    ) -> Result<String, AssistantError> {
        if self.offline {
            return Err(AssistantError::MissingApiKey);
        }
        Ok(format!("Remember: {correct_answer}"))
    }
}

pub fn multiple_choice(id: &str, prompt: &str, answer: &str, options: &[&str]) -> Question {
    Question {
        id: id.to_string(),
        kind: QuestionKind::MultipleChoice {
            options: options.iter().map(|o| o.to_string()).collect(),
        },
        prompt: prompt.to_string(),
        correct_answer: answer.to_string(),
        hint: None,
        explanation: format!("The answer is {answer}."),
    }
}

pub fn fill_in_blank(id: &str, prompt: &str, answer: &str) -> Question {
    Question {
        id: id.to_string(),
        kind: QuestionKind::FillInBlank,
        prompt: prompt.to_string(),
        correct_answer: answer.to_string(),
        hint: Some("Think about the oven".to_string()),
        explanation: format!("The answer is {answer}."),
    }
}

pub fn free_response(id: &str, prompt: &str, answer: &str) -> Question {
    Question {
        id: id.to_string(),
        kind: QuestionKind::FreeResponse,
        prompt: prompt.to_string(),
        correct_answer: answer.to_string(),
        hint: None,
        explanation: String::new(),
    }
}

/// Two questions: flour (multiple choice) then oven temperature (typed)
pub fn bread_questions() -> Vec<Question> {
    vec![
        multiple_choice(
            "q1",
            "Which flour gives the best crumb?",
            "Strong White Flour",
            &["Strong White Flour", "Cake Flour", "Rice Flour"],
        ),
        fill_in_blank("q2", "Bake at what temperature?", "230°C"),
    ]
}

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap()
}

/// App wired to in-memory progress, a fixed clock and a stub assistant
pub struct TestApp {
    pub client: TestClient,
    pub state: ApiState,
    pub store: Arc<MemoryStore>,
    pub clock: Arc<FixedClock>,
}

impl TestApp {
    pub fn new(assistant: StubAssistant) -> Self {
        Self::with_store(assistant, MemoryStore::new())
    }

    pub fn with_store(assistant: StubAssistant, store: MemoryStore) -> Self {
        let config = ApiConfig::from_vars(Vec::<(String, String)>::new()).expect("default config");
        let store = Arc::new(store);
        let clock = Arc::new(FixedClock::new(start_time()));

        let state = ApiState::from_parts(
            &config,
            Box::new(Arc::clone(&store)),
            Arc::new(assistant),
            clock.clone(),
        )
        .expect("Failed to build state");

        let client = TestClient::new(router::router().with_state(state.clone()));

        Self {
            client,
            state,
            store,
            clock,
        }
    }

    /// Progress as persisted
    pub fn saved_stats(&self) -> UserStats {
        dd_db::load_stats(self.store.as_ref())
    }
}

/// Helper to make requests to the test app
pub struct TestClient {
    router: Router,
}

impl TestClient {
    pub fn new(router: Router) -> Self {
        Self { router }
    }

    /// Send a request and get the response
    pub async fn request(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to execute request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read response body")
            .to_bytes();

        TestResponse {
            status,
            body: body_bytes.to_vec(),
        }
    }

    fn empty(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .expect("Failed to build request")
    }

    fn with_json<T: serde::Serialize>(method: &str, uri: &str, body: &T) -> Request<Body> {
        let json_body = serde_json::to_string(body).expect("Failed to serialize body");
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(json_body))
            .expect("Failed to build request")
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.request(Self::empty("GET", uri)).await
    }

    /// Send a POST request with no body
    pub async fn post(&self, uri: &str) -> TestResponse {
        self.request(Self::empty("POST", uri)).await
    }

    pub async fn post_json<T: serde::Serialize>(&self, uri: &str, body: &T) -> TestResponse {
        self.request(Self::with_json("POST", uri, body)).await
    }

    pub async fn put_json<T: serde::Serialize>(&self, uri: &str, body: &T) -> TestResponse {
        self.request(Self::with_json("PUT", uri, body)).await
    }

    pub async fn delete(&self, uri: &str) -> TestResponse {
        self.request(Self::empty("DELETE", uri)).await
    }

    /// Answer the open question of a session
    pub async fn answer(&self, session_id: &str, answer: &str) -> TestResponse {
        self.post_json(
            &format!("/sessions/{session_id}/answer"),
            &serde_json::json!({ "answer": answer }),
        )
        .await
    }

    pub async fn next(&self, session_id: &str) -> TestResponse {
        self.post(&format!("/sessions/{session_id}/next")).await
    }
}

/// Test response wrapper
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl TestResponse {
    /// Get response body as string
    pub fn text(&self) -> String {
        String::from_utf8(self.body.clone()).expect("Response body is not valid UTF-8")
    }

    /// Parse response body as JSON
    pub fn json<T: for<'de> Deserialize<'de>>(&self) -> T {
        serde_json::from_slice(&self.body).expect("Failed to parse JSON response")
    }

    pub fn value(&self) -> Value {
        self.json()
    }

    /// Assert status code
    pub fn assert_status(&self, expected: StatusCode) {
        assert_eq!(
            self.status,
            expected,
            "Expected status {}, got {}. Body: {}",
            expected,
            self.status,
            self.text()
        );
    }
}

/// Session id from a session view
pub fn session_id(response: &TestResponse) -> String {
    response.value()["id"]
        .as_str()
        .expect("session view has an id")
        .to_string()
}
