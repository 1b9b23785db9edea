use std::sync::Arc;

use dd_db::models::{Difficulty, Question, QuestionKind, Recipe};

use super::{Assistant, Evaluation};
use crate::metrics;

/// Distractors offered next to the first ingredient
const FALLBACK_DISTRACTORS: [&str; 3] = ["Cornstarch", "Rice Flour", "Buckwheat"];

const STANDARD_FEEDBACK: &str = "Standard validation applied.";

const GENERIC_INSIGHT: &str = "Incorrect answer. Re-check the recipe details to master this step!";

/// Wraps an [`Assistant`] so every call yields a usable result.
///
/// Failures are logged and counted, then replaced with locally built
/// substitutes.
#[derive(Clone)]
pub struct FallbackAssistant {
    inner: Arc<dyn Assistant>,
}

impl FallbackAssistant {
    pub fn new(inner: Arc<dyn Assistant>) -> Self {
        Self { inner }
    }

    /// Questions for a quiz; a single placeholder question on failure.
    pub async fn generate_quiz(
        &self,
        recipe: &Recipe,
        difficulty: Difficulty,
        seed: u32,
        count: usize,
    ) -> Vec<Question> {
        match self
            .inner
            .generate_quiz(recipe, difficulty, seed, count)
            .await
        {
            Ok(questions) if !questions.is_empty() => questions,
            Ok(_) => {
                tracing::warn!(recipe_id = %recipe.id, "Quiz generation returned no questions");
                metrics::record_assistant_fallback("generate");
                vec![fallback_question(recipe)]
            }
            Err(e) => {
                tracing::warn!(recipe_id = %recipe.id, "Quiz generation failed: {e}");
                metrics::record_assistant_fallback("generate");
                vec![fallback_question(recipe)]
            }
        }
    }

    /// Grade a free-response answer; exact match on failure.
    pub async fn evaluate_free_response(
        &self,
        answer: &str,
        correct_answer: &str,
        question: &str,
    ) -> Evaluation {
        match self
            .inner
            .evaluate_free_response(answer, correct_answer, question)
            .await
        {
            Ok(evaluation) => evaluation,
            Err(e) => {
                tracing::warn!("Free-response evaluation failed: {e}");
                metrics::record_assistant_fallback("evaluate");
                exact_match_evaluation(answer, correct_answer)
            }
        }
    }

    /// Explain a wrong answer; the static explanation on failure.
    pub async fn explain_mistake(&self, question: &Question, wrong_answer: &str) -> String {
        match self
            .inner
            .explain_mistake(&question.prompt, wrong_answer, &question.correct_answer)
            .await
        {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => {
                metrics::record_assistant_fallback("explain");
                static_explanation(question)
            }
            Err(e) => {
                tracing::warn!(question_id = %question.id, "Mistake explanation failed: {e}");
                metrics::record_assistant_fallback("explain");
                static_explanation(question)
            }
        }
    }
}

/// Placeholder question built from the recipe's first ingredient.
///
/// Recipes without ingredients get a category question instead.
pub fn fallback_question(recipe: &Recipe) -> Question {
    let id = format!("fallback-{}", recipe.id);

    let Some(ingredient) = recipe.ingredients.first() else {
        return Question {
            id,
            kind: QuestionKind::FillInBlank,
            prompt: format!("Which category of bake is {}?", recipe.name),
            correct_answer: recipe.category.as_str().to_string(),
            hint: None,
            explanation: format!("{} is one of our {} recipes.", recipe.name, recipe.category.as_str()),
        };
    };

    let mut options = vec![ingredient.name.clone()];
    options.extend(
        FALLBACK_DISTRACTORS
            .iter()
            .filter(|d| !d.eq_ignore_ascii_case(&ingredient.name))
            .map(|d| d.to_string()),
    );

    let explanation = if ingredient.importance.is_empty() {
        format!("{} provides the essential structure.", ingredient.name)
    } else {
        format!("{}: {}", ingredient.name, ingredient.importance)
    };

    Question {
        id,
        kind: QuestionKind::MultipleChoice { options },
        prompt: format!("What is the main ingredient used in {}?", recipe.name),
        correct_answer: ingredient.name.clone(),
        hint: None,
        explanation,
    }
}

/// Case-insensitive exact comparison with the generic feedback line.
pub fn exact_match_evaluation(answer: &str, correct_answer: &str) -> Evaluation {
    Evaluation {
        is_correct: answer.trim().to_lowercase() == correct_answer.trim().to_lowercase(),
        feedback: STANDARD_FEEDBACK.to_string(),
    }
}

fn static_explanation(question: &Question) -> String {
    if question.explanation.trim().is_empty() {
        GENERIC_INSIGHT.to_string()
    } else {
        question.explanation.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::AssistantError;
    use async_trait::async_trait;
    use dd_db::{catalog, models::RecipeCategory};

    struct Unreachable;

    #[async_trait]
    impl Assistant for Unreachable {
        async fn generate_quiz(
            &self,
            _: &Recipe,
            _: Difficulty,
            _: u32,
            _: usize,
        ) -> Result<Vec<Question>, AssistantError> {
            Err(AssistantError::MissingApiKey)
        }

        async fn evaluate_free_response(
            &self,
            _: &str,
            _: &str,
            _: &str,
        ) -> Result<Evaluation, AssistantError> {
            Err(AssistantError::Empty)
        }

        async fn explain_mistake(&self, _: &str, _: &str, _: &str) -> Result<String, AssistantError> {
            Err(AssistantError::Parse("garbage".into()))
        }
    }

    fn recipe() -> Recipe {
        catalog::builtin_recipe("basic-bread").unwrap().clone()
    }

    #[tokio::test]
    async fn test_generation_failure_yields_one_question() {
        let assistant = FallbackAssistant::new(Arc::new(Unreachable));
        let recipe = recipe();

        let questions = assistant
            .generate_quiz(&recipe, Difficulty::Beginner, 7, 5)
            .await;

        assert_eq!(questions.len(), 1);
        let question = &questions[0];
        let first = &recipe.ingredients[0].name;
        assert_eq!(&question.correct_answer, first);
        assert_eq!(question.options()[0], *first);
        assert!(question.options().iter().any(|o| o == "Buckwheat"));
    }

    #[test]
    fn test_fallback_without_ingredients() {
        let mut recipe = recipe();
        recipe.ingredients.clear();
        recipe.category = RecipeCategory::Pies;

        let question = fallback_question(&recipe);
        assert_eq!(question.kind, QuestionKind::FillInBlank);
        assert_eq!(question.correct_answer, "Pies");
    }

    #[test]
    fn test_fallback_skips_colliding_distractor() {
        let mut recipe = recipe();
        recipe.ingredients[0].name = "Rice Flour".to_string();

        let question = fallback_question(&recipe);
        assert_eq!(question.options(), ["Rice Flour", "Cornstarch", "Buckwheat"]);
    }

    #[tokio::test]
    async fn test_evaluation_falls_back_to_exact_match() {
        let assistant = FallbackAssistant::new(Arc::new(Unreachable));

        let evaluation = assistant
            .evaluate_free_response(" bread flour", "Bread Flour", "Which flour?")
            .await;
        assert!(evaluation.is_correct);
        assert_eq!(evaluation.feedback, STANDARD_FEEDBACK);

        let evaluation = assistant
            .evaluate_free_response("plain flour", "Bread Flour", "Which flour?")
            .await;
        assert!(!evaluation.is_correct);
    }

    #[tokio::test]
    async fn test_explanation_falls_back_to_static_text() {
        let assistant = FallbackAssistant::new(Arc::new(Unreachable));
        let mut question = fallback_question(&recipe());

        let text = assistant.explain_mistake(&question, "Cornstarch").await;
        assert_eq!(text, question.explanation);

        question.explanation.clear();
        let text = assistant.explain_mistake(&question, "Cornstarch").await;
        assert_eq!(text, GENERIC_INSIGHT);
    }
}
