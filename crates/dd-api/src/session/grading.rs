use dd_db::models::Question;

use crate::assistant::Evaluation;

/// Trimmed, case-insensitive comparison.
pub fn answers_match(answer: &str, correct_answer: &str) -> bool {
    answer.trim().to_lowercase() == correct_answer.trim().to_lowercase()
}

/// Grade an answer without the evaluation service.
pub fn grade_locally(question: &Question, answer: &str) -> Evaluation {
    let is_correct = answers_match(answer, &question.correct_answer);
    let feedback = if is_correct {
        "Perfect!".to_string()
    } else {
        format!("The correct answer was: {}", question.correct_answer)
    };

    Evaluation {
        is_correct,
        feedback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dd_db::models::QuestionKind;

    fn question() -> Question {
        Question {
            id: "q".to_string(),
            kind: QuestionKind::MultipleChoice {
                options: vec!["Bread Flour".to_string(), "Cornstarch".to_string()],
            },
            prompt: "Which flour?".to_string(),
            correct_answer: "Bread Flour".to_string(),
            hint: None,
            explanation: String::new(),
        }
    }

    #[test]
    fn test_match_ignores_case_and_padding() {
        assert!(answers_match("  bread FLOUR ", "Bread Flour"));
        assert!(!answers_match("bread", "Bread Flour"));
    }

    #[test]
    fn test_feedback_text() {
        let right = grade_locally(&question(), "bread flour");
        assert!(right.is_correct);
        assert_eq!(right.feedback, "Perfect!");

        let wrong = grade_locally(&question(), "Cornstarch");
        assert!(!wrong.is_correct);
        assert_eq!(wrong.feedback, "The correct answer was: Bread Flour");
    }
}
