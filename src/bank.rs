//! Question bank file handling
//!
//! The bank is a JSON array of `{ "question": ..., "answers": [{ "text", "points" }] }`
//! objects. It is read at startup and again whenever a freshly generated bank
//! is written.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::question::Question;

/// Points of a question's answers are expected to add up to this
pub const EXPECTED_POINTS_TOTAL: u32 = 100;

#[derive(Debug, thiserror::Error)]
pub enum BankError {
    #[error("failed to access question bank: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse question bank: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid question bank: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerData {
    pub text: String,
    pub points: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionData {
    pub question: String,
    pub answers: Vec<AnswerData>,
}

impl From<&QuestionData> for Question {
    fn from(data: &QuestionData) -> Self {
        Question::new(
            data.question.clone(),
            data.answers.iter().map(|a| (a.text.as_str(), a.points)),
        )
    }
}

/// Parse and validate bank JSON
pub fn parse_bank(json: &str) -> Result<Vec<QuestionData>, BankError> {
    let bank: Vec<QuestionData> = serde_json::from_str(json)?;
    validate_bank(&bank)?;
    Ok(bank)
}

/// Reject entries the game cannot play; warn about unusual point totals
pub fn validate_bank(bank: &[QuestionData]) -> Result<(), BankError> {
    for (index, entry) in bank.iter().enumerate() {
        if entry.question.trim().is_empty() {
            return Err(BankError::Invalid(format!(
                "question {} has an empty prompt",
                index + 1
            )));
        }
        if entry.answers.is_empty() {
            return Err(BankError::Invalid(format!(
                "question {} has no answers",
                index + 1
            )));
        }
        if let Some(blank) = entry.answers.iter().position(|a| a.text.trim().is_empty()) {
            return Err(BankError::Invalid(format!(
                "question {} answer {} is blank",
                index + 1,
                blank + 1
            )));
        }

        let total = entry
            .answers
            .iter()
            .try_fold(0u32, |acc, a| acc.checked_add(a.points))
            .ok_or_else(|| {
                BankError::Invalid(format!("question {} points overflow", index + 1))
            })?;
        if total != EXPECTED_POINTS_TOTAL {
            tracing::warn!(
                "Question {} points add up to {} instead of {}",
                index + 1,
                total,
                EXPECTED_POINTS_TOTAL
            );
        }
    }
    Ok(())
}

/// Read the bank file and build playable questions
pub fn load_questions(path: &Path) -> Result<Vec<Question>, BankError> {
    let json = std::fs::read_to_string(path)?;
    let bank = parse_bank(&json)?;
    Ok(bank.iter().map(Question::from).collect())
}

/// Like [`load_questions`], but a failure is logged and yields an empty bank
pub fn load_or_empty(path: &Path) -> Vec<Question> {
    match load_questions(path) {
        Ok(questions) => {
            tracing::info!(
                "Loaded {} questions from {}",
                questions.len(),
                path.display()
            );
            questions
        }
        Err(e) => {
            tracing::error!("An error occurred when loading questions: {}", e);
            Vec::new()
        }
    }
}

/// Write the bank, replacing any previous file only once the write succeeded
pub fn save_bank(path: &Path, bank: &[QuestionData]) -> Result<(), BankError> {
    validate_bank(bank)?;
    let json = serde_json::to_string_pretty(bank)?;

    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[
        {
            "question": "Name a popular street food in Hong Kong.",
            "answers": [
                {"text": "EGG WAFFLE", "points": 30},
                {"text": "FISH BALL", "points": 25},
                {"text": "SIU MAI", "points": 18},
                {"text": "EGG TART", "points": 15},
                {"text": "STINKY TOFU", "points": 7},
                {"text": "CHESTNUT", "points": 5}
            ]
        }
    ]"#;

    #[test]
    fn test_parse_sample_bank() {
        let bank = parse_bank(SAMPLE).unwrap();
        assert_eq!(bank.len(), 1);
        assert_eq!(bank[0].answers.len(), 6);

        let question = Question::from(&bank[0]);
        assert_eq!(question.prompt(), "Name a popular street food in Hong Kong.");
        assert_eq!(question.answers()[0].text(), "EGG WAFFLE");
    }

    #[test]
    fn test_missing_field_is_parse_error() {
        let result = parse_bank(r#"[{"answers": []}]"#);
        assert!(matches!(result, Err(BankError::Parse(_))));
    }

    #[test]
    fn test_question_without_answers_is_invalid() {
        let result = parse_bank(r#"[{"question": "Q?", "answers": []}]"#);
        match result {
            Err(BankError::Invalid(msg)) => assert!(msg.contains("no answers")),
            other => panic!("Expected Invalid error, got {:?}", other),
        }
    }

    #[test]
    fn test_odd_point_total_is_accepted() {
        let bank = parse_bank(r#"[{"question": "Q?", "answers": [{"text": "A", "points": 7}]}]"#)
            .unwrap();
        assert_eq!(bank[0].answers[0].points, 7);
    }

    #[test]
    fn test_overflowing_points_are_invalid() {
        let result = parse_bank(
            r#"[{"question": "Q?", "answers": [
                {"text": "A", "points": 4294967295},
                {"text": "B", "points": 1}
            ]}]"#,
        );
        match result {
            Err(BankError::Invalid(msg)) => assert!(msg.contains("overflow")),
            other => panic!("Expected Invalid error, got {:?}", other),
        }
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("questions.json");

        let bank = parse_bank(SAMPLE).unwrap();
        save_bank(&path, &bank).unwrap();

        let questions = load_questions(&path).unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].answers()[5].text(), "CHESTNUT");
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_load_or_empty_on_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let questions = load_or_empty(&dir.path().join("missing.json"));
        assert!(questions.is_empty());
    }
}
