//! Question bank generation on top of the configured providers

use super::*;
use crate::bank::{validate_bank, QuestionData};

/// Longest answer text the board has room for
pub const MAX_ANSWER_LEN: usize = 20;
const ANSWERS_PER_QUESTION: usize = 6;

const SYSTEM_PROMPT: &str = "You are a helpful assistant that writes questions for a party game.";

const EXAMPLE_BANK: &str = r#"[
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

/// Instructions for a bank of `count` questions in the game's JSON format
pub fn generation_prompt(count: u32) -> String {
    format!(
        "Write {count} questions for the 'Guess Their Answer' game. Each question needs the \
         {ANSWERS_PER_QUESTION} most popular answers, scored by how popular each answer is.\n\n\
         Rules:\n\
         - Answers are UPPERCASE, at most {MAX_ANSWER_LEN} characters, with no abbreviations.\n\
         - Write Cantonese dish names as their usual English names where one exists \
         (PINEAPPLE BUN rather than BOLO BAO).\n\
         - The points of the {ANSWERS_PER_QUESTION} answers add up to 100.\n\
         - Use a different point split for every question.\n\n\
         The players live in Hong Kong, so questions and answers should be about Hong Kong life.\n\n\
         Reply with a single JSON code block shaped like this example, without reusing it:\n\
         ```json\n{EXAMPLE_BANK}\n```"
    )
}

/// Pull the JSON payload out of a model reply
///
/// Accepts the first fenced code block, with or without a `json` language
/// tag, or a reply that is bare JSON.
pub fn extract_json(reply: &str) -> LlmResult<&str> {
    if let Some((_, rest)) = reply.split_once("```") {
        let block = rest.split_once("```").map_or(rest, |(block, _)| block);
        let block = block.trim_start();
        let block = block
            .strip_prefix("json")
            .or_else(|| block.strip_prefix("JSON"))
            .unwrap_or(block);
        return Ok(block.trim());
    }

    let trimmed = reply.trim();
    if trimmed.starts_with('[') {
        Ok(trimmed)
    } else {
        Err(LlmError::ParseError(
            "Reply contains no JSON code block".to_string(),
        ))
    }
}

/// Parse a model reply into a playable bank
pub fn parse_questions(reply: &str) -> LlmResult<Vec<QuestionData>> {
    let json = extract_json(reply)?;
    let mut bank: Vec<QuestionData> =
        serde_json::from_str(json).map_err(|e| LlmError::ParseError(e.to_string()))?;

    if bank.is_empty() {
        return Err(LlmError::ParseError("Reply contains no questions".to_string()));
    }

    for entry in &mut bank {
        entry.question = entry.question.trim().to_string();
        for answer in &mut entry.answers {
            answer.text = answer.text.trim().to_uppercase();
            if answer.text.chars().count() > MAX_ANSWER_LEN {
                tracing::warn!("Generated answer '{}' is longer than {}", answer.text, MAX_ANSWER_LEN);
            }
        }
    }

    validate_bank(&bank).map_err(|e| LlmError::ParseError(e.to_string()))?;
    Ok(bank)
}

/// Produces fresh question banks from whichever provider answers first
pub struct QuestionGenerator {
    manager: LlmManager,
    config: LlmConfig,
}

impl QuestionGenerator {
    pub fn new(manager: LlmManager, config: LlmConfig) -> Self {
        Self { manager, config }
    }

    pub async fn generate(&self) -> LlmResult<Vec<QuestionData>> {
        tracing::info!("Generating {} new questions", self.config.question_count);

        let request = GenerateRequest {
            system: Some(SYSTEM_PROMPT.to_string()),
            prompt: generation_prompt(self.config.question_count),
            max_tokens: Some(self.config.default_max_tokens),
            temperature: Some(0.7),
            timeout: self.config.default_timeout,
        };

        let response = self.manager.generate_first(request).await?;
        let bank = parse_questions(&response.text)?;
        tracing::info!(
            "Generated {} questions via {}",
            bank.len(),
            response.metadata.provider
        );
        Ok(bank)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::tests::CannedProvider;

    #[test]
    fn test_prompt_mentions_count_and_rules() {
        let prompt = generation_prompt(5);
        assert!(prompt.starts_with("Write 5 questions"));
        assert!(prompt.contains("at most 20 characters"));
        assert!(prompt.contains("add up to 100"));
        assert!(prompt.contains("```json"));
    }

    #[test]
    fn test_extract_tagged_block() {
        let reply = "Sure!\n```json\n[{\"a\": 1}]\n```\nEnjoy the game.";
        assert_eq!(extract_json(reply).unwrap(), "[{\"a\": 1}]");
    }

    #[test]
    fn test_extract_untagged_block() {
        let reply = "```\n[]\n```";
        assert_eq!(extract_json(reply).unwrap(), "[]");
    }

    #[test]
    fn test_extract_bare_json() {
        assert_eq!(extract_json("  [1, 2]\n").unwrap(), "[1, 2]");
        assert!(matches!(
            extract_json("I cannot help with that."),
            Err(LlmError::ParseError(_))
        ));
    }

    #[test]
    fn test_parse_example_bank() {
        let reply = format!("Here you go:\n```json\n{}\n```", EXAMPLE_BANK);
        let bank = parse_questions(&reply).unwrap();
        assert_eq!(bank.len(), 1);
        assert_eq!(bank[0].answers.len(), 6);
        assert_eq!(bank[0].answers[1].text, "FISH BALL");
    }

    #[test]
    fn test_parse_normalises_answers() {
        let reply = r#"[{"question": " Q? ", "answers": [{"text": " milk tea ", "points": 100}]}]"#;
        let bank = parse_questions(reply).unwrap();
        assert_eq!(bank[0].question, "Q?");
        assert_eq!(bank[0].answers[0].text, "MILK TEA");
    }

    #[test]
    fn test_parse_rejects_unplayable_banks() {
        assert!(parse_questions("[]").is_err());
        assert!(parse_questions(r#"[{"question": "Q?", "answers": []}]"#).is_err());
        assert!(parse_questions("```json\n{not json}\n```").is_err());
    }

    #[tokio::test]
    async fn test_generator_uses_first_working_provider() {
        let reply = format!("```json\n{}\n```", EXAMPLE_BANK);
        let manager = LlmManager::new(vec![
            Box::new(CannedProvider::new("down", None)),
            Box::new(CannedProvider::new("up", Some(&reply))),
        ]);
        let generator = QuestionGenerator::new(manager, LlmConfig::default());

        let bank = generator.generate().await.unwrap();
        assert_eq!(bank[0].question, "Name a popular street food in Hong Kong.");
    }

    #[tokio::test]
    async fn test_generator_surfaces_bad_reply() {
        let manager = LlmManager::new(vec![Box::new(CannedProvider::new(
            "chatty",
            Some("no questions today"),
        ))]);
        let generator = QuestionGenerator::new(manager, LlmConfig::default());
        assert!(matches!(
            generator.generate().await,
            Err(LlmError::ParseError(_))
        ));
    }
}
