//! Questions and their ranked answers
//!
//! A [`Question`] owns its answers in a fixed order: points descending,
//! ties kept in bank order. Submitted guesses are resolved against that
//! order with a fuzzy match, so the higher-ranked answer wins when a guess
//! is close to more than one.

use serde::{Deserialize, Serialize};

use crate::similarity;
use crate::types::PlayerKind;

/// Minimum similarity a guess needs to claim an answer
pub const MATCH_THRESHOLD: f64 = 0.7;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Answer {
    text: String,
    points: u32,
    guessed: bool,
    guesser: Option<PlayerKind>,
}

impl Answer {
    pub fn new(text: &str, points: u32) -> Self {
        Self {
            text: text.to_uppercase(),
            points,
            guessed: false,
            guesser: None,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn points(&self) -> u32 {
        self.points
    }

    pub fn is_guessed(&self) -> bool {
        self.guessed
    }

    pub fn guesser(&self) -> Option<PlayerKind> {
        self.guesser
    }

    /// Mark the answer as revealed. Double scoring is guarded by the caller.
    pub fn guess(&mut self) {
        self.guessed = true;
    }

    pub fn reset(&mut self) {
        self.guessed = false;
        self.guesser = None;
    }

    /// Masked form of the text shown while the answer is still hidden
    ///
    /// One more leading letter is uncovered every 20 seconds the round has
    /// been running, up to three, but never the whole word. Spaces and
    /// punctuation are always visible.
    pub fn hint(&self, remaining_seconds: f64) -> String {
        let elapsed_steps = (remaining_seconds.max(0.0) as u32) / 20;
        let hint_len = 3u32.saturating_sub(elapsed_steps) as usize;
        let len = self.text.chars().count();
        let visible = hint_len.min(len.saturating_sub(1));

        self.text
            .chars()
            .enumerate()
            .flat_map(|(i, c)| {
                let shown = if !c.is_alphanumeric() || i < visible {
                    c
                } else {
                    '_'
                };
                [shown, ' ']
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    prompt: String,
    answers: Vec<Answer>,
}

impl Question {
    /// Build a question from raw `(text, points)` pairs
    pub fn new<S: AsRef<str>>(
        prompt: impl Into<String>,
        answers: impl IntoIterator<Item = (S, u32)>,
    ) -> Self {
        let mut answers: Vec<Answer> = answers
            .into_iter()
            .map(|(text, points)| Answer::new(text.as_ref(), points))
            .collect();
        // sort_by is stable: equal points keep bank order
        answers.sort_by(|a, b| b.points.cmp(&a.points));

        Self {
            prompt: prompt.into(),
            answers,
        }
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn answers(&self) -> &[Answer] {
        &self.answers
    }

    pub fn unguessed_answers(&self) -> impl Iterator<Item = &Answer> + '_ {
        self.answers.iter().filter(|a| !a.guessed)
    }

    pub fn is_fully_revealed(&self) -> bool {
        self.answers.iter().all(|a| a.guessed)
    }

    pub fn reset(&mut self) {
        for answer in &mut self.answers {
            answer.reset();
        }
    }

    /// Resolve a guess against the default threshold
    pub fn resolve(&mut self, submitted: &str, guesser: PlayerKind) -> Option<&mut Answer> {
        self.resolve_with_threshold(submitted, guesser, MATCH_THRESHOLD)
    }

    /// Find the first answer (in ranked order) whose similarity to the
    /// normalised guess exceeds `threshold`
    ///
    /// An unguessed match records `guesser`, but is not marked guessed.
    pub fn resolve_with_threshold(
        &mut self,
        submitted: &str,
        guesser: PlayerKind,
        threshold: f64,
    ) -> Option<&mut Answer> {
        let search = submitted.trim().to_uppercase();

        let answer = self
            .answers
            .iter_mut()
            .find(|a| similarity::ratio(&search, &a.text) > threshold)?;

        if !answer.guessed {
            answer.guesser = Some(guesser);
        }
        Some(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn street_food() -> Question {
        Question::new(
            "Name a popular street food in Hong Kong.",
            [
                ("fish ball", 25),
                ("Egg Waffle", 30),
                ("SIU MAI", 18),
                ("EGG TART", 15),
                ("STINKY TOFU", 7),
                ("CHESTNUT", 5),
            ],
        )
    }

    fn texts(question: &Question) -> Vec<&str> {
        question.answers().iter().map(Answer::text).collect()
    }

    #[test]
    fn test_answers_sorted_by_points() {
        let question = street_food();
        assert_eq!(question.answers()[0].text(), "EGG WAFFLE");
        assert_eq!(
            texts(&question),
            vec!["EGG WAFFLE", "FISH BALL", "SIU MAI", "EGG TART", "STINKY TOFU", "CHESTNUT"]
        );
    }

    #[test]
    fn test_equal_points_keep_bank_order() {
        let mut question = Question::new("Q", [("B", 10), ("A", 20), ("C", 10), ("D", 10)]);
        assert_eq!(texts(&question), vec!["A", "B", "C", "D"]);

        question.reset();
        question.reset();
        assert_eq!(texts(&question), vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn test_resolve_ignores_case_and_whitespace() {
        let mut question = street_food();
        let answer = question.resolve("  egg waffle ", PlayerKind::Human).unwrap();
        assert_eq!(answer.text(), "EGG WAFFLE");
    }

    #[test]
    fn test_resolve_tolerates_missing_space() {
        let mut question = street_food();
        let answer = question.resolve("FISHBALL", PlayerKind::Ai).unwrap();
        assert_eq!(answer.text(), "FISH BALL");
        assert_eq!(answer.guesser(), Some(PlayerKind::Ai));
    }

    #[test]
    fn test_resolve_no_match() {
        let mut question = street_food();
        assert!(question.resolve("xyz", PlayerKind::Human).is_none());
        assert!(question.resolve("", PlayerKind::Human).is_none());
    }

    #[test]
    fn test_resolve_does_not_mark_guessed() {
        let mut question = street_food();
        question.resolve("SIU MAI", PlayerKind::Human).unwrap();
        assert!(question.answers().iter().all(|a| !a.is_guessed()));
        assert_eq!(question.unguessed_answers().count(), 6);
    }

    #[test]
    fn test_resolve_keeps_first_guesser() {
        let mut question = street_food();
        question.resolve("SIU MAI", PlayerKind::Human).unwrap().guess();

        let again = question.resolve("SIU MAI", PlayerKind::Ai).unwrap();
        assert!(again.is_guessed());
        assert_eq!(again.guesser(), Some(PlayerKind::Human));
    }

    #[test]
    fn test_resolve_prefers_higher_ranked_answer() {
        // "CAT" is close enough to both; the 40-point answer is checked first
        let mut question = Question::new("Q", [("CATS", 10), ("CAT", 40)]);
        let answer = question.resolve("CATS", PlayerKind::Human).unwrap();
        assert_eq!(answer.text(), "CAT");
    }

    #[test]
    fn test_full_reveal_and_reset() {
        let mut question = Question::new("Q", [("ONE", 60), ("TWO", 40)]);
        assert!(!question.is_fully_revealed());

        question.resolve("ONE", PlayerKind::Human).unwrap().guess();
        assert!(!question.is_fully_revealed());
        assert_eq!(
            question.unguessed_answers().map(Answer::text).collect::<Vec<_>>(),
            vec!["TWO"]
        );

        question.resolve("TWO", PlayerKind::Ai).unwrap().guess();
        assert!(question.is_fully_revealed());

        question.reset();
        assert!(!question.is_fully_revealed());
        assert!(question.answers().iter().all(|a| a.guesser().is_none()));
    }

    #[test]
    fn test_hint_uncovers_letters_over_time() {
        let answer = Answer::new("EGG TART", 15);
        assert_eq!(answer.hint(60.0), "_ _ _   _ _ _ _ ");
        assert_eq!(answer.hint(59.5), "E _ _   _ _ _ _ ");
        assert_eq!(answer.hint(39.0), "E G _   _ _ _ _ ");
        assert_eq!(answer.hint(5.0), "E G G   _ _ _ _ ");
        assert_eq!(answer.hint(0.0), "E G G   _ _ _ _ ");
    }

    #[test]
    fn test_hint_never_reveals_whole_word() {
        let answer = Answer::new("OX", 5);
        assert_eq!(answer.hint(0.0), "O _ ");
    }
}
