use serde::{Deserialize, Serialize};

/// Opaque ID types for type safety
pub type GameId = String;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameState {
    Menu,
    Loading,
    RaceActive,
    RaceEnd,
    GameOver,
    Quitting,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PlayerKind {
    Human,
    Ai,
}

/// Final result of a game, decided by cumulative game score
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Human,
    Ai,
    Tie,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    pub round_seconds: f64,
    pub max_rounds: u32,
    pub ai_initial_delay: f64,
    pub ai_min_delay: f64,
    pub ai_max_delay: f64,
    pub ai_hit_chance: f64,
    pub match_threshold: f64,
    pub human_name: String,
    pub ai_name: String,
    pub crowd_size: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            round_seconds: 60.0,
            max_rounds: 3,
            ai_initial_delay: 5.0,
            ai_min_delay: 3.0,
            ai_max_delay: 7.0,
            ai_hit_chance: 0.4,
            match_threshold: 0.7,
            human_name: "You".to_string(),
            ai_name: "AI".to_string(),
            crowd_size: 100,
        }
    }
}

impl GameConfig {
    /// Load game tuning from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let round_seconds = std::env::var("ROUND_SECONDS")
            .ok()
            .and_then(|s| s.trim().parse::<f64>().ok())
            .filter(|s| *s > 0.0)
            .unwrap_or(defaults.round_seconds);

        let max_rounds = std::env::var("MAX_ROUNDS")
            .ok()
            .and_then(|s| s.trim().parse::<u32>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(defaults.max_rounds);

        let ai_hit_chance = std::env::var("AI_HIT_CHANCE")
            .ok()
            .and_then(|s| s.trim().parse::<f64>().ok())
            .filter(|p| (0.0..=1.0).contains(p))
            .unwrap_or(defaults.ai_hit_chance);

        Self {
            round_seconds,
            max_rounds,
            ai_hit_chance,
            ..defaults
        }
    }

    pub fn name_of(&self, kind: PlayerKind) -> &str {
        match kind {
            PlayerKind::Human => &self.human_name,
            PlayerKind::Ai => &self.ai_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_default_config() {
        let config = GameConfig::default();
        assert_eq!(config.round_seconds, 60.0);
        assert_eq!(config.max_rounds, 3);
        assert_eq!(config.ai_initial_delay, 5.0);
        assert_eq!(config.match_threshold, 0.7);
        assert_eq!(config.name_of(PlayerKind::Human), "You");
        assert_eq!(config.name_of(PlayerKind::Ai), "AI");
    }

    #[test]
    #[serial]
    fn test_config_from_env_overrides() {
        std::env::set_var("ROUND_SECONDS", "45");
        std::env::set_var("MAX_ROUNDS", "5");
        std::env::set_var("AI_HIT_CHANCE", "not-a-number");

        let config = GameConfig::from_env();
        assert_eq!(config.round_seconds, 45.0);
        assert_eq!(config.max_rounds, 5);
        assert_eq!(config.ai_hit_chance, 0.4);

        std::env::remove_var("ROUND_SECONDS");
        std::env::remove_var("MAX_ROUNDS");
        std::env::remove_var("AI_HIT_CHANCE");
    }

    #[test]
    fn test_game_state_wire_format() {
        let json = serde_json::to_string(&GameState::RaceActive).unwrap();
        assert_eq!(json, "\"RACE_ACTIVE\"");
    }
}
