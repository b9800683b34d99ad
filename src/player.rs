//! Players and the scripted AI opponent

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::collections::VecDeque;

use crate::question::Question;
use crate::types::{GameConfig, PlayerKind};

/// Source of the random draws behind the AI's behaviour
///
/// Production uses [`StdRng`]; tests can inject a [`ScriptedRandom`] to pin
/// every branch.
pub trait RandomSource: Send {
    /// Uniform draw in `[low, high)`
    fn uniform(&mut self, low: f64, high: f64) -> f64;

    /// Uniform index in `0..len`; `len` is never zero
    fn index(&mut self, len: usize) -> usize;
}

impl RandomSource for StdRng {
    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        if high <= low {
            return low;
        }
        self.random_range(low..high)
    }

    fn index(&mut self, len: usize) -> usize {
        self.random_range(0..len)
    }
}

/// Fresh OS-seeded generator for live games
pub fn os_random() -> Box<dyn RandomSource> {
    Box::new(StdRng::from_os_rng())
}

/// Replays a fixed sequence of draws
///
/// Each `uniform` call consumes the next value as-is; each `index` call
/// consumes the next value and truncates it into range. Once exhausted,
/// `uniform` returns `low` and `index` returns 0.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRandom {
    values: VecDeque<f64>,
}

impl ScriptedRandom {
    pub fn new(values: impl IntoIterator<Item = f64>) -> Self {
        Self {
            values: values.into_iter().collect(),
        }
    }
}

impl RandomSource for ScriptedRandom {
    fn uniform(&mut self, low: f64, _high: f64) -> f64 {
        self.values.pop_front().unwrap_or(low)
    }

    fn index(&mut self, len: usize) -> usize {
        self.values
            .pop_front()
            .map(|v| (v.max(0.0) as usize).min(len - 1))
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Player {
    kind: PlayerKind,
    name: String,
    round_score: u32,
    game_score: u32,
}

impl Player {
    pub fn new(kind: PlayerKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            round_score: 0,
            game_score: 0,
        }
    }

    pub fn kind(&self) -> PlayerKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn round_score(&self) -> u32 {
        self.round_score
    }

    pub fn game_score(&self) -> u32 {
        self.game_score
    }

    /// Scores saturate instead of wrapping on absurd point values
    pub fn add_score(&mut self, points: u32) {
        self.round_score = self.round_score.saturating_add(points);
        self.game_score = self.game_score.saturating_add(points);
    }

    pub fn reset_round_score(&mut self) {
        self.round_score = 0;
    }

    /// A new game also clears the round score
    pub fn reset_game_score(&mut self) {
        self.game_score = 0;
        self.reset_round_score();
    }
}

/// What the AI decided to submit on a decision tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuessIntent {
    /// Submit this answer's text
    Guess(String),
    /// Deliberately wrong; only triggers a miss notification
    Miss,
}

pub struct AiPlayer {
    player: Player,
    decision_timer: f64,
    decision_delay: f64,
    initial_delay: f64,
    min_delay: f64,
    max_delay: f64,
    hit_chance: f64,
    rng: Box<dyn RandomSource>,
}

impl std::fmt::Debug for AiPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiPlayer")
            .field("player", &self.player)
            .field("decision_timer", &self.decision_timer)
            .field("decision_delay", &self.decision_delay)
            .finish_non_exhaustive()
    }
}

impl AiPlayer {
    pub fn new(config: &GameConfig, rng: Box<dyn RandomSource>) -> Self {
        Self {
            player: Player::new(PlayerKind::Ai, config.ai_name.clone()),
            decision_timer: 0.0,
            decision_delay: config.ai_initial_delay,
            initial_delay: config.ai_initial_delay,
            min_delay: config.ai_min_delay,
            max_delay: config.ai_max_delay,
            hit_chance: config.ai_hit_chance,
            rng,
        }
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut Player {
        &mut self.player
    }

    pub fn decision_timer(&self) -> f64 {
        self.decision_timer
    }

    pub fn decision_delay(&self) -> f64 {
        self.decision_delay
    }

    /// Called at every round start
    pub fn reset_timer(&mut self) {
        self.decision_timer = 0.0;
    }

    /// Called at every new game: scores cleared, first guess waits the initial delay again
    pub fn reset_for_new_game(&mut self) {
        self.player.reset_game_score();
        self.decision_timer = 0.0;
        self.decision_delay = self.initial_delay;
    }

    /// Advance the decision timer by `dt` seconds
    ///
    /// When the delay elapses the timer restarts and a new delay is drawn
    /// before the question is inspected, so a tick with nothing left to
    /// guess still consumes the decision.
    pub fn tick(
        &mut self,
        dt: f64,
        round_active: bool,
        question: Option<&Question>,
    ) -> Option<GuessIntent> {
        if !round_active {
            return None;
        }

        self.decision_timer += dt;
        if self.decision_timer < self.decision_delay {
            return None;
        }

        self.decision_timer = 0.0;
        self.decision_delay = self.rng.uniform(self.min_delay, self.max_delay);
        self.decide(question?)
    }

    fn decide(&mut self, question: &Question) -> Option<GuessIntent> {
        let unguessed: Vec<_> = question.unguessed_answers().collect();
        if unguessed.is_empty() {
            return None;
        }

        if self.rng.uniform(0.0, 1.0) < self.hit_chance {
            let chosen = unguessed[self.rng.index(unguessed.len())];
            Some(GuessIntent::Guess(chosen.text().to_string()))
        } else {
            Some(GuessIntent::Miss)
        }
    }
}
