//! Round and game lifecycle
//!
//! [`RoundController`] is pure game logic with no I/O: it owns the question
//! bank, both players and the countdown, and is driven only through
//! [`RoundController::tick`], [`RoundController::submit_guess`] and
//! [`RoundController::apply`]. Everything observable happens through the
//! queued [`RoundEvent`]s and [`RoundController::snapshot`].

use serde::{Deserialize, Serialize};

use crate::player::{AiPlayer, GuessIntent, Player, RandomSource};
use crate::question::Question;
use crate::types::{GameConfig, GameId, GameState, Outcome, PlayerKind};

/// Host-style commands that move the game between screens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Start,
    Advance,
    Restart,
    Quit,
}

impl Command {
    fn name(self) -> &'static str {
        match self {
            Command::Start => "start",
            Command::Advance => "advance",
            Command::Restart => "restart",
            Command::Quit => "quit",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("cannot {command} while in {state:?}")]
    NotAllowed {
        command: &'static str,
        state: GameState,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RoundEvent {
    StateChanged {
        state: GameState,
    },
    RoundStarted {
        round: u32,
        max_rounds: u32,
    },
    Revealed {
        by: PlayerKind,
        /// 1-based position on the board
        slot: usize,
        text: String,
        points: u32,
    },
    Incorrect {
        by: PlayerKind,
    },
    AlreadyGuessed {
        by: PlayerKind,
        text: String,
    },
    RoundEnded {
        round: u32,
        fully_revealed: bool,
    },
    GameOver {
        outcome: Outcome,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerView {
    pub slot: usize,
    /// Full text once guessed or the round is over, otherwise a hint mask
    pub text: String,
    pub points: Option<u32>,
    pub guessed: bool,
    pub guesser: Option<PlayerKind>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerView {
    pub kind: PlayerKind,
    pub name: String,
    pub round_score: u32,
    pub game_score: u32,
}

impl From<&Player> for PlayerView {
    fn from(player: &Player) -> Self {
        Self {
            kind: player.kind(),
            name: player.name().to_string(),
            round_score: player.round_score(),
            game_score: player.game_score(),
        }
    }
}

/// Everything a presentation layer needs to draw the current frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub game_id: GameId,
    pub state: GameState,
    pub round: u32,
    pub max_rounds: u32,
    /// Whole seconds left in the round, never negative
    pub time_left: u32,
    pub question: Option<String>,
    pub answers: Vec<AnswerView>,
    pub human: PlayerView,
    pub ai: PlayerView,
    pub outcome: Option<Outcome>,
}

pub struct RoundController {
    config: GameConfig,
    game_id: GameId,
    state: GameState,
    questions: Vec<Question>,
    /// Bank delivered while a game was running; installed at the next start
    pending_bank: Option<Vec<Question>>,
    current_index: Option<usize>,
    round_number: u32,
    countdown: f64,
    human: Player,
    ai: AiPlayer,
    events: Vec<RoundEvent>,
}

impl std::fmt::Debug for RoundController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoundController")
            .field("state", &self.state)
            .field("round_number", &self.round_number)
            .field("countdown", &self.countdown)
            .finish_non_exhaustive()
    }
}

impl RoundController {
    /// A controller starts in `Loading` until its bank is installed
    pub fn new(config: GameConfig, rng: Box<dyn RandomSource>) -> Self {
        let human = Player::new(PlayerKind::Human, config.human_name.clone());
        let ai = AiPlayer::new(&config, rng);
        Self {
            game_id: ulid::Ulid::new().to_string(),
            state: GameState::Loading,
            questions: Vec::new(),
            pending_bank: None,
            current_index: None,
            round_number: 0,
            countdown: config.round_seconds,
            human,
            ai,
            events: Vec::new(),
            config,
        }
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn round_number(&self) -> u32 {
        self.round_number
    }

    pub fn countdown(&self) -> f64 {
        self.countdown
    }

    pub fn human(&self) -> &Player {
        &self.human
    }

    pub fn ai(&self) -> &AiPlayer {
        &self.ai
    }

    pub fn has_pending_bank(&self) -> bool {
        self.pending_bank.is_some()
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.current_index.and_then(|i| self.questions.get(i))
    }

    /// A new bank may only be swapped in between games
    pub fn can_replace_bank(&self) -> bool {
        matches!(
            self.state,
            GameState::Loading | GameState::Menu | GameState::GameOver
        )
    }

    /// Take all events queued since the last drain
    pub fn drain_events(&mut self) -> Vec<RoundEvent> {
        std::mem::take(&mut self.events)
    }

    /// Install the startup bank and show the menu
    pub fn finish_loading(&mut self, questions: Vec<Question>) {
        if self.state != GameState::Loading {
            tracing::warn!("Ignoring bank load outside of Loading");
            return;
        }
        self.questions = questions;
        self.set_state(GameState::Menu);
    }

    /// Hand over a regenerated bank
    ///
    /// Returns `true` when installed right away, `false` when held until the
    /// next game starts.
    pub fn replace_bank(&mut self, questions: Vec<Question>) -> bool {
        if self.can_replace_bank() {
            self.questions = questions;
            self.current_index = None;
            self.pending_bank = None;
            true
        } else {
            self.pending_bank = Some(questions);
            false
        }
    }

    pub fn apply(&mut self, command: Command) -> Result<(), CommandError> {
        match (command, self.state) {
            (Command::Quit, _) => {
                self.set_state(GameState::Quitting);
                Ok(())
            }
            (Command::Start, GameState::Menu) => {
                self.start_new_game();
                Ok(())
            }
            (Command::Advance, GameState::RaceEnd) => {
                if self.round_number >= self.config.max_rounds {
                    self.end_game();
                } else {
                    self.start_new_round();
                }
                Ok(())
            }
            (Command::Restart, GameState::GameOver) => {
                self.human.reset_game_score();
                self.ai.player_mut().reset_game_score();
                self.round_number = 0;
                self.current_index = None;
                self.set_state(GameState::Menu);
                Ok(())
            }
            (command, state) => Err(CommandError::NotAllowed {
                command: command.name(),
                state,
            }),
        }
    }

    /// Advance time by `dt` seconds
    ///
    /// Only has an effect while a race is running: the countdown drops, the
    /// round ends once it reaches zero, and otherwise the AI gets its turn.
    pub fn tick(&mut self, dt: f64) {
        if self.state != GameState::RaceActive {
            return;
        }

        self.countdown -= dt;
        if self.countdown <= 0.0 {
            self.end_round();
            return;
        }

        let question = self.current_index.and_then(|i| self.questions.get(i));
        match self.ai.tick(dt, true, question) {
            Some(GuessIntent::Guess(text)) => {
                self.check_answer(&text, PlayerKind::Ai);
            }
            Some(GuessIntent::Miss) => {
                self.push_event(RoundEvent::Incorrect { by: PlayerKind::Ai });
            }
            None => {}
        }
    }

    /// Human guess from the input path
    ///
    /// Ignored outside a running race and for blank input.
    pub fn submit_guess(&mut self, text: &str) -> Option<RoundEvent> {
        if self.state != GameState::RaceActive || text.trim().is_empty() {
            return None;
        }
        self.check_answer(text, PlayerKind::Human)
    }

    fn check_answer(&mut self, text: &str, by: PlayerKind) -> Option<RoundEvent> {
        let threshold = self.config.match_threshold;
        let question = self
            .current_index
            .and_then(|i| self.questions.get_mut(i))?;

        let event = match question.resolve_with_threshold(text, by, threshold) {
            None => RoundEvent::Incorrect { by },
            Some(answer) if answer.is_guessed() => RoundEvent::AlreadyGuessed {
                by,
                text: answer.text().to_string(),
            },
            Some(answer) => {
                answer.guess();
                let text = answer.text().to_string();
                let points = answer.points();
                let slot = question
                    .answers()
                    .iter()
                    .position(|a| a.text() == text)
                    .map_or(0, |i| i + 1);
                RoundEvent::Revealed {
                    by,
                    slot,
                    text,
                    points,
                }
            }
        };

        if let RoundEvent::Revealed { points, .. } = &event {
            match by {
                PlayerKind::Human => self.human.add_score(*points),
                PlayerKind::Ai => self.ai.player_mut().add_score(*points),
            }
            if self
                .current_question()
                .is_some_and(Question::is_fully_revealed)
            {
                // picked up by the next tick
                self.countdown = 0.0;
            }
        }

        tracing::debug!("Guess by {:?}: {:?}", by, event);
        self.push_event(event.clone());
        Some(event)
    }

    fn start_new_game(&mut self) {
        if let Some(bank) = self.pending_bank.take() {
            tracing::info!("Installing pending question bank ({} questions)", bank.len());
            self.questions = bank;
        }

        self.game_id = ulid::Ulid::new().to_string();
        self.human.reset_game_score();
        self.ai.reset_for_new_game();
        self.round_number = 0;
        self.current_index = None;
        for question in &mut self.questions {
            question.reset();
        }
        self.start_new_round();
    }

    fn start_new_round(&mut self) {
        self.round_number += 1;
        self.human.reset_round_score();
        self.ai.player_mut().reset_round_score();

        let mut next = self.current_index.map_or(0, |i| i + 1);
        if next >= self.questions.len() {
            next = 0;
            for question in &mut self.questions {
                question.reset();
            }
        }
        self.current_index = Some(next);
        if let Some(question) = self.questions.get_mut(next) {
            question.reset();
        } else {
            tracing::warn!("Round {} has no question to play", self.round_number);
        }

        self.countdown = self.config.round_seconds;
        self.ai.reset_timer();
        self.set_state(GameState::RaceActive);
        self.push_event(RoundEvent::RoundStarted {
            round: self.round_number,
            max_rounds: self.config.max_rounds,
        });
    }

    fn end_round(&mut self) {
        self.countdown = 0.0;
        let fully_revealed = self
            .current_question()
            .is_some_and(Question::is_fully_revealed);
        self.set_state(GameState::RaceEnd);
        self.push_event(RoundEvent::RoundEnded {
            round: self.round_number,
            fully_revealed,
        });
    }

    fn end_game(&mut self) {
        self.set_state(GameState::GameOver);
        self.push_event(RoundEvent::GameOver {
            outcome: self.outcome(),
        });
    }

    /// Winner by cumulative game score
    pub fn outcome(&self) -> Outcome {
        let human = self.human.game_score();
        let ai = self.ai.player().game_score();
        match human.cmp(&ai) {
            std::cmp::Ordering::Greater => Outcome::Human,
            std::cmp::Ordering::Less => Outcome::Ai,
            std::cmp::Ordering::Equal => Outcome::Tie,
        }
    }

    fn set_state(&mut self, state: GameState) {
        if self.state != state {
            tracing::info!("Game state {:?} -> {:?}", self.state, state);
            self.state = state;
            self.push_event(RoundEvent::StateChanged { state });
        }
    }

    fn push_event(&mut self, event: RoundEvent) {
        self.events.push(event);
    }

    pub fn snapshot(&self) -> GameSnapshot {
        let reveal_all = self.state != GameState::RaceActive;
        let remaining = self.countdown.max(0.0);

        let (question, answers) = match self.current_question() {
            Some(q) if self.round_number > 0 => {
                let answers = q
                    .answers()
                    .iter()
                    .enumerate()
                    .map(|(i, answer)| {
                        let shown = answer.is_guessed() || reveal_all;
                        AnswerView {
                            slot: i + 1,
                            text: if shown {
                                answer.text().to_string()
                            } else {
                                answer.hint(remaining)
                            },
                            points: shown.then(|| answer.points()),
                            guessed: answer.is_guessed(),
                            guesser: answer.guesser().filter(|_| answer.is_guessed()),
                        }
                    })
                    .collect();
                (Some(q.prompt().to_string()), answers)
            }
            _ => (None, Vec::new()),
        };

        GameSnapshot {
            game_id: self.game_id.clone(),
            state: self.state,
            round: self.round_number,
            max_rounds: self.config.max_rounds,
            time_left: remaining as u32,
            question,
            answers,
            human: PlayerView::from(&self.human),
            ai: PlayerView::from(self.ai.player()),
            outcome: (self.state == GameState::GameOver).then(|| self.outcome()),
        }
    }
}
