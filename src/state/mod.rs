mod game_loop;

pub use game_loop::{spawn_game_loop, LoopOptions};

use crate::controller::{Command, CommandError, GameSnapshot, RoundEvent};
use crate::crowd::Member;
use crate::protocol::ServerMessage;
use crate::types::GameState;
use tokio::sync::{broadcast, mpsc, oneshot, watch};

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("guesses are only accepted while a round is running")]
    NotAcceptingGuesses,

    #[error("question generation is not configured")]
    GeneratorUnavailable,

    #[error("questions can only be generated from the menu or the final results")]
    GenerationNotAllowed,

    #[error("question generation is already running")]
    GenerationInProgress,

    #[error("game loop has stopped")]
    LoopClosed,
}

impl StateError {
    /// Error code sent to clients
    pub fn code(&self) -> &'static str {
        match self {
            StateError::Command(_) | StateError::GenerationNotAllowed => "INVALID_COMMAND",
            StateError::NotAcceptingGuesses => "NOT_ACCEPTING_GUESSES",
            StateError::GeneratorUnavailable => "GENERATION_UNAVAILABLE",
            StateError::GenerationInProgress => "GENERATION_IN_PROGRESS",
            StateError::LoopClosed => "SHUTTING_DOWN",
        }
    }
}

/// Requests handled by the game loop, each with its own reply channel
#[derive(Debug)]
pub enum GameCommand {
    Screen {
        command: Command,
        reply: oneshot::Sender<Result<(), StateError>>,
    },
    Guess {
        text: String,
        reply: oneshot::Sender<Result<Option<RoundEvent>, StateError>>,
    },
    GenerateQuestions {
        reply: oneshot::Sender<Result<(), StateError>>,
    },
    Resize {
        width: f64,
        height: f64,
    },
}

/// Handle to the running game, cheap to clone into every connection
#[derive(Clone)]
pub struct AppState {
    commands: mpsc::Sender<GameCommand>,
    /// Events, snapshots and crowd updates for all clients
    pub broadcast: broadcast::Sender<ServerMessage>,
    snapshot: watch::Receiver<GameSnapshot>,
    crowd: watch::Receiver<Vec<Member>>,
}

impl AppState {
    pub(crate) fn new(
        commands: mpsc::Sender<GameCommand>,
        broadcast: broadcast::Sender<ServerMessage>,
        snapshot: watch::Receiver<GameSnapshot>,
        crowd: watch::Receiver<Vec<Member>>,
    ) -> Self {
        Self {
            commands,
            broadcast,
            snapshot,
            crowd,
        }
    }

    pub fn snapshot(&self) -> GameSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn crowd(&self) -> Vec<Member> {
        self.crowd.borrow().clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ServerMessage> {
        self.broadcast.subscribe()
    }

    pub async fn send_command(&self, command: Command) -> Result<(), StateError> {
        let (reply, rx) = oneshot::channel();
        self.request(GameCommand::Screen { command, reply }, rx)
            .await?
    }

    /// Submit a human guess; the outcome is also broadcast as an event
    ///
    /// `Ok(None)` means the guess was blank or there is no question to answer.
    pub async fn submit_guess(&self, text: String) -> Result<Option<RoundEvent>, StateError> {
        let (reply, rx) = oneshot::channel();
        self.request(GameCommand::Guess { text, reply }, rx).await?
    }

    pub async fn generate_questions(&self) -> Result<(), StateError> {
        let (reply, rx) = oneshot::channel();
        self.request(GameCommand::GenerateQuestions { reply }, rx)
            .await?
    }

    pub async fn resize(&self, width: f64, height: f64) -> Result<(), StateError> {
        self.commands
            .send(GameCommand::Resize { width, height })
            .await
            .map_err(|_| StateError::LoopClosed)
    }

    /// Resolves once the game has been quit or the loop is gone
    pub async fn wait_for_quit(&self) {
        let mut snapshot = self.snapshot.clone();
        let _ = snapshot
            .wait_for(|s| s.state == GameState::Quitting)
            .await;
    }

    async fn request<T>(
        &self,
        command: GameCommand,
        rx: oneshot::Receiver<T>,
    ) -> Result<T, StateError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| StateError::LoopClosed)?;
        rx.await.map_err(|_| StateError::LoopClosed)
    }
}
