//! The task that owns the game
//!
//! Every mutation of the controller and the crowd happens here, one message
//! or tick at a time. Connections only talk to it through [`AppState`].

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use super::{AppState, GameCommand, StateError};
use crate::bank::{save_bank, QuestionData};
use crate::controller::{Command, GameSnapshot, RoundController, RoundEvent};
use crate::crowd::{Crowd, Member};
use crate::llm::QuestionGenerator;
use crate::protocol::{GenerationStatus, ServerMessage};
use crate::question::Question;
use crate::types::GameState;

/// Crowd positions are streamed at most this often while anyone walks
const CROWD_INTERVAL: Duration = Duration::from_millis(50);

pub struct LoopOptions {
    pub tick_hz: u32,
    /// Where regenerated banks are written
    pub bank_path: PathBuf,
    pub generate_on_restart: bool,
    pub generator: Option<Arc<QuestionGenerator>>,
}

struct GameLoop {
    controller: RoundController,
    crowd: Crowd,
    options: LoopOptions,
    generating: bool,
    broadcast: broadcast::Sender<ServerMessage>,
    snapshot: watch::Sender<GameSnapshot>,
    crowd_positions: watch::Sender<Vec<Member>>,
    crowd_dirty: bool,
    crowd_sent_at: Instant,
    bank_tx: mpsc::Sender<Result<Vec<QuestionData>, String>>,
}

/// Start the game loop and hand back the state connections use to reach it
///
/// The loop ends after the game is quit; the returned handle resolves then.
pub fn spawn_game_loop(
    controller: RoundController,
    crowd: Crowd,
    options: LoopOptions,
) -> (AppState, JoinHandle<()>) {
    let (command_tx, mut command_rx) = mpsc::channel(64);
    let (bank_tx, mut bank_rx) = mpsc::channel(4);
    let (broadcast_tx, _rx) = broadcast::channel(256);
    let (snapshot_tx, snapshot_rx) = watch::channel(controller.snapshot());
    let (crowd_tx, crowd_rx) = watch::channel(crowd.members().to_vec());

    let state = AppState::new(command_tx, broadcast_tx.clone(), snapshot_rx, crowd_rx);

    let period = Duration::from_secs_f64(1.0 / f64::from(options.tick_hz.max(1)));
    let mut game = GameLoop {
        controller,
        crowd,
        options,
        generating: false,
        broadcast: broadcast_tx,
        snapshot: snapshot_tx,
        crowd_positions: crowd_tx,
        crowd_dirty: false,
        crowd_sent_at: Instant::now(),
        bank_tx,
    };

    let handle = tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last_tick = Instant::now();

        tracing::info!("Game loop running at {} Hz", 1.0 / period.as_secs_f64());

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let now = Instant::now();
                    game.tick((now - last_tick).as_secs_f64());
                    last_tick = now;
                }
                Some(command) = command_rx.recv() => game.handle_command(command),
                Some(result) = bank_rx.recv() => game.handle_generated(result),
            }

            game.publish();

            if game.controller.state() == GameState::Quitting {
                tracing::info!("Game loop stopping");
                break;
            }
        }
    });

    (state, handle)
}

impl GameLoop {
    fn tick(&mut self, dt: f64) {
        self.controller.tick(dt);

        if matches!(
            self.controller.state(),
            GameState::RaceActive | GameState::RaceEnd
        ) && self.crowd.is_moving()
        {
            self.crowd.step(dt);
            self.crowd_dirty = true;
        }
    }

    fn handle_command(&mut self, command: GameCommand) {
        match command {
            GameCommand::Screen { command, reply } => {
                let result = self.controller.apply(command).map_err(StateError::from);
                match &result {
                    Ok(()) if command == Command::Restart => {
                        if self.options.generate_on_restart && self.options.generator.is_some() {
                            self.start_generation();
                        }
                    }
                    Ok(()) => {}
                    Err(e) => tracing::debug!("Rejected {:?}: {}", command, e),
                }
                self.reply(reply, result);
            }
            GameCommand::Guess { text, reply } => {
                let result = if self.controller.state() == GameState::RaceActive {
                    Ok(self.controller.submit_guess(&text))
                } else {
                    Err(StateError::NotAcceptingGuesses)
                };
                self.reply(reply, result);
            }
            GameCommand::GenerateQuestions { reply } => {
                let result = if self.options.generator.is_none() {
                    Err(StateError::GeneratorUnavailable)
                } else if !self.controller.can_replace_bank() {
                    Err(StateError::GenerationNotAllowed)
                } else if self.generating {
                    Err(StateError::GenerationInProgress)
                } else {
                    self.start_generation();
                    Ok(())
                };
                self.reply(reply, result);
            }
            GameCommand::Resize { width, height } => {
                let layout = self.crowd.layout().resized(width, height);
                if layout != self.crowd.layout() {
                    tracing::debug!("Layout resized to {}x{}", layout.width, layout.height);
                    self.crowd.rescale(layout);
                    self.crowd_dirty = true;
                }
            }
        }
    }

    /// Run the generator off the loop; the result comes back through `bank_tx`
    fn start_generation(&mut self) {
        let Some(generator) = self.options.generator.clone() else {
            return;
        };
        if self.generating {
            tracing::debug!("Question generation already running");
            return;
        }

        self.generating = true;
        self.send(ServerMessage::Generation {
            status: GenerationStatus::Started,
            message: None,
        });

        let path = self.options.bank_path.clone();
        let bank_tx = self.bank_tx.clone();
        tokio::spawn(async move {
            let job = tokio::spawn(async move {
                let bank = generator.generate().await.map_err(|e| e.to_string())?;
                save_bank(&path, &bank).map_err(|e| e.to_string())?;
                tracing::info!("Saved {} questions to {}", bank.len(), path.display());
                Ok::<_, String>(bank)
            });
            // a panicking generator must still clear `generating`
            let result = job
                .await
                .unwrap_or_else(|e| Err(format!("generation task failed: {}", e)));
            let _ = bank_tx.send(result).await;
        });
    }

    fn handle_generated(&mut self, result: Result<Vec<QuestionData>, String>) {
        self.generating = false;

        match result {
            Ok(bank) => {
                let questions: Vec<Question> = bank.iter().map(Question::from).collect();
                let count = questions.len();
                let status = if self.controller.replace_bank(questions) {
                    tracing::info!("Installed {} generated questions", count);
                    GenerationStatus::Installed
                } else {
                    tracing::info!("Holding {} generated questions until the next game", count);
                    GenerationStatus::Pending
                };
                self.send(ServerMessage::Generation {
                    status,
                    message: Some(format!("{} new questions", count)),
                });
            }
            Err(e) => {
                tracing::error!("Question generation failed, keeping current bank: {}", e);
                self.send(ServerMessage::Generation {
                    status: GenerationStatus::Failed,
                    message: Some(e),
                });
            }
        }
    }

    /// Push everything that changed since the last iteration out to clients
    fn publish(&mut self) {
        for event in self.controller.drain_events() {
            match &event {
                RoundEvent::RoundStarted { .. } => {
                    self.crowd.reset();
                    self.crowd_dirty = true;
                }
                RoundEvent::Revealed { by, points, .. } => {
                    self.crowd.react(*by, *points);
                    self.crowd_dirty = true;
                }
                _ => {}
            }
            self.send(ServerMessage::Event { event });
        }

        let snapshot = self.controller.snapshot();
        let changed = self.snapshot.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot.clone();
                true
            }
        });
        if changed {
            self.send(ServerMessage::Snapshot { snapshot });
        }

        let quitting = self.controller.state() == GameState::Quitting;
        if self.crowd_dirty
            && (quitting
                || self.crowd_sent_at.elapsed() >= CROWD_INTERVAL
                || !self.crowd.is_moving())
        {
            let members = self.crowd.members().to_vec();
            self.crowd_positions.send_replace(members.clone());
            self.send(ServerMessage::Crowd { members });
            self.crowd_dirty = false;
            self.crowd_sent_at = Instant::now();
        }
    }

    /// Replies go out only after the resulting state has been published, so a
    /// caller reading the snapshot right after its reply sees the change
    fn reply<T>(&mut self, reply: oneshot::Sender<T>, result: T) {
        self.publish();
        let _ = reply.send(result);
    }

    fn send(&self, msg: ServerMessage) {
        // no receivers connected is fine
        let _ = self.broadcast.send(msg);
    }
}
