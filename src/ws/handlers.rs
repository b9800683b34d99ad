//! WebSocket message dispatch

use crate::protocol::{ClientMessage, ServerMessage};
use crate::state::{AppState, StateError};

fn error_reply(e: StateError) -> Option<ServerMessage> {
    Some(ServerMessage::error(e.code(), e.to_string()))
}

/// Handle a client message and return an optional direct response
///
/// Successful actions are answered through the broadcast (events,
/// snapshots, generation status), so only failures get a direct reply.
pub async fn handle_message(msg: ClientMessage, state: &AppState) -> Option<ServerMessage> {
    if let Some(command) = msg.command() {
        tracing::info!("Command: {:?}", command);
        return state.send_command(command).await.err().and_then(error_reply);
    }

    match msg {
        ClientMessage::SubmitGuess { text } => match state.submit_guess(text).await {
            Ok(_) => None,
            Err(e) => error_reply(e),
        },

        ClientMessage::GenerateQuestions => {
            state.generate_questions().await.err().and_then(error_reply)
        }

        ClientMessage::Resize { width, height } => {
            if !(width.is_finite() && height.is_finite()) {
                return Some(ServerMessage::error(
                    "INVALID_SIZE",
                    "Width and height must be finite numbers",
                ));
            }
            state.resize(width, height).await.err().and_then(error_reply)
        }

        ClientMessage::Start
        | ClientMessage::Advance
        | ClientMessage::Restart
        | ClientMessage::Quit => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::RoundController;
    use crate::crowd::{Crowd, Layout};
    use crate::player::ScriptedRandom;
    use crate::question::Question;
    use crate::state::{spawn_game_loop, LoopOptions};
    use crate::types::{GameConfig, GameState};
    use std::path::PathBuf;

    fn create_test_state() -> AppState {
        let config = GameConfig {
            ai_initial_delay: 1000.0,
            ..GameConfig::default()
        };
        let mut controller = RoundController::new(config, Box::new(ScriptedRandom::default()));
        controller.finish_loading(vec![Question::new(
            "Name a popular street food in Hong Kong.",
            [("EGG WAFFLE", 30), ("FISH BALL", 25)],
        )]);
        let crowd = Crowd::new(5, Layout::default(), Box::new(ScriptedRandom::default()));
        let (state, _handle) = spawn_game_loop(
            controller,
            crowd,
            LoopOptions {
                tick_hz: 60,
                bank_path: PathBuf::from("unused.json"),
                generate_on_restart: false,
                generator: None,
            },
        );
        state
    }

    fn error_code(msg: Option<ServerMessage>) -> String {
        match msg {
            Some(ServerMessage::Error { code, .. }) => code,
            other => panic!("Expected error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_start_has_no_direct_reply() {
        let state = create_test_state();
        assert!(handle_message(ClientMessage::Start, &state).await.is_none());
        assert_eq!(state.snapshot().state, GameState::RaceActive);
    }

    #[tokio::test]
    async fn test_advance_in_menu_is_invalid() {
        let state = create_test_state();
        let reply = handle_message(ClientMessage::Advance, &state).await;
        assert_eq!(error_code(reply), "INVALID_COMMAND");
    }

    #[tokio::test]
    async fn test_guess_before_start_is_rejected() {
        let state = create_test_state();
        let reply = handle_message(
            ClientMessage::SubmitGuess {
                text: "fish ball".to_string(),
            },
            &state,
        )
        .await;
        assert_eq!(error_code(reply), "NOT_ACCEPTING_GUESSES");
    }

    #[tokio::test]
    async fn test_guess_during_round() {
        let state = create_test_state();
        handle_message(ClientMessage::Start, &state).await;

        let reply = handle_message(
            ClientMessage::SubmitGuess {
                text: "FISHBALL".to_string(),
            },
            &state,
        )
        .await;
        assert!(reply.is_none());

        let snapshot = state.snapshot();
        assert_eq!(snapshot.human.round_score, 25);
        assert_eq!(snapshot.answers[1].text, "FISH BALL");
    }

    #[tokio::test]
    async fn test_generate_without_provider() {
        let state = create_test_state();
        let reply = handle_message(ClientMessage::GenerateQuestions, &state).await;
        assert_eq!(error_code(reply), "GENERATION_UNAVAILABLE");
    }

    #[tokio::test]
    async fn test_resize_rejects_nan() {
        let state = create_test_state();
        let reply = handle_message(
            ClientMessage::Resize {
                width: f64::NAN,
                height: 700.0,
            },
            &state,
        )
        .await;
        assert_eq!(error_code(reply), "INVALID_SIZE");
    }
}
