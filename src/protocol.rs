use serde::{Deserialize, Serialize};

use crate::controller::{Command, GameSnapshot, RoundEvent};
use crate::crowd::Member;

pub const PROTOCOL_VERSION: &str = "1.0";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Menu -> first round
    Start,
    /// Round over -> next round or final results
    Advance,
    /// Final results -> menu
    Restart,
    Quit,
    SubmitGuess {
        text: String,
    },
    /// Ask for a fresh question bank (menu and game over only)
    GenerateQuestions,
    Resize {
        width: f64,
        height: f64,
    },
}

impl ClientMessage {
    /// The screen command this message maps to, if any
    pub fn command(&self) -> Option<Command> {
        match self {
            ClientMessage::Start => Some(Command::Start),
            ClientMessage::Advance => Some(Command::Advance),
            ClientMessage::Restart => Some(Command::Restart),
            ClientMessage::Quit => Some(Command::Quit),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome {
        protocol: String,
        snapshot: GameSnapshot,
        server_now: String,
    },
    Snapshot {
        snapshot: GameSnapshot,
    },
    Event {
        event: RoundEvent,
    },
    /// Audience positions, sent while anyone is walking
    Crowd {
        members: Vec<Member>,
    },
    Generation {
        status: GenerationStatus,
        message: Option<String>,
    },
    Error {
        code: String,
        msg: String,
    },
}

impl ServerMessage {
    pub fn error(code: &str, msg: impl Into<String>) -> Self {
        ServerMessage::Error {
            code: code.to_string(),
            msg: msg.into(),
        }
    }
}

/// Progress of a question bank regeneration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStatus {
    Started,
    /// New bank is live
    Installed,
    /// New bank saved; takes effect when the next game starts
    Pending,
    Failed,
}
