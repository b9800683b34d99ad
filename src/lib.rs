// Public API for integration tests and potential library usage

pub mod api;
pub mod bank;
pub mod config;
pub mod controller;
pub mod crowd;
pub mod llm;
pub mod player;
pub mod protocol;
pub mod question;
pub mod similarity;
pub mod state;
pub mod types;
pub mod ws;
