use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use guessdash::bank::{load_or_empty, save_bank};
use guessdash::config::AppConfig;
use guessdash::controller::{Command, RoundController};
use guessdash::crowd::{Crowd, Layout};
use guessdash::llm::{self, QuestionGenerator};
use guessdash::player::os_random;
use guessdash::state::{spawn_game_loop, AppState, LoopOptions};
use guessdash::types::GameConfig;

/// Resolves on Ctrl-C or once the game has been quit
async fn shutdown_signal(state: AppState) {
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                tracing::error!("Failed to listen for Ctrl-C: {}", e);
            }
            tracing::info!("Ctrl-C received, quitting");
            let _ = state.send_command(Command::Quit).await;
        }
        _ = state.wait_for_quit() => {
            tracing::info!("Game quit, shutting down");
        }
    }
}

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist, only log if it's a different issue
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "guessdash=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Guess Their Answer...");

    let app_config = AppConfig::from_env();
    let game_config = GameConfig::from_env();

    let llm_config = llm::LlmConfig::from_env();
    let generator = match llm_config.build_manager() {
        Ok(manager) => {
            tracing::info!("LLM providers initialized successfully");
            Some(Arc::new(QuestionGenerator::new(manager, llm_config)))
        }
        Err(e) => {
            tracing::warn!(
                "Failed to initialize LLM providers: {}. Questions will not be regenerated.",
                e
            );
            None
        }
    };

    if app_config.generate_on_startup {
        if let Some(generator) = &generator {
            match generator.generate().await {
                Ok(bank) => {
                    if let Err(e) = save_bank(&app_config.question_bank_path, &bank) {
                        tracing::error!("Failed to save generated questions: {}", e);
                    }
                }
                Err(e) => tracing::error!("Question generation failed: {}", e),
            }
        }
    }

    let mut controller = RoundController::new(game_config.clone(), os_random());
    controller.finish_loading(load_or_empty(&app_config.question_bank_path));
    let crowd = Crowd::new(game_config.crowd_size, Layout::default(), os_random());

    let (state, game_loop) = spawn_game_loop(
        controller,
        crowd,
        LoopOptions {
            tick_hz: app_config.tick_hz,
            bank_path: app_config.question_bank_path.clone(),
            generate_on_restart: app_config.generate_on_restart,
            generator,
        },
    );

    let app = guessdash::api::router(state.clone(), &app_config.static_dir);

    let addr = app_config.socket_addr();
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(state))
        .await
        .unwrap();

    if let Err(e) = game_loop.await {
        tracing::error!("Game loop ended abnormally: {}", e);
    }
    tracing::info!("Goodbye");
}
