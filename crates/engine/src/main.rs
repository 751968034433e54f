//! RetroDesk engine - line-oriented host for the clue discovery engine.
//!
//! Reads wire-format actions (`{"type", "value", "timestamp"}`) as JSON lines
//! on stdin and prints every mystery event as a JSON line on stdout. Logs go
//! to stderr.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use retrodesk_engine::entities::Catalogue;
use retrodesk_engine::infrastructure::{
    clock::SystemClock, config::EngineConfig, file_system::InMemoryFileSystem,
    ports::ClockPort, sqlite_save::SqliteSaveStore,
};
use retrodesk_engine::use_cases::CustomMatchers;
use retrodesk_engine::App;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment from repo root (cargo runs the binary from `crates/engine`).
    load_dotenv_from_repo_root();

    // Initialize logging. Stdout carries events, so logs go to stderr.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "retrodesk_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting RetroDesk engine");

    let config = EngineConfig::from_env();
    tracing::info!(
        save_db = %config.save_db,
        save_slot = %config.save_slot,
        autosave = ?config.autosave_interval,
        "Loaded configuration"
    );

    let clock: Arc<dyn ClockPort> = Arc::new(SystemClock::new());
    let save_store = SqliteSaveStore::new(&config.save_db, clock.clone()).await?;
    let file_system = seed_file_system(clock.clone());

    let app = App::new(
        Catalogue::standard()?,
        Arc::new(save_store),
        Arc::new(file_system),
        clock,
        CustomMatchers::new(),
        config.save_slot.clone(),
    );
    app.load().await;

    // Print events as they happen
    let (subscription, mut events) = app.bridge.subscribe();
    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match serde_json::to_string(&event) {
                Ok(line) => println!("{line}"),
                Err(e) => tracing::warn!(error = %e, "Failed to serialize event"),
            }
        }
    });

    let cancel_token = CancellationToken::new();
    setup_shutdown_signal(cancel_token.clone());

    let autosave = config
        .autosave_interval
        .map(|interval| app.spawn_autosave(interval, cancel_token.clone()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => break,
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        app.recorder.record_raw(line);
                    }
                }
                Ok(None) => {
                    tracing::info!("Input closed, shutting down");
                    break;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to read input");
                    break;
                }
            },
        }
    }

    cancel_token.cancel();
    if let Some(autosave) = autosave {
        if let Err(e) = autosave.await {
            tracing::error!(error = %e, "Autosave worker panicked");
        }
    }
    // Covers disabled autosave; a no-op when the worker already flushed.
    app.save().await;

    drop(subscription);
    if let Err(e) = printer.await {
        tracing::error!(error = %e, "Event printer panicked");
    }

    tracing::info!("RetroDesk engine stopped");
    Ok(())
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}

/// Cancels `cancel_token` on SIGTERM/SIGINT.
fn setup_shutdown_signal(cancel_token: CancellationToken) {
    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut signal) => {
                    signal.recv().await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to install SIGTERM handler");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
            }
            _ = terminate => {
                tracing::info!("Received SIGTERM, initiating graceful shutdown...");
            }
        }

        cancel_token.cancel();
    });
}

/// The desktop's starting file tree.
fn seed_file_system(clock: Arc<dyn ClockPort>) -> InMemoryFileSystem {
    InMemoryFileSystem::new(clock)
        .with_file("/system/backup/admin.bak", "# backup 1997-03-13\nuser=admin\npassword=THX1138\n")
        .with_file("/home/user/journal/03-01.txt", "Started at the lab today.")
        .with_file("/home/user/journal/03-07.txt", "They moved the server to the basement.")
        .with_file("/home/user/journal/03-15.txt", "Where did last week go?")
        .with_file("/home/user/readme.txt", "Welcome to RetroDesk 97.")
}
