//! Terminal front end for the Tinfoil incremental game.
//!
//! Wires the engine to a console: loads configuration and the content
//! catalog, opens (or starts) a save slot, and runs the session loop with
//! stdin commands as intents and printed notifications as output.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `TINFOIL_CONFIG` or `tinfoil-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Load the content catalog (bundled unless `catalog_path` is set)
//! 4. Pick the save slot from the first argument or `default_slot`
//! 5. Resume the slot with offline catch-up, or start a new game
//! 6. Spawn the console reader and notification printer
//! 7. Run the session until `quit` or end of input
//! 8. Log the result

mod console;
mod error;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use tinfoil_core::clock::{Clock, SystemClock};
use tinfoil_core::config::LoggingConfig;
use tinfoil_core::persistence::{JsonFileStore, SaveSlot};
use tinfoil_core::{ContentCatalog, EngineConfig, GameEngine, runner};
use tokio::sync::{broadcast, mpsc};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// Config file used when `TINFOIL_CONFIG` is unset.
const DEFAULT_CONFIG_PATH: &str = "tinfoil-config.yaml";

/// Intents buffered between the console and the session.
const INTENT_BUFFER: usize = 64;

/// Notifications buffered for slow subscribers.
const NOTIFICATION_BUFFER: usize = 1024;

/// Application entry point.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    run().await.context("tinfoil-engine failed")
}

async fn run() -> Result<(), EngineError> {
    // 1. Load configuration.
    let (config, config_path) = load_config()?;

    // 2. Initialize structured logging.
    init_logging(&config.logging);
    info!(
        config = %config_path.display(),
        tick_interval_ms = config.session.tick_interval_ms,
        autosave_interval_ticks = config.session.autosave_interval_ticks,
        save_dir = %config.session.save_dir.display(),
        "tinfoil-engine starting"
    );

    // 3. Load the content catalog.
    let catalog = Arc::new(match &config.session.catalog_path {
        Some(path) => ContentCatalog::from_file(path)?,
        None => ContentCatalog::bundled()?,
    });
    info!(
        generators = catalog.generators().len(),
        quests = catalog.quests().len(),
        achievements = catalog.achievements().len(),
        "content catalog ready"
    );

    // 4. Pick the save slot.
    let slot = pick_slot(std::env::args().nth(1), config.session.default_slot)?;
    let store = JsonFileStore::new(config.session.save_dir.clone());

    // 5. Resume or start fresh.
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let engine = match GameEngine::load(
        Arc::clone(&catalog),
        config.clone(),
        Arc::clone(&clock),
        &store,
        slot,
    ) {
        Some(engine) => engine,
        None => {
            info!(%slot, "slot empty, starting a new game");
            GameEngine::new(catalog, config.clone(), clock)
        }
    };

    // 6. Console tasks.
    let (intent_tx, intent_rx) = mpsc::channel(INTENT_BUFFER);
    let (note_tx, note_rx) = broadcast::channel(NOTIFICATION_BUFFER);
    let printer = tokio::spawn(console::print_notifications(note_rx));
    let reader = tokio::spawn(console::read_commands(intent_tx));

    // 7. Run the session.
    let result =
        runner::run_session(engine, &store, slot, intent_rx, &note_tx, &config.session).await;

    // Stdin reads cannot be cancelled cleanly; the reader is simply dropped.
    reader.abort();
    drop(note_tx);
    if let Err(err) = printer.await {
        tracing::warn!(error = %err, "notification printer stopped abnormally");
    }

    // 8. Log the result.
    let engine = result?;
    let state = engine.state();
    info!(
        %slot,
        ticks = state.ticks,
        evidence = state.balances.evidence,
        lifetime_evidence = state.balances.total_evidence_earned,
        times_ascended = state.times_ascended,
        "tinfoil-engine shutdown complete"
    );
    Ok(())
}

/// Load configuration from `TINFOIL_CONFIG` or the default path.
///
/// A missing file means defaults; a malformed one is an error.
fn load_config() -> Result<(EngineConfig, PathBuf), EngineError> {
    let path = std::env::var_os("TINFOIL_CONFIG")
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    if path.exists() {
        let config = EngineConfig::from_file(&path)?;
        Ok((config, path))
    } else {
        Ok((EngineConfig::default(), path))
    }
}

/// `RUST_LOG` wins over the configured level.
fn init_logging(logging: &LoggingConfig) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(logging.level.as_str())),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

/// The slot named on the command line, or the configured default.
fn pick_slot(arg: Option<String>, default_slot: u8) -> Result<SaveSlot, EngineError> {
    let number = match arg {
        None => default_slot,
        Some(text) => text.trim().parse::<u8>().map_err(|err| EngineError::Usage {
            message: format!("slot `{text}`: {err}"),
        })?,
    };
    Ok(SaveSlot::try_from(number)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tinfoil_core::persistence::PersistError;

    use super::*;

    #[test]
    fn slot_defaults_to_config() {
        assert_eq!(pick_slot(None, 2).unwrap(), SaveSlot::Two);
    }

    #[test]
    fn slot_argument_overrides_default() {
        assert_eq!(pick_slot(Some("3".to_owned()), 1).unwrap(), SaveSlot::Three);
    }

    #[test]
    fn bad_slot_arguments_are_rejected() {
        assert!(matches!(
            pick_slot(Some("four".to_owned()), 1),
            Err(EngineError::Usage { .. })
        ));
        assert!(matches!(
            pick_slot(Some("4".to_owned()), 1),
            Err(EngineError::Persist {
                source: PersistError::InvalidSlot { slot: 4 }
            })
        ));
    }
}
