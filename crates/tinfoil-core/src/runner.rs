//! The async session loop.
//!
//! [`run_session`] owns the [`GameEngine`] for the life of a session. It
//! selects between a fixed-interval tick and an intent channel, so an
//! intent is never handled while a tick is in progress. Every intent
//! carries a `oneshot` reply; notifications drained after each step are
//! forwarded on a `broadcast` channel.
//!
//! The loop autosaves every `autosave_interval_ticks` ticks and saves once
//! more on shutdown ([`Intent::Quit`] or the intent channel closing).

use std::time::Duration;

use tinfoil_types::{GameState, Notification, SlotInfo};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace, warn};

use crate::config::SessionConfig;
use crate::engine::GameEngine;
use crate::persistence::{PersistError, SaveSlot, SaveStore};

/// Errors that end a session abnormally.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// The shutdown save failed.
    #[error("final save failed: {source}")]
    Persist {
        /// The underlying persistence error.
        #[from]
        source: PersistError,
    },
}

/// A request from the presentation layer.
#[derive(Debug)]
pub enum Intent {
    /// Resolve a click with an external multiplier.
    Click {
        /// Multiplier supplied by the presentation layer.
        external_multiplier: f64,
        /// Evidence granted.
        reply: oneshot::Sender<f64>,
    },
    /// Buy one generator.
    PurchaseGenerator {
        /// Generator id.
        id: String,
        /// Whether the purchase happened.
        reply: oneshot::Sender<bool>,
    },
    /// Buy several generators, all or nothing.
    PurchaseGenerators {
        /// Generator id.
        id: String,
        /// How many.
        count: u32,
        /// Whether the purchase happened.
        reply: oneshot::Sender<bool>,
    },
    /// Buy as many generators as affordable.
    PurchaseMax {
        /// Generator id.
        id: String,
        /// Number bought.
        reply: oneshot::Sender<u32>,
    },
    /// Buy a shop upgrade.
    PurchaseUpgrade {
        /// Upgrade id.
        id: String,
        /// Whether the purchase happened.
        reply: oneshot::Sender<bool>,
    },
    /// Prove a conspiracy.
    ProveConspiracy {
        /// Conspiracy id.
        id: String,
        /// Whether it was proven.
        reply: oneshot::Sender<bool>,
    },
    /// Unlock a skill.
    UnlockSkill {
        /// Skill id.
        id: String,
        /// Whether it was unlocked.
        reply: oneshot::Sender<bool>,
    },
    /// Buy an Illuminati upgrade.
    PurchaseIlluminatiUpgrade {
        /// Upgrade id.
        id: String,
        /// Whether the purchase happened.
        reply: oneshot::Sender<bool>,
    },
    /// Buy a matrix upgrade.
    PurchaseMatrixUpgrade {
        /// Upgrade id.
        id: String,
        /// Whether the purchase happened.
        reply: oneshot::Sender<bool>,
    },
    /// Start a quest.
    StartQuest {
        /// Quest id.
        id: String,
        /// Whether it started.
        reply: oneshot::Sender<bool>,
    },
    /// Perform Illuminati Ascension.
    Prestige {
        /// Tokens granted, if eligible.
        reply: oneshot::Sender<Option<u64>>,
    },
    /// Perform a Matrix Break.
    MatrixBreak {
        /// Glitch tokens granted, if eligible.
        reply: oneshot::Sender<Option<u64>>,
    },
    /// Claim a daily challenge reward.
    ClaimDailyChallenge {
        /// Challenge id.
        id: String,
        /// Whether it was claimed.
        reply: oneshot::Sender<bool>,
    },
    /// Save now.
    Save {
        /// Whether the save succeeded.
        reply: oneshot::Sender<bool>,
    },
    /// Copy the current state.
    Snapshot {
        /// The state.
        reply: oneshot::Sender<GameState>,
    },
    /// Summaries of every save slot.
    ListSlots {
        /// One entry per slot.
        reply: oneshot::Sender<Vec<SlotInfo>>,
    },
    /// Save and end the session.
    Quit {
        /// Sent once the final save has been attempted.
        reply: oneshot::Sender<()>,
    },
}

/// Run a session until [`Intent::Quit`] or the intent channel closes.
///
/// Returns the engine after the final save.
pub async fn run_session(
    mut engine: GameEngine,
    store: &dyn SaveStore,
    slot: SaveSlot,
    mut intents: mpsc::Receiver<Intent>,
    notifications: &broadcast::Sender<Notification>,
    session: &SessionConfig,
) -> Result<GameEngine, RunnerError> {
    let period = Duration::from_millis(session.tick_interval_ms.max(1));
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick of an interval completes immediately.
    ticker.tick().await;

    let mut ticks_since_save: u64 = 0;
    let mut quit_reply: Option<oneshot::Sender<()>> = None;

    info!(%slot, tick_interval_ms = session.tick_interval_ms, "session started");
    forward(&mut engine, notifications);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                engine.tick();
                ticks_since_save += 1;
                if session.autosave_interval_ticks > 0
                    && ticks_since_save >= session.autosave_interval_ticks
                {
                    ticks_since_save = 0;
                    if engine.save(store, slot).is_ok() {
                        debug!(%slot, "autosaved");
                    }
                }
            }
            intent = intents.recv() => {
                match intent {
                    None => {
                        info!("intent channel closed");
                        break;
                    }
                    Some(Intent::Quit { reply }) => {
                        quit_reply = Some(reply);
                        break;
                    }
                    Some(intent) => dispatch(&mut engine, store, slot, intent),
                }
            }
        }
        forward(&mut engine, notifications);
    }

    let saved = engine.save(store, slot);
    forward(&mut engine, notifications);
    if let Some(reply) = quit_reply {
        reply.send(()).ok();
    }
    saved?;
    info!(%slot, ticks = engine.state().ticks, "session ended");
    Ok(engine)
}

/// Apply one intent and answer it.
fn dispatch(engine: &mut GameEngine, store: &dyn SaveStore, slot: SaveSlot, intent: Intent) {
    trace!(intent = ?intent, "intent received");
    let delivered = match intent {
        Intent::Click {
            external_multiplier,
            reply,
        } => reply.send(engine.process_click(external_multiplier)).is_ok(),
        Intent::PurchaseGenerator { id, reply } => {
            reply.send(engine.purchase_generator(&id)).is_ok()
        }
        Intent::PurchaseGenerators { id, count, reply } => {
            reply.send(engine.purchase_generators(&id, count)).is_ok()
        }
        Intent::PurchaseMax { id, reply } => {
            reply.send(engine.purchase_max_generators(&id)).is_ok()
        }
        Intent::PurchaseUpgrade { id, reply } => reply.send(engine.purchase_upgrade(&id)).is_ok(),
        Intent::ProveConspiracy { id, reply } => reply.send(engine.prove_conspiracy(&id)).is_ok(),
        Intent::UnlockSkill { id, reply } => reply.send(engine.unlock_skill(&id)).is_ok(),
        Intent::PurchaseIlluminatiUpgrade { id, reply } => {
            reply.send(engine.purchase_illuminati_upgrade(&id)).is_ok()
        }
        Intent::PurchaseMatrixUpgrade { id, reply } => {
            reply.send(engine.purchase_matrix_upgrade(&id)).is_ok()
        }
        Intent::StartQuest { id, reply } => reply.send(engine.start_quest(&id)).is_ok(),
        Intent::Prestige { reply } => reply.send(engine.perform_prestige()).is_ok(),
        Intent::MatrixBreak { reply } => reply.send(engine.perform_matrix_break()).is_ok(),
        Intent::ClaimDailyChallenge { id, reply } => {
            reply.send(engine.claim_daily_challenge(&id)).is_ok()
        }
        Intent::Save { reply } => reply.send(engine.save(store, slot).is_ok()).is_ok(),
        Intent::Snapshot { reply } => reply.send(engine.snapshot()).is_ok(),
        Intent::ListSlots { reply } => reply.send(store.list_slot_info()).is_ok(),
        Intent::Quit { reply } => reply.send(()).is_ok(),
    };
    if !delivered {
        warn!("intent reply dropped: requester went away");
    }
}

/// Forward queued notifications to subscribers.
fn forward(engine: &mut GameEngine, notifications: &broadcast::Sender<Notification>) {
    for notification in engine.drain_notifications() {
        if notifications.send(notification).is_err() {
            trace!("notification dropped: no subscribers");
        }
    }
}
