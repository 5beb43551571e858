//! Line-oriented console front end.
//!
//! Reads commands from stdin, turns each into an [`Intent`], waits for the
//! reply and prints a one-line answer. A second task renders the
//! engine's notifications as they are broadcast.

use tinfoil_core::numbers::format_amount;
use tinfoil_core::runner::Intent;
use tinfoil_types::{GameState, Notification, PrestigeTier, SlotInfo};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info, trace, warn};

/// Printed at startup and on `help`.
pub const HELP: &str = "\
commands:
  click [multiplier]        dig for evidence
  buy <generator> [n|max]   buy generators
  upgrade <id>              buy a shop upgrade
  prove <id>                prove a conspiracy
  skill <id>                unlock a skill
  illuminati <id>           buy an Illuminati upgrade
  matrix <id>               buy a matrix upgrade
  quest <id>                send believers on a quest
  claim <id>                claim a daily challenge
  ascend                    Illuminati Ascension
  break                     Matrix Break
  status | daily | slots | save | help | quit";

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// How many generators to buy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuyAmount {
    /// Exactly this many, or none.
    Count(u32),
    /// As many as affordable.
    Max,
}

/// One parsed console command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Click with a multiplier.
    Click(f64),
    /// Buy generators.
    Buy {
        /// Generator id.
        id: String,
        /// How many.
        amount: BuyAmount,
    },
    /// Buy a shop upgrade.
    Upgrade(String),
    /// Prove a conspiracy.
    Prove(String),
    /// Unlock a skill.
    Skill(String),
    /// Buy an Illuminati upgrade.
    Illuminati(String),
    /// Buy a matrix upgrade.
    Matrix(String),
    /// Start a quest.
    Quest(String),
    /// Claim a daily challenge.
    Claim(String),
    /// Illuminati Ascension.
    Ascend,
    /// Matrix Break.
    BreakMatrix,
    /// Show balances.
    Status,
    /// Show today's challenges.
    Daily,
    /// Show save slots.
    Slots,
    /// Save now.
    Save,
    /// Show the command list.
    Help,
    /// Save and exit.
    Quit,
}

/// Why a line could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The first word is not a command.
    #[error("unknown command `{word}` (try `help`)")]
    UnknownCommand {
        /// The word given.
        word: String,
    },

    /// A required argument is missing.
    #[error("`{command}` needs a {argument}")]
    MissingArgument {
        /// The command.
        command: &'static str,
        /// What is missing.
        argument: &'static str,
    },

    /// A numeric argument did not parse.
    #[error("`{value}` is not a valid number")]
    InvalidNumber {
        /// The text given.
        value: String,
    },
}

/// Parse one input line. Blank lines yield `None`.
pub fn parse(line: &str) -> Result<Option<Command>, ParseError> {
    let mut words = line.split_whitespace();
    let Some(word) = words.next() else {
        return Ok(None);
    };
    let word = word.to_ascii_lowercase();

    let command = match word.as_str() {
        "click" | "c" => Command::Click(words.next().map_or(Ok(1.0), number)?),
        "buy" | "b" => {
            let id = next_id(&mut words, "buy")?;
            let amount = match words.next() {
                None => BuyAmount::Count(1),
                Some(text) if text.eq_ignore_ascii_case("max") => BuyAmount::Max,
                Some(text) => BuyAmount::Count(number(text)?),
            };
            Command::Buy { id, amount }
        }
        "upgrade" => Command::Upgrade(next_id(&mut words, "upgrade")?),
        "prove" => Command::Prove(next_id(&mut words, "prove")?),
        "skill" => Command::Skill(next_id(&mut words, "skill")?),
        "illuminati" => Command::Illuminati(next_id(&mut words, "illuminati")?),
        "matrix" => Command::Matrix(next_id(&mut words, "matrix")?),
        "quest" => Command::Quest(next_id(&mut words, "quest")?),
        "claim" => Command::Claim(next_id(&mut words, "claim")?),
        "ascend" => Command::Ascend,
        "break" => Command::BreakMatrix,
        "status" | "s" => Command::Status,
        "daily" => Command::Daily,
        "slots" => Command::Slots,
        "save" => Command::Save,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        _ => return Err(ParseError::UnknownCommand { word }),
    };
    Ok(Some(command))
}

fn next_id<'a>(
    words: &mut impl Iterator<Item = &'a str>,
    command: &'static str,
) -> Result<String, ParseError> {
    words
        .next()
        .map(str::to_owned)
        .ok_or(ParseError::MissingArgument {
            command,
            argument: "id",
        })
}

fn number<T: core::str::FromStr>(text: &str) -> Result<T, ParseError> {
    text.parse().ok().ok_or_else(|| ParseError::InvalidNumber {
        value: text.to_owned(),
    })
}

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

/// Send an intent and wait for its reply. `None` once the session is gone.
async fn ask<T>(
    intents: &mpsc::Sender<Intent>,
    build: impl FnOnce(oneshot::Sender<T>) -> Intent,
) -> Option<T> {
    let (reply, answer) = oneshot::channel();
    intents.send(build(reply)).await.ok()?;
    answer.await.ok()
}

fn verdict(done: bool, success: &str, failure: &str) -> String {
    let text = if done { success } else { failure };
    text.to_owned()
}

/// Run one command against the session and describe the result.
///
/// Returns `None` if the session has ended.
pub async fn execute(intents: &mpsc::Sender<Intent>, command: Command) -> Option<String> {
    let line = match command {
        Command::Click(external_multiplier) => {
            let power = ask(intents, |reply| Intent::Click {
                external_multiplier,
                reply,
            })
            .await?;
            format!("+{} evidence", format_amount(power))
        }
        Command::Buy { id, amount } => match amount {
            BuyAmount::Max => {
                let bought = ask(intents, |reply| Intent::PurchaseMax {
                    id: id.clone(),
                    reply,
                })
                .await?;
                format!("bought {bought} {id}")
            }
            BuyAmount::Count(1) => {
                let done = ask(intents, |reply| Intent::PurchaseGenerator {
                    id: id.clone(),
                    reply,
                })
                .await?;
                verdict(done, &format!("bought 1 {id}"), "can't buy that")
            }
            BuyAmount::Count(count) => {
                let done = ask(intents, |reply| Intent::PurchaseGenerators {
                    id: id.clone(),
                    count,
                    reply,
                })
                .await?;
                verdict(done, &format!("bought {count} {id}"), "can't buy that")
            }
        },
        Command::Upgrade(id) => {
            let done = ask(intents, |reply| Intent::PurchaseUpgrade { id, reply }).await?;
            verdict(done, "upgrade purchased", "can't buy that upgrade")
        }
        Command::Prove(id) => {
            let done = ask(intents, |reply| Intent::ProveConspiracy { id, reply }).await?;
            verdict(done, "conspiracy proven!", "not enough evidence or believers")
        }
        Command::Skill(id) => {
            let done = ask(intents, |reply| Intent::UnlockSkill { id, reply }).await?;
            verdict(done, "skill unlocked", "can't unlock that skill")
        }
        Command::Illuminati(id) => {
            let done =
                ask(intents, |reply| Intent::PurchaseIlluminatiUpgrade { id, reply }).await?;
            verdict(done, "Illuminati upgrade purchased", "can't buy that upgrade")
        }
        Command::Matrix(id) => {
            let done = ask(intents, |reply| Intent::PurchaseMatrixUpgrade { id, reply }).await?;
            verdict(done, "matrix upgrade purchased", "can't buy that upgrade")
        }
        Command::Quest(id) => {
            let done = ask(intents, |reply| Intent::StartQuest { id, reply }).await?;
            verdict(done, "believers dispatched", "can't start that quest")
        }
        Command::Claim(id) => {
            let done = ask(intents, |reply| Intent::ClaimDailyChallenge { id, reply }).await?;
            verdict(done, "reward claimed", "nothing to claim")
        }
        Command::Ascend => match ask(intents, |reply| Intent::Prestige { reply }).await? {
            Some(tokens) => format!("ascended: +{tokens} Illuminati tokens"),
            None => "not ready to ascend".to_owned(),
        },
        Command::BreakMatrix => match ask(intents, |reply| Intent::MatrixBreak { reply }).await? {
            Some(glitch) => format!("the matrix breaks: +{glitch} glitch tokens"),
            None => "the matrix holds".to_owned(),
        },
        Command::Status => {
            let state = ask(intents, |reply| Intent::Snapshot { reply }).await?;
            status(&state)
        }
        Command::Daily => {
            let state = ask(intents, |reply| Intent::Snapshot { reply }).await?;
            daily(&state)
        }
        Command::Slots => {
            let slots = ask(intents, |reply| Intent::ListSlots { reply }).await?;
            slots.iter().map(slot_line).collect::<Vec<_>>().join("\n")
        }
        Command::Save => {
            let done = ask(intents, |reply| Intent::Save { reply }).await?;
            verdict(done, "saved", "save failed")
        }
        Command::Help => HELP.to_owned(),
        Command::Quit => {
            ask(intents, |reply| Intent::Quit { reply }).await?;
            "goodbye".to_owned()
        }
    };
    Some(line)
}

/// Read commands from stdin until `quit`, end of input or the session
/// going away.
pub async fn read_commands(intents: mpsc::Sender<Intent>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("{HELP}");
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                debug!("stdin closed");
                break;
            }
            Err(err) => {
                warn!(error = %err, "stdin read failed");
                break;
            }
        };
        match parse(&line) {
            Ok(None) => {}
            Ok(Some(command)) => {
                let quitting = command == Command::Quit;
                match execute(&intents, command).await {
                    Some(reply) => println!("{reply}"),
                    None => break,
                }
                if quitting {
                    return;
                }
            }
            Err(err) => println!("{err}"),
        }
    }
    if ask(&intents, |reply| Intent::Quit { reply }).await.is_none() {
        debug!("session already ended");
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// A short balance summary.
pub fn status(state: &GameState) -> String {
    let balances = &state.balances;
    let mut lines = vec![
        format!(
            "evidence {} (lifetime {})",
            format_amount(balances.evidence),
            format_amount(balances.total_evidence_earned)
        ),
        format!(
            "believers {} ({} available)",
            format_amount(balances.believers),
            format_amount(balances.available_believers)
        ),
        format!(
            "tinfoil {}  illuminati {}  glitch {}",
            balances.tinfoil, balances.illuminati_tokens, balances.glitch_tokens
        ),
    ];
    for (generator, owned) in &state.generator_counts {
        lines.push(format!("  {generator} x{owned}"));
    }
    for quest in &state.active_quests {
        lines.push(format!(
            "  quest {} returns at {}",
            quest.quest_id,
            quest.end_time.format("%H:%M:%S")
        ));
    }
    lines.join("\n")
}

/// Today's challenges with progress.
pub fn daily(state: &GameState) -> String {
    if state.daily_challenges.is_empty() {
        return "no challenges today".to_owned();
    }
    state
        .daily_challenges
        .iter()
        .map(|challenge| {
            let mark = if challenge.claimed {
                "claimed"
            } else if challenge.completed {
                "ready"
            } else {
                "open"
            };
            format!(
                "  {} {}/{} [{mark}]",
                challenge.challenge_id,
                format_amount(challenge.progress),
                format_amount(challenge.target)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn slot_line(info: &SlotInfo) -> String {
    if !info.exists {
        return format!("  slot {}: empty", info.slot);
    }
    format!(
        "  slot {}: {} evidence, {} ascensions, {}s played",
        info.slot,
        format_amount(info.total_evidence),
        info.ascension_count,
        format_amount(info.playtime_seconds.floor())
    )
}

/// Render a notification for the console. Ticks are not shown.
pub fn describe(notification: &Notification) -> Option<String> {
    let text = match notification {
        Notification::Tick { .. } | Notification::ClickProcessed { .. } => return None,
        Notification::FlavorMessage { text } => format!("~ {text}"),
        Notification::AchievementUnlocked {
            name,
            tinfoil_reward,
            ..
        } => format!("achievement: {name} (+{tinfoil_reward} tinfoil)"),
        Notification::ComboBurst { amount } => {
            format!("COMBO! +{} evidence", format_amount(*amount))
        }
        Notification::QuestStarted {
            quest_id, end_time, ..
        } => format!("quest {quest_id} underway until {}", end_time.format("%H:%M:%S")),
        Notification::QuestComplete {
            quest_id,
            success: true,
            evidence,
            tinfoil,
            ..
        } => format!(
            "quest {quest_id} succeeded: +{} evidence, +{tinfoil} tinfoil",
            format_amount(*evidence)
        ),
        Notification::QuestComplete {
            quest_id,
            evidence,
            believers_lost,
            ..
        } => {
            let mut parts = vec![format!("quest {quest_id} failed")];
            if *evidence > 0.0 {
                parts.push(format!("salvaged {} evidence", format_amount(*evidence)));
            }
            if *believers_lost > 0.0 {
                parts.push(format!("{} believers lost", format_amount(*believers_lost)));
            }
            parts.join(", ")
        }
        Notification::GoldenEyeStart { ends_at } => {
            format!("the Golden Eye opens until {}", ends_at.format("%H:%M:%S"))
        }
        Notification::GoldenEyeEnd => "the Golden Eye closes".to_owned(),
        Notification::PrestigeAvailable { tokens } => {
            format!("ascension available: {tokens} Illuminati tokens (type `ascend`)")
        }
        Notification::PrestigeComplete {
            tier: PrestigeTier::Ascension,
            tokens_granted,
        } => format!("you have ascended (+{tokens_granted} tokens)"),
        Notification::PrestigeComplete {
            tier: PrestigeTier::MatrixBreak,
            tokens_granted,
        } => format!("reality fractures (+{tokens_granted} glitch tokens)"),
        Notification::DailyChallengeComplete { challenge } => {
            format!("daily challenge done: {} (type `claim {0}`)", challenge.challenge_id)
        }
        Notification::OfflineProgress {
            seconds,
            evidence,
            quests_resolved,
        } => format!(
            "while you were away ({}s): +{} evidence, {quests_resolved} quests resolved",
            format_amount(seconds.floor()),
            format_amount(*evidence)
        ),
    };
    Some(text)
}

/// Print and log notifications until the broadcast channel closes.
pub async fn print_notifications(mut notifications: broadcast::Receiver<Notification>) {
    loop {
        match notifications.recv().await {
            Ok(notification) => match describe(&notification) {
                Some(line) => {
                    info!(notification = ?notification, "notification");
                    println!("{line}");
                }
                None => trace!(notification = ?notification, "notification"),
            },
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "console fell behind, notifications skipped");
            }
            Err(RecvError::Closed) => break,
        }
    }
}
