//! Plays an adventure against a real chat-completion endpoint.
//!
//! The session is driven through its two-phase API: the request is taken from
//! the session, sent over HTTP, and the reply handed back. Transport failures
//! abandon the pending request so the turn can be retried.

pub mod client;
pub mod extract;
pub mod prompt;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use colored::Colorize;
use ethereal_game::{GamePhase, GameSession, GatewayError, NarrativeRequest, Notification, SessionError};
use serde::Serialize;

use crate::logic::{ActionPolicy, Player, PurchasePolicy, QuizPolicy};
use crate::storage::FileSaveStore;
use client::ChatClient;

const OPENING_ATTEMPTS: usize = 3;

#[derive(Debug, Clone)]
pub struct LiveConfig {
    pub class_id: String,
    pub companion_id: String,
    pub starting_items: Vec<String>,
    pub location_id: String,
    pub turns: usize,
    pub seed: u64,
    pub save_dir: Option<PathBuf>,
    pub resume: bool,
}

/// Outcome of a live session, written as the report.
#[derive(Debug, Clone, Serialize)]
pub struct LiveSummary {
    pub resumed: bool,
    pub turns_played: usize,
    pub successes: usize,
    pub generator_failures: usize,
    pub loot: Vec<String>,
    pub location: Option<String>,
    pub hp: i32,
    pub max_hp: i32,
    pub gold: i64,
    pub karma: i32,
    pub save_file: PathBuf,
}

pub async fn run_live(config: &LiveConfig, client: &ChatClient) -> Result<LiveSummary> {
    let store = config
        .save_dir
        .clone()
        .map_or_else(FileSaveStore::default_location, FileSaveStore::new);
    let mut session = GameSession::seeded(config.seed);

    let resumed = resume_saved_adventure(config, &mut session, &store)?;
    if resumed {
        println!("📜 Resuming saved adventure from {}", store.dir().display());
    } else {
        create_character(config, &mut session)?;
        open_adventure(config, &mut session, client).await?;
        session.save_to(&store)?;
    }

    let mut player = Player::new(
        ActionPolicy::BestOdds,
        QuizPolicy::Coin,
        PurchasePolicy::FillEmptySlots,
        config.seed,
    );
    let mut summary = LiveSummary {
        resumed,
        turns_played: 0,
        successes: 0,
        generator_failures: 0,
        loot: Vec::new(),
        location: None,
        hp: 0,
        max_hp: 0,
        gold: 0,
        karma: 0,
        save_file: store.path_for(&session.config().save_key()),
    };

    for turn in 1..=config.turns {
        play_turn(&mut session, client, &mut player, &mut summary)
            .await
            .with_context(|| format!("live turn {turn}"))?;
        session.save_to(&store)?;
        summary.turns_played += 1;
    }

    let state = session.state();
    summary.location.clone_from(&state.location);
    summary.hp = state.hp;
    summary.max_hp = state.max_hp;
    summary.gold = state.gold;
    summary.karma = state.karma;
    Ok(summary)
}

/// Load the save when resuming. Only a save taken mid-adventure is continued;
/// anything else leaves the session reset for a new character.
fn resume_saved_adventure(
    config: &LiveConfig,
    session: &mut GameSession,
    store: &FileSaveStore,
) -> Result<bool> {
    if config.resume && session.load_from(store)? {
        if session.phase() == GamePhase::Adventure {
            return Ok(true);
        }
        log::info!("saved game is in {}, starting a new adventure", session.phase());
    }
    session.reset();
    Ok(false)
}

fn create_character(config: &LiveConfig, session: &mut GameSession) -> Result<()> {
    session.select_class(&config.class_id)?;
    session.select_companion(&config.companion_id)?;
    for item in &config.starting_items {
        session.toggle_starting_item(item)?;
    }
    session.confirm_starting_items()?;
    Ok(())
}

async fn open_adventure(
    config: &LiveConfig,
    session: &mut GameSession,
    client: &ChatClient,
) -> Result<()> {
    for attempt in 1..=OPENING_ATTEMPTS {
        let request = session.begin_opening(&config.location_id)?;
        let reply = client.narrate(&NarrativeRequest::Opening(request)).await;
        let outcome = match reply {
            Ok(raw) => session.complete_opening(&raw),
            Err(err) => {
                session.fail_pending(&err.to_string());
                Err(SessionError::Gateway(GatewayError::transport(err)))
            }
        };
        match outcome {
            Ok(()) => {
                if let Some(scenario) = session.scenario() {
                    println!("{}", scenario.narrative.italic());
                }
                return Ok(());
            }
            Err(SessionError::Gateway(err)) => {
                eprintln!("⚠️  Opening attempt {attempt}/{OPENING_ATTEMPTS} failed: {err}");
                while session.acknowledge_notification().is_some() {}
            }
            Err(other) => return Err(other.into()),
        }
    }
    bail!("the generator never produced an opening scene")
}

async fn play_turn(
    session: &mut GameSession,
    client: &ChatClient,
    player: &mut Player,
    summary: &mut LiveSummary,
) -> Result<()> {
    for shop_id in player.shopping_list(session) {
        let item = session.purchase(&shop_id)?;
        session.toggle_equip(&item.id)?;
        println!("🛒 Bought and equipped {}", item.name.bright_white());
    }

    let scenario = session.scenario().cloned().context("adventure has no scenario")?;
    let request = if let Some(answer) = player.answer(&scenario) {
        println!("❓ Answering the riddle with '{}'", answer.trim());
        session.submit_quiz_answer(&answer)?.1
    } else {
        let index = player
            .pick_action(session.state(), &scenario)
            .context("scenario offers no actions")?;
        let (roll, request) = session.begin_action(index)?;
        println!(
            "🎲 {} - rolled {} {:+} = {} vs {}",
            scenario.actions[index].label.bold(),
            roll.roll,
            roll.modifier,
            roll.total,
            roll.difficulty
        );
        request
    };

    match client.narrate(&NarrativeRequest::Outcome(request)).await {
        Ok(raw) => match session.complete_outcome(&raw) {
            Ok(report) => {
                summary.successes += usize::from(report.success);
                if let Some(item) = &report.loot {
                    summary.loot.push(item.name.clone());
                }
                println!(
                    "{} karma {:+} gold {:+} hp {:+}",
                    if report.success { "✅".green() } else { "❌".red() },
                    report.karma_change,
                    report.gold_change,
                    report.hp_change
                );
            }
            Err(SessionError::Gateway(err)) => {
                summary.generator_failures += 1;
                eprintln!("⚠️  Rejected generator reply: {err}");
            }
            Err(other) => return Err(other.into()),
        },
        Err(err) => {
            summary.generator_failures += 1;
            session.fail_pending(&err.to_string());
            eprintln!("⚠️  Generator unavailable: {err}");
        }
    }

    while let Some(notification) = session.acknowledge_notification() {
        match notification {
            Notification::Reward(item) => {
                println!("🎁 {} ({})", item.name.bright_yellow(), item.rarity);
            }
            Notification::Notice(text) => println!("ℹ️  {text}"),
            Notification::DiceRoll(_) => {}
        }
    }
    if let Some(next) = session.scenario() {
        println!("{}", next.narrative.italic());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(dir: PathBuf) -> LiveConfig {
        LiveConfig {
            class_id: "warrior".into(),
            companion_id: "hound".into(),
            starting_items: vec!["lamp".into()],
            location_id: "ruins".into(),
            turns: 1,
            seed: 7,
            save_dir: Some(dir),
            resume: false,
        }
    }

    #[tokio::test]
    async fn unreachable_generator_fails_the_opening_cleanly() {
        let dir = std::env::temp_dir().join(format!("ethereal-live-{}", std::process::id()));
        let client = ChatClient::new("http://127.0.0.1:9/v1/chat/completions", "none");
        let err = run_live(&config(dir.clone()), &client).await.unwrap_err();
        assert!(err.to_string().contains("opening"));
        let _ = std::fs::remove_dir_all(dir);
    }

    fn temp_dir(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "ethereal-live-{label}-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ))
    }

    #[test]
    fn save_before_the_adventure_is_not_resumed() {
        let dir = temp_dir("early-save");
        let store = FileSaveStore::new(dir.clone());
        let mut early = GameSession::seeded(4);
        early.select_class("rogue").unwrap();
        early.save_to(&store).unwrap();

        let mut cfg = config(dir.clone());
        cfg.resume = true;
        let mut session = GameSession::seeded(5);
        assert!(!resume_saved_adventure(&cfg, &mut session, &store).unwrap());
        assert_eq!(session.phase(), GamePhase::ClassSelect);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn adventure_save_is_resumed() {
        let dir = temp_dir("adventure-save");
        let store = FileSaveStore::new(dir.clone());
        let mut playing = GameSession::seeded(4);
        playing.select_class("warrior").unwrap();
        playing.select_companion("hound").unwrap();
        playing.toggle_starting_item("lamp").unwrap();
        playing.confirm_starting_items().unwrap();
        playing.begin_opening("ruins").unwrap();
        playing
            .complete_opening(
                r#"{ "narrative": "Dust.", "actions": [{ "label": "Dig", "statRequired": "strength", "difficulty": 9 }] }"#,
            )
            .unwrap();
        playing.save_to(&store).unwrap();

        let mut cfg = config(dir.clone());
        cfg.resume = true;
        let mut session = GameSession::seeded(5);
        assert!(resume_saved_adventure(&cfg, &mut session, &store).unwrap());
        assert_eq!(session.snapshot(), playing.snapshot());

        cfg.resume = false;
        let mut fresh = GameSession::seeded(6);
        assert!(!resume_saved_adventure(&cfg, &mut fresh, &store).unwrap());
        assert_eq!(fresh.phase(), GamePhase::ClassSelect);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn bad_selection_is_rejected_before_any_request() {
        let mut session = GameSession::seeded(1);
        let mut cfg = config(PathBuf::from("."));
        cfg.class_id = "lich".into();
        assert!(create_character(&cfg, &mut session).is_err());
    }
}
