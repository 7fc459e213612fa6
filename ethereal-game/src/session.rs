//! The phase state machine driving a playthrough.
//!
//! Generator calls are split in two: a `begin_*` method fixes everything that
//! must be decided up front (the dice roll, the history entry, the request
//! context) and marks a request as in flight; `complete_*` or
//! [`GameSession::fail_pending`] settles it. Hosts with an async transport call
//! the halves themselves. Hosts with a blocking one use the convenience drivers
//! that take a [`NarrativeGateway`].

use thiserror::Error;

use crate::SaveStore;
use crate::catalog::{Catalog, Location};
use crate::constants::{ANSWER_PREFIX, CHOICE_PREFIX, EngineConfig};
use crate::dice::{RandomSource, RollOutcome, SeededDice, resolve_action_with_die};
use crate::equipment::{EquipChange, EquipError, toggle_equip};
use crate::gateway::{
    GatewayError, NarrativeGateway, NarrativeRequest, OpeningRequest, OutcomeRequest,
    decode_opening, decode_outcome,
};
use crate::items::{LootItem, StatName};
use crate::notifications::{Notification, NotificationQueue};
use crate::persistence::{self, PersistenceError, SaveSnapshot};
use crate::progression::{OutcomeSource, ProgressReport, apply_outcome};
use crate::scenario::{Scenario, answer_matches};
use crate::state::{GamePhase, GameState, HistoryEntry};
use crate::stats::compute_stat;
use crate::store::{EconomyError, purchase_from_catalog};

/// Rejected character-creation commands. Nothing changes when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("unknown class `{0}`")]
    UnknownClass(String),
    #[error("unknown companion `{0}`")]
    UnknownCompanion(String),
    #[error("unknown starting item `{0}`")]
    UnknownStartingItem(String),
    #[error("unknown location `{0}`")]
    UnknownLocation(String),
    #[error("at most {max} starting items may be chosen")]
    TooManyStartingItems { max: usize },
    #[error("choose at least one starting item")]
    NoStartingItems,
    #[error("expected phase {expected}, session is in {actual}")]
    WrongPhase {
        expected: GamePhase,
        actual: GamePhase,
    },
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("a generator request is already in flight")]
    ActionInFlight,
    #[error("no generator request is waiting for this response")]
    NothingPending,
    #[error("no scenario is active")]
    NoScenario,
    #[error("scenario has no action #{0}")]
    UnknownAction(usize),
    #[error("scenario has no quiz")]
    NoQuiz,
    #[error("expected phase {expected}, session is in {actual}")]
    WrongPhase {
        expected: GamePhase,
        actual: GamePhase,
    },
    #[error(transparent)]
    Selection(#[from] SelectionError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error(transparent)]
    Equip(#[from] EquipError),
    #[error(transparent)]
    Economy(#[from] EconomyError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

#[derive(Debug, Clone, PartialEq)]
enum Pending {
    Opening {
        location: Location,
        request: OpeningRequest,
    },
    Outcome {
        source: OutcomeSource,
        success: bool,
        request: OutcomeRequest,
    },
}

impl Pending {
    fn request(&self) -> NarrativeRequest {
        match self {
            Self::Opening { request, .. } => NarrativeRequest::Opening(request.clone()),
            Self::Outcome { request, .. } => NarrativeRequest::Outcome(request.clone()),
        }
    }
}

/// One playthrough: phase, state, current scenario and pending notifications.
#[derive(Debug, Clone)]
pub struct GameSession<R: RandomSource = SeededDice> {
    config: EngineConfig,
    catalog: Catalog,
    phase: GamePhase,
    state: GameState,
    scenario: Option<Scenario>,
    pending: Option<Pending>,
    notifications: NotificationQueue,
    rng: R,
}

impl GameSession<SeededDice> {
    /// Default configuration and catalog with a seeded random source.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self::new(
            EngineConfig::default(),
            Catalog::load_default(),
            SeededDice::from_seed(seed),
        )
    }
}

impl<R: RandomSource> GameSession<R> {
    #[must_use]
    pub fn new(config: EngineConfig, catalog: Catalog, rng: R) -> Self {
        let state = GameState::new(&config);
        Self {
            config,
            catalog,
            phase: GamePhase::ClassSelect,
            state,
            scenario: None,
            pending: None,
            notifications: NotificationQueue::new(),
            rng,
        }
    }

    #[must_use]
    pub const fn phase(&self) -> GamePhase {
        self.phase
    }

    #[must_use]
    pub const fn state(&self) -> &GameState {
        &self.state
    }

    #[must_use]
    pub const fn scenario(&self) -> Option<&Scenario> {
        self.scenario.as_ref()
    }

    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Borrow the random source, e.g. to queue scripted rolls.
    pub const fn rng_mut(&mut self) -> &mut R {
        &mut self.rng
    }

    /// Aggregated value of one stat.
    #[must_use]
    pub fn stat(&self, stat: StatName) -> i32 {
        compute_stat(&self.state, stat)
    }

    #[must_use]
    pub const fn is_in_flight(&self) -> bool {
        self.pending.is_some()
    }

    /// The request awaiting a generator response.
    #[must_use]
    pub fn pending_request(&self) -> Option<NarrativeRequest> {
        self.pending.as_ref().map(Pending::request)
    }

    #[must_use]
    pub fn pending_notification(&self) -> Option<&Notification> {
        self.notifications.front()
    }

    pub fn acknowledge_notification(&mut self) -> Option<Notification> {
        self.notifications.acknowledge()
    }

    #[must_use]
    pub const fn notifications(&self) -> &NotificationQueue {
        &self.notifications
    }

    fn expect_phase(&self, expected: GamePhase) -> Result<(), SelectionError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(SelectionError::WrongPhase {
                expected,
                actual: self.phase,
            })
        }
    }

    fn advance(&mut self, next: GamePhase) {
        log::debug!("phase {} -> {}", self.phase, next);
        self.phase = next;
    }

    /// Pick the character class.
    ///
    /// # Errors
    ///
    /// Returns an error outside class selection or for an unknown class id.
    pub fn select_class(&mut self, class_id: &str) -> Result<(), SelectionError> {
        self.expect_phase(GamePhase::ClassSelect)?;
        let class = self
            .catalog
            .class(class_id)
            .cloned()
            .ok_or_else(|| SelectionError::UnknownClass(class_id.to_string()))?;
        self.state.character_class = Some(class);
        self.advance(GamePhase::PetSelect);
        Ok(())
    }

    /// Pick the companion. A max-HP bonus is applied here, once.
    ///
    /// # Errors
    ///
    /// Returns an error outside companion selection or for an unknown companion id.
    pub fn select_companion(&mut self, companion_id: &str) -> Result<(), SelectionError> {
        self.expect_phase(GamePhase::PetSelect)?;
        let companion = self
            .catalog
            .companion(companion_id)
            .cloned()
            .ok_or_else(|| SelectionError::UnknownCompanion(companion_id.to_string()))?;
        self.state.attach_companion(companion);
        self.advance(GamePhase::ItemSelect);
        Ok(())
    }

    /// Toggle a starting item. Returns whether it is now selected.
    ///
    /// # Errors
    ///
    /// Returns an error outside item selection, for an unknown item id, or when
    /// adding would exceed the configured maximum.
    pub fn toggle_starting_item(&mut self, item_id: &str) -> Result<bool, SelectionError> {
        self.expect_phase(GamePhase::ItemSelect)?;
        if let Some(index) = self
            .state
            .selected_items
            .iter()
            .position(|item| item.id == item_id)
        {
            self.state.selected_items.remove(index);
            return Ok(false);
        }

        let item = self
            .catalog
            .starting_item(item_id)
            .cloned()
            .ok_or_else(|| SelectionError::UnknownStartingItem(item_id.to_string()))?;
        if self.state.selected_items.len() >= self.config.max_starting_items {
            return Err(SelectionError::TooManyStartingItems {
                max: self.config.max_starting_items,
            });
        }
        self.state.selected_items.push(item);
        Ok(true)
    }

    /// Lock in the starting items and move to the world map.
    ///
    /// # Errors
    ///
    /// Returns an error outside item selection or with nothing selected.
    pub fn confirm_starting_items(&mut self) -> Result<(), SelectionError> {
        self.expect_phase(GamePhase::ItemSelect)?;
        if self.state.selected_items.is_empty() {
            return Err(SelectionError::NoStartingItems);
        }
        self.advance(GamePhase::WorldMap);
        Ok(())
    }

    fn ensure_idle(&self) -> Result<(), SessionError> {
        if self.pending.is_some() {
            Err(SessionError::ActionInFlight)
        } else {
            Ok(())
        }
    }

    fn ensure_adventure(&self) -> Result<&Scenario, SessionError> {
        if self.phase != GamePhase::Adventure {
            return Err(SessionError::WrongPhase {
                expected: GamePhase::Adventure,
                actual: self.phase,
            });
        }
        self.scenario.as_ref().ok_or(SessionError::NoScenario)
    }

    /// Choose a location and build the opening request.
    ///
    /// # Errors
    ///
    /// Returns an error while another request is in flight, outside the world
    /// map, or for an unknown location id.
    pub fn begin_opening(&mut self, location_id: &str) -> Result<OpeningRequest, SessionError> {
        self.ensure_idle()?;
        self.expect_phase(GamePhase::WorldMap)?;
        let location = self
            .catalog
            .location(location_id)
            .cloned()
            .ok_or_else(|| SelectionError::UnknownLocation(location_id.to_string()))?;

        let request = OpeningRequest {
            class_name: self
                .state
                .character_class
                .as_ref()
                .map(|class| class.name.clone())
                .unwrap_or_default(),
            starting_items: self
                .state
                .selected_items
                .iter()
                .map(|item| item.name.clone())
                .collect(),
            location: location.name.clone(),
            karma: self.state.karma,
        };
        log::debug!("opening requested at {}", location.name);
        self.pending = Some(Pending::Opening {
            location,
            request: request.clone(),
        });
        Ok(request)
    }

    /// Install the opening scene and enter the adventure.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NothingPending`] without an opening in flight, or
    /// the gateway error if the response is invalid. A rejected response clears
    /// the request and leaves a notice; the state is unchanged.
    pub fn complete_opening(&mut self, raw: &str) -> Result<(), SessionError> {
        if !matches!(self.pending, Some(Pending::Opening { .. })) {
            return Err(SessionError::NothingPending);
        }
        let scene = match decode_opening(raw) {
            Ok(scene) => scene,
            Err(err) => {
                self.fail_pending(&err.to_string());
                return Err(err.into());
            }
        };
        let Some(Pending::Opening { location, .. }) = self.pending.take() else {
            return Err(SessionError::NothingPending);
        };

        self.state.location = Some(location.name);
        self.state.history = vec![HistoryEntry::Narrative {
            text: scene.scenario.narrative.clone(),
            success: None,
        }];
        self.scenario = Some(scene.scenario);
        self.advance(GamePhase::Adventure);
        log::info!(
            "adventure started at {}",
            self.state.location.as_deref().unwrap_or_default()
        );
        Ok(())
    }

    /// Select action `index`: roll, log the choice and build the outcome request.
    ///
    /// The roll is final; the generator only narrates it.
    ///
    /// # Errors
    ///
    /// Returns an error while another request is in flight, outside the
    /// adventure, without a scenario, or for an out-of-range index.
    pub fn begin_action(
        &mut self,
        index: usize,
    ) -> Result<(RollOutcome, OutcomeRequest), SessionError> {
        self.ensure_idle()?;
        let scenario = self.ensure_adventure()?;
        let action = scenario
            .action(index)
            .cloned()
            .ok_or(SessionError::UnknownAction(index))?;
        let narrative = scenario.narrative.clone();

        let roll = resolve_action_with_die(&self.state, &action, self.config.die_sides, &mut self.rng);
        log::debug!(
            "rolled {} {:+} = {} vs {} for `{}`",
            roll.roll,
            roll.modifier,
            roll.total,
            roll.difficulty,
            action.label
        );

        self.state.push_history(HistoryEntry::Choice {
            text: format!("{CHOICE_PREFIX}{}", action.label),
        });
        self.notifications.push(Notification::DiceRoll(roll));

        let request = OutcomeRequest {
            scenario: narrative,
            action: action.label,
            roll_total: Some(roll.total),
            success: roll.success,
            karma: self.state.karma,
        };
        self.pending = Some(Pending::Outcome {
            source: OutcomeSource::Action,
            success: roll.success,
            request: request.clone(),
        });
        Ok((roll, request))
    }

    /// Answer the active quiz. Returns whether the answer was correct.
    ///
    /// # Errors
    ///
    /// Returns an error while another request is in flight, outside the
    /// adventure, or when the scenario poses no quiz.
    pub fn submit_quiz_answer(
        &mut self,
        answer: &str,
    ) -> Result<(bool, OutcomeRequest), SessionError> {
        self.ensure_idle()?;
        let scenario = self.ensure_adventure()?;
        let (_, expected) = scenario.quiz().ok_or(SessionError::NoQuiz)?;
        let correct = answer_matches(expected, answer);
        let narrative = scenario.narrative.clone();
        let submitted = answer.trim().to_string();
        log::debug!("quiz answer `{submitted}` correct={correct}");

        self.state.push_history(HistoryEntry::Choice {
            text: format!("{ANSWER_PREFIX}{submitted}"),
        });

        let request = OutcomeRequest {
            scenario: narrative,
            action: format!("{ANSWER_PREFIX}{submitted}"),
            roll_total: None,
            success: correct,
            karma: self.state.karma,
        };
        self.pending = Some(Pending::Outcome {
            source: OutcomeSource::Quiz,
            success: correct,
            request: request.clone(),
        });
        Ok((correct, request))
    }

    /// Merge the generator's outcome response.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NothingPending`] without an outcome in flight, or
    /// the gateway error if the response is invalid. A rejected response merges
    /// nothing, clears the request and leaves a notice.
    pub fn complete_outcome(&mut self, raw: &str) -> Result<ProgressReport, SessionError> {
        let Some(Pending::Outcome {
            source, success, ..
        }) = self.pending
        else {
            return Err(SessionError::NothingPending);
        };
        let scene = match decode_outcome(raw) {
            Ok(scene) => scene,
            Err(err) => {
                self.fail_pending(&err.to_string());
                return Err(err.into());
            }
        };
        self.pending = None;

        let (scenario, report) = apply_outcome(
            &mut self.state,
            scene,
            source,
            success,
            &self.config,
            &mut self.rng,
        );
        if let Some(item) = &report.loot {
            self.notifications.push(Notification::Reward(item.clone()));
        }
        self.scenario = Some(scenario);
        Ok(report)
    }

    /// Abandon the in-flight request without touching the state.
    ///
    /// Returns whether a request was pending.
    pub fn fail_pending(&mut self, reason: &str) -> bool {
        if self.pending.take().is_none() {
            return false;
        }
        log::warn!("generator failure: {reason}");
        self.notifications
            .push(Notification::Notice(format!("The story falters: {reason}")));
        true
    }

    /// Begin, call the gateway and complete the opening in one step.
    ///
    /// # Errors
    ///
    /// Returns any error of [`Self::begin_opening`] or [`Self::complete_opening`],
    /// or a transport failure from the gateway.
    pub fn start_adventure<G: NarrativeGateway + ?Sized>(
        &mut self,
        gateway: &mut G,
        location_id: &str,
    ) -> Result<(), SessionError> {
        let request = self.begin_opening(location_id)?;
        let raw = self.call(gateway.opening_scene(&request))?;
        self.complete_opening(&raw)
    }

    /// Take action `index` through the gateway in one step.
    ///
    /// # Errors
    ///
    /// Returns any error of [`Self::begin_action`] or [`Self::complete_outcome`],
    /// or a transport failure from the gateway.
    pub fn take_action<G: NarrativeGateway + ?Sized>(
        &mut self,
        gateway: &mut G,
        index: usize,
    ) -> Result<ProgressReport, SessionError> {
        let (_, request) = self.begin_action(index)?;
        let raw = self.call(gateway.outcome_scene(&request))?;
        self.complete_outcome(&raw)
    }

    /// Answer the quiz through the gateway in one step.
    ///
    /// # Errors
    ///
    /// Returns any error of [`Self::submit_quiz_answer`] or
    /// [`Self::complete_outcome`], or a transport failure from the gateway.
    pub fn answer_quiz<G: NarrativeGateway + ?Sized>(
        &mut self,
        gateway: &mut G,
        answer: &str,
    ) -> Result<ProgressReport, SessionError> {
        let (_, request) = self.submit_quiz_answer(answer)?;
        let raw = self.call(gateway.outcome_scene(&request))?;
        self.complete_outcome(&raw)
    }

    fn call<E: std::fmt::Display>(&mut self, response: Result<String, E>) -> Result<String, SessionError> {
        response.map_err(|err| {
            let err = GatewayError::transport(err);
            self.fail_pending(&err.to_string());
            SessionError::Gateway(err)
        })
    }

    /// Equip or unequip an owned item. Allowed in any phase, even mid-request.
    ///
    /// # Errors
    ///
    /// Returns [`EquipError::NotOwned`] for ids missing from the inventory.
    pub fn toggle_equip(&mut self, item_id: &str) -> Result<EquipChange, EquipError> {
        toggle_equip(&mut self.state, item_id)
    }

    /// Buy a shop item. Allowed in any phase, even mid-request.
    ///
    /// # Errors
    ///
    /// Returns an [`EconomyError`] for unknown items or insufficient gold.
    pub fn purchase(&mut self, shop_item_id: &str) -> Result<LootItem, EconomyError> {
        purchase_from_catalog(&mut self.state, &self.catalog, shop_item_id, &mut self.rng)
    }

    /// Start a new game, discarding progress and pending work.
    pub fn reset(&mut self) {
        self.state = GameState::new(&self.config);
        self.scenario = None;
        self.pending = None;
        self.notifications.clear();
        self.advance(GamePhase::ClassSelect);
    }

    #[must_use]
    pub fn snapshot(&self) -> SaveSnapshot {
        SaveSnapshot {
            phase: self.phase,
            game_state: self.state.clone(),
            current_scenario: self.scenario.clone(),
        }
    }

    /// Replace the session contents with `snapshot`, dropping pending work.
    pub fn restore(&mut self, snapshot: SaveSnapshot) {
        self.phase = snapshot.phase;
        self.state = snapshot.game_state;
        self.scenario = snapshot.current_scenario;
        self.pending = None;
        self.notifications.clear();
        log::debug!("session restored in phase {}", self.phase);
    }

    /// Write the current snapshot under the configured key.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails or the store rejects the write.
    pub fn save_to<S: SaveStore + ?Sized>(&self, store: &S) -> Result<(), PersistenceError> {
        persistence::save_to(store, &self.config.save_key(), &self.snapshot())
    }

    /// Restore from the configured key. Returns whether a save was loaded.
    ///
    /// A corrupt blob counts as no save.
    ///
    /// # Errors
    ///
    /// Returns an error only if the store itself fails.
    pub fn load_from<S: SaveStore + ?Sized>(&mut self, store: &S) -> Result<bool, PersistenceError> {
        match persistence::load_from(store, &self.config.save_key()) {
            Ok(Some(snapshot)) => {
                self.restore(snapshot);
                Ok(true)
            }
            Ok(None) => Ok(false),
            Err(err) if err.is_corrupt_save() => {
                log::warn!("ignoring corrupt save: {err}");
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::ScriptedDice;
    use crate::scenario::SpecialInteraction;

    const OPENING: &str = r#"{
        "narrative": "Mist coils around the roots.",
        "actions": [
            { "label": "Follow the whispers", "statRequired": "intelligence", "difficulty": 12 },
            { "label": "Climb the oak", "statRequired": "dexterity", "difficulty": 14 }
        ]
    }"#;

    fn outcome(extra: &str) -> String {
        format!(
            r#"{{
                "narrative": "The forest answers.",
                "actions": [{{ "label": "Press on", "statRequired": "strength", "difficulty": 10 }}],
                "karmaDelta": 5,
                "goldReward": 20,
                "isSignificantEvent": false{extra}
            }}"#
        )
    }

    fn session_at_map(rolls: &[u32]) -> GameSession<ScriptedDice> {
        let mut session = GameSession::new(
            EngineConfig::default(),
            Catalog::load_default(),
            ScriptedDice::new(rolls.iter().copied()),
        );
        session.select_class("mage").unwrap();
        session.select_companion("owl").unwrap();
        session.toggle_starting_item("lamp").unwrap();
        session.confirm_starting_items().unwrap();
        session
    }

    fn session_in_adventure(rolls: &[u32]) -> GameSession<ScriptedDice> {
        let mut session = session_at_map(rolls);
        session.begin_opening("forest").unwrap();
        session.complete_opening(OPENING).unwrap();
        session
    }

    #[test]
    fn selections_follow_phase_order() {
        let mut session = GameSession::seeded(1);
        assert!(matches!(
            session.select_companion("owl"),
            Err(SelectionError::WrongPhase {
                expected: GamePhase::PetSelect,
                actual: GamePhase::ClassSelect
            })
        ));
        assert_eq!(
            session.select_class("lich"),
            Err(SelectionError::UnknownClass("lich".into()))
        );
        session.select_class("warrior").unwrap();
        session.select_companion("dragon").unwrap();
        assert_eq!(session.state().max_hp, 30);
        assert_eq!(session.phase(), GamePhase::ItemSelect);
        assert_eq!(
            session.confirm_starting_items(),
            Err(SelectionError::NoStartingItems)
        );
    }

    #[test]
    fn starting_items_toggle_and_cap_at_three() {
        let mut session = GameSession::seeded(2);
        session.select_class("bard").unwrap();
        session.select_companion("cat").unwrap();
        for id in ["lamp", "rope", "vial"] {
            assert!(session.toggle_starting_item(id).unwrap());
        }
        assert_eq!(
            session.toggle_starting_item("key"),
            Err(SelectionError::TooManyStartingItems { max: 3 })
        );
        assert!(!session.toggle_starting_item("rope").unwrap());
        assert!(session.toggle_starting_item("key").unwrap());
        let names: Vec<_> = session
            .state()
            .selected_items
            .iter()
            .map(|item| item.id.as_str())
            .collect();
        assert_eq!(names, ["lamp", "vial", "key"]);
    }

    #[test]
    fn opening_resets_history_and_enters_adventure() {
        let mut session = session_at_map(&[]);
        let request = session.begin_opening("forest").unwrap();
        assert_eq!(request.class_name, "Aether Scholar");
        assert_eq!(request.starting_items, ["Everlasting Lamp"]);
        assert_eq!(request.location, "Whispering Forest");
        assert!(session.is_in_flight());
        assert!(matches!(
            session.begin_opening("ruins"),
            Err(SessionError::ActionInFlight)
        ));

        session.complete_opening(OPENING).unwrap();
        assert_eq!(session.phase(), GamePhase::Adventure);
        assert_eq!(session.state().location.as_deref(), Some("Whispering Forest"));
        assert_eq!(session.state().history.len(), 1);
        assert_eq!(session.scenario().unwrap().actions.len(), 2);
        assert!(!session.is_in_flight());
    }

    #[test]
    fn failed_opening_changes_nothing() {
        let mut session = session_at_map(&[]);
        let before = session.state().clone();
        session.begin_opening("citadel").unwrap();
        assert!(session.complete_opening(r#"{ "narrative": "x" }"#).is_err());
        assert_eq!(session.state(), &before);
        assert_eq!(session.phase(), GamePhase::WorldMap);
        assert!(!session.is_in_flight());
        assert!(matches!(
            session.pending_notification(),
            Some(Notification::Notice(_))
        ));
    }

    #[test]
    fn action_roll_is_fixed_before_the_response() {
        // Aether Scholar INT 16 + owl 2 = 18, modifier +4.
        let mut session = session_in_adventure(&[8]);
        let (roll, request) = session.begin_action(0).unwrap();
        assert_eq!(roll.roll, 8);
        assert_eq!(roll.modifier, 4);
        assert!(roll.success);
        assert_eq!(request.roll_total, Some(12));
        assert_eq!(
            session.state().history.last(),
            Some(&HistoryEntry::Choice {
                text: "Choice: Follow the whispers".into()
            })
        );
        assert!(matches!(
            session.begin_action(1),
            Err(SessionError::ActionInFlight)
        ));
        assert_eq!(
            session.pending_notification(),
            Some(&Notification::DiceRoll(roll))
        );

        let report = session.complete_outcome(&outcome("")).unwrap();
        assert!(report.success);
        assert_eq!(session.state().gold, 120);
        assert_eq!(session.state().karma, 5);
        assert_eq!(session.scenario().unwrap().narrative, "The forest answers.");
    }

    #[test]
    fn malformed_outcome_keeps_state_and_reenables_actions() {
        let mut session = session_in_adventure(&[3, 15]);
        session.begin_action(1).unwrap();
        let before = session.state().clone();
        let scenario = session.scenario().cloned();

        let err = session.complete_outcome(r#"{ "narrative": "half" }"#).unwrap_err();
        assert!(matches!(err, SessionError::Gateway(_)));
        assert_eq!(session.state(), &before);
        assert_eq!(session.scenario().cloned(), scenario);
        assert!(!session.is_in_flight());

        assert!(session.begin_action(0).is_ok());
    }

    #[test]
    fn rewards_queue_behind_each_other() {
        let loot = r#", "loot": { "name": "Owl Feather", "rarity": "rare", "type": "trinket", "statBonuses": { "intelligence": 1 } }"#;
        let mut session = session_in_adventure(&[10, 10]);
        session.begin_action(0).unwrap();
        session.complete_outcome(&outcome(loot)).unwrap();
        session.begin_action(0).unwrap();
        session.complete_outcome(&outcome(loot)).unwrap();

        let kinds: Vec<_> = session
            .notifications()
            .iter()
            .map(|n| matches!(n, Notification::Reward(_)))
            .collect();
        assert_eq!(kinds, [false, true, false, true]);
        assert_eq!(session.state().inventory.len(), 2);
        assert_ne!(
            session.state().inventory[0].id,
            session.state().inventory[1].id
        );
    }

    #[test]
    fn quiz_answers_award_fixed_bonus() {
        let quiz = r#", "specialInteraction": { "type": "quiz", "question": "Name the blade.", "answer": "Excalibur" }"#;
        let mut session = session_in_adventure(&[10]);
        session.begin_action(0).unwrap();
        session.complete_outcome(&outcome(quiz)).unwrap();
        let gold = session.state().gold;

        let (correct, request) = session.submit_quiz_answer(" excalibur ").unwrap();
        assert!(correct);
        assert!(request.success);
        assert!(request.roll_total.is_none());
        session.complete_outcome(&outcome("")).unwrap();
        assert_eq!(session.state().gold, gold + 50);
        assert!(matches!(session.submit_quiz_answer("x"), Err(SessionError::NoQuiz)));
    }

    #[test]
    fn dialogue_replies_resolve_like_actions() {
        let dialogue = r#"{
            "narrative": "A hooded ferryman bars the bridge.",
            "actions": [
                { "label": "Offer a coin", "statRequired": "intelligence", "difficulty": 12 },
                { "label": "Shove past him", "statRequired": "strength", "difficulty": 14 }
            ],
            "karmaDelta": 0,
            "goldReward": 0,
            "isSignificantEvent": false,
            "specialInteraction": {
                "type": "dialogue",
                "npcName": "Charon",
                "npcPersonality": "weary",
                "npcDialogue": "Toll first."
            }
        }"#;
        // Aether Scholar: INT 18 (+4), STR 6 (-2).
        let mut session = session_in_adventure(&[10, 15]);
        session.begin_action(0).unwrap();
        session.complete_outcome(dialogue).unwrap();
        assert!(matches!(
            session.scenario().and_then(|s| s.special_interaction.as_ref()),
            Some(SpecialInteraction::Dialogue { npc_name, .. }) if npc_name == "Charon"
        ));
        assert!(matches!(session.submit_quiz_answer("coin"), Err(SessionError::NoQuiz)));
        let gold = session.state().gold;

        let (roll, request) = session.begin_action(1).unwrap();
        assert_eq!((roll.roll, roll.modifier, roll.total), (15, -2, 13));
        assert!(!roll.success);
        assert_eq!(request.action, "Shove past him");
        assert_eq!(request.roll_total, Some(13));
        assert!(!request.success);

        let report = session.complete_outcome(&outcome("")).unwrap();
        assert!(!report.success);
        assert_eq!(report.gold_change, 20);
        assert_eq!(session.state().gold, gold + 20);
        assert_eq!(session.state().karma, 5);
        assert!(session.scenario().unwrap().special_interaction.is_none());
    }

    #[test]
    fn equip_and_purchase_work_while_in_flight() {
        let mut session = session_in_adventure(&[10]);
        session.begin_action(0).unwrap();
        assert!(matches!(
            session.purchase("shop_1"),
            Err(EconomyError::InsufficientFunds { .. })
        ));
        session.state.gold = 200;
        let bought = session.purchase("shop_1").unwrap();
        session.toggle_equip(&bought.id).unwrap();
        assert_eq!(session.state().equipment.armor.as_deref(), Some(bought.id.as_str()));
        assert!(session.is_in_flight());
    }

    #[test]
    fn reset_returns_to_class_select() {
        let mut session = session_in_adventure(&[]);
        session.begin_action(0).unwrap();
        session.reset();
        assert_eq!(session.phase(), GamePhase::ClassSelect);
        assert_eq!(session.state(), &GameState::default());
        assert!(session.scenario().is_none());
        assert!(!session.is_in_flight());
        assert!(session.pending_notification().is_none());
    }

    #[test]
    fn completing_without_a_request_is_rejected() {
        let mut session = session_in_adventure(&[]);
        assert!(matches!(
            session.complete_outcome(&outcome("")),
            Err(SessionError::NothingPending)
        ));
        assert!(matches!(
            session.complete_opening(OPENING),
            Err(SessionError::NothingPending)
        ));
        assert!(!session.fail_pending("nothing"));
    }
}
