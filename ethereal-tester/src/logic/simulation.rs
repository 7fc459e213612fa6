use std::sync::Arc;

use anyhow::{Context, Result, bail, ensure};
use ethereal_game::{
    Catalog, EngineConfig, GamePhase, GameSession, GameState, Notification, SeededDice,
    SessionError,
};

use super::invariants::{
    check_history_growth, check_idle, check_save_roundtrip, check_state,
    check_untouched_by_failure,
};
use super::policy::{ActionPolicy, Player, PurchasePolicy, QuizPolicy};
use super::scripted::{GeneratorProfile, GeneratorStats, ScriptedGenerator};

/// Attempts at an opening scene before the run is declared stuck.
pub const MAX_OPENING_ATTEMPTS: usize = 12;

const GENERATOR_SALT: u64 = 0x5eed_1a7e_1bad_f00d;

/// Declarative plan for one automated playthrough.
#[derive(Debug, Clone)]
pub struct AdventurePlan {
    pub class_id: &'static str,
    pub companion_id: &'static str,
    pub starting_items: &'static [&'static str],
    pub location_id: &'static str,
    pub turns: usize,
    pub action: ActionPolicy,
    pub quiz: QuizPolicy,
    pub purchase: PurchasePolicy,
    pub generator: GeneratorProfile,
    /// Save and reload through a fresh session after every turn.
    pub roundtrip_saves: bool,
    pub expectations: Vec<RunExpectation>,
}

impl AdventurePlan {
    #[must_use]
    pub fn new(class_id: &'static str, companion_id: &'static str) -> Self {
        Self {
            class_id,
            companion_id,
            starting_items: &["lamp", "rope"],
            location_id: "ruins",
            turns: 8,
            action: ActionPolicy::FirstChoice,
            quiz: QuizPolicy::Oracle,
            purchase: PurchasePolicy::Never,
            generator: GeneratorProfile::default(),
            roundtrip_saves: false,
            expectations: Vec::new(),
        }
    }

    #[must_use]
    pub const fn with_items(mut self, items: &'static [&'static str]) -> Self {
        self.starting_items = items;
        self
    }

    #[must_use]
    pub const fn at(mut self, location_id: &'static str) -> Self {
        self.location_id = location_id;
        self
    }

    #[must_use]
    pub const fn with_turns(mut self, turns: usize) -> Self {
        self.turns = turns;
        self
    }

    #[must_use]
    pub const fn with_policies(
        mut self,
        action: ActionPolicy,
        quiz: QuizPolicy,
        purchase: PurchasePolicy,
    ) -> Self {
        self.action = action;
        self.quiz = quiz;
        self.purchase = purchase;
        self
    }

    #[must_use]
    pub const fn with_generator(mut self, generator: GeneratorProfile) -> Self {
        self.generator = generator;
        self
    }

    #[must_use]
    pub const fn with_save_roundtrips(mut self) -> Self {
        self.roundtrip_saves = true;
        self
    }

    #[must_use]
    pub fn with_expectation(mut self, expectation: impl Into<RunExpectation>) -> Self {
        self.expectations.push(expectation.into());
        self
    }
}

/// Assertion hook run after a playthrough completes.
type RunExpectationFn = Arc<dyn Fn(&RunSummary) -> Result<()> + Send + Sync + 'static>;

#[derive(Clone)]
pub struct RunExpectation(RunExpectationFn);

impl std::fmt::Debug for RunExpectation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunExpectation").finish()
    }
}

impl RunExpectation {
    pub fn evaluate(&self, summary: &RunSummary) -> Result<()> {
        (self.0)(summary)
    }
}

impl<F> From<F> for RunExpectation
where
    F: Fn(&RunSummary) -> Result<()> + Send + Sync + 'static,
{
    fn from(f: F) -> Self {
        Self(Arc::new(f))
    }
}

/// What happened during one playthrough.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub seed: u64,
    pub turns_played: usize,
    pub actions_taken: usize,
    pub quizzes_answered: usize,
    pub quizzes_correct: usize,
    pub successes: usize,
    pub generator_failures: usize,
    pub opening_attempts: usize,
    pub purchases: usize,
    pub loot_found: usize,
    pub dialogues_met: usize,
    pub dice_notifications: usize,
    pub save_roundtrips: usize,
    pub phase: GamePhase,
    pub final_state: GameState,
    pub generator: GeneratorStats,
    pub decision_log: Vec<String>,
    /// Invariant breaches; any entry fails the run.
    pub violations: Vec<String>,
}

impl RunSummary {
    fn new(seed: u64) -> Self {
        Self {
            seed,
            turns_played: 0,
            actions_taken: 0,
            quizzes_answered: 0,
            quizzes_correct: 0,
            successes: 0,
            generator_failures: 0,
            opening_attempts: 0,
            purchases: 0,
            loot_found: 0,
            dialogues_met: 0,
            dice_notifications: 0,
            save_roundtrips: 0,
            phase: GamePhase::ClassSelect,
            final_state: GameState::default(),
            generator: GeneratorStats::default(),
            decision_log: Vec::new(),
            violations: Vec::new(),
        }
    }
}

/// Play `plan` against the scripted generator, checking invariants at every step.
#[must_use]
pub fn run_plan(plan: &AdventurePlan, seed: u64) -> RunSummary {
    let mut session = GameSession::new(
        EngineConfig::default(),
        Catalog::load_default(),
        SeededDice::from_seed(seed),
    );
    let mut generator = ScriptedGenerator::new(seed.rotate_left(17) ^ GENERATOR_SALT, plan.generator);
    let mut player = Player::new(plan.action, plan.quiz, plan.purchase, seed);
    let mut summary = RunSummary::new(seed);

    let outcome = create_character(plan, &mut session)
        .and_then(|()| open_adventure(plan, &mut session, &mut generator, &mut summary))
        .and_then(|()| {
            for turn in 1..=plan.turns {
                play_turn(plan, &mut session, &mut generator, &mut player, &mut summary)
                    .with_context(|| format!("turn {turn}"))?;
            }
            Ok(())
        });
    if let Err(err) = outcome {
        log::debug!("seed {seed} violated an invariant: {err:#}");
        summary.violations.push(format!("{err:#}"));
    }

    summary.phase = session.phase();
    summary.final_state = session.state().clone();
    summary.generator = generator.stats();
    summary
}

fn create_character(plan: &AdventurePlan, session: &mut GameSession) -> Result<()> {
    session.select_class(plan.class_id)?;
    session.select_companion(plan.companion_id)?;
    for item in plan.starting_items {
        ensure!(
            session.toggle_starting_item(item)?,
            "starting item {item} was deselected instead of chosen"
        );
    }
    session.confirm_starting_items()?;
    ensure!(
        session.phase() == GamePhase::WorldMap,
        "character creation ended in {}",
        session.phase()
    );
    check_state(session.state(), session.config())
}

fn open_adventure(
    plan: &AdventurePlan,
    session: &mut GameSession,
    generator: &mut ScriptedGenerator,
    summary: &mut RunSummary,
) -> Result<()> {
    for _ in 0..MAX_OPENING_ATTEMPTS {
        summary.opening_attempts += 1;
        let before = session.state().clone();
        match session.start_adventure(generator, plan.location_id) {
            Ok(()) => {
                check_idle(session)?;
                ensure!(
                    session.state().history.len() == 1,
                    "opening left {} history entries",
                    session.state().history.len()
                );
                return check_state(session.state(), session.config());
            }
            Err(SessionError::Gateway(err)) => {
                summary.generator_failures += 1;
                log::debug!("opening failed: {err}");
                check_idle(session)?;
                ensure!(
                    session.phase() == GamePhase::WorldMap,
                    "failed opening moved the session to {}",
                    session.phase()
                );
                ensure!(session.state() == &before, "failed opening changed the state");
                while session.acknowledge_notification().is_some() {}
            }
            Err(other) => return Err(other.into()),
        }
    }
    bail!("no opening scene after {MAX_OPENING_ATTEMPTS} attempts")
}

fn play_turn(
    plan: &AdventurePlan,
    session: &mut GameSession,
    generator: &mut ScriptedGenerator,
    player: &mut Player,
    summary: &mut RunSummary,
) -> Result<()> {
    for shop_id in player.shopping_list(session) {
        let item = session.purchase(&shop_id)?;
        session.toggle_equip(&item.id)?;
        summary.purchases += 1;
        summary.decision_log.push(format!("bought {}", item.name));
    }
    check_state(session.state(), session.config())?;

    let scenario = session.scenario().cloned().context("adventure has no scenario")?;
    let before = session.state().clone();
    let quiz_answer = player.answer(&scenario);
    let is_quiz = quiz_answer.is_some();

    let result = if let Some(answer) = quiz_answer {
        summary.quizzes_answered += 1;
        summary.decision_log.push(format!("answered '{}'", answer.trim()));
        session.answer_quiz(generator, &answer)
    } else if let Some(index) = player.pick_action(&before, &scenario) {
        summary.actions_taken += 1;
        summary
            .decision_log
            .push(format!("chose #{index} {}", scenario.actions[index].label));
        session.take_action(generator, index)
    } else {
        bail!("scenario offers neither actions nor a quiz");
    };

    match result {
        Ok(report) => {
            check_history_growth(&before, session.state())?;
            ensure!(
                session.state().history.len() == before.history.len() + 2,
                "a resolved turn should add a choice and a narrative"
            );
            if is_quiz {
                let expected = if report.success {
                    session.config().quiz_bonus_gold
                } else {
                    0
                };
                ensure!(
                    report.gold_change == expected,
                    "quiz paid {} gold, expected {expected}",
                    report.gold_change
                );
                summary.quizzes_correct += usize::from(report.success);
            }
            summary.successes += usize::from(report.success);
            if let Some(item) = &report.loot {
                summary.loot_found += 1;
                ensure!(
                    before.item(&item.id).is_none(),
                    "loot reused the inventory id {}",
                    item.id
                );
            }
            if session.scenario().is_some_and(|next| next.is_dialogue()) {
                summary.dialogues_met += 1;
            }
        }
        Err(SessionError::Gateway(err)) => {
            summary.generator_failures += 1;
            summary.decision_log.push(format!("generator failed: {err}"));
            check_untouched_by_failure(&before, session.state())?;
            ensure!(
                session.scenario() == Some(&scenario),
                "failed call replaced the scenario"
            );
        }
        Err(other) => return Err(other.into()),
    }

    check_idle(session)?;
    check_state(session.state(), session.config())?;
    drain_notifications(session, summary)?;

    if plan.roundtrip_saves {
        check_save_roundtrip(session)?;
        summary.save_roundtrips += 1;
    }
    summary.turns_played += 1;
    Ok(())
}

fn drain_notifications(session: &mut GameSession, summary: &mut RunSummary) -> Result<()> {
    while let Some(notification) = session.acknowledge_notification() {
        match notification {
            Notification::DiceRoll(roll) => {
                summary.dice_notifications += 1;
                ensure!(
                    roll.success == (roll.total >= roll.difficulty),
                    "roll verdict disagrees with its numbers: {roll:?}"
                );
            }
            Notification::Reward(item) => ensure!(
                session.state().item(&item.id).is_some(),
                "reward {} is not in the inventory",
                item.name
            ),
            Notification::Notice(_) => {}
        }
    }
    Ok(())
}
