pub mod invariants;
pub mod policy;
pub mod reports;
pub mod scenarios;
pub mod scripted;
pub mod seeds;
pub mod simulation;
pub mod tester;

pub use policy::{ActionPolicy, Player, PurchasePolicy, QuizPolicy};
pub use scenarios::{get_scenario, list_scenarios, scenario_names};
pub use seeds::resolve_seed_inputs;
pub use tester::*;
