//! ACCORD Tournament - scheduling and scoring
//!
//! This crate provides the tournament infrastructure:
//! - Scenario assignment (binding competitors to center/edge roles)
//! - The session runner driving the mechanism service
//! - The scheduler: rotation, shuffling, fill-ins, dispatch, scoring
//! - Tournament descriptors (save/load)

mod assign;
mod config;
mod error;
mod score;
mod session;
mod tournament;

pub use assign::{assign_scenario, AssignedScenario, Competitor};
pub use config::{Parallelism, RunParams, TournamentOptions};
pub use error::TournamentError;
pub use score::{ScoreRecord, SessionInfo, TournamentResults};
pub use session::{run_assigned, SessionResult};
pub use tournament::{Tournament, TournamentSpec};
