//! Score records and tournament results

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use accord_core::ParamMap;

use crate::session::SessionResult;

/// One scored row of a tournament
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScoreRecord {
    /// Competitor identity the row belongs to
    pub agent: String,
    /// Utility after role scaling
    pub utility: f64,
    /// Average utility of the partners in the same session
    pub partner_average_utility: f64,
    pub scenario: String,
    pub repetition: usize,
    pub rotation: usize,
    pub scenario_index: usize,
    /// Role index: 0 for the center, thread index + 1 for edges
    pub index: usize,
}

/// Information about one negotiation session of a tournament
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionInfo {
    pub scenario_name: String,
    pub repetition: usize,
    pub rotation: usize,
    pub center_type_name: String,
    pub center_params: ParamMap,
    pub edge_type_names: Vec<String>,
    pub edge_params: Vec<ParamMap>,
    pub result: SessionResult,
    pub path: Option<PathBuf>,
    pub executed_at: DateTime<Utc>,
}

/// Results of a tournament: final per-competitor scores, every score
/// record, and every session. Returned even when some jobs failed.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TournamentResults {
    /// Summed raw (unscaled) utility per competitor identity
    pub final_scores: FxHashMap<String, f64>,
    pub scores: Vec<ScoreRecord>,
    pub session_results: Vec<SessionInfo>,
}

impl TournamentResults {
    /// Identities ranked by final score (descending)
    pub fn ranked(&self) -> Vec<(String, f64)> {
        let mut ranked: Vec<(String, f64)> = self
            .final_scores
            .iter()
            .map(|(name, score)| (name.clone(), *score))
            .collect();
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        ranked
    }

    /// Get winner (top identity)
    pub fn winner(&self) -> Option<(String, f64)> {
        self.ranked().into_iter().next()
    }

    /// Final score for one identity, zero when it never scored
    pub fn score_of(&self, identity: &str) -> f64 {
        self.final_scores.get(identity).copied().unwrap_or(0.0)
    }
}
