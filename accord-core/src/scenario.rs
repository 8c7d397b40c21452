//! Scenario - a full multi-thread negotiation problem instance
//!
//! A `Scenario` is immutable: per-thread outcome spaces (owned by the
//! center utility), the center utility itself, and one edge utility per
//! thread. `ScenarioSpec` is the serializable descriptor it is built
//! from when loaded from disk.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::outcome::{Outcome, OutcomeSpace};
use crate::ufun::{CenterUtility, MaxCenter, MeanStdCenter, TableUtility, UtilityFunction};

/// A full problem instance: center utility plus per-thread edge utilities
#[derive(Clone)]
pub struct Scenario {
    name: String,
    center_ufun: Arc<dyn CenterUtility>,
    edge_ufuns: Vec<Arc<dyn UtilityFunction>>,
}

impl Scenario {
    /// Build a scenario, validating that the thread counts agree.
    pub fn new(
        name: impl Into<String>,
        center_ufun: Arc<dyn CenterUtility>,
        edge_ufuns: Vec<Arc<dyn UtilityFunction>>,
    ) -> Result<Self, CoreError> {
        let n_edges = center_ufun.n_edges();
        if n_edges != edge_ufuns.len() {
            return Err(CoreError::Scenario(format!(
                "center utility covers {n_edges} threads but {} edge utilities were given",
                edge_ufuns.len()
            )));
        }
        if n_edges == 0 {
            return Err(CoreError::Scenario(
                "a scenario needs at least one negotiation thread".to_string(),
            ));
        }
        Ok(Self {
            name: name.into(),
            center_ufun,
            edge_ufuns,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of negotiation threads
    pub fn n_edges(&self) -> usize {
        self.edge_ufuns.len()
    }

    pub fn center_ufun(&self) -> &Arc<dyn CenterUtility> {
        &self.center_ufun
    }

    pub fn edge_ufuns(&self) -> &[Arc<dyn UtilityFunction>] {
        &self.edge_ufuns
    }

    pub fn outcome_spaces(&self) -> &[OutcomeSpace] {
        self.center_ufun.outcome_spaces()
    }
}

impl std::fmt::Debug for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scenario")
            .field("name", &self.name)
            .field("n_edges", &self.edge_ufuns.len())
            .finish_non_exhaustive()
    }
}

/// Serializable utility-function descriptor for a single thread
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UfunSpec {
    /// Explicit outcome-to-value table
    Table {
        space: OutcomeSpace,
        entries: Vec<(Outcome, f64)>,
        #[serde(default)]
        reserved_value: f64,
    },
}

impl UfunSpec {
    pub fn space(&self) -> &OutcomeSpace {
        match self {
            UfunSpec::Table { space, .. } => space,
        }
    }

    pub fn build(&self) -> Arc<dyn UtilityFunction> {
        match self {
            UfunSpec::Table {
                space,
                entries,
                reserved_value,
            } => Arc::new(
                TableUtility::new(space.clone(), entries.iter().cloned())
                    .with_reserved(*reserved_value),
            ),
        }
    }
}

/// Serializable center-utility descriptor
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CenterUfunSpec {
    /// Maximum over per-thread utilities
    Max {
        ufuns: Vec<UfunSpec>,
        #[serde(default)]
        reserved_value: f64,
    },
    /// Mean plus standard deviation of numeric issue values across threads
    MeanStd { outcome_spaces: Vec<OutcomeSpace> },
}

impl CenterUfunSpec {
    pub fn build(&self) -> Result<Arc<dyn CenterUtility>, CoreError> {
        match self {
            CenterUfunSpec::Max {
                ufuns,
                reserved_value,
            } => {
                let spaces: Vec<OutcomeSpace> = ufuns.iter().map(|u| u.space().clone()).collect();
                let built: Vec<Arc<dyn UtilityFunction>> =
                    ufuns.iter().map(UfunSpec::build).collect();
                Ok(Arc::new(MaxCenter::max(built, spaces, *reserved_value)?))
            }
            CenterUfunSpec::MeanStd { outcome_spaces } => {
                Ok(Arc::new(MeanStdCenter::new(outcome_spaces.clone())))
            }
        }
    }
}

/// Serializable scenario descriptor
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSpec {
    #[serde(default)]
    pub name: String,
    pub center_ufun: CenterUfunSpec,
    pub edge_ufuns: Vec<UfunSpec>,
}

impl ScenarioSpec {
    pub fn build(&self) -> Result<Scenario, CoreError> {
        Scenario::new(
            self.name.clone(),
            self.center_ufun.build()?,
            self.edge_ufuns.iter().map(UfunSpec::build).collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::Issue;

    fn binary_space(name: &str) -> OutcomeSpace {
        OutcomeSpace::cartesian(
            name,
            vec![Issue::new("accept", vec!["yes".into(), "no".into()])],
        )
    }

    fn table_spec(name: &str) -> UfunSpec {
        UfunSpec::Table {
            space: binary_space(name),
            entries: vec![(vec!["yes".into()], 1.0), (vec!["no".into()], 0.0)],
            reserved_value: 0.0,
        }
    }

    pub(crate) fn two_thread_spec(name: &str) -> ScenarioSpec {
        ScenarioSpec {
            name: name.to_string(),
            center_ufun: CenterUfunSpec::Max {
                ufuns: vec![table_spec("t0"), table_spec("t1")],
                reserved_value: 0.0,
            },
            edge_ufuns: vec![table_spec("t0"), table_spec("t1")],
        }
    }

    #[test]
    fn test_spec_builds_consistent_scenario() {
        let scenario = two_thread_spec("demo").build().unwrap();
        assert_eq!(scenario.name(), "demo");
        assert_eq!(scenario.n_edges(), 2);
        assert_eq!(scenario.outcome_spaces().len(), 2);
        assert_eq!(
            scenario
                .center_ufun()
                .evaluate(&[Some(vec!["yes".into()]), None]),
            1.0
        );
    }

    #[test]
    fn test_scenario_rejects_count_mismatch() {
        let mut spec = two_thread_spec("bad");
        spec.edge_ufuns.pop();
        let err = spec.build().unwrap_err();
        assert!(matches!(err, CoreError::Scenario(_)));
    }

    #[test]
    fn test_spec_serde_round_trip() {
        let spec = two_thread_spec("demo");
        let text = serde_json::to_string(&spec).unwrap();
        let back: ScenarioSpec = serde_json::from_str(&text).unwrap();
        assert_eq!(back, spec);
    }
}
