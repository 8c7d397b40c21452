//! Scenario assignment - binding competitors to roles

use std::hash::{Hash, Hasher};

use rand::Rng;
use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};

use accord_core::{resolve_side_utilities, CoreError, Negotiator, ParamMap, Registry, Scenario};

use crate::config::RunParams;

/// A competitor entry: strategy type name plus construction parameters
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Competitor {
    pub type_name: String,
    #[serde(default, skip_serializing_if = "ParamMap::is_empty")]
    pub params: ParamMap,
}

impl Competitor {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            params: ParamMap::new(),
        }
    }

    pub fn with_params(type_name: impl Into<String>, params: ParamMap) -> Self {
        Self {
            type_name: type_name.into(),
            params,
        }
    }

    /// Scoring identity: the type name alone, or disambiguated by a
    /// stable hash of the parameter map when parameters were supplied.
    pub fn identity(&self) -> String {
        if self.params.is_empty() {
            return self.type_name.clone();
        }
        let mut hasher = FxHasher::default();
        // ordered keys keep the hash stable across runs
        for (key, value) in &self.params {
            key.hash(&mut hasher);
            value.to_string().hash(&mut hasher);
        }
        format!("{}-{:08x}", self.type_name, hasher.finish() as u32)
    }
}

/// A scenario bound to concrete participants, ready to run
pub struct AssignedScenario {
    pub scenario: Scenario,
    pub run_params: RunParams,
    pub center_spec: Competitor,
    pub center: Box<dyn Negotiator>,
    pub edge_specs: Vec<Competitor>,
    pub edges: Vec<Box<dyn Negotiator>>,
}

impl std::fmt::Debug for AssignedScenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssignedScenario")
            .field("scenario", &self.scenario.name())
            .field("run_params", &self.run_params)
            .field("center_spec", &self.center_spec)
            .field("edge_specs", &self.edge_specs)
            .finish_non_exhaustive()
    }
}

/// Instantiate exactly one center and one edge per thread for a scenario.
///
/// When `sample_edges` is set, edge types are drawn independently and
/// uniformly (with replacement) from `edge_types`; otherwise thread `i`
/// gets `edge_types[i % len]`, round-robin when there are fewer types
/// than threads.
pub fn assign_scenario<R: Rng + ?Sized>(
    scenario: &Scenario,
    registry: &Registry,
    run_params: RunParams,
    center: &Competitor,
    edge_types: &[Competitor],
    sample_edges: bool,
    rng: &mut R,
) -> anyhow::Result<AssignedScenario> {
    let n_edges = scenario.n_edges();
    // the center contract: one side utility per thread
    let sides = resolve_side_utilities(scenario.center_ufun());
    if sides.len() != n_edges {
        return Err(CoreError::TypeMismatch(format!(
            "center utility exposes {} side utilities for {} threads",
            sides.len(),
            n_edges
        ))
        .into());
    }
    if edge_types.is_empty() {
        return Err(CoreError::Scenario("no edge types to assign".to_string()).into());
    }

    let center_negotiator = registry.create(&center.type_name, &center.params)?;
    let mut edge_specs = Vec::with_capacity(n_edges);
    let mut edges = Vec::with_capacity(n_edges);
    for i in 0..n_edges {
        let spec = if sample_edges {
            &edge_types[rng.gen_range(0..edge_types.len())]
        } else {
            &edge_types[i % edge_types.len()]
        };
        edges.push(registry.create(&spec.type_name, &spec.params)?);
        edge_specs.push(spec.clone());
    }

    Ok(AssignedScenario {
        scenario: scenario.clone(),
        run_params,
        center_spec: center.clone(),
        center: center_negotiator,
        edge_specs,
        edges,
    })
}
