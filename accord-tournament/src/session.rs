//! Session runner - drives one assigned scenario through the mechanism
//!
//! Builds one two-party session per thread, delegates execution of the
//! whole batch to the mechanism service in a single call, then derives
//! center and edge utilities from the resulting agreements.

use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use accord_core::{resolve_side_utilities, Outcome, ThreadContext};
use accord_mechanism::{party, run_all, with_party, Endpoint, PartyHandle, SaoSession};

use crate::assign::AssignedScenario;

/// Result of one multi-thread negotiation session
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionResult {
    /// Per-thread agreement, `None` where the thread ended without one
    pub agreements: Vec<Option<Outcome>>,
    pub center_utility: f64,
    /// Edge utility per thread; NaN when undefined
    pub edge_utilities: Vec<f64>,
}

/// Run an assigned scenario and score the agreements.
///
/// `dry` skips execution and returns all-absent agreements with zero
/// utilities. Traces are persisted only when `output` is given and the
/// run is not dry.
pub fn run_assigned(
    assigned: AssignedScenario,
    name: &str,
    output: Option<&Path>,
    dry: bool,
    seed: u64,
) -> anyhow::Result<SessionResult> {
    let AssignedScenario {
        scenario,
        run_params,
        center,
        edges,
        ..
    } = assigned;
    let n_edges = scenario.n_edges();
    let sides = resolve_side_utilities(scenario.center_ufun());
    let edge_ufuns = scenario.edge_ufuns().to_vec();

    let center: PartyHandle = party(center);
    let edge_handles: Vec<PartyHandle> = edges.into_iter().map(party).collect();

    let share = run_params.share_ufuns;
    for i in 0..n_edges {
        with_party(&center, |p| {
            p.attach(ThreadContext {
                index: i,
                is_center: true,
                ufun: sides[i].clone(),
                opponent_ufun: share.then(|| edge_ufuns[i].clone()),
                partner_id: format!("e{i}"),
                seed: seed.wrapping_add(2 * i as u64),
            })
        })?;
        with_party(&edge_handles[i], |p| {
            p.attach(ThreadContext {
                index: i,
                is_center: false,
                ufun: edge_ufuns[i].clone(),
                opponent_ufun: share.then(|| sides[i].clone()),
                partner_id: format!("s{i}"),
                seed: seed.wrapping_add(2 * i as u64 + 1),
            })
        })?;
    }
    with_party(&center, |p| p.init())?;
    for edge in &edge_handles {
        with_party(edge, |p| p.init())?;
    }

    // dry runs never invoke the mechanism service
    if dry {
        return Ok(SessionResult {
            agreements: vec![None; n_edges],
            center_utility: 0.0,
            edge_utilities: vec![0.0; n_edges],
        });
    }

    let mut sessions: Vec<SaoSession> = (0..n_edges)
        .map(|i| {
            SaoSession::new(
                format!("n{i}"),
                Endpoint {
                    party: center.clone(),
                    thread: i,
                    id: format!("s{i}"),
                },
                Endpoint {
                    party: edge_handles[i].clone(),
                    thread: i,
                    id: format!("e{i}"),
                },
                run_params.nsteps,
                run_params.atomic,
            )
        })
        .collect();

    run_all(&mut sessions, run_params.method, run_params.keep_order, seed)?;

    if let Some(base) = output {
        write_traces(base, name, &sessions)?;
    }

    let agreements: Vec<Option<Outcome>> =
        sessions.iter().map(|s| s.agreement().cloned()).collect();
    let center_utility = scenario.center_ufun().evaluate(&agreements);
    let edge_utilities = edge_ufuns
        .iter()
        .zip(&agreements)
        .map(|(ufun, agreement)| ufun.eval(agreement.as_ref()))
        .collect();

    Ok(SessionResult {
        agreements,
        center_utility,
        edge_utilities,
    })
}

/// One JSON-lines trace file per thread under `<output>/<name>/log/`
fn write_traces(base: &Path, name: &str, sessions: &[SaoSession]) -> anyhow::Result<()> {
    let dir = base.join(name).join("log");
    fs::create_dir_all(&dir)
        .with_context(|| format!("creating trace directory {}", dir.display()))?;
    for session in sessions {
        let mut lines = String::new();
        for row in session.trace() {
            lines.push_str(&serde_json::to_string(row)?);
            lines.push('\n');
        }
        fs::write(dir.join(format!("{}.jsonl", session.name())), lines)?;
    }
    Ok(())
}
