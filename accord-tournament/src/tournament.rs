//! Tournament scheduling - rotation, dispatch, and scoring
//!
//! Job generation is a nested repetition x scenario x rotation loop. A
//! persistent competitor order is rotated by one position after every
//! repetition; within one (repetition, scenario) pair the pool is
//! shuffled once and every pool member centers exactly once. Jobs are
//! independent units dispatched serially or across a bounded worker
//! pool; a failing job is logged and excluded, never fatal.

use std::fs;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Utc;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use accord_core::{ParamMap, Registry, Scenario, ScenarioSpec};

use crate::assign::{assign_scenario, AssignedScenario, Competitor};
use crate::config::{RunParams, TournamentOptions};
use crate::error::TournamentError;
use crate::score::{ScoreRecord, SessionInfo, TournamentResults};
use crate::session::{run_assigned, SessionResult};

/// Provenance of one scheduled session
struct JobMeta {
    scenario_name: String,
    repetition: usize,
    rotation: usize,
    scenario_index: usize,
    center: Competitor,
    /// Edges in thread order; the flag marks fill-in participants
    edge_info: Vec<(Competitor, bool)>,
    nedges_counted: usize,
    output: Option<PathBuf>,
    seed: u64,
}

/// One scheduled session: assignment plus provenance. Created per
/// scheduling pass, consumed by exactly one worker.
struct Job {
    meta: JobMeta,
    assigned: AssignedScenario,
}

/// A full tournament definition
pub struct Tournament {
    competitors: Vec<Competitor>,
    scenarios: Vec<Scenario>,
    run_params: RunParams,
}

impl std::fmt::Debug for Tournament {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tournament")
            .field("competitors", &self.competitors)
            .field(
                "scenarios",
                &self.scenarios.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .field("run_params", &self.run_params)
            .finish()
    }
}

impl Tournament {
    /// Build a tournament, validating the pool against every scenario.
    pub fn new(
        competitors: Vec<Competitor>,
        scenarios: Vec<Scenario>,
        run_params: RunParams,
    ) -> Result<Self, TournamentError> {
        if competitors.is_empty() {
            return Err(TournamentError::Configuration(
                "at least one competitor is required".to_string(),
            ));
        }
        for scenario in &scenarios {
            if competitors.len() < scenario.n_edges() {
                return Err(TournamentError::Configuration(format!(
                    "{} competitors is not enough for {} edges in scenario '{}'",
                    competitors.len(),
                    scenario.n_edges(),
                    scenario.name()
                )));
            }
        }
        Ok(Self {
            competitors,
            scenarios,
            run_params,
        })
    }

    pub fn competitors(&self) -> &[Competitor] {
        &self.competitors
    }

    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    pub fn run_params(&self) -> &RunParams {
        &self.run_params
    }

    /// Run the tournament and aggregate scores.
    ///
    /// Always returns a result object; individual job failures are
    /// logged and excluded from scoring.
    pub fn run(
        &self,
        registry: &Registry,
        opts: &TournamentOptions,
    ) -> anyhow::Result<TournamentResults> {
        let mut rng = ChaCha8Rng::seed_from_u64(opts.seed);
        let jobs = self.generate_jobs(registry, opts, &mut rng)?;
        info!("running {} negotiation sessions", jobs.len());
        let completed = dispatch(jobs, opts)?;
        Ok(score_sessions(completed, opts))
    }

    /// Generate every job of the repetition x scenario x rotation loop.
    fn generate_jobs(
        &self,
        registry: &Registry,
        opts: &TournamentOptions,
        rng: &mut ChaCha8Rng,
    ) -> anyhow::Result<Vec<Job>> {
        let mut order: Vec<usize> = (0..self.competitors.len()).collect();
        let mut jobs: Vec<Job> = Vec::new();

        for repetition in 0..opts.n_repetitions {
            for (scenario_index, scenario) in self.scenarios.iter().enumerate() {
                let n_edges = scenario.n_edges();
                let scenario_name = if scenario.name().is_empty() {
                    format!("s{scenario_index:03}")
                } else {
                    scenario.name().to_string()
                };

                // shuffle the pool once per (repetition, scenario)
                let mut pool: Vec<Competitor> =
                    order.iter().map(|&i| self.competitors[i].clone()).collect();
                pool.shuffle(rng);

                for rotation in 0..pool.len() {
                    let center = pool[rotation].clone();
                    let mut edge_info: Vec<(Competitor, bool)> = pool
                        .iter()
                        .enumerate()
                        .filter(|(index, _)| *index != rotation)
                        .map(|(_, competitor)| (competitor.clone(), false))
                        .collect();
                    edge_info.truncate(n_edges);
                    // draw fill-ins when the pool cannot fill every thread
                    while edge_info.len() < n_edges {
                        let fill_pool = if opts.non_competitors.is_empty() {
                            &self.competitors
                        } else {
                            &opts.non_competitors
                        };
                        let pick = fill_pool[rng.gen_range(0..fill_pool.len())].clone();
                        edge_info.push((pick, true));
                    }
                    edge_info.shuffle(rng);

                    let nedges_counted = if opts.count_fill_ins {
                        n_edges
                    } else {
                        n_edges.min(pool.len() - 1)
                    };
                    let output = opts.output.as_ref().map(|path| {
                        path.join("results")
                            .join(&scenario_name)
                            .join(format!("r{rotation:03}t{repetition:03}"))
                    });

                    let edge_specs: Vec<Competitor> =
                        edge_info.iter().map(|(c, _)| c.clone()).collect();
                    let assigned = assign_scenario(
                        scenario,
                        registry,
                        self.run_params,
                        &center,
                        &edge_specs,
                        false,
                        rng,
                    )?;

                    let seed = opts.seed.wrapping_add(jobs.len() as u64);
                    jobs.push(Job {
                        meta: JobMeta {
                            scenario_name: scenario_name.clone(),
                            repetition,
                            rotation,
                            scenario_index,
                            center,
                            edge_info,
                            nedges_counted,
                            output,
                            seed,
                        },
                        assigned,
                    });
                }
            }
            // last to front: over n repetitions every competitor centers
            // against every relative ordering of the others
            order.rotate_right(1);
        }
        Ok(jobs)
    }
}

/// Run one job, containing any failure (including panics) inside it
fn run_job(job: Job, dry: bool) -> (JobMeta, Result<SessionResult, TournamentError>) {
    let Job { meta, assigned } = job;
    let name = format!("{}_{}_{}", meta.scenario_name, meta.rotation, meta.repetition);
    let output = meta.output.clone();
    let result = catch_unwind(AssertUnwindSafe(|| {
        run_assigned(assigned, &name, output.as_deref(), dry, meta.seed)
    }))
    .unwrap_or_else(|_| Err(anyhow::anyhow!("session panicked")))
    .map_err(|err| TournamentError::JobExecution(format!("{err:#}")));
    (meta, result)
}

/// Dispatch all jobs serially or across a bounded rayon pool.
fn dispatch(
    jobs: Vec<Job>,
    opts: &TournamentOptions,
) -> anyhow::Result<Vec<(JobMeta, SessionResult)>> {
    let outcomes: Vec<(JobMeta, Result<SessionResult, TournamentError>)> =
        match opts.parallelism.workers() {
            None => jobs
                .into_iter()
                .map(|job| run_job(job, opts.dry))
                .collect(),
            Some(workers) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(workers)
                    .build()
                    .context("building the dispatch worker pool")?;
                pool.install(|| {
                    jobs.into_par_iter()
                        .map(|job| run_job(job, opts.dry))
                        .collect()
                })
            }
        };

    // a failing job is logged and excluded; siblings are unaffected
    Ok(outcomes
        .into_iter()
        .filter_map(|(meta, result)| match result {
            Ok(result) => Some((meta, result)),
            Err(err) => {
                warn!(
                    "excluding session {} r{} t{}: {err}",
                    meta.scenario_name, meta.rotation, meta.repetition
                );
                None
            }
        })
        .collect())
}

/// Turn completed sessions into score records and final scores.
fn score_sessions(
    completed: Vec<(JobMeta, SessionResult)>,
    opts: &TournamentOptions,
) -> TournamentResults {
    let mut final_scores: FxHashMap<String, f64> = FxHashMap::default();
    let mut scores: Vec<ScoreRecord> = Vec::new();
    let mut session_results: Vec<SessionInfo> = Vec::new();

    for (meta, result) in completed {
        let center_multiplier = opts
            .center_multiplier
            .unwrap_or(meta.edge_info.len() as f64);
        let center_identity = meta.center.identity();
        let mean_edge_utility = result.edge_utilities.iter().sum::<f64>()
            / result.edge_utilities.len().max(1) as f64;

        scores.push(ScoreRecord {
            agent: center_identity.clone(),
            utility: result.center_utility * center_multiplier,
            partner_average_utility: mean_edge_utility,
            scenario: meta.scenario_name.clone(),
            repetition: meta.repetition,
            rotation: meta.rotation,
            scenario_index: meta.scenario_index,
            index: 0,
        });
        *final_scores.entry(center_identity).or_default() += result.center_utility;

        for (position, (competitor, fill_in)) in meta.edge_info.iter().enumerate() {
            if *fill_in && !opts.count_fill_ins {
                continue;
            }
            let identity = competitor.identity();
            scores.push(ScoreRecord {
                agent: identity.clone(),
                utility: result.edge_utilities[position] * opts.edge_multiplier,
                partner_average_utility: result.center_utility,
                scenario: meta.scenario_name.clone(),
                repetition: meta.repetition,
                rotation: meta.rotation,
                scenario_index: meta.scenario_index,
                index: position + 1,
            });
            *final_scores.entry(identity).or_default() += result.edge_utilities[position];
        }

        session_results.push(SessionInfo {
            scenario_name: meta.scenario_name,
            repetition: meta.repetition,
            rotation: meta.rotation,
            center_type_name: meta.center.type_name.clone(),
            center_params: meta.center.params.clone(),
            edge_type_names: meta
                .edge_info
                .iter()
                .map(|(c, _)| c.type_name.clone())
                .collect(),
            edge_params: meta.edge_info.iter().map(|(c, _)| c.params.clone()).collect(),
            result,
            path: meta.output,
            executed_at: Utc::now(),
        });
    }

    TournamentResults {
        final_scores,
        scores,
        session_results,
    }
}

/// Serializable tournament descriptor
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TournamentSpec {
    pub competitors: Vec<String>,
    #[serde(default)]
    pub run_params: RunParams,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub competitor_params: Option<Vec<ParamMap>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scenarios: Vec<ScenarioSpec>,
}

impl TournamentSpec {
    /// Save the descriptor. With `separate_scenarios` the scenarios go
    /// to individual files in a `scenarios/` folder beside the path.
    pub fn save(&self, path: &Path, separate_scenarios: bool) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
        }
        if separate_scenarios {
            let base = path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default()
                .join("scenarios");
            fs::create_dir_all(&base).with_context(|| format!("creating {}", base.display()))?;
            for (index, scenario) in self.scenarios.iter().enumerate() {
                let name = if scenario.name.is_empty() {
                    format!("s{index:03}")
                } else {
                    scenario.name.clone()
                };
                fs::write(
                    base.join(format!("{name}.yaml")),
                    serde_yaml::to_string(scenario)?,
                )?;
            }
            let stripped = Self {
                scenarios: Vec::new(),
                ..self.clone()
            };
            fs::write(path, serde_yaml::to_string(&stripped)?)?;
        } else {
            fs::write(path, serde_yaml::to_string(self)?)?;
        }
        Ok(())
    }

    /// Load a descriptor, merging any scenario files stored beside it.
    /// Malformed content fails fast with no recovery.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading tournament descriptor {}", path.display()))?;
        let mut spec: TournamentSpec = serde_yaml::from_str(&text)
            .with_context(|| format!("malformed tournament descriptor {}", path.display()))?;

        let base = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default()
            .join("scenarios");
        if base.exists() {
            let mut files: Vec<PathBuf> = fs::read_dir(&base)
                .with_context(|| format!("reading {}", base.display()))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| {
                    matches!(
                        p.extension().and_then(|e| e.to_str()),
                        Some("yaml") | Some("yml")
                    )
                })
                .collect();
            files.sort();
            for file in files {
                let text = fs::read_to_string(&file)
                    .with_context(|| format!("reading scenario file {}", file.display()))?;
                spec.scenarios.push(
                    serde_yaml::from_str(&text)
                        .with_context(|| format!("malformed scenario file {}", file.display()))?,
                );
            }
        }
        Ok(spec)
    }

    /// Build the runnable tournament from the descriptor.
    pub fn build(&self) -> anyhow::Result<Tournament> {
        let params: Vec<ParamMap> = match &self.competitor_params {
            Some(params) if params.len() == self.competitors.len() => params.clone(),
            Some(params) => anyhow::bail!(
                "{} parameter maps for {} competitors",
                params.len(),
                self.competitors.len()
            ),
            None => vec![ParamMap::new(); self.competitors.len()],
        };
        let competitors: Vec<Competitor> = self
            .competitors
            .iter()
            .zip(params)
            .map(|(name, params)| Competitor::with_params(name.clone(), params))
            .collect();
        let scenarios: Vec<Scenario> = self
            .scenarios
            .iter()
            .map(ScenarioSpec::build)
            .collect::<Result<_, _>>()?;
        Ok(Tournament::new(competitors, scenarios, self.run_params)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Parallelism;
    use accord_core::{
        CenterUfunSpec, Issue, Negotiator, OutcomeSpace, Response, ThreadContext, ThreadState,
        UfunSpec,
    };

    fn table_spec(name: &str) -> UfunSpec {
        UfunSpec::Table {
            space: OutcomeSpace::cartesian(
                name,
                vec![Issue::new("accept", vec!["yes".into(), "no".into()])],
            ),
            entries: vec![(vec!["yes".into()], 1.0), (vec!["no".into()], 0.0)],
            reserved_value: 0.0,
        }
    }

    fn scenario_spec(name: &str, n_edges: usize) -> ScenarioSpec {
        let ufuns: Vec<UfunSpec> = (0..n_edges).map(|i| table_spec(&format!("t{i}"))).collect();
        ScenarioSpec {
            name: name.to_string(),
            center_ufun: CenterUfunSpec::Max {
                ufuns: ufuns.clone(),
                reserved_value: 0.0,
            },
            edge_ufuns: ufuns,
        }
    }

    fn scenario(name: &str, n_edges: usize) -> Scenario {
        scenario_spec(name, n_edges).build().unwrap()
    }

    fn competitors(names: &[&str]) -> Vec<Competitor> {
        names.iter().map(|&name| Competitor::new(name)).collect()
    }

    #[test]
    fn test_too_few_competitors_is_fatal() {
        let err = Tournament::new(
            competitors(&["boulware"]),
            vec![scenario("s", 2)],
            RunParams::default(),
        )
        .unwrap_err();
        assert!(matches!(err, TournamentError::Configuration(_)));
    }

    #[test]
    fn test_every_competitor_centers_once_per_repetition() {
        // competitors {A, B, C}, two threads, three repetitions, one
        // scenario: the pool always equals n_edges + 1, every rotation
        // uses all three, and each competitor centers exactly 3 times
        let tournament = Tournament::new(
            competitors(&["boulware", "linear", "conceder"]),
            vec![scenario("s", 2)],
            RunParams::default(),
        )
        .unwrap();
        let registry = Registry::with_builtins();
        let opts = TournamentOptions::repetitions(3).serial();
        let mut rng = ChaCha8Rng::seed_from_u64(opts.seed);
        let jobs = tournament.generate_jobs(&registry, &opts, &mut rng).unwrap();
        assert_eq!(jobs.len(), 9);

        let mut center_counts: FxHashMap<String, usize> = FxHashMap::default();
        for job in &jobs {
            *center_counts
                .entry(job.meta.center.identity())
                .or_default() += 1;
            assert_eq!(job.meta.edge_info.len(), 2);
            assert!(job.meta.edge_info.iter().all(|(_, fill)| !fill));
        }
        for name in ["boulware", "linear", "conceder"] {
            assert_eq!(center_counts[name], 3, "{name} must center once per rep");
        }

        // within each repetition too, every competitor centers once
        for repetition in 0..3 {
            let mut per_rep: FxHashMap<String, usize> = FxHashMap::default();
            for job in jobs.iter().filter(|j| j.meta.repetition == repetition) {
                *per_rep.entry(job.meta.center.identity()).or_default() += 1;
            }
            assert!(per_rep.values().all(|&count| count == 1));
        }
    }

    #[test]
    fn test_fill_ins_are_tagged_and_counted() {
        // pool of 2 for 2 edges: one fill-in per job, one counted edge
        let tournament = Tournament::new(
            competitors(&["boulware", "linear"]),
            vec![scenario("s", 2)],
            RunParams::default(),
        )
        .unwrap();
        let registry = Registry::with_builtins();
        let opts = TournamentOptions::repetitions(1)
            .serial()
            .with_non_competitors(vec![Competitor::new("random")]);
        let mut rng = ChaCha8Rng::seed_from_u64(opts.seed);
        let jobs = tournament.generate_jobs(&registry, &opts, &mut rng).unwrap();
        assert_eq!(jobs.len(), 2);
        for job in &jobs {
            assert_eq!(job.meta.nedges_counted, 1);
            let fill_ins: Vec<_> = job
                .meta
                .edge_info
                .iter()
                .filter(|(_, fill)| *fill)
                .collect();
            assert_eq!(fill_ins.len(), 1);
            assert_eq!(fill_ins[0].0.type_name, "random");
        }
    }

    #[test]
    fn test_fill_ins_never_receive_score_records() {
        let tournament = Tournament::new(
            competitors(&["boulware", "linear"]),
            vec![scenario("s", 2)],
            RunParams::default(),
        )
        .unwrap();
        let registry = Registry::with_builtins();
        let opts = TournamentOptions::repetitions(2)
            .serial()
            .with_non_competitors(vec![Competitor::new("random")]);
        let results = tournament.run(&registry, &opts).unwrap();

        assert!(!results.scores.is_empty());
        for record in &results.scores {
            assert_ne!(record.agent, "random", "fill-ins must not be scored");
        }
        assert!(!results.final_scores.contains_key("random"));
        // one center record plus one counted edge record per session
        assert_eq!(results.scores.len(), results.session_results.len() * 2);
    }

    #[test]
    fn test_dry_run_always_succeeds_trivially() {
        let tournament = Tournament::new(
            competitors(&["boulware", "linear", "conceder"]),
            vec![scenario("s", 2)],
            RunParams::default(),
        )
        .unwrap();
        let registry = Registry::with_builtins();
        let opts = TournamentOptions::repetitions(2).serial().dry();
        let results = tournament.run(&registry, &opts).unwrap();

        assert_eq!(results.session_results.len(), 6);
        for session in &results.session_results {
            assert!(session.result.agreements.iter().all(Option::is_none));
            assert_eq!(session.result.center_utility, 0.0);
        }
        // dry utilities are all zero, so every final score is zero
        assert!(results.final_scores.values().all(|&score| score == 0.0));
    }

    #[test]
    fn test_parallel_and_serial_scores_match() {
        let tournament = Tournament::new(
            competitors(&["boulware", "linear", "conceder"]),
            vec![scenario("s", 2)],
            RunParams::default(),
        )
        .unwrap();
        let registry = Registry::with_builtins();

        let serial = tournament
            .run(&registry, &TournamentOptions::repetitions(2).serial())
            .unwrap();
        let parallel = tournament
            .run(
                &registry,
                &TournamentOptions::repetitions(2).with_parallelism(Parallelism::Cores(2)),
            )
            .unwrap();

        assert_eq!(serial.final_scores.len(), parallel.final_scores.len());
        for (identity, score) in &serial.final_scores {
            let other = parallel.score_of(identity);
            assert!(
                (score - other).abs() < 1e-9,
                "{identity}: {score} vs {other}"
            );
        }
    }

    #[test]
    fn test_center_multiplier_defaults_to_edge_count() {
        let tournament = Tournament::new(
            competitors(&["boulware", "linear", "conceder"]),
            vec![scenario("s", 2)],
            RunParams::default(),
        )
        .unwrap();
        let registry = Registry::with_builtins();
        let results = tournament
            .run(&registry, &TournamentOptions::repetitions(1).serial())
            .unwrap();
        for record in results.scores.iter().filter(|r| r.index == 0) {
            let session = results
                .session_results
                .iter()
                .find(|s| s.rotation == record.rotation && s.repetition == record.repetition)
                .unwrap();
            let expected = session.result.center_utility * 2.0;
            assert!((record.utility - expected).abs() < 1e-12);
        }
    }

    /// Strategy whose jobs always fail
    struct Explosive;

    impl Negotiator for Explosive {
        fn attach(&mut self, _ctx: ThreadContext) {}

        fn propose(&mut self, _thread: usize, _state: &ThreadState) -> Option<accord_core::Outcome> {
            panic!("strategy failure")
        }

        fn respond(
            &mut self,
            _thread: usize,
            _state: &ThreadState,
            _offer: &accord_core::Outcome,
        ) -> Response {
            panic!("strategy failure")
        }
    }

    #[test]
    fn test_failing_jobs_are_excluded_not_fatal() {
        let mut registry = Registry::with_builtins();
        registry.register("explosive", |_params| {
            Ok(Box::new(Explosive) as Box<dyn Negotiator>)
        });

        let tournament = Tournament::new(
            competitors(&["boulware", "linear", "explosive"]),
            vec![scenario("s", 1)],
            RunParams::default(),
        )
        .unwrap();
        let results = tournament
            .run(&registry, &TournamentOptions::repetitions(1).serial())
            .unwrap();

        // the failing strategy centers once, so at least one of the
        // three jobs is dropped; the run still returns a result object
        assert!(results.session_results.len() <= 2);
        for session in &results.session_results {
            assert_ne!(session.center_type_name, "explosive");
            assert!(!session
                .edge_type_names
                .iter()
                .any(|name| name == "explosive"));
        }
        assert!(!results.final_scores.contains_key("explosive"));
    }

    fn temp_dir(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("accord-{tag}-{}", std::process::id()))
    }

    #[test]
    fn test_spec_save_load_round_trip() {
        let spec = TournamentSpec {
            competitors: vec!["boulware".to_string(), "linear".to_string()],
            run_params: RunParams::new(50),
            competitor_params: None,
            scenarios: vec![scenario_spec("s000", 2)],
        };
        let dir = temp_dir("spec");
        let _ = fs::remove_dir_all(&dir);
        let path = dir.join("tournament.yaml");

        spec.save(&path, false).unwrap();
        let loaded = TournamentSpec::load(&path).unwrap();
        assert_eq!(loaded, spec);
        assert_eq!(loaded.build().unwrap().scenarios().len(), 1);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_separate_scenarios_merge_on_load() {
        let spec = TournamentSpec {
            competitors: vec!["boulware".to_string(), "linear".to_string()],
            run_params: RunParams::default(),
            competitor_params: None,
            scenarios: vec![scenario_spec("alpha", 2), scenario_spec("beta", 2)],
        };
        let dir = temp_dir("split");
        let _ = fs::remove_dir_all(&dir);
        let path = dir.join("tournament.yaml");

        spec.save(&path, true).unwrap();
        assert!(dir.join("scenarios").join("alpha.yaml").exists());
        assert!(dir.join("scenarios").join("beta.yaml").exists());

        let loaded = TournamentSpec::load(&path).unwrap();
        let mut names: Vec<&str> = loaded.scenarios.iter().map(|s| s.name.as_str()).collect();
        names.sort_unstable();
        assert_eq!(names, vec!["alpha", "beta"]);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_malformed_descriptor_fails_fast() {
        let dir = temp_dir("bad");
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("tournament.yaml");
        fs::write(&path, "competitors: {not a list}").unwrap();
        assert!(TournamentSpec::load(&path).is_err());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_param_count_mismatch_fails_to_build() {
        let spec = TournamentSpec {
            competitors: vec!["boulware".to_string(), "linear".to_string()],
            run_params: RunParams::default(),
            competitor_params: Some(vec![ParamMap::new()]),
            scenarios: vec![scenario_spec("s", 2)],
        };
        assert!(spec.build().is_err());
    }
}
