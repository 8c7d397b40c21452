//! Run parameters and tournament options

use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use accord_mechanism::ExecutionMethod;

use crate::assign::Competitor;

/// Running parameters of one multi-thread negotiation session
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunParams {
    /// Step budget per negotiation thread
    pub nsteps: usize,
    /// Preserve thread order under sequential execution
    pub keep_order: bool,
    /// Give each negotiator its partner's utility function
    pub share_ufuns: bool,
    /// One offer per step instead of one full round
    pub atomic: bool,
    /// Execution method delegated to the mechanism service
    pub method: ExecutionMethod,
}

impl Default for RunParams {
    fn default() -> Self {
        Self {
            nsteps: 100,
            keep_order: false,
            share_ufuns: false,
            atomic: false,
            method: ExecutionMethod::Sequential,
        }
    }
}

impl RunParams {
    pub fn new(nsteps: usize) -> Self {
        Self {
            nsteps,
            ..Default::default()
        }
    }

    pub fn with_method(mut self, method: ExecutionMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_atomic(mut self, atomic: bool) -> Self {
        self.atomic = atomic;
        self
    }

    pub fn with_share_ufuns(mut self, share_ufuns: bool) -> Self {
        self.share_ufuns = share_ufuns;
        self
    }
}

/// Worker pool sizing for job dispatch
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Parallelism {
    /// Strictly sequential, in-process
    Serial,
    /// One worker per available core
    AllCores,
    /// Exactly this many workers
    Cores(usize),
    /// This fraction of the available cores
    Fraction(f64),
}

impl Parallelism {
    /// Worker count, `None` meaning serial dispatch
    pub fn workers(&self) -> Option<usize> {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        match *self {
            Parallelism::Serial => None,
            Parallelism::AllCores => Some(cores),
            Parallelism::Cores(n) => Some(n.max(1)),
            Parallelism::Fraction(f) => Some(((cores as f64 * f) + 0.5) as usize).map(|n| n.max(1)),
        }
    }
}

impl FromStr for Parallelism {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "serial" => Ok(Parallelism::Serial),
            "all" => Ok(Parallelism::AllCores),
            _ => {
                if let Ok(n) = s.parse::<usize>() {
                    return Ok(Parallelism::Cores(n));
                }
                if let Ok(f) = s.parse::<f64>() {
                    if f > 0.0 && f < 1.0 {
                        return Ok(Parallelism::Fraction(f));
                    }
                }
                Err(format!(
                    "expected 'serial', 'all', a worker count, or a core fraction, got '{s}'"
                ))
            }
        }
    }
}

/// Options controlling one tournament run
#[derive(Clone, Debug)]
pub struct TournamentOptions {
    /// Repetitions of the rotation cycle over all scenarios
    pub n_repetitions: usize,
    /// Root directory for per-session logs and results
    pub output: Option<PathBuf>,
    /// Skip execution entirely; used for cost estimation
    pub dry: bool,
    /// Score fill-in participants too (excluded by default)
    pub count_fill_ins: bool,
    /// Pool used for fill-ins; the competitor pool when empty
    pub non_competitors: Vec<Competitor>,
    pub parallelism: Parallelism,
    /// Scale for center utilities; the session edge count when `None`
    pub center_multiplier: Option<f64>,
    /// Scale for edge utilities
    pub edge_multiplier: f64,
    /// Seed of the explicit random source used for all shuffles
    pub seed: u64,
}

impl Default for TournamentOptions {
    fn default() -> Self {
        Self {
            n_repetitions: 1,
            output: None,
            dry: false,
            count_fill_ins: false,
            non_competitors: Vec::new(),
            parallelism: Parallelism::AllCores,
            center_multiplier: None,
            edge_multiplier: 1.0,
            seed: 42,
        }
    }
}

impl TournamentOptions {
    pub fn repetitions(n_repetitions: usize) -> Self {
        Self {
            n_repetitions,
            ..Default::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_parallelism(mut self, parallelism: Parallelism) -> Self {
        self.parallelism = parallelism;
        self
    }

    pub fn serial(mut self) -> Self {
        self.parallelism = Parallelism::Serial;
        self
    }

    pub fn with_output(mut self, output: PathBuf) -> Self {
        self.output = Some(output);
        self
    }

    pub fn with_non_competitors(mut self, non_competitors: Vec<Competitor>) -> Self {
        self.non_competitors = non_competitors;
        self
    }

    pub fn dry(mut self) -> Self {
        self.dry = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_params_defaults() {
        let params = RunParams::default();
        assert_eq!(params.nsteps, 100);
        assert!(!params.atomic);
        assert_eq!(params.method, ExecutionMethod::Sequential);
    }

    #[test]
    fn test_parallelism_parsing() {
        assert_eq!("serial".parse::<Parallelism>().unwrap(), Parallelism::Serial);
        assert_eq!("all".parse::<Parallelism>().unwrap(), Parallelism::AllCores);
        assert_eq!("3".parse::<Parallelism>().unwrap(), Parallelism::Cores(3));
        assert_eq!(
            "0.5".parse::<Parallelism>().unwrap(),
            Parallelism::Fraction(0.5)
        );
        assert!("fast".parse::<Parallelism>().is_err());
        assert!("1.5".parse::<Parallelism>().is_err());
    }

    #[test]
    fn test_parallelism_workers() {
        assert_eq!(Parallelism::Serial.workers(), None);
        assert_eq!(Parallelism::Cores(4).workers(), Some(4));
        assert_eq!(Parallelism::Cores(0).workers(), Some(1));
        assert!(Parallelism::AllCores.workers().unwrap() >= 1);
        assert!(Parallelism::Fraction(0.5).workers().unwrap() >= 1);
    }

    #[test]
    fn test_options_builders() {
        let opts = TournamentOptions::repetitions(3).with_seed(7).serial().dry();
        assert_eq!(opts.n_repetitions, 3);
        assert_eq!(opts.seed, 7);
        assert_eq!(opts.parallelism, Parallelism::Serial);
        assert!(opts.dry);
    }
}
