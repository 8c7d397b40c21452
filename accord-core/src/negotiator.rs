//! Negotiation strategies - the competitor plugin surface
//!
//! A `Negotiator` participates in one or more threads of a scenario:
//! the center attaches one context per thread, an edge exactly one.
//! The mechanism service drives it through propose/respond plus the
//! start/end lifecycle; the scheduler never inspects strategy logic.

use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rustc_hash::FxHashMap;

use crate::outcome::Outcome;
use crate::ufun::UtilityFunction;

/// Response to an incoming offer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Response {
    Accept,
    Reject,
    /// Terminate the thread without agreement
    End,
}

impl Response {
    pub fn as_str(&self) -> &'static str {
        match self {
            Response::Accept => "accept",
            Response::Reject => "reject",
            Response::End => "end",
        }
    }
}

/// Observable state of one negotiation thread
#[derive(Clone, Debug, Default)]
pub struct ThreadState {
    pub step: usize,
    /// Fraction of the step budget consumed, in [0, 1]
    pub relative_time: f64,
    pub current_offer: Option<Outcome>,
    pub agreement: Option<Outcome>,
    pub running: bool,
}

/// Everything a participant knows about one of its threads
#[derive(Clone)]
pub struct ThreadContext {
    /// Thread index within the scenario
    pub index: usize,
    /// Whether the participant negotiates this thread as the center
    pub is_center: bool,
    /// Own scoring function for the thread
    pub ufun: Arc<dyn UtilityFunction>,
    /// Partner's scoring function, present only when sharing is enabled
    pub opponent_ufun: Option<Arc<dyn UtilityFunction>>,
    /// Identifier of the partner on this thread
    pub partner_id: String,
    /// Seed for strategy-local randomness
    pub seed: u64,
}

/// A competitor: proposes and responds on every thread it plays
pub trait Negotiator: Send {
    /// Called once per thread before `init`
    fn attach(&mut self, ctx: ThreadContext);

    /// Called after all threads are attached
    fn init(&mut self) {}

    fn on_negotiation_start(&mut self, _thread: usize, _state: &ThreadState) {}

    fn on_negotiation_end(&mut self, _thread: usize, _state: &ThreadState) {}

    /// Produce an offer for the given thread; `None` ends the thread
    fn propose(&mut self, thread: usize, state: &ThreadState) -> Option<Outcome>;

    /// React to the partner's offer on the given thread
    fn respond(&mut self, thread: usize, state: &ThreadState, offer: &Outcome) -> Response;
}

impl std::fmt::Debug for dyn Negotiator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn Negotiator")
    }
}

/// Per-thread data of a time-based conceder
struct ConcederThread {
    /// Outcomes ranked best-first by own utility
    ranked: Vec<(Outcome, f64)>,
    reserved: f64,
}

impl ConcederThread {
    fn new(ctx: &ThreadContext) -> Self {
        let mut ranked: Vec<(Outcome, f64)> = ctx
            .ufun
            .outcome_space()
            .map(|space| {
                space
                    .outcomes()
                    .into_iter()
                    .map(|o| {
                        let u = ctx.ufun.eval(Some(&o));
                        (o, u)
                    })
                    .filter(|(_, u)| !u.is_nan())
                    .collect()
            })
            .unwrap_or_default();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        Self {
            ranked,
            reserved: ctx.ufun.reserved_value(),
        }
    }

    /// Aspiration level at relative time `t` for concession exponent `e`
    fn target(&self, t: f64, exponent: f64) -> f64 {
        let (best, worst) = match (self.ranked.first(), self.ranked.last()) {
            (Some(b), Some(w)) => (b.1, w.1),
            _ => return self.reserved,
        };
        let floor = worst.max(self.reserved);
        best - (best - floor) * t.clamp(0.0, 1.0).powf(exponent)
    }
}

/// Time-based conceder: opens at its best outcome and concedes along a
/// `t^e` aspiration curve, accepting any offer at or above the level.
pub struct TimeConceder {
    exponent: f64,
    threads: FxHashMap<usize, ConcederThread>,
}

impl TimeConceder {
    pub fn with_exponent(exponent: f64) -> Self {
        Self {
            exponent,
            threads: FxHashMap::default(),
        }
    }

    /// Concede late (hardheaded)
    pub fn boulware() -> Self {
        Self::with_exponent(4.0)
    }

    /// Concede proportionally to time
    pub fn linear() -> Self {
        Self::with_exponent(1.0)
    }

    /// Concede early
    pub fn conceder() -> Self {
        Self::with_exponent(0.25)
    }
}

impl Negotiator for TimeConceder {
    fn attach(&mut self, ctx: ThreadContext) {
        self.threads.insert(ctx.index, ConcederThread::new(&ctx));
    }

    fn propose(&mut self, thread: usize, state: &ThreadState) -> Option<Outcome> {
        let data = self.threads.get(&thread)?;
        let target = data.target(state.relative_time, self.exponent);
        // best outcome still at or above the aspiration level
        data.ranked
            .iter()
            .take_while(|(_, u)| *u >= target)
            .last()
            .or_else(|| data.ranked.first())
            .map(|(o, _)| o.clone())
    }

    fn respond(&mut self, thread: usize, state: &ThreadState, offer: &Outcome) -> Response {
        let Some(data) = self.threads.get(&thread) else {
            return Response::End;
        };
        let utility = data
            .ranked
            .iter()
            .find(|(o, _)| o == offer)
            .map(|(_, u)| *u)
            .unwrap_or(f64::NAN);
        let target = data.target(state.relative_time, self.exponent);
        if utility >= target.max(data.reserved) {
            Response::Accept
        } else {
            Response::Reject
        }
    }
}

/// Randomly proposing and responding strategy, seeded per thread
pub struct RandomNegotiator {
    p_end: f64,
    p_reject: f64,
    threads: FxHashMap<usize, (ThreadContext, ChaCha8Rng)>,
}

impl RandomNegotiator {
    pub fn new(p_end: f64, p_reject: f64) -> Self {
        Self {
            p_end,
            p_reject,
            threads: FxHashMap::default(),
        }
    }
}

impl Default for RandomNegotiator {
    fn default() -> Self {
        Self::new(0.0005, 0.9)
    }
}

impl Negotiator for RandomNegotiator {
    fn attach(&mut self, ctx: ThreadContext) {
        let rng = ChaCha8Rng::seed_from_u64(ctx.seed);
        self.threads.insert(ctx.index, (ctx, rng));
    }

    fn propose(&mut self, thread: usize, _state: &ThreadState) -> Option<Outcome> {
        let (ctx, rng) = self.threads.get_mut(&thread)?;
        ctx.ufun.outcome_space().and_then(|space| space.sample(rng))
    }

    fn respond(&mut self, thread: usize, _state: &ThreadState, offer: &Outcome) -> Response {
        let Some((ctx, rng)) = self.threads.get_mut(&thread) else {
            return Response::End;
        };
        if rng.gen::<f64>() < self.p_end {
            return Response::End;
        }
        let utility = ctx.ufun.eval(Some(offer));
        if rng.gen::<f64>() < self.p_reject || !(utility >= ctx.ufun.reserved_value()) {
            return Response::Reject;
        }
        Response::Accept
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::{Issue, OutcomeSpace};
    use crate::ufun::TableUtility;

    fn graded_ctx(index: usize, seed: u64) -> ThreadContext {
        let space = OutcomeSpace::cartesian(
            "t",
            vec![Issue::new(
                "level",
                vec!["low".into(), "mid".into(), "high".into()],
            )],
        );
        let ufun = Arc::new(
            TableUtility::new(
                space,
                vec![
                    (vec!["low".into()], 0.2),
                    (vec!["mid".into()], 0.5),
                    (vec!["high".into()], 1.0),
                ],
            )
            .with_reserved(0.1),
        );
        ThreadContext {
            index,
            is_center: false,
            ufun,
            opponent_ufun: None,
            partner_id: "p".to_string(),
            seed,
        }
    }

    #[test]
    fn test_conceder_opens_with_best_outcome() {
        let mut agent = TimeConceder::boulware();
        agent.attach(graded_ctx(0, 1));
        let state = ThreadState {
            running: true,
            ..Default::default()
        };
        assert_eq!(agent.propose(0, &state), Some(vec!["high".into()]));
    }

    #[test]
    fn test_conceder_concedes_over_time() {
        let mut agent = TimeConceder::linear();
        agent.attach(graded_ctx(0, 1));
        let late = ThreadState {
            relative_time: 0.99,
            running: true,
            ..Default::default()
        };
        // near the deadline the aspiration is close to the floor
        let offer = agent.propose(0, &late).unwrap();
        assert_eq!(offer, vec!["low".into()]);
    }

    #[test]
    fn test_conceder_accepts_above_aspiration() {
        let mut agent = TimeConceder::linear();
        agent.attach(graded_ctx(0, 1));
        let early = ThreadState {
            running: true,
            ..Default::default()
        };
        assert_eq!(
            agent.respond(0, &early, &vec!["high".into()]),
            Response::Accept
        );
        assert_eq!(
            agent.respond(0, &early, &vec!["low".into()]),
            Response::Reject
        );
    }

    #[test]
    fn test_random_negotiator_is_seed_deterministic() {
        let run = |seed: u64| {
            let mut agent = RandomNegotiator::default();
            agent.attach(graded_ctx(0, seed));
            let state = ThreadState::default();
            (0..10)
                .map(|_| agent.propose(0, &state).unwrap())
                .collect::<Vec<_>>()
        };
        assert_eq!(run(7), run(7));
        assert_ne!(run(7), run(8));
    }
}
