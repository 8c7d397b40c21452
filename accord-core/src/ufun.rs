//! Utility functions - the center family and its per-thread views
//!
//! A center utility scores a whole tuple of per-thread agreements; an
//! edge or side utility scores a single thread. Side utilities of a
//! center are either owned by the variant (combining, injected) or
//! derived generically by evaluating the center on a one-hot tuple.

use std::sync::{Arc, OnceLock};

use rustc_hash::FxHashMap;
use tracing::warn;

use crate::compose::{flatten_spaces, unflatten_outcome, NamingOptions};
use crate::error::CoreError;
use crate::outcome::{CartesianSpace, Outcome, OutcomeSpace, Value};

/// Utility function over a single negotiation thread
pub trait UtilityFunction: Send + Sync {
    /// Evaluate an offer; `None` means no agreement was reached
    fn eval(&self, offer: Option<&Outcome>) -> f64;

    /// Utility of walking away without agreement
    fn reserved_value(&self) -> f64 {
        0.0
    }

    /// Outcome space this function is defined over, if known
    fn outcome_space(&self) -> Option<&OutcomeSpace> {
        None
    }
}

/// Utility function backed by an explicit outcome-to-value table.
///
/// Outcomes outside the table evaluate to NaN, the "undefined" state.
pub struct TableUtility {
    space: OutcomeSpace,
    table: FxHashMap<Outcome, f64>,
    reserved: f64,
}

impl TableUtility {
    pub fn new(space: OutcomeSpace, entries: impl IntoIterator<Item = (Outcome, f64)>) -> Self {
        Self {
            space,
            table: entries.into_iter().collect(),
            reserved: 0.0,
        }
    }

    pub fn with_reserved(mut self, reserved: f64) -> Self {
        self.reserved = reserved;
        self
    }
}

impl UtilityFunction for TableUtility {
    fn eval(&self, offer: Option<&Outcome>) -> f64 {
        match offer {
            None => self.reserved,
            Some(outcome) => self.table.get(outcome).copied().unwrap_or(f64::NAN),
        }
    }

    fn reserved_value(&self) -> f64 {
        self.reserved
    }

    fn outcome_space(&self) -> Option<&OutcomeSpace> {
        Some(&self.space)
    }
}

/// Utility function implementing an arbitrary mapping
pub struct LambdaUtility {
    evaluator: Box<dyn Fn(Option<&Outcome>) -> f64 + Send + Sync>,
    space: Option<OutcomeSpace>,
    reserved: f64,
}

impl LambdaUtility {
    pub fn new(evaluator: impl Fn(Option<&Outcome>) -> f64 + Send + Sync + 'static) -> Self {
        Self {
            evaluator: Box::new(evaluator),
            space: None,
            reserved: 0.0,
        }
    }

    pub fn with_space(mut self, space: OutcomeSpace) -> Self {
        self.space = Some(space);
        self
    }

    pub fn with_reserved(mut self, reserved: f64) -> Self {
        self.reserved = reserved;
        self
    }
}

impl UtilityFunction for LambdaUtility {
    fn eval(&self, offer: Option<&Outcome>) -> f64 {
        (self.evaluator)(offer)
    }

    fn reserved_value(&self) -> f64 {
        self.reserved
    }

    fn outcome_space(&self) -> Option<&OutcomeSpace> {
        self.space.as_ref()
    }
}

/// Flattened composite view of a center's outcome spaces
#[derive(Clone, Debug)]
pub struct FlatView {
    pub space: CartesianSpace,
    /// Issues contributed by each thread, in thread order
    pub issue_counts: Vec<usize>,
}

/// State shared by every center-utility variant: the child outcome
/// spaces, the reserved value, and the lazily computed composite view.
pub struct CenterCommon {
    outcome_spaces: Vec<OutcomeSpace>,
    reserved_value: f64,
    flat: OnceLock<Option<FlatView>>,
}

impl CenterCommon {
    pub fn new(outcome_spaces: Vec<OutcomeSpace>, reserved_value: f64) -> Self {
        Self {
            outcome_spaces,
            reserved_value,
            flat: OnceLock::new(),
        }
    }

    pub fn outcome_spaces(&self) -> &[OutcomeSpace] {
        &self.outcome_spaces
    }

    pub fn reserved_value(&self) -> f64 {
        self.reserved_value
    }

    /// Flattened product of the child spaces. Computed on first use;
    /// a composition failure is logged and leaves the view absent.
    pub fn composite(&self) -> Option<&FlatView> {
        self.flat
            .get_or_init(
                || match flatten_spaces(&self.outcome_spaces, NamingOptions::full()) {
                    Ok((space, issue_counts)) => Some(FlatView {
                        space,
                        issue_counts,
                    }),
                    Err(err) => {
                        warn!("no composite outcome space: {err}");
                        None
                    }
                },
            )
            .as_ref()
    }
}

/// Center utility function: scores a length-`n_edges` tuple of
/// per-thread agreements, `None` marking a thread without one.
pub trait CenterUtility: Send + Sync {
    /// Evaluate one offer per thread. Order is significant and stable.
    fn evaluate(&self, offer: &[Option<Outcome>]) -> f64;

    /// The child outcome spaces, one per thread
    fn outcome_spaces(&self) -> &[OutcomeSpace];

    fn reserved_value(&self) -> f64 {
        0.0
    }

    fn n_edges(&self) -> usize {
        self.outcome_spaces().len()
    }

    /// Flattened composite outcome space, when the child spaces compose
    fn composite(&self) -> Option<&FlatView> {
        None
    }

    /// Per-thread utilities owned by this variant.
    ///
    /// `None` selects the generic one-hot derivation
    /// (`default_side_utilities`).
    fn side_utilities(&self, _n_edges: usize) -> Option<Vec<Arc<dyn UtilityFunction>>> {
        None
    }
}

/// Side utility of thread `index`: the center evaluated on a tuple with
/// the offer at `index` and no agreement anywhere else.
pub struct SideUtility {
    center: Arc<dyn CenterUtility>,
    index: usize,
    n_edges: usize,
}

impl SideUtility {
    pub fn new(center: Arc<dyn CenterUtility>, index: usize, n_edges: usize) -> Self {
        Self {
            center,
            index,
            n_edges,
        }
    }
}

impl UtilityFunction for SideUtility {
    fn eval(&self, offer: Option<&Outcome>) -> f64 {
        let mut offers: Vec<Option<Outcome>> = vec![None; self.n_edges];
        offers[self.index] = offer.cloned();
        self.center.evaluate(&offers)
    }

    fn reserved_value(&self) -> f64 {
        self.center.reserved_value()
    }

    fn outcome_space(&self) -> Option<&OutcomeSpace> {
        self.center.outcome_spaces().get(self.index)
    }
}

/// Default side-utility derivation for variants that own no per-thread
/// functions: one `SideUtility` view per thread.
pub fn default_side_utilities(center: &Arc<dyn CenterUtility>) -> Vec<Arc<dyn UtilityFunction>> {
    let n_edges = center.n_edges();
    (0..n_edges)
        .map(|i| Arc::new(SideUtility::new(center.clone(), i, n_edges)) as Arc<dyn UtilityFunction>)
        .collect()
}

/// The side utilities a center actually exposes: the variant's own when
/// it has them, the generic derivation otherwise.
pub fn resolve_side_utilities(center: &Arc<dyn CenterUtility>) -> Vec<Arc<dyn UtilityFunction>> {
    center
        .side_utilities(center.n_edges())
        .unwrap_or_else(|| default_side_utilities(center))
}

/// Reduces per-thread utilities into a single center value
pub trait UtilityCombiner: Send + Sync {
    fn combine(&self, values: &[f64]) -> f64;
}

/// Center utility with one utility function per thread; the center
/// value is a reduction of the per-thread values.
pub struct CombiningCenter<C: UtilityCombiner> {
    common: CenterCommon,
    ufuns: Vec<Arc<dyn UtilityFunction>>,
    combiner: C,
}

impl<C: UtilityCombiner> std::fmt::Debug for CombiningCenter<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CombiningCenter")
            .field("n_threads", &self.ufuns.len())
            .finish_non_exhaustive()
    }
}

impl<C: UtilityCombiner> CombiningCenter<C> {
    pub fn new(
        combiner: C,
        ufuns: Vec<Arc<dyn UtilityFunction>>,
        outcome_spaces: Vec<OutcomeSpace>,
        reserved_value: f64,
    ) -> Result<Self, CoreError> {
        if ufuns.len() != outcome_spaces.len() {
            return Err(CoreError::TypeMismatch(format!(
                "{} thread utilities for {} outcome spaces",
                ufuns.len(),
                outcome_spaces.len()
            )));
        }
        Ok(Self {
            common: CenterCommon::new(outcome_spaces, reserved_value),
            ufuns,
            combiner,
        })
    }
}

impl<C: UtilityCombiner> CenterUtility for CombiningCenter<C> {
    fn evaluate(&self, offer: &[Option<Outcome>]) -> f64 {
        if offer.is_empty() {
            return self.common.reserved_value();
        }
        // absent slots are passed through: each thread utility decides
        // what no agreement is worth on its own thread
        let values: Vec<f64> = self
            .ufuns
            .iter()
            .zip(offer)
            .map(|(ufun, slot)| ufun.eval(slot.as_ref()))
            .collect();
        self.combiner.combine(&values)
    }

    fn outcome_spaces(&self) -> &[OutcomeSpace] {
        self.common.outcome_spaces()
    }

    fn reserved_value(&self) -> f64 {
        self.common.reserved_value()
    }

    fn composite(&self) -> Option<&FlatView> {
        self.common.composite()
    }

    fn side_utilities(&self, n_edges: usize) -> Option<Vec<Arc<dyn UtilityFunction>>> {
        assert_eq!(
            n_edges,
            self.ufuns.len(),
            "initialized with {} thread utilities but asked for {}",
            self.ufuns.len(),
            n_edges
        );
        Some(self.ufuns.clone())
    }
}

/// Combiner taking the best utility achieved in any thread
pub struct MaxCombiner;

impl UtilityCombiner for MaxCombiner {
    fn combine(&self, values: &[f64]) -> f64 {
        values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }
}

/// The max center utility: the maximum of the per-thread side utilities
pub type MaxCenter = CombiningCenter<MaxCombiner>;

impl CombiningCenter<MaxCombiner> {
    pub fn max(
        ufuns: Vec<Arc<dyn UtilityFunction>>,
        outcome_spaces: Vec<OutcomeSpace>,
        reserved_value: f64,
    ) -> Result<Self, CoreError> {
        Self::new(MaxCombiner, ufuns, outcome_spaces, reserved_value)
    }
}

/// Numeric reading of a value under the tagged-string convention:
/// integers count as themselves, strings drop one leading category tag
/// character, anything unparsable counts as zero.
fn tagged_numeric(value: &Value) -> f64 {
    match value {
        Value::Int(i) => *i as f64,
        Value::Str(s) => s
            .get(1..)
            .and_then(|rest| rest.parse::<f64>().ok())
            .unwrap_or(0.0),
    }
}

/// Center utility scoring agreement spread: for every issue position the
/// mean plus standard deviation of the per-thread numeric values, summed
/// over positions and divided by the thread count.
///
/// Single-agreement style: it owns no per-thread utilities, so its side
/// utilities come from the generic derivation.
pub struct MeanStdCenter {
    common: CenterCommon,
}

impl MeanStdCenter {
    pub fn new(outcome_spaces: Vec<OutcomeSpace>) -> Self {
        Self {
            common: CenterCommon::new(outcome_spaces, 0.0),
        }
    }
}

impl CenterUtility for MeanStdCenter {
    fn evaluate(&self, offer: &[Option<Outcome>]) -> f64 {
        if offer.is_empty() {
            return 0.0;
        }
        let n_edges = offer.len();
        if offer.iter().filter(|slot| slot.is_some()).count() < 2 {
            return 0.1;
        }
        let n_positions = offer
            .iter()
            .filter_map(|slot| slot.as_ref().map(Vec::len))
            .max()
            .unwrap_or(0);
        let mut total = 0.0;
        for position in 0..n_positions {
            let values: Vec<f64> = offer
                .iter()
                .map(|slot| {
                    slot.as_ref()
                        .and_then(|outcome| outcome.get(position))
                        .map(tagged_numeric)
                        .unwrap_or(0.0)
                })
                .collect();
            let mean = values.iter().sum::<f64>() / n_edges as f64;
            let variance =
                values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n_edges as f64;
            total += mean + variance.sqrt();
        }
        total / n_edges as f64
    }

    fn outcome_spaces(&self) -> &[OutcomeSpace] {
        self.common.outcome_spaces()
    }

    fn composite(&self) -> Option<&FlatView> {
        self.common.composite()
    }
}

/// Center utility delegating to an injected evaluator, optionally with
/// injected per-thread side utilities for scoring that a projection
/// cannot recover.
pub struct LambdaCenter {
    common: CenterCommon,
    evaluator: Box<dyn Fn(&[Option<Outcome>]) -> f64 + Send + Sync>,
    sides: Option<Vec<Arc<dyn UtilityFunction>>>,
}

impl LambdaCenter {
    pub fn new(
        outcome_spaces: Vec<OutcomeSpace>,
        evaluator: impl Fn(&[Option<Outcome>]) -> f64 + Send + Sync + 'static,
    ) -> Self {
        Self {
            common: CenterCommon::new(outcome_spaces, 0.0),
            evaluator: Box::new(evaluator),
            sides: None,
        }
    }

    pub fn with_reserved(mut self, reserved_value: f64) -> Self {
        self.common.reserved_value = reserved_value;
        self
    }

    /// Expose injected side utilities instead of the generic derivation
    pub fn with_sides(mut self, sides: Vec<Arc<dyn UtilityFunction>>) -> Self {
        self.sides = Some(sides);
        self
    }
}

impl CenterUtility for LambdaCenter {
    fn evaluate(&self, offer: &[Option<Outcome>]) -> f64 {
        (self.evaluator)(offer)
    }

    fn outcome_spaces(&self) -> &[OutcomeSpace] {
        self.common.outcome_spaces()
    }

    fn reserved_value(&self) -> f64 {
        self.common.reserved_value()
    }

    fn composite(&self) -> Option<&FlatView> {
        self.common.composite()
    }

    fn side_utilities(&self, _n_edges: usize) -> Option<Vec<Arc<dyn UtilityFunction>>> {
        self.sides.clone()
    }
}

/// Flattened wrapper of a center utility: takes one concatenated outcome
/// instead of a tuple of per-thread outcomes.
pub struct FlatCenter {
    center: Arc<dyn CenterUtility>,
    issue_counts: Vec<usize>,
}

impl FlatCenter {
    /// Fails when the center has no composite view to flatten against.
    pub fn new(center: Arc<dyn CenterUtility>) -> Result<Self, CoreError> {
        let issue_counts = center
            .composite()
            .ok_or_else(|| CoreError::Composition("center has no composite view".to_string()))?
            .issue_counts
            .clone();
        Ok(Self {
            center,
            issue_counts,
        })
    }
}

impl UtilityFunction for FlatCenter {
    fn eval(&self, offer: Option<&Outcome>) -> f64 {
        let Some(outcome) = offer else {
            return self.center.reserved_value();
        };
        match unflatten_outcome(outcome, &self.issue_counts) {
            Ok(parts) => {
                let offers: Vec<Option<Outcome>> = parts.into_iter().map(Some).collect();
                self.center.evaluate(&offers)
            }
            Err(_) => f64::NAN,
        }
    }

    fn reserved_value(&self) -> f64 {
        self.center.reserved_value()
    }
}
