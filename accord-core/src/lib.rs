//! ACCORD Core - outcome model and utility functions
//!
//! This crate provides the core model for multi-thread negotiation:
//! - Outcome spaces and value tuples
//! - The outcome-space composer (flatten/unflatten)
//! - The center utility family with side and flat views
//! - Scenarios and their serializable descriptors
//! - The negotiator plugin surface and the strategy registry

pub mod compose;
pub mod error;
pub mod negotiator;
pub mod outcome;
pub mod registry;
pub mod scenario;
pub mod ufun;

// Re-exports for convenient access
pub use compose::{
    flatten_outcome, flatten_spaces, unflatten_outcome, unflatten_spaces, NamingOptions,
};
pub use error::CoreError;
pub use negotiator::{
    Negotiator, RandomNegotiator, Response, ThreadContext, ThreadState, TimeConceder,
};
pub use outcome::{CartesianSpace, EnumeratedSpace, Issue, Outcome, OutcomeSpace, Value};
pub use registry::{NegotiatorFactory, ParamMap, Registry};
pub use scenario::{CenterUfunSpec, Scenario, ScenarioSpec, UfunSpec};
pub use ufun::{
    default_side_utilities, resolve_side_utilities, CenterCommon, CenterUtility, CombiningCenter,
    FlatCenter, FlatView, LambdaCenter, LambdaUtility, MaxCenter, MaxCombiner, MeanStdCenter,
    SideUtility, TableUtility, UtilityCombiner, UtilityFunction,
};
