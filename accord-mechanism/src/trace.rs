//! Per-thread negotiation event traces

use accord_core::Outcome;
use serde::Serialize;

/// One trace row: a single action inside a negotiation thread
#[derive(Clone, Debug, Serialize)]
pub struct TraceRow {
    /// Seconds since the session started
    pub time: f64,
    /// Fraction of the step budget consumed when the action happened
    pub relative_time: f64,
    pub step: usize,
    /// Id of the acting negotiator
    pub negotiator: String,
    pub offer: Option<Outcome>,
    /// Partner response, as `"<partner-id>:<response>"`
    pub responses: String,
    /// Session state after the action
    pub state: String,
}
