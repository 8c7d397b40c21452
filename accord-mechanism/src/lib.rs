//! ACCORD Mechanism - session execution engine
//!
//! This crate is the mechanism-execution collaborator of the tournament
//! core: it accepts a batch of independent two-party sessions, an
//! execution-method selector, a step budget, and an atomicity flag, and
//! returns each session's agreement plus a full event trace.

mod batch;
mod session;
mod trace;

pub use batch::{run_all, ExecutionMethod};
pub use session::{party, with_party, Endpoint, PartyHandle, SaoSession};
pub use trace::TraceRow;
