//! Two-party alternating-offers session
//!
//! One session drives a single negotiation thread: the two endpoints
//! take turns proposing, the partner responds, and the session ends on
//! acceptance, on an explicit end, or when the step budget runs out.
//! With `atomic` stepping every single offer consumes one step of the
//! budget; otherwise a full round (both endpoints acting once) does.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use accord_core::{Negotiator, Outcome, Response, ThreadState};
use anyhow::anyhow;

use crate::trace::TraceRow;

/// Shared handle to a participant taking part in one or more sessions
pub type PartyHandle = Arc<Mutex<Box<dyn Negotiator>>>;

/// Wrap a negotiator for session use
pub fn party(negotiator: Box<dyn Negotiator>) -> PartyHandle {
    Arc::new(Mutex::new(negotiator))
}

/// Run a closure against a locked participant.
pub fn with_party<T>(
    party: &PartyHandle,
    f: impl FnOnce(&mut dyn Negotiator) -> T,
) -> anyhow::Result<T> {
    let mut guard = party
        .lock()
        .map_err(|_| anyhow!("negotiator state poisoned"))?;
    Ok(f(guard.as_mut()))
}

/// One endpoint of a session: a participant acting on a specific thread
#[derive(Clone)]
pub struct Endpoint {
    pub party: PartyHandle,
    /// Thread index the participant knows this session by
    pub thread: usize,
    /// Stable id used in traces
    pub id: String,
}

/// A single two-party session over one negotiation thread
pub struct SaoSession {
    name: String,
    first: Endpoint,
    second: Endpoint,
    nsteps: usize,
    atomic: bool,
    state: ThreadState,
    done: bool,
    trace: Vec<TraceRow>,
}

impl SaoSession {
    pub fn new(
        name: impl Into<String>,
        first: Endpoint,
        second: Endpoint,
        nsteps: usize,
        atomic: bool,
    ) -> Self {
        Self {
            name: name.into(),
            first,
            second,
            nsteps,
            atomic,
            state: ThreadState::default(),
            done: false,
            trace: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> &ThreadState {
        &self.state
    }

    pub fn agreement(&self) -> Option<&Outcome> {
        self.state.agreement.as_ref()
    }

    pub fn trace(&self) -> &[TraceRow] {
        &self.trace
    }

    /// Run the session to completion.
    pub fn run(&mut self) -> anyhow::Result<()> {
        let started = Instant::now();
        self.state.running = true;
        self.notify(true)?;
        while !self.done && self.state.agreement.is_none() && self.state.step < self.nsteps {
            self.round(&started)?;
        }
        self.state.running = false;
        self.notify(false)?;
        Ok(())
    }

    fn notify(&mut self, starting: bool) -> anyhow::Result<()> {
        let snapshot = self.state.clone();
        for endpoint in [self.first.clone(), self.second.clone()] {
            with_party(&endpoint.party, |p| {
                if starting {
                    p.on_negotiation_start(endpoint.thread, &snapshot);
                } else {
                    p.on_negotiation_end(endpoint.thread, &snapshot);
                }
            })?;
        }
        Ok(())
    }

    fn round(&mut self, started: &Instant) -> anyhow::Result<()> {
        for side in 0..2 {
            if self.done || self.state.agreement.is_some() {
                return Ok(());
            }
            if self.atomic && self.state.step >= self.nsteps {
                return Ok(());
            }
            self.exchange(side, started)?;
            if self.atomic {
                self.advance_step();
            }
        }
        if !self.atomic {
            self.advance_step();
        }
        Ok(())
    }

    fn advance_step(&mut self) {
        self.state.step += 1;
        self.state.relative_time = self.state.step as f64 / self.nsteps.max(1) as f64;
    }

    /// One proposal plus the partner's response
    fn exchange(&mut self, side: usize, started: &Instant) -> anyhow::Result<()> {
        let (proposer, responder) = if side == 0 {
            (self.first.clone(), self.second.clone())
        } else {
            (self.second.clone(), self.first.clone())
        };

        let snapshot = self.state.clone();
        let offer = with_party(&proposer.party, |p| p.propose(proposer.thread, &snapshot))?;
        let Some(offer) = offer else {
            // declining to propose ends the thread without agreement
            self.done = true;
            self.push_row(started, &proposer.id, None, String::new(), "ended");
            return Ok(());
        };

        self.state.current_offer = Some(offer.clone());
        let snapshot = self.state.clone();
        let response = with_party(&responder.party, |p| {
            p.respond(responder.thread, &snapshot, &offer)
        })?;
        match response {
            Response::Accept => self.state.agreement = Some(offer.clone()),
            Response::End => self.done = true,
            Response::Reject => {}
        }

        let label = if self.state.agreement.is_some() {
            "agreement"
        } else if self.done {
            "ended"
        } else {
            "running"
        };
        self.push_row(
            started,
            &proposer.id,
            Some(offer),
            format!("{}:{}", responder.id, response.as_str()),
            label,
        );
        Ok(())
    }

    fn push_row(
        &mut self,
        started: &Instant,
        negotiator: &str,
        offer: Option<Outcome>,
        responses: String,
        state: &str,
    ) {
        self.trace.push(TraceRow {
            time: started.elapsed().as_secs_f64(),
            relative_time: self.state.relative_time,
            step: self.state.step,
            negotiator: negotiator.to_string(),
            offer,
            responses,
            state: state.to_string(),
        });
    }
}
