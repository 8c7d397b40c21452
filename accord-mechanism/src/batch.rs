//! Batch execution of negotiation sessions
//!
//! All threads of one multi-thread session are delegated here in a
//! single call. The caller selects among four execution modes; the
//! step budget and atomicity live inside each session.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::session::SaoSession;

/// How a batch of sessions is executed
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMethod {
    /// One session at a time, in shuffled order
    #[default]
    Sequential,
    /// One session at a time, preserving input order
    Ordered,
    /// One OS thread per session
    Threads,
    /// Accepted for compatibility; executed on threads in-process
    Processes,
}

/// Run every session of a batch to completion.
///
/// `keep_order` forces input order for the sequential method; `seed`
/// drives the order shuffle otherwise.
pub fn run_all(
    sessions: &mut [SaoSession],
    method: ExecutionMethod,
    keep_order: bool,
    seed: u64,
) -> anyhow::Result<()> {
    match method {
        ExecutionMethod::Sequential if !keep_order => {
            let mut order: Vec<usize> = (0..sessions.len()).collect();
            order.shuffle(&mut ChaCha8Rng::seed_from_u64(seed));
            for index in order {
                sessions[index].run()?;
            }
            Ok(())
        }
        ExecutionMethod::Sequential | ExecutionMethod::Ordered => {
            for session in sessions.iter_mut() {
                session.run()?;
            }
            Ok(())
        }
        ExecutionMethod::Threads | ExecutionMethod::Processes => {
            if method == ExecutionMethod::Processes {
                debug!("process execution is unavailable in-process; using threads");
            }
            let results: Vec<anyhow::Result<()>> = std::thread::scope(|scope| {
                let handles: Vec<_> = sessions
                    .iter_mut()
                    .map(|session| scope.spawn(move || session.run()))
                    .collect();
                handles
                    .into_iter()
                    .map(|handle| match handle.join() {
                        Ok(result) => result,
                        Err(_) => Err(anyhow::anyhow!("negotiation thread panicked")),
                    })
                    .collect()
            });
            for result in results {
                result?;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{party, Endpoint};
    use accord_core::{Negotiator, Outcome, Response, ThreadContext, ThreadState};

    /// Accepts the first offer on every thread
    struct Agreeable;

    impl Negotiator for Agreeable {
        fn attach(&mut self, _ctx: ThreadContext) {}

        fn propose(&mut self, thread: usize, _state: &ThreadState) -> Option<Outcome> {
            Some(vec![accord_core::Value::Int(thread as i64)])
        }

        fn respond(&mut self, _thread: usize, _state: &ThreadState, _offer: &Outcome) -> Response {
            Response::Accept
        }
    }

    fn batch(n: usize) -> Vec<SaoSession> {
        // one shared center across all threads, like a real session
        let center = party(Box::new(Agreeable));
        (0..n)
            .map(|i| {
                SaoSession::new(
                    format!("n{i}"),
                    Endpoint {
                        party: center.clone(),
                        thread: i,
                        id: format!("s{i}"),
                    },
                    Endpoint {
                        party: party(Box::new(Agreeable)),
                        thread: i,
                        id: format!("e{i}"),
                    },
                    10,
                    false,
                )
            })
            .collect()
    }

    #[test]
    fn test_all_methods_complete_every_session() {
        for method in [
            ExecutionMethod::Sequential,
            ExecutionMethod::Ordered,
            ExecutionMethod::Threads,
            ExecutionMethod::Processes,
        ] {
            let mut sessions = batch(4);
            run_all(&mut sessions, method, false, 42).unwrap();
            for (i, session) in sessions.iter().enumerate() {
                assert_eq!(
                    session.agreement(),
                    Some(&vec![accord_core::Value::Int(i as i64)]),
                    "{method:?} left session {i} unfinished"
                );
            }
        }
    }

    #[test]
    fn test_keep_order_is_deterministic() {
        let mut a = batch(3);
        let mut b = batch(3);
        run_all(&mut a, ExecutionMethod::Sequential, true, 1).unwrap();
        run_all(&mut b, ExecutionMethod::Sequential, true, 99).unwrap();
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.agreement(), y.agreement());
        }
    }
}
