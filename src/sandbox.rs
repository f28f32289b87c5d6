//! Isolated strategy execution.
//!
//! One strategy invocation runs on a dedicated OS thread with panic
//! containment, and reports back over a one-shot channel. The
//! coordinator polls that channel on a fixed interval as a liveness
//! check; it never force-kills a long-running strategy, so a hung
//! strategy leaves its proposal claimed but cannot block or corrupt the
//! coordinator.

use std::time::Duration;

use tokio::sync::oneshot;
use tracing::debug;

use crate::domain::{Candidates, Experiments, StrategySpec};
use crate::strategies;

/// Outcome of a sandboxed strategy run.
///
/// Faults are data, not errors: the caller decides how to report them.
#[derive(Debug)]
pub enum Outcome {
    Finished(Candidates),
    Fault(String),
}

pub struct ExecutionSandbox {
    poll_interval: Duration,
}

impl ExecutionSandbox {
    /// `poll_interval` bounds each wait on the result channel. It is a
    /// liveness-check cadence, not an overall deadline.
    pub fn new(poll_interval: Duration) -> Self {
        Self { poll_interval }
    }

    /// Run one strategy invocation to completion in isolation.
    ///
    /// The worker thread sends exactly one message; every failure inside
    /// it, panics included, arrives here as an [`Outcome::Fault`].
    pub async fn run(
        &self,
        spec: StrategySpec,
        experiments: Option<Experiments>,
        pendings: Option<Candidates>,
        n_candidates: usize,
    ) -> Outcome {
        let (tx, mut rx) = oneshot::channel();

        std::thread::spawn(move || {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                strategies::propose(&spec, experiments.as_ref(), pendings.as_ref(), n_candidates)
            }));
            let outcome = match result {
                Ok(Ok(candidates)) => Outcome::Finished(candidates),
                Ok(Err(fault)) => Outcome::Fault(fault.to_string()),
                Err(panic) => Outcome::Fault(panic_message(panic)),
            };
            // Receiver may have gone away; nothing left to do then.
            let _ = tx.send(outcome);
        });

        loop {
            match tokio::time::timeout(self.poll_interval, &mut rx).await {
                Ok(Ok(outcome)) => return outcome,
                Ok(Err(_)) => {
                    return Outcome::Fault(
                        "strategy execution ended without sending a result".to_string(),
                    );
                }
                Err(_) => {
                    debug!("Strategy still running, polling again");
                }
            }
        }
    }
}

/// Best-effort extraction of a panic payload message.
fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        format!("strategy panicked: {msg}")
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        format!("strategy panicked: {msg}")
    } else {
        "strategy panicked".to_string()
    }
}
