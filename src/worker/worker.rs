//! The claim → execute → report loop.

use std::time::Duration;

use tracing::{debug, error, info};

use crate::sandbox::{ExecutionSandbox, Outcome};
use crate::worker::ApiClient;

/// Drives the proposal queue until the process is terminated.
///
/// One worker per deployment; the claim endpoint's atomicity is the only
/// thing standing between accidental extra workers and double execution.
pub struct Worker {
    client: ApiClient,
    job_check_interval: Duration,
    round: u64,
}

impl Worker {
    pub fn new(client: ApiClient, job_check_interval: Duration) -> Self {
        Self {
            client,
            job_check_interval,
            round: 0,
        }
    }

    /// Run rounds forever. Stopping is external (process termination).
    pub async fn work(mut self) {
        loop {
            self.work_round().await;
        }
    }

    /// One round: claim a proposal if available, execute it, report the
    /// outcome. Transport faults are logged and dropped; the round ends
    /// either way.
    pub async fn work_round(&mut self) {
        debug!(round = self.round, "Starting round");
        self.round += 1;

        let job = match self.client.claim_proposal().await {
            Ok(Some(job)) => job,
            Ok(None) => {
                debug!("No proposal to work on");
                self.sleep("no proposal to work on").await;
                return;
            }
            Err(e) => {
                error!(error = %e, "Failed to claim a proposal");
                self.sleep("claim failed").await;
                return;
            }
        };

        let proposal_id = job.id();
        info!(proposal_id, "Claimed proposal");

        // The poll interval doubles as the sandbox liveness cadence.
        let sandbox = ExecutionSandbox::new(self.job_check_interval);
        let outcome = sandbox.run(job.1, job.3, job.4, job.2).await;

        match outcome {
            Outcome::Finished(candidates) => {
                match self.client.mark_processed(proposal_id, &candidates).await {
                    Ok(_) => info!(proposal_id, "Proposal processed successfully"),
                    Err(e) => {
                        // No retry; the proposal stays CLAIMED.
                        error!(proposal_id, error = %e, "Failed to report success");
                    }
                }
            }
            Outcome::Fault(message) => {
                error!(proposal_id, error = %message, "Error processing proposal");
                if let Err(e) = self.client.mark_failed(proposal_id, &message).await {
                    error!(proposal_id, error = %e, "Failed to report failure");
                }
            }
        }
    }

    async fn sleep(&self, reason: &str) {
        debug!(
            seconds = self.job_check_interval.as_secs_f64(),
            reason, "Sleeping"
        );
        tokio::time::sleep(self.job_check_interval).await;
    }
}
