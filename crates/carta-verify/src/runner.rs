// SPDX-License-Identifier: MIT OR Apache-2.0
//! Parallel verification runner.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::info;

use carta_pool::WorkerPool;

use crate::checks::Checker;
use crate::{VerificationJob, VerificationResult};

/// Cooperative cancellation signal shared with a running verification.
///
/// Jobs still pending when the signal is raised are short-circuited into
/// `skip`; in-flight probes complete normally.
#[derive(Clone, Debug, Default)]
pub struct CancelSignal(Arc<AtomicBool>);

impl CancelSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Runs a verification plan through a worker pool.
pub struct VerificationRunner {
    pool: WorkerPool,
    checker: Checker,
    cancel: CancelSignal,
}

impl VerificationRunner {
    pub fn new(parallel_jobs: usize, cancel: CancelSignal) -> Self {
        Self {
            pool: WorkerPool::new(parallel_jobs),
            checker: Checker::new(),
            cancel,
        }
    }

    /// Execute all jobs, returning them with results populated.
    ///
    /// Every job leaves with `result != pending`: passed, failed, or skipped
    /// (pre-marked by the planner or short-circuited by cancellation).
    pub async fn run(&self, jobs: Vec<VerificationJob>) -> Vec<VerificationJob> {
        info!(target: "carta.verify", jobs = jobs.len(), "running verification jobs");
        let checker = self.checker.clone();
        let cancel = self.cancel.clone();
        self.pool
            .run(jobs, |mut job| {
                let checker = checker.clone();
                let cancel = cancel.clone();
                async move {
                    if cancel.cancelled() && job.result == VerificationResult::Pending {
                        job.result = VerificationResult::Skip;
                        return job;
                    }
                    checker.run_job(job).await
                }
            })
            .await
    }
}
