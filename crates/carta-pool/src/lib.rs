// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
//! Bounded-concurrency fan-out for pipeline phases.
//!
//! Each phase (cache fetch, record processing, exporter fan-out,
//! verification) runs independent jobs through a [`WorkerPool`] of fixed
//! width. A width of 1 disables parallelism entirely, giving deterministic
//! sequential execution for debugging.

use futures::stream::{self, StreamExt};
use std::future::Future;

/// A fixed-width pool running independent async jobs.
///
/// Jobs may complete in any order; results are returned in submission order.
#[derive(Clone, Copy, Debug)]
pub struct WorkerPool {
    jobs: usize,
}

impl WorkerPool {
    /// Create a pool of the given width. A width of 0 is clamped to 1.
    pub fn new(jobs: usize) -> Self {
        Self {
            jobs: jobs.max(1),
        }
    }

    /// Pool width.
    pub fn jobs(&self) -> usize {
        self.jobs
    }

    /// Whether the pool runs jobs sequentially.
    pub fn sequential(&self) -> bool {
        self.jobs == 1
    }

    /// Run a job per item with bounded concurrency.
    ///
    /// Results come back in item order regardless of completion order.
    pub async fn run<I, T, F, Fut, R>(&self, items: I, job: F) -> Vec<R>
    where
        I: IntoIterator<Item = T>,
        F: Fn(T) -> Fut,
        Fut: Future<Output = R>,
    {
        stream::iter(items.into_iter().map(|item| job(item)))
            .buffered(self.jobs)
            .collect()
            .await
    }

    /// As [`WorkerPool::run`], collecting the first error.
    pub async fn try_run<I, T, F, Fut, R, E>(&self, items: I, job: F) -> Result<Vec<R>, E>
    where
        I: IntoIterator<Item = T>,
        F: Fn(T) -> Fut,
        Fut: Future<Output = Result<R, E>>,
    {
        let results: Vec<Result<R, E>> = self.run(items, job).await;
        results.into_iter().collect()
    }
}
