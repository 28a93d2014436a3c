//! Concurrency-bounded batch processing.

use async_lock::Semaphore;
use futures_timer::Delay;
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::time::Duration;

use crate::retry::{RetryHandler, RetryPolicy};

/// Batch fan-out configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchPolicy {
    /// Items per batch.
    pub batch_size: usize,
    /// Concurrent processor calls within a batch.
    pub max_concurrent: usize,
    /// Pause between batches (not between items within a batch).
    pub batch_delay: Duration,
}

impl Default for BatchPolicy {
    fn default() -> Self {
        Self {
            batch_size: 10,
            max_concurrent: 3,
            batch_delay: Duration::from_secs(1),
        }
    }
}

/// Fans a list of work items out in fixed-size batches.
///
/// Each item's outcome is captured individually — one failure never aborts
/// siblings or later batches — and the output preserves input order
/// regardless of completion order.
pub struct BatchProcessor {
    policy: BatchPolicy,
}

impl BatchProcessor {
    pub fn new(policy: BatchPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &BatchPolicy {
        &self.policy
    }

    /// Process `items` in batches, calling `progress(completed, total)` once
    /// per finished batch.
    ///
    /// Within a batch, up to `max_concurrent` processor calls run at once
    /// under a semaphore. The permit guard is RAII, so cancellation at any
    /// suspension point releases it and cannot starve later batches.
    /// `result[i]` holds `processor(items[i])`'s value or error.
    pub async fn process_batches<T, U, E, F, Fut, P>(
        &self,
        items: Vec<T>,
        processor: F,
        mut progress: P,
    ) -> Vec<Result<U, E>>
    where
        F: Fn(T) -> Fut,
        Fut: Future<Output = Result<U, E>>,
        P: FnMut(usize, usize),
    {
        let total = items.len();
        let mut results = Vec::with_capacity(total);
        let semaphore = Semaphore::new(self.policy.max_concurrent);
        let semaphore = &semaphore;
        let processor = &processor;

        let mut iter = items.into_iter();
        let mut completed = 0usize;
        let mut first = true;
        loop {
            let batch: Vec<T> = iter.by_ref().take(self.policy.batch_size).collect();
            if batch.is_empty() {
                break;
            }
            if !first && !self.policy.batch_delay.is_zero() {
                Delay::new(self.policy.batch_delay).await;
            }
            first = false;

            let batch_len = batch.len();
            let calls = batch.into_iter().map(|item| async move {
                let _permit = semaphore.acquire().await;
                processor(item).await
            });
            // join_all preserves input order regardless of completion order.
            results.extend(join_all(calls).await);

            completed += batch_len;
            tracing::debug!(completed, total, "batch finished");
            progress(completed, total);
        }
        results
    }

    /// Same contract as `process_batches`, with each item's call
    /// independently wrapped by a `RetryHandler` before its outcome is
    /// captured.
    pub async fn process_with_retry<T, U, E, F, Fut>(
        &self,
        items: Vec<T>,
        processor: F,
        retry: &RetryPolicy,
    ) -> Vec<Result<U, E>>
    where
        T: Clone,
        F: Fn(T) -> Fut,
        Fut: Future<Output = Result<U, E>>,
        E: fmt::Display,
    {
        let handler = RetryHandler::new(retry.clone());
        let handler = &handler;
        let processor = &processor;
        self.process_batches(
            items,
            move |item: T| async move { handler.execute(|| processor(item.clone())).await },
            |_, _| {},
        )
        .await
    }
}
