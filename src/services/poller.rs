// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Bounded-wait polling for artifacts written by an external producer.

use crate::services::storage::BlobStore;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{info, warn};

/// Terminal state of one poll loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Every expected artifact appeared
    Found,
    /// The wait budget elapsed; a subset (possibly empty) of artifacts exists
    TimedOut,
}

#[derive(Debug)]
pub struct PollResult {
    pub outcome: PollOutcome,
    pub found_keys: HashSet<String>,
    pub attempts: u32,
}

/// Polls a storage prefix until an expected key set appears or a wait budget
/// elapses. Strictly sequential: one list-and-check cycle at a time, never
/// two overlapping attempts. The budget is the only cancellation mechanism;
/// callers wanting external cancellation wrap the whole call.
pub struct ResultPoller {
    store: Arc<dyn BlobStore>,
    poll_interval: Duration,
    max_wait: Duration,
}

impl ResultPoller {
    pub fn new(store: Arc<dyn BlobStore>, poll_interval: Duration, max_wait: Duration) -> Self {
        Self {
            store,
            poll_interval,
            max_wait,
        }
    }

    /// Wait for every key in `expected` to be listed under `prefix`.
    ///
    /// A transient list failure is logged and counts as a zero-found attempt;
    /// the loop keeps going within the same budget. Directory markers and
    /// keys outside the expected set never count.
    pub async fn wait_for(&self, prefix: &str, expected: &HashSet<String>) -> PollResult {
        let started = Instant::now();
        let mut attempts = 0u32;

        loop {
            attempts += 1;

            let listed = match self.store.list(prefix).await {
                Ok(keys) => keys,
                Err(e) => {
                    warn!(prefix = %prefix, error = %e, "listing artifacts failed, retrying");
                    Vec::new()
                }
            };

            let found: HashSet<String> = listed
                .into_iter()
                .filter(|key| !key.ends_with('/'))
                .filter(|key| expected.contains(key))
                .collect();

            if found.len() == expected.len() {
                info!(attempts, count = found.len(), "all expected artifacts present");
                return PollResult {
                    outcome: PollOutcome::Found,
                    found_keys: found,
                    attempts,
                };
            }

            if started.elapsed() >= self.max_wait {
                warn!(
                    attempts,
                    found = found.len(),
                    expected = expected.len(),
                    "timed out waiting for artifacts"
                );
                return PollResult {
                    outcome: PollOutcome::TimedOut,
                    found_keys: found,
                    attempts,
                };
            }

            sleep(self.poll_interval).await;
        }
    }
}
