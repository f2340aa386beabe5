// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Concurrent fan-out of snapshot comparisons over a candidate batch.

use crate::models::candidate::CandidateUrl;
use crate::models::finding::{BatchReport, ContentGainFinding, ScrapeError};
use crate::models::snapshot::ScrapeStatus;
use crate::services::analyzer::analyze;
use crate::services::fetcher::SnapshotFetcher;
use futures::future::join_all;
use tracing::debug;

/// When the batch as a whole counts as "scraping forbidden".
///
/// The rule is policy, not a constant: product requirements differ on
/// whether one 403 or only a unanimous 403 should reroute the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ForbiddenPolicy {
    /// Every candidate with scrape-status evidence reports 403
    #[default]
    AllForbidden,
    /// At least one candidate reports 403
    AnyForbidden,
}

/// Outcome of one candidate, kept until forbidden detection has run
struct CandidateOutcome {
    finding: ContentGainFinding,
    status: Option<ScrapeStatus>,
    had_html: bool,
}

/// Compares every candidate concurrently and aggregates one report.
/// Per-candidate failures are isolated into error findings; the batch
/// always settles with exact counts.
pub struct BatchComparator {
    fetcher: SnapshotFetcher,
    threshold: f64,
    forbidden_policy: ForbiddenPolicy,
}

impl BatchComparator {
    pub fn new(fetcher: SnapshotFetcher, threshold: f64) -> Self {
        Self {
            fetcher,
            threshold,
            forbidden_policy: ForbiddenPolicy::default(),
        }
    }

    pub fn with_forbidden_policy(mut self, policy: ForbiddenPolicy) -> Self {
        self.forbidden_policy = policy;
        self
    }

    /// Fetch and analyze all candidates. Each task produces its own finding;
    /// the final join step assembles the report, so no shared state is
    /// mutated under concurrent completion.
    pub async fn compare_all(&self, candidates: &[CandidateUrl]) -> BatchReport {
        let outcomes = join_all(candidates.iter().map(|c| self.compare_one(c))).await;

        if self.is_forbidden(&outcomes) {
            return BatchReport::forbidden(outcomes.into_iter().map(|o| o.finding).collect());
        }

        BatchReport::from_findings(outcomes.into_iter().map(|o| o.finding).collect())
    }

    async fn compare_one(&self, candidate: &CandidateUrl) -> CandidateOutcome {
        let pair = self.fetcher.fetch(&candidate.url).await;
        let had_html = pair.has_html();

        let finding = match analyze(
            pair.server_html.as_deref().unwrap_or(""),
            pair.client_html.as_deref().unwrap_or(""),
            self.threshold,
        ) {
            Ok(gain) => {
                debug!(
                    url = %candidate.url,
                    ratio = gain.content_gain_ratio,
                    needs_prerender = gain.needs_prerender,
                    "compared snapshots"
                );
                ContentGainFinding {
                    url: candidate.url.clone(),
                    word_count_before: gain.word_count_before,
                    word_count_after: gain.word_count_after,
                    content_gain_ratio: gain.content_gain_ratio,
                    needs_prerender: gain.needs_prerender,
                    organic_traffic: candidate.organic_traffic,
                    scrape_error: None,
                }
            }
            Err(e) => ContentGainFinding::failed(
                &candidate.url,
                candidate.organic_traffic,
                ScrapeError {
                    message: e.to_string(),
                    http_status_code: pair.scrape_status.as_ref().map(|s| s.http_status_code),
                },
            ),
        };

        CandidateOutcome {
            finding,
            status: pair.scrape_status,
            had_html,
        }
    }

    fn is_forbidden(&self, outcomes: &[CandidateOutcome]) -> bool {
        if outcomes.iter().any(|o| o.had_html) {
            return false;
        }

        let with_status: Vec<&ScrapeStatus> =
            outcomes.iter().filter_map(|o| o.status.as_ref()).collect();

        match self.forbidden_policy {
            ForbiddenPolicy::AllForbidden => {
                !with_status.is_empty() && with_status.iter().all(|s| s.is_forbidden())
            }
            ForbiddenPolicy::AnyForbidden => with_status.iter().any(|s| s.is_forbidden()),
        }
    }
}
