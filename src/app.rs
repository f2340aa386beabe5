// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Pipeline orchestration: one audit run from candidate selection through
//! comparison, synchronization and status reporting.
//!
//! This module is `pub` so that integration tests can drive a full run over
//! in-memory collaborators without the binary.

use crate::models::candidate::{select_candidates, MAX_CANDIDATES};
use crate::models::finding::BatchReport;
use crate::models::guidance::{GuidanceReply, GuidanceRequest};
use crate::services::analyzer::DEFAULT_GAIN_THRESHOLD;
use crate::services::comparator::{BatchComparator, ForbiddenPolicy};
use crate::services::error::AuditError;
use crate::services::fetcher::SnapshotFetcher;
use crate::services::poller::{PollOutcome, ResultPoller};
use crate::services::queue::Queue;
use crate::services::repo::{OpportunityStore, SuggestionStore};
use crate::services::reporter::StatusReporter;
use crate::services::storage::{snapshot_key, BlobStore, SCRAPE_STATUS_FILE};
use crate::services::sync::{FindingSynchronizer, AUDIT_TYPE_PRERENDER};
use crate::services::top_pages::TopPagesSource;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Application version extracted from `Cargo.toml` at compile time.
/// The patch segment can be overridden via `AUDIT_PATCH_VERSION` (see `build.rs`).
pub const VERSION: &str = env!("AUDIT_VERSION");

/// External collaborators injected into every run
pub struct AuditContext {
    pub store: Arc<dyn BlobStore>,
    pub queue: Arc<dyn Queue>,
    pub opportunities: Arc<dyn OpportunityStore>,
    pub suggestions: Arc<dyn SuggestionStore>,
    pub top_pages: Arc<dyn TopPagesSource>,
}

/// Per-run tuning knobs
#[derive(Debug, Clone)]
pub struct AuditConfig {
    pub storage_prefix: String,
    pub gain_threshold: f64,
    pub max_candidates: usize,
    pub poll_interval: Duration,
    pub max_wait: Duration,
    pub excluded_selectors: Vec<String>,
    pub forbidden_policy: ForbiddenPolicy,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            storage_prefix: "scrapes".to_string(),
            gain_threshold: DEFAULT_GAIN_THRESHOLD,
            max_candidates: MAX_CANDIDATES,
            poll_interval: Duration::from_secs(30),
            max_wait: Duration::from_secs(600),
            excluded_selectors: vec![
                "nav".to_string(),
                "header".to_string(),
                "footer".to_string(),
            ],
            forbidden_policy: ForbiddenPolicy::AllForbidden,
        }
    }
}

/// The site one run audits
#[derive(Debug, Clone)]
pub struct AuditSite {
    pub site_id: String,
    pub base_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditRunStatus {
    Complete,
    Error,
}

/// Outer result of a run. Fatal errors surface here instead of escaping the
/// pipeline boundary.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRunResult {
    pub status: AuditRunStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<BatchReport>,
}

/// Run one prerender audit for a site.
///
/// Callers serialize runs per site: opportunity synchronization assumes at
/// most one concurrent run per `(site_id, audit_type)`.
pub async fn run_audit(ctx: &AuditContext, config: &AuditConfig, site: &AuditSite) -> AuditRunResult {
    match run_audit_inner(ctx, config, site).await {
        Ok(report) => AuditRunResult {
            status: AuditRunStatus::Complete,
            error: None,
            report: Some(report),
        },
        Err(e) => {
            error!(site_id = %site.site_id, error = %e, "audit run failed");
            AuditRunResult {
                status: AuditRunStatus::Error,
                error: Some(e.to_string()),
                report: None,
            }
        }
    }
}

async fn run_audit_inner(
    ctx: &AuditContext,
    config: &AuditConfig,
    site: &AuditSite,
) -> Result<BatchReport, AuditError> {
    let pages = match ctx.top_pages.top_pages(&site.site_id).await {
        Ok(pages) => pages,
        Err(e) => {
            warn!(site_id = %site.site_id, error = %e, "top pages unavailable, using base URL");
            Vec::new()
        }
    };
    let candidates = select_candidates(pages, &site.base_url, config.max_candidates);
    info!(site_id = %site.site_id, count = candidates.len(), "selected audit candidates");

    // Wait for the scraping subsystem's artifacts before comparing
    let expected: HashSet<String> = candidates
        .iter()
        .map(|c| snapshot_key(&config.storage_prefix, &site.site_id, &c.url, SCRAPE_STATUS_FILE))
        .collect();
    let poller = ResultPoller::new(ctx.store.clone(), config.poll_interval, config.max_wait);
    let site_prefix = format!("{}/{}/", config.storage_prefix, site.site_id);
    let poll = poller.wait_for(&site_prefix, &expected).await;
    if poll.outcome == PollOutcome::TimedOut {
        warn!(
            found = poll.found_keys.len(),
            expected = expected.len(),
            "proceeding with partial snapshot set"
        );
    }

    let fetcher = SnapshotFetcher::new(
        ctx.store.clone(),
        config.storage_prefix.clone(),
        site.site_id.clone(),
    );
    let comparator = BatchComparator::new(fetcher, config.gain_threshold)
        .with_forbidden_policy(config.forbidden_policy);
    let report = comparator.compare_all(&candidates).await;

    let synchronizer = FindingSynchronizer::new(ctx.opportunities.clone(), ctx.suggestions.clone());
    if report.scrape_forbidden {
        warn!(site_id = %site.site_id, "scraping forbidden for all candidates");
        synchronizer
            .sync_forbidden(&site.site_id, AUDIT_TYPE_PRERENDER, &report)
            .await?;
    } else {
        let opportunity = synchronizer
            .sync(
                &site.site_id,
                AUDIT_TYPE_PRERENDER,
                &report,
                opportunity_data(&report),
            )
            .await?;

        if report.urls_needing_prerender > 0 {
            let request = GuidanceRequest::for_report(
                &site.site_id,
                &opportunity.id.to_string(),
                &report,
                &config.excluded_selectors,
            );
            send_guidance_request(ctx, &request).await;
        }
    }

    StatusReporter::new(ctx.store.clone(), config.storage_prefix.clone())
        .report(&site.site_id, &site.base_url, AUDIT_TYPE_PRERENDER, Some(&report))
        .await;

    Ok(report)
}

/// Fire-and-forget: a lost guidance request is logged, never fatal
async fn send_guidance_request(ctx: &AuditContext, request: &GuidanceRequest) {
    let message = match serde_json::to_value(request) {
        Ok(message) => message,
        Err(e) => {
            error!(error = %e, "failed to serialize guidance request");
            return;
        }
    };
    match ctx.queue.send(&message).await {
        Ok(()) => info!(
            suggestions = request.data.suggestions.len(),
            "sent guidance request"
        ),
        Err(e) => warn!(error = %e, "failed to send guidance request"),
    }
}

/// Consume an inbound guidance reply, merging its enriched suggestions
pub async fn handle_guidance_reply(
    ctx: &AuditContext,
    reply: &GuidanceReply,
) -> Result<(), AuditError> {
    let synchronizer = FindingSynchronizer::new(ctx.opportunities.clone(), ctx.suggestions.clone());
    synchronizer
        .apply_guidance_reply(reply, AUDIT_TYPE_PRERENDER)
        .await
}

fn opportunity_data(report: &BatchReport) -> Value {
    json!({
        "totalUrlsChecked": report.total_urls_checked,
        "urlsNeedingPrerender": report.urls_needing_prerender,
        "scrapeForbidden": report.scrape_forbidden,
    })
}
