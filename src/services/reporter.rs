// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Best-effort publication of the latest batch report for dashboards.

use crate::models::finding::BatchReport;
use crate::models::status::{PageStatus, StatusDocument};
use crate::services::storage::BlobStore;
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info};

/// Writes the status summary to `{prefix}/{site_id}/status.json`.
/// Never fails the run: every error is logged and swallowed.
pub struct StatusReporter {
    store: Arc<dyn BlobStore>,
    prefix: String,
}

impl StatusReporter {
    pub fn new(store: Arc<dyn BlobStore>, prefix: String) -> Self {
        Self { store, prefix }
    }

    pub async fn report(
        &self,
        site_id: &str,
        base_url: &str,
        audit_type: &str,
        report: Option<&BatchReport>,
    ) {
        let Some(report) = report else {
            info!(site_id, "no batch report to publish, skipping status update");
            return;
        };

        let document = StatusDocument {
            base_url: base_url.to_string(),
            site_id: site_id.to_string(),
            audit_type: audit_type.to_string(),
            last_updated: Utc::now().to_rfc3339(),
            total_urls_checked: report.total_urls_checked,
            urls_needing_prerender: report.urls_needing_prerender,
            scrape_forbidden: report.scrape_forbidden,
            pages: report.findings.iter().map(PageStatus::from_finding).collect(),
        };

        let key = format!("{}/{}/status.json", self.prefix, site_id);
        let bytes = match serde_json::to_vec(&document) {
            Ok(bytes) => bytes,
            Err(e) => {
                error!(key = %key, error = %e, "failed to serialize status document");
                return;
            }
        };

        match self.store.put(&key, &bytes, "application/json").await {
            Ok(()) => info!(key = %key, pages = document.pages.len(), "published status document"),
            Err(e) => error!(key = %key, error = %e, "failed to write status document"),
        }
    }
}
