// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use crate::models::finding::{ContentGainFinding, ScrapeError};
use serde::{Deserialize, Serialize};

/// Per-page outcome shown on external dashboards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrapingStatus {
    Success,
    Error,
}

/// One page's row in the status document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageStatus {
    pub url: String,
    pub scraping_status: ScrapingStatus,
    pub needs_prerender: bool,
    pub word_count_before: u32,
    pub word_count_after: u32,
    pub content_gain_ratio: f64,
    pub organic_traffic: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scrape_error: Option<ScrapeError>,
}

impl PageStatus {
    /// Project a finding into its dashboard row. Errored pages report zeroed
    /// measurements regardless of what the finding carries.
    pub fn from_finding(finding: &ContentGainFinding) -> Self {
        let errored = finding.scrape_error.is_some();
        Self {
            url: finding.url.clone(),
            scraping_status: if errored {
                ScrapingStatus::Error
            } else {
                ScrapingStatus::Success
            },
            needs_prerender: finding.needs_prerender,
            word_count_before: if errored { 0 } else { finding.word_count_before },
            word_count_after: if errored { 0 } else { finding.word_count_after },
            content_gain_ratio: if errored { 0.0 } else { finding.content_gain_ratio },
            organic_traffic: finding.organic_traffic,
            scrape_error: finding.scrape_error.clone(),
        }
    }
}

/// Summary document written to `{prefix}/{site_id}/status.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusDocument {
    pub base_url: String,
    pub site_id: String,
    pub audit_type: String,
    /// ISO-8601 timestamp of the run that produced this document
    pub last_updated: String,
    pub total_urls_checked: usize,
    pub urls_needing_prerender: usize,
    pub scrape_forbidden: bool,
    pub pages: Vec<PageStatus>,
}
