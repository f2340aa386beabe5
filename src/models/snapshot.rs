// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use serde::{Deserialize, Serialize};

/// Per-URL scrape metadata written by the scraping subsystem next to the
/// HTML snapshots (`scrape.json`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeStatus {
    pub http_status_code: i32,
    #[serde(default)]
    pub message: String,
}

impl ScrapeStatus {
    /// Whether the scraper was denied access to the page
    pub fn is_forbidden(&self) -> bool {
        self.http_status_code == 403
    }
}

/// The two HTML snapshots captured for one URL.
///
/// Held only for the duration of one comparison; never persisted. A missing
/// or unreadable snapshot is an absent field, not an error.
#[derive(Debug, Clone, Default)]
pub struct HtmlSnapshotPair {
    pub url: String,
    pub server_html: Option<String>,
    pub client_html: Option<String>,
    pub scrape_status: Option<ScrapeStatus>,
}

impl HtmlSnapshotPair {
    /// Whether either rendering produced any HTML at all
    pub fn has_html(&self) -> bool {
        self.server_html.is_some() || self.client_html.is_some()
    }
}
