// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Default cap on how many top pages are audited per run
pub const MAX_CANDIDATES: usize = 25;

/// A page URL selected for content-gain comparison
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateUrl {
    pub url: String,
    #[serde(default)]
    pub organic_traffic: u64,
}

impl CandidateUrl {
    pub fn new(url: impl Into<String>, organic_traffic: u64) -> Self {
        Self {
            url: url.into(),
            organic_traffic,
        }
    }
}

/// Select the audit candidates from a raw top-pages listing.
///
/// Pages are deduplicated by exact URL (highest-traffic duplicate wins),
/// sorted by descending organic traffic and capped at `max`. An empty
/// listing falls back to exactly one zero-traffic candidate for the site's
/// base URL so every audit has at least one page to check.
pub fn select_candidates(
    mut pages: Vec<CandidateUrl>,
    base_url: &str,
    max: usize,
) -> Vec<CandidateUrl> {
    if pages.is_empty() {
        return vec![CandidateUrl::new(base_url, 0)];
    }

    // Stable sort keeps source order among equal-traffic pages
    pages.sort_by(|a, b| b.organic_traffic.cmp(&a.organic_traffic));

    let mut seen = HashSet::new();
    pages.retain(|page| seen.insert(page.url.clone()));
    pages.truncate(max);
    pages
}
