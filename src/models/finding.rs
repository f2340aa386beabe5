// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use serde::{Deserialize, Serialize};

/// Why a candidate could not be compared
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status_code: Option<i32>,
}

/// Result of comparing one URL's server-rendered and client-rendered
/// snapshots. Immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentGainFinding {
    pub url: String,
    pub word_count_before: u32,
    pub word_count_after: u32,
    pub content_gain_ratio: f64,
    pub needs_prerender: bool,
    pub organic_traffic: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scrape_error: Option<ScrapeError>,
}

impl ContentGainFinding {
    /// Finding recorded when a candidate could not be compared. Carries the
    /// error and zeroed measurements so batch counts stay exact.
    pub fn failed(url: impl Into<String>, organic_traffic: u64, error: ScrapeError) -> Self {
        Self {
            url: url.into(),
            word_count_before: 0,
            word_count_after: 0,
            content_gain_ratio: 0.0,
            needs_prerender: false,
            organic_traffic,
            scrape_error: Some(error),
        }
    }
}

/// Aggregate result of one audit run over all candidates
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub total_urls_checked: usize,
    pub urls_needing_prerender: usize,
    pub scrape_forbidden: bool,
    pub findings: Vec<ContentGainFinding>,
}

impl BatchReport {
    /// Build a report from settled findings, deriving the aggregate counts
    pub fn from_findings(findings: Vec<ContentGainFinding>) -> Self {
        let urls_needing_prerender = findings.iter().filter(|f| f.needs_prerender).count();
        Self {
            total_urls_checked: findings.len(),
            urls_needing_prerender,
            scrape_forbidden: false,
            findings,
        }
    }

    /// Terminal report for the all-forbidden case: no per-page detail beyond
    /// the errors, and nothing flagged for prerendering.
    pub fn forbidden(findings: Vec<ContentGainFinding>) -> Self {
        Self {
            total_urls_checked: findings.len(),
            urls_needing_prerender: 0,
            scrape_forbidden: true,
            findings,
        }
    }

    /// Findings that crossed the content-gain threshold
    pub fn prerender_findings(&self) -> impl Iterator<Item = &ContentGainFinding> {
        self.findings.iter().filter(|f| f.needs_prerender)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(url: &str, needs_prerender: bool) -> ContentGainFinding {
        ContentGainFinding {
            url: url.to_string(),
            word_count_before: 10,
            word_count_after: 20,
            content_gain_ratio: 2.0,
            needs_prerender,
            organic_traffic: 100,
            scrape_error: None,
        }
    }

    #[test]
    fn test_report_counts_match_findings() {
        let report = BatchReport::from_findings(vec![
            finding("https://example.com/a", true),
            finding("https://example.com/b", false),
            finding("https://example.com/c", true),
        ]);

        assert_eq!(report.total_urls_checked, 3);
        assert_eq!(report.urls_needing_prerender, 2);
        assert!(!report.scrape_forbidden);
        assert_eq!(report.prerender_findings().count(), 2);
    }

    #[test]
    fn test_forbidden_report_flags_nothing() {
        let error = ScrapeError {
            message: "Forbidden".to_string(),
            http_status_code: Some(403),
        };
        let report = BatchReport::forbidden(vec![ContentGainFinding::failed(
            "https://example.com",
            0,
            error,
        )]);

        assert!(report.scrape_forbidden);
        assert_eq!(report.total_urls_checked, 1);
        assert_eq!(report.urls_needing_prerender, 0);
    }

    #[test]
    fn test_failed_finding_zeroes_measurements() {
        let error = ScrapeError {
            message: "storage unavailable".to_string(),
            http_status_code: None,
        };
        let finding = ContentGainFinding::failed("https://example.com/a", 42, error);

        assert_eq!(finding.word_count_before, 0);
        assert_eq!(finding.word_count_after, 0);
        assert_eq!(finding.content_gain_ratio, 0.0);
        assert!(!finding.needs_prerender);
        assert_eq!(finding.organic_traffic, 42);
        assert!(finding.scrape_error.is_some());
    }
}
