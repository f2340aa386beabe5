// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use crate::models::finding::{BatchReport, ContentGainFinding};
use serde::{Deserialize, Serialize};

/// Message type tag for outbound prerender guidance requests
pub const GUIDANCE_PRERENDER_TYPE: &str = "guidance:prerender";

/// Outbound request asking the guidance service to enrich prerender findings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuidanceRequest {
    #[serde(rename = "type")]
    pub message_type: String,
    pub site_id: String,
    pub audit_id: String,
    pub data: GuidanceRequestData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuidanceRequestData {
    pub suggestions: Vec<ContentGainFinding>,
    pub excluded_selectors: Vec<String>,
}

impl GuidanceRequest {
    /// Build the request for a batch report's prerender findings
    pub fn for_report(
        site_id: &str,
        audit_id: &str,
        report: &BatchReport,
        excluded_selectors: &[String],
    ) -> Self {
        Self {
            message_type: GUIDANCE_PRERENDER_TYPE.to_string(),
            site_id: site_id.to_string(),
            audit_id: audit_id.to_string(),
            data: GuidanceRequestData {
                suggestions: report.prerender_findings().cloned().collect(),
                excluded_selectors: excluded_selectors.to_vec(),
            },
        }
    }
}

/// Inbound asynchronous reply from the guidance service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuidanceReply {
    pub site_id: String,
    pub audit_id: String,
    pub data: GuidanceReplyData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuidanceReplyData {
    #[serde(default)]
    pub suggestions: Vec<GuidanceSuggestion>,
}

/// One enriched suggestion from the guidance service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuidanceSuggestion {
    pub url: String,
    pub content_gain_ratio: f64,
    pub word_count_before: u32,
    pub word_count_after: u32,
    #[serde(default)]
    pub organic_traffic: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_html_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prerendered_html_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_summary: Option<String>,
}
