// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Idempotent synchronization of batch findings into opportunity and
//! suggestion records.

use crate::models::finding::{BatchReport, ContentGainFinding};
use crate::models::guidance::GuidanceReply;
use crate::models::opportunity::{merge_data, Opportunity, Suggestion};
use crate::services::error::AuditError;
use crate::services::repo::{OpportunityStore, SuggestionStore};
use chrono::Utc;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

/// Audit type for prerender opportunities
pub const AUDIT_TYPE_PRERENDER: &str = "prerender";

/// Merges batch findings into the persistent opportunity/suggestion records.
///
/// Assumes at most one concurrent synchronization per `(site_id, audit_type)`;
/// the merge-then-save sequence is not transactional, so concurrent runs for
/// the same site must be serialized by the caller.
pub struct FindingSynchronizer {
    opportunities: Arc<dyn OpportunityStore>,
    suggestions: Arc<dyn SuggestionStore>,
}

impl FindingSynchronizer {
    pub fn new(
        opportunities: Arc<dyn OpportunityStore>,
        suggestions: Arc<dyn SuggestionStore>,
    ) -> Self {
        Self {
            opportunities,
            suggestions,
        }
    }

    /// Create or merge the opportunity for this site/audit pair and bring its
    /// suggestion set in line with the report's prerender findings: matching
    /// keys are merged, new keys created, keys absent from this batch pruned.
    /// Running twice over an unchanged report is a no-op beyond timestamps.
    pub async fn sync(
        &self,
        site_id: &str,
        audit_type: &str,
        report: &BatchReport,
        data: Value,
    ) -> Result<Opportunity, AuditError> {
        let opportunity = self.upsert_opportunity(site_id, audit_type, data).await?;

        let existing = self
            .suggestions
            .all_by_opportunity(opportunity.id)
            .await
            .map_err(|e| AuditError::Synchronization(e.to_string()))?;

        let mut current_keys = HashSet::new();
        for finding in report.prerender_findings() {
            current_keys.insert(finding.url.clone());
            let data = suggestion_data(finding);
            if let Err(e) = self
                .upsert_suggestion(&opportunity, &existing, &finding.url, data)
                .await
            {
                warn!(url = %finding.url, error = %e, "failed to sync suggestion");
            }
        }

        for stale in existing.iter().filter(|s| !current_keys.contains(&s.key)) {
            if let Err(e) = self.suggestions.remove(stale.id).await {
                warn!(key = %stale.key, error = %e, "failed to prune stale suggestion");
            } else {
                info!(key = %stale.key, "pruned stale suggestion");
            }
        }

        Ok(opportunity)
    }

    /// Forbidden path: one suggestion-less opportunity flagged so consumers
    /// can tell "we could not look" from "nothing to fix".
    pub async fn sync_forbidden(
        &self,
        site_id: &str,
        audit_type: &str,
        report: &BatchReport,
    ) -> Result<Opportunity, AuditError> {
        let data = json!({
            "scrapeForbidden": true,
            "totalUrlsChecked": report.total_urls_checked,
        });
        self.upsert_opportunity(site_id, audit_type, data).await
    }

    /// Merge a guidance reply's enriched suggestions into the open
    /// opportunity. Replies cover an arbitrary subset of pages, so this
    /// never prunes.
    pub async fn apply_guidance_reply(
        &self,
        reply: &GuidanceReply,
        audit_type: &str,
    ) -> Result<(), AuditError> {
        let opportunity = self
            .opportunities
            .find_open(&reply.site_id, audit_type)
            .await
            .map_err(|e| AuditError::Synchronization(e.to_string()))?
            .ok_or_else(|| {
                AuditError::Synchronization(format!(
                    "no open opportunity for guidance reply on site {}",
                    reply.site_id
                ))
            })?;

        let existing = self
            .suggestions
            .all_by_opportunity(opportunity.id)
            .await
            .map_err(|e| AuditError::Synchronization(e.to_string()))?;

        for suggestion in &reply.data.suggestions {
            let data = serde_json::to_value(suggestion)
                .map_err(|e| AuditError::Synchronization(e.to_string()))?;
            if let Err(e) = self
                .upsert_suggestion(&opportunity, &existing, &suggestion.url, data)
                .await
            {
                warn!(url = %suggestion.url, error = %e, "failed to apply guidance suggestion");
            }
        }

        Ok(())
    }

    async fn upsert_opportunity(
        &self,
        site_id: &str,
        audit_type: &str,
        data: Value,
    ) -> Result<Opportunity, AuditError> {
        let existing = self
            .opportunities
            .find_open(site_id, audit_type)
            .await
            .map_err(|e| AuditError::Synchronization(e.to_string()))?;

        match existing {
            Some(mut opportunity) => {
                opportunity.data = merge_data(&opportunity.data, &data);
                opportunity.updated_at = Utc::now();
                self.opportunities
                    .save(&opportunity)
                    .await
                    .map_err(|e| AuditError::Synchronization(e.to_string()))?;
                info!(site_id, audit_type, id = %opportunity.id, "merged existing opportunity");
                Ok(opportunity)
            }
            None => {
                let opportunity = self
                    .opportunities
                    .create(Opportunity::new(site_id, audit_type, data))
                    .await
                    .map_err(|e| AuditError::Synchronization(e.to_string()))?;
                info!(site_id, audit_type, id = %opportunity.id, "created opportunity");
                Ok(opportunity)
            }
        }
    }

    async fn upsert_suggestion(
        &self,
        opportunity: &Opportunity,
        existing: &[Suggestion],
        key: &str,
        data: Value,
    ) -> anyhow::Result<()> {
        match existing.iter().find(|s| s.key == key) {
            Some(previous) => {
                let mut updated = previous.clone();
                updated.data = merge_data(&previous.data, &data);
                updated.updated_at = Utc::now();
                self.suggestions.save(&updated).await
            }
            None => {
                self.suggestions
                    .create(Suggestion::new(opportunity.id, key, data))
                    .await?;
                Ok(())
            }
        }
    }
}

fn suggestion_data(finding: &ContentGainFinding) -> Value {
    serde_json::to_value(finding).unwrap_or_else(|_| json!({ "url": finding.url }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::guidance::{GuidanceReplyData, GuidanceSuggestion};
    use crate::services::repo::{MemoryOpportunityStore, MemorySuggestionStore};

    fn finding(url: &str, ratio: f64, needs_prerender: bool) -> ContentGainFinding {
        ContentGainFinding {
            url: url.to_string(),
            word_count_before: 10,
            word_count_after: (10.0 * ratio) as u32,
            content_gain_ratio: ratio,
            needs_prerender,
            organic_traffic: 100,
            scrape_error: None,
        }
    }

    fn harness() -> (
        Arc<MemoryOpportunityStore>,
        Arc<MemorySuggestionStore>,
        FindingSynchronizer,
    ) {
        let opportunities = Arc::new(MemoryOpportunityStore::new());
        let suggestions = Arc::new(MemorySuggestionStore::new());
        let synchronizer = FindingSynchronizer::new(opportunities.clone(), suggestions.clone());
        (opportunities, suggestions, synchronizer)
    }

    fn report(findings: Vec<ContentGainFinding>) -> BatchReport {
        BatchReport::from_findings(findings)
    }

    #[tokio::test]
    async fn test_sync_twice_is_idempotent() {
        let (opportunities, suggestions, synchronizer) = harness();
        let batch = report(vec![
            finding("https://example.com/a", 3.0, true),
            finding("https://example.com/b", 2.0, true),
        ]);
        let data = json!({"urlsNeedingPrerender": 2});

        synchronizer
            .sync("site-1", AUDIT_TYPE_PRERENDER, &batch, data.clone())
            .await
            .unwrap();
        synchronizer
            .sync("site-1", AUDIT_TYPE_PRERENDER, &batch, data)
            .await
            .unwrap();

        assert_eq!(opportunities.all().len(), 1);
        let stored = suggestions.all();
        assert_eq!(stored.len(), 2);
        let keys: HashSet<_> = stored.iter().map(|s| s.key.clone()).collect();
        assert!(keys.contains("https://example.com/a"));
        assert!(keys.contains("https://example.com/b"));
    }

    #[tokio::test]
    async fn test_sync_prunes_suggestions_absent_from_batch() {
        let (_, suggestions, synchronizer) = harness();

        let first = report(vec![
            finding("https://example.com/a", 3.0, true),
            finding("https://example.com/b", 2.0, true),
        ]);
        synchronizer
            .sync("site-1", AUDIT_TYPE_PRERENDER, &first, json!({}))
            .await
            .unwrap();

        // page b no longer needs prerendering
        let second = report(vec![
            finding("https://example.com/a", 3.0, true),
            finding("https://example.com/b", 1.0, false),
        ]);
        synchronizer
            .sync("site-1", AUDIT_TYPE_PRERENDER, &second, json!({}))
            .await
            .unwrap();

        let stored = suggestions.all();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].key, "https://example.com/a");
    }

    #[tokio::test]
    async fn test_sync_merge_preserves_caller_supplied_fields() {
        let (_, suggestions, synchronizer) = harness();
        let batch = report(vec![finding("https://example.com/a", 3.0, true)]);

        synchronizer
            .sync("site-1", AUDIT_TYPE_PRERENDER, &batch, json!({}))
            .await
            .unwrap();

        // an external writer decorates the suggestion between runs
        let mut decorated = suggestions.all().pop().unwrap();
        decorated.data["aiSummary"] = json!("hand-written note");
        suggestions.save(&decorated).await.unwrap();

        synchronizer
            .sync("site-1", AUDIT_TYPE_PRERENDER, &batch, json!({}))
            .await
            .unwrap();

        let stored = suggestions.all();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].data["aiSummary"], "hand-written note");
        assert_eq!(stored[0].data["contentGainRatio"], 3.0);
    }

    #[tokio::test]
    async fn test_opportunity_merge_overwrites_and_preserves() {
        let (opportunities, _, synchronizer) = harness();
        let batch = report(vec![finding("https://example.com/a", 3.0, true)]);

        synchronizer
            .sync(
                "site-1",
                AUDIT_TYPE_PRERENDER,
                &batch,
                json!({"urlsNeedingPrerender": 1, "note": "first run"}),
            )
            .await
            .unwrap();
        synchronizer
            .sync(
                "site-1",
                AUDIT_TYPE_PRERENDER,
                &batch,
                json!({"urlsNeedingPrerender": 4}),
            )
            .await
            .unwrap();

        let stored = opportunities.all();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].data["urlsNeedingPrerender"], 4);
        assert_eq!(stored[0].data["note"], "first run");
    }

    #[tokio::test]
    async fn test_forbidden_creates_opportunity_without_suggestions() {
        let (opportunities, suggestions, synchronizer) = harness();
        let batch = BatchReport::forbidden(vec![]);

        synchronizer
            .sync_forbidden("site-1", AUDIT_TYPE_PRERENDER, &batch)
            .await
            .unwrap();

        let stored = opportunities.all();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].data["scrapeForbidden"], true);
        assert!(suggestions.all().is_empty());
    }

    #[tokio::test]
    async fn test_opportunity_write_failure_is_fatal() {
        let (opportunities, _, synchronizer) = harness();
        opportunities.fail_writes();

        let batch = report(vec![finding("https://example.com/a", 3.0, true)]);
        let result = synchronizer
            .sync("site-1", AUDIT_TYPE_PRERENDER, &batch, json!({}))
            .await;

        assert!(matches!(result, Err(AuditError::Synchronization(_))));
    }

    #[tokio::test]
    async fn test_guidance_reply_merges_without_pruning() {
        let (_, suggestions, synchronizer) = harness();
        let batch = report(vec![
            finding("https://example.com/a", 3.0, true),
            finding("https://example.com/b", 2.0, true),
        ]);
        synchronizer
            .sync("site-1", AUDIT_TYPE_PRERENDER, &batch, json!({}))
            .await
            .unwrap();

        let reply = GuidanceReply {
            site_id: "site-1".to_string(),
            audit_id: "audit-1".to_string(),
            data: GuidanceReplyData {
                suggestions: vec![GuidanceSuggestion {
                    url: "https://example.com/a".to_string(),
                    content_gain_ratio: 3.0,
                    word_count_before: 10,
                    word_count_after: 30,
                    organic_traffic: 100,
                    original_html_key: Some("scrapes/site-1/a/server-side.html".to_string()),
                    prerendered_html_key: Some("scrapes/site-1/a/client-side.html".to_string()),
                    ai_summary: Some("Main article loads client-side".to_string()),
                }],
            },
        };
        synchronizer
            .apply_guidance_reply(&reply, AUDIT_TYPE_PRERENDER)
            .await
            .unwrap();

        let stored = suggestions.all();
        // reply touched one suggestion, the other survives
        assert_eq!(stored.len(), 2);
        let enriched = stored
            .iter()
            .find(|s| s.key == "https://example.com/a")
            .unwrap();
        assert_eq!(enriched.data["aiSummary"], "Main article loads client-side");
        assert_eq!(enriched.data["needsPrerender"], true);
    }

    #[tokio::test]
    async fn test_guidance_reply_without_open_opportunity_fails() {
        let (_, _, synchronizer) = harness();
        let reply = GuidanceReply {
            site_id: "site-unknown".to_string(),
            audit_id: "audit-1".to_string(),
            data: GuidanceReplyData { suggestions: vec![] },
        };

        let result = synchronizer
            .apply_guidance_reply(&reply, AUDIT_TYPE_PRERENDER)
            .await;
        assert!(matches!(result, Err(AuditError::Synchronization(_))));
    }
}
