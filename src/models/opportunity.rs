// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Lifecycle of an opportunity record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OpportunityStatus {
    New,
    InProgress,
    Resolved,
    Ignored,
}

impl OpportunityStatus {
    /// Open opportunities are the ones a new audit run merges into
    pub fn is_open(&self) -> bool {
        matches!(self, OpportunityStatus::New | OpportunityStatus::InProgress)
    }
}

/// One detected category of site issue, owning zero or more suggestions.
/// At most one open opportunity exists per `(site_id, audit_type)` pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Opportunity {
    pub id: Uuid,
    pub site_id: String,
    pub audit_type: String,
    pub status: OpportunityStatus,
    pub data: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Opportunity {
    pub fn new(site_id: impl Into<String>, audit_type: impl Into<String>, data: Value) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            site_id: site_id.into(),
            audit_type: audit_type.into(),
            status: OpportunityStatus::New,
            data,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Per-URL remediation recommendation linked to an opportunity.
/// `key` is the stable composite key suggestions are merged by.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub id: Uuid,
    pub opportunity_id: Uuid,
    pub key: String,
    pub data: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Suggestion {
    pub fn new(opportunity_id: Uuid, key: impl Into<String>, data: Value) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            opportunity_id,
            key: key.into(),
            data,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Merge `new` into `old` with an explicit precedence rule: fields of `new`
/// overwrite same-named fields of `old`, fields present only in `old` are
/// preserved. When either side is not a JSON object, `new` wins outright.
pub fn merge_data(old: &Value, new: &Value) -> Value {
    match (old.as_object(), new.as_object()) {
        (Some(old_map), Some(new_map)) => {
            let mut merged = old_map.clone();
            for (key, value) in new_map {
                merged.insert(key.clone(), value.clone());
            }
            Value::Object(merged)
        }
        _ => new.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_new_fields_overwrite() {
        let old = json!({"totalUrlsChecked": 3, "urlsNeedingPrerender": 1});
        let new = json!({"totalUrlsChecked": 5});

        let merged = merge_data(&old, &new);

        assert_eq!(merged["totalUrlsChecked"], 5);
        assert_eq!(merged["urlsNeedingPrerender"], 1);
    }

    #[test]
    fn test_merge_preserves_unknown_old_fields() {
        let old = json!({"aiSummary": "keep me", "wordCountAfter": 10});
        let new = json!({"wordCountAfter": 99, "contentGainRatio": 3.0});

        let merged = merge_data(&old, &new);

        assert_eq!(merged["aiSummary"], "keep me");
        assert_eq!(merged["wordCountAfter"], 99);
        assert_eq!(merged["contentGainRatio"], 3.0);
    }

    #[test]
    fn test_merge_non_object_new_wins() {
        let old = json!({"a": 1});
        let new = json!(null);
        assert_eq!(merge_data(&old, &new), json!(null));

        let old = json!("text");
        let new = json!({"a": 1});
        assert_eq!(merge_data(&old, &new), json!({"a": 1}));
    }

    #[test]
    fn test_status_open_states() {
        assert!(OpportunityStatus::New.is_open());
        assert!(OpportunityStatus::InProgress.is_open());
        assert!(!OpportunityStatus::Resolved.is_open());
        assert!(!OpportunityStatus::Ignored.is_open());
    }

    #[test]
    fn test_status_serializes_screaming_snake_case() {
        assert_eq!(
            serde_json::to_string(&OpportunityStatus::InProgress).unwrap(),
            r#""IN_PROGRESS""#
        );
    }
}
