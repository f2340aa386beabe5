// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Repository contracts for opportunity and suggestion records.
//!
//! The production backend is owned by the hosting audit framework; these
//! traits are its contract. The in-memory implementations back the binary's
//! standalone mode and the test suite.

use crate::models::opportunity::{Opportunity, Suggestion};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

#[async_trait]
pub trait OpportunityStore: Send + Sync {
    /// Find the open opportunity for a `(site_id, audit_type)` pair, if any
    async fn find_open(&self, site_id: &str, audit_type: &str) -> Result<Option<Opportunity>>;

    async fn create(&self, opportunity: Opportunity) -> Result<Opportunity>;

    async fn save(&self, opportunity: &Opportunity) -> Result<()>;
}

#[async_trait]
pub trait SuggestionStore: Send + Sync {
    async fn all_by_opportunity(&self, opportunity_id: Uuid) -> Result<Vec<Suggestion>>;

    async fn create(&self, suggestion: Suggestion) -> Result<Suggestion>;

    async fn save(&self, suggestion: &Suggestion) -> Result<()>;

    async fn remove(&self, id: Uuid) -> Result<()>;
}

#[derive(Default)]
pub struct MemoryOpportunityStore {
    records: Mutex<Vec<Opportunity>>,
    fail_writes: AtomicBool,
}

impl MemoryOpportunityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<Opportunity> {
        self.records.lock().unwrap().clone()
    }

    /// Make create/save fail, for exercising the fatal synchronization path
    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl OpportunityStore for MemoryOpportunityStore {
    async fn find_open(&self, site_id: &str, audit_type: &str) -> Result<Option<Opportunity>> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .find(|o| o.site_id == site_id && o.audit_type == audit_type && o.status.is_open())
            .cloned())
    }

    async fn create(&self, opportunity: Opportunity) -> Result<Opportunity> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(anyhow!("injected opportunity write failure"));
        }
        self.records.lock().unwrap().push(opportunity.clone());
        Ok(opportunity)
    }

    async fn save(&self, opportunity: &Opportunity) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(anyhow!("injected opportunity write failure"));
        }
        let mut records = self.records.lock().unwrap();
        match records.iter_mut().find(|o| o.id == opportunity.id) {
            Some(existing) => *existing = opportunity.clone(),
            None => records.push(opportunity.clone()),
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemorySuggestionStore {
    records: Mutex<Vec<Suggestion>>,
}

impl MemorySuggestionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<Suggestion> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl SuggestionStore for MemorySuggestionStore {
    async fn all_by_opportunity(&self, opportunity_id: Uuid) -> Result<Vec<Suggestion>> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.opportunity_id == opportunity_id)
            .cloned()
            .collect())
    }

    async fn create(&self, suggestion: Suggestion) -> Result<Suggestion> {
        self.records.lock().unwrap().push(suggestion.clone());
        Ok(suggestion)
    }

    async fn save(&self, suggestion: &Suggestion) -> Result<()> {
        let mut records = self.records.lock().unwrap();
        match records.iter_mut().find(|s| s.id == suggestion.id) {
            Some(existing) => *existing = suggestion.clone(),
            None => records.push(suggestion.clone()),
        }
        Ok(())
    }

    async fn remove(&self, id: Uuid) -> Result<()> {
        self.records.lock().unwrap().retain(|s| s.id != id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_find_open_skips_resolved() {
        let store = MemoryOpportunityStore::new();
        let mut opportunity = Opportunity::new("site-1", "prerender", json!({}));
        opportunity.status = crate::models::opportunity::OpportunityStatus::Resolved;
        store.create(opportunity).await.unwrap();

        assert!(store.find_open("site-1", "prerender").await.unwrap().is_none());

        let open = Opportunity::new("site-1", "prerender", json!({}));
        store.create(open.clone()).await.unwrap();
        let found = store.find_open("site-1", "prerender").await.unwrap().unwrap();
        assert_eq!(found.id, open.id);
    }

    #[tokio::test]
    async fn test_suggestion_store_scopes_by_opportunity() {
        let store = MemorySuggestionStore::new();
        let first = Uuid::now_v7();
        let second = Uuid::now_v7();
        store
            .create(Suggestion::new(first, "https://example.com/a", json!({})))
            .await
            .unwrap();
        store
            .create(Suggestion::new(second, "https://example.com/b", json!({})))
            .await
            .unwrap();

        let scoped = store.all_by_opportunity(first).await.unwrap();
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0].key, "https://example.com/a");
    }

    #[tokio::test]
    async fn test_remove_deletes_by_id() {
        let store = MemorySuggestionStore::new();
        let opportunity_id = Uuid::now_v7();
        let suggestion = store
            .create(Suggestion::new(opportunity_id, "key", json!({})))
            .await
            .unwrap();

        store.remove(suggestion.id).await.unwrap();
        assert!(store.all_by_opportunity(opportunity_id).await.unwrap().is_empty());
    }
}
