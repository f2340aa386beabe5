// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Retrieval of one URL's snapshot pair from blob storage.

use crate::models::snapshot::{HtmlSnapshotPair, ScrapeStatus};
use crate::services::storage::{
    snapshot_key, BlobStore, CLIENT_SNAPSHOT_FILE, SCRAPE_STATUS_FILE, SERVER_SNAPSHOT_FILE,
};
use std::sync::Arc;
use tracing::warn;

/// Fetches the server/client snapshot pair and scrape metadata for one URL.
///
/// Individual read failures never escape this type: a missing key, empty
/// body or storage error becomes an absent field and the caller decides how
/// to treat the gap.
pub struct SnapshotFetcher {
    store: Arc<dyn BlobStore>,
    storage_prefix: String,
    site_id: String,
}

impl SnapshotFetcher {
    pub fn new(store: Arc<dyn BlobStore>, storage_prefix: String, site_id: String) -> Self {
        Self {
            store,
            storage_prefix,
            site_id,
        }
    }

    pub async fn fetch(&self, url: &str) -> HtmlSnapshotPair {
        let (server_html, client_html, scrape_status) = tokio::join!(
            self.read_html(url, SERVER_SNAPSHOT_FILE),
            self.read_html(url, CLIENT_SNAPSHOT_FILE),
            self.read_status(url),
        );

        HtmlSnapshotPair {
            url: url.to_string(),
            server_html,
            client_html,
            scrape_status,
        }
    }

    async fn read_html(&self, url: &str, file: &str) -> Option<String> {
        let key = snapshot_key(&self.storage_prefix, &self.site_id, url, file);
        match self.store.get(&key).await {
            Ok(Some(bytes)) if !bytes.is_empty() => match String::from_utf8(bytes) {
                Ok(html) => Some(html),
                Err(e) => {
                    warn!(key = %key, error = %e, "snapshot is not valid UTF-8");
                    None
                }
            },
            Ok(_) => None,
            Err(e) => {
                warn!(key = %key, error = %e, "snapshot read failed");
                None
            }
        }
    }

    async fn read_status(&self, url: &str) -> Option<ScrapeStatus> {
        let key = snapshot_key(&self.storage_prefix, &self.site_id, url, SCRAPE_STATUS_FILE);
        match self.store.get(&key).await {
            Ok(Some(bytes)) => match serde_json::from_slice(&bytes) {
                Ok(status) => Some(status),
                Err(e) => {
                    warn!(key = %key, error = %e, "scrape status is not valid JSON");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(key = %key, error = %e, "scrape status read failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::storage::MemoryBlobStore;

    fn fetcher_with_store(store: Arc<MemoryBlobStore>) -> SnapshotFetcher {
        SnapshotFetcher::new(store, "scrapes".to_string(), "site-1".to_string())
    }

    #[tokio::test]
    async fn test_fetches_complete_pair() {
        let store = Arc::new(MemoryBlobStore::new());
        let url = "https://example.com/about";
        store.insert(
            &snapshot_key("scrapes", "site-1", url, SERVER_SNAPSHOT_FILE),
            b"<p>server</p>",
        );
        store.insert(
            &snapshot_key("scrapes", "site-1", url, CLIENT_SNAPSHOT_FILE),
            b"<p>client</p>",
        );
        store.insert(
            &snapshot_key("scrapes", "site-1", url, SCRAPE_STATUS_FILE),
            br#"{"httpStatusCode": 200, "message": "ok"}"#,
        );

        let pair = fetcher_with_store(store).fetch(url).await;

        assert_eq!(pair.server_html.as_deref(), Some("<p>server</p>"));
        assert_eq!(pair.client_html.as_deref(), Some("<p>client</p>"));
        assert_eq!(pair.scrape_status.unwrap().http_status_code, 200);
    }

    #[tokio::test]
    async fn test_missing_snapshots_are_absent_not_errors() {
        let store = Arc::new(MemoryBlobStore::new());
        let pair = fetcher_with_store(store)
            .fetch("https://example.com/missing")
            .await;

        assert!(pair.server_html.is_none());
        assert!(pair.client_html.is_none());
        assert!(pair.scrape_status.is_none());
    }

    #[tokio::test]
    async fn test_empty_body_counts_as_absent() {
        let store = Arc::new(MemoryBlobStore::new());
        let url = "https://example.com/empty";
        store.insert(
            &snapshot_key("scrapes", "site-1", url, SERVER_SNAPSHOT_FILE),
            b"",
        );

        let pair = fetcher_with_store(store).fetch(url).await;
        assert!(pair.server_html.is_none());
    }

    #[tokio::test]
    async fn test_storage_error_becomes_absent_field() {
        let store = Arc::new(MemoryBlobStore::new());
        let url = "https://example.com/broken";
        let key = snapshot_key("scrapes", "site-1", url, SERVER_SNAPSHOT_FILE);
        store.insert(&key, b"<p>server</p>");
        store.fail_key(&key);
        store.insert(
            &snapshot_key("scrapes", "site-1", url, CLIENT_SNAPSHOT_FILE),
            b"<p>client</p>",
        );

        let pair = fetcher_with_store(store).fetch(url).await;

        assert!(pair.server_html.is_none());
        assert_eq!(pair.client_html.as_deref(), Some("<p>client</p>"));
    }

    #[tokio::test]
    async fn test_forbidden_status_survives_missing_html() {
        let store = Arc::new(MemoryBlobStore::new());
        let url = "https://example.com/blocked";
        store.insert(
            &snapshot_key("scrapes", "site-1", url, SCRAPE_STATUS_FILE),
            br#"{"httpStatusCode": 403, "message": "Forbidden"}"#,
        );

        let pair = fetcher_with_store(store).fetch(url).await;

        assert!(!pair.has_html());
        assert!(pair.scrape_status.unwrap().is_forbidden());
    }
}
