// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Blob storage behind a capability trait, with the S3 implementation used in
//! production and an in-memory implementation used by tests.

use crate::services::error::AuditError;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use s3::creds::Credentials;
use s3::error::S3Error;
use s3::Bucket;
use s3::Region;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// File names the scraping subsystem writes under each page's key prefix
pub const SERVER_SNAPSHOT_FILE: &str = "server-side.html";
pub const CLIENT_SNAPSHOT_FILE: &str = "client-side.html";
pub const SCRAPE_STATUS_FILE: &str = "scrape.json";

/// Object storage capability consumed by the pipeline
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Read an object. Missing keys come back as `Ok(None)`; transport
    /// failures as `Err`.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    async fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<()>;

    /// List object keys under a prefix
    async fn list(&self, prefix: &str) -> Result<Vec<String>>;
}

/// Storage key segment for a page URL: the URL path with unsafe characters
/// folded into underscores. The root path maps to a fixed token so the base
/// URL gets a well-formed key too.
pub fn sanitize_url_path(url: &str) -> String {
    let path = url::Url::parse(url)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| url.to_string());

    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        return "index".to_string();
    }

    trimmed
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '.' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Full storage key for one of a page's snapshot artifacts
pub fn snapshot_key(prefix: &str, site_id: &str, url: &str, file: &str) -> String {
    format!("{}/{}/{}/{}", prefix, site_id, sanitize_url_path(url), file)
}

/// Configuration for S3-compatible storage
#[derive(Debug, Clone)]
pub struct S3Config {
    pub endpoint: String,
    pub region: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
}

impl S3Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let endpoint = std::env::var("S3_ENDPOINT")
            .map_err(|_| anyhow!("S3_ENDPOINT environment variable not set"))?;
        let bucket = std::env::var("S3_BUCKET")
            .map_err(|_| anyhow!("S3_BUCKET environment variable not set"))?;
        let access_key = std::env::var("S3_ACCESS_KEY")
            .map_err(|_| anyhow!("S3_ACCESS_KEY environment variable not set"))?;
        let secret_key = std::env::var("S3_SECRET_KEY")
            .map_err(|_| anyhow!("S3_SECRET_KEY environment variable not set"))?;

        let region = std::env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".to_string());

        Ok(Self {
            endpoint,
            region,
            bucket,
            access_key,
            secret_key,
        })
    }
}

/// S3-compatible blob store holding snapshot artifacts and status documents
pub struct S3BlobStore {
    bucket: Box<Bucket>,
}

impl S3BlobStore {
    pub fn new(config: S3Config) -> Result<Self> {
        let region = Region::Custom {
            region: config.region,
            endpoint: config.endpoint,
        };

        let credentials = Credentials::new(
            Some(&config.access_key),
            Some(&config.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| anyhow!("Failed to create S3 credentials: {}", e))?;

        let bucket = Bucket::new(&config.bucket, region, credentials)
            .map_err(|e| anyhow!("Failed to create S3 bucket: {}", e))?
            .with_path_style();

        Ok(Self { bucket })
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match self.bucket.get_object(key).await {
            Ok(response) => {
                if response.status_code() == 404 {
                    return Ok(None);
                }
                Ok(Some(response.bytes().to_vec()))
            }
            Err(S3Error::HttpFailWithBody(404, _)) => Ok(None),
            Err(e) => Err(AuditError::StorageFetch(e.to_string()).into()),
        }
    }

    async fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<()> {
        self.bucket
            .put_object_with_content_type(key, bytes, content_type)
            .await
            .map_err(|e| anyhow!("Failed to upload to storage: {}", e))?;
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let pages = self
            .bucket
            .list(prefix.to_string(), None)
            .await
            .map_err(|e| AuditError::StorageFetch(e.to_string()))?;

        Ok(pages
            .into_iter()
            .flat_map(|page| page.contents)
            .map(|object| object.key)
            .collect())
    }
}

/// In-memory blob store for tests, with knobs to inject failures
#[derive(Default)]
pub struct MemoryBlobStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    failing_keys: Mutex<HashSet<String>>,
    list_failures: AtomicUsize,
    fail_puts: AtomicBool,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: &str, bytes: &[u8]) {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), bytes.to_vec());
    }

    /// Make subsequent `get` calls for `key` fail
    pub fn fail_key(&self, key: &str) {
        self.failing_keys.lock().unwrap().insert(key.to_string());
    }

    /// Make the next `count` list calls fail
    pub fn fail_next_lists(&self, count: usize) {
        self.list_failures.store(count, Ordering::SeqCst);
    }

    /// Make all `put` calls fail
    pub fn fail_puts(&self) {
        self.fail_puts.store(true, Ordering::SeqCst);
    }

    pub fn get_blocking(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        if self.failing_keys.lock().unwrap().contains(key) {
            return Err(anyhow!("injected storage failure for {}", key));
        }
        Ok(self.objects.lock().unwrap().get(key).cloned())
    }

    async fn put(&self, key: &str, bytes: &[u8], _content_type: &str) -> Result<()> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(anyhow!("injected storage write failure"));
        }
        self.insert(key, bytes);
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let remaining = self.list_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.list_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(anyhow!("injected list failure"));
        }
        Ok(self
            .objects
            .lock()
            .unwrap()
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_plain_path() {
        assert_eq!(
            sanitize_url_path("https://example.com/blog/post-1"),
            "blog_post-1"
        );
    }

    #[test]
    fn test_sanitize_root_path_is_index() {
        assert_eq!(sanitize_url_path("https://example.com"), "index");
        assert_eq!(sanitize_url_path("https://example.com/"), "index");
    }

    #[test]
    fn test_sanitize_folds_unsafe_characters() {
        assert_eq!(
            sanitize_url_path("https://example.com/a b/c?d"),
            "a_20b_c"
        );
    }

    #[test]
    fn test_sanitize_is_deterministic() {
        let url = "https://example.com/some/deep/path";
        assert_eq!(sanitize_url_path(url), sanitize_url_path(url));
    }

    #[test]
    fn test_snapshot_key_layout() {
        assert_eq!(
            snapshot_key(
                "scrapes",
                "site-1",
                "https://example.com/about",
                SERVER_SNAPSHOT_FILE
            ),
            "scrapes/site-1/about/server-side.html"
        );
    }

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryBlobStore::new();
        store.put("a/b", b"hello", "text/html").await.unwrap();

        assert_eq!(store.get("a/b").await.unwrap(), Some(b"hello".to_vec()));
        assert_eq!(store.get("a/missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_store_list_by_prefix() {
        let store = MemoryBlobStore::new();
        store.insert("scrapes/site-1/a/scrape.json", b"{}");
        store.insert("scrapes/site-1/b/scrape.json", b"{}");
        store.insert("scrapes/site-2/a/scrape.json", b"{}");

        let keys = store.list("scrapes/site-1/").await.unwrap();
        assert_eq!(keys.len(), 2);
    }

    #[tokio::test]
    async fn test_memory_store_injected_failures() {
        let store = MemoryBlobStore::new();
        store.insert("key", b"data");
        store.fail_key("key");
        assert!(store.get("key").await.is_err());

        store.fail_next_lists(1);
        assert!(store.list("").await.is_err());
        assert!(store.list("").await.is_ok());
    }
}
