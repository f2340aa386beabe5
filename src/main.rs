// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use prerender_audit::app::{run_audit, AuditConfig, AuditContext, AuditRunStatus, AuditSite, VERSION};
use prerender_audit::services::queue::WebhookQueue;
use prerender_audit::services::repo::{MemoryOpportunityStore, MemorySuggestionStore};
use prerender_audit::services::storage::{S3BlobStore, S3Config};
use prerender_audit::services::top_pages::HttpTopPagesClient;
use std::env;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(default)
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Get configuration from environment variables
    let site_id = env::var("AUDIT_SITE_ID").expect("AUDIT_SITE_ID environment variable must be set");
    let base_url =
        env::var("AUDIT_BASE_URL").expect("AUDIT_BASE_URL environment variable must be set");
    let top_pages_endpoint = env::var("TOP_PAGES_ENDPOINT")
        .expect("TOP_PAGES_ENDPOINT environment variable must be set");
    let guidance_queue_url = env::var("GUIDANCE_QUEUE_URL")
        .expect("GUIDANCE_QUEUE_URL environment variable must be set");

    let mut config = AuditConfig {
        storage_prefix: env::var("AUDIT_STORAGE_PREFIX").unwrap_or_else(|_| "scrapes".to_string()),
        ..AuditConfig::default()
    };
    config.gain_threshold = env_or("AUDIT_THRESHOLD", config.gain_threshold);
    config.max_candidates = env_or("AUDIT_MAX_CANDIDATES", config.max_candidates);
    config.poll_interval = Duration::from_secs(env_or("AUDIT_POLL_INTERVAL_SECS", 30));
    config.max_wait = Duration::from_secs(env_or("AUDIT_MAX_WAIT_SECS", 600));

    let s3_config = S3Config::from_env().expect("S3 configuration incomplete");
    let store = Arc::new(S3BlobStore::new(s3_config).expect("Failed to create S3 storage client"));

    // Opportunity persistence is owned by the hosting audit framework; the
    // standalone binary runs against the in-memory stores and reports its
    // outcome through the status document and the guidance queue.
    let ctx = AuditContext {
        store,
        queue: Arc::new(WebhookQueue::new(guidance_queue_url)),
        opportunities: Arc::new(MemoryOpportunityStore::new()),
        suggestions: Arc::new(MemorySuggestionStore::new()),
        top_pages: Arc::new(HttpTopPagesClient::new(top_pages_endpoint)),
    };

    info!(version = VERSION, site_id = %site_id, "prerender-audit starting");

    let site = AuditSite { site_id, base_url };
    let result = run_audit(&ctx, &config, &site).await;

    match serde_json::to_string(&result) {
        Ok(summary) => info!(summary = %summary, "audit run finished"),
        Err(e) => info!(error = %e, "audit run finished (summary unavailable)"),
    }

    if result.status == AuditRunStatus::Error {
        std::process::exit(1);
    }
}
