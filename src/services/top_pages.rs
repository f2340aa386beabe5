// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Source of a site's top pages by organic traffic.

use crate::models::candidate::CandidateUrl;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::Deserialize;

/// External top-pages metadata source
#[async_trait]
pub trait TopPagesSource: Send + Sync {
    async fn top_pages(&self, site_id: &str) -> Result<Vec<CandidateUrl>>;
}

#[derive(Debug, Deserialize)]
struct TopPagesResponse {
    #[serde(default)]
    pages: Vec<CandidateUrl>,
}

/// HTTP client for the top-pages service
pub struct HttpTopPagesClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTopPagesClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl TopPagesSource for HttpTopPagesClient {
    async fn top_pages(&self, site_id: &str) -> Result<Vec<CandidateUrl>> {
        let url = format!(
            "{}/{}/top-pages",
            self.endpoint.trim_end_matches('/'),
            site_id
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| anyhow!("Failed to fetch top pages: {}", e))?
            .error_for_status()
            .map_err(|e| anyhow!("Top pages request failed: {}", e))?;

        let body: TopPagesResponse = response
            .json()
            .await
            .map_err(|e| anyhow!("Invalid top pages response: {}", e))?;
        Ok(body.pages)
    }
}

/// Fixed candidate list for tests and standalone runs
#[derive(Default)]
pub struct StaticTopPages {
    pages: Vec<CandidateUrl>,
}

impl StaticTopPages {
    pub fn new(pages: Vec<CandidateUrl>) -> Self {
        Self { pages }
    }
}

#[async_trait]
impl TopPagesSource for StaticTopPages {
    async fn top_pages(&self, _site_id: &str) -> Result<Vec<CandidateUrl>> {
        Ok(self.pages.clone())
    }
}
