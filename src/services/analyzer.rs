// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Content-gain scoring between a server-rendered and a client-rendered
//! snapshot of the same page.

use crate::services::error::AuditError;
use crate::services::extract::extract;

/// Default gain threshold above which a page is flagged for prerendering
pub const DEFAULT_GAIN_THRESHOLD: f64 = 1.2;

/// Measured gain between two snapshots of one page
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContentGain {
    pub word_count_before: u32,
    pub word_count_after: u32,
    pub content_gain_ratio: f64,
    pub needs_prerender: bool,
}

/// Score the content gain from `server_html` to `client_html`.
///
/// The single validation gate: an empty snapshot on either side is
/// `AuditError::MissingContent`; any other input shape is accepted.
///
/// Ratio rules: `after / before` in the normal case. When the server
/// snapshot has zero words the ratio is exactly 1 if the client snapshot is
/// also empty, otherwise `after + 1` so any gain from nothing scores
/// strictly above 1. A NaN threshold never flags a page (comparisons with
/// NaN are false).
pub fn analyze(
    server_html: &str,
    client_html: &str,
    threshold: f64,
) -> Result<ContentGain, AuditError> {
    if server_html.is_empty() || client_html.is_empty() {
        return Err(AuditError::MissingContent);
    }

    let word_count_before = extract(server_html).word_count;
    let word_count_after = extract(client_html).word_count;

    let content_gain_ratio = if word_count_before == 0 {
        if word_count_after == 0 {
            1.0
        } else {
            f64::from(word_count_after) + 1.0
        }
    } else {
        f64::from(word_count_after) / f64::from(word_count_before)
    };

    Ok(ContentGain {
        word_count_before,
        word_count_after,
        content_gain_ratio,
        needs_prerender: content_gain_ratio > threshold,
    })
}
