// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use thiserror::Error;

/// Error taxonomy of the audit pipeline.
///
/// `MissingContent` and `StorageFetch` are per-candidate conditions that are
/// captured into findings and never abort a batch. `Synchronization` is fatal
/// for a run: without the opportunity record the rest of the pipeline is
/// meaningless.
#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Missing HTML content for comparison")]
    MissingContent,

    #[error("Storage fetch error: {0}")]
    StorageFetch(String),

    #[error("Synchronization error: {0}")]
    Synchronization(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
