// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

pub mod analyzer;
pub mod comparator;
pub mod error;
pub mod extract;
pub mod fetcher;
pub mod poller;
pub mod queue;
pub mod repo;
pub mod reporter;
pub mod storage;
pub mod sync;
pub mod top_pages;
