// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Prerender audit agent: compares server-rendered and client-rendered HTML
//! snapshots of a site's top pages and turns substantial content gains into
//! persistent opportunity/suggestion records.

pub mod app;
pub mod models;
pub mod services;
