// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

pub mod candidate;
pub mod finding;
pub mod guidance;
pub mod opportunity;
pub mod snapshot;
pub mod status;
