// Copyright (c) Soma Contributors
// SPDX-License-Identifier: Apache-2.0

pub mod config;
pub mod error;

/// Number of features every prediction request must carry.
pub const FEATURE_COUNT: usize = 11;
