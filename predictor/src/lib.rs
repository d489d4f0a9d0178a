// Copyright (c) Soma Contributors
// SPDX-License-Identifier: Apache-2.0

pub mod app_state;
pub mod errors;
pub mod handler;
pub mod logging;
pub mod predictor_config;
pub mod predictor_types;
pub mod server;
