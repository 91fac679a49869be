// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! WebDriver Bridge HTTP front end
//!
//! Accepts WebDriver-style HTTP commands, routes them through the command
//! table, and relays them to the automation agent via the command executor.

pub mod config;
pub mod error;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::Server;
pub use state::AppState;
