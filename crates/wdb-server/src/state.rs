// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Shared request-handler state

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;

use wdb_core::{CommandExecutor, RoutingTable};

use crate::config::ServerConfig;

/// State shared by all request handlers. The routing table is immutable; the
/// executor serializes internally.
#[derive(Clone)]
pub struct AppState {
    pub table: Arc<RoutingTable>,
    pub executor: Arc<CommandExecutor>,
    pub config: ServerConfig,

    /// Raising a shutdown request stops the accept loop after in-flight
    /// responses are written.
    pub shutdown: UnboundedSender<()>,
}
