// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! WebDriver Bridge core
//!
//! The command catalog, the routing table that matches HTTP requests against
//! it, the command executor that owns session state and forwards commands to
//! the automation agent, and the device-target seam through which sessions
//! are established and torn down.

pub mod catalog;
pub mod executor;
pub mod routing;
pub mod target;

pub use catalog::{CommandSpec, Method, CATALOG};
pub use executor::{AgentTransport, CommandExecutor, TcpTransport};
pub use routing::{RouteMatch, RoutingTable};
pub use target::{AgentEndpoint, DeviceTarget, StaticTarget, StatusSender, TargetError};
