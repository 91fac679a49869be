// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! The device-target seam.
//!
//! The executor never provisions the automation agent itself; it asks a
//! [`DeviceTarget`] to do it. The only shipped implementation is
//! [`StaticTarget`], which points at an agent already running on a fixed
//! endpoint. Targets report human-readable progress through a status channel
//! the server logs.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::mpsc::UnboundedSender;

/// Channel on which targets publish progress text for the operator log.
pub type StatusSender = UnboundedSender<String>;

/// Where the automation agent listens for framed commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentEndpoint {
    pub address: String,
    pub port: u16,
}

impl std::fmt::Display for AgentEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.address, self.port)
    }
}

#[derive(Debug, Error)]
pub enum TargetError {
    #[error("target is unreachable: {0}")]
    Unreachable(String),

    #[error("target preparation failed: {0}")]
    ConnectFailed(String),
}

/// Supplies, establishes, and tears down automation sessions.
#[async_trait]
pub trait DeviceTarget: Send + Sync {
    /// One-time preparation before the server starts taking requests.
    /// Failure here is fatal at startup.
    async fn connect(&self) -> Result<(), TargetError>;

    /// Called on every `newSession`; returns the agent endpoint the session's
    /// commands should be forwarded to. May retry internally.
    async fn establish_session(&self) -> Result<AgentEndpoint, TargetError>;

    /// Called on quit/close. Infallible by contract: implementations swallow
    /// and log their own failures.
    async fn teardown_session(&self);
}

/// A target whose agent is already running on a known endpoint.
///
/// `establish_session` verifies the agent is actually reachable with a short
/// bounded TCP probe, so a `newSession` against a dead endpoint fails with a
/// session-not-created error instead of failing later mid-command.
pub struct StaticTarget {
    endpoint: AgentEndpoint,
    status: Option<StatusSender>,
    probe_attempts: u32,
    probe_interval: Duration,
}

impl StaticTarget {
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self {
            endpoint: AgentEndpoint {
                address: address.into(),
                port,
            },
            status: None,
            probe_attempts: 3,
            probe_interval: Duration::from_millis(250),
        }
    }

    /// Attaches a status channel; progress text is published there instead of
    /// being logged directly.
    pub fn with_status_updates(mut self, sender: StatusSender) -> Self {
        self.status = Some(sender);
        self
    }

    fn report(&self, text: String) {
        match &self.status {
            Some(sender) => {
                // Receiver dropped means nobody is listening anymore.
                let _ = sender.send(text);
            }
            None => tracing::info!("{}", text),
        }
    }
}

#[async_trait]
impl DeviceTarget for StaticTarget {
    async fn connect(&self) -> Result<(), TargetError> {
        self.report(format!("Using agent at {}", self.endpoint));
        Ok(())
    }

    async fn establish_session(&self) -> Result<AgentEndpoint, TargetError> {
        let mut last_error = String::new();
        for attempt in 1..=self.probe_attempts {
            self.report(format!(
                "Probing agent at {} (attempt {}/{})",
                self.endpoint, attempt, self.probe_attempts
            ));
            match TcpStream::connect((self.endpoint.address.as_str(), self.endpoint.port)).await {
                Ok(_) => {
                    self.report(format!("Agent at {} is reachable", self.endpoint));
                    return Ok(self.endpoint.clone());
                }
                Err(err) => {
                    last_error = err.to_string();
                    tokio::time::sleep(self.probe_interval).await;
                }
            }
        }
        Err(TargetError::Unreachable(format!(
            "no agent answered at {}: {}",
            self.endpoint, last_error
        )))
    }

    async fn teardown_session(&self) {
        self.report(format!("Session against {} ended", self.endpoint));
    }
}
