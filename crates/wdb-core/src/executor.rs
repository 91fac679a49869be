// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Command execution and session state.
//!
//! The executor owns the one session the bridge can have at a time. It
//! answers `status` locally, establishes a session through the device target
//! on `newSession`, gates everything else on an active session, and forwards
//! active-session commands to the agent one framed exchange at a time.
//!
//! The front end accepts requests concurrently but commands are applied here
//! strictly one at a time: the session lock is held for the whole command,
//! including the downstream exchange, so racing requests are serialized in
//! arrival order and frames never interleave.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::Mutex;

use wdb_proto::{status, Command, FrameError, Response};

use crate::catalog::commands;
use crate::target::{AgentEndpoint, DeviceTarget};

/// The downstream exchange seam. Production uses [`TcpTransport`]; tests
/// substitute fakes to observe or forbid downstream traffic.
#[async_trait]
pub trait AgentTransport: Send + Sync {
    async fn exchange(&self, endpoint: &AgentEndpoint, request: &str)
        -> Result<String, FrameError>;
}

/// One fresh TCP connection per command, as the agent expects.
pub struct TcpTransport;

#[async_trait]
impl AgentTransport for TcpTransport {
    async fn exchange(
        &self,
        endpoint: &AgentEndpoint,
        request: &str,
    ) -> Result<String, FrameError> {
        wdb_proto::exchange(&endpoint.address, endpoint.port, request).await
    }
}

enum SessionState {
    Idle,
    Active {
        endpoint: AgentEndpoint,
        session_id: Option<String>,
    },
}

pub struct CommandExecutor {
    target: Arc<dyn DeviceTarget>,
    transport: Arc<dyn AgentTransport>,
    session: Mutex<SessionState>,
}

impl CommandExecutor {
    pub fn new(target: Arc<dyn DeviceTarget>) -> Self {
        Self::with_transport(target, Arc::new(TcpTransport))
    }

    pub fn with_transport(target: Arc<dyn DeviceTarget>, transport: Arc<dyn AgentTransport>) -> Self {
        Self {
            target,
            transport,
            session: Mutex::new(SessionState::Idle),
        }
    }

    /// Executes one command and always produces a protocol [`Response`];
    /// transport and target failures are folded into failure statuses rather
    /// than surfaced as errors.
    pub async fn execute(&self, command: &Command) -> Response {
        if command.name == commands::STATUS {
            return Self::status_response();
        }

        let mut session = self.session.lock().await;

        if command.name == commands::NEW_SESSION {
            // Establish (or re-establish) before forwarding; the agent itself
            // answers newSession with the redirect status and session id.
            match self.target.establish_session().await {
                Ok(endpoint) => {
                    *session = SessionState::Active {
                        endpoint,
                        session_id: None,
                    };
                }
                Err(err) => {
                    return Response::failure(
                        status::SESSION_NOT_CREATED,
                        format!("Unable to create session: {err}"),
                    );
                }
            }
        }

        let endpoint = match &*session {
            SessionState::Active { endpoint, .. } => endpoint.clone(),
            SessionState::Idle => {
                if command.name == commands::QUIT || command.name == commands::CLOSE {
                    return Response::success(Value::Null);
                }
                return Response::failure(
                    status::NO_SUCH_DRIVER,
                    "Driver does not have an active session.",
                );
            }
        };

        let response = self.forward(&endpoint, command).await;

        if command.name == commands::NEW_SESSION {
            if let SessionState::Active { session_id, .. } = &mut *session {
                if let Value::String(id) = &response.value {
                    tracing::info!("Session {} established against {}", id, endpoint);
                    *session_id = Some(id.clone());
                }
            }
        }

        // Teardown is unconditional on quit/close, even when the exchange
        // failed, and must never fail the response.
        if command.name == commands::QUIT || command.name == commands::CLOSE {
            self.target.teardown_session().await;
            *session = SessionState::Idle;
        }

        response
    }

    async fn forward(&self, endpoint: &AgentEndpoint, command: &Command) -> Response {
        let wire = match command.to_wire() {
            Ok(wire) => wire,
            Err(err) => {
                return Response::failure(
                    status::UNHANDLED_ERROR,
                    format!("Unable to serialize command: {err}"),
                );
            }
        };

        match self.transport.exchange(endpoint, &wire).await {
            Ok(raw) => Response::from_wire(&raw).unwrap_or_else(|err| {
                Response::failure(
                    status::UNHANDLED_ERROR,
                    format!("Agent returned an unparseable response: {err}"),
                )
            }),
            Err(err) => Response::failure(
                status::UNHANDLED_ERROR,
                format!("Exchange with agent at {endpoint} failed: {err}"),
            ),
        }
    }

    fn status_response() -> Response {
        Response::success(json!({
            "build": { "version": env!("CARGO_PKG_VERSION") },
            "os": { "name": std::env::consts::OS, "arch": std::env::consts::ARCH },
        }))
    }
}
