// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! A scriptable stand-in for the automation agent.
//!
//! Speaks the agent's side of the wire protocol: each connection serves
//! exactly one framed exchange (read one command frame, reply one response
//! frame, close). By default it answers `newSession` with the redirect status
//! and a fresh session id, and everything else with a success/null response;
//! tests can script per-command responses and inspect every command the
//! agent decoded.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use uuid::Uuid;

use wdb_proto::{read_frame, status, write_frame, Command, Response};

#[derive(Default)]
pub struct MockAgent {
    scripted: HashMap<String, Response>,
}

impl MockAgent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the default response for `command` with a canned one.
    pub fn script(mut self, command: impl Into<String>, response: Response) -> Self {
        self.scripted.insert(command.into(), response);
        self
    }

    /// Binds an ephemeral port and starts serving exchanges.
    pub async fn spawn(self) -> std::io::Result<MockAgentHandle> {
        self.spawn_on("127.0.0.1:0".parse().expect("literal addr")).await
    }

    /// Binds `addr` and starts serving exchanges.
    pub async fn spawn_on(self, addr: SocketAddr) -> std::io::Result<MockAgentHandle> {
        let listener = TcpListener::bind(addr).await?;
        let addr = listener.local_addr()?;
        let received = Arc::new(Mutex::new(Vec::new()));
        let scripted = Arc::new(self.scripted);

        let task_received = received.clone();
        let handle = tokio::spawn(async move {
            loop {
                let (socket, peer) = match listener.accept().await {
                    Ok(accepted) => accepted,
                    Err(err) => {
                        tracing::warn!("accept failed: {}", err);
                        continue;
                    }
                };
                tracing::debug!("connection from {}", peer);
                let scripted = scripted.clone();
                let received = task_received.clone();
                tokio::spawn(async move {
                    if let Err(err) = serve_exchange(socket, &scripted, &received).await {
                        tracing::warn!("exchange failed: {}", err);
                    }
                });
            }
        });

        tracing::info!("mock agent listening on {}", addr);
        Ok(MockAgentHandle {
            addr,
            received,
            handle,
        })
    }
}

async fn serve_exchange(
    mut socket: TcpStream,
    scripted: &HashMap<String, Response>,
    received: &Mutex<Vec<Command>>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let raw = read_frame(&mut socket).await?;
    let command = Command::from_wire(&raw)?;
    tracing::info!("received [{}]", command.name);

    let response = match scripted.get(&command.name) {
        Some(canned) => canned.clone(),
        None => default_response(&command),
    };
    received.lock().await.push(command);

    write_frame(&mut socket, &response.to_wire()?).await?;
    Ok(())
}

fn default_response(command: &Command) -> Response {
    if command.name == "newSession" {
        Response {
            status: status::SESSION_CREATED,
            value: Value::String(Uuid::new_v4().to_string()),
        }
    } else {
        Response::success(Value::Null)
    }
}

/// A running mock agent.
pub struct MockAgentHandle {
    addr: SocketAddr,
    received: Arc<Mutex<Vec<Command>>>,
    handle: JoinHandle<()>,
}

impl MockAgentHandle {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Every command decoded so far, in arrival order.
    pub async fn received(&self) -> Vec<Command> {
        self.received.lock().await.clone()
    }

    pub fn abort(&self) {
        self.handle.abort();
    }
}

impl Drop for MockAgentHandle {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
