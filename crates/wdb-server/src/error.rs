// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Server error types

use std::net::SocketAddr;

/// Server result type
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that keep the server from listening. Distinguishes the two bind
/// failures an operator can act on from generic I/O.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("access was denied to listen on {addr}; attempt elevation")]
    PermissionDenied { addr: SocketAddr },

    #[error("another application is already listening on port {port}")]
    AddrInUse { port: u16 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServerError {
    pub fn from_bind_error(err: std::io::Error, addr: SocketAddr) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { addr },
            std::io::ErrorKind::AddrInUse => Self::AddrInUse { port: addr.port() },
            _ => Self::Io(err),
        }
    }
}
