// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Server configuration

use std::net::{IpAddr, SocketAddr};

/// Bridge server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the listener to
    pub bind_addr: IpAddr,

    /// Port to listen on
    pub port: u16,

    /// Base path under which the command URLs are served. Stored normalized
    /// with a leading and trailing slash; the empty path becomes `/`.
    pub url_path: String,

    /// When set, a SHUTDOWN URL is logged and answered but does not stop the
    /// server.
    pub ignore_remote_shutdown: bool,
}

impl ServerConfig {
    pub fn bind_socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }

    /// Normalizes a user-supplied base path to `/.../` form.
    pub fn normalize_url_path(path: &str) -> String {
        let trimmed = path.trim_matches('/');
        if trimmed.is_empty() {
            "/".to_string()
        } else {
            format!("/{}/", trimmed)
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".parse().expect("literal addr"),
            port: 7332,
            url_path: "/".to_string(),
            ignore_remote_shutdown: false,
        }
    }
}
