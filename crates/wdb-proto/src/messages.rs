// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! JSON message schemas exchanged with the automation agent.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Protocol status codes carried in [`Response::status`].
pub mod status {
    /// The command completed normally.
    pub const SUCCESS: i32 = 0;
    /// A session-scoped command arrived while no session exists.
    pub const NO_SUCH_DRIVER: i32 = 6;
    /// The requested path maps to no known command.
    pub const UNKNOWN_COMMAND: i32 = 9;
    /// The exchange with the agent failed in an unclassified way.
    pub const UNHANDLED_ERROR: i32 = 13;
    /// The agent did not complete the operation in time.
    pub const TIMEOUT: i32 = 21;
    /// The device target could not establish a session.
    pub const SESSION_NOT_CREATED: i32 = 33;
    /// Session created; the HTTP layer turns this into a 303 redirect.
    pub const SESSION_CREATED: i32 = 303;
}

/// A command forwarded to the automation agent.
///
/// Serializes as `{"name": ..., "parameters": {...}}`, the exact shape the
/// agent expects inside a frame. Parameter order is preserved: path
/// variables are inserted before request-body members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub name: String,
    pub parameters: Map<String, Value>,
}

impl Command {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Map::new(),
        }
    }

    /// Serialized wire form of the command.
    pub fn to_wire(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_wire(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}

/// The agent's reply, or a locally produced stand-in for one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub status: i32,
    pub value: Value,
}

impl Response {
    pub fn success(value: Value) -> Self {
        Self {
            status: status::SUCCESS,
            value,
        }
    }

    /// A failure response whose value is a human-readable message.
    pub fn failure(status: i32, message: impl Into<String>) -> Self {
        Self {
            status,
            value: Value::String(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == status::SUCCESS
    }

    pub fn to_wire(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_wire(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn command_serializes_with_exactly_two_fields() {
        let mut command = Command::new("getTitle");
        command
            .parameters
            .insert("SESSIONID".to_string(), json!("s1"));

        let wire = command.to_wire().unwrap();
        assert_eq!(wire, r#"{"name":"getTitle","parameters":{"SESSIONID":"s1"}}"#);
    }

    #[test]
    fn command_parameters_keep_insertion_order() {
        let mut command = Command::new("sendKeysToElement");
        command.parameters.insert("SESSIONID".to_string(), json!("s1"));
        command.parameters.insert("ID".to_string(), json!("e1"));
        command.parameters.insert("value".to_string(), json!(["a"]));

        let keys: Vec<&str> = command.parameters.keys().map(String::as_str).collect();
        assert_eq!(keys, ["SESSIONID", "ID", "value"]);
    }

    #[test]
    fn response_round_trips_through_wire_form() {
        let response = Response {
            status: status::SESSION_CREATED,
            value: json!("abc123"),
        };
        let wire = response.to_wire().unwrap();
        assert_eq!(Response::from_wire(&wire).unwrap(), response);
    }

    #[test]
    fn failure_carries_the_message_as_value() {
        let response = Response::failure(status::NO_SUCH_DRIVER, "no session");
        assert!(!response.is_success());
        assert_eq!(response.value, json!("no session"));
    }
}
