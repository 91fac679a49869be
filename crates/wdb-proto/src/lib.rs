// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! WebDriver Bridge wire protocol
//!
//! Defines the length-prefixed framing used on the TCP channel between the
//! bridge and the remote automation agent, plus the JSON message shapes that
//! travel inside frames. Every message in both directions is
//! `<decimal length>:<UTF-8 payload>`.

pub mod framing;
pub mod messages;

pub use framing::{encode_frame, exchange, read_frame, write_frame, FrameError};
pub use messages::{status, Command, Response};
