// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Length-prefixed framing over a TCP stream.
//!
//! A frame is the ASCII decimal byte length of the payload, a `:` delimiter,
//! then exactly that many payload bytes: `5:hello`. The empty payload `0:` is
//! legal. The agent serves one request/response exchange per connection and
//! closes afterward, so [`exchange`] opens a fresh connection every time.

use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::Instant;

/// How long to keep retrying zero-byte reads while waiting for the length
/// header before giving up on the peer.
const HEADER_DEADLINE: Duration = Duration::from_secs(15);

/// Sleep between zero-byte header reads.
const HEADER_RETRY_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Error)]
pub enum FrameError {
    /// The peer closed the stream before a complete frame arrived.
    #[error("peer disconnected mid-frame")]
    Disconnected,

    /// The length header or payload is not well formed.
    #[error("malformed frame: {0}")]
    Malformed(String),

    /// No length header arrived within the read deadline.
    #[error("timed out waiting for a frame")]
    Timeout,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Encodes `payload` as a length-prefixed frame.
pub fn encode_frame(payload: &str) -> String {
    format!("{}:{}", payload.len(), payload)
}

/// Writes one frame to `writer` and flushes it.
pub async fn write_frame<W>(writer: &mut W, payload: &str) -> Result<(), FrameError>
where
    W: AsyncWrite + Unpin,
{
    let frame = encode_frame(payload);
    tracing::debug!(">>> {}", frame);
    writer.write_all(frame.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

/// Reads one frame from `reader` and returns its payload.
///
/// The length header is scanned one byte at a time until the `:` delimiter.
/// The peer may accept the connection before it has data ready, so reads that
/// return nothing while still waiting for the first header byte are retried
/// until [`HEADER_DEADLINE`] expires. Once the delimiter is seen the payload
/// is read with as many reads as it takes to obtain exactly the advertised
/// number of bytes.
pub async fn read_frame<R>(reader: &mut R) -> Result<String, FrameError>
where
    R: AsyncRead + Unpin,
{
    let deadline = Instant::now() + HEADER_DEADLINE;
    let mut digits = Vec::new();
    loop {
        let mut byte = [0u8; 1];
        match reader.read(&mut byte).await? {
            0 => {
                if !digits.is_empty() {
                    return Err(FrameError::Disconnected);
                }
                if Instant::now() >= deadline {
                    return Err(FrameError::Timeout);
                }
                tracing::trace!("waiting for data to be available");
                tokio::time::sleep(HEADER_RETRY_INTERVAL).await;
            }
            _ if byte[0] == b':' => break,
            _ if byte[0].is_ascii_digit() => digits.push(byte[0]),
            _ => {
                return Err(FrameError::Malformed(format!(
                    "unexpected byte 0x{:02x} in length header",
                    byte[0]
                )));
            }
        }
    }

    if digits.is_empty() {
        return Err(FrameError::Malformed("empty length header".to_string()));
    }
    // Digits only at this point, so the parse can only fail on overflow.
    let length: usize = std::str::from_utf8(&digits)
        .expect("ASCII digits")
        .parse()
        .map_err(|_| FrameError::Malformed("length header out of range".to_string()))?;

    tracing::trace!("waiting to receive {} bytes", length);
    let mut payload = vec![0u8; length];
    let mut received = 0;
    while received < length {
        match reader.read(&mut payload[received..]).await? {
            0 => return Err(FrameError::Disconnected),
            n => received += n,
        }
    }

    let payload = String::from_utf8(payload)
        .map_err(|err| FrameError::Malformed(format!("payload is not UTF-8: {err}")))?;
    tracing::debug!("<<< {}", payload);
    Ok(payload)
}

/// Performs one request/response exchange with the agent at `addr`.
///
/// Opens a fresh connection, writes the full request frame, then reads exactly
/// one response frame. Strict alternation: no response byte is read until the
/// request frame is fully written.
pub async fn exchange(addr: &str, port: u16, request: &str) -> Result<String, FrameError> {
    tracing::info!("Attempting to connect to {}:{}", addr, port);
    let mut stream = TcpStream::connect((addr, port)).await?;
    write_frame(&mut stream, request).await?;
    let response = read_frame(&mut stream).await?;
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn decode(bytes: &[u8]) -> Result<String, FrameError> {
        let mut reader = std::io::Cursor::new(bytes.to_vec());
        read_frame(&mut reader).await
    }

    #[tokio::test]
    async fn round_trips_ascii_payload() {
        let encoded = encode_frame("hello");
        assert_eq!(encoded, "5:hello");
        assert_eq!(decode(encoded.as_bytes()).await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn round_trips_empty_payload() {
        let encoded = encode_frame("");
        assert_eq!(encoded, "0:");
        assert_eq!(decode(encoded.as_bytes()).await.unwrap(), "");
    }

    #[tokio::test]
    async fn round_trips_payload_containing_delimiter() {
        let payload = r#"{"name":"get","parameters":{"url":"http://x:80"}}"#;
        assert_eq!(decode(encode_frame(payload).as_bytes()).await.unwrap(), payload);
    }

    #[tokio::test]
    async fn length_counts_bytes_not_chars() {
        let payload = "héllo";
        let encoded = encode_frame(payload);
        assert!(encoded.starts_with("6:"));
        assert_eq!(decode(encoded.as_bytes()).await.unwrap(), payload);
    }

    #[tokio::test]
    async fn decodes_byte_at_a_time_delivery() {
        let (client, mut server) = tokio::io::duplex(1);
        let writer = tokio::spawn(async move {
            for byte in b"11:hello:world".iter() {
                server.write_all(&[*byte]).await.unwrap();
                server.flush().await.unwrap();
            }
        });

        let mut client = client;
        let payload = read_frame(&mut client).await.unwrap();
        assert_eq!(payload, "hello:world");
        writer.await.unwrap();
    }

    #[tokio::test]
    async fn eof_before_delimiter_is_disconnected() {
        assert!(matches!(decode(b"12").await, Err(FrameError::Disconnected)));
    }

    #[tokio::test]
    async fn eof_mid_payload_is_disconnected() {
        assert!(matches!(decode(b"10:hel").await, Err(FrameError::Disconnected)));
    }

    #[tokio::test]
    async fn non_digit_header_is_malformed() {
        assert!(matches!(decode(b"1a:xx").await, Err(FrameError::Malformed(_))));
    }

    #[tokio::test]
    async fn missing_length_is_malformed() {
        assert!(matches!(decode(b":xx").await, Err(FrameError::Malformed(_))));
    }

    #[tokio::test]
    async fn non_utf8_payload_is_malformed() {
        assert!(matches!(decode(b"2:\xff\xfe").await, Err(FrameError::Malformed(_))));
    }

    #[tokio::test]
    async fn exchange_writes_request_then_reads_response() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let agent = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_frame(&mut socket).await.unwrap();
            assert_eq!(request, "ping");
            write_frame(&mut socket, "pong").await.unwrap();
        });

        let response = exchange("127.0.0.1", addr.port(), "ping").await.unwrap();
        assert_eq!(response, "pong");
        agent.await.unwrap();
    }

    #[tokio::test]
    async fn exchange_maps_refused_connection_to_io_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        assert!(matches!(
            exchange("127.0.0.1", port, "ping").await,
            Err(FrameError::Io(_))
        ));
    }
}
