// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Byte-level interface transports: the collaborator `aprx_core::kiss`
//! leaves external. A `Transport` owns exactly one device connection and
//! knows how to frame/deframe it; it has no routing knowledge.

use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use aprx_core::error::AprxError;
use aprx_core::kiss;

/// A decoded AX.25 frame body (address chain + control/PID + info), still
/// raw bytes — interpretation into a `PBuf` happens one layer up.
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub bytes: Vec<u8>,
}

type TransportFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, AprxError>> + Send + 'a>>;

/// Scan `buf` for a complete `FEND ... FEND` frame, decode it, and drain
/// the consumed bytes (including any leading noise before the opening
/// `FEND`). Returns `None` if no complete frame is buffered yet.
fn take_frame_from_buffer(buf: &mut Vec<u8>) -> Option<RawFrame> {
    loop {
        let start = buf.iter().position(|&b| b == 0xC0)?;
        let end = buf[start + 1..]
            .iter()
            .position(|&b| b == 0xC0)
            .map(|i| start + 1 + i)?;
        let body = buf[start + 1..end].to_vec();
        buf.drain(..=end);
        if body.is_empty() {
            continue;
        }
        if let Some((_, payload, _)) = kiss::parse_frame(&body) {
            return Some(RawFrame { bytes: payload });
        }
    }
}

pub trait Transport: Send {
    /// Receive the next complete frame, or `None` on clean EOF.
    fn recv<'a>(&'a mut self) -> TransportFuture<'a, Option<RawFrame>>;

    /// Send one frame.
    fn send<'a>(&'a mut self, frame: &'a [u8]) -> TransportFuture<'a, ()>;

    /// Issue a KISS poll if the configured interval has elapsed since the
    /// last one. A no-op for transports without a poll concept. Never
    /// called while an outbound write is pending (see DESIGN.md's Open
    /// Question on KISS poll cadence).
    fn maybe_poll<'a>(&'a mut self) -> TransportFuture<'a, ()> {
        Box::pin(std::future::ready(Ok(())))
    }
}

/// A sink-only interface with no backing device: frames queued to it are
/// silently discarded. Used for `kind = "null"` interfaces in tests and
/// for digipeater-only configs with no RF leg.
#[derive(Debug, Default)]
pub struct NullTransport;

impl Transport for NullTransport {
    fn recv<'a>(&'a mut self) -> TransportFuture<'a, Option<RawFrame>> {
        Box::pin(std::future::pending())
    }

    fn send<'a>(&'a mut self, _frame: &'a [u8]) -> TransportFuture<'a, ()> {
        Box::pin(std::future::ready(Ok(())))
    }
}

/// A KISS TNC reached over a plain TCP socket (as `kissattach`-style
/// software TNCs and many hardware bridges expose).
pub struct TcpKissTransport {
    stream: TcpStream,
    read_buf: Vec<u8>,
    poll_interval: Duration,
    last_poll: Instant,
    port: u8,
}

impl TcpKissTransport {
    pub async fn connect(host: &str, port: u16, poll_interval: Duration) -> Result<Self, AprxError> {
        let stream = TcpStream::connect((host, port))
            .await
            .map_err(|e| AprxError::transient(format!("connect to {host}:{port} failed: {e}")))?;
        Ok(TcpKissTransport {
            stream,
            read_buf: Vec::new(),
            poll_interval,
            last_poll: Instant::now(),
            port: 0,
        })
    }

    /// Pull bytes off the socket until a complete `FEND ... FEND` frame is
    /// buffered, then split it off and decode it.
    fn try_take_frame(&mut self) -> Option<RawFrame> {
        take_frame_from_buffer(&mut self.read_buf)
    }

    async fn recv_impl(&mut self) -> Result<Option<RawFrame>, AprxError> {
        loop {
            if let Some(frame) = self.try_take_frame() {
                return Ok(Some(frame));
            }
            let mut chunk = [0u8; 4096];
            let n = self
                .stream
                .read(&mut chunk)
                .await
                .map_err(|e| AprxError::transient(format!("kiss tcp read failed: {e}")))?;
            if n == 0 {
                return Ok(None);
            }
            self.read_buf.extend_from_slice(&chunk[..n]);
        }
    }

    async fn send_impl(&mut self, frame: &[u8]) -> Result<(), AprxError> {
        let out = kiss::build_frame(self.port, 0, frame, false);
        self.stream
            .write_all(&out)
            .await
            .map_err(|e| AprxError::transient(format!("kiss tcp write failed: {e}")))
    }

    async fn maybe_poll_impl(&mut self) -> Result<(), AprxError> {
        if self.last_poll.elapsed() < self.poll_interval {
            return Ok(());
        }
        let poll = kiss::build_frame(self.port, 0xE, &[], false);
        self.stream
            .write_all(&poll)
            .await
            .map_err(|e| AprxError::transient(format!("kiss poll write failed: {e}")))?;
        self.last_poll = Instant::now();
        Ok(())
    }
}

impl Transport for TcpKissTransport {
    fn recv<'a>(&'a mut self) -> TransportFuture<'a, Option<RawFrame>> {
        Box::pin(self.recv_impl())
    }

    fn send<'a>(&'a mut self, frame: &'a [u8]) -> TransportFuture<'a, ()> {
        Box::pin(self.send_impl(frame))
    }

    fn maybe_poll<'a>(&'a mut self) -> TransportFuture<'a, ()> {
        Box::pin(self.maybe_poll_impl())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_extraction_matches_kiss_parse_frame() {
        let payload = b"N0CALL>APRS:test";
        let mut buf = kiss::build_frame(0, 0, payload, false);
        let frame = take_frame_from_buffer(&mut buf).unwrap();
        assert_eq!(frame.bytes, payload);
        assert!(buf.is_empty());
    }

    #[test]
    fn partial_frame_yields_nothing() {
        let mut buf = vec![0xC0, 0x00, b'h', b'i'];
        assert!(take_frame_from_buffer(&mut buf).is_none());
    }
}
