// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! The reconnecting APRS-IS client task.
//!
//! Runs as a plain `tokio::spawn`ed task, the same channel-based split
//! `trx-server::rig_task` uses between a background task and the owning
//! loop: `IsInbound`/`IsOutbound` records cross an `mpsc` pair instead of
//! the original's datagram socketpair.

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::{self, Instant};
use tracing::{debug, info, warn};

use aprx_protocol::LoginLine;

use crate::state::{AprsIsEvent, AprsIsState, AprsIsStateMachine};

/// Fixed reconnect cooldown applied after any close, successful login or
/// not.
pub const RECONNECT_COOLDOWN: Duration = Duration::from_secs(60);

/// Default heartbeat timeout: the server is expected to send at least a
/// comment line this often.
pub const DEFAULT_HEARTBEAT_TIMEOUT: Duration = Duration::from_secs(120);

/// Send-queue budget; beyond this, outbound lines are dropped rather than
/// grown without bound.
pub const SEND_QUEUE_BYTES: usize = 16 * 1024;

/// A line received from the APRS-IS server, already stripped of its
/// trailing CR/LF.
#[derive(Debug, Clone)]
pub struct IsInbound {
    pub tnc2: String,
}

/// A TNC2 line to send upstream, already `qAR`-tagged by the caller.
#[derive(Debug, Clone)]
pub struct IsOutbound {
    pub tnc2: String,
}

/// Static connection parameters for one APRS-IS server.
#[derive(Debug, Clone)]
pub struct AprsIsConfig {
    pub host: String,
    pub port: u16,
    pub login: String,
    pub software_name: String,
    pub software_version: String,
    pub filter: Option<String>,
    pub heartbeat_timeout: Duration,
}

impl AprsIsConfig {
    fn login_line(&self) -> String {
        LoginLine {
            login: &self.login,
            software_name: &self.software_name,
            software_version: &self.software_version,
            filter: self.filter.as_deref(),
        }
        .build()
    }
}

/// Run the client until `outbound_rx` closes. Reconnects on any I/O error
/// or heartbeat timeout after [`RECONNECT_COOLDOWN`]. Inbound lines are
/// pushed to `inbound_tx`; the caller drives outbound traffic through
/// `outbound_rx`.
pub async fn run(
    config: AprsIsConfig,
    inbound_tx: mpsc::Sender<IsInbound>,
    mut outbound_rx: mpsc::Receiver<IsOutbound>,
) {
    let mut machine = AprsIsStateMachine::new();
    loop {
        machine.process_event(AprsIsEvent::Connected);
        match run_one_session(&config, &mut machine, &inbound_tx, &mut outbound_rx).await {
            Ok(()) => info!("APRS-IS session to {}:{} ended", config.host, config.port),
            Err(err) => warn!("APRS-IS session to {}:{} failed: {}", config.host, config.port, err),
        }
        machine.process_event(AprsIsEvent::Disconnect);
        time::sleep(RECONNECT_COOLDOWN).await;
    }
}

async fn run_one_session(
    config: &AprsIsConfig,
    machine: &mut AprsIsStateMachine,
    inbound_tx: &mpsc::Sender<IsInbound>,
    outbound_rx: &mut mpsc::Receiver<IsOutbound>,
) -> Result<(), String> {
    let stream = TcpStream::connect((config.host.as_str(), config.port))
        .await
        .map_err(|e| format!("connect failed: {e}"))?;
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half).lines();

    write_half
        .write_all(config.login_line().as_bytes())
        .await
        .map_err(|e| format!("login write failed: {e}"))?;
    machine.process_event(AprsIsEvent::LoginAccepted);

    let mut heartbeat = Box::pin(time::sleep(config.heartbeat_timeout));
    let mut pending: Vec<u8> = Vec::new();

    loop {
        tokio::select! {
            line = reader.next_line() => {
                let line = line.map_err(|e| format!("read failed: {e}"))?
                    .ok_or_else(|| "server closed connection".to_string())?;
                machine.process_event(AprsIsEvent::LineReceived);
                heartbeat.as_mut().reset(Instant::now() + config.heartbeat_timeout);
                if let Some(stripped) = line.strip_prefix('#') {
                    debug!("APRS-IS heartbeat/comment: {}", stripped);
                } else if inbound_tx.send(IsInbound { tnc2: line }).await.is_err() {
                    return Ok(());
                }
            }
            outbound = outbound_rx.recv() => {
                let Some(outbound) = outbound else { return Ok(()) };
                queue_outbound(&mut pending, &outbound.tnc2);
                if !pending.is_empty() {
                    write_half
                        .write_all(&pending)
                        .await
                        .map_err(|e| format!("write failed: {e}"))?;
                    pending.clear();
                }
            }
            _ = &mut heartbeat => {
                machine.process_event(AprsIsEvent::HeartbeatTimeout);
                return Err("heartbeat timeout".to_string());
            }
        }
        if matches!(machine.state(), AprsIsState::Disconnected) {
            return Ok(());
        }
    }
}

/// Append `line` to the pending send buffer, dropping (and counting,
/// via the returned bool) if it would overflow [`SEND_QUEUE_BYTES`] even
/// after compaction.
fn queue_outbound(pending: &mut Vec<u8>, line: &str) -> bool {
    if pending.len() + line.len() > SEND_QUEUE_BYTES {
        return false;
    }
    pending.extend_from_slice(line.as_bytes());
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_outbound_appends_within_budget() {
        let mut buf = Vec::new();
        assert!(queue_outbound(&mut buf, "N0CALL>APRS:>hi\r\n"));
        assert_eq!(buf.len(), "N0CALL>APRS:>hi\r\n".len());
    }

    #[test]
    fn queue_outbound_drops_when_over_budget() {
        let mut buf = vec![0u8; SEND_QUEUE_BYTES - 4];
        assert!(!queue_outbound(&mut buf, "this line is too long to fit"));
    }

    #[test]
    fn login_line_is_built_from_config() {
        let cfg = AprsIsConfig {
            host: "rotate.aprs2.net".into(),
            port: 14580,
            login: "N0CALL".into(),
            software_name: "aprx".into(),
            software_version: "1.0".into(),
            filter: None,
            heartbeat_timeout: DEFAULT_HEARTBEAT_TIMEOUT,
        };
        assert_eq!(cfg.login_line(), "user N0CALL pass 13023 vers aprx 1.0\r\n");
    }
}
