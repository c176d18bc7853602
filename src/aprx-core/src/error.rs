// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Error taxonomy for the packet-routing engine.
//!
//! Most drop decisions in this engine are not errors in the `std::error`
//! sense — a rejected filter match or a recognized duplicate is the
//! pipeline working as intended. Those are reported as [`DropReason`], a
//! plain enum consumed by logging/counters. [`AprxError`] is reserved for
//! the smaller set of genuinely exceptional conditions (bad config,
//! resource exhaustion at allocation time).

use std::fmt;

/// Why a packet was not forwarded. Not an `Error` impl: this is an outcome,
/// not a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Bad AX.25 address byte, non-terminated TNC2 frame, invalid callsign
    /// character.
    InputMalformed,
    /// Explicit negative filter match, or an implicit Tx-iGate rule
    /// failure.
    FilterReject,
    /// Recognized duplicate within the retention window.
    DupeReject,
    /// Hop-count budget exceeded and the packet was not probably heard
    /// directly.
    HopBudgetExceeded,
    /// A reserved callsign (`N0CALL`, `NOCALL`, or the digipeater's own
    /// transmitter callsign) appeared as a source, destination, or via
    /// field.
    RoutingLoop,
    /// Outbound write buffer full; the frame is dropped rather than
    /// blocking the caller.
    TxCapacityExhausted,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DropReason::InputMalformed => "input malformed",
            DropReason::FilterReject => "filter reject",
            DropReason::DupeReject => "dupe reject",
            DropReason::HopBudgetExceeded => "hop budget exceeded",
            DropReason::RoutingLoop => "routing loop",
            DropReason::TxCapacityExhausted => "tx capacity exhausted",
        };
        f.write_str(s)
    }
}

/// Coarse classification of [`AprxError`], used to decide whether a caller
/// should retry, reconnect, or give up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AprxErrorKind {
    /// Worth retrying: transient I/O, a socket that will reconnect.
    Transient,
    /// Not worth retrying without operator intervention: bad config,
    /// unsupported interface kind.
    Fatal,
}

/// The engine's catch-all error type for conditions that are not simple
/// drop decisions.
#[derive(Debug, Clone)]
pub struct AprxError {
    message: String,
    kind: AprxErrorKind,
}

impl AprxError {
    pub fn new(kind: AprxErrorKind, message: impl Into<String>) -> Self {
        AprxError {
            message: message.into(),
            kind,
        }
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self::new(AprxErrorKind::Transient, message)
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self::new(AprxErrorKind::Fatal, message)
    }

    /// A PBuf over the 2100-byte storage budget was refused at allocation;
    /// counted as runtime resource exhaustion, not a process-ending fault.
    pub fn pbuf_too_large(len: usize) -> Self {
        Self::transient(format!("pbuf storage request of {len} bytes exceeds 2100 byte budget"))
    }

    pub fn unsupported(what: impl Into<String>) -> Self {
        Self::fatal(format!("unsupported: {}", what.into()))
    }

    pub fn kind(&self) -> AprxErrorKind {
        self.kind
    }

    pub fn is_transient(&self) -> bool {
        matches!(self.kind, AprxErrorKind::Transient)
    }
}

impl fmt::Display for AprxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AprxError {}

impl From<String> for AprxError {
    fn from(message: String) -> Self {
        AprxError::fatal(message)
    }
}

impl From<&str> for AprxError {
    fn from(message: &str) -> Self {
        AprxError::fatal(message.to_string())
    }
}
