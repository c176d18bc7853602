// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Shared packet types for the APRX packet-routing engine: the AX.25
//! address codec, the packet buffer, KISS/SMACK framing, and the common
//! error taxonomy every other `aprx-*` crate builds on.

pub mod ax25;
pub mod error;
pub mod kiss;
pub mod pbuf;

pub use ax25::{Ax25Address, Ax25Path};
pub use error::{AprxError, AprxErrorKind, DropReason};
pub use pbuf::{PBuf, PbufOrigin};

/// Convenience alias for ambient glue code that just wants to bubble an
/// error up, mirroring `trx_core::DynResult`.
pub type DynResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Stable index into an `aprx-server` runtime context's interface table.
///
/// Interfaces, digipeaters and sources form a reference cycle in the data
/// model (§3/§9); rather than modeling that with owning `Rc`/`Weak` pairs,
/// every cross-reference is one of these small `Copy` indices into a vector
/// the runtime context owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InterfaceIndex(pub u32);

/// Stable index into an `aprx-server` runtime context's digipeater table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DigipeaterIndex(pub u32);

/// Small integer aggregating interfaces that count as a single "heard here"
/// domain for Tx-iGate decisions. `0` is reserved for "heard from APRS-IS".
pub type IfGroup = u16;

/// The distinguished ifgroup meaning "heard from APRS-IS" (§4.5).
pub const IFGROUP_APRSIS: IfGroup = 0;
