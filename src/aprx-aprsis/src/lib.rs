// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Reconnecting APRS-IS client: state machine plus the `tokio`-task wire
//! protocol driving it.

pub mod client;
pub mod state;

pub use client::{run, AprsIsConfig, IsInbound, IsOutbound, DEFAULT_HEARTBEAT_TIMEOUT, RECONNECT_COOLDOWN};
pub use state::{AprsIsEvent, AprsIsState, AprsIsStateMachine};
