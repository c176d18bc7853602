// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! APRS-IS connection state machine.
//!
//! Explicit states rather than a bare `enum Connected/Disconnected` so a
//! caller can tell "logged in, waiting for the server's own heartbeat" apart
//! from "actively relaying traffic" without guessing from side state.

use std::fmt;
use std::time::Instant;

/// Events that drive the APRS-IS client's state transitions.
#[derive(Debug, Clone)]
pub enum AprsIsEvent {
    /// TCP connection established; login line has been written.
    Connected,
    /// Server accepted the login (first non-comment line, or any line
    /// after the login banner — the wire protocol has no explicit ack).
    LoginAccepted,
    /// A data or comment line arrived.
    LineReceived,
    /// `now - last_read` exceeded the heartbeat timeout.
    HeartbeatTimeout,
    /// The socket read or write failed.
    IoError(String),
    /// Caller requested a clean shutdown.
    Disconnect,
}

/// The current state of an [`AprsIsStateMachine`].
#[derive(Debug, Clone)]
pub enum AprsIsState {
    /// Not connected; waiting for the next reconnect attempt.
    Disconnected,
    /// TCP connect in flight.
    Connecting,
    /// Connected and the login line has been sent; waiting for the first
    /// line back from the server.
    LoggedIn,
    /// Receiving and relaying traffic normally.
    Active { last_read: Instant },
}

impl fmt::Display for AprsIsState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connecting => write!(f, "Connecting"),
            Self::LoggedIn => write!(f, "LoggedIn"),
            Self::Active { .. } => write!(f, "Active"),
        }
    }
}

impl AprsIsState {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active { .. })
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, Self::LoggedIn | Self::Active { .. })
    }
}

/// Drives [`AprsIsState`] transitions from [`AprsIsEvent`]s, the same shape
/// as the rig controller's state machine: `process_event` mutates in place
/// and reports whether a transition actually happened.
#[derive(Debug, Clone)]
pub struct AprsIsStateMachine {
    state: AprsIsState,
    transition_count: u64,
}

impl Default for AprsIsStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl AprsIsStateMachine {
    pub fn new() -> Self {
        AprsIsStateMachine {
            state: AprsIsState::Disconnected,
            transition_count: 0,
        }
    }

    pub fn state(&self) -> &AprsIsState {
        &self.state
    }

    pub fn transition_count(&self) -> u64 {
        self.transition_count
    }

    /// Process an event and potentially transition. Returns `true` if a
    /// transition occurred.
    pub fn process_event(&mut self, event: AprsIsEvent) -> bool {
        match self.next_state(event) {
            Some(state) => {
                self.state = state;
                self.transition_count += 1;
                true
            }
            None => false,
        }
    }

    fn next_state(&self, event: AprsIsEvent) -> Option<AprsIsState> {
        match (&self.state, event) {
            (AprsIsState::Disconnected, AprsIsEvent::Connected) => Some(AprsIsState::Connecting),
            (AprsIsState::Connecting, AprsIsEvent::LoginAccepted) => Some(AprsIsState::LoggedIn),
            (AprsIsState::LoggedIn, AprsIsEvent::LineReceived) => Some(AprsIsState::Active {
                last_read: Instant::now(),
            }),
            (AprsIsState::Active { .. }, AprsIsEvent::LineReceived) => {
                Some(AprsIsState::Active {
                    last_read: Instant::now(),
                })
            }
            (AprsIsState::Active { .. }, AprsIsEvent::HeartbeatTimeout) => {
                Some(AprsIsState::Disconnected)
            }
            (_, AprsIsEvent::IoError(_)) => Some(AprsIsState::Disconnected),
            (_, AprsIsEvent::Disconnect) => Some(AprsIsState::Disconnected),
            _ => None,
        }
    }

    /// Force-set the state, for test setup or a supervisor resetting after
    /// an external reconnect.
    pub fn set_state(&mut self, state: AprsIsState) {
        self.state = state;
        self.transition_count += 1;
    }
}
