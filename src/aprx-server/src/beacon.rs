// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Scheduled beacon transmission: owner-configured status frames sent to
//! radio and/or APRS-IS on a phased, jittered cycle.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use rand::Rng;

use aprx_core::pbuf::{AX25_CONTROL_UI, AX25_PID_NO_LAYER3};

use crate::config::{BeaconConfig, BeaconMode};

const DEFAULT_CYCLE_SIZE: Duration = Duration::from_secs(1200);

/// One message's schedule: its configured text and the next-fire instant.
struct ScheduledMessage {
    dest: String,
    via: Option<String>,
    payload: String,
    step: Duration,
    next_fire: Instant,
}

/// A frame ready for the caller to hand to RF and/or APRS-IS transports.
#[derive(Debug, Clone)]
pub struct BeaconFrame {
    pub dest: String,
    pub via: Option<String>,
    pub ax25_control_pid: [u8; 2],
    pub payload: Vec<u8>,
    pub mode: BeaconMode,
}

/// Runs every `<beacon>` block's phased schedule.
pub struct BeaconScheduler {
    messages: Vec<ScheduledMessage>,
    mode: BeaconMode,
}

impl BeaconScheduler {
    /// Build a scheduler from config, assigning each message a
    /// pseudo-random phase in `[0.8*step, step]` so beacons sharing a cycle
    /// don't all fire at once.
    pub fn new(config: &BeaconConfig) -> Self {
        Self::new_at(config, Instant::now())
    }

    fn new_at(config: &BeaconConfig, now: Instant) -> Self {
        let cycle = if config.cycle_size_secs > 0 {
            Duration::from_secs(config.cycle_size_secs)
        } else {
            DEFAULT_CYCLE_SIZE
        };
        let n = config.message.len().max(1) as u32;
        let step = cycle / n;

        let mut rng = rand::thread_rng();
        let messages = config
            .message
            .iter()
            .map(|m| {
                let low = step.mul_f64(0.8);
                let jitter = if step > low {
                    rng.gen_range(low..step)
                } else {
                    step
                };
                ScheduledMessage {
                    dest: m.dest.clone(),
                    via: m.via.clone(),
                    payload: m.payload.clone(),
                    step,
                    next_fire: now + jitter,
                }
            })
            .collect();

        BeaconScheduler {
            messages,
            mode: config.beacon_mode,
        }
    }

    /// Earliest deadline across every scheduled message, for the main
    /// loop's `sleep_until`.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.messages.iter().map(|m| m.next_fire).min()
    }

    /// Fire every message whose deadline has passed, rescheduling each one
    /// `step` past its previous deadline, and return the frames to
    /// transmit.
    pub fn run_due(&mut self, now: Instant) -> Vec<BeaconFrame> {
        let mut frames = Vec::new();
        for m in &mut self.messages {
            if now < m.next_fire {
                continue;
            }
            let payload = patch_time_field(&m.payload);
            frames.push(BeaconFrame {
                dest: m.dest.clone(),
                via: m.via.clone(),
                ax25_control_pid: [AX25_CONTROL_UI, AX25_PID_NO_LAYER3],
                payload: payload.into_bytes(),
                mode: self.mode,
            });
            m.next_fire += m.step;
        }
        frames
    }
}

/// If `payload` is a position packet (`=`/`!`/`@`/`/` leading byte) with an
/// `@`/`/` timestamp-prefixed variant carrying an `HHMMSSh` field, replace
/// it with the current UTC time. Payloads without a recognized time field
/// are returned unchanged.
fn patch_time_field(payload: &str) -> String {
    let bytes = payload.as_bytes();
    if bytes.is_empty() || (bytes[0] != b'@' && bytes[0] != b'/') {
        return payload.to_string();
    }
    if bytes.len() < 8 || bytes[7] != b'h' {
        return payload.to_string();
    }
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let h = (secs / 3600) % 24;
    let m = (secs / 60) % 60;
    let s = secs % 60;
    let stamp = format!("{h:02}{m:02}{s:02}h");
    format!("{}{}{}", &payload[..1], stamp, &payload[8..])
}
