// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! The legacy APRS-IS login passcode: an XOR fold over the uppercased
//! alphanumeric prefix of a callsign, seeded with 29666, masked to 15 bits.

/// Compute the APRS-IS passcode for `callsign`. SSID and any trailing
/// non-alphanumeric characters are ignored, matching the reference
/// algorithm, which stops at the first character outside `[A-Z0-9]`.
pub fn passcode(callsign: &str) -> u16 {
    let mut hash: i32 = 29666;
    for (i, c) in callsign.to_ascii_uppercase().chars().enumerate() {
        if !c.is_ascii_alphanumeric() {
            break;
        }
        let mult = if i % 2 == 0 { 256 } else { 1 };
        hash ^= (c as i32) * mult;
    }
    (hash & 0x7FFF) as u16
}
