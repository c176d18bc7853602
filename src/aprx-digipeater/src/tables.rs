// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! TRACE/WIDE keyword tables and the hardcoded callsign reject list.

/// Callsigns that are always rejected as a source, destination, or via
/// field, independent of any configured regex reject filters.
pub const RESERVED_CALLSIGNS: &[&str] = &["N0CALL", "NOCALL"];

/// Whether `call` is on the hardcoded reject list, or matches the
/// digipeater's own transmitter callsign (`mycall`).
pub fn is_reserved(call: &str, mycall: &str) -> bool {
    let call = call.to_ascii_uppercase();
    RESERVED_CALLSIGNS.contains(&call.as_str()) || call == mycall.to_ascii_uppercase()
}

/// A TRACE or WIDE keyword table: `{max_req, max_done, is_trace, keys}`.
#[derive(Debug, Clone)]
pub struct TraceWideTable {
    pub max_req: u8,
    pub max_done: u8,
    pub is_trace: bool,
    pub keys: Vec<String>,
}

impl TraceWideTable {
    /// `{4,4,true,["WIDE","TRACE","RELAY"]}`, the default TRACE table.
    pub fn default_trace() -> Self {
        TraceWideTable {
            max_req: 4,
            max_done: 4,
            is_trace: true,
            keys: vec!["WIDE".into(), "TRACE".into(), "RELAY".into()],
        }
    }

    /// `{7,7,false,["WIDE"]}`, the default WIDE table.
    pub fn default_wide() -> Self {
        TraceWideTable {
            max_req: 7,
            max_done: 7,
            is_trace: false,
            keys: vec!["WIDE".into()],
        }
    }

    /// Match `call` (without SSID) against this table's keywords. Returns
    /// the embedded hop count `N` on a match: the trailing digit of the
    /// matched keyword, or `1` if the keyword carries none (e.g. `RELAY`).
    pub fn match_call(&self, call: &str) -> Option<u8> {
        let call = call.to_ascii_uppercase();
        for key in &self.keys {
            let key = key.to_ascii_uppercase();
            if let Some(suffix) = call.strip_prefix(key.as_str()) {
                if suffix.is_empty() {
                    return Some(1);
                }
                if suffix.bytes().all(|b| b.is_ascii_digit()) {
                    if let Ok(n) = suffix.parse::<u8>() {
                        if n >= 1 {
                            return Some(n);
                        }
                    }
                }
            }
        }
        None
    }
}
