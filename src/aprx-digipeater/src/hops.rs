// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Hop-count analysis over a TNC2 via-list, and the "probably heard
//! directly" heuristic.

use aprx_core::ax25::{Ax25Address, Ax25Path};

use crate::tables::TraceWideTable;

/// Accumulated hop-count state over an entire via-list.
#[derive(Debug, Clone, Copy, Default)]
pub struct HopAnalysis {
    pub hops_req: u32,
    pub hops_done: u32,
    pub trace_req: u32,
    pub trace_done: u32,
    pub digi_req: u32,
    pub digi_done: u32,
    /// Set when a malformed via-field forces acceptance/rewrite of the
    /// whole remaining chain rather than a normal hop-budget check.
    pub fixall: bool,
}

/// Which table matched a given via-field, if any, in priority order:
/// source TRACE, digi TRACE, source WIDE, digi WIDE.
enum Matched<'a> {
    Trace(&'a TraceWideTable, u8),
    Wide(&'a TraceWideTable, u8),
}

fn match_via(
    call: &str,
    source_trace: Option<&TraceWideTable>,
    digi_trace: &TraceWideTable,
    source_wide: Option<&TraceWideTable>,
    digi_wide: &TraceWideTable,
) -> Option<Matched<'_>> {
    if let Some(t) = source_trace {
        if let Some(n) = t.match_call(call) {
            return Some(Matched::Trace(t, n));
        }
    }
    if let Some(n) = digi_trace.match_call(call) {
        return Some(Matched::Trace(digi_trace, n));
    }
    if let Some(t) = source_wide {
        if let Some(n) = t.match_call(call) {
            return Some(Matched::Wide(t, n));
        }
    }
    if let Some(n) = digi_wide.match_call(call) {
        return Some(Matched::Wide(digi_wide, n));
    }
    None
}

/// Analyze the full via-list, accumulating hop/trace/digi counters and
/// flagging `fixall` on any malformed WIDEn-N/TRACEn-N combination.
pub fn analyze_hops(
    path: &Ax25Path,
    source_trace: Option<&TraceWideTable>,
    digi_trace: &TraceWideTable,
    source_wide: Option<&TraceWideTable>,
    digi_wide: &TraceWideTable,
) -> HopAnalysis {
    let mut a = HopAnalysis::default();
    for via in &path.vias {
        match match_via(&via.call, source_trace, digi_trace, source_wide, digi_wide) {
            Some(Matched::Trace(_, n)) => {
                let m = via.ssid;
                if !(1..=7).contains(&n) || m > 7 || m > n {
                    a.fixall = true;
                }
                a.hops_req += n as u32;
                a.hops_done += (n - m.min(n)) as u32;
                a.trace_req += n as u32;
                a.trace_done += (n - m.min(n)) as u32;
            }
            Some(Matched::Wide(_, n)) => {
                let m = via.ssid;
                if !(1..=7).contains(&n) || m > 7 || m > n {
                    a.fixall = true;
                }
                a.hops_req += n as u32;
                a.hops_done += (n - m.min(n)) as u32;
            }
            None => {
                if via.repeated {
                    a.digi_req += 1;
                    a.digi_done += 1;
                }
            }
        }
    }
    a
}

/// True iff the first via-field has no H-bit, or is literally a `TRACE`
/// alias, or is an untouched `WIDEn-n` (SSID equal to its own embedded
/// count).
pub fn probably_heard_directly(path: &Ax25Path, digi_trace: &TraceWideTable) -> bool {
    let Some(first) = path.vias.first() else {
        return true;
    };
    if !first.repeated {
        return true;
    }
    if first.call.to_ascii_uppercase().starts_with("TRACE") {
        return true;
    }
    if let Some(n) = digi_trace.match_call(&first.call) {
        if first.ssid == n {
            return true;
        }
    }
    false
}

/// Check the hop budget against per-table caps. Returns `true` if the
/// packet should be accepted for digipeating.
pub fn hop_budget_ok(
    analysis: &HopAnalysis,
    trace_table: &TraceWideTable,
    wide_table: &TraceWideTable,
    probably_direct: bool,
) -> bool {
    if analysis.fixall {
        return probably_direct;
    }
    if analysis.hops_req == 0 {
        return false;
    }
    if analysis.hops_req <= analysis.hops_done {
        return probably_direct;
    }
    let exceeds = analysis.hops_req as u8 > wide_table.max_req.max(trace_table.max_req)
        || analysis.trace_req as u8 > trace_table.max_req
        || analysis.hops_done as u8 > wide_table.max_done.max(trace_table.max_done)
        || analysis.trace_done as u8 > trace_table.max_done;
    if exceeds {
        probably_direct
    } else {
        true
    }
}

/// Whether `call` exactly matches this digipeater's own transmitter
/// callsign (ignoring SSID) — seeing it as a via-field is a routing loop.
pub fn is_transmitter_loop(via: &Ax25Address, transmitter: &Ax25Address) -> bool {
    via.call.eq_ignore_ascii_case(&transmitter.call)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(vias: &str) -> Ax25Path {
        Ax25Path::from_tnc2_prefix(&format!("N0CALL>APRS,{vias}")).unwrap()
    }

    #[test]
    fn counts_plain_wide_hop() {
        let trace = TraceWideTable::default_trace();
        let wide = TraceWideTable::default_wide();
        let a = analyze_hops(&path("WIDE2-1"), None, &trace, None, &wide);
        assert_eq!(a.hops_req, 2);
        assert_eq!(a.hops_done, 1);
        assert!(!a.fixall);
    }

    #[test]
    fn flags_fixall_on_overshoot_ssid() {
        let trace = TraceWideTable::default_trace();
        let wide = TraceWideTable::default_wide();
        let a = analyze_hops(&path("WIDE3-7"), None, &trace, None, &wide);
        assert!(a.fixall);
    }

    #[test]
    fn untouched_first_via_is_probably_direct() {
        let trace = TraceWideTable::default_trace();
        let p = path("WIDE2-2");
        assert!(probably_heard_directly(&p, &trace));
    }

    #[test]
    fn touched_first_via_is_not_probably_direct() {
        let trace = TraceWideTable::default_trace();
        let mut p = path("WIDE2-1");
        p.vias[0].repeated = true;
        assert!(!probably_heard_directly(&p, &trace));
    }

    #[test]
    fn empty_via_list_is_probably_direct() {
        let trace = TraceWideTable::default_trace();
        let p = Ax25Path::from_tnc2_prefix("N0CALL>APRS").unwrap();
        assert!(probably_heard_directly(&p, &trace));
    }

    #[test]
    fn transmitter_loop_detected_case_insensitively() {
        let transmitter = Ax25Address::new("MYDIGI", 0).unwrap();
        let via = Ax25Address::new("mydigi", 5).unwrap();
        assert!(is_transmitter_loop(&via, &transmitter));
    }
}
