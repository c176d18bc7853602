// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Address rewrite: the one mutation a digipeater makes to an AX.25 path,
//! always on a local copy, never on a PBuf's shared bytes.

use aprx_core::ax25::{Ax25Address, Ax25Path};

use crate::tables::TraceWideTable;

/// Rewrite `path` for digipeating on behalf of `transmitter`. Returns
/// `None` if there is no via-field this digipeater should act on (every
/// via already has its H-bit set, or the first unset via matches neither
/// the transmitter/its aliases nor a TRACE/WIDE keyword).
pub fn rewrite_for_digipeat(
    path: &Ax25Path,
    transmitter: &Ax25Address,
    aliases: &[String],
    source_trace: Option<&TraceWideTable>,
    digi_trace: &TraceWideTable,
    source_wide: Option<&TraceWideTable>,
    digi_wide: &TraceWideTable,
) -> Option<Ax25Path> {
    let idx = path.vias.iter().position(|v| !v.repeated)?;
    let via = &path.vias[idx];

    let is_alias = via.call.eq_ignore_ascii_case(&transmitter.call)
        || aliases.iter().any(|a| a.eq_ignore_ascii_case(&via.call));

    let mut out = path.clone();

    if is_alias {
        let mut new_via = transmitter.clone();
        new_via.repeated = true;
        new_via.last = via.last;
        out.vias[idx] = new_via;
        return Some(out);
    }

    let trace_match = source_trace
        .map(|t| t.match_call(&via.call).is_some())
        .unwrap_or(false)
        || digi_trace.match_call(&via.call).is_some();
    let wide_match = source_wide
        .map(|t| t.match_call(&via.call).is_some())
        .unwrap_or(false)
        || digi_wide.match_call(&via.call).is_some();

    if trace_match {
        let mut original = via.clone();
        if original.ssid > 0 {
            original.ssid -= 1;
        }
        if original.ssid == 0 {
            original.repeated = true;
        }
        let mut inserted = transmitter.clone();
        inserted.repeated = true;
        inserted.last = false;
        out.vias[idx] = original;
        out.vias.insert(idx, inserted);
        return Some(out);
    }

    if wide_match {
        let mut updated = via.clone();
        if updated.ssid > 0 {
            updated.ssid -= 1;
        }
        if updated.ssid == 0 {
            updated.repeated = true;
        }
        out.vias[idx] = updated;
        return Some(out);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::TraceWideTable;

    fn transmitter() -> Ax25Address {
        Ax25Address::new("MYDIGI", 0).unwrap()
    }

    #[test]
    fn alias_match_substitutes_transmitter_and_sets_h_bit() {
        let path = Ax25Path::from_tnc2_prefix("N0CALL>APRS,MYDIGI-1").unwrap();
        let trace = TraceWideTable::default_trace();
        let wide = TraceWideTable::default_wide();
        let out = rewrite_for_digipeat(&path, &transmitter(), &[], None, &trace, None, &wide)
            .unwrap();
        assert_eq!(out.vias[0].call, "MYDIGI");
        assert!(out.vias[0].repeated);
    }

    #[test]
    fn alias_match_preserves_transmitters_own_ssid() {
        let tx = Ax25Address::new("OH2XYZ", 1).unwrap();
        let path = Ax25Path::from_tnc2_prefix("N0CALL>APRS,OH2XYZ-1").unwrap();
        let trace = TraceWideTable::default_trace();
        let wide = TraceWideTable::default_wide();
        let out = rewrite_for_digipeat(&path, &tx, &[], None, &trace, None, &wide).unwrap();
        assert_eq!(out.vias[0].call, "OH2XYZ");
        assert_eq!(out.vias[0].ssid, 1);
        assert!(out.vias[0].repeated);
    }

    #[test]
    fn trace_insert_carries_transmitters_own_ssid() {
        let tx = Ax25Address::new("OH2XYZ", 1).unwrap();
        let path = Ax25Path::from_tnc2_prefix("N0CALL>APRS,TRACE2-2").unwrap();
        let trace = TraceWideTable::default_trace();
        let wide = TraceWideTable::default_wide();
        let out = rewrite_for_digipeat(&path, &tx, &[], None, &trace, None, &wide).unwrap();
        assert_eq!(out.vias[0].call, "OH2XYZ");
        assert_eq!(out.vias[0].ssid, 1);
        assert!(out.vias[0].repeated);
    }

    #[test]
    fn wide_keyword_in_default_trace_table_inserts_like_trace() {
        // The default trace table's keyword list includes "WIDE" itself, so
        // a plain WIDEn-N hop is inserted (new-N paradigm) rather than
        // merely decremented in place.
        let path = Ax25Path::from_tnc2_prefix("N0CALL>APRS,WIDE2-2").unwrap();
        let trace = TraceWideTable::default_trace();
        let wide = TraceWideTable::default_wide();
        let out = rewrite_for_digipeat(&path, &transmitter(), &[], None, &trace, None, &wide)
            .unwrap();
        assert_eq!(out.vias.len(), 2);
        assert_eq!(out.vias[0].call, "MYDIGI");
        assert!(out.vias[0].repeated);
        assert_eq!(out.vias[1].ssid, 1);
        assert!(!out.vias[1].repeated);
    }

    #[test]
    fn wide_match_decrements_ssid_in_place_when_trace_table_excludes_wide() {
        let path = Ax25Path::from_tnc2_prefix("N0CALL>APRS,WIDE2-2").unwrap();
        let mut trace = TraceWideTable::default_trace();
        trace.keys = vec!["TRACE".into(), "RELAY".into()];
        let wide = TraceWideTable::default_wide();
        let out = rewrite_for_digipeat(&path, &transmitter(), &[], None, &trace, None, &wide)
            .unwrap();
        assert_eq!(out.vias.len(), 1);
        assert_eq!(out.vias[0].ssid, 1);
        assert!(!out.vias[0].repeated);
    }

    #[test]
    fn wide_match_last_hop_sets_h_bit_when_trace_table_excludes_wide() {
        let path = Ax25Path::from_tnc2_prefix("N0CALL>APRS,WIDE1-1").unwrap();
        let mut trace = TraceWideTable::default_trace();
        trace.keys = vec!["TRACE".into(), "RELAY".into()];
        let wide = TraceWideTable::default_wide();
        let out = rewrite_for_digipeat(&path, &transmitter(), &[], None, &trace, None, &wide)
            .unwrap();
        assert_eq!(out.vias[0].ssid, 0);
        assert!(out.vias[0].repeated);
    }

    #[test]
    fn trace_match_inserts_transmitter_before_original() {
        let path = Ax25Path::from_tnc2_prefix("N0CALL>APRS,TRACE2-2").unwrap();
        let trace = TraceWideTable::default_trace();
        let wide = TraceWideTable::default_wide();
        let out = rewrite_for_digipeat(&path, &transmitter(), &[], None, &trace, None, &wide)
            .unwrap();
        assert_eq!(out.vias.len(), 2);
        assert_eq!(out.vias[0].call, "MYDIGI");
        assert!(out.vias[0].repeated);
        assert_eq!(out.vias[1].call, "TRACE2");
        assert_eq!(out.vias[1].ssid, 1);
    }

    #[test]
    fn no_actionable_via_returns_none() {
        let path = Ax25Path::from_tnc2_prefix("N0CALL>APRS,OH2RDG-1").unwrap();
        let trace = TraceWideTable::default_trace();
        let wide = TraceWideTable::default_wide();
        assert!(
            rewrite_for_digipeat(&path, &transmitter(), &[], None, &trace, None, &wide).is_none()
        );
    }

    #[test]
    fn fully_repeated_path_has_no_actionable_via() {
        let mut path = Ax25Path::from_tnc2_prefix("N0CALL>APRS,WIDE1-1").unwrap();
        path.vias[0].repeated = true;
        let trace = TraceWideTable::default_trace();
        let wide = TraceWideTable::default_wide();
        assert!(
            rewrite_for_digipeat(&path, &transmitter(), &[], None, &trace, None, &wide).is_none()
        );
    }
}
