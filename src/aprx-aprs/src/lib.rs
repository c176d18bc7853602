// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! APRS content parser: decodes the information field of an AX.25 UI frame
//! into the typed facets `aprx-core::pbuf::AprsFacets` carries.
//!
//! This fills in what the upstream `trx-aprs` crate leaves as a bare
//! `Cargo.toml` with no source — a full decoder covering every content
//! category §4.3 names, not just the position subset a demodulator-focused
//! sibling crate needed.

pub mod mice;
pub mod position;

use aprx_core::ax25::Ax25Path;
use aprx_core::pbuf::{AprsFacets, PacketKind};

/// Parse an AX.25 information field into its APRS facets. `path` supplies
/// the destination callsign Mic-E packets encode position into, and the
/// source callsign used for the CWOP heuristic.
pub fn parse(path: &Ax25Path, info: &[u8]) -> AprsFacets {
    let mut facets = AprsFacets::default();
    if info.is_empty() {
        return facets;
    }

    let dt = info[0];
    match dt {
        b'!' | b'=' => parse_position(&mut facets, &info[1..], dt == b'='),
        b'/' | b'@' => {
            if info.len() >= 8 {
                parse_position(&mut facets, &info[8..], true);
            }
        }
        b'`' | b'\'' => parse_mice(&mut facets, &path.dest.call, info),
        b';' => parse_object(&mut facets, info),
        b')' => parse_item(&mut facets, info),
        b':' => parse_message(&mut facets, info),
        b'>' => facets.kind |= PacketKind::STATUS,
        b'T' if info.len() >= 2 && info[1] == b'#' => facets.kind |= PacketKind::TELEMETRY,
        b'_' => facets.kind |= PacketKind::WX,
        b'}' => parse_thirdparty(&mut facets, info),
        b'?' => facets.kind |= PacketKind::QUERY,
        b'{' => facets.kind |= PacketKind::USERDEF,
        _ => {}
    }

    if facets.kind.contains(PacketKind::WX) && looks_like_cwop_call(&path.src.call) {
        facets.kind |= PacketKind::CWOP;
    }
    facets.cos_lat = facets.lat.map(|lat| lat.to_radians().cos());
    facets
}

fn parse_position(facets: &mut AprsFacets, pos_field: &[u8], _has_messaging: bool) {
    let Ok(pos_str) = std::str::from_utf8(pos_field) else {
        return;
    };
    facets.kind |= PacketKind::POSITION;
    if let Some(pos) = position::parse_position_field(pos_str) {
        if pos.symbol_code == '_' {
            facets.kind |= PacketKind::WX;
        }
        facets.lat = Some(pos.lat);
        facets.lon = Some(pos.lon);
        facets.symbol_table = Some(pos.symbol_table);
        facets.symbol_code = Some(pos.symbol_code);
    }
}

fn parse_mice(facets: &mut AprsFacets, dest_call: &str, info: &[u8]) {
    facets.kind |= PacketKind::POSITION;
    if let Some(fix) = mice::decode(dest_call, info) {
        facets.lat = Some(fix.lat);
        facets.lon = Some(fix.lon);
        facets.symbol_table = Some(fix.symbol_table);
        facets.symbol_code = Some(fix.symbol_code);
    }
}

fn parse_object(facets: &mut AprsFacets, info: &[u8]) {
    facets.kind |= PacketKind::OBJECT;
    if info.len() < 10 {
        return;
    }
    let name = String::from_utf8_lossy(&info[1..10]).trim_end().to_string();
    facets.srcname = Some(name);
    // info[10] is '*' (live) or '_' (killed); info[11..18] is the timestamp;
    // position data follows.
    if info.len() > 18 {
        parse_position(facets, &info[18..], false);
    }
}

fn parse_item(facets: &mut AprsFacets, info: &[u8]) {
    facets.kind |= PacketKind::ITEM;
    // Name is 3-9 characters terminated by '!' (live) or '_' (killed).
    let Some(term) = info[1..].iter().position(|&b| b == b'!' || b == b'_') else {
        return;
    };
    let name = String::from_utf8_lossy(&info[1..1 + term]).to_string();
    facets.srcname = Some(name);
    let pos_start = 1 + term + 1;
    if pos_start < info.len() {
        parse_position(facets, &info[pos_start..], false);
    }
}

fn parse_message(facets: &mut AprsFacets, info: &[u8]) {
    facets.kind |= PacketKind::MESSAGE;
    if info.len() < 11 || info[10] != b':' {
        return;
    }
    let recipient = String::from_utf8_lossy(&info[1..10]).trim_end().to_string();
    if recipient.starts_with("NWS") {
        facets.kind |= PacketKind::NWS;
    }
    facets.recipient = Some(recipient);
}

fn parse_thirdparty(facets: &mut AprsFacets, info: &[u8]) {
    facets.kind |= PacketKind::THIRDPARTY;
    // Only the outer envelope is parsed: the embedded packet's own
    // source>dest,via prefix, not its recursively-decoded content.
    if let Ok(inner) = std::str::from_utf8(&info[1..]) {
        if let Some((prefix, _)) = inner.split_once(':') {
            facets.srcname = prefix.split('>').next().map(|s| s.to_string());
        }
    }
}

fn looks_like_cwop_call(call: &str) -> bool {
    (!call.is_empty() && call.bytes().all(|b| b.is_ascii_digit())) || call.starts_with("CW")
}

#[cfg(test)]
mod tests {
    use super::*;
    use aprx_core::ax25::Ax25Address;

    fn path_with(src: &str, dest: &str) -> Ax25Path {
        Ax25Path {
            dest: Ax25Address::new(dest, 0).unwrap(),
            src: Ax25Address::new(src, 0).unwrap(),
            vias: vec![],
        }
    }

    #[test]
    fn parses_uncompressed_position_no_timestamp() {
        let path = path_with("N0CALL", "APRS");
        let facets = parse(&path, b"=6004.00N/02504.00E-test");
        assert!(facets.kind.contains(PacketKind::POSITION));
        assert!(facets.has_position());
        assert!((facets.lat.unwrap() - 60.0667).abs() < 1e-3);
    }

    #[test]
    fn parses_status() {
        let path = path_with("N0CALL", "APRS");
        let facets = parse(&path, b">status text");
        assert!(facets.kind.contains(PacketKind::STATUS));
        assert!(!facets.has_position());
    }

    #[test]
    fn parses_telemetry() {
        let path = path_with("N0CALL", "APRS");
        let facets = parse(&path, b"T#123,045,067,000,000,000,00000000");
        assert!(facets.kind.contains(PacketKind::TELEMETRY));
    }

    #[test]
    fn parses_message_with_nws_recipient() {
        let path = path_with("N0CALL", "APRS");
        let facets = parse(&path, b":NWS-NYC  :Winter storm warning");
        assert!(facets.kind.contains(PacketKind::MESSAGE));
        assert!(facets.kind.contains(PacketKind::NWS));
        assert_eq!(facets.recipient.as_deref(), Some("NWS-NYC"));
    }

    #[test]
    fn parses_object_name_and_position() {
        let path = path_with("N0CALL", "APRS");
        let mut info = Vec::new();
        info.push(b';');
        info.extend_from_slice(b"TESTOBJ  ");
        info.push(b'*');
        info.extend_from_slice(b"091234z");
        info.extend_from_slice(b"6004.00N/02504.00E-test");
        let facets = parse(&path, &info);
        assert!(facets.kind.contains(PacketKind::OBJECT));
        assert_eq!(facets.srcname.as_deref(), Some("TESTOBJ"));
        assert!(facets.has_position());
    }

    #[test]
    fn parses_item_name_and_position() {
        let path = path_with("N0CALL", "APRS");
        let mut info = Vec::new();
        info.push(b')');
        info.extend_from_slice(b"TEST");
        info.push(b'!');
        info.extend_from_slice(b"6004.00N/02504.00E-test");
        let facets = parse(&path, &info);
        assert!(facets.kind.contains(PacketKind::ITEM));
        assert_eq!(facets.srcname.as_deref(), Some("TEST"));
    }

    #[test]
    fn parses_positionless_weather() {
        let path = path_with("N0CALL", "APRS");
        let facets = parse(&path, b"_10090556c220s004g005t077r000p000P000h50b09900wRSW");
        assert!(facets.kind.contains(PacketKind::WX));
    }

    #[test]
    fn cwop_heuristic_flags_numeric_callsigns() {
        let path = path_with("601234", "APRS");
        let facets = parse(&path, b"_10090556c220s004g005t077r000p000P000h50b09900wRSW");
        assert!(facets.kind.contains(PacketKind::CWOP));
    }

    #[test]
    fn parses_thirdparty_envelope_only() {
        let path = path_with("N0CALL", "APRS");
        let facets = parse(&path, b"}OTHER>APRS,TCPIP*:>inner status");
        assert!(facets.kind.contains(PacketKind::THIRDPARTY));
        assert_eq!(facets.srcname.as_deref(), Some("OTHER"));
    }

    #[test]
    fn parses_query_and_userdef() {
        let path = path_with("N0CALL", "APRS");
        assert!(parse(&path, b"?APRS?").kind.contains(PacketKind::QUERY));
        assert!(parse(&path, b"{abc").kind.contains(PacketKind::USERDEF));
    }
}
