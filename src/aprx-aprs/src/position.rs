// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Uncompressed and base-91 compressed APRS position parsing.

/// A decoded position: latitude/longitude in degrees plus the symbol.
pub struct Position {
    pub lat: f64,
    pub lon: f64,
    pub symbol_table: char,
    pub symbol_code: char,
}

/// Parse `DDMM.MMN` (8 bytes).
pub fn parse_lat(s: &str) -> Option<f64> {
    if s.len() < 8 {
        return None;
    }
    let deg: f64 = s[..2].parse().ok()?;
    let min: f64 = s[2..7].parse().ok()?;
    let ns = s.as_bytes()[7];
    let mut lat = deg + min / 60.0;
    match ns {
        b'S' | b's' => lat = -lat,
        b'N' | b'n' => {}
        _ => return None,
    }
    Some(round6(lat))
}

/// Parse `DDDMM.MME` (9 bytes).
pub fn parse_lon(s: &str) -> Option<f64> {
    if s.len() < 9 {
        return None;
    }
    let deg: f64 = s[..3].parse().ok()?;
    let min: f64 = s[3..8].parse().ok()?;
    let ew = s.as_bytes()[8];
    let mut lon = deg + min / 60.0;
    match ew {
        b'W' | b'w' => lon = -lon,
        b'E' | b'e' => {}
        _ => return None,
    }
    Some(round6(lon))
}

fn round6(v: f64) -> f64 {
    (v * 1e6).round() / 1e6
}

/// Parse the uncompressed form `DDMM.MMN/DDDMM.MMEs` (19 bytes: 8 lat + 1
/// symbol table + 9 lon + 1 symbol code).
pub fn parse_uncompressed(pos_str: &str) -> Option<Position> {
    if pos_str.len() < 19 {
        return None;
    }
    let bytes = pos_str.as_bytes();
    let lat = parse_lat(&pos_str[..8])?;
    let symbol_table = bytes[8] as char;
    let lon = parse_lon(&pos_str[9..18])?;
    let symbol_code = bytes[18] as char;
    Some(Position {
        lat,
        lon,
        symbol_table,
        symbol_code,
    })
}

/// Parse the base-91 compressed form: symbol table char, 4 lat chars, 4 lon
/// chars, symbol code, compression-type byte (10 bytes total, ignoring any
/// trailing course/speed/altitude extension which is not decoded here).
pub fn parse_compressed(pos_str: &str) -> Option<Position> {
    if pos_str.len() < 10 {
        return None;
    }
    let bytes = pos_str.as_bytes();
    let symbol_table = bytes[0] as char;

    let mut lat_val: u32 = 0;
    let mut lon_val: u32 = 0;
    for i in 0..4 {
        let lc = bytes[1 + i] as i32 - 33;
        let xc = bytes[5 + i] as i32 - 33;
        if !(0..=90).contains(&lc) || !(0..=90).contains(&xc) {
            return None;
        }
        lat_val = lat_val * 91 + lc as u32;
        lon_val = lon_val * 91 + xc as u32;
    }

    let lat = 90.0 - lat_val as f64 / 380926.0;
    let lon = -180.0 + lon_val as f64 / 190463.0;
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return None;
    }

    let symbol_code = bytes[9] as char;
    Some(Position {
        lat: round6(lat),
        lon: round6(lon),
        symbol_table,
        symbol_code,
    })
}

/// Dispatch on the first byte of the position field: a digit means
/// uncompressed, anything else means base-91 compressed.
pub fn parse_position_field(pos_str: &str) -> Option<Position> {
    let first = *pos_str.as_bytes().first()?;
    if first.is_ascii_digit() {
        parse_uncompressed(pos_str)
    } else {
        parse_compressed(pos_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_uncompressed_north_east() {
        let pos = parse_uncompressed("6004.00N/02504.00E-").unwrap();
        assert!((pos.lat - 60.0667).abs() < 1e-3);
        assert!((pos.lon - 25.0667).abs() < 1e-3);
        assert_eq!(pos.symbol_table, '/');
        assert_eq!(pos.symbol_code, '-');
    }

    #[test]
    fn parse_uncompressed_south_west() {
        let pos = parse_uncompressed("3350.00S/07030.00W>").unwrap();
        assert!(pos.lat < 0.0);
        assert!(pos.lon < 0.0);
    }

    #[test]
    fn compressed_round_trips_plausible_range() {
        // A real-world compressed position example.
        let pos = parse_compressed("/5L!!<*0>{?!").unwrap();
        assert!((-90.0..=90.0).contains(&pos.lat));
        assert!((-180.0..=180.0).contains(&pos.lon));
    }

    #[test]
    fn dispatch_picks_compressed_for_non_digit() {
        assert!(parse_position_field("/5L!!<*0>{?!").is_some());
        assert!(parse_position_field("6004.00N/02504.00E-").is_some());
    }

    #[test]
    fn too_short_is_rejected() {
        assert!(parse_uncompressed("short").is_none());
        assert!(parse_compressed("short").is_none());
    }
}
