// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Mic-E position decoding.
//!
//! Mic-E packets encode latitude and a message-type code into the
//! destination callsign field (hence `decode` takes the destination call
//! as well as the info bytes) and longitude/course/speed into the first
//! bytes of the information field, following the standard Mic-E character
//! substitution table.

use super::position::Position;

/// Standard / custom message-type code carried in the destination field's
/// three message bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MicEMessage {
    Standard(u8),
    Custom(u8),
    Emergency,
}

pub struct MicEFix {
    pub lat: f64,
    pub lon: f64,
    pub symbol_table: char,
    pub symbol_code: char,
    pub speed_knots: f64,
    pub course_deg: f64,
    pub message: MicEMessage,
}

struct DestDigit {
    digit: Option<u8>,
    message_bit: bool,
}

fn decode_dest_char(c: u8) -> Option<DestDigit> {
    match c {
        b'0'..=b'9' => Some(DestDigit {
            digit: Some(c - b'0'),
            message_bit: false,
        }),
        b'A'..=b'J' => Some(DestDigit {
            digit: Some(c - b'A'),
            message_bit: true,
        }),
        b'K' => Some(DestDigit {
            digit: None,
            message_bit: true,
        }),
        b'L' => Some(DestDigit {
            digit: None,
            message_bit: false,
        }),
        b'P'..=b'Y' => Some(DestDigit {
            digit: Some(c - b'P'),
            message_bit: true,
        }),
        b'Z' => Some(DestDigit {
            digit: None,
            message_bit: true,
        }),
        _ => None,
    }
}

/// Decode the 6-character destination callsign field of a Mic-E packet
/// into latitude degrees/minutes/hundredths, the north/south and
/// longitude-offset/west-east hint bits, and the 3-bit message code.
///
/// `north`, `long_offset`, and `west` are taken from the message bits of
/// destination characters 4, 5, and 6 respectively, per the standard
/// table: a "custom" (letter) character at that position means the
/// corresponding flag is set.
fn decode_destination(dest_call: &str) -> Option<(f64, bool, bool, MicEMessage)> {
    let call = dest_call.as_bytes();
    if call.len() < 6 {
        return None;
    }
    let mut digits = [0u8; 6];
    let mut bits = [false; 6];
    for i in 0..6 {
        let d = decode_dest_char(call[i])?;
        digits[i] = d.digit.unwrap_or(0);
        bits[i] = d.message_bit;
    }
    let lat_deg = digits[0] * 10 + digits[1];
    let lat_min = digits[2] * 10 + digits[3];
    let lat_min_hundredths = digits[4] * 10 + digits[5];
    let lat = lat_deg as f64 + (lat_min as f64 + lat_min_hundredths as f64 / 100.0) / 60.0;

    let north = bits[3];
    let long_offset = bits[4];
    let west = bits[5];

    let code = ((bits[0] as u8) << 2) | ((bits[1] as u8) << 1) | (bits[2] as u8);
    let message = if bits[0] && bits[1] && bits[2] {
        MicEMessage::Emergency
    } else if bits.iter().take(3).any(|b| *b) {
        MicEMessage::Custom(code)
    } else {
        MicEMessage::Standard(code)
    };

    let lat = if north { lat } else { -lat };
    Some((lat, long_offset, west, message))
}

/// Decode a Mic-E information field. `info[0]` must be the Mic-E data type
/// character (`` ` `` current fix, `'` old fix); `dest_call` is the AX.25
/// destination callsign (without SSID).
pub fn decode(dest_call: &str, info: &[u8]) -> Option<MicEFix> {
    if info.len() < 9 {
        return None;
    }
    let (lat_mag, long_offset, west, message) = decode_destination(dest_call)?;

    let mut lon_deg = info[1] as i32 - 28;
    if long_offset {
        lon_deg += 100;
    }
    if (180..=189).contains(&lon_deg) {
        lon_deg -= 80;
    } else if (190..=199).contains(&lon_deg) {
        lon_deg -= 190;
    }

    let mut lon_min = info[2] as i32 - 28;
    if lon_min >= 60 {
        lon_min -= 60;
    }
    let lon_min_hundredths = info[3] as i32 - 28;

    let mut lon = lon_deg as f64 + (lon_min as f64 + lon_min_hundredths as f64 / 100.0) / 60.0;
    if west {
        lon = -lon;
    }

    let sp_dc = info[4] as i32 - 28;
    let dc = info[5] as i32 - 28;
    let mut speed = sp_dc * 10 + dc / 10;
    let mut course = (dc % 10) * 100 + (info[6] as i32 - 28);
    if speed >= 800 {
        speed -= 800;
    }
    if course >= 400 {
        course -= 400;
    }

    let symbol_code = info[7] as char;
    let mut symbol_table_byte = info[8];
    if symbol_table_byte >= 0x50 {
        symbol_table_byte -= 0x50;
    }
    let symbol_table = symbol_table_byte as char;

    Some(MicEFix {
        lat: lat_mag,
        lon,
        symbol_table,
        symbol_code,
        speed_knots: speed.max(0) as f64,
        course_deg: course.max(0) as f64,
        message,
    })
}

impl From<MicEFix> for Position {
    fn from(fix: MicEFix) -> Position {
        Position {
            lat: fix.lat,
            lon: fix.lon,
            symbol_table: fix.symbol_table,
            symbol_code: fix.symbol_code,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_message_decodes_from_digits() {
        // Destination "APRS91" (common Mic-E fixed-text test destination for
        // fully-space-padded lat fields) has no digits — use digit-bearing
        // calls instead to exercise the numeric path.
        let (lat, long_offset, west, message) = decode_destination("4903L3").unwrap();
        assert!((lat - 49.05).abs() < 0.01);
        assert!(!west || west); // west is destination-encoded, not asserted here
        let _ = long_offset;
        assert!(matches!(message, MicEMessage::Standard(_)));
    }

    #[test]
    fn full_fix_decode_is_internally_consistent() {
        // "4903L3" -> lat 49 03.00' N (bit at pos4 'L' => message_bit false,
        // so north=false here -> south); exercise full decode path end to
        // end and check the result lands in a plausible coordinate range.
        let info = [b'`', 28 + 60, 28 + 30, 28 + 0, 28 + 10, 28 + 5, 28 + 0, b'>', b'/'];
        let fix = decode("4903L3", &info).unwrap();
        assert!((-90.0..=90.0).contains(&fix.lat));
        assert!((-180.0..=180.0).contains(&fix.lon));
        assert!(fix.speed_knots >= 0.0);
        assert!(fix.course_deg >= 0.0);
    }

    #[test]
    fn short_destination_is_rejected() {
        assert!(decode_destination("ABC").is_none());
    }

    #[test]
    fn short_info_is_rejected() {
        assert!(decode("4903L3", b"`").is_none());
    }
}
