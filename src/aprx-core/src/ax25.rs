// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! AX.25 address field codec and TNC2 ↔ AX.25 address round-tripping.
//!
//! An AX.25 address is 7 bytes: six ASCII characters shifted left by one
//! bit (space-padded), followed by one control byte carrying `SSID << 1` in
//! bits 4..1, the H-bit ("has been repeated") in bit 7, and the
//! address-end flag in bit 0.

use crate::error::AprxError;

const SSID_MASK: u8 = 0x0F;
const H_BIT: u8 = 0x80;
const END_BIT: u8 = 0x01;

/// One 7-byte AX.25 address field: a callsign, an SSID, the repeated
/// ("H-bit") flag, and the address-end flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ax25Address {
    /// Up to 6 characters, `[A-Z0-9]`, no trailing padding.
    pub call: String,
    /// 0..=15.
    pub ssid: u8,
    /// Bit 7 of the control byte: this hop has processed the frame.
    pub repeated: bool,
    /// Bit 0 of the control byte: this is the last address field.
    pub last: bool,
}

impl Ax25Address {
    pub fn new(call: &str, ssid: u8) -> Result<Self, AprxError> {
        validate_callsign(call)?;
        if ssid > 15 {
            return Err(AprxError::fatal(format!("ssid {ssid} out of range 0..=15")));
        }
        Ok(Ax25Address {
            call: call.to_ascii_uppercase(),
            ssid,
            repeated: false,
            last: false,
        })
    }

    /// Decode one 7-byte address field starting at `bytes[0..7]`.
    pub fn decode(bytes: &[u8]) -> Result<Self, AprxError> {
        if bytes.len() < 7 {
            return Err(AprxError::transient("ax25 address field shorter than 7 bytes"));
        }
        let mut call = String::with_capacity(6);
        for &b in &bytes[0..6] {
            let ch = b >> 1;
            if ch != b' ' {
                call.push(ch as char);
            }
        }
        let ctrl = bytes[6];
        Ok(Ax25Address {
            call,
            ssid: (ctrl >> 1) & SSID_MASK,
            repeated: ctrl & H_BIT != 0,
            last: ctrl & END_BIT != 0,
        })
    }

    /// Encode into a 7-byte AX.25 address field.
    pub fn encode(&self) -> [u8; 7] {
        let mut out = [0u8; 7];
        let call_bytes = self.call.as_bytes();
        for i in 0..6 {
            let ch = call_bytes.get(i).copied().unwrap_or(b' ');
            out[i] = ch << 1;
        }
        let mut ctrl = (self.ssid & SSID_MASK) << 1;
        // Reserved bits 5 and 6 are conventionally set to 1 on the wire.
        ctrl |= 0x60;
        if self.repeated {
            ctrl |= H_BIT;
        }
        if self.last {
            ctrl |= END_BIT;
        }
        out[6] = ctrl;
        out
    }

    /// TNC2 text rendering, e.g. `OH2XYZ-1` or (for a via field) `OH2XYZ-1*`
    /// when the H-bit is set.
    pub fn to_tnc2(&self, with_star: bool) -> String {
        let mut s = if self.ssid != 0 {
            format!("{}-{}", self.call, self.ssid)
        } else {
            self.call.clone()
        };
        if with_star && self.repeated {
            s.push('*');
        }
        s
    }

    /// Parse a single TNC2 callsign token, optionally carrying a trailing
    /// `*` (H-bit marker) and `-SSID`.
    pub fn from_tnc2(token: &str) -> Result<Self, AprxError> {
        let (base, repeated) = match token.strip_suffix('*') {
            Some(rest) => (rest, true),
            None => (token, false),
        };
        let (call, ssid) = match base.split_once('-') {
            Some((call, ssid_str)) => {
                let ssid: u8 = ssid_str
                    .parse()
                    .map_err(|_| AprxError::transient(format!("bad ssid in '{token}'")))?;
                (call, ssid)
            }
            None => (base, 0),
        };
        let mut addr = Ax25Address::new(call, ssid)?;
        addr.repeated = repeated;
        Ok(addr)
    }
}

fn validate_callsign(call: &str) -> Result<(), AprxError> {
    if call.is_empty() || call.len() > 6 {
        return Err(AprxError::fatal(format!(
            "callsign '{call}' must be 1..=6 characters"
        )));
    }
    if !call.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return Err(AprxError::fatal(format!(
            "callsign '{call}' must be alphanumeric"
        )));
    }
    Ok(())
}

/// A decoded AX.25 address chain: destination, source, and up to 8 via
/// addresses in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ax25Path {
    pub dest: Ax25Address,
    pub src: Ax25Address,
    pub vias: Vec<Ax25Address>,
}

impl Ax25Path {
    /// Decode the address part of an AX.25 frame (destination, source, vias
    /// up to and including the first field with the address-end bit set).
    pub fn decode(bytes: &[u8]) -> Result<(Self, usize), AprxError> {
        if bytes.len() < 14 {
            return Err(AprxError::transient("ax25 frame shorter than minimum address length"));
        }
        let mut dest = Ax25Address::decode(&bytes[0..7])?;
        let mut src = Ax25Address::decode(&bytes[7..14])?;
        // Destination/source "last" bits are meaningless on their own;
        // only set when there truly are no vias.
        let mut offset = 14;
        let mut vias = Vec::new();
        if !src.last {
            loop {
                if offset + 7 > bytes.len() {
                    return Err(AprxError::transient("ax25 via field truncated"));
                }
                let via = Ax25Address::decode(&bytes[offset..offset + 7])?;
                offset += 7;
                let last = via.last;
                vias.push(via);
                if last {
                    break;
                }
                if vias.len() > 8 {
                    return Err(AprxError::transient("ax25 via chain exceeds 8 addresses"));
                }
            }
        } else {
            // No vias: src itself must carry the end bit, already true.
            dest.last = false;
            src.last = true;
        }
        Ok((Ax25Path { dest, src, vias }, offset))
    }

    /// Encode the address chain back to bytes, fixing up end-bits so
    /// exactly the last field in the chain has the address-end flag set.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(7 * (2 + self.vias.len()));
        let has_vias = !self.vias.is_empty();
        let mut dest = self.dest.clone();
        dest.last = false;
        out.extend_from_slice(&dest.encode());
        let mut src = self.src.clone();
        src.last = !has_vias;
        out.extend_from_slice(&src.encode());
        let n = self.vias.len();
        for (i, via) in self.vias.iter().enumerate() {
            let mut via = via.clone();
            via.last = i + 1 == n;
            out.extend_from_slice(&via.encode());
        }
        out
    }

    /// Render as a TNC2 source/destination/via text prefix:
    /// `SRC>DST[,VIA1[*],...]`, without the trailing `:info`.
    pub fn to_tnc2_prefix(&self) -> String {
        let mut s = format!("{}>{}", self.src.to_tnc2(false), self.dest.to_tnc2(false));
        for via in &self.vias {
            s.push(',');
            s.push_str(&via.to_tnc2(true));
        }
        s
    }

    /// Parse a TNC2 prefix of the form `SRC>DST[,VIA1[*],...]`.
    pub fn from_tnc2_prefix(prefix: &str) -> Result<Self, AprxError> {
        let (src_text, rest) = prefix
            .split_once('>')
            .ok_or_else(|| AprxError::transient("tnc2 prefix missing '>'"))?;
        let mut fields = rest.split(',');
        let dest_text = fields
            .next()
            .ok_or_else(|| AprxError::transient("tnc2 prefix missing destination"))?;
        let src = Ax25Address::from_tnc2(src_text)?;
        let dest = Ax25Address::from_tnc2(dest_text)?;
        let vias = fields
            .map(Ax25Address::from_tnc2)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Ax25Path { dest, src, vias })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_round_trip_plain() {
        let addr = Ax25Address {
            call: "OH2XYZ".into(),
            ssid: 1,
            repeated: false,
            last: true,
        };
        let bytes = addr.encode();
        let decoded = Ax25Address::decode(&bytes).unwrap();
        assert_eq!(decoded, addr);
    }

    #[test]
    fn h_bit_and_end_bit_are_independent() {
        let addr = Ax25Address {
            call: "WIDE2".into(),
            ssid: 2,
            repeated: true,
            last: false,
        };
        let bytes = addr.encode();
        assert_ne!(bytes[6] & 0x80, 0);
        assert_eq!(bytes[6] & 0x01, 0);
        let decoded = Ax25Address::decode(&bytes).unwrap();
        assert!(decoded.repeated);
        assert!(!decoded.last);
    }

    #[test]
    fn tnc2_via_star_reflects_h_bit() {
        let addr = Ax25Address {
            call: "OH2XYZ".into(),
            ssid: 1,
            repeated: true,
            last: false,
        };
        assert_eq!(addr.to_tnc2(true), "OH2XYZ-1*");
        assert_eq!(addr.to_tnc2(false), "OH2XYZ-1");
    }

    #[test]
    fn from_tnc2_parses_star_and_ssid() {
        let addr = Ax25Address::from_tnc2("WIDE2-1*").unwrap();
        assert_eq!(addr.call, "WIDE2");
        assert_eq!(addr.ssid, 1);
        assert!(addr.repeated);
    }

    #[test]
    fn callsign_validation_rejects_bad_chars() {
        assert!(Ax25Address::new("OH2-XY", 0).is_err());
        assert!(Ax25Address::new("TOOLONGCALL", 0).is_err());
    }

    #[test]
    fn path_round_trip_ax25_to_tnc2_and_back() {
        let path = Ax25Path::from_tnc2_prefix("N0CALL-5>APRS,OH2XYZ-1*,WIDE2-1").unwrap();
        let bytes = path.encode();
        let (decoded, consumed) = Ax25Path::decode(&bytes).unwrap();
        assert_eq!(consumed, bytes.len());
        assert_eq!(decoded.src.call, "N0CALL");
        assert_eq!(decoded.src.ssid, 5);
        assert_eq!(decoded.vias.len(), 2);
        assert!(decoded.vias[0].repeated);
        assert!(!decoded.vias[1].repeated);
        assert_eq!(decoded.to_tnc2_prefix(), "N0CALL-5>APRS,OH2XYZ-1*,WIDE2-1");
    }

    #[test]
    fn path_without_vias_round_trips() {
        let path = Ax25Path::from_tnc2_prefix("N0CALL>APRS").unwrap();
        let bytes = path.encode();
        let (decoded, _) = Ax25Path::decode(&bytes).unwrap();
        assert!(decoded.vias.is_empty());
        assert!(decoded.src.last);
    }
}
