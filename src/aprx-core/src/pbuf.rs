// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! The packet buffer: a parsed frame shared by every subsystem that
//! touches it, carrying both the AX.25 and TNC2 representations.
//!
//! A C-style reference count is unnecessary here — `Arc<PbufInner>` gives
//! the same "freed exactly once, on last drop" guarantee for free, so
//! [`PBuf`] is simply a type alias rather than a hand-rolled refcounted
//! pointer.

use std::sync::Arc;
use std::time::Instant;

use crate::ax25::Ax25Path;
use crate::error::AprxError;
use crate::IfGroup;

/// Total bytes a PBuf's two storages may occupy together. Packets over
/// this budget are refused at construction (§7 "runtime resource
/// exhaustion").
pub const PBUF_MAX_STORAGE: usize = 2100;

/// AX.25 UI control byte (unnumbered information, poll/final clear).
pub const AX25_CONTROL_UI: u8 = 0x03;
/// AX.25 PID byte meaning "no layer 3" — the byte APRS traffic is carried
/// under.
pub const AX25_PID_NO_LAYER3: u8 = 0xF0;

/// Where a PBuf's bytes originated, used only to pick sensible defaults
/// for flags the caller doesn't set explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PbufOrigin {
    Radio,
    AprsIs,
}

/// A decoded APRS content facet set, attached to a PBuf when `is_aprs` is
/// true. Populated by the `aprx-aprs` crate; kept generic here (no
/// dependency on `aprx-aprs`) since PBuf itself lives below it in the
/// dependency graph.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AprsFacets {
    pub kind: PacketKind,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub cos_lat: Option<f64>,
    pub symbol_table: Option<char>,
    pub symbol_code: Option<char>,
    pub srcname: Option<String>,
    pub recipient: Option<String>,
}

impl AprsFacets {
    pub fn has_position(&self) -> bool {
        self.lat.is_some() && self.lon.is_some()
    }
}

/// Packet-type bitmask, one bit per APRS content category (§3, §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PacketKind(pub u16);

impl PacketKind {
    pub const POSITION: PacketKind = PacketKind(1 << 0);
    pub const MESSAGE: PacketKind = PacketKind(1 << 1);
    pub const OBJECT: PacketKind = PacketKind(1 << 2);
    pub const ITEM: PacketKind = PacketKind(1 << 3);
    pub const STATUS: PacketKind = PacketKind(1 << 4);
    pub const TELEMETRY: PacketKind = PacketKind(1 << 5);
    pub const WX: PacketKind = PacketKind(1 << 6);
    pub const QUERY: PacketKind = PacketKind(1 << 7);
    pub const NWS: PacketKind = PacketKind(1 << 8);
    pub const USERDEF: PacketKind = PacketKind(1 << 9);
    pub const CWOP: PacketKind = PacketKind(1 << 10);
    pub const THIRDPARTY: PacketKind = PacketKind(1 << 11);

    pub const NONE: PacketKind = PacketKind(0);

    pub fn contains(self, other: PacketKind) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn union(self, other: PacketKind) -> PacketKind {
        PacketKind(self.0 | other.0)
    }
}

impl std::ops::BitOr for PacketKind {
    type Output = PacketKind;
    fn bitor(self, rhs: PacketKind) -> PacketKind {
        self.union(rhs)
    }
}

impl std::ops::BitOrAssign for PacketKind {
    fn bitor_assign(&mut self, rhs: PacketKind) {
        *self = self.union(rhs);
    }
}

/// The immutable body of a packet buffer. Always accessed through the
/// [`PBuf`] (`Arc`) alias; never mutated in place after construction —
/// address-field rewrites for digipeating operate on a local copy (§9),
/// never on this shared storage.
#[derive(Debug, Clone)]
pub struct PbufInner {
    pub path: Ax25Path,
    pub info: Vec<u8>,
    pub tnc2: String,
    pub is_aprs: bool,
    pub digi_like_aprs: bool,
    pub arrival: Instant,
    pub source_ifgroup: IfGroup,
    pub facets: Option<AprsFacets>,
}

/// Shared-ownership packet buffer. `Arc::clone` / drop stand in for the
/// original's manual `clone_shared`/`drop_shared`.
pub type PBuf = Arc<PbufInner>;

impl PbufInner {
    /// Build a PBuf from an already-decoded AX.25 address chain and info
    /// bytes (the radio receive path).
    pub fn from_ax25(
        path: Ax25Path,
        info: Vec<u8>,
        is_aprs: bool,
        source_ifgroup: IfGroup,
    ) -> Result<PBuf, AprxError> {
        let storage = path.encode().len() + 2 + info.len();
        if storage > PBUF_MAX_STORAGE {
            return Err(AprxError::pbuf_too_large(storage));
        }
        let tnc2 = format!(
            "{}:{}",
            path.to_tnc2_prefix(),
            String::from_utf8_lossy(&info)
        );
        Ok(Arc::new(PbufInner {
            path,
            info,
            tnc2,
            is_aprs,
            digi_like_aprs: is_aprs,
            arrival: Instant::now(),
            source_ifgroup,
            facets: None,
        }))
    }

    /// Build a PBuf from TNC2 text (the APRS-IS receive path).
    pub fn from_tnc2(text: &str, is_aprs: bool, source_ifgroup: IfGroup) -> Result<PBuf, AprxError> {
        let (prefix, info) = text
            .split_once(':')
            .ok_or_else(|| AprxError::transient("tnc2 line missing ':' info separator"))?;
        let path = Ax25Path::from_tnc2_prefix(prefix)?;
        let info = info.as_bytes().to_vec();
        let storage = path.encode().len() + 2 + info.len();
        if storage > PBUF_MAX_STORAGE {
            return Err(AprxError::pbuf_too_large(storage));
        }
        Ok(Arc::new(PbufInner {
            path,
            info,
            tnc2: text.to_string(),
            is_aprs,
            digi_like_aprs: is_aprs,
            arrival: Instant::now(),
            source_ifgroup,
            facets: None,
        }))
    }

    /// Attach parsed APRS facets (set by the caller after running
    /// `aprx-aprs` over `self.info`).
    pub fn with_facets(mut self, facets: AprsFacets) -> Self {
        self.facets = Some(facets);
        self
    }

    pub fn src(&self) -> &crate::ax25::Ax25Address {
        &self.path.src
    }

    pub fn dest(&self) -> &crate::ax25::Ax25Address {
        &self.path.dest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_tnc2_round_trips_prefix() {
        let pbuf = PbufInner::from_tnc2(
            "N0CALL-5>APRS,WIDE2-2:=6004.00N/02504.00E-test",
            true,
            1,
        )
        .unwrap();
        assert_eq!(pbuf.path.src.call, "N0CALL");
        assert_eq!(pbuf.info, b"=6004.00N/02504.00E-test");
    }

    #[test]
    fn oversized_storage_is_refused() {
        let huge_info = vec![b'x'; PBUF_MAX_STORAGE];
        let text = format!("N0CALL>APRS:{}", String::from_utf8_lossy(&huge_info));
        let err = PbufInner::from_tnc2(&text, false, 1).unwrap_err();
        assert!(err.is_transient());
    }

    #[test]
    fn missing_info_separator_is_rejected() {
        assert!(PbufInner::from_tnc2("N0CALL>APRS", false, 1).is_err());
    }

    #[test]
    fn packet_kind_union_and_contains() {
        let k = PacketKind::POSITION | PacketKind::MESSAGE;
        assert!(k.contains(PacketKind::POSITION));
        assert!(!k.contains(PacketKind::WX));
    }
}
