// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Filter node kinds and their match logic.

use std::cell::RefCell;
use std::time::{Duration, Instant};

use aprx_core::pbuf::{PacketKind, PBuf};
use aprx_historydb::HistoryDb;

use crate::geo::{haversine_km, wildcard_match};

/// How long a history-derived center position is trusted before a fresh
/// lookup is performed, for the `f` and `T`-with-radius kinds.
const HIST_CACHE_AGE: Duration = Duration::from_secs(20);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterResult {
    Accept,
    Reject,
    NoMatch,
}

#[derive(Debug, Default)]
struct HistCache {
    at: Option<Instant>,
    center: Option<(f64, f64, f64)>,
}

pub enum FilterNode {
    /// `a`/`A`: bounding box, inside or outside.
    BoundingBox {
        lat_n: f64,
        lon_w: f64,
        lat_s: f64,
        lon_e: f64,
        negated: bool,
    },
    /// `b`: source-callsign budlist with `*` wildcards.
    Budlist { patterns: Vec<String>, negated: bool },
    /// `f`: friend range, center tracks a named station's last position.
    Friend {
        callsign: String,
        range_km: f64,
        negated: bool,
        cache: RefCell<HistCache>,
    },
    /// `o`: object/item name matcher.
    Object { pattern: String, negated: bool },
    /// `p`: source-callsign prefix matcher.
    Prefix { prefix: String, negated: bool },
    /// `r`: fixed-center range filter; negative `dist_km` inverts sense.
    Range {
        lat: f64,
        lon: f64,
        cos_lat: f64,
        dist_km: f64,
        negated: bool,
    },
    /// `s`: symbol table/code/overlay filter.
    Symbol {
        primary: Option<char>,
        alternate: Option<char>,
        overlay: Option<char>,
        negated: bool,
    },
    /// `t`/`T`: packet-type bitmap, optionally gated by range to a named
    /// station (the `T` variant).
    Type {
        mask: PacketKind,
        radius: Option<(String, f64)>,
        negated: bool,
        cache: RefCell<HistCache>,
    },
    /// `u`: destination-callsign wildcard matcher.
    Dest { pattern: String, negated: bool },
}

impl FilterNode {
    pub fn bounding_box(lat_n: f64, lon_w: f64, lat_s: f64, lon_e: f64, negated: bool) -> Self {
        let (lat_n, lat_s) = if lat_n >= lat_s {
            (lat_n, lat_s)
        } else {
            (lat_s, lat_n)
        };
        let (lon_w, lon_e) = if lon_w <= lon_e {
            (lon_w, lon_e)
        } else {
            (lon_e, lon_w)
        };
        FilterNode::BoundingBox {
            lat_n,
            lon_w,
            lat_s,
            lon_e,
            negated,
        }
    }

    pub fn friend(callsign: impl Into<String>, range_km: f64, negated: bool) -> Self {
        FilterNode::Friend {
            callsign: callsign.into(),
            range_km,
            negated,
            cache: RefCell::new(HistCache::default()),
        }
    }

    pub fn type_filter(mask: PacketKind, radius: Option<(String, f64)>, negated: bool) -> Self {
        FilterNode::Type {
            mask,
            radius,
            negated,
            cache: RefCell::new(HistCache::default()),
        }
    }

    fn wrap(matched: bool, negated: bool) -> FilterResult {
        if !matched {
            FilterResult::NoMatch
        } else if negated {
            FilterResult::Reject
        } else {
            FilterResult::Accept
        }
    }

    fn cached_center(
        cache: &RefCell<HistCache>,
        history: &HistoryDb,
        key: &str,
        now: Instant,
    ) -> Option<(f64, f64, f64)> {
        {
            let c = cache.borrow();
            if let (Some(at), Some(center)) = (c.at, c.center) {
                if now.duration_since(at) < HIST_CACHE_AGE {
                    return Some(center);
                }
            }
        }
        let center = history
            .lookup(key)
            .and_then(|cell| Some((cell.lat?, cell.lon?, cell.cos_lat?)));
        let mut c = cache.borrow_mut();
        c.at = Some(now);
        c.center = center;
        center
    }

    pub fn evaluate(&self, pbuf: &PBuf, history: &HistoryDb, now: Instant) -> FilterResult {
        let facets = pbuf.facets.as_ref();
        match self {
            FilterNode::BoundingBox {
                lat_n,
                lon_w,
                lat_s,
                lon_e,
                negated,
            } => {
                let matched = facets
                    .and_then(|f| Some((f.lat?, f.lon?)))
                    .map(|(lat, lon)| {
                        (*lat_s..=*lat_n).contains(&lat) && (*lon_w..=*lon_e).contains(&lon)
                    })
                    .unwrap_or(false);
                Self::wrap(matched, *negated)
            }
            FilterNode::Budlist { patterns, negated } => {
                let call = &pbuf.path.src.call;
                let matched = patterns.iter().any(|p| wildcard_match(p, call));
                Self::wrap(matched, *negated)
            }
            FilterNode::Friend {
                callsign,
                range_km,
                negated,
                cache,
            } => {
                let matched = match (
                    Self::cached_center(cache, history, callsign, now),
                    facets.and_then(|f| Some((f.lat?, f.lon?, f.cos_lat?))),
                ) {
                    (Some((clat, clon, ccos)), Some((lat, lon, _))) => {
                        haversine_km(clat, clon, ccos, lat, lon) < *range_km
                    }
                    _ => false,
                };
                Self::wrap(matched, *negated)
            }
            FilterNode::Object { pattern, negated } => {
                let matched = facets
                    .and_then(|f| f.srcname.as_deref())
                    .map(|name| wildcard_match(pattern, name))
                    .unwrap_or(false);
                Self::wrap(matched, *negated)
            }
            FilterNode::Prefix { prefix, negated } => {
                let matched = pbuf.path.src.call.starts_with(prefix.as_str());
                Self::wrap(matched, *negated)
            }
            FilterNode::Range {
                lat,
                lon,
                cos_lat,
                dist_km,
                negated,
            } => {
                let matched = facets
                    .and_then(|f| Some((f.lat?, f.lon?)))
                    .map(|(plat, plon)| {
                        let d = haversine_km(*lat, *lon, *cos_lat, plat, plon);
                        if *dist_km >= 0.0 {
                            d < *dist_km
                        } else {
                            d >= -*dist_km
                        }
                    })
                    .unwrap_or(false);
                Self::wrap(matched, *negated)
            }
            FilterNode::Symbol {
                primary,
                alternate,
                overlay,
                negated,
            } => {
                let matched = facets
                    .map(|f| {
                        let table_ok = match (primary, f.symbol_table) {
                            (Some(want), Some(got)) => *want == got,
                            (Some(_), None) => false,
                            (None, _) => true,
                        };
                        let code_ok = match (alternate, f.symbol_code) {
                            (Some(want), Some(got)) => *want == got,
                            (Some(_), None) => false,
                            (None, _) => true,
                        };
                        let overlay_ok = overlay.is_none() || table_ok;
                        table_ok && code_ok && overlay_ok
                    })
                    .unwrap_or(false);
                Self::wrap(matched, *negated)
            }
            FilterNode::Type {
                mask,
                radius,
                negated,
                cache,
            } => {
                let kind_ok = facets.map(|f| f.kind.contains(*mask)).unwrap_or(false);
                let matched = if !kind_ok {
                    false
                } else if let Some((station, dist_km)) = radius {
                    match (
                        Self::cached_center(cache, history, station, now),
                        facets.and_then(|f| Some((f.lat?, f.lon?, f.cos_lat?))),
                    ) {
                        (Some((clat, clon, ccos)), Some((lat, lon, _))) => {
                            haversine_km(clat, clon, ccos, lat, lon) < *dist_km
                        }
                        _ => false,
                    }
                } else {
                    true
                };
                Self::wrap(matched, *negated)
            }
            FilterNode::Dest { pattern, negated } => {
                let matched = wildcard_match(pattern, &pbuf.path.dest.call);
                Self::wrap(matched, *negated)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aprx_core::pbuf::{AprsFacets, PbufInner};
    use aprx_core::Ax25Path;

    fn pbuf_with(lat: f64, lon: f64, kind: PacketKind) -> PBuf {
        let path = Ax25Path::from_tnc2_prefix("N0CALL>APRS").unwrap();
        let inner = PbufInner::from_ax25(path, b"=test".to_vec(), true, 1).unwrap();
        std::sync::Arc::new(PbufInner {
            facets: Some(AprsFacets {
                kind,
                lat: Some(lat),
                lon: Some(lon),
                cos_lat: Some(lat.to_radians().cos()),
                ..Default::default()
            }),
            ..(*inner).clone()
        })
    }

    #[test]
    fn bounding_box_accepts_inside_point() {
        let node = FilterNode::bounding_box(61.0, 24.0, 59.0, 26.0, false);
        let pbuf = pbuf_with(60.0, 25.0, PacketKind::POSITION);
        let db = HistoryDb::new();
        assert_eq!(node.evaluate(&pbuf, &db, Instant::now()), FilterResult::Accept);
    }

    #[test]
    fn bounding_box_rejects_outside_point_when_negated() {
        let node = FilterNode::bounding_box(61.0, 24.0, 59.0, 26.0, true);
        let pbuf = pbuf_with(60.0, 25.0, PacketKind::POSITION);
        let db = HistoryDb::new();
        assert_eq!(node.evaluate(&pbuf, &db, Instant::now()), FilterResult::Reject);
    }

    #[test]
    fn bounding_box_no_match_without_position() {
        let node = FilterNode::bounding_box(61.0, 24.0, 59.0, 26.0, false);
        let path = Ax25Path::from_tnc2_prefix("N0CALL>APRS").unwrap();
        let pbuf = PbufInner::from_ax25(path, b">status".to_vec(), true, 1).unwrap();
        let db = HistoryDb::new();
        assert_eq!(node.evaluate(&pbuf, &db, Instant::now()), FilterResult::NoMatch);
    }

    #[test]
    fn budlist_wildcard_matches() {
        let node = FilterNode::Budlist {
            patterns: vec!["N0*".to_string()],
            negated: false,
        };
        let pbuf = pbuf_with(60.0, 25.0, PacketKind::POSITION);
        let db = HistoryDb::new();
        assert_eq!(node.evaluate(&pbuf, &db, Instant::now()), FilterResult::Accept);
    }

    #[test]
    fn range_filter_inside_radius() {
        let node = FilterNode::Range {
            lat: 60.0,
            lon: 25.0,
            cos_lat: 60.0f64.to_radians().cos(),
            dist_km: 50.0,
            negated: false,
        };
        let pbuf = pbuf_with(60.01, 25.01, PacketKind::POSITION);
        let db = HistoryDb::new();
        assert_eq!(node.evaluate(&pbuf, &db, Instant::now()), FilterResult::Accept);
    }

    #[test]
    fn range_filter_negative_distance_inverts() {
        let node = FilterNode::Range {
            lat: 60.0,
            lon: 25.0,
            cos_lat: 60.0f64.to_radians().cos(),
            dist_km: -50.0,
            negated: false,
        };
        let far = pbuf_with(10.0, 25.0, PacketKind::POSITION);
        let db = HistoryDb::new();
        assert_eq!(node.evaluate(&far, &db, Instant::now()), FilterResult::Accept);
    }

    #[test]
    fn type_filter_matches_mask() {
        let node = FilterNode::type_filter(PacketKind::WX, None, false);
        let pbuf = pbuf_with(60.0, 25.0, PacketKind::WX);
        let db = HistoryDb::new();
        assert_eq!(node.evaluate(&pbuf, &db, Instant::now()), FilterResult::Accept);
        let pbuf2 = pbuf_with(60.0, 25.0, PacketKind::STATUS);
        assert_eq!(node.evaluate(&pbuf2, &db, Instant::now()), FilterResult::NoMatch);
    }

    #[test]
    fn dest_wildcard_matches() {
        let node = FilterNode::Dest {
            pattern: "APR*".to_string(),
            negated: false,
        };
        let pbuf = pbuf_with(60.0, 25.0, PacketKind::POSITION);
        let db = HistoryDb::new();
        assert_eq!(node.evaluate(&pbuf, &db, Instant::now()), FilterResult::Accept);
    }
}
