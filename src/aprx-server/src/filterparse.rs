// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Parses an APRS-IS-compatible filter string (space-separated tokens, one
//! per filter node) into an [`aprx_filter::FilterChain`].

use aprx_core::pbuf::PacketKind;
use aprx_filter::{FilterChain, FilterNode};

/// Parse `spec` into a chain, skipping (and warning about) any token that
/// doesn't parse. A blank or whitespace-only spec yields an empty chain.
pub fn parse_filter(spec: &str) -> FilterChain {
    let mut chain = FilterChain::new();
    for token in spec.split_whitespace() {
        match parse_token(token) {
            Some(node) => chain.push(node),
            None => tracing::warn!(token, "unrecognized filter token, ignoring"),
        }
    }
    chain
}

fn parse_token(token: &str) -> Option<FilterNode> {
    let (negated, rest) = match token.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, token),
    };
    let mut parts = rest.splitn(2, '/');
    let kind = parts.next()?;
    let args = parts.next().unwrap_or("");
    let fields: Vec<&str> = args.split('/').collect();

    match kind {
        "a" | "A" => {
            let [lat_n, lon_w, lat_s, lon_e] = fields.as_slice() else {
                return None;
            };
            Some(FilterNode::bounding_box(
                lat_n.parse().ok()?,
                lon_w.parse().ok()?,
                lat_s.parse().ok()?,
                lon_e.parse().ok()?,
                negated || kind == "A",
            ))
        }
        "b" => Some(FilterNode::Budlist {
            patterns: fields.iter().map(|s| s.to_string()).collect(),
            negated,
        }),
        "f" => {
            let [call, km] = fields.as_slice() else { return None };
            Some(FilterNode::friend(*call, km.parse().ok()?, negated))
        }
        "o" => Some(FilterNode::Object {
            pattern: fields.first()?.to_string(),
            negated,
        }),
        "p" => Some(FilterNode::Prefix {
            prefix: fields.first()?.to_string(),
            negated,
        }),
        "r" => {
            let [lat, lon, km] = fields.as_slice() else { return None };
            let lat: f64 = lat.parse().ok()?;
            Some(FilterNode::Range {
                lat,
                lon: lon.parse().ok()?,
                cos_lat: lat.to_radians().cos(),
                dist_km: km.parse().ok()?,
                negated,
            })
        }
        "s" => {
            let char_at = |i: usize| fields.get(i).and_then(|s| s.chars().next());
            Some(FilterNode::Symbol {
                primary: char_at(0),
                alternate: char_at(1),
                overlay: char_at(2),
                negated,
            })
        }
        "t" | "T" => {
            let mask = fields.first()?.chars().fold(PacketKind::NONE, |acc, c| {
                acc | type_letter_kind(c)
            });
            let radius = if kind == "T" {
                let station = (*fields.get(1)?).to_string();
                let km: f64 = fields.get(2)?.parse().ok()?;
                Some((station, km))
            } else {
                None
            };
            Some(FilterNode::type_filter(mask, radius, negated))
        }
        "u" => Some(FilterNode::Dest {
            pattern: fields.first()?.to_string(),
            negated,
        }),
        _ => None,
    }
}

fn type_letter_kind(c: char) -> PacketKind {
    match c {
        'p' => PacketKind::POSITION,
        'o' => PacketKind::OBJECT,
        'i' => PacketKind::ITEM,
        'm' => PacketKind::MESSAGE,
        'n' => PacketKind::NWS,
        't' => PacketKind::TELEMETRY,
        'w' => PacketKind::WX,
        'u' => PacketKind::USERDEF,
        's' => PacketKind::STATUS,
        'q' => PacketKind::QUERY,
        _ => PacketKind::NONE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aprx_core::pbuf::{AprsFacets, PbufInner};
    use aprx_core::Ax25Path;
    use aprx_filter::FilterResult;
    use aprx_historydb::HistoryDb;

    fn pbuf_with(lat: f64, lon: f64) -> aprx_core::pbuf::PBuf {
        let path = Ax25Path::from_tnc2_prefix("N0CALL>APRS").unwrap();
        let inner = PbufInner::from_ax25(path, b"=test".to_vec(), true, 1).unwrap();
        std::sync::Arc::new(PbufInner {
            facets: Some(AprsFacets {
                kind: PacketKind::POSITION,
                lat: Some(lat),
                lon: Some(lon),
                cos_lat: Some(lat.to_radians().cos()),
                ..Default::default()
            }),
            ..(*inner).clone()
        })
    }

    #[test]
    fn bounding_box_token_parses_and_matches() {
        let chain = parse_filter("a/61.0/24.0/59.0/26.0");
        let db = HistoryDb::new();
        assert_eq!(chain.evaluate(&pbuf_with(60.0, 25.0), &db), FilterResult::Accept);
    }

    #[test]
    fn negated_prefix_token_rejects() {
        let chain = parse_filter("-p/N0C");
        let db = HistoryDb::new();
        assert_eq!(chain.evaluate(&pbuf_with(60.0, 25.0), &db), FilterResult::Reject);
    }

    #[test]
    fn multiple_tokens_combine() {
        let chain = parse_filter("r/60.0/25.0/10 p/ZZ");
        let db = HistoryDb::new();
        assert_eq!(chain.evaluate(&pbuf_with(60.01, 25.01), &db), FilterResult::Accept);
    }

    #[test]
    fn unrecognized_token_is_skipped() {
        let chain = parse_filter("q/nonsense");
        let db = HistoryDb::new();
        assert_eq!(chain.evaluate(&pbuf_with(60.0, 25.0), &db), FilterResult::NoMatch);
    }
}
