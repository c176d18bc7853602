// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Per-source reject filters: configured regexes over source/destination/
//! via/data fields, plus the hardcoded reserved-callsign list on source/
//! destination/via.

use regex::Regex;
use tracing::warn;

use aprx_core::pbuf::PBuf;
use aprx_digipeater::tables::is_reserved;

use crate::config::RegexFilterConfig;

/// Compiled form of a source's `regex-filter` config entries.
#[derive(Default)]
pub struct CompiledRegexFilter {
    source: Vec<Regex>,
    destination: Vec<Regex>,
    via: Vec<Regex>,
    data: Vec<Regex>,
}

impl CompiledRegexFilter {
    pub fn compile(cfg: &RegexFilterConfig, source_label: &str) -> Self {
        let build = |patterns: &[String], field: &str| {
            patterns
                .iter()
                .filter_map(|p| match Regex::new(p) {
                    Ok(re) => Some(re),
                    Err(e) => {
                        warn!(source = source_label, field, pattern = p, error = %e, "bad regex-filter pattern, ignoring");
                        None
                    }
                })
                .collect()
        };
        CompiledRegexFilter {
            source: build(&cfg.source, "source"),
            destination: build(&cfg.destination, "destination"),
            via: build(&cfg.via, "via"),
            data: build(&cfg.data, "data"),
        }
    }

    /// Whether `pbuf` is rejected by this source's regex-reject filters or
    /// the hardcoded reserved-callsign list (source/destination/via only;
    /// the data field gets no reserved-callsign treatment).
    pub fn rejects(&self, pbuf: &PBuf, mycall: &str) -> bool {
        let src = &pbuf.path.src.call;
        if is_reserved(src, mycall) || self.source.iter().any(|re| re.is_match(src)) {
            return true;
        }
        let dest = &pbuf.path.dest.call;
        if is_reserved(dest, mycall) || self.destination.iter().any(|re| re.is_match(dest)) {
            return true;
        }
        if pbuf
            .path
            .vias
            .iter()
            .any(|v| is_reserved(&v.call, mycall) || self.via.iter().any(|re| re.is_match(&v.call)))
        {
            return true;
        }
        let data = String::from_utf8_lossy(&pbuf.info);
        self.data.iter().any(|re| re.is_match(&data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aprx_core::pbuf::PbufInner;
    use aprx_core::Ax25Path;

    fn pbuf(path_str: &str) -> PBuf {
        let path = Ax25Path::from_tnc2_prefix(path_str).unwrap();
        PbufInner::from_ax25(path, b"=test".to_vec(), true, 1).unwrap()
    }

    #[test]
    fn reserved_source_is_rejected() {
        let filter = CompiledRegexFilter::default();
        let pb = pbuf("N0CALL>APRS,WIDE2-2");
        assert!(filter.rejects(&pb, "MYDIGI"));
    }

    #[test]
    fn configured_source_regex_rejects() {
        let cfg = RegexFilterConfig {
            source: vec!["^OH1.*".to_string()],
            ..Default::default()
        };
        let filter = CompiledRegexFilter::compile(&cfg, "test");
        let pb = pbuf("OH1ABC>APRS,WIDE2-2");
        assert!(filter.rejects(&pb, "MYDIGI"));
    }

    #[test]
    fn unmatched_source_passes() {
        let filter = CompiledRegexFilter::default();
        let pb = pbuf("OH2XYZ>APRS,WIDE2-2");
        assert!(!filter.rejects(&pb, "MYDIGI"));
    }

    #[test]
    fn bad_regex_pattern_is_ignored_not_fatal() {
        let cfg = RegexFilterConfig {
            source: vec!["(unclosed".to_string()],
            ..Default::default()
        };
        let filter = CompiledRegexFilter::compile(&cfg, "test");
        let pb = pbuf("OH2XYZ>APRS,WIDE2-2");
        assert!(!filter.rejects(&pb, "MYDIGI"));
    }
}
