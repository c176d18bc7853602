// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Duplicate-check cache: at most one delivery of a packet with the same
//! `(addresses, payload)` fingerprint within a 30 second window, per
//! digipeater. One `DupeCheck` instance belongs to each digipeater.

use std::time::{Duration, Instant};

use aprx_core::pbuf::PBuf;

const BUCKET_COUNT: usize = 64;
const RETENTION: Duration = Duration::from_secs(30);

/// FNV-1a over `addr` followed by `payload`, same construction as the one
/// used for the history database's key hash.
pub fn fnv1a(addr: &[u8], payload: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;
    let mut hash = OFFSET;
    for &b in addr.iter().chain(payload.iter()) {
        hash ^= b as u64;
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

/// One cached fingerprint record.
pub struct DupeRecord {
    pub hash: u64,
    pub timestamp: Instant,
    pub addr: Vec<u8>,
    pub payload: Vec<u8>,
    pub seen_direct_count: u32,
    pub seen_delayed_count: u32,
    pub seen_on_transmitter_count: u32,
    pub held_pbuf: Option<PBuf>,
}

impl DupeRecord {
    fn matches(&self, addr: &[u8], payload: &[u8]) -> bool {
        self.addr == addr && self.payload == payload
    }

    fn expired(&self, now: Instant) -> bool {
        now.duration_since(self.timestamp) > RETENTION
    }
}

/// A single digipeater's duplicate-check cache: 64 closed-chained buckets.
#[derive(Default)]
pub struct DupeCheck {
    buckets: Vec<Vec<DupeRecord>>,
}

impl DupeCheck {
    pub fn new() -> Self {
        DupeCheck {
            buckets: (0..BUCKET_COUNT).map(|_| Vec::new()).collect(),
        }
    }

    fn bucket_index(hash: u64) -> usize {
        (hash as usize) % BUCKET_COUNT
    }

    fn sweep_expired(&mut self, idx: usize, now: Instant) {
        self.buckets[idx].retain(|r| !r.expired(now));
    }

    /// Raw address+payload dedup check, bypassing PBuf/viscous-delay
    /// bookkeeping. Returns `true` if this is the first time this
    /// fingerprint has been seen within the retention window.
    pub fn dupecheck_aprs(&mut self, addr: &[u8], payload: &[u8]) -> bool {
        self.dupecheck_aprs_at(addr, payload, Instant::now())
    }

    fn dupecheck_aprs_at(&mut self, addr: &[u8], payload: &[u8], now: Instant) -> bool {
        if self.buckets.is_empty() {
            self.buckets = (0..BUCKET_COUNT).map(|_| Vec::new()).collect();
        }
        let hash = fnv1a(addr, payload);
        let idx = Self::bucket_index(hash);
        self.sweep_expired(idx, now);
        if let Some(record) = self.buckets[idx]
            .iter_mut()
            .find(|r| r.hash == hash && r.matches(addr, payload))
        {
            record.seen_direct_count += 1;
            return false;
        }
        self.buckets[idx].push(DupeRecord {
            hash,
            timestamp: now,
            addr: addr.to_vec(),
            payload: payload.to_vec(),
            seen_direct_count: 1,
            seen_delayed_count: 0,
            seen_on_transmitter_count: 0,
            held_pbuf: None,
        });
        true
    }

    /// Full PBuf-aware dedup check. `viscous_delay` above zero counts this
    /// arrival as "delayed" rather than "direct"; on first insert the PBuf
    /// itself is retained so a viscous queue can replay it later.
    pub fn dupecheck_pbuf(&mut self, pbuf: &PBuf, viscous_delay: u8) -> bool {
        self.dupecheck_pbuf_at(pbuf, viscous_delay, Instant::now())
    }

    fn dupecheck_pbuf_at(&mut self, pbuf: &PBuf, viscous_delay: u8, now: Instant) -> bool {
        if self.buckets.is_empty() {
            self.buckets = (0..BUCKET_COUNT).map(|_| Vec::new()).collect();
        }
        let addr = pbuf.path.encode();
        let hash = fnv1a(&addr, &pbuf.info);
        let idx = Self::bucket_index(hash);
        self.sweep_expired(idx, now);
        if let Some(record) = self.buckets[idx]
            .iter_mut()
            .find(|r| r.hash == hash && r.matches(&addr, &pbuf.info))
        {
            if viscous_delay > 0 {
                record.seen_delayed_count += 1;
            } else {
                record.seen_direct_count += 1;
            }
            return false;
        }
        self.buckets[idx].push(DupeRecord {
            hash,
            timestamp: now,
            addr,
            payload: pbuf.info.clone(),
            seen_direct_count: (viscous_delay == 0) as u32,
            seen_delayed_count: (viscous_delay > 0) as u32,
            seen_on_transmitter_count: 0,
            held_pbuf: Some(pbuf.clone()),
        });
        true
    }

    /// Record that the same fingerprint was also heard directly from the
    /// transmitting interface itself — used by the digipeater's "probably
    /// heard directly" heuristic.
    pub fn note_seen_on_transmitter(&mut self, addr: &[u8], payload: &[u8]) {
        let hash = fnv1a(addr, payload);
        let idx = Self::bucket_index(hash);
        if let Some(record) = self.buckets[idx]
            .iter_mut()
            .find(|r| r.hash == hash && r.matches(addr, payload))
        {
            record.seen_on_transmitter_count += 1;
        }
    }

    pub fn lookup(&self, addr: &[u8], payload: &[u8]) -> Option<&DupeRecord> {
        let hash = fnv1a(addr, payload);
        let idx = Self::bucket_index(hash);
        self.buckets[idx]
            .iter()
            .find(|r| r.hash == hash && r.matches(addr, payload))
    }

    /// Total number of live (non-expired) records across all buckets.
    pub fn len(&self, now: Instant) -> usize {
        self.buckets
            .iter()
            .map(|b| b.iter().filter(|r| !r.expired(now)).count())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn first_insert_is_reported_as_new() {
        let mut dc = DupeCheck::new();
        assert!(dc.dupecheck_aprs(b"addr", b"payload"));
    }

    #[test]
    fn repeat_within_window_is_not_new() {
        let mut dc = DupeCheck::new();
        assert!(dc.dupecheck_aprs(b"addr", b"payload"));
        assert!(!dc.dupecheck_aprs(b"addr", b"payload"));
        let record = dc.lookup(b"addr", b"payload").unwrap();
        assert_eq!(record.seen_direct_count, 2);
    }

    #[test]
    fn different_payload_is_a_distinct_fingerprint() {
        let mut dc = DupeCheck::new();
        assert!(dc.dupecheck_aprs(b"addr", b"payload-a"));
        assert!(dc.dupecheck_aprs(b"addr", b"payload-b"));
    }

    #[test]
    fn expired_record_is_treated_as_new_again() {
        let mut dc = DupeCheck::new();
        let t0 = Instant::now();
        assert!(dc.dupecheck_aprs_at(b"addr", b"payload", t0));
        let later = t0 + Duration::from_secs(31);
        assert!(dc.dupecheck_aprs_at(b"addr", b"payload", later));
    }

    #[test]
    fn viscous_delay_increments_delayed_not_direct() {
        let mut dc = DupeCheck::new();
        let path = aprx_core::Ax25Path::from_tnc2_prefix("N0CALL>APRS,WIDE2-2").unwrap();
        let pbuf =
            aprx_core::pbuf::PbufInner::from_ax25(path, b"=test".to_vec(), true, 1).unwrap();
        assert!(dc.dupecheck_pbuf(&pbuf, 3));
        assert!(!dc.dupecheck_pbuf(&pbuf, 3));
        let addr = pbuf.path.encode();
        let record = dc.lookup(&addr, &pbuf.info).unwrap();
        assert_eq!(record.seen_delayed_count, 2);
        assert_eq!(record.seen_direct_count, 0);
        assert!(record.held_pbuf.is_some());
    }
}
