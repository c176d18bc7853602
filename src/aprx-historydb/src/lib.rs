// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! History database: one instance per digipeater, recording the most
//! recent observation of every station/object/item it has seen, for
//! Tx-iGate decisions and the filter engine's history-dependent filter
//! kinds (`f`/`r`/`t`).

use std::collections::HashMap;
use std::time::{Duration, Instant};

use aprx_core::pbuf::{AprsFacets, PacketKind, PBuf};
use aprx_core::IfGroup;

const BUCKET_COUNT: usize = 128;
const RETENTION: Duration = Duration::from_secs(3600);
const LOOKUP_MARGIN: Duration = Duration::from_secs(300);
const TOKEN_BUCKET_INITIAL: f64 = 32.0;

fn fnv1a(key: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;
    let mut hash = OFFSET;
    for &b in key {
        hash ^= b as u64;
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

fn bucket_index(hash: u64) -> usize {
    // Fold high and mid bits into the low bucket-index bits, as the
    // dupecheck/history bucket selection convention does throughout this
    // workspace.
    let folded = hash ^ (hash >> 32) ^ (hash >> 16);
    (folded as usize) % BUCKET_COUNT
}

/// One station/object/item's most recent observation.
#[derive(Debug, Clone)]
pub struct HistoryCell {
    pub key: String,
    pub first_seen: Instant,
    pub timestamp: Instant,
    pub last_position_time: Option<Instant>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub cos_lat: Option<f64>,
    pub packet_kind: PacketKind,
    pub last_heard_at: HashMap<IfGroup, Instant>,
    pub last_packet_bytes: Vec<u8>,
    pub token_bucket: f64,
}

impl HistoryCell {
    fn new(key: String, now: Instant) -> Self {
        HistoryCell {
            key,
            first_seen: now,
            timestamp: now,
            last_position_time: None,
            lat: None,
            lon: None,
            cos_lat: None,
            packet_kind: PacketKind::NONE,
            last_heard_at: HashMap::new(),
            last_packet_bytes: Vec::new(),
            token_bucket: TOKEN_BUCKET_INITIAL,
        }
    }

    fn expired(&self, now: Instant) -> bool {
        now.duration_since(self.timestamp) > RETENTION
    }

    fn valid_for_lookup(&self, now: Instant) -> bool {
        now.duration_since(self.timestamp) < RETENTION.saturating_sub(LOOKUP_MARGIN)
    }

    /// Whether an inner third-party path segment marks this sender as
    /// having been reached over the internet (`TCPIP*`/`TCPXX*`).
    pub fn reached_via_internet(&self) -> bool {
        self.last_heard_at.contains_key(&aprx_core::IFGROUP_APRSIS)
    }
}

/// Derive the history key for a packet per its content type: object/item
/// name when present, else the source callsign (covers messages, which key
/// on the sending station, and plain position/status/general traffic).
fn history_key(pbuf: &PBuf, facets: &AprsFacets) -> String {
    if facets.kind.contains(PacketKind::OBJECT) || facets.kind.contains(PacketKind::ITEM) {
        if let Some(name) = &facets.srcname {
            return name.clone();
        }
    }
    pbuf.path.src.call.clone()
}

/// Whether a packet's facets qualify it for a full `insert` (position, or
/// message/object/item, or unparsed "general" traffic) versus only the
/// heard-timestamp bookkeeping `insert_heard` always performs.
fn qualifies_for_insert(facets: &AprsFacets) -> bool {
    facets.has_position()
        || facets.kind.contains(PacketKind::MESSAGE)
        || facets.kind.contains(PacketKind::OBJECT)
        || facets.kind.contains(PacketKind::ITEM)
        || facets.kind == PacketKind::NONE
}

#[derive(Default)]
pub struct HistoryDb {
    buckets: Vec<Vec<HistoryCell>>,
}

impl HistoryDb {
    pub fn new() -> Self {
        HistoryDb {
            buckets: (0..BUCKET_COUNT).map(|_| Vec::new()).collect(),
        }
    }

    fn ensure_buckets(&mut self) {
        if self.buckets.is_empty() {
            self.buckets = (0..BUCKET_COUNT).map(|_| Vec::new()).collect();
        }
    }

    fn find_mut(&mut self, key: &str) -> Option<&mut HistoryCell> {
        let idx = bucket_index(fnv1a(key.as_bytes()));
        self.buckets[idx].iter_mut().find(|c| c.key == key)
    }

    /// Insert or refresh a cell for a packet carrying position, a message,
    /// or an object/item update. Killed objects/items (name suffix `_`)
    /// still update the cell but must not clobber a previously recorded
    /// position — callers pass the same facets either way; position fields
    /// are only overwritten when the new facets carry one.
    pub fn insert(&mut self, pbuf: &PBuf) {
        self.insert_at(pbuf, Instant::now());
    }

    fn insert_at(&mut self, pbuf: &PBuf, now: Instant) {
        let Some(facets) = &pbuf.facets else {
            return;
        };
        if !qualifies_for_insert(facets) {
            return;
        }
        let key = history_key(pbuf, facets);
        self.ensure_buckets();
        let idx = bucket_index(fnv1a(key.as_bytes()));
        let bucket = &mut self.buckets[idx];
        if let Some(cell) = bucket.iter_mut().find(|c| c.key == key) {
            cell.timestamp = now;
            cell.packet_kind |= facets.kind;
            cell.last_packet_bytes = pbuf.info.clone();
            if let (Some(lat), Some(lon)) = (facets.lat, facets.lon) {
                cell.lat = Some(lat);
                cell.lon = Some(lon);
                cell.cos_lat = facets.cos_lat;
                cell.last_position_time = Some(now);
            }
        } else {
            let mut cell = HistoryCell::new(key, now);
            cell.packet_kind = facets.kind;
            cell.last_packet_bytes = pbuf.info.clone();
            if let (Some(lat), Some(lon)) = (facets.lat, facets.lon) {
                cell.lat = Some(lat);
                cell.lon = Some(lon);
                cell.cos_lat = facets.cos_lat;
                cell.last_position_time = Some(now);
            }
            bucket.push(cell);
        }
    }

    /// Record that a packet was heard on `ifgroup`, independent of whether
    /// it qualified for a full [`Self::insert`]. Never stores a message
    /// body on top of a positional entry.
    pub fn insert_heard(&mut self, pbuf: &PBuf, ifgroup: IfGroup) {
        self.insert_heard_at(pbuf, ifgroup, Instant::now());
    }

    fn insert_heard_at(&mut self, pbuf: &PBuf, ifgroup: IfGroup, now: Instant) {
        let key = pbuf
            .facets
            .as_ref()
            .map(|f| history_key(pbuf, f))
            .unwrap_or_else(|| pbuf.path.src.call.clone());
        self.ensure_buckets();
        let idx = bucket_index(fnv1a(key.as_bytes()));
        let bucket = &mut self.buckets[idx];
        if let Some(cell) = bucket.iter_mut().find(|c| c.key == key) {
            cell.last_heard_at.insert(ifgroup, now);
        } else {
            let mut cell = HistoryCell::new(key, now);
            cell.last_heard_at.insert(ifgroup, now);
            bucket.push(cell);
        }
    }

    pub fn lookup(&self, key: &str) -> Option<&HistoryCell> {
        self.lookup_at(key, Instant::now())
    }

    fn lookup_at(&self, key: &str, now: Instant) -> Option<&HistoryCell> {
        let idx = bucket_index(fnv1a(key.as_bytes()));
        self.buckets
            .get(idx)?
            .iter()
            .find(|c| c.key == key && c.valid_for_lookup(now))
    }

    /// Sweep all buckets dropping expired cells. Intended to run once a
    /// minute from the main event loop.
    pub fn sweep_expired(&mut self) {
        self.sweep_expired_at(Instant::now());
    }

    fn sweep_expired_at(&mut self, now: Instant) {
        for bucket in &mut self.buckets {
            bucket.retain(|c| !c.expired(now));
        }
    }
}
