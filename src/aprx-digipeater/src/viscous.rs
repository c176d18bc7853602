// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! The viscous-delay queue: packets held for a source-configured number of
//! seconds so a more-direct copy can preempt them before transmission.

use std::time::{Duration, Instant};

use aprx_core::pbuf::PBuf;

pub struct ViscousEntry {
    pub pbuf: PBuf,
    pub deadline: Instant,
}

#[derive(Default)]
pub struct ViscousQueue {
    entries: Vec<ViscousEntry>,
}

impl ViscousQueue {
    pub fn new() -> Self {
        ViscousQueue { entries: Vec::new() }
    }

    /// Hold `pbuf` for `delay` seconds before it's eligible for replay.
    pub fn push(&mut self, pbuf: PBuf, delay: u8) {
        self.push_at(pbuf, delay, Instant::now());
    }

    fn push_at(&mut self, pbuf: PBuf, delay: u8, now: Instant) {
        self.entries.push(ViscousEntry {
            pbuf,
            deadline: now + Duration::from_secs(delay as u64),
        });
    }

    /// Cancel (drop without emission) any entry matching the same
    /// address+payload fingerprint as `addr`/`payload` — a more-direct copy
    /// of the same packet has already been transmitted.
    pub fn cancel_matching(&mut self, addr: &[u8], payload: &[u8]) {
        self.entries
            .retain(|e| e.pbuf.path.encode() != addr || e.pbuf.info != payload);
    }

    /// The nearest deadline across all held entries, for bounding the main
    /// event loop's sleep.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.entries.iter().map(|e| e.deadline).min()
    }

    /// Drain and return every entry whose deadline has passed.
    pub fn drain_due(&mut self, now: Instant) -> Vec<PBuf> {
        let mut due = Vec::new();
        self.entries.retain(|e| {
            if e.deadline <= now {
                due.push(e.pbuf.clone());
                false
            } else {
                true
            }
        });
        due
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aprx_core::pbuf::PbufInner;
    use aprx_core::Ax25Path;

    fn pbuf() -> PBuf {
        let path = Ax25Path::from_tnc2_prefix("N0CALL>APRS,WIDE2-1").unwrap();
        PbufInner::from_ax25(path, b"=test".to_vec(), true, 1).unwrap()
    }

    #[test]
    fn next_deadline_is_nearest_entry() {
        let mut q = ViscousQueue::new();
        let t0 = Instant::now();
        q.push_at(pbuf(), 3, t0);
        q.push_at(pbuf(), 1, t0);
        let deadline = q.next_deadline().unwrap();
        assert!(deadline <= t0 + Duration::from_secs(1) + Duration::from_millis(1));
    }

    #[test]
    fn drain_due_only_returns_expired_entries() {
        let mut q = ViscousQueue::new();
        let t0 = Instant::now();
        q.push_at(pbuf(), 1, t0);
        q.push_at(pbuf(), 5, t0);
        let due = q.drain_due(t0 + Duration::from_secs(2));
        assert_eq!(due.len(), 1);
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn cancel_matching_removes_fingerprint() {
        let mut q = ViscousQueue::new();
        let p = pbuf();
        q.push(p.clone(), 5);
        assert_eq!(q.len(), 1);
        let addr = p.path.encode();
        q.cancel_matching(&addr, &p.info);
        assert!(q.is_empty());
    }
}
