// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! The interface registry: every configured radio interface's identity and
//! outbound channel, keyed by a stable index so digipeaters and sources can
//! reference each other without owning cycles.

use std::collections::HashMap;

use tokio::sync::mpsc;

use aprx_core::{IfGroup, InterfaceIndex};

/// One frame queued for transmission on an interface's transport.
#[derive(Debug, Clone)]
pub struct TxFrame {
    pub bytes: Vec<u8>,
}

/// A handle to a single configured interface: its identity and the channel
/// feeding its transport task. One `InterfaceHandle` is created per
/// `[[interface]]` block in `main.rs` and stored in the registry passed to
/// every digipeater and the beacon scheduler.
#[derive(Debug, Clone)]
pub struct InterfaceHandle {
    pub index: InterfaceIndex,
    pub callsign: String,
    pub ifgroup: IfGroup,
    pub tx_ok: bool,
    pub tx: mpsc::Sender<TxFrame>,
}

impl InterfaceHandle {
    /// Queue a frame for transmission. Drops silently (counted by the
    /// caller as `TxCapacityExhausted`) if the transport's queue is full or
    /// the interface is receive-only.
    pub fn try_send(&self, frame: TxFrame) -> bool {
        self.tx_ok && self.tx.try_send(frame).is_ok()
    }
}

/// Lookup table over every configured interface, keyed both by stable index
/// and by callsign (for via-field transmitter matching).
#[derive(Debug, Default)]
pub struct InterfaceRegistry {
    by_index: HashMap<InterfaceIndex, InterfaceHandle>,
    by_callsign: HashMap<String, InterfaceIndex>,
}

impl InterfaceRegistry {
    pub fn new() -> Self {
        InterfaceRegistry::default()
    }

    pub fn insert(&mut self, handle: InterfaceHandle) {
        self.by_callsign
            .insert(handle.callsign.to_ascii_uppercase(), handle.index);
        self.by_index.insert(handle.index, handle);
    }

    pub fn find_by_index(&self, index: InterfaceIndex) -> Option<&InterfaceHandle> {
        self.by_index.get(&index)
    }

    pub fn find_by_callsign(&self, callsign: &str) -> Option<&InterfaceHandle> {
        self.by_callsign
            .get(&callsign.to_ascii_uppercase())
            .and_then(|idx| self.by_index.get(idx))
    }

    pub fn iter(&self) -> impl Iterator<Item = &InterfaceHandle> {
        self.by_index.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(index: u32, callsign: &str) -> (InterfaceHandle, mpsc::Receiver<TxFrame>) {
        let (tx, rx) = mpsc::channel(8);
        (
            InterfaceHandle {
                index: InterfaceIndex(index),
                callsign: callsign.to_string(),
                ifgroup: 1,
                tx_ok: true,
                tx,
            },
            rx,
        )
    }

    #[test]
    fn lookup_by_index_and_callsign() {
        let mut registry = InterfaceRegistry::new();
        let (h, _rx) = handle(0, "OH2XYZ-1");
        registry.insert(h);

        assert!(registry.find_by_index(InterfaceIndex(0)).is_some());
        assert!(registry.find_by_callsign("oh2xyz-1").is_some());
        assert!(registry.find_by_callsign("OH2XYZ-2").is_none());
    }

    #[test]
    fn receive_only_interface_refuses_send() {
        let (tx, mut rx) = mpsc::channel(8);
        let handle = InterfaceHandle {
            index: InterfaceIndex(0),
            callsign: "OH2XYZ-1".to_string(),
            ifgroup: 1,
            tx_ok: false,
            tx,
        };
        assert!(!handle.try_send(TxFrame { bytes: vec![1, 2, 3] }));
        assert!(rx.try_recv().is_err());
    }
}
