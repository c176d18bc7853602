// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! The digipeater: hop-count analysis, alias/transmitter substitution,
//! SSID decrement, and frame emission for one tx-capable radio interface.

pub mod hops;
pub mod rewrite;
pub mod tables;
pub mod viscous;

use std::time::Instant;

use aprx_core::ax25::{Ax25Address, Ax25Path};
use aprx_core::pbuf::PBuf;
use aprx_core::DropReason;
use aprx_dupecheck::DupeCheck;
use aprx_historydb::HistoryDb;

use hops::{analyze_hops, hop_budget_ok, is_transmitter_loop, probably_heard_directly};
use rewrite::rewrite_for_digipeat;
use tables::TraceWideTable;
use viscous::ViscousQueue;

/// Result of running one PBuf through [`Digipeater::receive`].
pub enum DigipeatOutcome {
    /// A retransmission-ready address path: emit the original info bytes
    /// under this rewritten path via the transmitter interface.
    Emit(Ax25Path),
    /// Held in the viscous-delay queue; will be replayed by
    /// [`Digipeater::run_viscous_queue`] unless preempted.
    Queued,
    /// Recognized duplicate within the retention window; no action taken.
    Duplicate,
    /// Not forwarded, with the reason for counters/logging.
    Dropped(DropReason),
}

/// One tx-capable radio interface's digipeating state: its transmitter
/// identity, TRACE/WIDE tables, dup-check cache, and history database.
pub struct Digipeater {
    pub transmitter: Ax25Address,
    pub aliases: Vec<String>,
    pub trace_table: TraceWideTable,
    pub wide_table: TraceWideTable,
    pub dupecheck: DupeCheck,
    pub historydb: HistoryDb,
    viscous: ViscousQueue,
}

impl Digipeater {
    pub fn new(transmitter: Ax25Address, aliases: Vec<String>) -> Self {
        Digipeater {
            transmitter,
            aliases,
            trace_table: TraceWideTable::default_trace(),
            wide_table: TraceWideTable::default_wide(),
            dupecheck: DupeCheck::new(),
            historydb: HistoryDb::new(),
            viscous: ViscousQueue::new(),
        }
    }

    fn any_transmitter_loop(&self, path: &Ax25Path) -> bool {
        path.vias
            .iter()
            .any(|v| is_transmitter_loop(v, &self.transmitter))
    }

    /// Process one received PBuf, already filter-approved by its source.
    /// `source_trace`/`source_wide` are the source's own TRACE/WIDE
    /// overrides, if configured. `viscous_delay` is the source's
    /// configured delay in seconds; `directonly` restricts forwarding to
    /// packets that were probably heard directly.
    pub fn receive(
        &mut self,
        pbuf: &PBuf,
        source_trace: Option<&TraceWideTable>,
        source_wide: Option<&TraceWideTable>,
        viscous_delay: u8,
        directonly: bool,
    ) -> DigipeatOutcome {
        self.receive_at(
            pbuf,
            source_trace,
            source_wide,
            viscous_delay,
            directonly,
            Instant::now(),
        )
    }

    fn receive_at(
        &mut self,
        pbuf: &PBuf,
        source_trace: Option<&TraceWideTable>,
        source_wide: Option<&TraceWideTable>,
        viscous_delay: u8,
        directonly: bool,
        now: Instant,
    ) -> DigipeatOutcome {
        let is_new = self.dupecheck.dupecheck_pbuf(pbuf, viscous_delay);
        if !is_new {
            return DigipeatOutcome::Duplicate;
        }
        if viscous_delay > 0 {
            self.viscous.push(pbuf.clone(), viscous_delay);
            return DigipeatOutcome::Queued;
        }
        self.rewrite_and_emit(pbuf, source_trace, source_wide, directonly, now)
    }

    fn rewrite_and_emit(
        &mut self,
        pbuf: &PBuf,
        source_trace: Option<&TraceWideTable>,
        source_wide: Option<&TraceWideTable>,
        directonly: bool,
        _now: Instant,
    ) -> DigipeatOutcome {
        let path = &pbuf.path;

        if self.any_transmitter_loop(path) {
            return DigipeatOutcome::Dropped(DropReason::RoutingLoop);
        }

        let analysis = analyze_hops(
            path,
            source_trace,
            &self.trace_table,
            source_wide,
            &self.wide_table,
        );
        let probably_direct = probably_heard_directly(path, &self.trace_table);

        if directonly && !probably_direct {
            return DigipeatOutcome::Dropped(DropReason::HopBudgetExceeded);
        }

        if !hop_budget_ok(&analysis, &self.trace_table, &self.wide_table, probably_direct) {
            return DigipeatOutcome::Dropped(DropReason::HopBudgetExceeded);
        }

        match rewrite_for_digipeat(
            path,
            &self.transmitter,
            &self.aliases,
            source_trace,
            &self.trace_table,
            source_wide,
            &self.wide_table,
        ) {
            Some(rewritten) => DigipeatOutcome::Emit(rewritten),
            None => DigipeatOutcome::Dropped(DropReason::HopBudgetExceeded),
        }
    }

    /// Nearest viscous-queue deadline, for bounding the main loop's sleep.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.viscous.next_deadline()
    }

    /// Drain and re-run every viscous-queue entry whose deadline has
    /// passed. Entries already canceled by a direct arrival are gone by
    /// the time this runs.
    pub fn run_viscous_queue(&mut self, now: Instant) -> Vec<DigipeatOutcome> {
        self.viscous
            .drain_due(now)
            .into_iter()
            .map(|pbuf| self.rewrite_and_emit(&pbuf, None, None, false, now))
            .collect()
    }

    /// Cancel a queued entry because the same fingerprint arrived directly
    /// (or via the transmitter itself) before its viscous delay expired.
    pub fn cancel_viscous(&mut self, addr: &[u8], payload: &[u8]) {
        self.viscous.cancel_matching(addr, payload);
        self.dupecheck.note_seen_on_transmitter(addr, payload);
    }
}
