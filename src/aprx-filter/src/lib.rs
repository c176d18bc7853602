// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! The APRS-IS-compatible filter DSL: a linked chain of typed filter nodes
//! evaluated against a PBuf, with negation short-circuit semantics.

pub mod geo;
pub mod node;

use std::time::Instant;

use aprx_core::pbuf::PBuf;
use aprx_historydb::HistoryDb;

pub use node::{FilterNode, FilterResult};

/// An ordered chain of filter nodes attached to one digipeater source.
#[derive(Default)]
pub struct FilterChain {
    nodes: Vec<FilterNode>,
}

impl FilterChain {
    pub fn new() -> Self {
        FilterChain { nodes: Vec::new() }
    }

    pub fn push(&mut self, node: FilterNode) {
        self.nodes.push(node);
    }

    /// Evaluate every node in order. A negated node that matches rejects
    /// immediately, stopping evaluation; otherwise the chain accepts if any
    /// node matched positively, and falls through to `NoMatch` if none did.
    pub fn evaluate(&self, pbuf: &PBuf, history: &HistoryDb) -> FilterResult {
        self.evaluate_at(pbuf, history, Instant::now())
    }

    fn evaluate_at(&self, pbuf: &PBuf, history: &HistoryDb, now: Instant) -> FilterResult {
        let mut accepted = false;
        for node in &self.nodes {
            match node.evaluate(pbuf, history, now) {
                FilterResult::Reject => return FilterResult::Reject,
                FilterResult::Accept => accepted = true,
                FilterResult::NoMatch => {}
            }
        }
        if accepted {
            FilterResult::Accept
        } else {
            FilterResult::NoMatch
        }
    }
}
