// Snowcap: Synthesizing Network-Wide Configuration Updates
// Copyright (C) 2021  Tibor Schneider
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! The link-state database: one sequenced link-vector record per origin, aged out when stale.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::graph::Graph;

/// Default age-out window for an LSDB entry with no refresh, per `spec.md` §4.4.
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(60);

/// One origin's latest accepted link vector.
#[derive(Debug, Clone)]
pub struct LsdbEntry {
    /// The origin's sequence number at the time this entry was recorded.
    pub seq: u64,
    /// `neighbor -> cost` as advertised by the origin.
    pub links: HashMap<String, u32>,
    /// When this entry was last (re)written, for age-out.
    pub last_seen: Instant,
}

/// Per-origin sequenced link vectors, aged out after `max_age` with no refresh.
///
/// Entries arrive out of order over a flooded network; only a strictly newer sequence number for
/// a given origin is accepted, so replays and reorderings are naturally ignored.
#[derive(Debug)]
pub struct LinkStateDb {
    max_age: Duration,
    entries: HashMap<String, LsdbEntry>,
}

impl LinkStateDb {
    /// Creates an empty database with the given age-out window.
    pub fn new(max_age: Duration) -> Self {
        Self { max_age, entries: HashMap::new() }
    }

    /// Applies an LSP from `origin` carrying `seq` and `links`.
    ///
    /// Accepts iff there is no prior record for `origin` or `seq` is strictly greater than the
    /// stored sequence number; returns whether the entry was updated.
    pub fn apply_lsp(&mut self, origin: &str, seq: u64, links: HashMap<String, u32>) -> bool {
        let accept = match self.entries.get(origin) {
            None => true,
            Some(cur) => seq > cur.seq,
        };
        if accept {
            self.entries.insert(origin.to_string(), LsdbEntry { seq, links, last_seen: Instant::now() });
        }
        accept
    }

    /// Drops every entry whose age exceeds `max_age`.
    pub fn age_out(&mut self) {
        let max_age = self.max_age;
        self.entries.retain(|_, e| e.last_seen.elapsed() <= max_age);
    }

    /// Materializes the directed adjacency view `{origin -> {neighbor -> cost}}` from all
    /// non-expired entries. Does not itself call [`Self::age_out`]; callers recompute SPF right
    /// after aging out so the two stay in lockstep.
    pub fn graph(&self) -> Graph {
        self.entries.iter().map(|(origin, e)| (origin.clone(), e.links.clone())).collect()
    }

    /// The stored sequence number for `origin`, if any.
    pub fn seq_of(&self, origin: &str) -> Option<u64> {
        self.entries.get(origin).map(|e| e.seq)
    }

    /// Number of origins currently tracked.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no origin is currently tracked.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshot of every tracked origin's record, for the `lsdb` console command.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &LsdbEntry)> {
        self.entries.iter().map(|(o, e)| (o.as_str(), e))
    }
}

impl Default for LinkStateDb {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_AGE)
    }
}
