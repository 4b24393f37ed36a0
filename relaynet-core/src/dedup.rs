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

//! Bounded-TTL duplicate suppression for `msg_id`s.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Default eviction window, per `spec.md` §4.2.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

/// A thread-safe, bounded-TTL set of recently seen message ids.
///
/// `add_if_new` purges expired entries before recording the new one, so the cache never grows
/// past what the TTL window holds live. An id reused after eviction is processed again; this is
/// acceptable because `msg_id` is a fresh UUID per send (see `spec.md` §9).
#[derive(Debug)]
pub struct DuplicateFilter {
    ttl: Duration,
    seen: Mutex<HashMap<String, Instant>>,
}

impl DuplicateFilter {
    /// Creates a filter with the given eviction window.
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, seen: Mutex::new(HashMap::new()) }
    }

    /// Returns `true` the first time `msg_id` is seen, `false` on any repeat within the TTL
    /// window.
    pub fn add_if_new(&self, msg_id: &str) -> bool {
        let now = Instant::now();
        let mut seen = self.seen.lock().unwrap();
        seen.retain(|_, ts| now.duration_since(*ts) < self.ttl);
        if seen.contains_key(msg_id) {
            false
        } else {
            seen.insert(msg_id.to_string(), now);
            true
        }
    }

    /// Number of ids currently retained (for diagnostics only).
    pub fn len(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    /// Returns `true` if no id is currently retained.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for DuplicateFilter {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}
