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

#![cfg(test)]

use std::collections::HashMap;
use std::time::Duration;

use crate::lsdb::LinkStateDb;

fn links(pairs: &[(&str, u32)]) -> HashMap<String, u32> {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

#[test]
fn apply_lsp_accepts_the_first_record_for_an_origin() {
    let mut db = LinkStateDb::new(Duration::from_secs(60));
    assert!(db.apply_lsp("A", 1, links(&[("B", 1)])));
    assert_eq!(db.seq_of("A"), Some(1));
}

#[test]
fn apply_lsp_rejects_equal_or_older_sequence_numbers() {
    let mut db = LinkStateDb::new(Duration::from_secs(60));
    assert!(db.apply_lsp("A", 5, links(&[("B", 1)])));
    assert!(!db.apply_lsp("A", 5, links(&[("C", 1)])));
    assert!(!db.apply_lsp("A", 3, links(&[("C", 1)])));
    assert_eq!(db.seq_of("A"), Some(5));
}

#[test]
fn apply_lsp_accepts_a_strictly_newer_sequence_number() {
    let mut db = LinkStateDb::new(Duration::from_secs(60));
    db.apply_lsp("A", 1, links(&[("B", 1)]));
    assert!(db.apply_lsp("A", 2, links(&[("B", 1), ("C", 2)])));
    let graph = db.graph();
    assert_eq!(graph["A"]["C"], 2);
}

#[test]
fn graph_is_directed_per_origin() {
    let mut db = LinkStateDb::new(Duration::from_secs(60));
    db.apply_lsp("A", 1, links(&[("B", 1)]));
    let graph = db.graph();
    assert!(graph.get("B").is_none());
}

#[test]
fn age_out_drops_stale_entries() {
    let mut db = LinkStateDb::new(Duration::from_millis(1));
    db.apply_lsp("A", 1, links(&[("B", 1)]));
    std::thread::sleep(Duration::from_millis(20));
    db.age_out();
    assert!(db.is_empty());
}

#[test]
fn age_out_keeps_fresh_entries() {
    let mut db = LinkStateDb::new(Duration::from_secs(60));
    db.apply_lsp("A", 1, links(&[("B", 1)]));
    db.age_out();
    assert_eq!(db.len(), 1);
}
