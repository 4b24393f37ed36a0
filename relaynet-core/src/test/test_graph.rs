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

use crate::graph::{build_next_hop_table, build_next_hop_table_with_metric, dijkstra, symmetrize, Graph, Metric};

fn line_graph() -> Graph {
    let mut g: Graph = HashMap::new();
    g.insert("A".into(), HashMap::from([("B".to_string(), 1)]));
    g.insert("B".into(), HashMap::from([("A".to_string(), 1), ("C".to_string(), 1)]));
    g.insert("C".into(), HashMap::from([("B".to_string(), 1), ("D".to_string(), 1)]));
    g.insert("D".into(), HashMap::from([("C".to_string(), 1), ("E".to_string(), 1)]));
    g.insert("E".into(), HashMap::from([("D".to_string(), 1)]));
    g
}

#[test]
fn dijkstra_finds_shortest_distance_on_a_line() {
    let g = line_graph();
    let sp = dijkstra(&g, "A", Metric::Weight);
    assert_eq!(sp.dist["E"], 4);
    assert_eq!(sp.dist["A"], 0);
}

#[test]
fn dijkstra_marks_unreachable_nodes_absent() {
    let mut g: Graph = HashMap::new();
    g.insert("A".into(), HashMap::new());
    g.insert("B".into(), HashMap::new());
    let sp = dijkstra(&g, "A", Metric::Weight);
    assert!(!sp.dist.contains_key("B"));
}

#[test]
fn next_hop_table_matches_expected_path_on_a_line() {
    let table = build_next_hop_table(&line_graph(), "A");
    assert_eq!(table.dist["E"], 4);
    assert_eq!(table.next_hop["E"], "B");
    assert_eq!(table.path["E"], vec!["A", "B", "C", "D", "E"]);
}

#[test]
fn next_hop_is_always_a_direct_neighbor_of_source() {
    let g = line_graph();
    let table = build_next_hop_table(&g, "A");
    let neighbors = &g["A"];
    for nh in table.next_hop.values() {
        assert!(neighbors.contains_key(nh));
    }
}

#[test]
fn hop_metric_ignores_stored_weights() {
    let mut g: Graph = HashMap::new();
    g.insert("A".into(), HashMap::from([("B".to_string(), 100)]));
    g.insert("B".into(), HashMap::from([("A".to_string(), 100), ("C".to_string(), 100)]));
    g.insert("C".into(), HashMap::from([("B".to_string(), 100)]));
    let table = build_next_hop_table_with_metric(&g, "A", Metric::Hop);
    assert_eq!(table.dist["C"], 2);
}

#[test]
fn weight_metric_prefers_a_cheaper_longer_path() {
    let mut g: Graph = HashMap::new();
    g.insert("A".into(), HashMap::from([("B".to_string(), 10), ("C".to_string(), 1)]));
    g.insert("B".into(), HashMap::from([("A".to_string(), 10), ("D".to_string(), 1)]));
    g.insert("C".into(), HashMap::from([("A".to_string(), 1), ("D".to_string(), 1)]));
    g.insert("D".into(), HashMap::from([("B".to_string(), 1), ("C".to_string(), 1)]));
    let table = build_next_hop_table_with_metric(&g, "A", Metric::Weight);
    assert_eq!(table.dist["D"], 2);
    assert_eq!(table.next_hop["D"], "C");
}

#[test]
fn symmetrize_adds_missing_reverse_edges() {
    let mut g: Graph = HashMap::new();
    g.insert("A".into(), HashMap::from([("B".to_string(), 3)]));
    let sym = symmetrize(&g);
    assert_eq!(sym["B"]["A"], 3);
}

#[test]
fn symmetrize_keeps_an_explicitly_configured_reverse_weight() {
    let mut g: Graph = HashMap::new();
    g.insert("A".into(), HashMap::from([("B".to_string(), 3)]));
    g.insert("B".into(), HashMap::from([("A".to_string(), 7)]));
    let sym = symmetrize(&g);
    assert_eq!(sym["B"]["A"], 7);
}
