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

//! Dijkstra's algorithm over a directed weighted graph of node ids, and the derived next-hop
//! table every routing engine that computes routes ahead of time relies on.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

/// A directed weighted graph: node id -> neighbor id -> non-negative edge weight.
///
/// Missing nodes are treated as isolated (no outgoing edges). For the static-SPF engine the
/// graph is auto-symmetrized at load time (see `crate::config`); the link-state engine's view
/// from [`crate::lsdb::LinkStateDb::graph`] is strictly directional and must not be conflated
/// with the undirected case.
pub type Graph = HashMap<String, HashMap<String, u32>>;

/// Which quantity an edge weight represents when computing shortest paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    /// Every edge costs exactly 1, regardless of the stored weight.
    Hop,
    /// Use the stored integer weight, defaulting to 1 if absent or invalid.
    Weight,
}

/// Distances and predecessors from a single source, as computed by [`dijkstra`].
#[derive(Debug, Clone, Default)]
pub struct ShortestPaths {
    /// `dist[v]` is the minimum cost from the source to `v`; absent if unreachable.
    pub dist: HashMap<String, u32>,
    /// `prev[v]` is the predecessor of `v` on a shortest path; absent if `v` is the source or
    /// unreachable.
    pub prev: HashMap<String, String>,
}

/// Runs Dijkstra's algorithm from `source` over `graph` under the given `metric`.
///
/// Uses a binary min-heap keyed by tentative distance with lazy deletion: a popped entry whose
/// distance no longer matches the best known distance for that node is simply skipped. Ties are
/// broken by the heap's natural order, which is deterministic within a single computation.
pub fn dijkstra(graph: &Graph, source: &str, metric: Metric) -> ShortestPaths {
    let mut dist: HashMap<String, u32> = HashMap::new();
    let mut prev: HashMap<String, String> = HashMap::new();
    let mut heap: BinaryHeap<Reverse<(u32, String)>> = BinaryHeap::new();

    dist.insert(source.to_string(), 0);
    heap.push(Reverse((0, source.to_string())));

    while let Some(Reverse((d, u))) = heap.pop() {
        if dist.get(&u).map(|&best| d > best).unwrap_or(true) {
            continue; // stale entry, a shorter path was already found
        }
        let Some(neighbors) = graph.get(&u) else { continue };
        for (v, &weight) in neighbors {
            let edge_cost = match metric {
                Metric::Hop => 1,
                Metric::Weight => weight,
            };
            let candidate = d + edge_cost;
            let better = dist.get(v).map(|&best| candidate < best).unwrap_or(true);
            if better {
                dist.insert(v.clone(), candidate);
                prev.insert(v.clone(), u.clone());
                heap.push(Reverse((candidate, v.clone())));
            }
        }
    }

    ShortestPaths { dist, prev }
}

/// The routing table derived from a [`ShortestPaths`] computation: per-destination distance,
/// next hop, and full path from `source`.
#[derive(Debug, Clone, Default)]
pub struct RoutingTable {
    /// Cost to each reachable destination.
    pub dist: HashMap<String, u32>,
    /// Immediate neighbor through which to reach each reachable destination.
    pub next_hop: HashMap<String, String>,
    /// Full path `[source, ..., destination]` for each reachable destination.
    pub path: HashMap<String, Vec<String>>,
}

/// Reconstructs, for every node reachable from `source` (other than `source` itself), the path
/// `[source, ..., destination]` by walking `prev` backwards and reversing.
///
/// `next_hop[d]` is the second element of that path. Unreachable destinations are simply absent
/// (an empty path would be ambiguous with a destination equal to the source).
pub fn build_next_hop_table(graph: &Graph, source: &str) -> RoutingTable {
    build_next_hop_table_with_metric(graph, source, Metric::Weight)
}

/// As [`build_next_hop_table`], but with an explicit metric mode.
pub fn build_next_hop_table_with_metric(graph: &Graph, source: &str, metric: Metric) -> RoutingTable {
    let ShortestPaths { dist, prev } = dijkstra(graph, source, metric);

    let mut table = RoutingTable::default();
    for (dest, &cost) in &dist {
        if dest == source {
            continue;
        }
        let mut path = vec![dest.clone()];
        let mut cur = dest.clone();
        while let Some(p) = prev.get(&cur) {
            path.push(p.clone());
            if p == source {
                break;
            }
            cur = p.clone();
        }
        path.reverse();
        if path.first().map(|s| s.as_str()) != Some(source) {
            // disconnected predecessor chain; treat as unreachable
            continue;
        }
        if let Some(next_hop) = path.get(1) {
            table.next_hop.insert(dest.clone(), next_hop.clone());
        }
        table.dist.insert(dest.clone(), cost);
        table.path.insert(dest.clone(), path);
    }
    table
}

/// Returns a copy of `graph` with every edge's reverse added at the same weight, unless a reverse
/// edge is already configured (in which case the configured weight wins).
///
/// Used to load the static-SPF graph, which `spec.md` §3 specifies as implicitly undirected.
pub fn symmetrize(graph: &Graph) -> Graph {
    let mut out = graph.clone();
    for (node, neighbors) in graph {
        for (neighbor, &weight) in neighbors {
            out.entry(neighbor.clone())
                .or_default()
                .entry(node.clone())
                .or_insert(weight);
        }
    }
    out
}
