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

//! Static shortest-path forwarding: routes are computed once (at startup, or on demand via
//! `recompute`) from a fixed, pre-symmetrized graph and never change on their own.

use serde_json::Value;

use super::{EngineEvent, Outbound, RoutingEngine};
use crate::graph::{build_next_hop_table_with_metric, Graph, Metric, RoutingTable};
use crate::packet::{self, forward_transform_gated, Packet, PacketKind, Proto};

/// The static-SPF engine.
pub struct StaticSpfEngine {
    self_id: String,
    graph: Graph,
    metric: Metric,
    neighbors: Vec<String>,
    default_ttl: i64,
    table: RoutingTable,
}

impl StaticSpfEngine {
    /// Builds a static-SPF engine over the (already symmetrized) `graph`, computing the initial
    /// routing table immediately.
    pub fn new(self_id: impl Into<String>, graph: Graph, metric: Metric, default_ttl: i64) -> Self {
        let self_id = self_id.into();
        let neighbors: Vec<String> = graph.get(&self_id).map(|n| n.keys().cloned().collect()).unwrap_or_default();
        let table = build_next_hop_table_with_metric(&graph, &self_id, metric);
        Self { self_id, graph, metric, neighbors, default_ttl, table }
    }

    fn route(&self, dest: &str) -> Option<&str> {
        if let Some(nh) = self.table.next_hop.get(dest) {
            return Some(nh.as_str());
        }
        if self.neighbors.iter().any(|n| n == dest) {
            return Some(dest);
        }
        None
    }

    fn forward_toward(&self, pkt: &Packet, incoming_neighbor: Option<&str>) -> (Vec<Outbound>, Vec<EngineEvent>) {
        match self.route(&pkt.to) {
            None => (Vec::new(), vec![EngineEvent::NoRoute { to: pkt.to.clone() }]),
            Some(next_hop) => match forward_transform_gated(pkt, &self.self_id, incoming_neighbor.is_some()) {
                None => {
                    let new_ttl = pkt.ttl - 1;
                    let ev = if new_ttl <= 0 { EngineEvent::DroppedTtl } else { EngineEvent::DroppedCycle };
                    (Vec::new(), vec![ev])
                }
                Some(fwd) => {
                    let to = next_hop.to_string();
                    (vec![Outbound::new(to.clone(), fwd)], vec![EngineEvent::Forwarded { to: vec![to] }])
                }
            },
        }
    }
}

impl RoutingEngine for StaticSpfEngine {
    fn on_packet(&mut self, pkt: Packet, incoming_neighbor: Option<&str>) -> (Vec<Outbound>, Vec<EngineEvent>) {
        match pkt.kind {
            PacketKind::Hello => (Vec::new(), Vec::new()),
            PacketKind::Message => {
                if pkt.to == self.self_id {
                    (Vec::new(), vec![EngineEvent::Delivered { from: pkt.from.clone(), payload: pkt.payload.clone() }])
                } else {
                    self.forward_toward(&pkt, incoming_neighbor)
                }
            }
            PacketKind::Lsp | PacketKind::Info | PacketKind::Echo => (Vec::new(), Vec::new()),
        }
    }

    fn send(&mut self, to: &str, payload: Value) -> (Vec<Outbound>, Vec<EngineEvent>) {
        let pkt = packet::build(Proto::Dijkstra, PacketKind::Message, self.self_id.clone(), to, self.default_ttl, payload, None);
        if pkt.to == self.self_id {
            return (Vec::new(), vec![EngineEvent::Delivered { from: pkt.from.clone(), payload: pkt.payload.clone() }]);
        }
        self.forward_toward(&pkt, None)
    }

    fn recompute(&mut self) {
        self.table = build_next_hop_table_with_metric(&self.graph, &self.self_id, self.metric);
    }

    fn describe_table(&self) -> Option<String> {
        let mut dests: Vec<&String> = self.table.dist.keys().collect();
        dests.sort();
        let mut out = String::new();
        for d in dests {
            let cost = self.table.dist.get(d).copied().unwrap_or_default();
            let nh = self.table.next_hop.get(d).map(String::as_str).unwrap_or("-");
            let path = self.table.path.get(d).map(|p| p.join("->")).unwrap_or_default();
            out.push_str(&format!("{d}: next-hop={nh} cost={cost} path={path}\n"));
        }
        Some(out)
    }

    fn describe_route(&self, dest: &str) -> Option<String> {
        match (self.table.next_hop.get(dest), self.table.dist.get(dest), self.table.path.get(dest)) {
            (Some(nh), Some(cost), Some(path)) => Some(format!("next-hop={nh} cost={cost} path={}", path.join("->"))),
            _ => Some(format!("no route to {dest}")),
        }
    }
}
