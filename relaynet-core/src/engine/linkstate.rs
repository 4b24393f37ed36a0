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

//! Link-state routing: a dynamically maintained LSDB, periodic flooded LSPs, and SPF rerun on
//! every accepted topology change.
//!
//! Grounded in `original_source/LSR/lsr.py`'s `LSRRouter`: `originate_lsp`, `handle_lsp`, and the
//! three-step next-hop fallback in `on_receive` are carried over verbatim in behavior, rewritten
//! against this crate's `Packet`/`LinkStateDb`/`Graph` types.

use std::collections::HashMap;
use std::time::Duration;

use serde_json::{json, Value};

use super::{EngineEvent, Outbound, RoutingEngine};
use crate::dedup::DuplicateFilter;
use crate::graph::{build_next_hop_table_with_metric, Metric, RoutingTable};
use crate::lsdb::LinkStateDb;
use crate::packet::{self, forward_transform_gated, Packet, PacketKind, Proto};

/// Default LSP flood TTL, per `spec.md` §4.5 step 3.
pub const LSP_TTL: i64 = 16;

/// Which quantity backs a self-originated LSP's advertised link costs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStateMetric {
    /// Every link costs 1.
    Hop,
    /// The last measured round-trip time to that neighbor, in milliseconds (1 if unmeasured).
    Rtt,
}

/// The link-state engine.
pub struct LinkStateEngine {
    self_id: String,
    neighbors: Vec<String>,
    metric: LinkStateMetric,
    default_ttl: i64,
    lsdb: LinkStateDb,
    lsp_seen: DuplicateFilter,
    seq: u64,
    last_rtt: HashMap<String, u32>,
    table: RoutingTable,
}

impl LinkStateEngine {
    /// Builds a link-state engine for `self_id` with the given direct `neighbors`.
    pub fn new(self_id: impl Into<String>, neighbors: Vec<String>, metric: LinkStateMetric, max_age: Duration, default_ttl: i64) -> Self {
        Self {
            self_id: self_id.into(),
            neighbors,
            metric,
            default_ttl,
            lsdb: LinkStateDb::new(max_age),
            lsp_seen: DuplicateFilter::new(Duration::from_secs(120)),
            seq: 0,
            last_rtt: HashMap::new(),
            table: RoutingTable::default(),
        }
    }

    fn run_spf(&mut self) {
        self.lsdb.age_out();
        let graph = self.lsdb.graph();
        self.table = build_next_hop_table_with_metric(&graph, &self.self_id, Metric::Weight);
    }

    fn links_payload(&self) -> (HashMap<String, u32>, Value) {
        let mut links = HashMap::new();
        let mut pairs = Vec::new();
        for n in &self.neighbors {
            let cost = match self.metric {
                LinkStateMetric::Hop => 1,
                LinkStateMetric::Rtt => self.last_rtt.get(n).copied().unwrap_or(1),
            };
            links.insert(n.clone(), cost);
            pairs.push(json!({"to": n, "cost": cost}));
        }
        (links, Value::Array(pairs))
    }

    fn apply_lsp_payload(&mut self, payload: &Value) -> Option<(String, u64)> {
        let obj = payload.as_object()?;
        let origin = obj.get("origin")?.as_str()?.to_string();
        let seq = obj.get("seq")?.as_u64()?;
        let links = parse_links(obj.get("links")?)?;
        let changed = self.lsdb.apply_lsp(&origin, seq, links);
        if changed {
            Some((origin, seq))
        } else {
            None
        }
    }

    fn forward_lsp(&self, pkt: &Packet, incoming_neighbor: Option<&str>) -> (Vec<Outbound>, Vec<EngineEvent>) {
        match forward_transform_gated(pkt, &self.self_id, true) {
            None => (Vec::new(), vec![EngineEvent::DroppedTtl]),
            Some(fwd) => {
                let out: Vec<Outbound> = self
                    .neighbors
                    .iter()
                    .filter(|n| Some(n.as_str()) != incoming_neighbor)
                    .map(|n| Outbound::new(n.clone(), fwd.clone()))
                    .collect();
                let to: Vec<String> = out.iter().map(|o| o.to.clone()).collect();
                (out, vec![EngineEvent::Forwarded { to }])
            }
        }
    }

    fn route_message(&self, pkt: &Packet, incoming_neighbor: Option<&str>) -> (Vec<Outbound>, Vec<EngineEvent>) {
        let next_hop = self
            .table
            .next_hop
            .get(&pkt.to)
            .cloned()
            .or_else(|| self.neighbors.iter().find(|n| n.as_str() == pkt.to).cloned())
            .or_else(|| {
                let mut candidates: Vec<&String> = self.neighbors.iter().filter(|n| Some(n.as_str()) != incoming_neighbor).collect();
                candidates.sort();
                candidates.into_iter().next().cloned()
            });

        match next_hop {
            None => (Vec::new(), vec![EngineEvent::NoRoute { to: pkt.to.clone() }]),
            Some(next_hop) => match forward_transform_gated(pkt, &self.self_id, incoming_neighbor.is_some()) {
                None => {
                    let new_ttl = pkt.ttl - 1;
                    let ev = if new_ttl <= 0 { EngineEvent::DroppedTtl } else { EngineEvent::DroppedCycle };
                    (Vec::new(), vec![ev])
                }
                Some(fwd) => (vec![Outbound::new(next_hop.clone(), fwd)], vec![EngineEvent::Forwarded { to: vec![next_hop] }]),
            },
        }
    }
}

impl RoutingEngine for LinkStateEngine {
    fn on_packet(&mut self, pkt: Packet, incoming_neighbor: Option<&str>) -> (Vec<Outbound>, Vec<EngineEvent>) {
        match pkt.kind {
            PacketKind::Hello => (Vec::new(), Vec::new()),
            PacketKind::Lsp | PacketKind::Info => {
                if !self.lsp_seen.add_if_new(&pkt.msg_id) {
                    return (Vec::new(), Vec::new());
                }
                if self.apply_lsp_payload(&pkt.payload).is_some() {
                    self.run_spf();
                }
                self.forward_lsp(&pkt, incoming_neighbor)
            }
            PacketKind::Message => {
                if pkt.to == self.self_id {
                    (Vec::new(), vec![EngineEvent::Delivered { from: pkt.from.clone(), payload: pkt.payload.clone() }])
                } else {
                    self.route_message(&pkt, incoming_neighbor)
                }
            }
            PacketKind::Echo => (Vec::new(), Vec::new()),
        }
    }

    fn send(&mut self, to: &str, payload: Value) -> (Vec<Outbound>, Vec<EngineEvent>) {
        let pkt = packet::build(Proto::Lsr, PacketKind::Message, self.self_id.clone(), to, self.default_ttl, payload, None);
        if pkt.to == self.self_id {
            return (Vec::new(), vec![EngineEvent::Delivered { from: pkt.from.clone(), payload: pkt.payload.clone() }]);
        }
        self.route_message(&pkt, None)
    }

    fn recompute(&mut self) {
        self.run_spf();
    }

    fn originate_control(&mut self) -> Vec<Outbound> {
        self.seq += 1;
        let (links, links_json) = self.links_payload();
        let payload = json!({"origin": self.self_id, "seq": self.seq, "links": links_json});
        let pkt = packet::build(Proto::Lsr, PacketKind::Lsp, self.self_id.clone(), "broadcast", LSP_TTL, payload, None);

        self.lsp_seen.add_if_new(&pkt.msg_id);
        if self.lsdb.apply_lsp(&self.self_id, self.seq, links) {
            self.run_spf();
        }

        self.neighbors.iter().map(|n| Outbound::new(n.clone(), pkt.clone())).collect()
    }

    fn record_rtt(&mut self, neighbor: &str, rtt_ms: u32) {
        self.last_rtt.insert(neighbor.to_string(), rtt_ms);
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

    fn describe_lsdb(&self) -> Option<String> {
        let mut out = String::new();
        let mut origins: Vec<(&str, u64)> = self.lsdb.entries().map(|(o, e)| (o, e.seq)).collect();
        origins.sort();
        for (origin, seq) in origins {
            out.push_str(&format!("{origin}: seq={seq}\n"));
        }
        Some(out)
    }
}

/// Parses the `links` field of an `lsp`/`info` payload, accepting either the array-of-pairs
/// shape `[{"to": id, "cost": c}, ...]` or the legacy mapping shape `{id: cost}`.
fn parse_links(v: &Value) -> Option<HashMap<String, u32>> {
    match v {
        Value::Array(items) => {
            let mut out = HashMap::new();
            for item in items {
                let obj = item.as_object()?;
                let to = obj.get("to")?.as_str()?.to_string();
                let cost = obj.get("cost").and_then(Value::as_u64).unwrap_or(1) as u32;
                out.insert(to, cost);
            }
            Some(out)
        }
        Value::Object(map) => {
            let mut out = HashMap::new();
            for (k, v) in map {
                let cost = v.as_u64().unwrap_or(1) as u32;
                out.insert(k.clone(), cost);
            }
            Some(out)
        }
        _ => None,
    }
}
