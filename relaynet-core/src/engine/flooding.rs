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

//! Controlled flooding: every `message`/`lsp`/`info` packet is relayed to every neighbor except
//! the one it arrived from.

use serde_json::Value;

use super::{EngineEvent, Outbound, RoutingEngine};
use crate::packet::{self, forward_transform, Packet, PacketKind, Proto};

/// Running counters, exposed verbatim by the `stats` console command.
#[derive(Debug, Clone, Copy, Default)]
pub struct FloodingStats {
    pub rx: u64,
    pub tx: u64,
    pub fwd: u64,
    pub drop_dup: u64,
    pub drop_ttl: u64,
    pub drop_cycle: u64,
    pub drop_bad: u64,
}

/// The controlled-flooding engine.
pub struct FloodingEngine {
    self_id: String,
    neighbors: Vec<String>,
    default_ttl: i64,
    stats: FloodingStats,
}

impl FloodingEngine {
    /// Builds a flooding engine for `self_id`, relaying to `neighbors`, with `default_ttl` used
    /// for locally-originated packets (HELLO and `send`).
    pub fn new(self_id: impl Into<String>, neighbors: Vec<String>, default_ttl: i64) -> Self {
        Self { self_id: self_id.into(), neighbors, default_ttl, stats: FloodingStats::default() }
    }

    fn previous_hop(pkt: &Packet) -> Option<&str> {
        pkt.headers.first().map(String::as_str)
    }

    fn broadcast(&self, pkt: Packet, exclude: Option<&str>) -> Vec<Outbound> {
        self.neighbors
            .iter()
            .filter(|n| Some(n.as_str()) != exclude)
            .map(|n| Outbound::new(n.clone(), pkt.clone()))
            .collect()
    }
}

impl RoutingEngine for FloodingEngine {
    fn on_packet(&mut self, pkt: Packet, incoming_neighbor: Option<&str>) -> (Vec<Outbound>, Vec<EngineEvent>) {
        self.stats.rx += 1;
        match pkt.kind {
            PacketKind::Hello => (Vec::new(), Vec::new()),
            PacketKind::Message | PacketKind::Lsp | PacketKind::Info => {
                if pkt.to == self.self_id {
                    let event = EngineEvent::Delivered { from: pkt.from.clone(), payload: pkt.payload.clone() };
                    return (Vec::new(), vec![event]);
                }
                let previous_hop = incoming_neighbor.or_else(|| Self::previous_hop(&pkt));
                match forward_transform(&pkt, &self.self_id) {
                    None => {
                        let new_ttl = pkt.ttl - 1;
                        if new_ttl <= 0 {
                            self.stats.drop_ttl += 1;
                            (Vec::new(), vec![EngineEvent::DroppedTtl])
                        } else {
                            self.stats.drop_cycle += 1;
                            (Vec::new(), vec![EngineEvent::DroppedCycle])
                        }
                    }
                    Some(fwd) => {
                        let out = self.broadcast(fwd, previous_hop);
                        self.stats.fwd += 1;
                        let to: Vec<String> = out.iter().map(|o| o.to.clone()).collect();
                        (out, vec![EngineEvent::Forwarded { to }])
                    }
                }
            }
            PacketKind::Echo => (Vec::new(), Vec::new()),
        }
    }

    fn send(&mut self, to: &str, payload: Value) -> (Vec<Outbound>, Vec<EngineEvent>) {
        let pkt = packet::build(Proto::Flooding, PacketKind::Message, self.self_id.clone(), to, self.default_ttl, payload, None);
        self.stats.tx += 1;
        let out = self.broadcast(pkt, None);
        (out, Vec::new())
    }

    fn record_drop_dup(&mut self) {
        self.stats.drop_dup += 1;
    }

    fn record_drop_bad(&mut self) {
        self.stats.drop_bad += 1;
    }

    fn describe_stats(&self) -> Option<String> {
        let s = &self.stats;
        Some(format!(
            "rx={} tx={} fwd={} drop_dup={} drop_ttl={} drop_cycle={} drop_bad={}",
            s.rx, s.tx, s.fwd, s.drop_dup, s.drop_ttl, s.drop_cycle, s.drop_bad
        ))
    }
}
