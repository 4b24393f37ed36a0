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

//! The three interchangeable routing engines and the trait they share.
//!
//! An engine is pure and transport-agnostic: it consumes a sanitized, not-yet-deduplicated
//! [`Packet`](crate::packet::Packet) (deduplication happens in the supervisor, ahead of
//! dispatch) and returns the set of packets to publish plus a log of what happened, as
//! [`Outbound`] and [`EngineEvent`] values. The supervisor owns the bus adapter and performs the
//! actual (async) publish; the engine itself never awaits anything, which keeps Dijkstra, LSDB,
//! and forwarding logic unit-testable without a runtime.

pub mod flooding;
pub mod linkstate;
pub mod staticspf;

use serde_json::Value;

use crate::packet::Packet;

/// A packet the supervisor should publish to a neighbor, addressed by neighbor id (not yet
/// resolved to a bus channel — that resolution is the supervisor's job via the names config).
#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    /// The neighbor id to publish to.
    pub to: String,
    /// The packet to publish.
    pub packet: Packet,
}

impl Outbound {
    /// Shorthand constructor.
    pub fn new(to: impl Into<String>, packet: Packet) -> Self {
        Self { to: to.into(), packet }
    }
}

/// What an engine did with one inbound packet or one locally-injected send, for logging and for
/// the console's `stats` command.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// The packet's destination was this node; delivered to the local application.
    Delivered { from: String, payload: Value },
    /// The packet was relayed toward one or more neighbors.
    Forwarded { to: Vec<String> },
    /// Dropped: `self_id` was already present in the packet's trail.
    DroppedCycle,
    /// Dropped: the decremented TTL reached zero or below.
    DroppedTtl,
    /// Dropped: no next hop could be resolved for the destination.
    NoRoute { to: String },
}

/// The shared surface every routing engine implements.
///
/// `on_packet` is the inbound dispatcher; `send` is the outbound helper used by the console and
/// by the supervisor's own HELLO/LSP origination. Console query methods default to `None` and
/// are overridden by the engines that support them (`table`/`route` for StaticSpf and LinkState,
/// `lsdb` for LinkState, `stats` for Flooding).
pub trait RoutingEngine: Send {
    /// Dispatches one sanitized, not-yet-seen inbound packet. `incoming_neighbor` is the neighbor
    /// id the packet arrived from, or `None` for a locally-injected packet (used to discriminate
    /// a genuine cycle from a freshly built packet that already carries `self_id`).
    fn on_packet(&mut self, pkt: Packet, incoming_neighbor: Option<&str>) -> (Vec<Outbound>, Vec<EngineEvent>);

    /// Builds and routes a fresh `message` packet toward `to`, as issued by the console's `send`
    /// command.
    fn send(&mut self, to: &str, payload: Value) -> (Vec<Outbound>, Vec<EngineEvent>);

    /// Recomputes any cached routing state from the engine's current graph view. A no-op for
    /// engines with nothing to recompute (Flooding).
    fn recompute(&mut self) {}

    /// Originates this engine's periodic control packet (an LSP for LinkState), if any.
    fn originate_control(&mut self) -> Vec<Outbound> {
        Vec::new()
    }

    /// Records a HELLO response's round-trip time against `neighbor`, if this engine measures
    /// RTT. A no-op otherwise.
    fn record_rtt(&mut self, _neighbor: &str, _rtt_ms: u32) {}

    /// Records a packet dropped upstream of dispatch (duplicate filter hit), for engines that
    /// track counters. A no-op otherwise.
    fn record_drop_dup(&mut self) {}

    /// Records a packet dropped upstream of dispatch (failed sanitization), for engines that
    /// track counters. A no-op otherwise.
    fn record_drop_bad(&mut self) {}

    /// Formats the routing table for the console's `table` command, if this engine maintains
    /// one.
    fn describe_table(&self) -> Option<String> {
        None
    }

    /// Formats the route to a single destination for the console's `route DEST` command.
    fn describe_route(&self, _dest: &str) -> Option<String> {
        None
    }

    /// Formats the LSDB for the console's `lsdb` command (LinkState only).
    fn describe_lsdb(&self) -> Option<String> {
        None
    }

    /// Formats engine counters for the console's `stats` command (Flooding only).
    fn describe_stats(&self) -> Option<String> {
        None
    }
}
