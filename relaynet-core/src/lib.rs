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

#![deny(missing_docs)]

//! # relaynet-core
//!
//! Transport-agnostic core of a didactic distributed routing testbed: router daemons that
//! interconnect over a shared pub/sub bus, exchange JSON-framed packets, and compute forwarding
//! tables via one of three interchangeable routing engines.
//!
//! ## Structure
//!
//! - **[`packet`]**: the wire packet, its JSON codec (`sanitize`/`build`), and the
//!   header-rotation/TTL forwarding primitive (`forward_transform`) every engine relays with.
//! - **[`dedup`]**: bounded-TTL duplicate suppression over `msg_id`.
//! - **[`graph`]**: Dijkstra's algorithm and the derived next-hop routing table.
//! - **[`lsdb`]**: the link-state database — per-origin sequenced link vectors with age-out.
//! - **[`engine`]**: the three routing engines ([`engine::flooding`], [`engine::staticspf`],
//!   [`engine::linkstate`]) sharing the [`engine::RoutingEngine`] trait.
//! - **[`supervisor`]**: [`supervisor::NodeSupervisor`] wires a bus adapter to an engine, runs
//!   the HELLO/LSP timers, and exposes the operator console's surface.
//! - **[`bus`]**: the [`bus::BusAdapter`] transport trait, plus an in-memory implementation used
//!   by the test suite and by single-process demos.
//! - **[`config`]**: topology and names file loading.
//!
//! ## Usage
//!
//! ```
//! use relaynet_core::packet::{self, PacketKind, Proto};
//!
//! let pkt = packet::build(Proto::Flooding, PacketKind::Message, "A", "E", 8, serde_json::json!("hello"), None);
//! let fwd = packet::forward_transform(&pkt, "B").expect("fresh packet with ttl > 1 forwards");
//! assert_eq!(fwd.ttl, pkt.ttl - 1);
//! ```

pub mod bus;
pub mod config;
pub mod dedup;
mod error;
pub mod engine;
pub mod graph;
pub mod lsdb;
pub mod packet;
pub mod supervisor;

#[cfg(test)]
mod test;

pub use error::Error;
