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

//! The wire packet, its JSON codec, and the forwarding primitives shared by every routing engine.
//!
//! A [`Packet`] is the one structure that crosses the bus. [`sanitize`] turns an arbitrary
//! [`serde_json::Value`] (as received from the bus, possibly in one of the legacy shapes the
//! original Python implementations emitted) into a canonical `Packet`. [`forward_transform`]
//! applies the header-rotation law every engine relays packets with.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Maximum number of recent hops kept in a packet's trail.
pub const MAX_HEADERS: usize = 3;

/// The literal `to` value meaning "every neighbor".
pub const BROADCAST: &str = "broadcast";

/// Tags which engine produced a packet. Carried only for logging/diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Proto {
    /// Controlled flooding.
    Flooding,
    /// Static shortest-path (Dijkstra over a known graph).
    Dijkstra,
    /// Link-state routing.
    Lsr,
}

impl fmt::Display for Proto {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Proto::Flooding => write!(f, "flooding"),
            Proto::Dijkstra => write!(f, "dijkstra"),
            Proto::Lsr => write!(f, "lsr"),
        }
    }
}

impl std::str::FromStr for Proto {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "flooding" => Ok(Proto::Flooding),
            "dijkstra" => Ok(Proto::Dijkstra),
            "lsr" => Ok(Proto::Lsr),
            other => Err(CodecError::InvalidPacket(format!("unknown proto: {other}"))),
        }
    }
}

/// The packet's role, dispatched on by every [`crate::engine::RoutingEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PacketKind {
    /// Non-relayed keep-alive broadcast.
    Hello,
    /// User datagram, relayed hop by hop toward `to`.
    Message,
    /// Link-State Packet: an origin's authoritative link vector.
    Lsp,
    /// Legacy/interop variant of `Lsp`.
    Info,
    /// Opaque probe reply.
    Echo,
}

impl fmt::Display for PacketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PacketKind::Hello => "hello",
            PacketKind::Message => "message",
            PacketKind::Lsp => "lsp",
            PacketKind::Info => "info",
            PacketKind::Echo => "echo",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for PacketKind {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hello" => Ok(PacketKind::Hello),
            "message" => Ok(PacketKind::Message),
            "lsp" => Ok(PacketKind::Lsp),
            "info" => Ok(PacketKind::Info),
            "echo" => Ok(PacketKind::Echo),
            other => Err(CodecError::InvalidPacket(format!("unknown type: {other}"))),
        }
    }
}

/// The wire unit. See `spec.md` §3 for the field invariants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Packet {
    /// Engine tag; used only for logging/diagnostics.
    pub proto: Proto,
    /// Packet role.
    #[serde(rename = "type")]
    pub kind: PacketKind,
    /// Originating node id.
    pub from: String,
    /// Destination node id, or the literal [`BROADCAST`].
    pub to: String,
    /// Hop budget, decremented on each forward.
    pub ttl: i64,
    /// Bounded trail of recent hops, at most [`MAX_HEADERS`] entries.
    pub headers: Vec<String>,
    /// Per-type payload, opaque to the codec.
    pub payload: Value,
    /// Globally unique id, used for duplicate suppression.
    pub msg_id: String,
}

/// Errors raised while decoding or transforming a [`Packet`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// `raw` was not an object, was missing a required field, or had a field of the wrong shape.
    #[error("invalid packet: {0}")]
    InvalidPacket(String),
}

/// Constructs a fresh outbound packet with a generated `msg_id`.
///
/// If `headers` is omitted, it is initialized to `[from]`, matching every engine's convention for
/// locally-injected packets.
#[allow(clippy::too_many_arguments)]
pub fn build(
    proto: Proto,
    kind: PacketKind,
    from: impl Into<String>,
    to: impl Into<String>,
    ttl: i64,
    payload: Value,
    headers: Option<Vec<String>>,
) -> Packet {
    let from = from.into();
    let headers = headers.unwrap_or_else(|| vec![from.clone()]);
    Packet {
        proto,
        kind,
        from,
        to: to.into(),
        ttl,
        headers: truncate_headers(headers),
        payload,
        msg_id: new_msg_id(),
    }
}

/// Generates a fresh, globally-unique message id.
pub fn new_msg_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn truncate_headers(mut headers: Vec<String>) -> Vec<String> {
    if headers.len() > MAX_HEADERS {
        let drop = headers.len() - MAX_HEADERS;
        headers.drain(0..drop);
    }
    headers
}

/// Normalizes a raw JSON value received off the bus into a canonical [`Packet`].
///
/// Accepts the legacy `headers` shapes described in `spec.md` §4.1: an object carrying a `trail`
/// or `path` array, an object carrying a bare `last_hop`, or a plain array. A missing `msg_id` is
/// generated; a missing `payload` defaults to an empty object.
pub fn sanitize(raw: &Value) -> Result<Packet, CodecError> {
    let obj = raw
        .as_object()
        .ok_or_else(|| CodecError::InvalidPacket("packet is not a JSON object".into()))?;

    let proto = field_str(obj, "proto")?.parse()?;
    let kind = field_str(obj, "type")?.parse()?;
    let from = field_str(obj, "from")?.to_string();
    let to = field_str(obj, "to")?.to_string();

    let ttl = obj
        .get("ttl")
        .ok_or_else(|| CodecError::InvalidPacket("missing field: ttl".into()))?
        .as_i64()
        .ok_or_else(|| CodecError::InvalidPacket("ttl is not integral".into()))?;

    let headers = match obj.get("headers") {
        None => Vec::new(),
        Some(Value::Array(items)) => items.iter().map(value_to_string).collect(),
        Some(Value::Object(map)) => {
            if let Some(Value::Array(trail)) = map.get("trail") {
                trail.iter().map(value_to_string).collect()
            } else if let Some(Value::Array(path)) = map.get("path") {
                path.iter().map(value_to_string).collect()
            } else if let Some(last_hop) = map.get("last_hop") {
                vec![value_to_string(last_hop)]
            } else {
                Vec::new()
            }
        }
        Some(_) => {
            return Err(CodecError::InvalidPacket(
                "headers is neither a sequence nor a mapping".into(),
            ))
        }
    };

    let payload = obj.get("payload").cloned().unwrap_or_else(|| Value::Object(Default::default()));

    let msg_id = obj
        .get("msg_id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(new_msg_id);

    Ok(Packet { proto, kind, from, to, ttl, headers: truncate_headers(headers), payload, msg_id })
}

fn field_str<'a>(
    obj: &'a serde_json::Map<String, Value>,
    name: &str,
) -> Result<&'a str, CodecError> {
    obj.get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| CodecError::InvalidPacket(format!("missing or non-string field: {name}")))
}

fn value_to_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Applies the header-rotation law and decrements `ttl`, returning `None` when the forward must
/// be dropped.
///
/// Per `spec.md` §4.1: drop the first header (if any), append `self_id`, truncate to the last
/// [`MAX_HEADERS`]. Returns `None` iff `self_id` is already in `pkt.headers` (a cycle) or the
/// decremented `ttl` is `<= 0`.
pub fn forward_transform(pkt: &Packet, self_id: &str) -> Option<Packet> {
    forward_transform_gated(pkt, self_id, true)
}

/// As [`forward_transform`], but the cycle check (`self_id` already present in `pkt.headers`)
/// is applied only when `check_cycle` is true.
///
/// The LinkState engine needs this: a locally-injected `message` packet legitimately carries
/// `self_id` as its sole initial header, which is not a cycle, while the same packet arriving
/// back over the bus with `self_id` in its trail is. Callers pass `check_cycle =
/// incoming_neighbor.is_some()`.
pub fn forward_transform_gated(pkt: &Packet, self_id: &str, check_cycle: bool) -> Option<Packet> {
    if check_cycle && pkt.headers.iter().any(|h| h == self_id) {
        return None;
    }
    let new_ttl = pkt.ttl - 1;
    if new_ttl <= 0 {
        return None;
    }
    let mut headers = pkt.headers.clone();
    if !headers.is_empty() {
        headers.remove(0);
    }
    headers.push(self_id.to_string());
    let headers = truncate_headers(headers);

    Some(Packet { ttl: new_ttl, headers, ..pkt.clone() })
}
