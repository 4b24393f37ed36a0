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

use serde_json::json;

use crate::packet::{build, forward_transform, sanitize, CodecError, PacketKind, Proto};

#[test]
fn roundtrip_preserves_a_canonical_packet() {
    let pkt = build(Proto::Dijkstra, PacketKind::Message, "A", "E", 8, json!("hi"), Some(vec!["A".into()]));
    let raw = serde_json::to_value(&pkt).unwrap();
    let back = sanitize(&raw).unwrap();
    assert_eq!(pkt, back);
}

#[test]
fn sanitize_accepts_object_headers_with_trail() {
    let raw = json!({
        "proto": "lsr", "type": "message", "from": "A", "to": "B", "ttl": 5,
        "headers": {"trail": ["A", "B"]}, "payload": {}
    });
    let pkt = sanitize(&raw).unwrap();
    assert_eq!(pkt.headers, vec!["A".to_string(), "B".to_string()]);
}

#[test]
fn sanitize_accepts_object_headers_with_path() {
    let raw = json!({
        "proto": "lsr", "type": "message", "from": "A", "to": "B", "ttl": 5,
        "headers": {"path": ["A", "C"]}
    });
    let pkt = sanitize(&raw).unwrap();
    assert_eq!(pkt.headers, vec!["A".to_string(), "C".to_string()]);
}

#[test]
fn sanitize_accepts_object_headers_with_last_hop_only() {
    let raw = json!({
        "proto": "flooding", "type": "message", "from": "A", "to": "B", "ttl": 5,
        "headers": {"last_hop": "Z"}
    });
    let pkt = sanitize(&raw).unwrap();
    assert_eq!(pkt.headers, vec!["Z".to_string()]);
}

#[test]
fn sanitize_defaults_missing_msg_id_and_payload() {
    let raw = json!({"proto": "flooding", "type": "hello", "from": "A", "to": "broadcast", "ttl": 2});
    let pkt = sanitize(&raw).unwrap();
    assert!(!pkt.msg_id.is_empty());
    assert_eq!(pkt.payload, json!({}));
}

#[test]
fn sanitize_truncates_headers_to_last_three() {
    let raw = json!({
        "proto": "flooding", "type": "message", "from": "A", "to": "B", "ttl": 5,
        "headers": ["A", "B", "C", "D"]
    });
    let pkt = sanitize(&raw).unwrap();
    assert_eq!(pkt.headers, vec!["B".to_string(), "C".to_string(), "D".to_string()]);
}

#[test]
fn sanitize_rejects_non_object() {
    let err = sanitize(&json!(["not", "an", "object"])).unwrap_err();
    assert!(matches!(err, CodecError::InvalidPacket(_)));
}

#[test]
fn sanitize_rejects_missing_required_field() {
    let raw = json!({"proto": "flooding", "type": "message", "from": "A", "ttl": 5});
    let err = sanitize(&raw).unwrap_err();
    assert!(matches!(err, CodecError::InvalidPacket(_)));
}

#[test]
fn sanitize_rejects_non_integral_ttl() {
    let raw = json!({"proto": "flooding", "type": "message", "from": "A", "to": "B", "ttl": 1.5});
    let err = sanitize(&raw).unwrap_err();
    assert!(matches!(err, CodecError::InvalidPacket(_)));
}

#[test]
fn sanitize_rejects_headers_of_wrong_shape() {
    let raw = json!({"proto": "flooding", "type": "message", "from": "A", "to": "B", "ttl": 5, "headers": 3});
    let err = sanitize(&raw).unwrap_err();
    assert!(matches!(err, CodecError::InvalidPacket(_)));
}

#[test]
fn header_rotation_law_decrements_ttl_and_rotates() {
    let pkt = build(Proto::Flooding, PacketKind::Message, "A", "E", 4, json!(null), Some(vec!["X".into(), "A".into()]));
    let fwd = forward_transform(&pkt, "B").unwrap();
    assert_eq!(fwd.ttl, 3);
    assert_eq!(fwd.headers, vec!["A".to_string(), "B".to_string()]);
}

#[test]
fn header_rotation_drops_on_cycle() {
    let pkt = build(Proto::Flooding, PacketKind::Message, "A", "E", 4, json!(null), Some(vec!["X".into(), "B".into()]));
    assert!(forward_transform(&pkt, "B").is_none());
}

#[test]
fn header_rotation_drops_when_ttl_exhausted() {
    let pkt = build(Proto::Flooding, PacketKind::Message, "A", "E", 1, json!(null), None);
    assert!(forward_transform(&pkt, "B").is_none());
}

#[test]
fn header_rotation_keeps_at_most_three_entries() {
    let pkt = build(Proto::Flooding, PacketKind::Message, "A", "E", 9, json!(null), Some(vec!["W".into(), "X".into(), "Y".into()]));
    let fwd = forward_transform(&pkt, "Z").unwrap();
    assert_eq!(fwd.headers.len(), 3);
    assert_eq!(fwd.headers, vec!["X".to_string(), "Y".to_string(), "Z".to_string()]);
}
