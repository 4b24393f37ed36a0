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

//! The node supervisor: wires the bus adapter to a routing engine, runs the HELLO/LSP timers,
//! and serves the console's operator surface, all behind a single per-node lock.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;

use crate::bus::BusAdapter;
use crate::config::NamesConfig;
use crate::dedup::DuplicateFilter;
use crate::engine::{EngineEvent, RoutingEngine};
use crate::error::Error;
use crate::packet::{self, PacketKind, Proto};

/// Shared per-node state, guarded by one lock per `spec.md` §5.
struct NodeState {
    engine: Box<dyn RoutingEngine>,
    dedup: DuplicateFilter,
    hello_ttl: i64,
    pending_pings: HashMap<String, (Instant, String)>,
}

/// Orchestrates one router node: the engine, the bus adapter, the timers, and the console
/// surface, all behind `Arc<tokio::sync::Mutex<NodeState>>`.
pub struct NodeSupervisor {
    self_id: String,
    proto: Proto,
    neighbors: Vec<String>,
    names: NamesConfig,
    bus: Arc<dyn BusAdapter>,
    state: Arc<Mutex<NodeState>>,
    cancel: CancellationToken,
}

impl NodeSupervisor {
    /// Builds a supervisor for `self_id`, driving `engine`, publishing over `bus`, addressed via
    /// `names`.
    pub fn new(
        self_id: impl Into<String>,
        proto: Proto,
        neighbors: Vec<String>,
        names: NamesConfig,
        bus: Arc<dyn BusAdapter>,
        engine: Box<dyn RoutingEngine>,
        dedup_ttl: Duration,
        hello_ttl: i64,
    ) -> Self {
        let state = NodeState { engine, dedup: DuplicateFilter::new(dedup_ttl), hello_ttl, pending_pings: HashMap::new() };
        Self {
            self_id: self_id.into(),
            proto,
            neighbors,
            names,
            bus,
            state: Arc::new(Mutex::new(state)),
            cancel: CancellationToken::new(),
        }
    }

    /// A token callers can use to observe (or trigger) shutdown.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Subscribes to this node's inbox and spawns the receive loop as a background task.
    pub async fn spawn_receive_loop(&self) -> Result<(), Error> {
        let channel = self.names.channel_of(&self.self_id);
        let mut rx = self.bus.subscribe(&channel).await?;
        let state = self.state.clone();
        let bus = self.bus.clone();
        let names = self.names.clone();
        let self_id = self.self_id.clone();
        let cancel = self.cancel.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    maybe_bytes = rx.recv() => {
                        let Some(bytes) = maybe_bytes else { break };
                        handle_inbound(&state, &bus, &names, &self_id, &bytes).await;
                    }
                }
            }
        });
        Ok(())
    }

    /// Spawns the HELLO timer: after a short startup delay, emits a `hello` every
    /// `hello_interval`.
    pub fn spawn_hello_timer(&self, hello_interval: Duration) {
        let state = self.state.clone();
        let bus = self.bus.clone();
        let names = self.names.clone();
        let self_id = self.self_id.clone();
        let neighbors = self.neighbors.clone();
        let proto = self.proto;
        let cancel = self.cancel.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            let mut ticker = interval(hello_interval);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => emit_hello(&state, &bus, &names, &self_id, &neighbors, proto).await,
                }
            }
        });
    }

    /// Spawns the LSP timer (LinkState only): after a short startup delay, originates an LSP
    /// every `lsp_interval`.
    pub fn spawn_lsp_timer(&self, lsp_interval: Duration) {
        let state = self.state.clone();
        let bus = self.bus.clone();
        let names = self.names.clone();
        let cancel = self.cancel.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(1500)).await;
            let mut ticker = interval(lsp_interval);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => originate_lsp(&state, &bus, &names).await,
                }
            }
        });
    }

    /// The console's `send DEST TEXT` command.
    pub async fn console_send(&self, dest: &str, payload: Value) -> String {
        let mut state = self.state.lock().await;
        let (outbound, events) = state.engine.send(dest, payload);
        drop(state);
        publish_all(&self.bus, &self.names, outbound).await;
        summarize_events(&events)
    }

    /// The console's `table` command.
    pub async fn console_table(&self) -> String {
        self.state.lock().await.engine.describe_table().unwrap_or_else(|| "engine has no routing table".to_string())
    }

    /// The console's `route DEST` command.
    pub async fn console_route(&self, dest: &str) -> String {
        self.state.lock().await.engine.describe_route(dest).unwrap_or_else(|| "engine has no routing table".to_string())
    }

    /// The console's `lsdb` command.
    pub async fn console_lsdb(&self) -> String {
        self.state.lock().await.engine.describe_lsdb().unwrap_or_else(|| "engine has no lsdb".to_string())
    }

    /// The console's `stats` command.
    pub async fn console_stats(&self) -> String {
        self.state.lock().await.engine.describe_stats().unwrap_or_else(|| "engine has no stats".to_string())
    }

    /// The console's `recompute` command.
    pub async fn console_recompute(&self) -> String {
        self.state.lock().await.engine.recompute();
        "recomputed".to_string()
    }

    /// The console's `lsp` command: force an immediate LSP origination.
    pub async fn console_force_lsp(&self) -> String {
        originate_lsp(&self.state, &self.bus, &self.names).await;
        "lsp originated".to_string()
    }

    /// The console's `ttl N` command.
    pub async fn console_set_ttl(&self, n: i64) -> String {
        self.state.lock().await.hello_ttl = n;
        format!("hello ttl set to {n}")
    }

    /// The console's `neighbors` command.
    pub fn console_neighbors(&self) -> String {
        self.neighbors.join(", ")
    }

    /// Clean shutdown: stop every timer and the receive loop, then close the bus.
    pub async fn shutdown(&self) -> Result<(), Error> {
        self.cancel.cancel();
        self.bus.close().await?;
        Ok(())
    }
}

async fn handle_inbound(state: &Arc<Mutex<NodeState>>, bus: &Arc<dyn BusAdapter>, names: &NamesConfig, self_id: &str, bytes: &[u8]) {
    let raw: Value = match serde_json::from_slice(bytes) {
        Ok(v) => v,
        Err(e) => {
            debug!("drop_bad: payload is not valid JSON: {e}");
            let mut state = state.lock().await;
            state.engine.record_drop_bad();
            return;
        }
    };
    let pkt = match packet::sanitize(&raw) {
        Ok(p) => p,
        Err(e) => {
            debug!("drop_bad: {e}");
            let mut state = state.lock().await;
            state.engine.record_drop_bad();
            return;
        }
    };

    // Node-level keepalive protocol: a directed HELLO (this node's own send, see `emit_hello`)
    // gets an immediate ECHO reply so the sender can measure RTT; neither is seen by the engine,
    // mirroring `node.on_echo`/the inline echo-reply in the original per-protocol node wrappers.
    if pkt.kind == PacketKind::Hello && pkt.to == self_id {
        reply_echo(bus, names, self_id, &pkt.from, &pkt.msg_id, pkt.proto).await;
        return;
    }
    if pkt.kind == PacketKind::Echo {
        let mut state = state.lock().await;
        if let Some((sent_at, neighbor)) = state.pending_pings.remove(&pkt.msg_id) {
            let rtt_ms = sent_at.elapsed().as_millis().min(u32::MAX as u128) as u32;
            state.engine.record_rtt(&neighbor, rtt_ms);
        }
        return;
    }

    let incoming_neighbor = pkt.headers.last().cloned();

    let mut state = state.lock().await;
    if !state.dedup.add_if_new(&pkt.msg_id) {
        state.engine.record_drop_dup();
        return;
    }
    let (outbound, events) = state.engine.on_packet(pkt, incoming_neighbor.as_deref());
    drop(state);

    for event in &events {
        log_event(self_id, event);
    }
    publish_all(bus, names, outbound).await;
}

async fn reply_echo(bus: &Arc<dyn BusAdapter>, names: &NamesConfig, self_id: &str, to: &str, reply_to_msg_id: &str, proto: Proto) {
    let pkt = packet::build(
        proto,
        PacketKind::Echo,
        self_id.to_string(),
        to.to_string(),
        2,
        serde_json::json!({"reply_to": reply_to_msg_id}),
        None,
    );
    publish_direct(bus, names, to, &pkt).await;
}

async fn emit_hello(
    state: &Arc<Mutex<NodeState>>,
    bus: &Arc<dyn BusAdapter>,
    names: &NamesConfig,
    self_id: &str,
    neighbors: &[String],
    proto: Proto,
) {
    let hello_ttl = state.lock().await.hello_ttl;
    let now = Instant::now();
    for neighbor in neighbors {
        let pkt = packet::build(proto, PacketKind::Hello, self_id.to_string(), neighbor.clone(), hello_ttl, Value::Object(Default::default()), None);
        {
            let mut state = state.lock().await;
            state.pending_pings.insert(pkt.msg_id.clone(), (now, neighbor.clone()));
        }
        publish_direct(bus, names, neighbor, &pkt).await;
    }
}

async fn publish_direct(bus: &Arc<dyn BusAdapter>, names: &NamesConfig, to: &str, pkt: &crate::packet::Packet) {
    let bytes = match serde_json::to_vec(pkt) {
        Ok(b) => b,
        Err(e) => {
            warn!("failed to encode packet to {to}: {e}");
            return;
        }
    };
    let channel = names.channel_of(to);
    if let Err(e) = bus.publish(&channel, bytes).await {
        warn!("publish to {channel} failed: {e}");
    }
}

async fn originate_lsp(state: &Arc<Mutex<NodeState>>, bus: &Arc<dyn BusAdapter>, names: &NamesConfig) {
    let outbound = {
        let mut state = state.lock().await;
        state.engine.originate_control()
    };
    publish_all(bus, names, outbound).await;
}

async fn publish_all(bus: &Arc<dyn BusAdapter>, names: &NamesConfig, outbound: Vec<crate::engine::Outbound>) {
    // Dedup by resolved channel, not by neighbor id: several neighbors can share a bus channel,
    // and a broadcast/flood must reach that channel only once. Keeps the first packet queued for
    // a channel, matching `original_source/Flooding/transport_redis.py`'s `broadcast()`.
    let mut seen = std::collections::HashSet::new();
    for ob in outbound {
        let channel = names.channel_of(&ob.to);
        if !seen.insert(channel.clone()) {
            continue;
        }
        match serde_json::to_vec(&ob.packet) {
            Ok(bytes) => {
                if let Err(e) = bus.publish(&channel, bytes).await {
                    warn!("publish to {channel} failed: {e}");
                }
            }
            Err(e) => warn!("failed to encode outbound packet: {e}"),
        }
    }
}

fn log_event(self_id: &str, event: &EngineEvent) {
    match event {
        EngineEvent::Delivered { from, payload } => info!("[deliver] {self_id} <- {from}: {payload}"),
        EngineEvent::Forwarded { to } => debug!("[forward] {self_id} -> {to:?}"),
        EngineEvent::DroppedCycle => debug!("[drop] cycle detected at {self_id}"),
        EngineEvent::DroppedTtl => debug!("[drop] ttl expired at {self_id}"),
        EngineEvent::NoRoute { to } => warn!("[drop] no route from {self_id} to {to}"),
    }
}

fn summarize_events(events: &[EngineEvent]) -> String {
    if events.is_empty() {
        return "sent".to_string();
    }
    events
        .iter()
        .map(|e| match e {
            EngineEvent::Delivered { .. } => "delivered locally".to_string(),
            EngineEvent::Forwarded { to } => format!("forwarded to {}", to.join(", ")),
            EngineEvent::DroppedCycle => "dropped: cycle".to_string(),
            EngineEvent::DroppedTtl => "dropped: ttl expired".to_string(),
            EngineEvent::NoRoute { to } => format!("no route to {to}"),
        })
        .collect::<Vec<_>>()
        .join("; ")
}
