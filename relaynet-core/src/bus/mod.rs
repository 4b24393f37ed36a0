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

//! The pub/sub bus contract, plus an in-memory implementation used by the test suite and by
//! `relaynetd`'s single-process demo mode. A Redis-backed adapter for real multi-process runs
//! lives in the `relaynetd` binary crate, behind the `redis-bus` feature, since it is the only
//! implementation that needs an external dependency.

pub mod memory;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors raised by a [`BusAdapter`].
#[derive(Debug, Error)]
pub enum BusError {
    /// The underlying transport failed to subscribe to a channel.
    #[error("subscribe failed on channel {channel}: {source}")]
    Subscribe { channel: String, #[source] source: Box<dyn std::error::Error + Send + Sync> },
    /// The underlying transport failed to publish to a channel.
    #[error("publish failed on channel {channel}: {source}")]
    Publish { channel: String, #[source] source: Box<dyn std::error::Error + Send + Sync> },
    /// The underlying transport failed to close cleanly.
    #[error("close failed: {0}")]
    Close(Box<dyn std::error::Error + Send + Sync>),
}

/// The receiving half of a channel subscription: one message per publish, never coalesced.
pub type BusReceiver = mpsc::UnboundedReceiver<Vec<u8>>;

/// A pub/sub transport: subscribes this node's inbox, publishes to neighbor channels.
///
/// `subscribe` may be called more than once for the same channel; each call gets its own
/// receiver and every message published to that channel is delivered to all of them (the
/// "must not coalesce" contract from `spec.md` §6).
#[async_trait]
pub trait BusAdapter: Send + Sync {
    /// Subscribes to `channel`, returning a receiver yielding each published payload exactly
    /// once.
    async fn subscribe(&self, channel: &str) -> Result<BusReceiver, BusError>;

    /// Publishes `bytes` to every current subscriber of `channel`. Best-effort: a channel with
    /// no subscribers silently drops the message.
    async fn publish(&self, channel: &str, bytes: Vec<u8>) -> Result<(), BusError>;

    /// Idempotent shutdown of this adapter's connections.
    async fn close(&self) -> Result<(), BusError>;
}
