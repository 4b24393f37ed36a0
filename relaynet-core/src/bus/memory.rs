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

//! A process-local pub/sub hub built on `tokio::sync::broadcast`, keyed by channel name.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc};

use super::{BusAdapter, BusError, BusReceiver};

const CHANNEL_CAPACITY: usize = 1024;

/// An in-memory bus: every channel is a `tokio::sync::broadcast` topic. Used by the test suite
/// (so scenarios run without a real broker) and by `relaynetd --transport memory` for
/// single-process demos.
#[derive(Default)]
pub struct InMemoryBus {
    topics: Mutex<HashMap<String, broadcast::Sender<Vec<u8>>>>,
}

impl InMemoryBus {
    /// Creates an empty bus with no channels yet.
    pub fn new() -> Self {
        Self::default()
    }

    fn sender_for(&self, channel: &str) -> broadcast::Sender<Vec<u8>> {
        let mut topics = self.topics.lock().unwrap();
        topics.entry(channel.to_string()).or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0).clone()
    }
}

#[async_trait]
impl BusAdapter for InMemoryBus {
    async fn subscribe(&self, channel: &str) -> Result<BusReceiver, BusError> {
        let mut rx = self.sender_for(channel).subscribe();
        let (tx, out_rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(bytes) => {
                        if tx.send(bytes).is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        Ok(out_rx)
    }

    async fn publish(&self, channel: &str, bytes: Vec<u8>) -> Result<(), BusError> {
        // A send with no subscribers is a normal best-effort no-op, not a transport failure.
        let _ = self.sender_for(channel).send(bytes);
        Ok(())
    }

    async fn close(&self) -> Result<(), BusError> {
        self.topics.lock().unwrap().clear();
        Ok(())
    }
}
