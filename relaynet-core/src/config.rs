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

//! Topology and names file parsing.
//!
//! Both files are loaded once per process at startup; a failure to parse either is fatal (see
//! `spec.md` §7). The topology loader accepts every edge shape `spec.md` §6 lists and
//! auto-symmetrizes the resulting graph for the static-SPF engine.

use std::collections::HashMap;

use serde_json::Value;
use thiserror::Error;

use crate::graph::{symmetrize, Graph};

/// Errors raised while loading a topology or names file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file's top-level JSON was not an object, or was missing `config`.
    #[error("malformed config file: {0}")]
    Malformed(String),
    /// An edge entry for some node had a shape none of the accepted variants match.
    #[error("invalid edges for node {0}: {1}")]
    InvalidEdges(String, String),
    /// The file could not be read from disk.
    #[error("failed to read {path}: {source}")]
    Io { path: String, #[source] source: std::io::Error },
    /// The file's contents were not valid JSON.
    #[error("failed to parse {path} as JSON: {source}")]
    Json { path: String, #[source] source: serde_json::Error },
}

/// A loaded topology file: this process's view of the network graph.
#[derive(Debug, Clone)]
pub struct TopologyConfig {
    /// The raw, as-configured directed graph (before symmetrization).
    pub graph: Graph,
}

impl TopologyConfig {
    /// Loads a topology file from `path`.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io { path: path.to_string(), source })?;
        Self::parse(&text)
    }

    /// Parses a topology file's contents: `{"type":"topo","config": {<id>: <edges>, ...}}`.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let value: Value = serde_json::from_str(text).map_err(|source| ConfigError::Json { path: "<topology>".to_string(), source })?;
        let obj = value.as_object().ok_or_else(|| ConfigError::Malformed("top-level value is not an object".into()))?;
        let config = obj
            .get("config")
            .and_then(Value::as_object)
            .ok_or_else(|| ConfigError::Malformed("missing `config` object".into()))?;

        let mut graph: Graph = HashMap::new();
        for (id, edges) in config {
            let neighbors = parse_edges(edges).ok_or_else(|| ConfigError::InvalidEdges(id.clone(), format!("{edges}")))?;
            graph.insert(id.clone(), neighbors);
        }
        Ok(Self { graph })
    }

    /// The neighbor ids configured for `self_id` (before symmetrization).
    pub fn neighbors_of(&self, self_id: &str) -> Vec<String> {
        self.graph.get(self_id).map(|n| n.keys().cloned().collect()).unwrap_or_default()
    }

    /// The graph with every edge's reverse added, for the static-SPF engine.
    pub fn symmetrized(&self) -> Graph {
        symmetrize(&self.graph)
    }
}

/// Parses one node's `<edges>` value, accepting every shape `spec.md` §6 lists:
/// `{id: cost}`, `[{"to": id, "cost": c}, ...]`, `[[id, c], ...]`, or `[id, ...]` (cost
/// defaults to 1).
fn parse_edges(value: &Value) -> Option<HashMap<String, u32>> {
    let mut out = HashMap::new();
    match value {
        Value::Object(map) => {
            for (k, v) in map {
                out.insert(k.clone(), v.as_u64().unwrap_or(1) as u32);
            }
        }
        Value::Array(items) => {
            for item in items {
                match item {
                    Value::Object(o) => {
                        let to = o.get("to")?.as_str()?.to_string();
                        let cost = o.get("cost").and_then(Value::as_u64).unwrap_or(1) as u32;
                        out.insert(to, cost);
                    }
                    Value::Array(pair) => {
                        let to = pair.first()?.as_str()?.to_string();
                        let cost = pair.get(1).and_then(Value::as_u64).unwrap_or(1) as u32;
                        out.insert(to, cost);
                    }
                    Value::String(id) => {
                        out.insert(id.clone(), 1);
                    }
                    _ => return None,
                }
            }
        }
        _ => return None,
    }
    Some(out)
}

/// The default bus channel scheme when a names entry omits an explicit `channel`.
pub fn default_channel(id: &str) -> String {
    format!("net:inbox:{id}")
}

/// A loaded names file: bus addressing for this node and its neighbors.
///
/// Cheap to clone (a small `HashMap<String, String>`); each spawned task keeps its own copy
/// rather than sharing a reference across an `.await`.
#[derive(Debug, Clone, Default)]
pub struct NamesConfig {
    channels: HashMap<String, String>,
}

impl NamesConfig {
    /// Loads a names file from `path`.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io { path: path.to_string(), source })?;
        Self::parse(&text)
    }

    /// Parses a names file's contents: `{"type":"names", "config": {<id>: {"channel": "..."} |
    /// "host:port"}}`. A bare string entry is kept as-is and used as the channel name directly.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let value: Value = serde_json::from_str(text).map_err(|source| ConfigError::Json { path: "<names>".to_string(), source })?;
        let obj = value.as_object().ok_or_else(|| ConfigError::Malformed("top-level value is not an object".into()))?;
        let config = obj
            .get("config")
            .and_then(Value::as_object)
            .ok_or_else(|| ConfigError::Malformed("missing `config` object".into()))?;

        let mut channels = HashMap::new();
        for (id, entry) in config {
            let channel = match entry {
                Value::Object(o) => o.get("channel").and_then(Value::as_str).map(str::to_string).unwrap_or_else(|| default_channel(id)),
                Value::String(s) => s.clone(),
                _ => default_channel(id),
            };
            channels.insert(id.clone(), channel);
        }
        Ok(Self { channels })
    }

    /// The bus channel for `id`, falling back to the default scheme if unconfigured.
    pub fn channel_of(&self, id: &str) -> String {
        self.channels.get(id).cloned().unwrap_or_else(|| default_channel(id))
    }
}
