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

//! `relaynetd`: the router daemon binary. Parses the CLI, loads the topology/names files,
//! builds the configured routing engine, wires a [`NodeSupervisor`] to a bus adapter, and serves
//! the operator console until `quit` or SIGINT.

mod bus;
mod console;

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use log::{error, info};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};

use relaynet_core::bus::memory::InMemoryBus;
use relaynet_core::bus::BusAdapter;
use relaynet_core::config::{NamesConfig, TopologyConfig};
use relaynet_core::engine::flooding::FloodingEngine;
use relaynet_core::engine::linkstate::{LinkStateEngine, LinkStateMetric};
use relaynet_core::engine::staticspf::StaticSpfEngine;
use relaynet_core::engine::RoutingEngine;
use relaynet_core::graph::Metric;
use relaynet_core::packet::Proto;
use relaynet_core::supervisor::NodeSupervisor;

/// Top-level error for the daemon binary; `main`'s `Result` return makes any variant here exit
/// the process with code 1 (a config load failure, a bus transport that cannot start, or a
/// console I/O error).
#[derive(Debug, Error)]
enum DaemonError {
    /// Propagated from the core crate: bad config, a codec failure, or a bus error.
    #[error(transparent)]
    Core(#[from] relaynet_core::Error),
    /// The console's stdin loop failed.
    #[error("console I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// `--transport redis` was requested but this binary was not built with the `redis-bus`
    /// feature.
    #[error("transport `redis` requires the `redis-bus` feature; rebuild with --features redis-bus")]
    RedisFeatureDisabled,
}

/// A distributed routing testbed node: joins a pub/sub bus, exchanges JSON-framed packets with
/// its configured neighbors, and computes forwarding tables via one of three routing engines.
#[derive(Parser, Debug)]
#[command(name = "relaynetd", version, about)]
struct Cli {
    /// This node's id, as it appears in the topology and names files.
    #[arg(long)]
    id: String,

    /// Path to the topology file.
    #[arg(long)]
    topo: String,

    /// Path to the names file (bus channel addressing). Omit to use the default
    /// `net:inbox:<id>` channel scheme for every node.
    #[arg(long)]
    names: Option<String>,

    /// Default TTL for locally-originated messages and (link-state mode) LSPs.
    #[arg(long, default_value_t = 8)]
    ttl: i64,

    /// HELLO interval, in seconds.
    #[arg(long, default_value_t = 5)]
    hello: u64,

    /// LSP interval, in seconds (link-state mode only).
    #[arg(long, default_value_t = 10)]
    lsp: u64,

    /// LSDB entry max age, in seconds (link-state mode only).
    #[arg(long, default_value_t = 60)]
    maxage: u64,

    /// Duplicate-filter retention window, in seconds.
    #[arg(long, default_value_t = 60)]
    dedup_ttl: u64,

    /// Advertised-cost metric for self-originated LSPs (link-state mode only).
    #[arg(long, value_enum, default_value = "hop")]
    metric: MetricArg,

    /// Which routing engine to run.
    #[arg(long, value_enum)]
    mode: ModeArg,

    /// Which bus transport to join.
    #[arg(long, value_enum, default_value = "memory")]
    transport: TransportArg,

    /// Redis connection URL (`transport=redis` only).
    #[arg(long, default_value = "redis://127.0.0.1/")]
    redis_url: String,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum MetricArg {
    /// Every link costs 1.
    Hop,
    /// The last measured HELLO round-trip time.
    Rtt,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ModeArg {
    /// Controlled flooding: forward to every neighbor but the previous hop.
    Flooding,
    /// Static shortest-path: routes computed once from the topology file's edge weights.
    Dijkstra,
    /// Link-state: routes recomputed as LSPs are flooded and accepted.
    Lsr,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum TransportArg {
    /// A process-local in-memory bus; useful for single-process demos and for talking to other
    /// `relaynetd` instances started in the same process.
    Memory,
    /// A Redis pub/sub bus, for multi-process or multi-host runs.
    Redis,
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    pretty_env_logger::init();
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            error!("fatal: {e}");
            std::process::ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), DaemonError> {
    let topo = TopologyConfig::load(&cli.topo).map_err(relaynet_core::Error::from)?;
    let names = match &cli.names {
        Some(path) => NamesConfig::load(path).map_err(relaynet_core::Error::from)?,
        None => NamesConfig::default(),
    };
    let neighbors = topo.neighbors_of(&cli.id);

    let proto = match cli.mode {
        ModeArg::Flooding => Proto::Flooding,
        ModeArg::Dijkstra => Proto::Dijkstra,
        ModeArg::Lsr => Proto::Lsr,
    };
    let engine: Box<dyn RoutingEngine> = match cli.mode {
        ModeArg::Flooding => Box::new(FloodingEngine::new(cli.id.clone(), neighbors.clone(), cli.ttl)),
        ModeArg::Dijkstra => Box::new(StaticSpfEngine::new(cli.id.clone(), topo.symmetrized(), Metric::Weight, cli.ttl)),
        ModeArg::Lsr => {
            let metric = match cli.metric {
                MetricArg::Hop => LinkStateMetric::Hop,
                MetricArg::Rtt => LinkStateMetric::Rtt,
            };
            Box::new(LinkStateEngine::new(cli.id.clone(), neighbors.clone(), metric, Duration::from_secs(cli.maxage), cli.ttl))
        }
    };

    let bus = build_bus(&cli).await?;

    // HELLO's ttl is independent of `--ttl` (which bounds messages and LSPs): a hello is never
    // relayed, so it only needs to survive the one hop to its neighbor.
    const HELLO_TTL: i64 = 2;

    let supervisor = NodeSupervisor::new(
        cli.id.clone(),
        proto,
        neighbors,
        names,
        bus,
        engine,
        Duration::from_secs(cli.dedup_ttl),
        HELLO_TTL,
    );

    supervisor.spawn_receive_loop().await?;
    supervisor.spawn_hello_timer(Duration::from_secs(cli.hello));
    if matches!(cli.mode, ModeArg::Lsr) {
        supervisor.spawn_lsp_timer(Duration::from_secs(cli.lsp));
    }

    info!("{} up | mode={:?} | neighbors={:?}", cli.id, cli.mode, supervisor.console_neighbors());
    println!("{}", console::HELP);

    run_console(&supervisor, &cli.id).await?;

    supervisor.shutdown().await?;
    info!("{} down", cli.id);
    Ok(())
}

async fn build_bus(cli: &Cli) -> Result<Arc<dyn BusAdapter>, DaemonError> {
    match cli.transport {
        TransportArg::Memory => Ok(Arc::new(InMemoryBus::new())),
        TransportArg::Redis => {
            #[cfg(feature = "redis-bus")]
            {
                let redis_bus = bus::redis_bus::RedisBus::connect(&cli.redis_url)
                    .await
                    .map_err(relaynet_core::Error::from)?;
                Ok(Arc::new(redis_bus))
            }
            #[cfg(not(feature = "redis-bus"))]
            {
                Err(DaemonError::RedisFeatureDisabled)
            }
        }
    }
}

async fn run_console(supervisor: &NodeSupervisor, self_id: &str) -> Result<(), DaemonError> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("[{self_id}]> ");
        use std::io::Write;
        let _ = std::io::stdout().flush();

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
            line = lines.next_line() => {
                match line? {
                    None => break, // stdin closed (EOF)
                    Some(line) => {
                        if !console::dispatch(supervisor, &line).await {
                            break;
                        }
                    }
                }
            }
        }
    }
    Ok(())
}
