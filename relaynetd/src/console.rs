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

//! The operator console: a line-oriented REPL, same command set as
//! `original_source/LSR/node.py`'s `_console_loop` minus the `topo`/`graph` DOT dump (the
//! `lsdb` command already exposes the same information as text).

use log::warn;
use serde_json::Value;

use relaynet_core::supervisor::NodeSupervisor;

/// Printed once at startup and on `help`.
pub const HELP: &str = "\
Commands:
  send <DEST> <TEXT>  - send a message toward DEST
  table               - print the routing table
  route <DEST>        - print the route to DEST
  lsdb                - print the link-state database
  recompute           - recompute routes from the current graph
  neighbors           - list configured neighbors
  stats               - print engine counters
  lsp                 - originate an LSP now
  ttl <N>             - set the HELLO ttl
  help                - show this text
  quit                - shut down and exit";

/// Runs one console command against `supervisor`. Returns `false` when the REPL should stop.
pub async fn dispatch(supervisor: &NodeSupervisor, line: &str) -> bool {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let Some(&cmd) = parts.first() else { return true };

    match cmd.to_ascii_lowercase().as_str() {
        "send" if parts.len() >= 3 => {
            let dest = parts[1];
            let text = parts[2..].join(" ");
            println!("{}", supervisor.console_send(dest, Value::String(text)).await);
        }
        "send" => println!("usage: send <DEST> <TEXT>"),
        "table" => println!("{}", supervisor.console_table().await),
        "route" if parts.len() >= 2 => println!("{}", supervisor.console_route(parts[1]).await),
        "route" => println!("usage: route <DEST>"),
        "lsdb" => println!("{}", supervisor.console_lsdb().await),
        "recompute" => println!("{}", supervisor.console_recompute().await),
        "neighbors" => println!("{}", supervisor.console_neighbors()),
        "stats" => println!("{}", supervisor.console_stats().await),
        "lsp" => println!("{}", supervisor.console_force_lsp().await),
        "ttl" if parts.len() >= 2 => match parts[1].parse::<i64>() {
            Ok(n) => println!("{}", supervisor.console_set_ttl(n).await),
            Err(_) => println!("usage: ttl <N>"),
        },
        "ttl" => println!("usage: ttl <N>"),
        "help" => println!("{HELP}"),
        "quit" | "exit" => return false,
        other => {
            warn!("unknown console command: {other}");
            println!("unknown command: {other} (try `help`)");
        }
    }
    true
}
