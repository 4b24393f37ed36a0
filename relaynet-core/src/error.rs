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

//! Module containing all error types

use crate::bus::BusError;
use crate::config::ConfigError;
use crate::packet::CodecError;
use thiserror::Error;

/// Main error type
#[derive(Debug, Error)]
pub enum Error {
    /// A packet failed sanitization or could not be forwarded.
    #[error("Codec Error: {0}")]
    Codec(#[from] CodecError),
    /// The bus adapter could not subscribe, publish, or close.
    #[error("Bus Error: {0}")]
    Bus(#[from] BusError),
    /// A topology or names file could not be loaded.
    #[error("Config Error: {0}")]
    Config(#[from] ConfigError),
}
