// netlab: a minimal OpenFlow-style SDN control plane
// Copyright (C) 2026 The netlab Contributors
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

//! Shared pieces of the control plane: the wire codec, the static topology and its config-file
//! grammar, the shortest-path engine, the fixed-format event log, and the crate-wide error type.
//!
//! The `controller` and `switch` binaries each depend on this crate and differ only in which
//! side of the protocol they drive.

pub mod error;
pub mod event_log;
pub mod message;
pub mod routing;
pub mod switch_id;
pub mod topology;

pub use error::SdnError;
pub use event_log::EventLog;
pub use message::{decode, encode, CodecError, Message, MAX_DATAGRAM_SIZE};
pub use routing::{compute_routing_table, project_for_switch, RoutingRow};
pub use switch_id::SwitchId;
pub use topology::{ConfigError, Topology, INF};

/// The keep-alive / topology-report period, in seconds.
pub const K_SECONDS: u64 = 2;

/// The neighbor liveness timeout, in seconds: `3 * K_SECONDS`.
pub const TIMEOUT_SECONDS: u64 = 3 * K_SECONDS;
