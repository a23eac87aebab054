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

//! The wire message enum shared by the controller and the switch, and its codec.
//!
//! One [`Message`] is carried per UDP datagram. Since UDP already preserves datagram boundaries,
//! a single JSON document per packet is self-delimiting without any extra length framing.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::switch_id::SwitchId;

/// The maximum size, in bytes, of a single encoded message. The protocol never needs more than
/// this within the switch counts this system targets; this is a sanity bound, not a hard
/// fragmentation scheme.
pub const MAX_DATAGRAM_SIZE: usize = 1024;

/// A single control-plane message, tagged by variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Message {
    /// Sent by a switch to announce itself to the controller, repeated until a
    /// [`Message::RegisterResponse`] is observed.
    RegisterRequest {
        /// The id of the sending switch.
        switch_id: SwitchId,
        /// A neighbor this switch declares as failed via its `-f` flag, if any.
        failed_neighbor: Option<SwitchId>,
    },
    /// Sent by the controller to every registered switch once all switches have checked in.
    RegisterResponse {
        /// The full switch directory: `(id, host, port)` triples.
        switches: Vec<(SwitchId, String, u16)>,
        /// The globally aggregated, symmetrized failed-link map.
        failed_links: Vec<(SwitchId, SwitchId)>,
        /// The recipient's own directly-adjacent switches per the static topology, scoped to
        /// this recipient (the controller sends a distinct value per switch, same as it already
        /// does for `RoutingUpdate`). This is how a switch learns which directory entries are
        /// actual neighbors rather than treating the whole directory as adjacent.
        neighbors: Vec<SwitchId>,
    },
    /// Sent by the controller to a single switch: its routing rows, scoped to that switch.
    ///
    /// The cost is omitted on the wire between switches (switches never need it) but the
    /// controller always fills it in for its own event log; see [`RoutingRow`].
    RoutingUpdate {
        /// `(src, dst, next_hop)` rows, `next_hop = -1` meaning unreachable.
        rows: Vec<(SwitchId, SwitchId, i32)>,
    },
    /// Sent by a switch to a neighbor it believes is alive, every `K` seconds.
    KeepAlive {
        /// The id of the sending switch.
        switch_id: SwitchId,
    },
    /// Sent by a switch to the controller, every `K` seconds (or immediately on a liveness
    /// transition), reporting this switch's local view of its neighbors.
    TopologyUpdate {
        /// The id of the sending switch.
        switch_id: SwitchId,
        /// This switch's belief about whether each neighbor is alive.
        neighbor_state: BTreeMap<SwitchId, bool>,
        /// Milliseconds since this switch's own process start at which each neighbor was last
        /// heard from.
        neighbor_last_heard: BTreeMap<SwitchId, u64>,
    },
}

impl Message {
    /// The tag name used in error messages and debug logs; not part of the wire format (serde
    /// already encodes the variant name as the JSON key).
    pub fn tag(&self) -> &'static str {
        match self {
            Message::RegisterRequest { .. } => "Register_Request",
            Message::RegisterResponse { .. } => "Register_Response",
            Message::RoutingUpdate { .. } => "Routing_Update",
            Message::KeepAlive { .. } => "Keep_Alive",
            Message::TopologyUpdate { .. } => "Topology_Update",
        }
    }
}

/// Errors that can occur while encoding or decoding a [`Message`].
#[derive(Debug, Error)]
pub enum CodecError {
    /// The datagram could not be parsed as a valid, known message.
    #[error("malformed or unrecognized datagram: {0}")]
    Malformed(#[from] serde_json::Error),
    /// The encoded message exceeds [`MAX_DATAGRAM_SIZE`].
    #[error("encoded message is {0} bytes, exceeding the {MAX_DATAGRAM_SIZE} byte datagram limit")]
    TooLarge(usize),
}

/// Encode a message into its wire representation.
pub fn encode(msg: &Message) -> Result<Vec<u8>, CodecError> {
    let bytes = serde_json::to_vec(msg)?;
    if bytes.len() > MAX_DATAGRAM_SIZE {
        return Err(CodecError::TooLarge(bytes.len()));
    }
    Ok(bytes)
}

/// Decode a message from a received datagram.
///
/// Truncated or undecodable datagrams yield [`CodecError::Malformed`]; callers are expected to
/// drop the datagram and log at debug level rather than treat this as fatal.
pub fn decode(bytes: &[u8]) -> Result<Message, CodecError> {
    Ok(serde_json::from_slice(bytes)?)
}
