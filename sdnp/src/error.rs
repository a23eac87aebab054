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

//! The error type shared by the controller and switch binaries.

use thiserror::Error;

use crate::message::CodecError;
use crate::topology::ConfigError;

/// Everything that can go wrong while running a controller or switch process.
#[derive(Debug, Error)]
pub enum SdnError {
    /// The topology config file was malformed.
    #[error("failed to load topology: {0}")]
    Topology(#[from] ConfigError),

    /// A datagram could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// A UDP socket or log file operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A peer's address could not be resolved or parsed.
    #[error("invalid address `{0}`")]
    InvalidAddress(String),

    /// A message arrived that is not valid in the process's current phase, e.g. a
    /// [`crate::message::Message::RoutingUpdate`] received before registration completed.
    #[error("unexpected message `{0}` in current phase")]
    UnexpectedMessage(&'static str),

    /// The switch directory supplied by the controller referenced an id this process does not
    /// know about.
    #[error("unknown switch id {0}")]
    UnknownSwitch(u32),
}
