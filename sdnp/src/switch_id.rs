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

//! The identifier used for every switch in the topology.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A switch identifier: a dense index into `[0, N)`, where `N` is the number of switches declared
/// in the topology file.
///
/// Kept as a distinct type rather than a bare `u32` throughout this crate so that switch ids are
/// never compared as strings by accident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SwitchId(pub u32);

impl SwitchId {
    /// Build the dense range `[0, n)` of switch ids.
    pub fn range(n: u32) -> impl Iterator<Item = SwitchId> {
        (0..n).map(SwitchId)
    }

    /// The plain index, for use as an array/matrix subscript.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SwitchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SwitchId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(SwitchId)
    }
}

impl From<u32> for SwitchId {
    fn from(x: u32) -> Self {
        SwitchId(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_is_dense_and_ordered() {
        let ids: Vec<_> = SwitchId::range(3).collect();
        assert_eq!(ids, vec![SwitchId(0), SwitchId(1), SwitchId(2)]);
    }

    #[test]
    fn parses_from_decimal_text() {
        assert_eq!("42".parse::<SwitchId>().unwrap(), SwitchId(42));
        assert!("abc".parse::<SwitchId>().is_err());
    }

    #[test]
    fn displays_as_bare_integer() {
        assert_eq!(SwitchId(7).to_string(), "7");
    }
}
