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

//! The static topology graph and its config-file parser.

use std::fmt;

use thiserror::Error;

use crate::switch_id::SwitchId;

/// Sentinel cost meaning "no edge" / "unreachable".
pub const INF: u32 = 9999;

/// The static, symmetric `N x N` edge-cost matrix loaded from the topology config file.
///
/// The diagonal is always `0`; off-diagonal entries are either the configured cost or [`INF`].
/// Immutable once built: only switch/neighbor *liveness* varies at runtime, never edge costs.
#[derive(Debug, Clone)]
pub struct Topology {
    n: u32,
    costs: Vec<u32>,
}

impl Topology {
    /// The number of switches declared by the config file.
    pub fn num_switches(&self) -> u32 {
        self.n
    }

    /// The configured cost between `a` and `b` (symmetric; `0` on the diagonal).
    pub fn cost(&self, a: SwitchId, b: SwitchId) -> u32 {
        self.costs[self.offset(a, b)]
    }

    /// Whether an edge exists between `a` and `b` per the static config (irrespective of
    /// liveness or declared failed links).
    pub fn has_edge(&self, a: SwitchId, b: SwitchId) -> bool {
        a != b && self.cost(a, b) != INF && self.cost(a, b) != 0
    }

    /// All switches with a configured edge to `s` (again, irrespective of liveness).
    pub fn neighbors(&self, s: SwitchId) -> impl Iterator<Item = SwitchId> + '_ {
        SwitchId::range(self.n).filter(move |&n| self.has_edge(s, n))
    }

    fn offset(&self, a: SwitchId, b: SwitchId) -> usize {
        a.index() * self.n as usize + b.index()
    }

    /// Parse a topology config file: line 1 is the decimal switch count `N`; each remaining
    /// non-blank line is `<a> <b> <cost>`, an undirected edge. Unlisted pairs default to
    /// [`INF`]; self-pairs default to `0`.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let mut lines = text.lines();
        let n: u32 = lines
            .next()
            .ok_or(ConfigError::Empty)?
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidSwitchCount)?;

        let mut costs = vec![INF; (n * n) as usize];
        for i in 0..n {
            costs[(i * n + i) as usize] = 0;
        }

        let mut topo = Topology { n, costs };

        for (lineno, line) in lines.enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let mut fields = line.split_whitespace();
            let bad = || ConfigError::MalformedEdge(lineno + 2, line.to_string());
            let a: u32 = fields.next().ok_or_else(bad)?.parse().map_err(|_| bad())?;
            let b: u32 = fields.next().ok_or_else(bad)?.parse().map_err(|_| bad())?;
            let cost: u32 = fields.next().ok_or_else(bad)?.parse().map_err(|_| bad())?;
            if a >= n || b >= n {
                return Err(ConfigError::SwitchOutOfRange(lineno + 2, line.to_string()));
            }
            let (sa, sb) = (SwitchId(a), SwitchId(b));
            let offset_ab = topo.offset(sa, sb);
            let offset_ba = topo.offset(sb, sa);
            topo.costs[offset_ab] = cost;
            topo.costs[offset_ba] = cost;
        }

        Ok(topo)
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for a in SwitchId::range(self.n) {
            for b in SwitchId::range(self.n) {
                write!(f, "{:>5}", self.cost(a, b))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Errors while parsing a topology config file. Fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file was empty.
    #[error("config file is empty")]
    Empty,
    /// The first line was not a valid switch count.
    #[error("first line is not a valid switch count")]
    InvalidSwitchCount,
    /// An edge line could not be parsed as `<a> <b> <cost>`.
    #[error("line {0}: malformed edge `{1}`")]
    MalformedEdge(usize, String),
    /// An edge line referenced a switch id outside `[0, N)`.
    #[error("line {0}: switch id out of range in `{1}`")]
    SwitchOutOfRange(usize, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_linear_chain() {
        let topo = Topology::parse("3\n0 1 1\n1 2 1\n").unwrap();
        assert_eq!(topo.num_switches(), 3);
        assert_eq!(topo.cost(SwitchId(0), SwitchId(0)), 0);
        assert_eq!(topo.cost(SwitchId(0), SwitchId(1)), 1);
        assert_eq!(topo.cost(SwitchId(1), SwitchId(0)), 1);
        assert_eq!(topo.cost(SwitchId(0), SwitchId(2)), INF);
    }

    #[test]
    fn single_switch_has_only_self_loop() {
        let topo = Topology::parse("1\n").unwrap();
        assert_eq!(topo.num_switches(), 1);
        assert_eq!(topo.cost(SwitchId(0), SwitchId(0)), 0);
        assert_eq!(topo.neighbors(SwitchId(0)).count(), 0);
    }

    #[test]
    fn rejects_out_of_range_edge() {
        assert!(matches!(
            Topology::parse("2\n0 5 1\n"),
            Err(ConfigError::SwitchOutOfRange(_, _))
        ));
    }

    #[test]
    fn rejects_malformed_edge_line() {
        assert!(matches!(
            Topology::parse("2\n0 banana 1\n"),
            Err(ConfigError::MalformedEdge(_, _))
        ));
    }

    #[test]
    fn rejects_empty_file() {
        assert!(matches!(Topology::parse(""), Err(ConfigError::Empty)));
    }

    #[test]
    fn neighbors_excludes_self_and_unreachable() {
        let topo = Topology::parse("3\n0 1 4\n").unwrap();
        let ns: Vec<_> = topo.neighbors(SwitchId(0)).collect();
        assert_eq!(ns, vec![SwitchId(1)]);
    }
}
