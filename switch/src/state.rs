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

//! The switch's state machine, kept free of any socket or logging I/O so it can be driven
//! directly from tests.

use std::collections::{BTreeMap, BTreeSet};
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use sdnp::{SdnError, SwitchId};

/// What happened as a result of [`SwitchState::handle_keep_alive`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeepAliveOutcome {
    /// The sender is on a declared failed link; the datagram is ignored entirely.
    Dropped,
    /// The sender was already live; only its last-heard time changed.
    Refreshed,
    /// The sender had been marked dead; it is alive again (Scenario D).
    BecameAlive,
}

/// All mutable state one switch process holds. Lives behind a single `std::sync::Mutex` in
/// `main.rs`.
pub struct SwitchState {
    self_id: SwitchId,
    directory: BTreeMap<SwitchId, SocketAddr>,
    failed_links: BTreeSet<(SwitchId, SwitchId)>,
    live_neighbors: BTreeSet<SwitchId>,
    neighbor_state: BTreeMap<SwitchId, bool>,
    neighbor_last_heard: BTreeMap<SwitchId, Instant>,
    routing_table: Vec<(SwitchId, SwitchId, i32)>,
}

impl SwitchState {
    /// A switch with no directory yet; filled in by the first [`SwitchState::apply_register_response`].
    pub fn new(self_id: SwitchId) -> Self {
        Self {
            self_id,
            directory: BTreeMap::new(),
            failed_links: BTreeSet::new(),
            live_neighbors: BTreeSet::new(),
            neighbor_state: BTreeMap::new(),
            neighbor_last_heard: BTreeMap::new(),
            routing_table: Vec::new(),
        }
    }

    /// This switch's own id.
    pub fn self_id(&self) -> SwitchId {
        self.self_id
    }

    /// Apply a `RegisterResponse`: build the directory, the failed-link set, and the live
    /// neighbor set from the scoped `neighbors` list, excluding any neighbor this response
    /// declares failed. Idempotent: a late or duplicate response simply resets this state from
    /// scratch.
    pub fn apply_register_response(
        &mut self,
        switches: &[(SwitchId, String, u16)],
        failed_links: &[(SwitchId, SwitchId)],
        neighbors: &[SwitchId],
        now: Instant,
    ) -> Result<(), SdnError> {
        let mut directory = BTreeMap::new();
        for (id, host, port) in switches {
            let addr: SocketAddr = format!("{host}:{port}")
                .parse()
                .map_err(|_| SdnError::InvalidAddress(format!("{host}:{port}")))?;
            directory.insert(*id, addr);
        }

        let failed: BTreeSet<(SwitchId, SwitchId)> = failed_links.iter().copied().collect();

        let mut live_neighbors = BTreeSet::new();
        let mut neighbor_state = BTreeMap::new();
        let mut neighbor_last_heard = BTreeMap::new();
        for &n in neighbors {
            if Self::link_failed(&failed, self.self_id, n) {
                continue;
            }
            live_neighbors.insert(n);
            neighbor_state.insert(n, true);
            neighbor_last_heard.insert(n, now);
        }

        self.directory = directory;
        self.failed_links = failed;
        self.live_neighbors = live_neighbors;
        self.neighbor_state = neighbor_state;
        self.neighbor_last_heard = neighbor_last_heard;
        Ok(())
    }

    fn link_failed(failed: &BTreeSet<(SwitchId, SwitchId)>, a: SwitchId, b: SwitchId) -> bool {
        failed.contains(&(a, b)) || failed.contains(&(b, a))
    }

    /// Whether the link between this switch and `n` is declared failed.
    pub fn is_link_failed(&self, n: SwitchId) -> bool {
        Self::link_failed(&self.failed_links, self.self_id, n)
    }

    /// The live, non-failed neighbors to send a keep-alive to, with their addresses.
    pub fn keep_alive_targets(&self) -> Vec<(SwitchId, SocketAddr)> {
        self.live_neighbors
            .iter()
            .filter_map(|n| self.directory.get(n).map(|addr| (*n, *addr)))
            .collect()
    }

    /// Refresh this switch's own last-heard entry (sent as part of a keep-alive round).
    pub fn refresh_self_last_heard(&mut self, now: Instant) {
        self.neighbor_last_heard.insert(self.self_id, now);
    }

    /// Apply an incoming `KeepAlive` from `from`.
    pub fn handle_keep_alive(&mut self, from: SwitchId, now: Instant) -> KeepAliveOutcome {
        if self.is_link_failed(from) {
            return KeepAliveOutcome::Dropped;
        }
        let was_dead = !self.live_neighbors.contains(&from);
        self.neighbor_last_heard.insert(from, now);
        if was_dead {
            self.live_neighbors.insert(from);
            self.neighbor_state.insert(from, true);
            KeepAliveOutcome::BecameAlive
        } else {
            KeepAliveOutcome::Refreshed
        }
    }

    /// Drop any live, non-failed neighbor whose last-heard predates `now - timeout`, returning
    /// the ids dropped.
    pub fn handle_timeout_tick(&mut self, now: Instant, timeout: Duration) -> Vec<SwitchId> {
        let stale: Vec<SwitchId> = self
            .live_neighbors
            .iter()
            .copied()
            .filter(|n| match self.neighbor_last_heard.get(n) {
                Some(&heard) => now.duration_since(heard) > timeout,
                None => true,
            })
            .collect();
        for n in &stale {
            self.live_neighbors.remove(n);
            self.neighbor_state.insert(*n, false);
        }
        stale
    }

    /// Replace the installed routing table wholesale.
    pub fn install_routing_table(&mut self, rows: Vec<(SwitchId, SwitchId, i32)>) {
        self.routing_table = rows;
    }

    /// The currently installed routing table.
    pub fn routing_table(&self) -> &[(SwitchId, SwitchId, i32)] {
        &self.routing_table
    }

    /// A snapshot of this switch's belief about each neighbor's liveness, for `TopologyUpdate`.
    pub fn neighbor_state(&self) -> BTreeMap<SwitchId, bool> {
        self.neighbor_state.clone()
    }

    /// This switch's `neighbor_last_heard` map, as milliseconds elapsed since `start`.
    pub fn neighbor_last_heard_millis(&self, start: Instant) -> BTreeMap<SwitchId, u64> {
        self.neighbor_last_heard
            .iter()
            .map(|(&id, &t)| (id, t.saturating_duration_since(start).as_millis() as u64))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn switches() -> Vec<(SwitchId, String, u16)> {
        vec![
            (SwitchId(0), "127.0.0.1".into(), 9000),
            (SwitchId(1), "127.0.0.1".into(), 9001),
            (SwitchId(2), "127.0.0.1".into(), 9002),
        ]
    }

    #[test]
    fn register_response_marks_scoped_neighbors_live() {
        let mut state = SwitchState::new(SwitchId(0));
        let now = Instant::now();
        state
            .apply_register_response(&switches(), &[], &[SwitchId(1)], now)
            .unwrap();
        let targets: Vec<_> = state.keep_alive_targets().into_iter().map(|(id, _)| id).collect();
        assert_eq!(targets, vec![SwitchId(1)]);
    }

    #[test]
    fn declared_failed_neighbor_is_excluded_from_start() {
        let mut state = SwitchState::new(SwitchId(0));
        let now = Instant::now();
        state
            .apply_register_response(
                &switches(),
                &[(SwitchId(0), SwitchId(1)), (SwitchId(1), SwitchId(0))],
                &[SwitchId(1), SwitchId(2)],
                now,
            )
            .unwrap();
        assert!(state.is_link_failed(SwitchId(1)));
        let targets: Vec<_> = state.keep_alive_targets().into_iter().map(|(id, _)| id).collect();
        assert_eq!(targets, vec![SwitchId(2)]);
    }

    #[test]
    fn keep_alive_from_dead_neighbor_marks_it_alive_again() {
        let mut state = SwitchState::new(SwitchId(0));
        let now = Instant::now();
        state
            .apply_register_response(&switches(), &[], &[SwitchId(1)], now)
            .unwrap();
        state.handle_timeout_tick(now + Duration::from_secs(100), Duration::from_secs(6));
        assert!(state.keep_alive_targets().is_empty());

        let outcome = state.handle_keep_alive(SwitchId(1), now + Duration::from_secs(200));
        assert_eq!(outcome, KeepAliveOutcome::BecameAlive);
        assert_eq!(state.keep_alive_targets().len(), 1);
    }

    #[test]
    fn keep_alive_on_failed_link_is_dropped() {
        let mut state = SwitchState::new(SwitchId(0));
        let now = Instant::now();
        state
            .apply_register_response(
                &switches(),
                &[(SwitchId(0), SwitchId(1)), (SwitchId(1), SwitchId(0))],
                &[SwitchId(1)],
                now,
            )
            .unwrap();
        let outcome = state.handle_keep_alive(SwitchId(1), now + Duration::from_secs(1));
        assert_eq!(outcome, KeepAliveOutcome::Dropped);
    }

    #[test]
    fn timeout_tick_marks_stale_neighbor_dead() {
        let mut state = SwitchState::new(SwitchId(0));
        let now = Instant::now();
        state
            .apply_register_response(&switches(), &[], &[SwitchId(1), SwitchId(2)], now)
            .unwrap();
        state.handle_keep_alive(SwitchId(2), now + Duration::from_secs(5));
        let dead = state.handle_timeout_tick(now + Duration::from_secs(7), Duration::from_secs(6));
        assert_eq!(dead, vec![SwitchId(1)]);
        assert!(state.neighbor_state()[&SwitchId(1)] == false);
    }

    #[test]
    fn installing_routing_table_twice_is_idempotent() {
        let mut state = SwitchState::new(SwitchId(4));
        let rows = vec![(SwitchId(4), SwitchId(4), 4)];
        state.install_routing_table(rows.clone());
        state.install_routing_table(rows.clone());
        assert_eq!(state.routing_table(), rows.as_slice());
    }
}
