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

//! The controller's state machine, kept free of any socket or logging I/O so it can be driven
//! directly from tests.

use std::collections::{BTreeMap, BTreeSet};
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use sdnp::{compute_routing_table, RoutingRow, SwitchId, Topology};

/// What happened as a result of a [`ControllerState::handle_register_request`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    /// The switch had never registered before; the registration count advances.
    Fresh,
    /// The switch had registered before and was still live; the registration count does not
    /// advance (Scenario E).
    Duplicate,
    /// The switch had registered before but had since been marked dead; it is now alive again.
    Resurrected,
}

/// All mutable state the controller holds for one run. Lives behind a single
/// `std::sync::Mutex` in `main.rs`; every method here is a plain, synchronous transition so the
/// lock is never held across a blocking send or log write.
pub struct ControllerState {
    topology: Topology,
    live: BTreeSet<SwitchId>,
    last_heard: BTreeMap<SwitchId, Instant>,
    addresses: BTreeMap<SwitchId, SocketAddr>,
    /// Raw `-f` declarations as reported by each switch's `RegisterRequest`, one direction per
    /// entry. Symmetrized on read via [`ControllerState::failed_links_symmetrized`].
    failed_decls: BTreeSet<(SwitchId, SwitchId)>,
}

impl ControllerState {
    /// Build a fresh controller state from a loaded topology; nothing is registered yet.
    pub fn new(topology: Topology) -> Self {
        Self {
            topology,
            live: BTreeSet::new(),
            last_heard: BTreeMap::new(),
            addresses: BTreeMap::new(),
            failed_decls: BTreeSet::new(),
        }
    }

    /// The switch count declared by the topology file.
    pub fn num_switches(&self) -> u32 {
        self.topology.num_switches()
    }

    /// Whether every `SwitchId` in `[0, N)` has registered at least once.
    pub fn all_registered(&self) -> bool {
        self.addresses.len() as u32 == self.num_switches()
    }

    /// Record one `RegisterRequest`. Idempotent: registering the same id twice while it is still
    /// live does not advance the registration count (Scenario E).
    pub fn handle_register_request(
        &mut self,
        id: SwitchId,
        addr: SocketAddr,
        failed_neighbor: Option<SwitchId>,
        now: Instant,
    ) -> RegisterOutcome {
        let was_registered = self.addresses.contains_key(&id);
        let was_live = self.live.contains(&id);

        if let Some(neighbor) = failed_neighbor {
            self.failed_decls.insert((id, neighbor));
        }
        self.addresses.insert(id, addr);
        self.last_heard.insert(id, now);
        self.live.insert(id);

        if !was_registered {
            RegisterOutcome::Fresh
        } else if !was_live {
            RegisterOutcome::Resurrected
        } else {
            RegisterOutcome::Duplicate
        }
    }

    /// Refresh a `TopologyUpdate` sender's own last-heard time, apply its neighbor liveness
    /// report, and return any switch this report just marked dead.
    pub fn handle_topology_update(
        &mut self,
        reporter: SwitchId,
        neighbor_state: &BTreeMap<SwitchId, bool>,
        now: Instant,
    ) -> Vec<SwitchId> {
        self.last_heard.insert(reporter, now);

        let mut newly_dead = Vec::new();
        for (&n, &alive) in neighbor_state {
            if alive {
                self.last_heard.insert(n, now);
            } else if self.live.remove(&n) {
                newly_dead.push(n);
            }
        }
        newly_dead
    }

    /// Drop any live switch whose last-heard time predates `now - timeout`, returning the ids
    /// dropped.
    pub fn scan_timeouts(&mut self, now: Instant, timeout: Duration) -> Vec<SwitchId> {
        let stale: Vec<SwitchId> = self
            .live
            .iter()
            .copied()
            .filter(|id| match self.last_heard.get(id) {
                Some(&heard) => now.duration_since(heard) > timeout,
                None => true,
            })
            .collect();
        for id in &stale {
            self.live.remove(id);
        }
        stale
    }

    /// The full switch directory as `(id, host, port)` triples, sorted by id.
    pub fn switch_directory(&self) -> Vec<(SwitchId, String, u16)> {
        self.addresses
            .iter()
            .map(|(&id, addr)| (id, addr.ip().to_string(), addr.port()))
            .collect()
    }

    /// The aggregated failed-link declarations, each stored in both directions so that either
    /// endpoint can recognize the link as failed regardless of which side declared it.
    pub fn failed_links_symmetrized(&self) -> Vec<(SwitchId, SwitchId)> {
        let mut out = BTreeSet::new();
        for &(a, b) in &self.failed_decls {
            out.insert((a, b));
            out.insert((b, a));
        }
        out.into_iter().collect()
    }

    fn failed_links_set(&self) -> BTreeSet<(SwitchId, SwitchId)> {
        self.failed_links_symmetrized().into_iter().collect()
    }

    /// The switch endpoint to send datagrams to, if registered.
    pub fn address_of(&self, id: SwitchId) -> Option<SocketAddr> {
        self.addresses.get(&id).copied()
    }

    /// `id`'s directly-adjacent switches per the static topology, irrespective of liveness.
    pub fn neighbors_of(&self, id: SwitchId) -> Vec<SwitchId> {
        self.topology.neighbors(id).collect()
    }

    /// The current live-switch set.
    pub fn live_switches(&self) -> BTreeSet<SwitchId> {
        self.live.clone()
    }

    /// Recompute the full routing table over the current live set and failed links.
    pub fn recompute(&self) -> Vec<RoutingRow> {
        compute_routing_table(&self.topology, &self.live, &self.failed_links_set())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), port)
    }

    fn linear_chain() -> Topology {
        Topology::parse("3\n0 1 1\n1 2 1\n").unwrap()
    }

    #[test]
    fn duplicate_registration_does_not_advance_count() {
        let mut state = ControllerState::new(linear_chain());
        let now = Instant::now();
        assert_eq!(
            state.handle_register_request(SwitchId(0), addr(9000), None, now),
            RegisterOutcome::Fresh
        );
        assert_eq!(
            state.handle_register_request(SwitchId(0), addr(9000), None, now),
            RegisterOutcome::Duplicate
        );
        assert_eq!(state.switch_directory().len(), 1);
    }

    #[test]
    fn all_registered_becomes_true_at_n() {
        let mut state = ControllerState::new(linear_chain());
        let now = Instant::now();
        for i in 0..3 {
            state.handle_register_request(SwitchId(i), addr(9000 + i as u16), None, now);
        }
        assert!(state.all_registered());
    }

    #[test]
    fn dead_switch_resurrects_on_new_register_request() {
        let mut state = ControllerState::new(linear_chain());
        let now = Instant::now();
        state.handle_register_request(SwitchId(1), addr(9001), None, now);
        state.scan_timeouts(now + Duration::from_secs(100), Duration::from_secs(6));
        assert!(!state.live_switches().contains(&SwitchId(1)));

        let outcome = state.handle_register_request(
            SwitchId(1),
            addr(9001),
            None,
            now + Duration::from_secs(200),
        );
        assert_eq!(outcome, RegisterOutcome::Resurrected);
        assert!(state.live_switches().contains(&SwitchId(1)));
    }

    #[test]
    fn topology_update_marks_reported_dead_neighbor_dead() {
        let mut state = ControllerState::new(linear_chain());
        let now = Instant::now();
        for i in 0..3 {
            state.handle_register_request(SwitchId(i), addr(9000 + i as u16), None, now);
        }
        let mut report = BTreeMap::new();
        report.insert(SwitchId(1), false);
        let dead = state.handle_topology_update(SwitchId(0), &report, now);
        assert_eq!(dead, vec![SwitchId(1)]);
        assert!(!state.live_switches().contains(&SwitchId(1)));
    }

    #[test]
    fn stale_switch_is_dropped_after_timeout() {
        let mut state = ControllerState::new(linear_chain());
        let now = Instant::now();
        state.handle_register_request(SwitchId(0), addr(9000), None, now);
        let dropped = state.scan_timeouts(now + Duration::from_secs(7), Duration::from_secs(6));
        assert_eq!(dropped, vec![SwitchId(0)]);
    }

    #[test]
    fn failed_declaration_is_symmetrized() {
        let mut state = ControllerState::new(Topology::parse("3\n0 1 1\n1 2 1\n0 2 1\n").unwrap());
        let now = Instant::now();
        state.handle_register_request(SwitchId(0), addr(9000), Some(SwitchId(1)), now);
        state.handle_register_request(SwitchId(1), addr(9001), None, now);
        state.handle_register_request(SwitchId(2), addr(9002), None, now);

        let links = state.failed_links_symmetrized();
        assert!(links.contains(&(SwitchId(0), SwitchId(1))));
        assert!(links.contains(&(SwitchId(1), SwitchId(0))));

        let rows = state.recompute();
        let row = rows
            .iter()
            .find(|r| r.src == SwitchId(0) && r.dst == SwitchId(1))
            .unwrap();
        assert_eq!(row.next_hop, 2);
        assert_eq!(row.cost, 2);
    }
}
