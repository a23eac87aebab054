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

//! The shortest-path engine: per-source Dijkstra over the static topology, restricted to the
//! live switch set and excluding declared failed links.

use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap};

use crate::switch_id::SwitchId;
use crate::topology::{Topology, INF};

/// One row of a routing table: the route from `src` to `dst`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutingRow {
    /// The source switch this row applies to.
    pub src: SwitchId,
    /// The destination switch.
    pub dst: SwitchId,
    /// The next hop on the shortest path from `src` to `dst`, or `-1` if unreachable.
    pub next_hop: i32,
    /// The shortest-path cost, or [`INF`] if unreachable.
    pub cost: u32,
}

/// Recompute the full routing table for every live switch.
///
/// `failed_links` is assumed already symmetrized: if `(a, b)` is present, `(b, a)` need not be
/// (both directions are checked regardless). Rows are ordered by ascending `src`, then ascending
/// `dst`, which is also the order the end-to-end scenarios in this protocol's test suite expect.
pub fn compute_routing_table(
    topo: &Topology,
    live: &BTreeSet<SwitchId>,
    failed_links: &BTreeSet<(SwitchId, SwitchId)>,
) -> Vec<RoutingRow> {
    let mut rows = Vec::new();
    for src in live.iter().copied() {
        rows.extend(shortest_paths_from(topo, live, failed_links, src));
    }
    rows
}

/// Restrict a routing table to the rows whose `src` is `switch_id` (the switch-side view), as
/// `(src, dst, next_hop)` triples without the cost column.
pub fn project_for_switch(
    rows: &[RoutingRow],
    switch_id: SwitchId,
) -> Vec<(SwitchId, SwitchId, i32)> {
    rows.iter()
        .filter(|r| r.src == switch_id)
        .map(|r| (r.src, r.dst, r.next_hop))
        .collect()
}

fn link_failed(failed_links: &BTreeSet<(SwitchId, SwitchId)>, a: SwitchId, b: SwitchId) -> bool {
    failed_links.contains(&(a, b)) || failed_links.contains(&(b, a))
}

/// Run Dijkstra from `src`, treating any switch not in `live` as absent (its edges are ignored in
/// both directions) and any declared failed link as `INF`-weight. Ties are broken by the order
/// vertices were pushed onto the priority queue, making the result deterministic for a fixed
/// input.
fn shortest_paths_from(
    topo: &Topology,
    live: &BTreeSet<SwitchId>,
    failed_links: &BTreeSet<(SwitchId, SwitchId)>,
    src: SwitchId,
) -> Vec<RoutingRow> {
    let n = topo.num_switches();
    let mut dist = vec![INF; n as usize];
    let mut pred: Vec<Option<SwitchId>> = vec![None; n as usize];
    let mut visited = vec![false; n as usize];

    dist[src.index()] = 0;

    // Break ties deterministically on insertion order, as the spec requires: seed the queue with
    // (0, src) and order subsequent pushes by when they were discovered.
    let mut seq: u64 = 0;
    let mut heap = BinaryHeap::new();
    heap.push(Reverse((0u32, seq, src)));

    while let Some(Reverse((d, _, u))) = heap.pop() {
        if !live.contains(&u) || visited[u.index()] {
            continue;
        }
        visited[u.index()] = true;

        for v in topo.neighbors(u) {
            if visited[v.index()] || !live.contains(&v) {
                continue;
            }
            let weight = if link_failed(failed_links, u, v) {
                INF
            } else {
                topo.cost(u, v)
            };
            if weight == INF {
                continue;
            }
            let new_dist = d + weight;
            if new_dist < dist[v.index()] {
                dist[v.index()] = new_dist;
                pred[v.index()] = Some(u);
                seq += 1;
                heap.push(Reverse((new_dist, seq, v)));
            }
        }
    }

    SwitchId::range(n)
        .map(|dst| {
            if dst == src {
                RoutingRow {
                    src,
                    dst,
                    next_hop: src.0 as i32,
                    cost: 0,
                }
            } else if dist[dst.index()] == INF {
                RoutingRow {
                    src,
                    dst,
                    next_hop: -1,
                    cost: INF,
                }
            } else {
                RoutingRow {
                    src,
                    dst,
                    next_hop: first_hop(&pred, src, dst).0 as i32,
                    cost: dist[dst.index()],
                }
            }
        })
        .collect()
}

/// Walk the predecessor chain backward from `dst` until the vertex whose predecessor is `src`;
/// that vertex is the first hop after `src` on the shortest path.
fn first_hop(pred: &[Option<SwitchId>], src: SwitchId, dst: SwitchId) -> SwitchId {
    let mut cur = dst;
    loop {
        match pred[cur.index()] {
            Some(p) if p == src => return cur,
            Some(p) => cur = p,
            None => return dst,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::Topology;

    fn live(ids: impl IntoIterator<Item = u32>) -> BTreeSet<SwitchId> {
        ids.into_iter().map(SwitchId).collect()
    }

    #[test]
    fn linear_chain_routes_through_middle_node() {
        let topo = Topology::parse("3\n0 1 1\n1 2 1\n").unwrap();
        let rows = compute_routing_table(&topo, &live([0, 1, 2]), &BTreeSet::new());

        let s0 = project_for_switch(&rows, SwitchId(0));
        pretty_assertions_sorted::assert_eq!(
            s0,
            vec![
                (SwitchId(0), SwitchId(0), 0),
                (SwitchId(0), SwitchId(1), 1),
                (SwitchId(0), SwitchId(2), 1),
            ]
        );

        let s2 = project_for_switch(&rows, SwitchId(2));
        pretty_assertions_sorted::assert_eq!(
            s2,
            vec![
                (SwitchId(2), SwitchId(0), 1),
                (SwitchId(2), SwitchId(1), 1),
                (SwitchId(2), SwitchId(2), 2),
            ]
        );
    }

    #[test]
    fn killing_middle_node_makes_endpoints_unreachable() {
        let topo = Topology::parse("3\n0 1 1\n1 2 1\n").unwrap();
        let rows = compute_routing_table(&topo, &live([0, 2]), &BTreeSet::new());

        let s0 = project_for_switch(&rows, SwitchId(0));
        assert_eq!(
            s0,
            vec![
                (SwitchId(0), SwitchId(0), 0),
                (SwitchId(0), SwitchId(1), -1),
                (SwitchId(0), SwitchId(2), -1),
            ]
        );
        let row_0_1 = rows
            .iter()
            .find(|r| r.src == SwitchId(0) && r.dst == SwitchId(1))
            .unwrap();
        assert_eq!(row_0_1.cost, INF);
    }

    #[test]
    fn declared_failed_link_is_never_used() {
        let topo = Topology::parse("3\n0 1 1\n1 2 1\n0 2 1\n").unwrap();
        let mut failed = BTreeSet::new();
        failed.insert((SwitchId(0), SwitchId(1)));

        let rows = compute_routing_table(&topo, &live([0, 1, 2]), &failed);
        let row = rows
            .iter()
            .find(|r| r.src == SwitchId(0) && r.dst == SwitchId(1))
            .unwrap();
        assert_eq!(row.next_hop, 2);
        assert_eq!(row.cost, 2);
    }

    #[test]
    fn single_switch_self_route_only() {
        let topo = Topology::parse("1\n").unwrap();
        let rows = compute_routing_table(&topo, &live([0]), &BTreeSet::new());
        assert_eq!(
            rows,
            vec![RoutingRow {
                src: SwitchId(0),
                dst: SwitchId(0),
                next_hop: 0,
                cost: 0,
            }]
        );
    }

    #[test]
    fn disconnected_graph_reports_inf() {
        let topo = Topology::parse("2\n").unwrap();
        let rows = compute_routing_table(&topo, &live([0, 1]), &BTreeSet::new());
        let row = rows
            .iter()
            .find(|r| r.src == SwitchId(0) && r.dst == SwitchId(1))
            .unwrap();
        assert_eq!((row.next_hop, row.cost), (-1, INF));
    }

    #[test]
    fn every_live_switch_has_exactly_one_self_route() {
        let topo = Topology::parse("4\n0 1 1\n1 2 1\n2 3 1\n").unwrap();
        let rows = compute_routing_table(&topo, &live([0, 1, 2, 3]), &BTreeSet::new());
        for s in [0u32, 1, 2, 3] {
            let self_rows: Vec<_> = rows
                .iter()
                .filter(|r| r.src == SwitchId(s) && r.dst == SwitchId(s))
                .collect();
            assert_eq!(self_rows.len(), 1);
            assert_eq!(self_rows[0].next_hop, s as i32);
            assert_eq!(self_rows[0].cost, 0);
        }
    }

    #[test]
    fn dead_switch_contributes_no_rows_as_src() {
        let topo = Topology::parse("3\n0 1 1\n1 2 1\n").unwrap();
        let rows = compute_routing_table(&topo, &live([0, 2]), &BTreeSet::new());
        assert!(!rows.iter().any(|r| r.src == SwitchId(1)));
    }
}
