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

//! The controller binary: owns the topology, runs the registration phase, then the steady-state
//! receive/dispatch loop that keeps every live switch's routing table current.

mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use clap::Parser;
use tokio::net::UdpSocket;

use sdnp::{decode, encode, EventLog, Message, RoutingRow, SdnError, SwitchId, Topology, TIMEOUT_SECONDS};

use state::{ControllerState, RegisterOutcome};

/// `controller <port> <config-file>`: listens on `port`, loads the topology from `config-file`.
#[derive(Debug, Parser)]
#[clap(name = "controller", about = "SDN controller")]
struct Cli {
    /// UDP port to bind and listen on.
    port: u16,
    /// Path to the topology config file (see the format description in the crate docs).
    config_file: PathBuf,
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<(), SdnError> {
    pretty_env_logger::init_timed();
    let cli = Cli::parse();

    let text = std::fs::read_to_string(&cli.config_file)?;
    let topology = Topology::parse(&text)?;
    log::info!(
        "loaded topology with {} switches from {}",
        topology.num_switches(),
        cli.config_file.display()
    );

    let socket = UdpSocket::bind(("0.0.0.0", cli.port)).await?;
    log::info!("listening on port {}", cli.port);

    let log = EventLog::open("Controller.log")?;
    let state = Mutex::new(ControllerState::new(topology));

    tokio::select! {
        biased;
        _ = tokio::signal::ctrl_c() => {
            log::info!("received interrupt, exiting");
            Ok(())
        }
        result = run(&socket, &state, &log) => result,
    }
}

/// Registration phase followed by the steady-state loop. Never returns on success; the only exit
/// is the Ctrl-C branch in `main`.
async fn run(socket: &UdpSocket, state: &Mutex<ControllerState>, log: &EventLog) -> Result<(), SdnError> {
    let mut buf = [0u8; sdnp::MAX_DATAGRAM_SIZE];

    // Registration phase: block until every switch has been heard from at least once.
    loop {
        let (n, from) = socket.recv_from(&mut buf).await?;
        if let Ok(Message::RegisterRequest {
            switch_id,
            failed_neighbor,
        }) = decode(&buf[..n])
        {
            let mut guard = state.lock().unwrap_or_else(|e| e.into_inner());
            guard.handle_register_request(switch_id, from, failed_neighbor, Instant::now());
            drop(guard);
            log.register_request_received(switch_id)?;
        }

        if state.lock().unwrap_or_else(|e| e.into_inner()).all_registered() {
            break;
        }
    }

    broadcast_register_response(socket, state, log).await?;
    recompute_and_distribute(socket, state, log).await?;

    // Steady state: one dispatch loop, recompute triggered by liveness transitions.
    loop {
        let (n, from) = socket.recv_from(&mut buf).await?;
        let now = Instant::now();
        let mut need_recompute = false;

        match decode(&buf[..n]) {
            Ok(Message::RegisterRequest {
                switch_id,
                failed_neighbor,
            }) => {
                let outcome = {
                    let mut guard = state.lock().unwrap_or_else(|e| e.into_inner());
                    guard.handle_register_request(switch_id, from, failed_neighbor, now)
                };
                log.register_request_received(switch_id)?;
                if outcome == RegisterOutcome::Resurrected {
                    log.switch_alive(switch_id)?;
                    need_recompute = true;
                }
            }
            Ok(Message::TopologyUpdate {
                switch_id,
                neighbor_state,
                ..
            }) => {
                let newly_dead = {
                    let mut guard = state.lock().unwrap_or_else(|e| e.into_inner());
                    guard.handle_topology_update(switch_id, &neighbor_state, now)
                };
                for dead in newly_dead {
                    log.switch_dead(dead)?;
                    need_recompute = true;
                }
            }
            Ok(_) => {
                // Any other tag is not meaningful for the controller to receive; ignore.
            }
            Err(e) => {
                log::debug!("dropping undecodable datagram from {from}: {e}");
            }
        }

        let timed_out = {
            let mut guard = state.lock().unwrap_or_else(|e| e.into_inner());
            guard.scan_timeouts(now, Duration::from_secs(TIMEOUT_SECONDS))
        };
        for dead in timed_out {
            log.switch_dead(dead)?;
            need_recompute = true;
        }

        if need_recompute {
            recompute_and_distribute(socket, state, log).await?;
        }
    }
}

async fn broadcast_register_response(
    socket: &UdpSocket,
    state: &Mutex<ControllerState>,
    log: &EventLog,
) -> Result<(), SdnError> {
    let (switches, failed_links, per_recipient) = {
        let guard = state.lock().unwrap_or_else(|e| e.into_inner());
        let switches = guard.switch_directory();
        let failed_links = guard.failed_links_symmetrized();
        let per_recipient: Vec<(SwitchId, SocketAddr, Vec<SwitchId>)> = switches
            .iter()
            .map(|(id, _, _)| {
                (
                    *id,
                    guard.address_of(*id).expect("just registered"),
                    guard.neighbors_of(*id),
                )
            })
            .collect();
        (switches, failed_links, per_recipient)
    };

    for (id, addr, neighbors) in per_recipient {
        let msg = Message::RegisterResponse {
            switches: switches.clone(),
            failed_links: failed_links.clone(),
            neighbors,
        };
        let bytes = encode(&msg)?;
        socket.send_to(&bytes, addr).await?;
        log.register_response_sent(id)?;
    }
    Ok(())
}

async fn recompute_and_distribute(
    socket: &UdpSocket,
    state: &Mutex<ControllerState>,
    log: &EventLog,
) -> Result<(), SdnError> {
    let (rows, targets): (Vec<RoutingRow>, Vec<(SwitchId, SocketAddr)>) = {
        let guard = state.lock().unwrap_or_else(|e| e.into_inner());
        let rows = guard.recompute();
        let targets = guard
            .live_switches()
            .into_iter()
            .filter_map(|id| guard.address_of(id).map(|addr| (id, addr)))
            .collect();
        (rows, targets)
    };

    log.routing_update_with_cost(&rows)?;

    for (id, addr) in targets {
        let projected = sdnp::project_for_switch(&rows, id);
        let bytes = encode(&Message::RoutingUpdate { rows: projected })?;
        socket.send_to(&bytes, addr).await?;
    }
    Ok(())
}
