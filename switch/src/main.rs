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

//! The switch binary: registers with the controller, then runs four concurrent tasks (receive,
//! keep-alive, topology-report, timeout) until interrupted.

mod state;

use std::net::SocketAddr;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use clap::Parser;
use tokio::net::UdpSocket;
use tokio::sync::Notify;
use tokio::time::sleep;

use sdnp::{decode, encode, EventLog, Message, SdnError, SwitchId, K_SECONDS, TIMEOUT_SECONDS};

use state::{KeepAliveOutcome, SwitchState};

/// `switch <id> <controller-host> <controller-port> [-f <neighbor-id>]`.
#[derive(Debug, Parser)]
#[clap(name = "switch", about = "SDN switch")]
struct Cli {
    /// This switch's own id.
    id: u32,
    /// The controller's hostname or address.
    controller_host: String,
    /// The controller's UDP port.
    controller_port: u16,
    /// Declare the link to this neighbor as failed, one-directionally from this switch.
    #[clap(short = 'f', long = "failed-neighbor")]
    failed_neighbor: Option<u32>,
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<(), SdnError> {
    pretty_env_logger::init_timed();
    let cli = Cli::parse();

    let self_id = SwitchId(cli.id);
    let failed_neighbor = cli.failed_neighbor.map(SwitchId);
    let log = EventLog::open(format!("switch{}.log", cli.id))?;

    let socket = UdpSocket::bind(("0.0.0.0", 0)).await?;
    let controller_addr = resolve(&cli.controller_host, cli.controller_port).await?;
    log::info!("switch {self_id} starting, controller at {controller_addr}");

    let (switches, failed_links, neighbors) =
        register(&socket, controller_addr, self_id, failed_neighbor, &log).await?;
    log.register_response_received()?;

    let start = Instant::now();
    let mut switch_state = SwitchState::new(self_id);
    switch_state.apply_register_response(&switches, &failed_links, &neighbors, start)?;
    let state = Mutex::new(switch_state);
    let notify = Notify::new();

    tokio::select! {
        biased;
        _ = tokio::signal::ctrl_c() => {
            log::info!("received interrupt, exiting");
            Ok(())
        }
        result = run_tasks(&socket, &state, &log, controller_addr, start, &notify) => result,
    }
}

async fn resolve(host: &str, port: u16) -> Result<SocketAddr, SdnError> {
    tokio::net::lookup_host((host, port))
        .await?
        .next()
        .ok_or_else(|| SdnError::InvalidAddress(format!("{host}:{port}")))
}

/// Send `RegisterRequest`, retrying every `K` seconds until a `RegisterResponse` arrives.
async fn register(
    socket: &UdpSocket,
    controller_addr: SocketAddr,
    self_id: SwitchId,
    failed_neighbor: Option<SwitchId>,
    log: &EventLog,
) -> Result<(Vec<(SwitchId, String, u16)>, Vec<(SwitchId, SwitchId)>, Vec<SwitchId>), SdnError> {
    let bytes = encode(&Message::RegisterRequest {
        switch_id: self_id,
        failed_neighbor,
    })?;
    let mut buf = [0u8; sdnp::MAX_DATAGRAM_SIZE];

    loop {
        socket.send_to(&bytes, controller_addr).await?;
        log.register_request_sent()?;

        let received = tokio::time::timeout(
            Duration::from_secs(K_SECONDS),
            socket.recv_from(&mut buf),
        )
        .await;

        match received {
            Ok(Ok((n, _))) => {
                if let Ok(Message::RegisterResponse {
                    switches,
                    failed_links,
                    neighbors,
                }) = decode(&buf[..n])
                {
                    return Ok((switches, failed_links, neighbors));
                }
            }
            Ok(Err(e)) => return Err(e.into()),
            Err(_elapsed) => {
                log::debug!("no register response within {K_SECONDS}s, retrying");
            }
        }
    }
}

async fn run_tasks(
    socket: &UdpSocket,
    state: &Mutex<SwitchState>,
    log: &EventLog,
    controller_addr: SocketAddr,
    start: Instant,
    notify: &Notify,
) -> Result<(), SdnError> {
    tokio::try_join!(
        receive_task(socket, state, log, notify),
        keep_alive_task(socket, state),
        topology_report_task(socket, state, controller_addr, start, notify),
        timeout_task(state, log, notify),
    )?;
    Ok(())
}

async fn receive_task(
    socket: &UdpSocket,
    state: &Mutex<SwitchState>,
    log: &EventLog,
    notify: &Notify,
) -> Result<(), SdnError> {
    let mut buf = [0u8; sdnp::MAX_DATAGRAM_SIZE];
    loop {
        let (n, _from) = socket.recv_from(&mut buf).await?;
        let now = Instant::now();

        match decode(&buf[..n]) {
            Ok(Message::RegisterResponse {
                switches,
                failed_links,
                neighbors,
            }) => {
                let mut guard = state.lock().unwrap_or_else(|e| e.into_inner());
                guard.apply_register_response(&switches, &failed_links, &neighbors, now)?;
                drop(guard);
                log.register_response_received()?;
            }
            Ok(Message::RoutingUpdate { rows }) => {
                {
                    let mut guard = state.lock().unwrap_or_else(|e| e.into_inner());
                    guard.install_routing_table(rows.clone());
                }
                log.routing_update_no_cost(&rows)?;
            }
            Ok(Message::KeepAlive { switch_id }) => {
                let outcome = {
                    let mut guard = state.lock().unwrap_or_else(|e| e.into_inner());
                    guard.handle_keep_alive(switch_id, now)
                };
                if outcome == KeepAliveOutcome::BecameAlive {
                    log.neighbor_alive(switch_id)?;
                    notify.notify_one();
                }
            }
            Ok(_) => {
                // RegisterRequest/TopologyUpdate are not meaningful for a switch to receive.
            }
            Err(e) => {
                log::debug!("dropping undecodable datagram: {e}");
            }
        }
    }
}

async fn keep_alive_task(socket: &UdpSocket, state: &Mutex<SwitchState>) -> Result<(), SdnError> {
    let self_id = state.lock().unwrap_or_else(|e| e.into_inner()).self_id();
    let bytes = encode(&Message::KeepAlive { switch_id: self_id })?;

    loop {
        sleep(Duration::from_secs(K_SECONDS)).await;
        let now = Instant::now();
        let targets = {
            let mut guard = state.lock().unwrap_or_else(|e| e.into_inner());
            guard.refresh_self_last_heard(now);
            guard.keep_alive_targets()
        };
        for (_, addr) in targets {
            socket.send_to(&bytes, addr).await?;
        }
    }
}

async fn topology_report_task(
    socket: &UdpSocket,
    state: &Mutex<SwitchState>,
    controller_addr: SocketAddr,
    start: Instant,
    notify: &Notify,
) -> Result<(), SdnError> {
    loop {
        tokio::select! {
            _ = sleep(Duration::from_secs(K_SECONDS)) => {}
            _ = notify.notified() => {}
        }

        let (self_id, neighbor_state, neighbor_last_heard) = {
            let guard = state.lock().unwrap_or_else(|e| e.into_inner());
            (
                guard.self_id(),
                guard.neighbor_state(),
                guard.neighbor_last_heard_millis(start),
            )
        };
        let msg = Message::TopologyUpdate {
            switch_id: self_id,
            neighbor_state,
            neighbor_last_heard,
        };
        let bytes = encode(&msg)?;
        socket.send_to(&bytes, controller_addr).await?;
    }
}

async fn timeout_task(
    state: &Mutex<SwitchState>,
    log: &EventLog,
    notify: &Notify,
) -> Result<(), SdnError> {
    loop {
        sleep(Duration::from_secs(TIMEOUT_SECONDS)).await;
        let now = Instant::now();
        let dead = {
            let mut guard = state.lock().unwrap_or_else(|e| e.into_inner());
            guard.handle_timeout_tick(now, Duration::from_secs(TIMEOUT_SECONDS))
        };
        for n in &dead {
            log.neighbor_dead(*n)?;
        }
        if !dead.is_empty() {
            notify.notify_one();
        }
    }
}
