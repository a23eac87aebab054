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

//! The fixed-format, append-only event log shared by the controller and switch binaries.
//!
//! File names (`Controller.log`, `switch<i>.log`) and the record grammar below are a
//! compatibility surface and must never change shape: each record is a blank-line-separated
//! block whose first line is a `HH:MM:SS.micro` local timestamp, followed by one of the fixed
//! phrasings this module emits.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use time::{format_description, OffsetDateTime};

use crate::routing::RoutingRow;
use crate::switch_id::SwitchId;

/// An append-only event log at a fixed path, safe to share across tasks.
pub struct EventLog {
    path: PathBuf,
    file: Mutex<std::fs::File>,
}

impl EventLog {
    /// Open (creating if necessary) the log file at `path` for appending.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// The path this log writes to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn timestamp() -> String {
        let fmt = format_description::parse("[hour]:[minute]:[second].[subsecond digits:6]")
            .expect("static format description is valid");
        OffsetDateTime::now_local()
            .unwrap_or_else(|_| OffsetDateTime::now_utc())
            .format(&fmt)
            .expect("formatting a valid OffsetDateTime never fails")
    }

    /// Append one record: a blank line, the timestamp, then each of `body` on its own line.
    fn record(&self, body: &[String]) -> io::Result<()> {
        let mut out = String::from("\n\n");
        out.push_str(&Self::timestamp());
        out.push('\n');
        for line in body {
            out.push_str(line);
            out.push('\n');
        }
        self.file
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .write_all(out.as_bytes())
    }

    // --- Controller-side records ---

    /// `Register Request <id>`
    pub fn register_request_received(&self, id: SwitchId) -> io::Result<()> {
        self.record(&[format!("Register Request {id}")])
    }

    /// `Register Response <id>`
    pub fn register_response_sent(&self, id: SwitchId) -> io::Result<()> {
        self.record(&[format!("Register Response {id}")])
    }

    /// `Routing Update` / `<src>,<dst>:<nextHop>,<cost>` rows / `Routing Complete`
    pub fn routing_update_with_cost(&self, rows: &[RoutingRow]) -> io::Result<()> {
        let mut body = vec!["Routing Update".to_string()];
        for r in rows {
            body.push(format!("{},{}:{},{}", r.src, r.dst, r.next_hop, r.cost));
        }
        body.push("Routing Complete".to_string());
        self.record(&body)
    }

    /// `Link Dead <a>,<b>`
    pub fn link_dead(&self, a: SwitchId, b: SwitchId) -> io::Result<()> {
        self.record(&[format!("Link Dead {a},{b}")])
    }

    /// `Switch Dead <id>`
    pub fn switch_dead(&self, id: SwitchId) -> io::Result<()> {
        self.record(&[format!("Switch Dead {id}")])
    }

    /// `Switch Alive <id>`
    pub fn switch_alive(&self, id: SwitchId) -> io::Result<()> {
        self.record(&[format!("Switch Alive {id}")])
    }

    // --- Switch-side records ---

    /// `Register Request Sent`
    pub fn register_request_sent(&self) -> io::Result<()> {
        self.record(&[String::from("Register Request Sent")])
    }

    /// `Register Response received`
    pub fn register_response_received(&self) -> io::Result<()> {
        self.record(&[String::from("Register Response received")])
    }

    /// `Routing Update` / `<src>,<dst>:<nextHop>` rows (no cost) / `Routing Complete`
    pub fn routing_update_no_cost(&self, rows: &[(SwitchId, SwitchId, i32)]) -> io::Result<()> {
        let mut body = vec!["Routing Update".to_string()];
        for (src, dst, next_hop) in rows {
            body.push(format!("{src},{dst}:{next_hop}"));
        }
        body.push("Routing Complete".to_string());
        self.record(&body)
    }

    /// `Neighbor Dead <id>`
    pub fn neighbor_dead(&self, id: SwitchId) -> io::Result<()> {
        self.record(&[format!("Neighbor Dead {id}")])
    }

    /// `Neighbor Alive <id>`
    pub fn neighbor_alive(&self, id: SwitchId) -> io::Result<()> {
        self.record(&[format!("Neighbor Alive {id}")])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn tmp_path(name: &str) -> PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!(
            "netlab-event-log-test-{name}-{:?}",
            std::thread::current().id()
        ));
        p
    }

    #[test]
    fn register_request_record_matches_grammar() {
        let path = tmp_path("register-request");
        let _ = fs::remove_file(&path);
        let log = EventLog::open(&path).unwrap();
        log.register_request_received(SwitchId(4)).unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("Register Request 4\n"));
        fs::remove_file(&path).ok();
    }

    #[test]
    fn routing_update_includes_cost_for_controller_view() {
        let path = tmp_path("routing-update-controller");
        let _ = fs::remove_file(&path);
        let log = EventLog::open(&path).unwrap();
        let rows = vec![RoutingRow {
            src: SwitchId(4),
            dst: SwitchId(4),
            next_hop: 4,
            cost: 0,
        }];
        log.routing_update_with_cost(&rows).unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("Routing Update\n"));
        assert!(contents.contains("4,4:4,0\n"));
        assert!(contents.contains("Routing Complete\n"));
        fs::remove_file(&path).ok();
    }

    #[test]
    fn routing_update_omits_cost_for_switch_view() {
        let path = tmp_path("routing-update-switch");
        let _ = fs::remove_file(&path);
        let log = EventLog::open(&path).unwrap();
        log.routing_update_no_cost(&[(SwitchId(4), SwitchId(4), 4)])
            .unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("4,4:4\n"));
        assert!(!contents.contains("4,4:4,0\n"));
        fs::remove_file(&path).ok();
    }

    #[test]
    fn records_are_separated_by_blank_lines() {
        let path = tmp_path("blank-lines");
        let _ = fs::remove_file(&path);
        let log = EventLog::open(&path).unwrap();
        log.switch_dead(SwitchId(1)).unwrap();
        log.switch_alive(SwitchId(1)).unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("\n\n"));
        fs::remove_file(&path).ok();
    }
}
