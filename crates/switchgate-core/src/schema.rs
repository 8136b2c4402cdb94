// ABOUTME: Snapshot projections of live switch records, serialized by the JSON API and the dashboard.
// ABOUTME: Each projection is copied out of a live record at a given instant and never written back.

use serde::{Deserialize, Serialize};

use crate::live;

/// Seconds elapsed between `since` and `now`, clamped at zero for clocks that step backwards.
fn elapsed(now: i64, since: i64) -> i64 {
    if since <= 0 {
        return 0;
    }
    now.saturating_sub(since).max(0)
}

/// Build metadata of the running gateway.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    pub version: String,
    pub date: String,
    pub commit: String,
}

impl Version {
    /// Version of this build. Date and commit come from `SWITCHGATE_BUILD_DATE` and
    /// `SWITCHGATE_COMMIT` at compile time when set.
    pub fn current() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            date: option_env!("SWITCHGATE_BUILD_DATE").unwrap_or_default().to_string(),
            commit: option_env!("SWITCHGATE_COMMIT").unwrap_or_default().to_string(),
        }
    }
}

/// Summary of the switch worker as reported by the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worker {
    pub uuid: String,
    pub alias: String,
    pub protocol: String,
    pub listen: String,
    /// Seconds since the worker started.
    pub up_time: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub uuid: String,
    pub alias: String,
    pub network: String,
    pub user: String,
    pub protocol: String,
    pub server: String,
    pub device: String,
    pub remote: String,
    pub state: String,
    pub system: String,
    pub rx_bytes: u64,
    pub tx_bytes: u64,
    pub err_packets: u64,
    pub alive_time: i64,
}

impl Point {
    pub fn project(p: &live::Point, now: i64) -> Self {
        Self {
            uuid: p.uuid.clone(),
            alias: p.alias.clone(),
            network: p.network.clone(),
            user: p.user.clone(),
            protocol: p.protocol.clone(),
            server: p.server.clone(),
            device: p.device.clone(),
            remote: p.remote.clone(),
            state: p.status.clone(),
            system: p.system.clone(),
            rx_bytes: p.rx_bytes,
            tx_bytes: p.tx_bytes,
            err_packets: p.err_packets,
            alive_time: elapsed(now, p.connected_at),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Neighbor {
    pub network: String,
    pub device: String,
    pub point: String,
    pub hw_addr: String,
    pub ip_addr: String,
    pub client: String,
    pub alive_time: i64,
}

impl Neighbor {
    pub fn project(n: &live::Neighbor, now: i64) -> Self {
        Self {
            network: n.network.clone(),
            device: n.device.clone(),
            point: n.point.clone(),
            hw_addr: n.hw_addr.clone(),
            ip_addr: n.ip_addr.clone(),
            client: n.client.clone(),
            alive_time: elapsed(now, n.learned_at),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub uuid: String,
    pub alias: String,
    pub network: String,
    pub user: String,
    pub protocol: String,
    pub server: String,
    pub device: String,
    pub state: String,
    pub rx_bytes: u64,
    pub tx_bytes: u64,
    pub err_packets: u64,
    pub alive_time: i64,
}

impl Link {
    pub fn project(l: &live::Link, now: i64) -> Self {
        Self {
            uuid: l.uuid.clone(),
            alias: l.alias.clone(),
            network: l.network.clone(),
            user: l.user.clone(),
            protocol: l.protocol.clone(),
            server: l.server.clone(),
            device: l.device.clone(),
            state: l.status.clone(),
            rx_bytes: l.rx_bytes,
            tx_bytes: l.tx_bytes,
            err_packets: l.err_packets,
            alive_time: elapsed(now, l.connected_at),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnLine {
    pub eth_type: u16,
    pub ip_source: String,
    pub ip_dest: String,
    pub ip_proto: String,
    pub port_source: u16,
    pub port_dest: u16,
    pub hit_time: i64,
    pub up_time: i64,
}

impl OnLine {
    pub fn project(f: &live::OnlineFlow, now: i64) -> Self {
        Self {
            eth_type: f.eth_type,
            ip_source: f.ip_source.clone(),
            ip_dest: f.ip_dest.clone(),
            ip_proto: f.ip_proto.clone(),
            port_source: f.port_source,
            port_dest: f.port_dest,
            hit_time: f.hit_time,
            up_time: elapsed(now, f.created_at),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Network {
    pub name: String,
    pub address: String,
    pub provider: String,
}

impl Network {
    pub fn project(n: &live::Network) -> Self {
        Self {
            name: n.name.clone(),
            address: n.address.clone(),
            provider: n.provider.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VpnClient {
    pub uuid: String,
    pub name: String,
    pub network: String,
    pub remote: String,
    pub device: String,
    pub address: String,
    pub state: String,
    pub rx_bytes: u64,
    pub tx_bytes: u64,
    pub alive_time: i64,
}

impl VpnClient {
    /// Project a client of `network`. The live record does not know which network it
    /// belongs to, so the aggregator passes it in.
    pub fn project(c: &live::VpnClient, network: &str, now: i64) -> Self {
        Self {
            uuid: c.uuid.clone(),
            name: c.name.clone(),
            network: network.to_string(),
            remote: c.remote.clone(),
            device: c.device.clone(),
            address: c.address.clone(),
            state: c.status.clone(),
            rx_bytes: c.rx_bytes,
            tx_bytes: c.tx_bytes,
            alive_time: elapsed(now, c.connected_at),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EspState {
    pub name: String,
    pub spi: u32,
    pub source: String,
    pub dest: String,
    pub proto: String,
    pub mode: String,
    pub rx_bytes: u64,
    pub tx_bytes: u64,
    pub rx_packets: u64,
    pub tx_packets: u64,
    pub alive_time: i64,
}

impl EspState {
    pub fn project(s: &live::EspState, now: i64) -> Self {
        Self {
            name: s.name.clone(),
            spi: s.spi,
            source: s.source.clone(),
            dest: s.dest.clone(),
            proto: s.proto.clone(),
            mode: s.mode.clone(),
            rx_bytes: s.rx_bytes,
            tx_bytes: s.tx_bytes,
            rx_packets: s.rx_packets,
            tx_packets: s.tx_packets,
            alive_time: elapsed(now, s.created_at),
        }
    }
}

/// One consistent, ordered view of the switch assembled for a single request.
///
/// Built by [`crate::aggregate`], then only read by the renderer or the JSON
/// serializer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    pub version: Version,
    pub worker: Worker,
    pub points: Vec<Point>,
    pub links: Vec<Link>,
    pub neighbors: Vec<Neighbor>,
    pub online: Vec<OnLine>,
    pub networks: Vec<Network>,
    pub clients: Vec<VpnClient>,
    pub states: Vec<EspState>,
}
