// ABOUTME: Live records owned and mutated by the switch engine.
// ABOUTME: The gateway only ever sees them through Arc references handed out by streaming accessors.

use serde::{Deserialize, Serialize};

/// An accessed point: a remote peer attached to one of the switch's networks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Point {
    pub uuid: String,
    pub alias: String,
    pub network: String,
    pub user: String,
    pub protocol: String,
    pub server: String,
    pub device: String,
    pub remote: String,
    pub status: String,
    pub system: String,
    pub rx_bytes: u64,
    pub tx_bytes: u64,
    pub err_packets: u64,
    /// Unix seconds when the point connected.
    pub connected_at: i64,
}

/// A neighbor learned on a network, keyed by its IP address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Neighbor {
    pub network: String,
    pub device: String,
    pub point: String,
    pub hw_addr: String,
    pub ip_addr: String,
    pub client: String,
    /// Unix seconds when the neighbor was first learned.
    pub learned_at: i64,
}

/// An outbound link from this switch to another switch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Link {
    pub uuid: String,
    pub alias: String,
    pub network: String,
    pub user: String,
    pub protocol: String,
    pub server: String,
    pub device: String,
    pub status: String,
    pub rx_bytes: u64,
    pub tx_bytes: u64,
    pub err_packets: u64,
    /// Unix seconds when the link came up.
    pub connected_at: i64,
}

/// A flow currently seen crossing the switch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OnlineFlow {
    pub eth_type: u16,
    pub ip_source: String,
    pub ip_dest: String,
    pub ip_proto: String,
    pub port_source: u16,
    pub port_dest: u16,
    /// Unix seconds of the most recent packet on this flow.
    pub hit_time: i64,
    /// Unix seconds when the flow was first seen.
    pub created_at: i64,
}

/// A virtual network served by the switch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Network {
    pub name: String,
    pub address: String,
    pub provider: String,
}

/// A VPN client connected to one network's VPN endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VpnClient {
    pub uuid: String,
    pub name: String,
    pub remote: String,
    pub device: String,
    pub address: String,
    pub status: String,
    pub rx_bytes: u64,
    pub tx_bytes: u64,
    /// Unix seconds when the client connected.
    pub connected_at: i64,
}

/// Keyed security-association state, identified by its SPI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
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
    /// Unix seconds when the state was installed.
    pub created_at: i64,
}
