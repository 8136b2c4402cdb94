// ABOUTME: The read-only handle the gateway holds on the switch engine.
// ABOUTME: Exposes a worker summary, build version, and one streaming accessor per live collection.

use async_trait::async_trait;

use crate::live::{EspState, Link, Neighbor, Network, OnlineFlow, Point, VpnClient};
use crate::schema::{Version, Worker};
use crate::stream::EntryStream;

/// Snapshot accessors of a running switch engine.
///
/// Every accessor returns a fresh [`EntryStream`] of live references. The engine
/// owns and locks its collections internally; callers must copy what they need
/// before the request ends and must not hold the references any longer.
#[async_trait]
pub trait Switcher: Send + Sync {
    /// Worker summary (identity, listen address, uptime).
    async fn worker(&self) -> Worker;

    /// Build metadata. Engines rarely need to override this.
    fn version(&self) -> Version {
        Version::current()
    }

    async fn points(&self) -> EntryStream<Point>;

    async fn neighbors(&self) -> EntryStream<Neighbor>;

    async fn links(&self) -> EntryStream<Link>;

    async fn online(&self) -> EntryStream<OnlineFlow>;

    async fn networks(&self) -> EntryStream<Network>;

    /// VPN clients of a single network.
    async fn vpn_clients(&self, network: &str) -> EntryStream<VpnClient>;

    /// Security-association states whose name matches `name`; an empty name selects all.
    async fn esp_states(&self, name: &str) -> EntryStream<EspState>;
}
