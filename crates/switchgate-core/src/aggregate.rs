// ABOUTME: Snapshot aggregation: drains every live collection and assembles one ordered Index.
// ABOUTME: Each collection has a fixed, stable sort order so the dashboard and JSON API are deterministic.

use std::cmp::Ordering;

use chrono::Utc;

use crate::schema::{EspState, Index, Link, Neighbor, Network, OnLine, Point, VpnClient};
use crate::stream::EntryStream;
use crate::switcher::Switcher;

/// Drain `stream` up to its sentinel, projecting each live entry.
async fn drain<T, S>(mut stream: EntryStream<T>, mut project: impl FnMut(&T) -> S) -> Vec<S> {
    let mut out = Vec::new();
    while let Some(entry) = stream.next().await {
        out.push(project(&*entry));
    }
    out
}

/// Compare two key pairs as if each pair were concatenated into one string.
fn cmp_joined(a: (&str, &str), b: (&str, &str)) -> Ordering {
    a.0.bytes().chain(a.1.bytes()).cmp(b.0.bytes().chain(b.1.bytes()))
}

/// Points, descending on network followed by remote endpoint.
pub async fn collect_points(switcher: &dyn Switcher, now: i64) -> Vec<Point> {
    let mut points = drain(switcher.points().await, |p| Point::project(p, now)).await;
    points.sort_by(|a, b| {
        cmp_joined(
            (b.network.as_str(), b.remote.as_str()),
            (a.network.as_str(), a.remote.as_str()),
        )
    });
    points
}

/// Neighbors, descending on IP address.
pub async fn collect_neighbors(switcher: &dyn Switcher, now: i64) -> Vec<Neighbor> {
    let mut neighbors = drain(switcher.neighbors().await, |n| Neighbor::project(n, now)).await;
    neighbors.sort_by(|a, b| b.ip_addr.cmp(&a.ip_addr));
    neighbors
}

/// Links, descending on network followed by server endpoint.
pub async fn collect_links(switcher: &dyn Switcher, now: i64) -> Vec<Link> {
    let mut links = drain(switcher.links().await, |l| Link::project(l, now)).await;
    links.sort_by(|a, b| {
        cmp_joined(
            (b.network.as_str(), b.server.as_str()),
            (a.network.as_str(), a.server.as_str()),
        )
    });
    links
}

/// Online flows, ascending on last-hit time.
pub async fn collect_online(switcher: &dyn Switcher, now: i64) -> Vec<OnLine> {
    let mut flows = drain(switcher.online().await, |f| OnLine::project(f, now)).await;
    flows.sort_by_key(|f| f.hit_time);
    flows
}

/// Networks in the engine's own order.
pub async fn collect_networks(switcher: &dyn Switcher) -> Vec<Network> {
    drain(switcher.networks().await, Network::project).await
}

/// VPN clients of one network, ascending on client name.
pub async fn collect_network_clients(
    switcher: &dyn Switcher,
    network: &str,
    now: i64,
) -> Vec<VpnClient> {
    let mut clients = drain(switcher.vpn_clients(network).await, |c| {
        VpnClient::project(c, network, now)
    })
    .await;
    clients.sort_by(|a, b| a.name.cmp(&b.name));
    clients
}

/// VPN clients of every network: each network's group is sorted by name and the groups
/// are concatenated in network order. There is no sort across networks.
pub async fn collect_clients(
    switcher: &dyn Switcher,
    networks: &[Network],
    now: i64,
) -> Vec<VpnClient> {
    let mut clients = Vec::new();
    for network in networks {
        clients.extend(collect_network_clients(switcher, &network.name, now).await);
    }
    clients
}

/// Security-association states, descending on SPI.
pub async fn collect_states(switcher: &dyn Switcher, now: i64) -> Vec<EspState> {
    let mut states = drain(switcher.esp_states("").await, |s| EspState::project(s, now)).await;
    states.sort_by(|a, b| b.spi.cmp(&a.spi));
    states
}

/// Current wall-clock time in unix seconds, the `now` used for derived ages.
pub fn unix_now() -> i64 {
    Utc::now().timestamp()
}

/// Assemble a snapshot using the current wall clock for derived ages.
pub async fn aggregate(switcher: &dyn Switcher) -> Index {
    aggregate_at(switcher, unix_now()).await
}

/// Assemble a snapshot as of `now` (unix seconds).
///
/// Each sequence is a complete drain of its collection at the moment it is
/// read. Collections are read one after another, so two sequences may reflect
/// slightly different instants.
pub async fn aggregate_at(switcher: &dyn Switcher, now: i64) -> Index {
    let points = collect_points(switcher, now).await;
    let neighbors = collect_neighbors(switcher, now).await;
    let links = collect_links(switcher, now).await;
    let online = collect_online(switcher, now).await;
    let networks = collect_networks(switcher).await;
    let clients = collect_clients(switcher, &networks, now).await;
    let states = collect_states(switcher, now).await;

    tracing::debug!(
        points = points.len(),
        neighbors = neighbors.len(),
        links = links.len(),
        online = online.len(),
        clients = clients.len(),
        states = states.len(),
        "assembled index snapshot"
    );

    Index {
        version: switcher.version(),
        worker: switcher.worker().await,
        points,
        links,
        neighbors,
        online,
        networks,
        clients,
        states,
    }
}
