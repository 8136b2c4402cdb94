// ABOUTME: In-process Switcher backed by locked collections, used by the standalone gateway and tests.
// ABOUTME: Entries are replaced wholesale on update, so streamed Arc references stay valid snapshots.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::live::{EspState, Link, Neighbor, Network, OnlineFlow, Point, VpnClient};
use crate::schema::Worker;
use crate::stream::EntryStream;
use crate::switcher::Switcher;

/// Errors that can occur when seeding the in-memory switch from disk.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("io error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("json error in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Initial contents for an [`InMemorySwitch`], usually read from a JSON file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SwitchSeed {
    pub worker: Worker,
    pub points: Vec<Point>,
    pub neighbors: Vec<Neighbor>,
    pub links: Vec<Link>,
    pub online: Vec<OnlineFlow>,
    pub networks: Vec<Network>,
    /// VPN clients keyed by network name.
    pub clients: HashMap<String, Vec<VpnClient>>,
    pub states: Vec<EspState>,
}

impl SwitchSeed {
    /// Read a seed from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, SeedError> {
        let contents = std::fs::read_to_string(path).map_err(|source| SeedError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| SeedError::Json {
            path: path.display().to_string(),
            source,
        })
    }
}

/// Replace the entry whose key matches, or append a new one. Appending keeps the
/// collection in insertion order, which is the order streams emit.
fn upsert<T, K: PartialEq>(entries: &mut Vec<Arc<T>>, entry: T, key: impl Fn(&T) -> K) {
    let wanted = key(&entry);
    match entries.iter().position(|e| key(e.as_ref()) == wanted) {
        Some(i) => entries[i] = Arc::new(entry),
        None => entries.push(Arc::new(entry)),
    }
}

fn flow_key(f: &OnlineFlow) -> (String, String, String, u16, u16) {
    (
        f.ip_source.clone(),
        f.ip_dest.clone(),
        f.ip_proto.clone(),
        f.port_source,
        f.port_dest,
    )
}

/// A switch whose live state lives entirely in this process.
pub struct InMemorySwitch {
    worker: Worker,
    started: Instant,
    points: RwLock<Vec<Arc<Point>>>,
    neighbors: RwLock<Vec<Arc<Neighbor>>>,
    links: RwLock<Vec<Arc<Link>>>,
    online: RwLock<Vec<Arc<OnlineFlow>>>,
    networks: RwLock<Vec<Arc<Network>>>,
    clients: RwLock<HashMap<String, Vec<Arc<VpnClient>>>>,
    states: RwLock<Vec<Arc<EspState>>>,
}

impl InMemorySwitch {
    /// Create an empty switch reporting the given worker summary. Uptime is counted
    /// from construction.
    pub fn new(worker: Worker) -> Self {
        Self {
            worker,
            started: Instant::now(),
            points: RwLock::new(Vec::new()),
            neighbors: RwLock::new(Vec::new()),
            links: RwLock::new(Vec::new()),
            online: RwLock::new(Vec::new()),
            networks: RwLock::new(Vec::new()),
            clients: RwLock::new(HashMap::new()),
            states: RwLock::new(Vec::new()),
        }
    }

    /// Create a switch pre-populated from a seed.
    pub fn from_seed(seed: SwitchSeed) -> Self {
        let clients = seed
            .clients
            .into_iter()
            .map(|(network, list)| (network, list.into_iter().map(Arc::new).collect()))
            .collect();

        Self {
            worker: seed.worker,
            started: Instant::now(),
            points: RwLock::new(seed.points.into_iter().map(Arc::new).collect()),
            neighbors: RwLock::new(seed.neighbors.into_iter().map(Arc::new).collect()),
            links: RwLock::new(seed.links.into_iter().map(Arc::new).collect()),
            online: RwLock::new(seed.online.into_iter().map(Arc::new).collect()),
            networks: RwLock::new(seed.networks.into_iter().map(Arc::new).collect()),
            clients: RwLock::new(clients),
            states: RwLock::new(seed.states.into_iter().map(Arc::new).collect()),
        }
    }

    pub async fn upsert_point(&self, point: Point) {
        upsert(&mut *self.points.write().await, point, |p| p.uuid.clone());
    }

    pub async fn upsert_neighbor(&self, neighbor: Neighbor) {
        upsert(&mut *self.neighbors.write().await, neighbor, |n| {
            n.ip_addr.clone()
        });
    }

    pub async fn upsert_link(&self, link: Link) {
        upsert(&mut *self.links.write().await, link, |l| l.uuid.clone());
    }

    pub async fn upsert_online(&self, flow: OnlineFlow) {
        upsert(&mut *self.online.write().await, flow, flow_key);
    }

    pub async fn upsert_network(&self, network: Network) {
        upsert(&mut *self.networks.write().await, network, |n| {
            n.name.clone()
        });
    }

    /// Add or replace a VPN client of `network`. The network does not need to be
    /// registered, but only registered networks are walked during aggregation.
    pub async fn upsert_vpn_client(&self, network: &str, client: VpnClient) {
        let mut clients = self.clients.write().await;
        let list = clients.entry(network.to_string()).or_default();
        upsert(list, client, |c| c.name.clone());
    }

    pub async fn upsert_esp_state(&self, state: EspState) {
        upsert(&mut *self.states.write().await, state, |s| s.spi);
    }
}

#[async_trait]
impl Switcher for InMemorySwitch {
    async fn worker(&self) -> Worker {
        Worker {
            up_time: self.started.elapsed().as_secs() as i64,
            ..self.worker.clone()
        }
    }

    async fn points(&self) -> EntryStream<Point> {
        EntryStream::from_entries(self.points.read().await.clone())
    }

    async fn neighbors(&self) -> EntryStream<Neighbor> {
        EntryStream::from_entries(self.neighbors.read().await.clone())
    }

    async fn links(&self) -> EntryStream<Link> {
        EntryStream::from_entries(self.links.read().await.clone())
    }

    async fn online(&self) -> EntryStream<OnlineFlow> {
        EntryStream::from_entries(self.online.read().await.clone())
    }

    async fn networks(&self) -> EntryStream<Network> {
        EntryStream::from_entries(self.networks.read().await.clone())
    }

    async fn vpn_clients(&self, network: &str) -> EntryStream<VpnClient> {
        let clients = self.clients.read().await;
        match clients.get(network) {
            Some(list) => EntryStream::from_entries(list.clone()),
            None => EntryStream::empty(),
        }
    }

    async fn esp_states(&self, name: &str) -> EntryStream<EspState> {
        let states = self.states.read().await;
        let selected = states
            .iter()
            .filter(|s| name.is_empty() || s.name == name)
            .cloned()
            .collect();
        EntryStream::from_entries(selected)
    }
}
