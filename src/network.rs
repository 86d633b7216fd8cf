// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::btree_map::{BTreeMap, Entry};
use std::collections::HashMap;

use crate::geo::{self, Projection};
use crate::kd::{EmptyIndexError, KdTree};
use crate::{Link, Node, Way};

/// Error conditions reported by [RoadNetwork] operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NetworkError {
    /// A node id was used which is not part of the network.
    #[error("unknown node: {0}")]
    NodeNotFound(i64),

    /// A query operation was attempted before [RoadNetwork::freeze].
    #[error("network is not frozen yet")]
    NotFrozen,

    /// An ingestion operation (or a second freeze) was attempted after
    /// [RoadNetwork::freeze].
    #[error("network is already frozen")]
    AlreadyFrozen,

    /// A way referenced a node id which is not part of the network.
    #[error("way {way} references unknown node {node}")]
    MalformedWay { way: i64, node: i64 },

    /// Nearest-node lookup on a network without any routable nodes.
    #[error(transparent)]
    EmptyIndex(#[from] EmptyIndexError),
}

/// Read-only companion data built by [RoadNetwork::freeze].
#[derive(Debug, Clone)]
struct Frozen {
    projection: Projection,
    index: KdTree,
}

/// Represents a road network as a set of [Nodes](Node) and undirected,
/// way-labelled adjacencies between them.
///
/// A RoadNetwork goes through two phases. During ingestion, [add_node],
/// [add_edge] and [add_way] build up the graph. A one-time call to [freeze]
/// then drops nodes without any adjacency, projects the survivors onto a
/// plane and indexes them for nearest-node lookup. Once frozen, the network
/// is immutable; geographic queries ([distance], [bearing], [closest]) and
/// route finding are only available in this phase.
///
/// [add_node]: RoadNetwork::add_node
/// [add_edge]: RoadNetwork::add_edge
/// [add_way]: RoadNetwork::add_way
/// [freeze]: RoadNetwork::freeze
/// [distance]: RoadNetwork::distance
/// [bearing]: RoadNetwork::bearing
/// [closest]: RoadNetwork::closest
#[derive(Debug, Default, Clone)]
pub struct RoadNetwork {
    nodes: BTreeMap<i64, (Node, Vec<Link>)>,
    way_names: Vec<String>,
    way_name_ids: HashMap<String, u32>,
    frozen: Option<Frozen>,
}

impl RoadNetwork {
    /// Creates a new, empty road network.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of nodes in the network.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the network has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns true once [RoadNetwork::freeze] has completed.
    pub fn is_frozen(&self) -> bool {
        self.frozen.is_some()
    }

    /// Returns an iterator over all [Nodes](Node) in the network,
    /// in ascending id order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values().map(|(node, _)| node)
    }

    /// Retrieves the [Node] with the provided id.
    pub fn node(&self, id: i64) -> Result<&Node, NetworkError> {
        self.nodes
            .get(&id)
            .map(|(node, _)| node)
            .ok_or(NetworkError::NodeNotFound(id))
    }

    /// Gets all [Links](Link) of the node with the provided id.
    pub fn links(&self, id: i64) -> Result<&[Link], NetworkError> {
        self.nodes
            .get(&id)
            .map(|(_, links)| links.as_slice())
            .ok_or(NetworkError::NodeNotFound(id))
    }

    /// Returns the name of the way directly connecting `u` and `v`.
    ///
    /// `Ok(None)` means there is no adjacency between the two nodes, or that
    /// the connecting way is unnamed.
    pub fn way_name_between(&self, u: i64, v: i64) -> Result<Option<&str>, NetworkError> {
        let links = self.links(u)?;
        self.node(v)?;
        Ok(links
            .iter()
            .find(|link| link.to == v)
            .and_then(|link| link.way)
            .map(|label| self.way_names[label as usize].as_str()))
    }

    /// Registers or overwrites the [Node] with `node.id`.
    ///
    /// Overwriting preserves all adjacencies of the node.
    pub fn add_node(&mut self, node: Node) -> Result<(), NetworkError> {
        self.ensure_not_frozen()?;

        match self.nodes.entry(node.id) {
            Entry::Vacant(e) => {
                e.insert((node, Vec::default()));
            }
            Entry::Occupied(mut e) => {
                debug_assert_eq!(e.get().0.id, node.id);
                e.get_mut().0 = node;
            }
        }
        Ok(())
    }

    /// Records an unnamed undirected adjacency between two registered nodes.
    ///
    /// Self-adjacencies are ignored. Re-adding an existing adjacency
    /// replaces its way-name label.
    pub fn add_edge(&mut self, u: i64, v: i64) -> Result<(), NetworkError> {
        self.ensure_not_frozen()?;
        self.link(u, v, None)
    }

    /// Records the adjacency of every consecutive node pair of the way,
    /// labelled with the way's name. The way itself is not retained.
    ///
    /// A way referencing any unregistered node id is rejected as a whole
    /// with [NetworkError::MalformedWay], leaving the network untouched.
    /// Ways with fewer than two nodes record nothing.
    pub fn add_way(&mut self, way: &Way) -> Result<(), NetworkError> {
        self.ensure_not_frozen()?;

        if let Some(&node) = way.nodes.iter().find(|id| !self.nodes.contains_key(id)) {
            return Err(NetworkError::MalformedWay { way: way.id, node });
        }

        let label = way.name.as_deref().map(|name| self.intern_way_name(name));
        for pair in way.nodes.windows(2) {
            self.link(pair[0], pair[1], label)?;
        }
        Ok(())
    }

    /// Freezes the network: the one-time, one-way transition from ingestion
    /// to querying.
    ///
    /// Nodes with no adjacency are dropped, as they can never take part in a
    /// route. The remaining nodes are projected onto a plane with a
    /// Transverse Mercator projection centered on the dataset's bounding-box
    /// centroid, and inserted into the nearest-node index in ascending id
    /// order (so among exactly co-located nodes, [RoadNetwork::closest]
    /// reports the lowest id).
    pub fn freeze(&mut self) -> Result<(), NetworkError> {
        self.ensure_not_frozen()?;

        let before = self.nodes.len();
        self.nodes.retain(|_, (_, links)| !links.is_empty());

        let projection =
            Projection::centered_on(self.nodes.values().map(|(node, _)| (node.lon, node.lat)));

        let mut index = KdTree::new();
        for (node, _) in self.nodes.values() {
            let (x, y) = projection.project(node.lon, node.lat);
            index.insert(node.id, x, y);
        }

        log::debug!(
            "froze road network: {} nodes kept, {} unconnected nodes dropped",
            self.nodes.len(),
            before - self.nodes.len(),
        );

        self.frozen = Some(Frozen { projection, index });
        Ok(())
    }

    /// Returns the great-circle distance between two nodes, in miles.
    ///
    /// Symmetric, and exactly zero when `u == v`.
    pub fn distance(&self, u: i64, v: i64) -> Result<f64, NetworkError> {
        self.ensure_frozen()?;
        let a = self.node(u)?;
        let b = self.node(v)?;
        Ok(geo::earth_distance(a.lat, a.lon, b.lat, b.lon))
    }

    /// Returns the initial compass bearing of the great-circle arc from `u`
    /// towards `v`, in degrees in (-180°, 180°]. Not symmetric.
    pub fn bearing(&self, u: i64, v: i64) -> Result<f64, NetworkError> {
        self.ensure_frozen()?;
        let a = self.node(u)?;
        let b = self.node(v)?;
        Ok(geo::initial_bearing(a.lat, a.lon, b.lat, b.lon))
    }

    /// Returns the id of the node closest to the given position.
    ///
    /// There is no distance cutoff: the globally nearest node is returned,
    /// no matter how far away from the position it lies.
    pub fn closest(&self, lon: f64, lat: f64) -> Result<i64, NetworkError> {
        let frozen = self.frozen()?;
        let (x, y) = frozen.projection.project(lon, lat);
        Ok(frozen.index.nearest(x, y)?)
    }

    pub(crate) fn ensure_frozen(&self) -> Result<(), NetworkError> {
        self.frozen().map(|_| ())
    }

    fn frozen(&self) -> Result<&Frozen, NetworkError> {
        self.frozen.as_ref().ok_or(NetworkError::NotFrozen)
    }

    fn ensure_not_frozen(&self) -> Result<(), NetworkError> {
        if self.frozen.is_some() {
            Err(NetworkError::AlreadyFrozen)
        } else {
            Ok(())
        }
    }

    fn intern_way_name(&mut self, name: &str) -> u32 {
        if let Some(&label) = self.way_name_ids.get(name) {
            return label;
        }
        let label = self.way_names.len() as u32;
        self.way_names.push(name.to_string());
        self.way_name_ids.insert(name.to_string(), label);
        label
    }

    /// Stores the two directed halves of an undirected adjacency.
    fn link(&mut self, u: i64, v: i64, way: Option<u32>) -> Result<(), NetworkError> {
        if !self.nodes.contains_key(&u) {
            return Err(NetworkError::NodeNotFound(u));
        }
        if !self.nodes.contains_key(&v) {
            return Err(NetworkError::NodeNotFound(v));
        }
        if u == v {
            return Ok(());
        }
        self.half_link(u, v, way);
        self.half_link(v, u, way);
        Ok(())
    }

    fn half_link(&mut self, from: i64, to: i64, way: Option<u32>) {
        if let Some((_, links)) = self.nodes.get_mut(&from) {
            if let Some(existing) = links.iter_mut().find(|link| link.to == to) {
                existing.way = way;
            } else {
                links.push(Link { to, way });
            }
        }
    }
}
