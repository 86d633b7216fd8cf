// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Turn-by-turn routing over [OpenStreetMap](https://www.openstreetmap.org/) data.
//!
//! navix keeps an undirected road graph in memory, snaps arbitrary positions
//! to the nearest road node through a k-d tree, runs A* to find shortest
//! routes and folds routes into turn-by-turn directions. OSM extracts (XML,
//! optionally gzip- or bzip2-compressed) are ingested with
//! [osm::add_features_from_file]; only ways with a routable `highway` tag
//! become roads.
//!
//! A [RoadNetwork] is built in two phases: ingestion ([RoadNetwork::add_node],
//! [RoadNetwork::add_way]), then a one-time [RoadNetwork::freeze] which drops
//! unconnected nodes and builds the nearest-node index. Queries and routing
//! are only available after the freeze.
//!
//! # Example
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut network = navix::RoadNetwork::new();
//! navix::osm::add_features_from_file(
//!     &mut network,
//!     &navix::osm::Options::default(),
//!     "path/to/berkeley.osm",
//! )?;
//! network.freeze()?;
//!
//! let route = navix::shortest_path(
//!     &network,
//!     -122.2543, 37.8715,
//!     -122.2687, 37.8664,
//!     navix::DEFAULT_STEP_LIMIT,
//! )?;
//! for step in navix::route_directions(&network, &route)? {
//!     println!("{step}");
//! }
//! # Ok(())
//! # }
//! ```

mod geo;
mod kd;
mod network;
pub mod osm;
mod route;

pub use geo::{earth_distance, initial_bearing};
pub use kd::{EmptyIndexError, KdTree};
pub use network::{NetworkError, RoadNetwork};
pub use route::{
    find_route, route_directions, shortest_path, DirectionStep, Maneuver, RouteError,
    DEFAULT_STEP_LIMIT, UNKNOWN_ROAD,
};

/// Represents a road intersection or waypoint of a [RoadNetwork].
///
/// Coordinates are fixed for the lifetime of the node; there is no API to
/// move a node once registered.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: i64,
    pub lat: f64,
    pub lon: f64,
    /// Display name of the location, e.g. from an OSM `name` tag.
    /// `None` for the vast majority of nodes.
    pub name: Option<String>,
}

/// Represents an ordered run of [Nodes](Node) forming a road.
///
/// Ways are transient: [RoadNetwork::add_way] records the adjacency of every
/// consecutive node pair, labelled with the way's name, and the way itself
/// is not retained.
#[derive(Debug, Clone, PartialEq)]
pub struct Way {
    pub id: i64,
    pub nodes: Vec<i64>,
    /// Display name of the road. Unnamed roads are rendered as
    /// [UNKNOWN_ROAD] in directions.
    pub name: Option<String>,
    /// Raw `maxspeed` value, kept verbatim. Routing currently minimizes
    /// distance, not travel time, so this is carried but not interpreted.
    pub max_speed: Option<String>,
}

/// Represents one direction of an undirected adjacency between two
/// [Nodes](Node). Every link from `u` to `v` has a mirror from `v` to `u`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link {
    /// Id of the adjacent node.
    pub to: i64,
    /// Way-name label, an index into the network's interned name table.
    pub(crate) way: Option<u32>,
}
