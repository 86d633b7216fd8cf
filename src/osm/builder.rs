// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::HashMap;

use super::{model, Error, Options};
use crate::network::NetworkError;
use crate::{Node, RoadNetwork, Way};

/// `highway` values which count as drivable roads. Everything else
/// (footways, cycleways, waterways, building outlines) is not routable.
const ROUTABLE_HIGHWAYS: &[&str] = &[
    "motorway",
    "trunk",
    "bridleway",
    "primary",
    "secondary",
    "tertiary",
    "unclassified",
    "residential",
    "living_street",
    "motorway_link",
    "trunk_link",
    "primary_link",
    "secondary_link",
    "tertiary_link",
];

fn is_routable(tags: &HashMap<String, String>) -> bool {
    tags.get("highway")
        .map(|v| ROUTABLE_HIGHWAYS.contains(&v.as_str()))
        .unwrap_or(false)
}

/// Helper object used for feeding [OSM features](model::Feature)
/// into a [RoadNetwork].
pub(super) struct NetworkBuilder<'a> {
    network: &'a mut RoadNetwork,
    options: &'a Options,
    ignore_bbox: bool,
}

impl<'a> NetworkBuilder<'a> {
    pub(super) fn new(network: &'a mut RoadNetwork, options: &'a Options) -> Self {
        let all_zero = options.bbox.iter().all(|&x| x == 0.0);
        let finite = options.bbox.iter().all(|x| x.is_finite());
        if !all_zero && !finite {
            log::warn!("ignoring non-finite bounding box filter: {:?}", options.bbox);
        }

        Self {
            network,
            options,
            ignore_bbox: all_zero || !finite,
        }
    }

    /// Feeds all features from the provided iterator into the network.
    pub(super) fn add_features<I>(&mut self, features: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = Result<model::Feature, quick_xml::Error>>,
    {
        for feature in features {
            self.add_feature(feature?)?;
        }
        Ok(())
    }

    fn add_feature(&mut self, f: model::Feature) -> Result<(), Error> {
        match f {
            model::Feature::Node(n) => self.add_node(n),
            model::Feature::Way(w) => self.add_way(w),
        }
    }

    fn add_node(&mut self, n: Node) -> Result<(), Error> {
        if self.is_in_bbox(n.lat, n.lon) {
            self.network.add_node(n)?;
        }
        Ok(())
    }

    fn is_in_bbox(&self, lat: f64, lon: f64) -> bool {
        if self.ignore_bbox {
            return true;
        }
        let [min_lon, min_lat, max_lon, max_lat] = self.options.bbox;
        lat >= min_lat && lat <= max_lat && lon >= min_lon && lon <= max_lon
    }

    fn add_way(&mut self, mut raw: model::Way) -> Result<(), Error> {
        if !is_routable(&raw.tags) {
            return Ok(());
        }

        let way = Way {
            id: raw.id,
            nodes: raw.nodes,
            name: raw.tags.remove("name"),
            max_speed: raw.tags.remove("maxspeed"),
        };

        if way.nodes.len() < 2 {
            log::debug!("way {} has fewer than 2 nodes, skipping", way.id);
            return Ok(());
        }

        match self.network.add_way(&way) {
            Ok(()) => Ok(()),
            // Extracts routinely clip ways at the download boundary, leaving
            // node references that resolve to nothing. Such ways are dropped
            // without aborting the whole read.
            Err(err @ NetworkError::MalformedWay { .. }) => {
                log::warn!("skipping {}", err);
                Ok(())
            }
            Err(other) => Err(other.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! tags {
        {} => { HashMap::default() };
        {$( $k:literal : $v:literal ),+} => {
            HashMap::from_iter([ $( ($k.to_string(), $v.to_string()) ),+ ])
        };
    }

    fn node(id: i64, lat: f64, lon: f64) -> model::Feature {
        model::Feature::Node(Node {
            id,
            lat,
            lon,
            name: None,
        })
    }

    #[test]
    fn filters_by_highway_tag() {
        assert!(is_routable(&tags! {"highway": "residential"}));
        assert!(is_routable(&tags! {"highway": "motorway_link", "oneway": "yes"}));
        assert!(!is_routable(&tags! {"highway": "footway"}));
        assert!(!is_routable(&tags! {"highway": "cycleway"}));
        assert!(!is_routable(&tags! {"waterway": "river"}));
        assert!(!is_routable(&tags! {}));
    }

    #[test]
    fn non_routable_ways_leave_no_trace() {
        let mut network = RoadNetwork::new();
        let options = Options::default();
        let mut builder = NetworkBuilder::new(&mut network, &options);

        builder
            .add_features([
                Ok(node(1, 0.0, 0.0)),
                Ok(node(2, 0.0, 0.01)),
                Ok(model::Feature::Way(model::Way {
                    id: 100,
                    nodes: vec![1, 2],
                    tags: tags! {"highway": "footway", "name": "Strand Walk"},
                })),
            ])
            .unwrap();

        assert_eq!(network.len(), 2);
        assert!(network.links(1).unwrap().is_empty());
    }

    #[test]
    fn ways_clipped_by_the_extract_are_skipped() {
        let mut network = RoadNetwork::new();
        let options = Options::default();
        let mut builder = NetworkBuilder::new(&mut network, &options);

        builder
            .add_features([
                Ok(node(1, 0.0, 0.0)),
                Ok(node(2, 0.0, 0.01)),
                Ok(model::Feature::Way(model::Way {
                    id: 100,
                    nodes: vec![1, 2, 999],
                    tags: tags! {"highway": "residential"},
                })),
                Ok(model::Feature::Way(model::Way {
                    id: 101,
                    nodes: vec![1, 2],
                    tags: tags! {"highway": "residential", "name": "Kept Rd"},
                })),
            ])
            .unwrap();

        // way 100 is dropped as a whole, way 101 still lands
        assert_eq!(network.way_name_between(1, 2).unwrap(), Some("Kept Rd"));
    }

    #[test]
    fn bbox_filters_nodes() {
        let mut network = RoadNetwork::new();
        let options = Options {
            bbox: [0.0, 0.0, 1.0, 1.0],
            ..Options::default()
        };
        let mut builder = NetworkBuilder::new(&mut network, &options);

        builder
            .add_features([Ok(node(1, 0.5, 0.5)), Ok(node(2, 2.0, 0.5))])
            .unwrap();

        assert_eq!(network.len(), 1);
        assert!(network.node(1).is_ok());
    }

    #[test]
    fn zero_bbox_means_no_filter() {
        let mut network = RoadNetwork::new();
        let options = Options::default();
        let mut builder = NetworkBuilder::new(&mut network, &options);

        builder
            .add_features([Ok(node(1, 89.0, 179.0)), Ok(node(2, -89.0, -179.0))])
            .unwrap();

        assert_eq!(network.len(), 2);
    }
}
