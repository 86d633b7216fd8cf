// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::{BinaryHeap, HashMap};

use super::error::RouteError;
use crate::geo::earth_distance;
use crate::network::RoadNetwork;
use crate::Link;

#[derive(Debug, Clone, Copy)]
struct QueueItem {
    at: i64,
    cost: f64,
    score: f64,
}

impl PartialEq for QueueItem {
    fn eq(&self, other: &Self) -> bool {
        self.score.total_cmp(&other.score).is_eq()
    }
}

impl Eq for QueueItem {}

impl Ord for QueueItem {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // NOTE: We revert the order of comparison,
        // as lower scores are considered better ("higher"),
        // and Rust's BinaryHeap is a max-heap.
        //
        // total_cmp gives floats a total order, so a NaN score (from
        // garbage coordinates) cannot poison the heap; it simply sorts
        // as the worst possible candidate.
        other.score.total_cmp(&self.score)
    }
}

impl PartialOrd for QueueItem {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

fn reconstruct_path(came_from: &HashMap<i64, i64>, mut last: i64) -> Vec<i64> {
    let mut path = vec![last];

    while let Some(&nd) = came_from.get(&last) {
        path.push(nd);
        last = nd;
    }

    path.reverse();
    return path;
}

/// Uses the [A* algorithm](https://en.wikipedia.org/wiki/A*_search_algorithm)
/// to find the shortest route between two nodes of a frozen network.
///
/// Edge costs are great-circle distances, and the heuristic is the
/// great-circle distance to the goal. The heuristic never overestimates the
/// length of any road path, so the returned route is optimal. Routing a node
/// to itself returns a single-element route; if the goal is unreachable,
/// [RouteError::NoPath] is returned.
///
/// `step_limit` limits how many nodes may be expanded during the search
/// before returning [RouteError::StepLimitExceeded]. Concluding that no
/// route exists requires expanding all nodes accessible from the start,
/// which is usually very time-consuming, especially on large datasets.
/// The recommended value is [DEFAULT_STEP_LIMIT](crate::DEFAULT_STEP_LIMIT).
pub fn find_route(
    g: &RoadNetwork,
    from: i64,
    to: i64,
    step_limit: usize,
) -> Result<Vec<i64>, RouteError> {
    g.ensure_frozen()?;

    let mut queue: BinaryHeap<QueueItem> = BinaryHeap::default();
    let mut came_from: HashMap<i64, i64> = HashMap::default();
    let mut known_costs: HashMap<i64, f64> = HashMap::default();
    let mut steps: usize = 0;

    let goal = g.node(to)?;

    {
        let start = g.node(from)?;
        queue.push(QueueItem {
            at: from,
            cost: 0.0,
            score: earth_distance(start.lat, start.lon, goal.lat, goal.lon),
        });
        known_costs.insert(from, 0.0);
    }

    while let Some(item) = queue.pop() {
        if item.at == to {
            return Ok(reconstruct_path(&came_from, to));
        }

        // Contrary to the wikipedia definition, we might keep multiple items
        // in the queue for the same node. Skip the stale ones.
        if item.cost > known_costs.get(&item.at).copied().unwrap_or(f64::INFINITY) {
            continue;
        }

        steps += 1;
        if steps > step_limit {
            return Err(RouteError::StepLimitExceeded);
        }

        let at = g.node(item.at)?;
        for &Link {
            to: neighbor_id, ..
        } in g.links(item.at)?
        {
            let neighbor = g.node(neighbor_id)?;

            // Check if this is the cheapest known way to the neighbor
            let neighbor_cost =
                item.cost + earth_distance(at.lat, at.lon, neighbor.lat, neighbor.lon);
            if neighbor_cost
                >= known_costs
                    .get(&neighbor_id)
                    .copied()
                    .unwrap_or(f64::INFINITY)
            {
                continue;
            }

            came_from.insert(neighbor_id, item.at);
            known_costs.insert(neighbor_id, neighbor_cost);
            queue.push(QueueItem {
                at: neighbor_id,
                cost: neighbor_cost,
                score: neighbor_cost
                    + earth_distance(neighbor.lat, neighbor.lon, goal.lat, goal.lon),
            });
        }
    }

    return Err(RouteError::NoPath { from, to });
}

/// Finds the shortest route between two arbitrary lon-lat positions.
///
/// Both positions are snapped to the nearest network node with
/// [RoadNetwork::closest] first; the route then runs between the snapped
/// nodes and includes both of them. See [find_route] for the search itself
/// and the meaning of `step_limit`.
pub fn shortest_path(
    g: &RoadNetwork,
    start_lon: f64,
    start_lat: f64,
    dest_lon: f64,
    dest_lat: f64,
    step_limit: usize,
) -> Result<Vec<i64>, RouteError> {
    let from = g.closest(start_lon, start_lat)?;
    let to = g.closest(dest_lon, dest_lat)?;
    find_route(g, from, to, step_limit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::NetworkError;
    use crate::{Node, Way, DEFAULT_STEP_LIMIT};
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};
    use std::collections::HashSet;

    fn node(id: i64, lat: f64, lon: f64) -> Node {
        Node {
            id,
            lat,
            lon,
            name: None,
        }
    }

    /// 1 ── 2 ── 3 in an L-shape, with 4 ── 5 as a separate island.
    fn two_component_network() -> RoadNetwork {
        let mut net = RoadNetwork::new();
        net.add_node(node(1, 0.0, 0.0)).unwrap();
        net.add_node(node(2, 0.0, 1.0)).unwrap();
        net.add_node(node(3, 1.0, 1.0)).unwrap();
        net.add_node(node(4, 5.0, 5.0)).unwrap();
        net.add_node(node(5, 5.0, 6.0)).unwrap();
        net.add_edge(1, 2).unwrap();
        net.add_edge(2, 3).unwrap();
        net.add_edge(4, 5).unwrap();
        net.freeze().unwrap();
        net
    }

    fn path_length(net: &RoadNetwork, path: &[i64]) -> f64 {
        path.windows(2)
            .map(|pair| net.distance(pair[0], pair[1]).unwrap())
            .sum()
    }

    /// Reference shortest-path-length oracle: a naive Dijkstra scan.
    fn dijkstra_length(net: &RoadNetwork, from: i64, to: i64) -> Option<f64> {
        let mut dist: HashMap<i64, f64> = HashMap::new();
        let mut visited: HashSet<i64> = HashSet::new();
        dist.insert(from, 0.0);

        loop {
            let at = dist
                .iter()
                .filter(|(id, _)| !visited.contains(*id))
                .min_by(|a, b| a.1.total_cmp(b.1))
                .map(|(&id, _)| id)?;
            if at == to {
                return dist.get(&to).copied();
            }
            visited.insert(at);

            let here = dist[&at];
            for link in net.links(at).unwrap() {
                let alt = here + net.distance(at, link.to).unwrap();
                if alt < dist.get(&link.to).copied().unwrap_or(f64::INFINITY) {
                    dist.insert(link.to, alt);
                }
            }
        }
    }

    #[test]
    fn follows_the_only_road() {
        let net = two_component_network();
        let route = find_route(&net, 1, 3, DEFAULT_STEP_LIMIT).unwrap();
        assert_eq!(route, vec![1, 2, 3]);
    }

    #[test]
    fn routing_a_node_to_itself() {
        let net = two_component_network();
        assert_eq!(find_route(&net, 2, 2, DEFAULT_STEP_LIMIT), Ok(vec![2]));
    }

    #[test]
    fn unreachable_goal() {
        let net = two_component_network();
        assert_eq!(
            find_route(&net, 1, 5, DEFAULT_STEP_LIMIT),
            Err(RouteError::NoPath { from: 1, to: 5 })
        );
    }

    #[test]
    fn unknown_endpoints() {
        let net = two_component_network();
        assert_eq!(
            find_route(&net, 1, 999, DEFAULT_STEP_LIMIT),
            Err(RouteError::Network(NetworkError::NodeNotFound(999)))
        );
        assert_eq!(
            find_route(&net, 999, 1, DEFAULT_STEP_LIMIT),
            Err(RouteError::Network(NetworkError::NodeNotFound(999)))
        );
    }

    #[test]
    fn requires_a_frozen_network() {
        let mut net = RoadNetwork::new();
        net.add_node(node(1, 0.0, 0.0)).unwrap();
        net.add_node(node(2, 0.0, 1.0)).unwrap();
        net.add_edge(1, 2).unwrap();

        assert_eq!(
            find_route(&net, 1, 2, DEFAULT_STEP_LIMIT),
            Err(RouteError::Network(NetworkError::NotFrozen))
        );
    }

    #[test]
    fn step_limit_cuts_the_search_short() {
        let net = two_component_network();
        assert_eq!(
            find_route(&net, 1, 3, 1),
            Err(RouteError::StepLimitExceeded)
        );
        // concluding "no path" within the island still works with slack
        assert_eq!(
            find_route(&net, 4, 3, DEFAULT_STEP_LIMIT),
            Err(RouteError::NoPath { from: 4, to: 3 })
        );
    }

    #[test]
    fn snaps_positions_to_nodes() {
        let net = two_component_network();
        let route = shortest_path(&net, 0.1, 0.05, 1.05, 0.95, DEFAULT_STEP_LIMIT).unwrap();
        assert_eq!(route, vec![1, 2, 3]);
    }

    #[test]
    fn matches_dijkstra_on_random_grids() {
        const N: i64 = 8;
        let mut rng = SmallRng::seed_from_u64(0xA57A);

        for _ in 0..5 {
            let mut net = RoadNetwork::new();
            for row in 0..N {
                for col in 0..N {
                    net.add_node(node(row * N + col + 1, row as f64 * 0.01, col as f64 * 0.01))
                        .unwrap();
                }
            }
            for row in 0..N {
                for col in 0..N {
                    let id = row * N + col + 1;
                    if col + 1 < N && rng.gen_bool(0.8) {
                        net.add_edge(id, id + 1).unwrap();
                    }
                    if row + 1 < N && rng.gen_bool(0.8) {
                        net.add_edge(id, id + N).unwrap();
                    }
                }
            }
            net.freeze().unwrap();

            let ids: Vec<i64> = net.nodes().map(|n| n.id).collect();
            for _ in 0..30 {
                let from = ids[rng.gen_range(0..ids.len())];
                let to = ids[rng.gen_range(0..ids.len())];

                match (
                    dijkstra_length(&net, from, to),
                    find_route(&net, from, to, DEFAULT_STEP_LIMIT),
                ) {
                    (Some(expected), Ok(route)) => {
                        assert_eq!(route.first(), Some(&from));
                        assert_eq!(route.last(), Some(&to));
                        for pair in route.windows(2) {
                            assert!(
                                net.links(pair[0]).unwrap().iter().any(|l| l.to == pair[1]),
                                "route hops from {} to {} without an edge",
                                pair[0],
                                pair[1]
                            );
                        }
                        let got = path_length(&net, &route);
                        assert!(
                            (got - expected).abs() < 1e-9,
                            "route {from} -> {to}: got {got} mi, dijkstra says {expected} mi"
                        );
                    }
                    (None, Err(RouteError::NoPath { .. })) => {}
                    (oracle, result) => {
                        panic!("route {from} -> {to}: oracle {oracle:?} vs result {result:?}")
                    }
                }
            }
        }
    }

    #[test]
    fn ignores_way_labels_when_routing() {
        // same geometry as two_component_network, but via named ways
        let mut net = RoadNetwork::new();
        net.add_node(node(1, 0.0, 0.0)).unwrap();
        net.add_node(node(2, 0.0, 1.0)).unwrap();
        net.add_node(node(3, 1.0, 1.0)).unwrap();
        net.add_way(&Way {
            id: 100,
            nodes: vec![1, 2, 3],
            name: Some("Loop Rd".to_string()),
            max_speed: Some("25 mph".to_string()),
        })
        .unwrap();
        net.freeze().unwrap();

        assert_eq!(find_route(&net, 3, 1, DEFAULT_STEP_LIMIT), Ok(vec![3, 2, 1]));
    }
}
