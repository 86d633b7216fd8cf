// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use crate::network::NetworkError;

/// Recommended number of allowed node expansions in
/// [find_route](crate::find_route) and [shortest_path](crate::shortest_path)
/// before [RouteError::StepLimitExceeded] is returned.
pub const DEFAULT_STEP_LIMIT: usize = 1_000_000;

/// Error conditions which may occur during route finding.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RouteError {
    /// The start and goal nodes lie in disconnected parts of the network.
    #[error("no route between nodes {from} and {to}")]
    NoPath { from: i64, to: i64 },

    /// Route search has exceeded its limit of steps.
    /// Either the nodes are really far apart, or no route exists.
    ///
    /// Concluding that no route exists requires traversing everything
    /// reachable from the start, which can result in a denial-of-service.
    /// The step limit protects against resource exhaustion.
    #[error("step limit exceeded")]
    StepLimitExceeded,

    /// The underlying network rejected a lookup, e.g. an unknown node id
    /// or a network which has not been frozen yet.
    #[error(transparent)]
    Network(#[from] NetworkError),
}
