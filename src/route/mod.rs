// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

mod directions;
mod error;
mod search;

pub use directions::{route_directions, DirectionStep, Maneuver, UNKNOWN_ROAD};
pub use error::{RouteError, DEFAULT_STEP_LIMIT};
pub use search::{find_route, shortest_path};
