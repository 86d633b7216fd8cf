// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::fmt;

use super::error::RouteError;
use crate::network::RoadNetwork;

/// Display name used for unnamed ways in directions.
pub const UNKNOWN_ROAD: &str = "unknown road";

/// The maneuver opening a [DirectionStep].
///
/// The discriminants are part of the serialized format and must not be
/// reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Maneuver {
    Start = 0,
    Straight = 1,
    SlightLeft = 2,
    SlightRight = 3,
    Right = 4,
    Left = 5,
    SharpLeft = 6,
    SharpRight = 7,
}

impl Maneuver {
    /// Human-readable phrase, as used when rendering directions.
    pub const fn phrase(self) -> &'static str {
        match self {
            Self::Start => "Start",
            Self::Straight => "Go straight",
            Self::SlightLeft => "Slight left",
            Self::SlightRight => "Slight right",
            Self::Right => "Turn right",
            Self::Left => "Turn left",
            Self::SharpLeft => "Sharp left",
            Self::SharpRight => "Sharp right",
        }
    }

    /// Stable numeric code of the maneuver.
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Classifies the maneuver at a way transition, given the compass
    /// bearing driven just before it and the bearing driven just after it
    /// (both in degrees).
    ///
    /// The change of bearing is normalized to [-180°, 180°]; negative
    /// change turns left, positive right. Up to 15° of change reads as
    /// straight, up to 30° as a slight turn, up to 100° as a regular turn,
    /// and anything beyond as a sharp turn.
    pub fn from_bearings(previous: f64, current: f64) -> Self {
        let mut relative = current - previous;
        if relative > 180.0 {
            relative -= 360.0;
        } else if relative < -180.0 {
            relative += 360.0;
        }

        if relative.abs() <= 15.0 {
            Self::Straight
        } else if relative.abs() <= 30.0 {
            if relative < 0.0 {
                Self::SlightLeft
            } else {
                Self::SlightRight
            }
        } else if relative.abs() <= 100.0 {
            if relative < 0.0 {
                Self::Left
            } else {
                Self::Right
            }
        } else if relative < 0.0 {
            Self::SharpLeft
        } else {
            Self::SharpRight
        }
    }
}

/// A single entry of turn-by-turn directions: one maneuver, then one way
/// to follow for some distance.
///
/// Displays as e.g. `Turn left on Hearst Ave and continue for 0.215 miles.`
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionStep {
    pub maneuver: Maneuver,
    /// Name of the way to follow, `None` for unnamed roads.
    pub way: Option<String>,
    /// Distance to follow the way for, in miles.
    pub distance: f64,
}

impl fmt::Display for DirectionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} on {} and continue for {:.3} miles.",
            self.maneuver.phrase(),
            self.way.as_deref().unwrap_or(UNKNOWN_ROAD),
            self.distance,
        )
    }
}

/// Folds a route (as returned by [find_route](crate::find_route) or
/// [shortest_path](crate::shortest_path)) into turn-by-turn directions.
///
/// Consecutive node pairs sharing a way name are merged into a single step
/// with their distances accumulated; a new step opens whenever the way name
/// changes, including changes to or from unnamed stretches. The first step
/// is always a [Maneuver::Start]; every later step's maneuver is classified
/// from the change of bearing at the transition with
/// [Maneuver::from_bearings].
///
/// An empty route produces no directions, and a single-node route produces
/// a lone zero-length start step.
pub fn route_directions(
    g: &RoadNetwork,
    route: &[i64],
) -> Result<Vec<DirectionStep>, RouteError> {
    g.ensure_frozen()?;

    let mut steps: Vec<DirectionStep> = Vec::new();
    if route.is_empty() {
        return Ok(steps);
    }
    g.node(route[0])?;

    let mut current = DirectionStep {
        maneuver: Maneuver::Start,
        way: None,
        distance: 0.0,
    };
    let mut previous_bearing: Option<f64> = None;

    for pair in route.windows(2) {
        let (at, next) = (pair[0], pair[1]);
        let way = g.way_name_between(at, next)?.map(str::to_string);
        let distance = g.distance(at, next)?;
        let bearing = g.bearing(at, next)?;

        match previous_bearing {
            // The first pair rides with the initial Start step.
            None => {
                current.way = way;
                current.distance = distance;
            }
            Some(_) if way == current.way => current.distance += distance,
            Some(previous) => {
                let next_step = DirectionStep {
                    maneuver: Maneuver::from_bearings(previous, bearing),
                    way,
                    distance,
                };
                steps.push(std::mem::replace(&mut current, next_step));
            }
        }

        previous_bearing = Some(bearing);
    }

    steps.push(current);
    Ok(steps)
}
