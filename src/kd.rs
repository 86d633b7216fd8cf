// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

/// Error returned by [KdTree::nearest] when the index contains no points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("nearest-neighbor query on an empty index")]
pub struct EmptyIndexError;

/// Axis-aligned rectangle covering a subtree, used to prune branches which
/// cannot contain a closer point.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Rect {
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
}

impl Rect {
    fn point(x: f64, y: f64) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
        }
    }

    fn extend(&mut self, x: f64, y: f64) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    /// Squared distance to the closest point of the rectangle,
    /// zero when (x, y) lies inside it.
    fn dist_sq(&self, x: f64, y: f64) -> f64 {
        let dx = if x < self.min_x {
            self.min_x - x
        } else if x > self.max_x {
            x - self.max_x
        } else {
            0.0
        };
        let dy = if y < self.min_y {
            self.min_y - y
        } else if y > self.max_y {
            y - self.max_y
        } else {
            0.0
        };
        dx * dx + dy * dy
    }
}

/// A point of the [KdTree] arena. Children are arena indices, not pointers.
#[derive(Debug, Clone, Copy)]
struct Point {
    id: i64,
    x: f64,
    y: f64,
    /// Covers this point and everything below it.
    rect: Rect,
    left: Option<u32>,
    right: Option<u32>,
}

impl Point {
    fn new(id: i64, x: f64, y: f64) -> Self {
        Self {
            id,
            x,
            y,
            rect: Rect::point(x, y),
            left: None,
            right: None,
        }
    }
}

/// KdTree implements the [k-d tree data structure](https://en.wikipedia.org/wiki/K-d_tree)
/// over 2-dimensional points, to speed up nearest-neighbor search for large
/// datasets. Points are identified by an opaque `i64` id.
///
/// All points live in a single flat arena and refer to their children by
/// index. Compared to a node-per-allocation tree this keeps the points in
/// one contiguous slab, and lets [KdTree::nearest] walk the tree with a
/// plain index stack, so lookups on a degenerate (insertion-order-skewed)
/// tree cannot exhaust the call stack.
///
/// This implementation assumes euclidean geometry; callers working with
/// geographic coordinates must project them onto a plane first.
#[derive(Debug, Clone, Default)]
pub struct KdTree {
    points: Vec<Point>,
}

impl KdTree {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of points in the index.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns true if the index contains no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Inserts a point into the index.
    ///
    /// The splitting axis alternates with depth: the root divides the plane
    /// vertically (by x), its children horizontally (by y), and so on.
    /// Inserting at coordinates already present is a no-op, keeping
    /// whichever id arrived first.
    pub fn insert(&mut self, id: i64, x: f64, y: f64) {
        if self.points.is_empty() {
            self.points.push(Point::new(id, x, y));
            return;
        }

        let mut at = 0usize;
        let mut vertical = true;
        loop {
            if self.points[at].x == x && self.points[at].y == y {
                return;
            }

            // A duplicate deeper down would retrace the descent of its twin,
            // so extending ancestor rectangles before the duplicate check is
            // harmless: for duplicates the extension never changes anything.
            self.points[at].rect.extend(x, y);

            let go_left = if vertical {
                x < self.points[at].x
            } else {
                y < self.points[at].y
            };
            let child = if go_left {
                self.points[at].left
            } else {
                self.points[at].right
            };

            match child {
                Some(next) => {
                    at = next as usize;
                    vertical = !vertical;
                }
                None => {
                    let next = self.points.len() as u32;
                    self.points.push(Point::new(id, x, y));
                    if go_left {
                        self.points[at].left = Some(next);
                    } else {
                        self.points[at].right = Some(next);
                    }
                    return;
                }
            }
        }
    }

    /// Finds the id of the point closest to (x, y).
    ///
    /// A subtree is skipped whenever its bounding rectangle cannot contain
    /// anything closer than the best candidate so far, and the child on the
    /// query's side of the split is always explored first, which keeps the
    /// expected number of visited points logarithmic. The worst case
    /// degrades to a full scan, never to a wrong answer.
    pub fn nearest(&self, x: f64, y: f64) -> Result<i64, EmptyIndexError> {
        if self.points.is_empty() {
            return Err(EmptyIndexError);
        }

        let mut best = 0usize;
        let mut best_dist = f64::INFINITY;

        let mut stack = vec![(0u32, true)];
        while let Some((at, vertical)) = stack.pop() {
            let p = &self.points[at as usize];
            if p.rect.dist_sq(x, y) >= best_dist {
                continue;
            }

            let dist = dist_sq(p.x, p.y, x, y);
            if dist < best_dist {
                best = at as usize;
                best_dist = dist;
            }

            let near_left = if vertical { x < p.x } else { y < p.y };
            let (near, far) = if near_left {
                (p.left, p.right)
            } else {
                (p.right, p.left)
            };

            // LIFO: push the far child first so the near one is popped first
            if let Some(child) = far {
                stack.push((child, !vertical));
            }
            if let Some(child) = near {
                stack.push((child, !vertical));
            }
        }

        Ok(self.points[best].id)
    }
}

#[inline]
fn dist_sq(ax: f64, ay: f64, bx: f64, by: f64) -> f64 {
    let dx = ax - bx;
    let dy = ay - by;
    dx * dx + dy * dy
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn nearest_on_small_tree() {
        let mut tree = KdTree::new();
        tree.insert(1, 0.01, 0.01);
        tree.insert(2, 0.05, 0.01);
        tree.insert(3, 0.09, 0.03);
        tree.insert(4, 0.03, 0.04);
        tree.insert(5, 0.07, 0.04);
        tree.insert(6, 0.03, 0.07);
        tree.insert(7, 0.01, 0.07);
        tree.insert(8, 0.05, 0.08);
        tree.insert(9, 0.09, 0.08);

        assert_eq!(tree.nearest(0.02, 0.02), Ok(1));
        assert_eq!(tree.nearest(0.03, 0.05), Ok(4));
        assert_eq!(tree.nearest(0.08, 0.05), Ok(5));
        assert_eq!(tree.nearest(0.06, 0.09), Ok(8));
    }

    #[test]
    fn nearest_on_empty_tree() {
        let tree = KdTree::new();
        assert_eq!(tree.nearest(0.0, 0.0), Err(EmptyIndexError));
    }

    #[test]
    fn nearest_on_single_point() {
        let mut tree = KdTree::new();
        tree.insert(42, 10.0, -3.0);
        assert_eq!(tree.nearest(-100.0, 100.0), Ok(42));
        assert_eq!(tree.nearest(10.0, -3.0), Ok(42));
    }

    #[test]
    fn duplicate_coordinates_keep_first_id() {
        let mut tree = KdTree::new();
        tree.insert(1, 5.0, 5.0);
        tree.insert(2, 5.0, 5.0);
        tree.insert(3, 5.0, 6.0);
        tree.insert(4, 5.0, 6.0);

        assert_eq!(tree.len(), 2);
        assert_eq!(tree.nearest(5.0, 5.1), Ok(1));
        assert_eq!(tree.nearest(5.0, 5.9), Ok(3));
    }

    #[test]
    fn nearest_matches_linear_scan() {
        let mut rng = SmallRng::seed_from_u64(0x5EED);

        let mut tree = KdTree::new();
        let mut points: Vec<(i64, f64, f64)> = Vec::new();
        for id in 0..10_000 {
            let x = rng.gen_range(-1.0..1.0);
            let y = rng.gen_range(-1.0..1.0);
            tree.insert(id, x, y);
            points.push((id, x, y));
        }
        assert_eq!(tree.len(), points.len());

        for _ in 0..250 {
            let x = rng.gen_range(-1.1..1.1);
            let y = rng.gen_range(-1.1..1.1);

            let best = tree.nearest(x, y).unwrap();
            let best_dist = points
                .iter()
                .find(|&&(id, ..)| id == best)
                .map(|&(_, px, py)| dist_sq(px, py, x, y))
                .unwrap();
            let scan_dist = points
                .iter()
                .map(|&(_, px, py)| dist_sq(px, py, x, y))
                .min_by(|a, b| a.total_cmp(b))
                .unwrap();

            assert_eq!(best_dist, scan_dist, "query at ({x}, {y})");
        }
    }
}
