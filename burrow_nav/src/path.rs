// Walking routes handed to path consumers.
//
// A `Path` is built once per completed search (or once, invalid, for an
// immediate rejection). It carries:
// - `tiles` / `waypoints`: the node chain from the search, as tile
//   coordinates and as tile-center positions;
// - `smoothed`: a denser Catmull-Rom spline through the waypoints with
//   `spline_subdivisions` points per segment, the tiny hook at the tail
//   trimmed away (`spline_tail_trim`);
// - a validity flag and the wall-clock time the search took.
//
// Consumers step a cursor forward: read `current_target()`, move toward it,
// and call `advance()` once within epsilon, or pull tiles with `next()`.
// `is_valid() == false` or `is_finished()` means "request a new path".
// Paths are snapshots: the graph may have changed since the search ran, so
// consumers re-validate the next waypoint (`next_step_walkable`) before
// committing an agent to it.
//
// See also: `pathfinding.rs` for the search that produces node chains,
// `path_finder.rs` which builds `Path`s on worker threads and hands them to
// request callbacks.
//
// **Critical constraint:** an invalid path never carries waypoints. The only
// mutation after construction is cursor movement and `invalidate()`, which
// clears everything.

use crate::node_graph::NodeGraph;
use crate::types::{Point2, TileCoord};
use std::time::Duration;

/// A computed route, or the explicit absence of one.
#[derive(Clone, Debug, Default)]
pub struct Path {
    tiles: Vec<TileCoord>,
    waypoints: Vec<Point2>,
    smoothed: Vec<Point2>,
    valid: bool,
    compute_time: Duration,
    cursor: usize,
}

impl Path {
    /// A path representing "no route".
    pub fn invalid() -> Self {
        Self::default()
    }

    /// Build a path from a tile chain. An empty chain yields an invalid path.
    pub fn from_tiles(
        tiles: Vec<TileCoord>,
        spline_subdivisions: u32,
        spline_tail_trim: f32,
        compute_time: Duration,
    ) -> Self {
        if tiles.is_empty() {
            return Self {
                compute_time,
                ..Self::invalid()
            };
        }
        let waypoints: Vec<Point2> = tiles.iter().map(|t| t.center()).collect();
        let smoothed = catmull_rom_spline(&waypoints, spline_subdivisions, spline_tail_trim);
        Self {
            tiles,
            waypoints,
            smoothed,
            valid: true,
            compute_time,
            cursor: 0,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Waypoint tiles in walking order.
    pub fn tiles(&self) -> &[TileCoord] {
        &self.tiles
    }

    /// Waypoint positions (tile centers) in walking order.
    pub fn waypoints(&self) -> &[Point2] {
        &self.waypoints
    }

    /// Spline-interpolated positions through the waypoints.
    pub fn smoothed(&self) -> &[Point2] {
        &self.smoothed
    }

    pub fn compute_time(&self) -> Duration {
        self.compute_time
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Index of the waypoint the consumer is walking toward.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Waypoints not yet reached.
    pub fn remaining(&self) -> usize {
        self.tiles.len().saturating_sub(self.cursor)
    }

    /// True once every waypoint has been consumed (always true when invalid).
    pub fn is_finished(&self) -> bool {
        self.remaining() == 0
    }

    /// The waypoint position the consumer should walk toward.
    pub fn current_target(&self) -> Option<Point2> {
        self.waypoints.get(self.cursor).copied()
    }

    /// The waypoint tile the consumer should walk toward.
    pub fn current_tile(&self) -> Option<TileCoord> {
        self.tiles.get(self.cursor).copied()
    }

    /// Advance the cursor if `position` is within `epsilon` of the current
    /// target. Returns whether it advanced.
    pub fn advance(&mut self, position: Point2, epsilon: f32) -> bool {
        match self.current_target() {
            Some(target) if position.distance(target) <= epsilon => {
                self.cursor += 1;
                true
            }
            _ => false,
        }
    }

    /// Whether the current target tile is still pathable in `graph`.
    pub fn next_step_walkable(&self, graph: &NodeGraph) -> bool {
        self.current_tile().is_some_and(|t| graph.is_pathable(t))
    }

    /// Whether every waypoint not yet reached is still pathable in `graph`.
    pub fn is_still_walkable(&self, graph: &NodeGraph) -> bool {
        self.valid
            && self.tiles[self.cursor.min(self.tiles.len())..]
                .iter()
                .all(|t| graph.is_pathable(*t))
    }

    /// Mark the path unusable and drop its waypoints.
    pub fn invalidate(&mut self) {
        self.valid = false;
        self.tiles.clear();
        self.waypoints.clear();
        self.smoothed.clear();
        self.cursor = 0;
    }
}

/// Stepping a `Path` yields its remaining waypoint tiles and moves the
/// cursor past each one.
impl Iterator for Path {
    type Item = TileCoord;

    fn next(&mut self) -> Option<TileCoord> {
        let tile = self.current_tile()?;
        self.cursor += 1;
        Some(tile)
    }
}

/// Catmull-Rom point on the segment `p1 → p2` at parameter `t` in `[0, 1]`.
fn catmull_rom(p0: Point2, p1: Point2, p2: Point2, p3: Point2, t: f32) -> Point2 {
    let t2 = t * t;
    let t3 = t2 * t;
    let axis = |a: f32, b: f32, c: f32, d: f32| {
        0.5 * (2.0 * b
            + (-a + c) * t
            + (2.0 * a - 5.0 * b + 4.0 * c - d) * t2
            + (-a + 3.0 * b - 3.0 * c + d) * t3)
    };
    Point2::new(
        axis(p0.x, p1.x, p2.x, p3.x),
        axis(p0.y, p1.y, p2.y, p3.y),
    )
}

/// Interpolate a spline through `points` with `subdivisions` samples per
/// segment. End segments reuse their endpoint as the missing control point.
/// Samples closer than `tail_trim` to the final point are dropped before
/// the final point itself is appended.
pub fn catmull_rom_spline(points: &[Point2], subdivisions: u32, tail_trim: f32) -> Vec<Point2> {
    let Some(&last) = points.last() else {
        return Vec::new();
    };
    if points.len() == 1 {
        return vec![last];
    }
    let subdivisions = subdivisions.max(1);
    let n = points.len();
    let mut out = Vec::with_capacity((n - 1) * subdivisions as usize + 1);
    for i in 0..n - 1 {
        let p0 = points[i.saturating_sub(1)];
        let p1 = points[i];
        let p2 = points[i + 1];
        let p3 = points[(i + 2).min(n - 1)];
        for k in 0..subdivisions {
            let t = k as f32 / subdivisions as f32;
            out.push(catmull_rom(p0, p1, p2, p3, t));
        }
    }
    while out.len() > 1 && out.last().is_some_and(|p| p.distance(last) < tail_trim) {
        out.pop();
    }
    out.push(last);
    out
}
