// A* pathfinding over the node graph.
//
// Implements standard A* using a `BinaryHeap` (min-heap via reversed
// ordering) for the open set and a `Vec<bool>` closed set. Scores and
// parent links live in `Vec`s indexed by `NodeId` for O(1) access and
// deterministic behavior.
//
// Costs are fixed-point: an orthogonal step costs `straight_cost` (10 by
// default) and a diagonal step `diagonal_cost` (14), each scaled by the
// movement multiplier of the node being entered. The heuristic is octile
// distance, `diagonal * min(dx, dy) + straight * |dx - dy|`, which never
// overestimates because every multiplier is ≥ 1.0.
//
// Diagonal legality (no corner cutting) is already encoded in the node
// neighbor lists; the search never re-checks it.
//
// This is a pure function of a graph snapshot. `path_finder.rs` runs it on
// worker threads against an `Arc<NodeGraph>`.
//
// See also: `node_graph.rs` for the graph being searched, `path.rs` for the
// `Path` built from the returned node chain.
//
// **Critical constraint: determinism.** Ties in `f` are broken by `g`
// (deeper first) and then by node id, so the same graph always yields the
// same route.

use crate::config::NavConfig;
use crate::node_graph::NodeGraph;
use crate::types::{NodeId, TileCoord};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Step costs and heuristic weights for one search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StepCosts {
    pub straight: u32,
    pub diagonal: u32,
}

impl StepCosts {
    pub fn from_config(config: &NavConfig) -> Self {
        Self {
            straight: config.straight_cost,
            diagonal: config.diagonal_cost,
        }
    }

    /// Octile distance between two tiles in fixed-point units.
    pub fn octile(&self, a: TileCoord, b: TileCoord) -> f32 {
        let dx = (a.x - b.x).unsigned_abs();
        let dy = (a.y - b.y).unsigned_abs();
        (self.diagonal * dx.min(dy) + self.straight * dx.abs_diff(dy)) as f32
    }
}

impl Default for StepCosts {
    fn default() -> Self {
        Self::from_config(&NavConfig::default())
    }
}

/// The node chain of a successful search.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchResult {
    /// Nodes from start to goal, both inclusive.
    pub nodes: Vec<NodeId>,
    /// Total fixed-point cost of the route.
    pub total_cost: f32,
    /// Nodes popped from the open set.
    pub expanded: usize,
}

/// Entry in the A* open set (min-heap via reversed ordering).
struct OpenEntry {
    node: NodeId,
    f_score: f32,
    g_score: f32,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenEntry {}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Smallest f is "greatest"; on ties prefer the larger g, then the
        // smaller id.
        other
            .f_score
            .total_cmp(&self.f_score)
            .then_with(|| self.g_score.total_cmp(&other.g_score))
            .then_with(|| other.node.cmp(&self.node))
    }
}

/// Find the cheapest route from `start` to `goal`.
///
/// Returns `None` when either endpoint is not pathable or the open set is
/// exhausted without reaching the goal.
pub fn astar(
    graph: &NodeGraph,
    start: NodeId,
    goal: NodeId,
    costs: StepCosts,
) -> Option<SearchResult> {
    let n = graph.node_count();
    if start.index() >= n || goal.index() >= n {
        return None;
    }
    if !graph.node(start).pathable || !graph.node(goal).pathable {
        return None;
    }
    if start == goal {
        return Some(SearchResult {
            nodes: vec![start],
            total_cost: 0.0,
            expanded: 0,
        });
    }

    let goal_coord = graph.node(goal).coord;
    let mut g_score = vec![f32::INFINITY; n];
    let mut came_from: Vec<Option<NodeId>> = vec![None; n];
    let mut closed = vec![false; n];
    let mut expanded = 0;

    g_score[start.index()] = 0.0;
    let mut open = BinaryHeap::new();
    open.push(OpenEntry {
        node: start,
        f_score: costs.octile(graph.node(start).coord, goal_coord),
        g_score: 0.0,
    });

    while let Some(current) = open.pop() {
        let ci = current.node.index();
        if closed[ci] {
            continue;
        }
        if current.node == goal {
            return Some(SearchResult {
                nodes: reconstruct_path(&came_from, start, goal),
                total_cost: g_score[ci],
                expanded,
            });
        }
        closed[ci] = true;
        expanded += 1;

        let here = graph.node(current.node);
        let current_g = g_score[ci];
        for &neighbor in here.neighbors() {
            let ni = neighbor.index();
            if closed[ni] {
                continue;
            }
            let next = graph.node(neighbor);
            let diagonal = next.coord.x != here.coord.x && next.coord.y != here.coord.y;
            let base = if diagonal { costs.diagonal } else { costs.straight };
            let tentative_g = current_g + base as f32 * next.movement_multiplier;

            if tentative_g < g_score[ni] {
                g_score[ni] = tentative_g;
                came_from[ni] = Some(current.node);
                open.push(OpenEntry {
                    node: neighbor,
                    f_score: tentative_g + costs.octile(next.coord, goal_coord),
                    g_score: tentative_g,
                });
            }
        }
    }

    None
}

/// Walk parent links back from the goal and reverse into start→goal order.
fn reconstruct_path(came_from: &[Option<NodeId>], start: NodeId, goal: NodeId) -> Vec<NodeId> {
    let mut nodes = vec![goal];
    let mut current = goal;
    while current != start {
        match came_from[current.index()] {
            Some(prev) => {
                nodes.push(prev);
                current = prev;
            }
            None => break,
        }
    }
    nodes.reverse();
    nodes
}
