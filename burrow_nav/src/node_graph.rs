// Walkable-node graph mirroring the tile grid.
//
// `NodeGraph` holds one `Node` per tile in a dense `Vec` indexed by
// `NodeId` (= tile index, `x * height + y`). Each node caches its pathable
// flag, its movement multiplier, and the list of neighbor nodes an agent can
// step to: up to 4 orthogonal plus up to 4 diagonal. A diagonal step is only
// listed when both orthogonal tiles flanking it are pathable, so agents never
// cut through solid corners.
//
// The neighbor lists are recomputed locally: changing one node's flag
// refreshes that node and its (up to 8) surrounding nodes, never the whole
// graph. `update_region` re-reads a rectangle of flags from a live
// `TileSource` and returns the `GraphChange` the owner broadcasts as a
// `NavEvent::GraphUpdated`.
//
// Out-of-bounds coordinates are routine at grid edges: lookups return `None`
// and writes are no-ops.
//
// See also: `tiles.rs` for the `TileSource` the flags are derived from,
// `pathfinding.rs` for A* over this graph, `world.rs` which keeps the graph
// behind an `Arc` so in-flight searches read a stable snapshot.
//
// **Critical constraint: neighbor consistency.** After every mutation, each
// node's neighbor list matches the current pathable flags of itself and its
// surroundings. Any code path that flips a flag must go through
// `set_pathable` or `update_region`.

use crate::tiles::{GridDims, TileSource};
use crate::types::{NodeId, TileCoord};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Orthogonal offsets first, then diagonals, so neighbor lists have a stable
/// order: N, E, S, W, NE, SE, SW, NW.
const NEIGHBOR_OFFSETS: [(i32, i32); 8] = [
    (0, 1),
    (1, 0),
    (0, -1),
    (-1, 0),
    (1, 1),
    (1, -1),
    (-1, -1),
    (-1, 1),
];

/// One cell of the pathfinding grid.
#[derive(Clone, Debug)]
pub struct Node {
    pub id: NodeId,
    pub coord: TileCoord,
    pub pathable: bool,
    /// Multiplier (≥ 1.0) on the cost of stepping onto this node.
    pub movement_multiplier: f32,
    /// Nodes reachable in one step. Empty when this node is not pathable.
    neighbors: SmallVec<[NodeId; 8]>,
}

impl Node {
    pub fn neighbors(&self) -> &[NodeId] {
        &self.neighbors
    }
}

/// Inclusive rectangle of tiles whose node flags were re-derived.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphChange {
    pub min: TileCoord,
    pub max: TileCoord,
}

/// Dense node graph over the tile grid.
#[derive(Clone, Debug, Default)]
pub struct NodeGraph {
    nodes: Vec<Node>,
    dims: GridDims,
}

impl NodeGraph {
    /// Build every node from a walkability source and compute all neighbor
    /// lists once.
    pub fn build<S: TileSource>(source: &S) -> Self {
        let dims = source.dims();
        let nodes = (0..dims.len())
            .map(|i| {
                let coord = dims.coord(i);
                Node {
                    id: NodeId(i as u32),
                    coord,
                    pathable: source.is_walkable(coord),
                    movement_multiplier: source.movement_multiplier(coord),
                    neighbors: SmallVec::new(),
                }
            })
            .collect();
        let mut graph = Self { nodes, dims };
        for i in 0..graph.nodes.len() {
            graph.recompute_neighbors(i);
        }
        graph
    }

    pub fn dims(&self) -> GridDims {
        self.dims
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// The node at a coordinate. Returns `None` for out-of-bounds.
    pub fn get_node(&self, coord: TileCoord) -> Option<&Node> {
        self.dims.index(coord).map(|i| &self.nodes[i])
    }

    /// Node id for a coordinate, if in bounds.
    pub fn node_id(&self, coord: TileCoord) -> Option<NodeId> {
        self.dims.index(coord).map(|i| NodeId(i as u32))
    }

    /// Get a node by id. Ids must come from this graph.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    /// Pathable flag at a coordinate. False out of bounds.
    pub fn is_pathable(&self, coord: TileCoord) -> bool {
        self.get_node(coord).is_some_and(|n| n.pathable)
    }

    /// Update one node's pathable flag and refresh the neighbor lists of the
    /// node and everything around it. Returns `false` when out of bounds.
    pub fn set_pathable(&mut self, coord: TileCoord, pathable: bool) -> bool {
        let Some(i) = self.dims.index(coord) else {
            return false;
        };
        if self.nodes[i].pathable != pathable {
            self.nodes[i].pathable = pathable;
            self.ripple(coord);
        }
        true
    }

    /// Update one node's movement multiplier. Neighbor lists are unaffected.
    pub fn set_movement_multiplier(&mut self, coord: TileCoord, multiplier: f32) -> bool {
        match self.dims.index(coord) {
            Some(i) => {
                self.nodes[i].movement_multiplier = multiplier;
                true
            }
            None => false,
        }
    }

    /// Re-derive flags for the inclusive rectangle `min..=max` from the live
    /// tile source, then refresh neighbor lists one tile beyond it. The
    /// rectangle is clamped to the grid; returns `None` if nothing of it lies
    /// inside.
    pub fn update_region<S: TileSource>(
        &mut self,
        source: &S,
        min: TileCoord,
        max: TileCoord,
    ) -> Option<GraphChange> {
        let (w, h) = (self.dims.width as i32, self.dims.height as i32);
        let lo = TileCoord::new(min.x.min(max.x).max(0), min.y.min(max.y).max(0));
        let hi = TileCoord::new(max.x.max(min.x).min(w - 1), max.y.max(min.y).min(h - 1));
        if lo.x > hi.x || lo.y > hi.y {
            return None;
        }

        for x in lo.x..=hi.x {
            for y in lo.y..=hi.y {
                let coord = TileCoord::new(x, y);
                if let Some(i) = self.dims.index(coord) {
                    self.nodes[i].pathable = source.is_walkable(coord);
                    self.nodes[i].movement_multiplier = source.movement_multiplier(coord);
                }
            }
        }
        for x in (lo.x - 1)..=(hi.x + 1) {
            for y in (lo.y - 1)..=(hi.y + 1) {
                if let Some(i) = self.dims.index(TileCoord::new(x, y)) {
                    self.recompute_neighbors(i);
                }
            }
        }

        Some(GraphChange { min: lo, max: hi })
    }

    /// Refresh the node at `center` and its 8 surrounding nodes.
    fn ripple(&mut self, center: TileCoord) {
        for dx in -1..=1 {
            for dy in -1..=1 {
                if let Some(i) = self.dims.index(center.offset(dx, dy)) {
                    self.recompute_neighbors(i);
                }
            }
        }
    }

    fn recompute_neighbors(&mut self, i: usize) {
        let mut neighbors = SmallVec::new();
        if self.nodes[i].pathable {
            let coord = self.nodes[i].coord;
            for (dx, dy) in NEIGHBOR_OFFSETS {
                let target = coord.offset(dx, dy);
                let Some(ti) = self.dims.index(target) else {
                    continue;
                };
                if !self.nodes[ti].pathable {
                    continue;
                }
                let diagonal = dx != 0 && dy != 0;
                if diagonal
                    && !(self.is_pathable(coord.offset(dx, 0))
                        && self.is_pathable(coord.offset(0, dy)))
                {
                    continue;
                }
                neighbors.push(NodeId(ti as u32));
            }
        }
        self.nodes[i].neighbors = neighbors;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiles::TileMap;
    use crate::types::ObjectKind;

    fn open_graph(w: u32, h: u32) -> (TileMap, NodeGraph) {
        let map = TileMap::new(w, h);
        let graph = NodeGraph::build(&map);
        (map, graph)
    }

    fn neighbor_coords(graph: &NodeGraph, coord: TileCoord) -> Vec<TileCoord> {
        let mut v: Vec<TileCoord> = graph
            .get_node(coord)
            .unwrap()
            .neighbors()
            .iter()
            .map(|&id| graph.node(id).coord)
            .collect();
        v.sort();
        v
    }

    /// Every neighbor list must equal a from-scratch rebuild.
    fn assert_consistent(map: &TileMap, graph: &NodeGraph) {
        let fresh = NodeGraph::build(map);
        for i in 0..graph.node_count() {
            let id = NodeId(i as u32);
            assert_eq!(
                graph.node(id).neighbors(),
                fresh.node(id).neighbors(),
                "stale neighbors at {}",
                graph.node(id).coord
            );
            assert_eq!(graph.node(id).pathable, fresh.node(id).pathable);
        }
    }

    #[test]
    fn open_grid_neighbor_counts() {
        let (_, graph) = open_graph(5, 5);
        assert_eq!(graph.get_node(TileCoord::new(0, 0)).unwrap().neighbors().len(), 3);
        assert_eq!(graph.get_node(TileCoord::new(2, 0)).unwrap().neighbors().len(), 5);
        assert_eq!(graph.get_node(TileCoord::new(2, 2)).unwrap().neighbors().len(), 8);
    }

    #[test]
    fn node_id_matches_tile_index() {
        let (map, graph) = open_graph(6, 4);
        for x in 0..6 {
            for y in 0..4 {
                let c = TileCoord::new(x, y);
                let node = graph.get_node(c).unwrap();
                assert_eq!(Some(node.id.index()), map.dims().index(c));
                assert_eq!(node.coord, c);
            }
        }
    }

    #[test]
    fn out_of_bounds_access_returns_none() {
        let (_, mut graph) = open_graph(4, 4);
        assert!(graph.get_node(TileCoord::new(-1, 0)).is_none());
        assert!(graph.get_node(TileCoord::new(0, 4)).is_none());
        assert!(graph.node_id(TileCoord::new(4, 4)).is_none());
        assert!(!graph.is_pathable(TileCoord::new(99, -3)));
        assert!(!graph.set_pathable(TileCoord::new(-5, 1), false));
    }

    #[test]
    fn diagonal_blocked_by_one_flanking_wall() {
        let mut map = TileMap::new(3, 3);
        map.set_object(TileCoord::new(1, 0), Some(ObjectKind::Wall));
        let graph = NodeGraph::build(&map);
        let n = neighbor_coords(&graph, TileCoord::new(0, 0));
        // (1,1) is diagonal past the wall at (1,0): forbidden.
        assert_eq!(n, vec![TileCoord::new(0, 1)]);
    }

    #[test]
    fn non_pathable_node_has_no_neighbors_and_is_not_listed() {
        let mut map = TileMap::new(3, 3);
        map.set_object(TileCoord::new(1, 1), Some(ObjectKind::Wall));
        let graph = NodeGraph::build(&map);
        assert!(graph.get_node(TileCoord::new(1, 1)).unwrap().neighbors().is_empty());
        for id in graph.get_node(TileCoord::new(0, 1)).unwrap().neighbors() {
            assert_ne!(graph.node(*id).coord, TileCoord::new(1, 1));
        }
    }

    #[test]
    fn set_pathable_ripples_to_neighbors() {
        let (mut map, mut graph) = open_graph(5, 5);
        let c = TileCoord::new(2, 2);
        map.set_object(c, Some(ObjectKind::Wall));
        assert!(graph.set_pathable(c, false));
        assert_consistent(&map, &graph);

        map.set_object(c, None);
        graph.set_pathable(c, true);
        assert_consistent(&map, &graph);
    }

    #[test]
    fn update_region_rederives_flags_and_reports_clamped_rect() {
        let (mut map, mut graph) = open_graph(6, 6);
        for x in 0..6 {
            map.set_object(TileCoord::new(x, 3), Some(ObjectKind::Wall));
        }
        let change = graph
            .update_region(&map, TileCoord::new(-2, 3), TileCoord::new(10, 3))
            .unwrap();
        assert_eq!(change.min, TileCoord::new(0, 3));
        assert_eq!(change.max, TileCoord::new(5, 3));
        assert_consistent(&map, &graph);
        assert!(!graph.is_pathable(TileCoord::new(4, 3)));
    }

    #[test]
    fn update_region_entirely_outside_is_none() {
        let (map, mut graph) = open_graph(3, 3);
        assert!(
            graph
                .update_region(&map, TileCoord::new(5, 5), TileCoord::new(7, 9))
                .is_none()
        );
    }

    #[test]
    fn random_edits_keep_neighbors_consistent() {
        let mut rng = fastrand::Rng::with_seed(7);
        let (mut map, mut graph) = open_graph(12, 9);
        for _ in 0..300 {
            let c = TileCoord::new(rng.i32(0..12), rng.i32(0..9));
            let wall = rng.bool();
            map.set_object(c, wall.then_some(ObjectKind::Wall));
            graph.set_pathable(c, !wall);
        }
        assert_consistent(&map, &graph);
    }
}
