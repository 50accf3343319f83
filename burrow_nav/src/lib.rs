// burrow_nav: navigation core for a grid-based colony simulation.
//
// This crate answers two questions about a mutable tile grid: "can an agent
// get from here to there" (cheap, answered from precomputed area links) and
// "what is the route" (A* on background threads, delivered on a later
// tick). It has no rendering, job-assignment, or save/load dependencies and
// can be tested and benchmarked headless.
//
// Module overview:
// - `types.rs`:        TileCoord, Point2, Direction, walkability enums, compact ids.
// - `config.rs`:       NavConfig: every tunable, loadable from JSON.
// - `tiles.rs`:        TileMap (terrain + placed objects) and the TileSource trait.
// - `node_graph.rs`:   Walkable-node graph with locally refreshed neighbor lists.
// - `pathfinding.rs`:  A* over a NodeGraph with octile heuristic.
// - `path.rs`:         Path value: waypoints, Catmull-Rom smoothing, consumer cursor.
// - `path_finder.rs`:  Request queue, worker pool, per-tick delivery of paths.
// - `link.rs`:         EdgeSpan / RegionLink / LinkCache shared by adjacent regions.
// - `region.rs`:       Chunk-bounded flood-fill regions and their links.
// - `area.rs`:         Rooms: area tiles grouped between walls and doors.
// - `reachability.rs`: O(1) reachability over area links.
// - `event.rs`:        NavEvent notifications drained once per tick.
// - `world.rs`:        NavWorld: owns everything, runs the mutation pipeline and tick.
//
// **Critical constraint: determinism.** Given the same config and the same
// sequence of edits, regions, areas, and search results are identical. Maps
// that are iterated use `BTree*` collections; the one hash map (the span
// link cache) is only ever looked up by key. Only completion order of
// background searches varies between runs.

pub mod area;
pub mod config;
pub mod event;
pub mod link;
pub mod node_graph;
pub mod path;
pub mod path_finder;
pub mod pathfinding;
pub mod reachability;
pub mod region;
pub mod tiles;
pub mod types;
pub mod world;

pub use config::NavConfig;
pub use path::Path;
pub use tiles::TileMap;
pub use types::{ObjectKind, Terrain, TileCoord};
pub use world::{NavWorld, TickResult};
