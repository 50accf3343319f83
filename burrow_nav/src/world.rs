// The navigation world: explicit owner of every navigation structure.
//
// `NavWorld` holds the tile map, the node graph, the region and area maps,
// the background path finder, and the pending event queue. Nothing in the
// crate is global; tests and tools can run as many independent worlds as
// they like.
//
// ## Mutation pipeline
//
// `place_object`, `remove_object`, and `set_terrain` write the tile and then
// run, synchronously and in this order:
//
//   1. `NodeGraph::update_region` over the 3×3 neighborhood of the tile,
//      through `Arc::make_mut` so in-flight searches keep their snapshot;
//   2. `RegionMap::update(tile)`;
//   3. `AreaMap::check_for_area(tile)` then `compute_area_links()`;
//   4. copy area ids onto regions (`RegionMap::assign_areas`);
//   5. push `GraphUpdated`, `RegionsUpdated`, `AreasUpdated`.
//
// Steps 2 to 4 are skipped when the edit leaves the tile's enterability
// and room-enclosing status unchanged (e.g. ground turning to rough), since
// only movement costs moved. By the time a mutation returns, every query
// sees the new state; there is no pending-rebuild window.
//
// ## Tick
//
// `tick()` lets the path finder admit queued searches and deliver finished
// ones, then hands back the completed request ids and the drained events as
// a `TickResult`.
//
// See also: `path_finder.rs` for request handling, `reachability.rs` for the
// query functions wrapped here, `event.rs` for notifications.
//
// **Critical constraint: single writer.** Mutations take `&mut self` and run
// to completion before returning. Background searches only ever see an
// immutable `Arc<NodeGraph>` snapshot.

use crate::area::AreaMap;
use crate::config::NavConfig;
use crate::event::{EventQueue, NavEvent, NavEventKind};
use crate::node_graph::NodeGraph;
use crate::path::Path;
use crate::path_finder::PathFinder;
use crate::reachability;
use crate::region::RegionMap;
use crate::tiles::{TileMap, TileSource};
use crate::types::{AreaId, Enterability, ObjectKind, RegionId, RequestId, Terrain, TileCoord};
use std::sync::Arc;

/// Output of one `tick()`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickResult {
    /// Tick number after this call.
    pub tick: u64,
    /// Requests whose callbacks ran during this tick.
    pub completed: Vec<RequestId>,
    /// Notifications raised since the previous drain.
    pub events: Vec<NavEvent>,
}

/// Owner of all navigation state for one map.
pub struct NavWorld {
    config: NavConfig,
    tiles: TileMap,
    graph: Arc<NodeGraph>,
    regions: RegionMap,
    areas: AreaMap,
    path_finder: PathFinder,
    events: EventQueue,
    tick: u64,
}

impl NavWorld {
    /// Build every structure for `tiles`. Fails on an invalid config or if
    /// the search pool cannot start.
    pub fn new(config: NavConfig, tiles: TileMap) -> Result<Self, String> {
        config.validate()?;
        let path_finder =
            PathFinder::new(&config).map_err(|e| format!("failed to start search pool: {e}"))?;

        let graph = Arc::new(NodeGraph::build(&tiles));
        let mut regions = RegionMap::new(tiles.dims(), config.chunk_size);
        regions.build_regions(&tiles);
        let mut areas = AreaMap::new(tiles.dims());
        areas.build_areas(&tiles);
        regions.assign_areas(|t| areas.area_at(t));

        log::debug!(
            "nav world {}x{}: {} regions, {} areas",
            tiles.width(),
            tiles.height(),
            regions.region_count(),
            areas.area_count()
        );
        Ok(Self {
            config,
            tiles,
            graph,
            regions,
            areas,
            path_finder,
            events: EventQueue::new(),
            tick: 0,
        })
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Place (or replace) the object on `tile`. Returns false if the tile is
    /// out of bounds or already holds that object.
    pub fn place_object(&mut self, tile: TileCoord, kind: ObjectKind) -> bool {
        self.edit(tile, |tiles| tiles.set_object(tile, Some(kind)))
    }

    /// Clear the object on `tile`. Returns false if there was none.
    pub fn remove_object(&mut self, tile: TileCoord) -> bool {
        self.edit(tile, |tiles| tiles.set_object(tile, None))
    }

    /// Change the terrain under `tile`. Returns false if the tile is out of
    /// bounds or already has that terrain; nothing is rebuilt in that case.
    pub fn set_terrain(&mut self, tile: TileCoord, terrain: Terrain) -> bool {
        self.edit(tile, |tiles| tiles.set_terrain(tile, terrain))
    }

    fn edit(&mut self, tile: TileCoord, write: impl FnOnce(&mut TileMap) -> bool) -> bool {
        if !self.tiles.in_bounds(tile) {
            log::warn!("ignoring edit of out-of-bounds tile {tile}");
            return false;
        }
        let before = self.nav_signature(tile);
        if !write(&mut self.tiles) {
            return false;
        }
        let topology_changed = self.nav_signature(tile) != before;
        self.refresh(tile, topology_changed);
        true
    }

    /// The parts of a tile that regions and areas depend on.
    fn nav_signature(&self, tile: TileCoord) -> (Enterability, bool) {
        (self.tiles.enterability(tile), self.tiles.encloses_room(tile))
    }

    fn refresh(&mut self, tile: TileCoord, topology_changed: bool) {
        let graph = Arc::make_mut(&mut self.graph);
        if let Some(change) =
            graph.update_region(&self.tiles, tile.offset(-1, -1), tile.offset(1, 1))
        {
            self.events.push(NavEventKind::GraphUpdated {
                min: change.min,
                max: change.max,
            });
        }
        if !topology_changed {
            return;
        }

        self.regions.update(&self.tiles, tile);
        self.areas.check_for_area(&self.tiles, tile);
        self.areas.compute_area_links(&self.tiles);
        let areas = &self.areas;
        self.regions.assign_areas(|t| areas.area_at(t));

        self.events.push(NavEventKind::RegionsUpdated);
        self.events.push(NavEventKind::AreasUpdated);
    }

    // -----------------------------------------------------------------------
    // Paths and ticking
    // -----------------------------------------------------------------------

    /// Ask for a route from `start` to `end`. The callback runs immediately
    /// with an invalid path if `end` can never be reached, otherwise during a
    /// later `tick()`.
    pub fn request_path(
        &mut self,
        start: TileCoord,
        end: TileCoord,
        exclude_start: bool,
        callback: impl FnOnce(Path) + 'static,
    ) -> RequestId {
        self.path_finder
            .request(&self.graph, start, end, Box::new(callback), exclude_start)
    }

    /// Forget a pending request; its callback will never run.
    pub fn cancel_path(&mut self, id: RequestId) -> bool {
        self.path_finder.cancel(id)
    }

    /// Advance one tick: admit and deliver path searches, drain events.
    pub fn tick(&mut self) -> TickResult {
        self.tick += 1;
        let completed = self.path_finder.process(&self.graph);
        TickResult {
            tick: self.tick,
            completed,
            events: self.events.drain(),
        }
    }

    /// Block until every outstanding search has called back.
    pub fn flush_paths(&mut self) -> Vec<RequestId> {
        self.path_finder.flush(&self.graph)
    }

    pub fn drain_events(&mut self) -> Vec<NavEvent> {
        self.events.drain()
    }

    pub fn pending_paths(&self) -> usize {
        self.path_finder.pending()
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn can_reach_tiles(&self, a: TileCoord, b: TileCoord) -> bool {
        reachability::can_reach_tiles(&self.tiles, &self.areas, a, b)
    }

    pub fn can_reach_regions(&self, a: RegionId, b: RegionId) -> bool {
        reachability::can_reach(&self.regions, &self.areas, a, b)
    }

    pub fn region_at(&self, tile: TileCoord) -> Option<RegionId> {
        self.regions.region_at(tile)
    }

    pub fn area_at(&self, tile: TileCoord) -> Option<AreaId> {
        self.areas.area_at(tile)
    }

    pub fn region_count(&self) -> usize {
        self.regions.region_count()
    }

    pub fn area_count(&self) -> usize {
        self.areas.area_count()
    }

    pub fn config(&self) -> &NavConfig {
        &self.config
    }

    pub fn tiles(&self) -> &TileMap {
        &self.tiles
    }

    pub fn graph(&self) -> &NodeGraph {
        &self.graph
    }

    /// A shared handle to the current graph, stable across later edits.
    pub fn graph_snapshot(&self) -> Arc<NodeGraph> {
        Arc::clone(&self.graph)
    }

    pub fn regions(&self) -> &RegionMap {
        &self.regions
    }

    pub fn areas(&self) -> &AreaMap {
        &self.areas
    }

    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Check region, area, and region↔area consistency.
    pub fn verify(&self) -> Result<(), String> {
        self.regions.verify(&self.tiles)?;
        self.areas.verify(&self.tiles)?;
        for id in self.regions.region_ids() {
            let Some(region) = self.regions.region(id) else {
                continue;
            };
            for &tile in region.tiles() {
                let expected = if region.is_door {
                    None
                } else {
                    self.areas.area_at(tile)
                };
                if region.area != expected {
                    return Err(format!(
                        "{id} has area {:?} but its tile {tile} has {expected:?}",
                        region.area
                    ));
                }
            }
        }
        Ok(())
    }
}
