// Area decomposition: rooms and the doors between them.
//
// An `Area` is a maximal 4-connected set of area tiles: walkable tiles that
// hold no room-enclosing object (see `Tile::is_area_tile`). Walls and doors
// are therefore never inside an area; doors instead connect the areas on
// either side of them through `compute_area_links`. Because region floods
// only join walkable non-door tiles, every non-door region lies inside
// exactly one area and copies its id (`RegionMap::assign_areas`).
//
// Areas are maintained incrementally. `check_for_area(tile)` runs after a
// tile's object or terrain changes and handles four cases:
// - the tile had an area and is no longer an area tile: detach it, and if
//   it looks like it may have cut the area in two, flood from each of its
//   former neighbors to split off the disconnected parts;
// - the tile had no area and now is an area tile: join the largest
//   neighboring area and absorb the other neighboring areas into it, or
//   flood a new area if no neighbor has one;
// - otherwise nothing changes.
//
// "May have cut" means at least two of the four cardinal neighbors are
// barriers (map edge or non-area tile), or the eight tiles around it show
// its remaining cardinal neighbors are not connected to each other locally.
// The split flood stops as soon as one side covers the whole remaining area.
//
// `compute_area_links` rebuilds connectivity from scratch: every area links
// to itself, each door links the areas found beyond it on both axes, and
// the links are closed transitively so `are_linked` is a set lookup.
//
// See also: `region.rs` for the finer region layer, `reachability.rs` for
// the queries built on area links, `world.rs` for the mutation pipeline.
//
// **Critical constraint: components.** After every `check_for_area`, the
// areas are exactly the 4-connected components of area tiles, as a full
// `build_areas` would produce (up to id assignment).

use crate::tiles::{GridDims, TileMap};
use crate::types::{AreaId, Direction, TileCoord};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// Ring around a tile, in order, so consecutive entries are 4-adjacent:
/// N, NE, E, SE, S, SW, W, NW.
const RING: [(i32, i32); 8] = [
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
];

/// A room: a connected set of area tiles.
#[derive(Clone, Debug)]
pub struct Area {
    pub id: AreaId,
    tiles: BTreeSet<TileCoord>,
    /// Areas reachable from this one through doors, including itself.
    linked: BTreeSet<AreaId>,
}

impl Area {
    pub fn tiles(&self) -> &BTreeSet<TileCoord> {
        &self.tiles
    }

    pub fn linked(&self) -> &BTreeSet<AreaId> {
        &self.linked
    }
}

/// What a `check_for_area` call did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AreaChange {
    Unchanged,
    /// The tile left its area without splitting it.
    Detached { area: AreaId },
    /// The tile was the area's last tile; the area is gone.
    Removed { area: AreaId },
    /// The tile left `area` and the rest broke apart into `area` plus
    /// `created`.
    Split {
        area: AreaId,
        created: Vec<AreaId>,
    },
    /// The tile joined `area`, which absorbed the (now deleted) `absorbed`.
    Merged {
        area: AreaId,
        absorbed: Vec<AreaId>,
    },
    /// The tile started a fresh area.
    Created { area: AreaId },
}

/// All areas plus the tile→area index.
#[derive(Clone, Debug)]
pub struct AreaMap {
    dims: GridDims,
    areas: Vec<Option<Area>>,
    free: BTreeSet<u32>,
    tile_area: Vec<Option<AreaId>>,
}

impl AreaMap {
    pub fn new(dims: GridDims) -> Self {
        Self {
            dims,
            areas: Vec::new(),
            free: BTreeSet::new(),
            tile_area: vec![None; dims.len()],
        }
    }

    pub fn area_at(&self, tile: TileCoord) -> Option<AreaId> {
        self.dims.index(tile).and_then(|i| self.tile_area[i])
    }

    pub fn area(&self, id: AreaId) -> Option<&Area> {
        self.areas.get(id.index()).and_then(Option::as_ref)
    }

    /// Live area ids in ascending order.
    pub fn area_ids(&self) -> impl Iterator<Item = AreaId> + '_ {
        self.areas.iter().flatten().map(|a| a.id)
    }

    pub fn area_count(&self) -> usize {
        self.areas.iter().flatten().count()
    }

    /// Number of tiles in an area; 0 for a dead id.
    pub fn tile_count(&self, id: AreaId) -> usize {
        self.area(id).map_or(0, |a| a.tiles.len())
    }

    /// Whether agents can walk from area `a` to area `b`, possibly through
    /// doors.
    pub fn are_linked(&self, a: AreaId, b: AreaId) -> bool {
        a == b || self.area(a).is_some_and(|area| area.linked.contains(&b))
    }

    /// Flood every area tile into areas from scratch, then link them.
    pub fn build_areas(&mut self, map: &TileMap) {
        self.areas.clear();
        self.free.clear();
        self.tile_area = vec![None; self.dims.len()];
        for i in 0..self.dims.len() {
            let tile = self.dims.coord(i);
            if self.tile_area[i].is_none() && map.is_area_tile(tile) {
                let id = self.alloc_id();
                let tiles = self.flood_unassigned(map, tile, id);
                self.areas[id.index()] = Some(Area {
                    id,
                    tiles,
                    linked: BTreeSet::new(),
                });
            }
        }
        self.compute_area_links(map);
        log::debug!("built {} areas", self.area_count());
    }

    /// Bring the areas up to date after `tile` changed. Does not relink;
    /// call `compute_area_links` afterwards.
    pub fn check_for_area(&mut self, map: &TileMap, tile: TileCoord) -> AreaChange {
        if !self.dims.in_bounds(tile) {
            log::warn!("area check for out-of-bounds tile {tile}");
            return AreaChange::Unchanged;
        }
        let change = match (self.area_at(tile), map.is_area_tile(tile)) {
            (Some(area), false) => self.remove_tile(map, tile, area),
            (None, true) => self.add_tile(map, tile),
            _ => AreaChange::Unchanged,
        };
        if change != AreaChange::Unchanged {
            log::debug!("area check at {tile}: {change:?}");
        }
        change
    }

    /// Rebuild self-links, door links, and their transitive closure.
    pub fn compute_area_links(&mut self, map: &TileMap) {
        let mut direct: BTreeMap<AreaId, BTreeSet<AreaId>> =
            self.area_ids().map(|id| (id, BTreeSet::new())).collect();
        for door in map.doors() {
            for [a, b] in [
                [Direction::North, Direction::South],
                [Direction::East, Direction::West],
            ] {
                let x = self.area_beyond(map, door, a);
                let y = self.area_beyond(map, door, b);
                let (Some(x), Some(y)) = (x, y) else {
                    continue;
                };
                if x != y {
                    direct.entry(x).or_default().insert(y);
                    direct.entry(y).or_default().insert(x);
                }
            }
        }

        let mut visited = BTreeSet::new();
        let ids: Vec<AreaId> = direct.keys().copied().collect();
        for start in ids {
            if visited.contains(&start) {
                continue;
            }
            let mut component = BTreeSet::new();
            let mut stack = vec![start];
            while let Some(id) = stack.pop() {
                if !component.insert(id) {
                    continue;
                }
                if let Some(next) = direct.get(&id) {
                    stack.extend(next.iter().copied().filter(|n| !component.contains(n)));
                }
            }
            for &id in &component {
                visited.insert(id);
                if let Some(area) = self.areas[id.index()].as_mut() {
                    area.linked = component.clone();
                }
            }
        }
    }

    /// The area of the first non-door tile past `door` heading `dir`.
    fn area_beyond(&self, map: &TileMap, door: TileCoord, dir: Direction) -> Option<AreaId> {
        let mut tile = door.step(dir);
        while map.is_door(tile) {
            tile = tile.step(dir);
        }
        self.area_at(tile)
    }

    // -----------------------------------------------------------------------
    // Incremental cases
    // -----------------------------------------------------------------------

    fn remove_tile(&mut self, map: &TileMap, tile: TileCoord, area: AreaId) -> AreaChange {
        self.set_tile(tile, None);
        let Some(slot) = self.areas[area.index()].as_mut() else {
            return AreaChange::Unchanged;
        };
        slot.tiles.remove(&tile);
        if slot.tiles.is_empty() {
            self.delete_area(area);
            return AreaChange::Removed { area };
        }
        if !self.may_disconnect(map, tile) {
            return AreaChange::Detached { area };
        }
        self.split(tile, area)
    }

    fn add_tile(&mut self, map: &TileMap, tile: TileCoord) -> AreaChange {
        let neighbors: BTreeSet<AreaId> = Direction::ALL
            .iter()
            .filter_map(|&d| self.area_at(tile.step(d)))
            .collect();
        let Some(&largest) = neighbors
            .iter()
            .max_by_key(|&&id| (self.tile_count(id), std::cmp::Reverse(id)))
        else {
            let id = self.alloc_id();
            let tiles = self.flood_unassigned(map, tile, id);
            self.areas[id.index()] = Some(Area {
                id,
                tiles,
                linked: BTreeSet::new(),
            });
            return AreaChange::Created { area: id };
        };

        self.set_tile(tile, Some(largest));
        if let Some(area) = self.areas[largest.index()].as_mut() {
            area.tiles.insert(tile);
        }
        let absorbed: Vec<AreaId> = neighbors.into_iter().filter(|&id| id != largest).collect();
        for &other in &absorbed {
            let Some(gone) = self.areas[other.index()].take() else {
                continue;
            };
            for &t in &gone.tiles {
                self.set_tile(t, Some(largest));
            }
            if let Some(area) = self.areas[largest.index()].as_mut() {
                area.tiles.extend(gone.tiles);
            }
            self.free.insert(other.0);
        }
        AreaChange::Merged {
            area: largest,
            absorbed,
        }
    }

    /// Flood the rest of `area` from each former neighbor of `tile`. The
    /// biggest piece keeps the id; every other piece becomes a new area.
    fn split(&mut self, tile: TileCoord, area: AreaId) -> AreaChange {
        let remaining = self.tile_count(area);
        let seeds: Vec<TileCoord> = Direction::ALL
            .iter()
            .map(|&d| tile.step(d))
            .filter(|&t| self.area_at(t) == Some(area))
            .collect();

        let mut pieces: Vec<BTreeSet<TileCoord>> = Vec::new();
        for seed in seeds {
            if pieces.iter().any(|p| p.contains(&seed)) {
                continue;
            }
            let piece = self.flood_within(seed, area);
            if piece.len() == remaining {
                return AreaChange::Detached { area };
            }
            pieces.push(piece);
        }

        let Some(keep) = (0..pieces.len()).max_by_key(|&i| (pieces[i].len(), std::cmp::Reverse(i)))
        else {
            return AreaChange::Detached { area };
        };
        let mut created = Vec::new();
        for (i, piece) in pieces.into_iter().enumerate() {
            if i == keep {
                continue;
            }
            let id = self.alloc_id();
            for &t in &piece {
                self.set_tile(t, Some(id));
            }
            if let Some(old) = self.areas[area.index()].as_mut() {
                for t in &piece {
                    old.tiles.remove(t);
                }
            }
            self.areas[id.index()] = Some(Area {
                id,
                tiles: piece,
                linked: BTreeSet::new(),
            });
            created.push(id);
        }
        AreaChange::Split { area, created }
    }

    /// Whether removing `tile` might disconnect its area.
    fn may_disconnect(&self, map: &TileMap, tile: TileCoord) -> bool {
        let open: Vec<bool> = RING
            .iter()
            .map(|&(dx, dy)| map.is_area_tile(tile.offset(dx, dy)))
            .collect();
        let barriers = [0, 2, 4, 6].iter().filter(|&&i| !open[i]).count();
        if barriers >= 2 {
            return true;
        }
        // Label runs of open ring tiles, starting just after a closed one.
        let Some(closed) = open.iter().position(|&o| !o) else {
            return false;
        };
        let mut run = 0;
        let mut labels = [usize::MAX; 8];
        for k in 1..=8 {
            let i = (closed + k) % 8;
            if open[i] {
                labels[i] = run;
            } else {
                run += 1;
            }
        }
        let mut cardinal_runs = [0, 2, 4, 6]
            .iter()
            .filter(|&&i| open[i])
            .map(|&i| labels[i]);
        let first = cardinal_runs.next();
        cardinal_runs.any(|r| Some(r) != first)
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn alloc_id(&mut self) -> AreaId {
        match self.free.pop_first() {
            Some(slot) => AreaId(slot),
            None => {
                self.areas.push(None);
                AreaId((self.areas.len() - 1) as u32)
            }
        }
    }

    fn delete_area(&mut self, id: AreaId) {
        if self.areas[id.index()].take().is_some() {
            self.free.insert(id.0);
        }
    }

    fn set_tile(&mut self, tile: TileCoord, area: Option<AreaId>) {
        if let Some(i) = self.dims.index(tile) {
            self.tile_area[i] = area;
        }
    }

    /// Flood area tiles that have no area yet, assigning them to `id`.
    fn flood_unassigned(
        &mut self,
        map: &TileMap,
        seed: TileCoord,
        id: AreaId,
    ) -> BTreeSet<TileCoord> {
        let mut tiles = BTreeSet::new();
        let mut frontier = VecDeque::from([seed]);
        self.set_tile(seed, Some(id));
        while let Some(t) = frontier.pop_front() {
            tiles.insert(t);
            for dir in Direction::ALL {
                let next = t.step(dir);
                if map.is_area_tile(next) && self.area_at(next).is_none() {
                    self.set_tile(next, Some(id));
                    frontier.push_back(next);
                }
            }
        }
        tiles
    }

    /// Tiles of `area` 4-connected to `seed`.
    fn flood_within(&self, seed: TileCoord, area: AreaId) -> BTreeSet<TileCoord> {
        let mut seen = BTreeSet::from([seed]);
        let mut frontier = VecDeque::from([seed]);
        while let Some(t) = frontier.pop_front() {
            for dir in Direction::ALL {
                let next = t.step(dir);
                if self.area_at(next) == Some(area) && seen.insert(next) {
                    frontier.push_back(next);
                }
            }
        }
        seen
    }

    /// Check the tile index against `map` and the area tile sets.
    pub fn verify(&self, map: &TileMap) -> Result<(), String> {
        for i in 0..self.dims.len() {
            let tile = self.dims.coord(i);
            match (map.is_area_tile(tile), self.tile_area[i]) {
                (true, None) => return Err(format!("area tile {tile} has no area")),
                (false, Some(id)) => return Err(format!("non-area tile {tile} is in {id}")),
                (true, Some(id)) => {
                    let area = self
                        .area(id)
                        .ok_or_else(|| format!("{tile} points at dead {id}"))?;
                    if !area.tiles.contains(&tile) {
                        return Err(format!("{id} does not list {tile}"));
                    }
                    for dir in Direction::ALL {
                        if let Some(other) = self.area_at(tile.step(dir)) {
                            if other != id {
                                return Err(format!("{id} and {other} touch at {tile}"));
                            }
                        }
                    }
                }
                (false, None) => {}
            }
        }
        for area in self.areas.iter().flatten() {
            if area.tiles.is_empty() {
                return Err(format!("{} is empty", area.id));
            }
            if !area.linked.contains(&area.id) {
                return Err(format!("{} is not linked to itself", area.id));
            }
        }
        Ok(())
    }
}
