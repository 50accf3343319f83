// Region decomposition: small flood-filled reachability compartments.
//
// The grid is cut into square chunks of `chunk_size` tiles. Within each
// chunk, every walkable tile is flood-filled (4-connected) into a `Region`;
// the flood never leaves its chunk, which bounds the cost of rebuilding
// after an edit. Door tiles are never flooded together with anything: each
// door is its own single-tile region.
//
// After flooding, `build_links` walks each region's border. A crossing from
// a region tile into a tile of a different region is recorded in the
// region's boundary map under its direction. Door tiles only grant access
// along their bridging axis (see `TileMap::door_bridge`), and the rule is
// applied from both sides so the two regions always agree. Crossings are
// then grouped into contiguous runs and registered as `EdgeSpan`s in the
// shared `LinkCache`.
//
// `update(tile)` deletes every region in the tile's chunk and its four
// cardinal neighbor chunks, re-floods those chunks, and rebuilds links for
// the new regions plus any surviving region that bordered a deleted one.
// Ids of deleted regions go to a free list and are reused lowest first, so
// an update that changes nothing reproduces the same ids.
//
// See also: `link.rs` for span canonicalization and the link cache,
// `area.rs` for the coarser area layer, `world.rs` which runs `update` as
// part of the tile mutation pipeline.
//
// **Critical constraint: partition.** After `build_regions` or any `update`,
// every walkable tile belongs to exactly one region, every region has at
// least one tile, and no region spans two chunks.

use crate::link::{EdgeSpan, LinkCache, SpanKey};
use crate::tiles::{GridDims, TileMap, TileSource};
use crate::types::{AreaId, Direction, RegionId, TileCoord};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};

/// Position of a chunk in chunk units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkCoord {
    pub x: i32,
    pub y: i32,
}

/// One flood-filled compartment.
#[derive(Clone, Debug)]
pub struct Region {
    pub id: RegionId,
    pub chunk: ChunkCoord,
    /// Door regions are always exactly one tile.
    pub is_door: bool,
    /// Mirrors the area of the region's tiles. Always `None` for doors.
    pub area: Option<AreaId>,
    tiles: Vec<TileCoord>,
    /// Neighbor tiles that grant entry to another region, per direction.
    boundary: [Vec<TileCoord>; 4],
    links: Vec<SpanKey>,
}

impl Region {
    /// Member tiles in flood order.
    pub fn tiles(&self) -> &[TileCoord] {
        &self.tiles
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    pub fn boundary(&self, direction: Direction) -> &[TileCoord] {
        &self.boundary[direction.as_index()]
    }

    pub fn links(&self) -> &[SpanKey] {
        &self.links
    }
}

/// All regions of the grid, plus the tile→region index and the link cache.
#[derive(Clone, Debug)]
pub struct RegionMap {
    dims: GridDims,
    chunk_size: u32,
    regions: Vec<Option<Region>>,
    free: BTreeSet<u32>,
    tile_region: Vec<Option<RegionId>>,
    links: LinkCache,
}

/// A crossing from a region tile into another region, in canonical form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct Crossing {
    /// West (East-axis) or south (North-axis) tile of the crossing.
    root: TileCoord,
    other: RegionId,
    /// Whether the region being linked sits on the root side.
    on_root_side: bool,
}

impl RegionMap {
    /// An empty map. Call `build_regions` before querying.
    pub fn new(dims: GridDims, chunk_size: u32) -> Self {
        Self {
            dims,
            chunk_size: chunk_size.max(1),
            regions: Vec::new(),
            free: BTreeSet::new(),
            tile_region: vec![None; dims.len()],
            links: LinkCache::new(),
        }
    }

    pub fn dims(&self) -> GridDims {
        self.dims
    }

    pub fn chunk_size(&self) -> u32 {
        self.chunk_size
    }

    /// Chunks along X and Y.
    pub fn chunk_counts(&self) -> (i32, i32) {
        let cs = self.chunk_size;
        (
            self.dims.width.div_ceil(cs) as i32,
            self.dims.height.div_ceil(cs) as i32,
        )
    }

    pub fn chunk_of(&self, tile: TileCoord) -> ChunkCoord {
        let cs = self.chunk_size as i32;
        ChunkCoord {
            x: tile.x.div_euclid(cs),
            y: tile.y.div_euclid(cs),
        }
    }

    fn chunk_exists(&self, chunk: ChunkCoord) -> bool {
        let (nx, ny) = self.chunk_counts();
        (0..nx).contains(&chunk.x) && (0..ny).contains(&chunk.y)
    }

    /// Inclusive tile bounds of a chunk, clipped to the grid.
    fn chunk_bounds(&self, chunk: ChunkCoord) -> (TileCoord, TileCoord) {
        let cs = self.chunk_size as i32;
        let lo = TileCoord::new(chunk.x * cs, chunk.y * cs);
        let hi = TileCoord::new(
            (lo.x + cs - 1).min(self.dims.width as i32 - 1),
            (lo.y + cs - 1).min(self.dims.height as i32 - 1),
        );
        (lo, hi)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// The region owning `tile`, or `None` for unwalkable or out-of-bounds
    /// tiles.
    pub fn region_at(&self, tile: TileCoord) -> Option<RegionId> {
        self.dims.index(tile).and_then(|i| self.tile_region[i])
    }

    pub fn region(&self, id: RegionId) -> Option<&Region> {
        self.regions.get(id.index()).and_then(Option::as_ref)
    }

    /// Live region ids in ascending order.
    pub fn region_ids(&self) -> impl Iterator<Item = RegionId> + '_ {
        self.regions.iter().flatten().map(|r| r.id)
    }

    pub fn region_count(&self) -> usize {
        self.regions.iter().flatten().count()
    }

    /// Tiles of a region; empty for a dead id.
    pub fn tiles_of(&self, id: RegionId) -> &[TileCoord] {
        self.region(id).map_or(&[], |r| r.tiles())
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn links(&self) -> &LinkCache {
        &self.links
    }

    /// Regions sharing at least one link with `id`, ascending.
    pub fn neighbors(&self, id: RegionId) -> Vec<RegionId> {
        let Some(region) = self.region(id) else {
            return Vec::new();
        };
        let set: BTreeSet<RegionId> = region
            .links
            .iter()
            .filter_map(|&key| self.links.get(key))
            .filter_map(|link| link.other(id))
            .collect();
        set.into_iter().collect()
    }

    // -----------------------------------------------------------------------
    // Rebuilds
    // -----------------------------------------------------------------------

    /// Discard everything and flood every chunk, then link all regions.
    pub fn build_regions(&mut self, map: &TileMap) {
        self.regions.clear();
        self.free.clear();
        self.tile_region = vec![None; self.dims.len()];
        self.links.clear();

        let (nx, ny) = self.chunk_counts();
        let mut created = Vec::new();
        for x in 0..nx {
            for y in 0..ny {
                self.flood_chunk(map, ChunkCoord { x, y }, &mut created);
            }
        }
        self.build_links(map, &created);
        log::debug!(
            "built {} regions in {} chunks with {} links",
            created.len(),
            nx * ny,
            self.links.len()
        );
    }

    /// Rebuild the regions around `tile` after its walkability changed.
    /// Returns the ids of the regions created. Out-of-bounds tiles are
    /// ignored.
    pub fn update(&mut self, map: &TileMap, tile: TileCoord) -> Vec<RegionId> {
        if !self.dims.in_bounds(tile) {
            log::warn!("region update for out-of-bounds tile {tile}");
            return Vec::new();
        }
        let center = self.chunk_of(tile);
        let chunks: BTreeSet<ChunkCoord> = std::iter::once(center)
            .chain(Direction::ALL.iter().map(|d| {
                let (dx, dy) = d.offset();
                ChunkCoord {
                    x: center.x + dx,
                    y: center.y + dy,
                }
            }))
            .filter(|&c| self.chunk_exists(c))
            .collect();

        let mut doomed = BTreeSet::new();
        for &chunk in &chunks {
            let (lo, hi) = self.chunk_bounds(chunk);
            for x in lo.x..=hi.x {
                for y in lo.y..=hi.y {
                    if let Some(id) = self.region_at(TileCoord::new(x, y)) {
                        doomed.insert(id);
                    }
                }
            }
        }

        // Surviving regions touching the rebuilt chunks may gain or lose
        // crossings (a door's bridge axis can flip), so they relink too.
        let mut bordering = BTreeSet::new();
        for &chunk in &chunks {
            let (lo, hi) = self.chunk_bounds(chunk);
            for x in lo.x..=hi.x {
                for y in lo.y..=hi.y {
                    for dir in Direction::ALL {
                        let Some(n) = self.region_at(TileCoord::new(x, y).step(dir)) else {
                            continue;
                        };
                        if !doomed.contains(&n) {
                            bordering.insert(n);
                        }
                    }
                }
            }
        }

        for &id in &doomed {
            self.delete_region(id);
        }
        for &id in &bordering {
            self.clear_links(id);
        }

        let mut created = Vec::new();
        for &chunk in &chunks {
            self.flood_chunk(map, chunk, &mut created);
        }
        let relink: Vec<RegionId> = created.iter().chain(bordering.iter()).copied().collect();
        self.build_links(map, &relink);

        log::debug!(
            "region update at {tile}: {} chunks, {} regions replaced by {}, {} neighbors relinked",
            chunks.len(),
            doomed.len(),
            created.len(),
            bordering.len()
        );
        created
    }

    /// Copy each non-door region's area from the area of its first tile.
    pub fn assign_areas(&mut self, area_of: impl Fn(TileCoord) -> Option<AreaId>) {
        for region in self.regions.iter_mut().flatten() {
            region.area = if region.is_door {
                None
            } else {
                region.tiles.first().and_then(|&t| area_of(t))
            };
        }
    }

    fn alloc_id(&mut self) -> RegionId {
        match self.free.pop_first() {
            Some(slot) => RegionId(slot),
            None => {
                self.regions.push(None);
                RegionId((self.regions.len() - 1) as u32)
            }
        }
    }

    fn delete_region(&mut self, id: RegionId) {
        let Some(region) = self.regions.get_mut(id.index()).and_then(Option::take) else {
            return;
        };
        for tile in &region.tiles {
            if let Some(i) = self.dims.index(*tile) {
                if self.tile_region[i] == Some(id) {
                    self.tile_region[i] = None;
                }
            }
        }
        for key in region.links {
            self.links.detach(key, id);
        }
        self.free.insert(id.0);
    }

    fn clear_links(&mut self, id: RegionId) {
        let Some(region) = self.regions.get_mut(id.index()).and_then(Option::as_mut) else {
            return;
        };
        let keys = std::mem::take(&mut region.links);
        region.boundary = Default::default();
        for key in keys {
            self.links.detach(key, id);
        }
    }

    /// Flood every unassigned walkable tile of `chunk` into new regions, in
    /// tile order.
    fn flood_chunk(&mut self, map: &TileMap, chunk: ChunkCoord, created: &mut Vec<RegionId>) {
        let (lo, hi) = self.chunk_bounds(chunk);
        for x in lo.x..=hi.x {
            for y in lo.y..=hi.y {
                let seed = TileCoord::new(x, y);
                if self.region_at(seed).is_some() || !map.is_walkable(seed) {
                    continue;
                }
                let id = self.alloc_id();
                let is_door = map.is_door(seed);
                let tiles = if is_door {
                    self.claim(seed, id);
                    vec![seed]
                } else {
                    self.flood(map, seed, id, lo, hi)
                };
                debug_assert!(!tiles.is_empty());
                self.regions[id.index()] = Some(Region {
                    id,
                    chunk,
                    is_door,
                    area: None,
                    tiles,
                    boundary: Default::default(),
                    links: Vec::new(),
                });
                created.push(id);
            }
        }
    }

    fn claim(&mut self, tile: TileCoord, id: RegionId) {
        if let Some(i) = self.dims.index(tile) {
            self.tile_region[i] = Some(id);
        }
    }

    /// BFS from `seed` over walkable non-door tiles inside `lo..=hi`.
    fn flood(
        &mut self,
        map: &TileMap,
        seed: TileCoord,
        id: RegionId,
        lo: TileCoord,
        hi: TileCoord,
    ) -> Vec<TileCoord> {
        let mut tiles = Vec::new();
        let mut frontier = VecDeque::from([seed]);
        self.claim(seed, id);
        while let Some(tile) = frontier.pop_front() {
            tiles.push(tile);
            for dir in Direction::ALL {
                let next = tile.step(dir);
                let inside = (lo.x..=hi.x).contains(&next.x) && (lo.y..=hi.y).contains(&next.y);
                if inside
                    && self.region_at(next).is_none()
                    && map.is_walkable(next)
                    && !map.is_door(next)
                {
                    self.claim(next, id);
                    frontier.push_back(next);
                }
            }
        }
        tiles
    }

    /// The region entered by stepping from `from` toward `dir`, if that step
    /// crosses into a different region and both ends allow it.
    fn crossing(&self, map: &TileMap, from: TileCoord, dir: Direction) -> Option<RegionId> {
        let to = from.step(dir);
        let other = self.region_at(to)?;
        if Some(other) == self.region_at(from) {
            return None;
        }
        let off_axis = |door| map.door_bridge(door).is_some_and(|axis| !axis.contains(&dir));
        if off_axis(from) || off_axis(to) {
            return None;
        }
        Some(other)
    }

    /// Recompute boundary maps and spans for `ids` and register them in the
    /// link cache.
    fn build_links(&mut self, map: &TileMap, ids: &[RegionId]) {
        let height = self.dims.height;
        for &id in ids {
            let Some(region) = self.region(id) else {
                continue;
            };
            let mut boundary: [Vec<TileCoord>; 4] = Default::default();
            let mut east_axis = Vec::new();
            let mut north_axis = Vec::new();
            for &tile in &region.tiles {
                for dir in Direction::ALL {
                    let Some(other) = self.crossing(map, tile, dir) else {
                        continue;
                    };
                    let to = tile.step(dir);
                    boundary[dir.as_index()].push(to);
                    let crossing = match dir {
                        Direction::East | Direction::North => Crossing {
                            root: tile,
                            other,
                            on_root_side: true,
                        },
                        Direction::West | Direction::South => Crossing {
                            root: to,
                            other,
                            on_root_side: false,
                        },
                    };
                    if dir.is_horizontal() {
                        east_axis.push(crossing);
                    } else {
                        north_axis.push(crossing);
                    }
                }
            }
            for dir_tiles in &mut boundary {
                dir_tiles.sort();
            }

            let mut spans = group_spans(east_axis, Direction::East);
            spans.extend(group_spans(north_axis, Direction::North));

            let mut keys = Vec::with_capacity(spans.len());
            for span in spans {
                let key = span.key(height);
                self.links.attach(key, span, id);
                keys.push(key);
            }
            if let Some(region) = self.regions[id.index()].as_mut() {
                region.boundary = boundary;
                region.links = keys;
            }
        }
    }

    // -----------------------------------------------------------------------
    // Diagnostics
    // -----------------------------------------------------------------------

    /// Check the partition and link invariants against `map`.
    pub fn verify(&self, map: &TileMap) -> Result<(), String> {
        for i in 0..self.dims.len() {
            let tile = self.dims.coord(i);
            match (map.is_walkable(tile), self.tile_region[i]) {
                (true, None) => return Err(format!("walkable tile {tile} has no region")),
                (false, Some(id)) => return Err(format!("unwalkable tile {tile} is in {id}")),
                (true, Some(id)) => {
                    let region = self
                        .region(id)
                        .ok_or_else(|| format!("tile {tile} points at dead {id}"))?;
                    if !region.tiles.contains(&tile) {
                        return Err(format!("{id} does not list its tile {tile}"));
                    }
                }
                (false, None) => {}
            }
        }
        for region in self.regions.iter().flatten() {
            if region.tiles.is_empty() {
                return Err(format!("{} is empty", region.id));
            }
            if region.is_door && region.tiles.len() != 1 {
                return Err(format!("door {} has {} tiles", region.id, region.tiles.len()));
            }
            for &tile in &region.tiles {
                if self.chunk_of(tile) != region.chunk {
                    return Err(format!("{} leaks out of its chunk at {tile}", region.id));
                }
            }
            for &key in &region.links {
                let link = self
                    .links
                    .get(key)
                    .ok_or_else(|| format!("{} references evicted link {key:?}", region.id))?;
                if !link.holds(region.id) {
                    return Err(format!("link {key:?} does not hold {}", region.id));
                }
            }
        }
        Ok(())
    }
}

/// Group canonical crossings along one axis into maximal spans. A span
/// breaks on a gap, a change of boundary line, a change of neighboring
/// region, or a change of side.
fn group_spans(mut crossings: Vec<Crossing>, axis: Direction) -> Vec<EdgeSpan> {
    let horizontal = axis.is_horizontal();
    // Sort by boundary line first, then along the run.
    let line_and_pos = |c: &Crossing| {
        if horizontal {
            (c.root.x, c.root.y)
        } else {
            (c.root.y, c.root.x)
        }
    };
    crossings.sort_by_key(|c| (line_and_pos(c), c.other, c.on_root_side));

    let mut spans = Vec::new();
    let mut run: Option<(Crossing, u32)> = None;
    for c in crossings {
        run = match run {
            Some((start, len)) => {
                let (line, pos) = line_and_pos(&start);
                let (c_line, c_pos) = line_and_pos(&c);
                if c_line == line
                    && c_pos == pos + len as i32
                    && c.other == start.other
                    && c.on_root_side == start.on_root_side
                {
                    Some((start, len + 1))
                } else {
                    spans.push(EdgeSpan::canonical(start.root, axis, len));
                    Some((c, 1))
                }
            }
            None => Some((c, 1)),
        };
    }
    if let Some((start, len)) = run {
        spans.push(EdgeSpan::canonical(start.root, axis, len));
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ObjectKind;

    fn built(map: &TileMap, chunk_size: u32) -> RegionMap {
        let mut regions = RegionMap::new(map.dims(), chunk_size);
        regions.build_regions(map);
        regions.verify(map).unwrap();
        regions
    }

    /// Tile→region membership with each region named by its lowest tile
    /// index, plus every link as (span, owners named the same way). Equal
    /// snapshots mean equal decompositions regardless of id assignment.
    fn snapshot(regions: &RegionMap) -> (Vec<Option<usize>>, Vec<(EdgeSpan, Vec<usize>)>) {
        let dims = regions.dims();
        let name = |id: RegionId| {
            regions
                .tiles_of(id)
                .iter()
                .filter_map(|&t| dims.index(t))
                .min()
                .unwrap()
        };
        let membership = (0..dims.len())
            .map(|i| regions.region_at(dims.coord(i)).map(name))
            .collect();
        let mut links: Vec<(EdgeSpan, Vec<usize>)> = regions
            .links()
            .sorted()
            .into_iter()
            .map(|(_, link)| {
                let mut owners: Vec<usize> = link.regions().map(name).collect();
                owners.sort();
                (link.span, owners)
            })
            .collect();
        links.sort();
        (membership, links)
    }

    #[test]
    fn open_grid_in_one_chunk_is_one_region() {
        let map = TileMap::new(10, 10);
        let regions = built(&map, 16);
        assert_eq!(regions.region_count(), 1);
        assert_eq!(regions.link_count(), 0);
        let id = regions.region_at(TileCoord::new(3, 3)).unwrap();
        assert_eq!(regions.tiles_of(id).len(), 100);
    }

    #[test]
    fn chunks_bound_the_flood() {
        let map = TileMap::new(8, 8);
        let regions = built(&map, 4);
        assert_eq!(regions.region_count(), 4);
        // One full-length span across each of the four internal chunk edges.
        assert_eq!(regions.link_count(), 4);
        for (_, link) in regions.links().sorted() {
            assert_eq!(link.span.length, 4);
            assert_eq!(link.owner_count(), 2);
        }
        let a = regions.region_at(TileCoord::new(0, 0)).unwrap();
        let b = regions.region_at(TileCoord::new(7, 0)).unwrap();
        let c = regions.region_at(TileCoord::new(0, 7)).unwrap();
        let d = regions.region_at(TileCoord::new(7, 7)).unwrap();
        assert_eq!(regions.neighbors(a), {
            let mut v = vec![b, c];
            v.sort();
            v
        });
        assert!(!regions.neighbors(a).contains(&d));
    }

    #[test]
    fn partial_chunks_at_the_grid_edge() {
        let map = TileMap::new(5, 3);
        let regions = built(&map, 4);
        assert_eq!(regions.chunk_counts(), (2, 1));
        assert_eq!(regions.region_count(), 2);
        let east = regions.region_at(TileCoord::new(4, 2)).unwrap();
        assert_eq!(regions.tiles_of(east).len(), 3);
    }

    #[test]
    fn wall_splits_a_corridor() {
        let mut map = TileMap::from_ascii("#########\n.........\n#########").unwrap();
        let mut regions = built(&map, 16);
        assert_eq!(regions.region_count(), 1);

        map.set_object(TileCoord::new(4, 1), Some(ObjectKind::Wall));
        regions.update(&map, TileCoord::new(4, 1));
        regions.verify(&map).unwrap();
        assert_eq!(regions.region_count(), 2);
        assert_ne!(
            regions.region_at(TileCoord::new(0, 1)),
            regions.region_at(TileCoord::new(8, 1))
        );
        assert_eq!(regions.region_at(TileCoord::new(4, 1)), None);
        assert_eq!(regions.link_count(), 0);
    }

    #[test]
    fn doors_are_singleton_regions_linked_on_their_axis() {
        let map = TileMap::from_ascii(
            "
            #######
            ...+...
            #######
            ",
        )
        .unwrap();
        let regions = built(&map, 16);
        assert_eq!(regions.region_count(), 3);
        let door = regions.region_at(TileCoord::new(3, 1)).unwrap();
        let region = regions.region(door).unwrap();
        assert!(region.is_door);
        assert_eq!(region.tile_count(), 1);
        assert_eq!(region.boundary(Direction::East), &[TileCoord::new(4, 1)]);
        assert_eq!(region.boundary(Direction::West), &[TileCoord::new(2, 1)]);
        assert!(region.boundary(Direction::North).is_empty());
        assert_eq!(regions.link_count(), 2);
        assert_eq!(regions.neighbors(door).len(), 2);
    }

    #[test]
    fn door_in_the_open_only_links_its_bridge_axis() {
        let map = TileMap::from_ascii(
            "
            ...
            .+.
            ...
            ",
        )
        .unwrap();
        let regions = built(&map, 16);
        // The ring around the door stays one region.
        assert_eq!(regions.region_count(), 2);
        let door = regions.region_at(TileCoord::new(1, 1)).unwrap();
        let region = regions.region(door).unwrap();
        assert!(region.boundary(Direction::East).is_empty());
        assert!(region.boundary(Direction::West).is_empty());
        assert_eq!(region.links().len(), 2);
        assert_eq!(regions.link_count(), 2);

        let ring = regions.region_at(TileCoord::new(0, 0)).unwrap();
        let ring = regions.region(ring).unwrap();
        assert!(ring.boundary(Direction::East).is_empty());
        assert!(ring.boundary(Direction::West).is_empty());
        assert_eq!(ring.boundary(Direction::North), &[TileCoord::new(1, 1)]);
        assert_eq!(ring.boundary(Direction::South), &[TileCoord::new(1, 1)]);
    }

    #[test]
    fn chunk_edge_splits_into_one_span_per_neighbor() {
        // The wall cuts the east chunk in two, so the west region touches
        // each half through its own span.
        let map = TileMap::from_ascii(
            "
            ........
            ....####
            ........
            ........
            ",
        )
        .unwrap();
        let regions = built(&map, 4);
        assert_eq!(regions.region_count(), 3);
        let west = regions.region_at(TileCoord::new(0, 0)).unwrap();
        let mut spans: Vec<EdgeSpan> = regions
            .region(west)
            .unwrap()
            .links()
            .iter()
            .map(|&k| regions.links().get(k).unwrap().span)
            .collect();
        spans.sort();
        assert_eq!(
            spans,
            vec![
                EdgeSpan::canonical(TileCoord::new(3, 0), Direction::East, 2),
                EdgeSpan::canonical(TileCoord::new(3, 3), Direction::East, 1),
            ]
        );
        assert_eq!(regions.neighbors(west).len(), 2);
    }

    #[test]
    fn update_on_unchanged_tile_is_idempotent() {
        let map = TileMap::from_ascii(
            "
            ..........
            .####+###.
            .#......#.
            .#..hh..+.
            .#......#.
            .########.
            ..........
            ",
        )
        .unwrap();
        let mut regions = built(&map, 4);
        let before = snapshot(&regions);
        let ids_before: Vec<Option<RegionId>> = (0..map.dims().len())
            .map(|i| regions.region_at(map.dims().coord(i)))
            .collect();

        regions.update(&map, TileCoord::new(4, 3));
        regions.verify(&map).unwrap();
        assert_eq!(snapshot(&regions), before);
        let ids_after: Vec<Option<RegionId>> = (0..map.dims().len())
            .map(|i| regions.region_at(map.dims().coord(i)))
            .collect();
        assert_eq!(ids_before, ids_after);
    }

    #[test]
    fn out_of_bounds_update_is_ignored() {
        let map = TileMap::new(4, 4);
        let mut regions = built(&map, 2);
        let before = snapshot(&regions);
        assert!(regions.update(&map, TileCoord::new(-1, 2)).is_empty());
        assert!(regions.update(&map, TileCoord::new(4, 0)).is_empty());
        assert_eq!(snapshot(&regions), before);
    }

    #[test]
    fn assign_areas_skips_doors() {
        let map = TileMap::from_ascii("..+..").unwrap();
        let mut regions = built(&map, 16);
        regions.assign_areas(|t| Some(AreaId(t.x as u32)));
        let door = regions.region_at(TileCoord::new(2, 0)).unwrap();
        assert_eq!(regions.region(door).unwrap().area, None);
        let west = regions.region_at(TileCoord::new(0, 0)).unwrap();
        assert!(regions.region(west).unwrap().area.is_some());
    }

    #[test]
    fn incremental_updates_match_full_rebuilds() {
        let mut rng = fastrand::Rng::with_seed(0x5eed_0001);
        let mut map = TileMap::new(20, 14);
        let mut regions = built(&map, 5);
        let kinds = [
            None,
            Some(ObjectKind::Wall),
            Some(ObjectKind::Door),
            Some(ObjectKind::Furniture),
            Some(ObjectKind::Resource),
        ];
        for step in 0..300 {
            let tile = TileCoord::new(rng.i32(0..20), rng.i32(0..14));
            let kind = kinds[rng.usize(0..kinds.len())];
            if !map.set_object(tile, kind) {
                continue;
            }
            regions.update(&map, tile);
            regions
                .verify(&map)
                .unwrap_or_else(|e| panic!("step {step}: {e}"));
            let fresh = built(&map, 5);
            assert_eq!(snapshot(&regions), snapshot(&fresh), "step {step} at {tile}");
        }
    }
}
