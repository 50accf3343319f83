// Reachability queries over the area link graph.
//
// All traversal cost is paid in `AreaMap::compute_area_links`; the queries
// here only look up ids and test set membership, so callers may run them
// for every job evaluation of every tick.
//
// Doors have no area. A door tile asked about directly resolves to the
// areas on either side of its bridging axis, so "can I reach the door" has
// the answer agents expect.
//
// See also: `area.rs` for the link sets, `world.rs` for the `NavWorld`
// wrappers that pass in its own region and area maps.

use crate::area::AreaMap;
use crate::region::RegionMap;
use crate::tiles::TileMap;
use crate::types::{AreaId, RegionId, TileCoord};
use smallvec::{SmallVec, smallvec};

/// Whether an agent in region `a` can walk to region `b`.
///
/// False if either region is dead or has no area (door regions).
pub fn can_reach(regions: &RegionMap, areas: &AreaMap, a: RegionId, b: RegionId) -> bool {
    let area_of = |id| regions.region(id).and_then(|r| r.area);
    match (area_of(a), area_of(b)) {
        (Some(x), Some(y)) => areas.are_linked(x, y),
        _ => false,
    }
}

/// The areas an agent standing on `tile` belongs to: its own area, or for a
/// door, the areas flanking it on its bridging axis.
pub fn areas_of_tile(map: &TileMap, areas: &AreaMap, tile: TileCoord) -> SmallVec<[AreaId; 2]> {
    if let Some(area) = areas.area_at(tile) {
        return smallvec![area];
    }
    let mut out = SmallVec::new();
    if let Some(axis) = map.door_bridge(tile) {
        for dir in axis {
            if let Some(area) = areas.area_at(tile.step(dir)) {
                if !out.contains(&area) {
                    out.push(area);
                }
            }
        }
    }
    out
}

/// Tile-level reachability. Symmetric; false for unwalkable or
/// out-of-bounds tiles.
pub fn can_reach_tiles(map: &TileMap, areas: &AreaMap, a: TileCoord, b: TileCoord) -> bool {
    let from = areas_of_tile(map, areas, a);
    let to = areas_of_tile(map, areas, b);
    from.iter().any(|&x| to.iter().any(|&y| areas.are_linked(x, y)))
}
