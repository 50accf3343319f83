// Dense 2D tile grid: the gameplay-side source of walkability.
//
// The grid is stored as a flat `Vec<Tile>` indexed column-major by
// `x * height + y` (`GridDims::index`), the same layout `NodeGraph` uses for
// its nodes, so a tile index and a node id are interchangeable. Out-of-bounds
// reads return `None`; out-of-bounds writes are no-ops that report `false`.
//
// Each tile holds a `Terrain` and at most one placed `ObjectKind`. The
// `TileSource` trait is the narrow interface the rest of the core reads
// (`is_walkable`, `enterability`, `movement_multiplier`); tests and tools may
// implement it over any other storage.
//
// Door tiles are tracked in a sorted set so `area.rs` can rebuild area links
// without scanning the whole grid.
//
// See also: `types.rs` for `Terrain`/`ObjectKind` capabilities,
// `node_graph.rs` which derives node flags from a `TileSource`,
// `world.rs` which owns the `TileMap` and routes every edit through the
// rebuild pipeline.
//
// **Critical constraint: single writer.** Only `NavWorld` mutates the map,
// and it must run the graph/region/area pipeline after every edit. Editing a
// `TileMap` that a `NavWorld` owns behind its back desynchronizes the core.

use crate::types::{Direction, Enterability, ObjectKind, Terrain, TileCoord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Grid dimensions plus the shared tile/node index scheme.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridDims {
    pub width: u32,
    pub height: u32,
}

impl GridDims {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn in_bounds(&self, coord: TileCoord) -> bool {
        coord.x >= 0
            && coord.y >= 0
            && (coord.x as u32) < self.width
            && (coord.y as u32) < self.height
    }

    /// Flat index for a coordinate. Returns `None` if out of bounds.
    pub fn index(&self, coord: TileCoord) -> Option<usize> {
        if self.in_bounds(coord) {
            Some(coord.x as usize * self.height as usize + coord.y as usize)
        } else {
            None
        }
    }

    /// Inverse of `index`. The caller guarantees `index < len()`.
    pub fn coord(&self, index: usize) -> TileCoord {
        let h = self.height as usize;
        TileCoord::new((index / h) as i32, (index % h) as i32)
    }

    pub fn len(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The read-only walkability interface consumed by the navigation core.
pub trait TileSource {
    fn dims(&self) -> GridDims;

    /// How an agent may enter the tile. Out of bounds is `Impassable`.
    fn enterability(&self, coord: TileCoord) -> Enterability;

    /// Multiplier (≥ 1.0) applied to the cost of stepping onto the tile.
    fn movement_multiplier(&self, coord: TileCoord) -> f32;

    fn is_walkable(&self, coord: TileCoord) -> bool {
        self.enterability(coord).is_enterable()
    }
}

/// One gameplay tile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub terrain: Terrain,
    pub object: Option<ObjectKind>,
}

impl Tile {
    pub fn enterability(&self) -> Enterability {
        if !self.terrain.is_walkable() {
            return Enterability::Impassable;
        }
        match self.object {
            Some(obj) if obj.blocks_movement() => Enterability::Impassable,
            Some(obj) if obj.is_door() => Enterability::Delayed,
            _ => Enterability::Immediate,
        }
    }

    pub fn movement_multiplier(&self) -> f32 {
        let object = self.object.map_or(1.0, ObjectKind::movement_multiplier);
        self.terrain.movement_multiplier() * object
    }

    pub fn is_door(&self) -> bool {
        self.object.is_some_and(ObjectKind::is_door)
    }

    pub fn encloses_room(&self) -> bool {
        self.object.is_some_and(ObjectKind::encloses_room)
    }

    /// Whether the tile can belong to an area: walkable and not holding a
    /// room-enclosing object.
    pub fn is_area_tile(&self) -> bool {
        self.enterability().is_enterable() && !self.encloses_room()
    }
}

/// Dense 2D tile grid.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TileMap {
    /// Flat storage: index = x * height + y.
    tiles: Vec<Tile>,
    dims: GridDims,
    /// Every tile currently holding a door, in coordinate order.
    doors: BTreeSet<TileCoord>,
}

impl TileMap {
    /// Create a map of open `Ground` with no objects.
    pub fn new(width: u32, height: u32) -> Self {
        let dims = GridDims::new(width, height);
        Self {
            tiles: vec![Tile::default(); dims.len()],
            dims,
            doors: BTreeSet::new(),
        }
    }

    /// Parse a map from ASCII art. The first line is the northmost row.
    ///
    /// `.` ground, `,` rough, `~` water, `#` wall, `+` door, `h` furniture,
    /// `T` resource. Rows must have equal length; any other character is
    /// rejected.
    pub fn from_ascii(art: &str) -> Result<Self, String> {
        let rows: Vec<&str> = art
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();
        let height = rows.len() as u32;
        let width = rows.first().map_or(0, |r| r.chars().count()) as u32;
        let mut map = Self::new(width, height);
        for (row_idx, row) in rows.iter().enumerate() {
            if row.chars().count() as u32 != width {
                return Err(format!(
                    "row {row_idx} has {} columns, expected {width}",
                    row.chars().count()
                ));
            }
            let y = (height as usize - 1 - row_idx) as i32;
            for (x, ch) in row.chars().enumerate() {
                let coord = TileCoord::new(x as i32, y);
                let (terrain, object) = match ch {
                    '.' => (Terrain::Ground, None),
                    ',' => (Terrain::Rough, None),
                    '~' => (Terrain::Water, None),
                    '#' => (Terrain::Ground, Some(ObjectKind::Wall)),
                    '+' => (Terrain::Ground, Some(ObjectKind::Door)),
                    'h' => (Terrain::Ground, Some(ObjectKind::Furniture)),
                    'T' => (Terrain::Ground, Some(ObjectKind::Resource)),
                    other => return Err(format!("unknown tile glyph {other:?} at {coord}")),
                };
                map.set_terrain(coord, terrain);
                map.set_object(coord, object);
            }
        }
        Ok(map)
    }

    pub fn dims(&self) -> GridDims {
        self.dims
    }

    pub fn width(&self) -> u32 {
        self.dims.width
    }

    pub fn height(&self) -> u32 {
        self.dims.height
    }

    pub fn in_bounds(&self, coord: TileCoord) -> bool {
        self.dims.in_bounds(coord)
    }

    /// Read a tile. Returns `None` for out-of-bounds coordinates.
    pub fn get(&self, coord: TileCoord) -> Option<&Tile> {
        self.dims.index(coord).map(|i| &self.tiles[i])
    }

    /// Replace the terrain of a tile. Returns `false` (and does nothing) when
    /// out of bounds or when the tile already has that terrain.
    pub fn set_terrain(&mut self, coord: TileCoord, terrain: Terrain) -> bool {
        match self.dims.index(coord) {
            Some(i) if self.tiles[i].terrain != terrain => {
                self.tiles[i].terrain = terrain;
                true
            }
            _ => false,
        }
    }

    /// Place, replace, or clear (`None`) the object on a tile. Returns
    /// `false` when out of bounds or when the tile already holds `object`.
    pub fn set_object(&mut self, coord: TileCoord, object: Option<ObjectKind>) -> bool {
        let Some(i) = self.dims.index(coord) else {
            return false;
        };
        if self.tiles[i].object == object {
            return false;
        }
        self.tiles[i].object = object;
        if object.is_some_and(ObjectKind::is_door) {
            self.doors.insert(coord);
        } else {
            self.doors.remove(&coord);
        }
        true
    }

    /// All door tiles in coordinate order.
    pub fn doors(&self) -> impl Iterator<Item = TileCoord> + '_ {
        self.doors.iter().copied()
    }

    pub fn is_door(&self, coord: TileCoord) -> bool {
        self.doors.contains(&coord)
    }

    /// Whether the tile can belong to an area. False out of bounds.
    pub fn is_area_tile(&self, coord: TileCoord) -> bool {
        self.get(coord).is_some_and(Tile::is_area_tile)
    }

    /// Whether the tile holds a room-enclosing object. False out of bounds.
    pub fn encloses_room(&self, coord: TileCoord) -> bool {
        self.get(coord).is_some_and(Tile::encloses_room)
    }

    /// The two directions a door connects. A door whose north and south
    /// neighbors are both impassable bridges east/west; any other door
    /// bridges north/south. `None` if the tile is not a door.
    pub fn door_bridge(&self, coord: TileCoord) -> Option<[Direction; 2]> {
        if !self.is_door(coord) {
            return None;
        }
        let north = self.is_walkable(coord.step(Direction::North));
        let south = self.is_walkable(coord.step(Direction::South));
        if !north && !south {
            Some([Direction::East, Direction::West])
        } else {
            Some([Direction::North, Direction::South])
        }
    }
}

impl TileSource for TileMap {
    fn dims(&self) -> GridDims {
        self.dims
    }

    fn enterability(&self, coord: TileCoord) -> Enterability {
        self.get(coord)
            .map_or(Enterability::Impassable, Tile::enterability)
    }

    fn movement_multiplier(&self, coord: TileCoord) -> f32 {
        self.get(coord).map_or(1.0, Tile::movement_multiplier)
    }
}
