// Core types shared across the navigation core.
//
// Defines grid coordinates (`TileCoord`), continuous positions (`Point2`),
// the four cardinal `Direction`s, tile walkability (`Enterability`,
// `Terrain`, `ObjectKind`), and compact integer identifiers for nodes,
// regions, areas, and path requests. All plain-data types derive
// `Serialize`/`Deserialize` so tools can dump them without adapters.
//
// Placed objects carry their capabilities (`blocks_movement`,
// `encloses_room`, `is_door`) directly on the `ObjectKind` enum; nothing in
// the core inspects object types any other way.
//
// See also: `tiles.rs` for the grid that stores terrain and objects,
// `node_graph.rs` / `region.rs` / `area.rs` which index their arenas with
// the ids defined here.
//
// **Critical constraint: determinism.** Ids are plain integers allocated in a
// fixed order by their owning arena. Nothing here reads time or entropy.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Spatial types
// ---------------------------------------------------------------------------

/// A tile position on the 2D grid.
///
/// - X: east  (positive) / west  (negative)
/// - Y: north (positive) / south (negative)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    pub x: i32,
    pub y: i32,
}

impl TileCoord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The coordinate offset by `(dx, dy)`. May leave the grid.
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// The adjacent coordinate in a cardinal direction.
    pub const fn step(self, dir: Direction) -> Self {
        let (dx, dy) = dir.offset();
        self.offset(dx, dy)
    }

    /// Chebyshev (king-move) distance.
    pub fn chebyshev_distance(self, other: Self) -> u32 {
        (self.x - other.x)
            .unsigned_abs()
            .max((self.y - other.y).unsigned_abs())
    }

    /// Tile center as a continuous position.
    pub fn center(self) -> Point2 {
        Point2::new(self.x as f32, self.y as f32)
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A continuous position in tile units. Tile `(x, y)` has its center at
/// `Point2 { x, y }`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f32,
    pub y: f32,
}

impl Point2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Nearest tile to this position.
    pub fn to_tile(self) -> TileCoord {
        TileCoord::new(self.x.round() as i32, self.y.round() as i32)
    }
}

/// The four cardinal access directions. Diagonals never appear in region
/// boundaries, only in node adjacency.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Unit grid offset for this direction.
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Direction::North => (0, 1),
            Direction::East => (1, 0),
            Direction::South => (0, -1),
            Direction::West => (-1, 0),
        }
    }

    pub const fn opposite(self) -> Self {
        match self {
            Direction::North => Direction::South,
            Direction::East => Direction::West,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
        }
    }

    /// True for East/West: boundaries in these directions run along Y.
    pub const fn is_horizontal(self) -> bool {
        matches!(self, Direction::East | Direction::West)
    }

    /// Array index for per-direction tables.
    pub const fn as_index(self) -> usize {
        self as usize
    }
}

// ---------------------------------------------------------------------------
// Walkability
// ---------------------------------------------------------------------------

/// How an agent may enter a tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Enterability {
    /// Plain walkable tile.
    Immediate,
    /// Enterable after a wait (doors). Costed like a normal tile by A*; the
    /// open/close timing belongs to whoever animates the door.
    Delayed,
    /// Cannot be entered.
    Impassable,
}

impl Enterability {
    pub const fn is_enterable(self) -> bool {
        !matches!(self, Enterability::Impassable)
    }
}

/// Ground material of a tile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Terrain {
    #[default]
    Ground,
    /// Walkable but slow (mud, scree).
    Rough,
    /// Impassable.
    Water,
}

impl Terrain {
    pub const fn is_walkable(self) -> bool {
        !matches!(self, Terrain::Water)
    }

    pub const fn movement_multiplier(self) -> f32 {
        match self {
            Terrain::Ground => 1.0,
            Terrain::Rough => 2.0,
            Terrain::Water => 1.0,
        }
    }
}

/// An object placed on a tile. Capabilities are fixed per variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectKind {
    /// Solid wall: blocks movement and bounds rooms.
    Wall,
    /// Door: walkable (delayed), bounds rooms, always its own region.
    Door,
    /// Tables, beds, workbenches: walkable but slower.
    Furniture,
    /// Trees, boulders, ore: block movement without bounding rooms.
    Resource,
}

impl ObjectKind {
    pub const fn blocks_movement(self) -> bool {
        matches!(self, ObjectKind::Wall | ObjectKind::Resource)
    }

    pub const fn encloses_room(self) -> bool {
        matches!(self, ObjectKind::Wall | ObjectKind::Door)
    }

    pub const fn is_door(self) -> bool {
        matches!(self, ObjectKind::Door)
    }

    pub const fn movement_multiplier(self) -> f32 {
        match self {
            ObjectKind::Furniture => 1.5,
            _ => 1.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Compact ids: arena indices, not UUIDs.
// ---------------------------------------------------------------------------

macro_rules! compact_id {
    ($(#[$meta:meta])* $name:ident($inner:ty)) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub $inner);

        impl $name {
            /// Arena index for this id.
            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

compact_id!(/// Index of a node in `NodeGraph`; equal to the tile index.
NodeId(u32));
compact_id!(/// Slot of a region in `RegionMap`. Slots are reused after deletion.
RegionId(u32));
compact_id!(/// Slot of an area in `AreaMap`. Slots are reused after deletion.
AreaId(u32));
compact_id!(/// Monotonic handle for a submitted path request.
RequestId(u64));
