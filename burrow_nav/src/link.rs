// Region links and the global span cache.
//
// Two regions that touch share one or more contiguous boundary runs. Each
// run is an `EdgeSpan`: a root tile, an axis direction, and a length. Spans
// are canonical, so both regions computing the same physical boundary from
// their own side produce the same value:
// - the direction is always `East` or `North`, naming the axis the boundary
//   is crossed along;
// - the root is the west (for `East`) or south (for `North`) tile of the
//   lowest crossing in the run;
// - the run extends from the root along +Y (`East` spans) or +X (`North`
//   spans).
//
// `LinkCache` maps each span's `SpanKey` to the one `RegionLink` for that
// boundary. Regions register themselves on the links they touch during link
// rebuild and deregister when deleted; a link with no owners is evicted.
//
// See also: `region.rs` which computes spans from region boundaries and
// owns the cache.
//
// **Critical constraint:** a link holds at most two regions, and never the
// same region twice.

use crate::types::{Direction, RegionId, TileCoord};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// A contiguous run of boundary crossings between two regions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeSpan {
    pub root: TileCoord,
    /// `East` or `North`.
    pub direction: Direction,
    pub length: u32,
}

impl EdgeSpan {
    /// Build a canonical span from the crossing at `tile` heading `direction`
    /// (any of the four), `length` crossings long along the perpendicular
    /// axis starting at `tile`.
    pub fn canonical(tile: TileCoord, direction: Direction, length: u32) -> Self {
        let (root, direction) = match direction {
            Direction::East | Direction::North => (tile, direction),
            Direction::West => (tile.step(Direction::West), Direction::East),
            Direction::South => (tile.step(Direction::South), Direction::North),
        };
        Self {
            root,
            direction,
            length,
        }
    }

    /// Cache key. The root occupies the high 32 bits as a grid index; the
    /// axis and length share the low 32.
    pub fn key(&self, height: u32) -> SpanKey {
        let root_index = self.root.x as u64 * height as u64 + self.root.y as u64;
        let axis = u64::from(self.direction.is_horizontal());
        SpanKey((root_index << 32) | (axis << 31) | u64::from(self.length & 0x7fff_ffff))
    }

    /// The tiles on the root side of the boundary, in run order.
    pub fn tiles(&self) -> impl Iterator<Item = TileCoord> + '_ {
        let (dx, dy) = if self.direction.is_horizontal() {
            (0, 1)
        } else {
            (1, 0)
        };
        (0..self.length as i32).map(move |i| self.root.offset(dx * i, dy * i))
    }
}

/// Hash key of an `EdgeSpan`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SpanKey(pub u64);

/// The shared boundary between (up to) two regions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegionLink {
    pub span: EdgeSpan,
    regions: [Option<RegionId>; 2],
}

impl RegionLink {
    pub fn new(span: EdgeSpan) -> Self {
        Self {
            span,
            regions: [None, None],
        }
    }

    pub fn regions(&self) -> impl Iterator<Item = RegionId> + '_ {
        self.regions.iter().flatten().copied()
    }

    pub fn holds(&self, region: RegionId) -> bool {
        self.regions.contains(&Some(region))
    }

    /// The owner that is not `region`, if any.
    pub fn other(&self, region: RegionId) -> Option<RegionId> {
        self.regions().find(|&r| r != region)
    }

    pub fn owner_count(&self) -> usize {
        self.regions().count()
    }

    /// Record `region` as an owner.
    ///
    /// Panics if the region already owns this link or both slots are taken:
    /// either means region bookkeeping went wrong upstream.
    pub fn assign(&mut self, region: RegionId) {
        assert!(
            !self.holds(region),
            "{region} assigned twice to span {:?}",
            self.span
        );
        match self.regions.iter_mut().find(|slot| slot.is_none()) {
            Some(slot) => *slot = Some(region),
            None => panic!(
                "span {:?} already links {:?}; cannot add {region}",
                self.span, self.regions
            ),
        }
    }

    /// Clear `region` from the owners. Returns true if the link is now empty.
    pub fn release(&mut self, region: RegionId) -> bool {
        for slot in &mut self.regions {
            if *slot == Some(region) {
                *slot = None;
            }
        }
        self.regions.iter().all(Option::is_none)
    }
}

/// Global `SpanKey → RegionLink` table.
#[derive(Clone, Debug, Default)]
pub struct LinkCache {
    links: FxHashMap<SpanKey, RegionLink>,
}

impl LinkCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `region` on the link for `span`, creating the link if this
    /// is the first side to see it.
    pub fn attach(&mut self, key: SpanKey, span: EdgeSpan, region: RegionId) {
        let link = self.links.entry(key).or_insert_with(|| RegionLink::new(span));
        debug_assert_eq!(link.span, span, "span key collision");
        link.assign(region);
    }

    /// Deregister `region` from the link at `key`, evicting it when empty.
    pub fn detach(&mut self, key: SpanKey, region: RegionId) {
        let Some(link) = self.links.get_mut(&key) else {
            log::warn!("{region} detaching from unknown span key {key:?}");
            return;
        };
        if link.release(region) {
            self.links.remove(&key);
        }
    }

    pub fn get(&self, key: SpanKey) -> Option<&RegionLink> {
        self.links.get(&key)
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn clear(&mut self) {
        self.links.clear();
    }

    /// All links sorted by key.
    pub fn sorted(&self) -> Vec<(SpanKey, &RegionLink)> {
        let mut all: Vec<_> = self.links.iter().map(|(k, l)| (*k, l)).collect();
        all.sort_by_key(|(k, _)| *k);
        all
    }
}
