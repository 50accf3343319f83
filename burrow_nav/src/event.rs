// Change notifications emitted by the navigation core.
//
// Every tile mutation pushes `NavEvent`s describing what was rebuilt:
// the node-graph rectangle that was re-derived, then "regions changed",
// then "areas changed". Observers (debug overlays, job planners caching
// reachability) drain the queue once per tick instead of registering
// callbacks, so delivery order is fixed and testable.
//
// Events carry no payload beyond what changed where; consumers re-query
// the world if they care.
//
// See also: `world.rs` which pushes events during mutation and hands the
// drained batch back from `tick()`.
//
// **Critical constraint: ordering.** Events are delivered in the order they
// were pushed. The `sequence` counter never resets, so batches from
// different ticks can be merged and re-sorted without ambiguity.

use crate::types::TileCoord;
use serde::{Deserialize, Serialize};

/// One notification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavEvent {
    /// Monotonic position in the event stream.
    pub sequence: u64,
    pub kind: NavEventKind,
}

/// What changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NavEventKind {
    /// Node flags and neighbor lists were re-derived for `min..=max`.
    GraphUpdated { min: TileCoord, max: TileCoord },
    /// Regions or region links were rebuilt.
    RegionsUpdated,
    /// Areas or area links were rebuilt.
    AreasUpdated,
}

/// FIFO of pending notifications.
#[derive(Clone, Debug, Default)]
pub struct EventQueue {
    events: Vec<NavEvent>,
    next_sequence: u64,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: NavEventKind) {
        self.events.push(NavEvent {
            sequence: self.next_sequence,
            kind,
        });
        self.next_sequence += 1;
    }

    /// Take every pending event, oldest first.
    pub fn drain(&mut self) -> Vec<NavEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_preserves_order_and_empties() {
        let mut queue = EventQueue::new();
        queue.push(NavEventKind::GraphUpdated {
            min: TileCoord::new(0, 0),
            max: TileCoord::new(2, 2),
        });
        queue.push(NavEventKind::RegionsUpdated);
        queue.push(NavEventKind::AreasUpdated);
        assert_eq!(queue.len(), 3);

        let events = queue.drain();
        assert!(queue.is_empty());
        let kinds: Vec<_> = events.iter().map(|e| e.kind).collect();
        assert_eq!(kinds[1], NavEventKind::RegionsUpdated);
        assert_eq!(kinds[2], NavEventKind::AreasUpdated);
        assert_eq!(
            events.iter().map(|e| e.sequence).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }

    #[test]
    fn sequence_continues_across_drains() {
        let mut queue = EventQueue::new();
        queue.push(NavEventKind::RegionsUpdated);
        queue.drain();
        queue.push(NavEventKind::AreasUpdated);
        assert_eq!(queue.drain()[0].sequence, 1);
    }

    #[test]
    fn events_serialize_to_json() {
        let event = NavEvent {
            sequence: 7,
            kind: NavEventKind::GraphUpdated {
                min: TileCoord::new(1, 2),
                max: TileCoord::new(3, 4),
            },
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: NavEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
