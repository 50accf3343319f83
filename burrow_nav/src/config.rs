// Data-driven navigation configuration.
//
// All tunable parameters of the navigation core live in `NavConfig`, loaded
// from JSON at startup or built from `Default`. The core never hard-codes
// chunk sizes, step costs, or spline resolution; it reads them from here.
// Missing JSON fields fall back to their defaults, so a config file only
// needs to name what it overrides.
//
// See also: `world.rs` which owns the `NavConfig` as part of `NavWorld`,
// `region.rs` for `chunk_size`, `pathfinding.rs` for the step costs,
// `path.rs` for the spline parameters, `path_finder.rs` for admission and
// worker-thread settings.
//
// **Critical constraint: determinism.** Every value here feeds directly into
// graph, region, or search results. Two worlds with identical configs and
// identical tile edits produce identical regions, areas, and paths.

use serde::{Deserialize, Serialize};

/// Tunables for the navigation core.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavConfig {
    /// Side length (in tiles) of the square chunks that bound region
    /// flood-fill. Smaller chunks make incremental rebuilds cheaper and
    /// produce more regions.
    pub chunk_size: u32,
    /// Interpolated points emitted per waypoint segment by the Catmull-Rom
    /// smoother.
    pub spline_subdivisions: u32,
    /// Interpolated points closer than this (in tiles) to the final waypoint
    /// are dropped, removing the tiny hook the spline draws at the tail.
    pub spline_tail_trim: f32,
    /// Fixed-point cost of one orthogonal step (1.0 scaled by 10).
    pub straight_cost: u32,
    /// Fixed-point cost of one diagonal step (√2 ≈ 1.4 scaled by 10).
    pub diagonal_cost: u32,
    /// New searches admitted into flight per `PathFinder::process()` call.
    pub admissions_per_tick: usize,
    /// Worker threads in the background search pool.
    pub search_threads: usize,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            chunk_size: 16,
            spline_subdivisions: 3,
            spline_tail_trim: 0.35,
            straight_cost: 10,
            diagonal_cost: 14,
            admissions_per_tick: 1,
            search_threads: 2,
        }
    }
}

impl NavConfig {
    /// Parse a config from JSON. Absent fields take their default values.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Reject configs the core cannot run with.
    pub fn validate(&self) -> Result<(), String> {
        if self.chunk_size == 0 {
            return Err("chunk_size must be at least 1".into());
        }
        if self.spline_subdivisions == 0 {
            return Err("spline_subdivisions must be at least 1".into());
        }
        if self.straight_cost == 0 {
            return Err("straight_cost must be positive".into());
        }
        if self.diagonal_cost < self.straight_cost {
            return Err(format!(
                "diagonal_cost ({}) must not be below straight_cost ({})",
                self.diagonal_cost, self.straight_cost
            ));
        }
        if self.admissions_per_tick == 0 {
            return Err("admissions_per_tick must be at least 1".into());
        }
        if self.search_threads == 0 {
            return Err("search_threads must be at least 1".into());
        }
        if self.spline_tail_trim.is_nan() || self.spline_tail_trim < 0.0 {
            return Err("spline_tail_trim must be a non-negative number".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(NavConfig::default().validate(), Ok(()));
    }

    #[test]
    fn json_roundtrip() {
        let config = NavConfig {
            chunk_size: 8,
            search_threads: 4,
            ..NavConfig::default()
        };
        let json = config.to_json().unwrap();
        let restored = NavConfig::from_json(&json).unwrap();
        assert_eq!(config, restored);
    }

    #[test]
    fn partial_json_uses_defaults() {
        let config = NavConfig::from_json(r#"{ "chunk_size": 5 }"#).unwrap();
        assert_eq!(config.chunk_size, 5);
        assert_eq!(config.spline_subdivisions, 3);
        assert_eq!(config.diagonal_cost, 14);
    }

    #[test]
    fn from_json_rejects_wrong_types() {
        assert!(NavConfig::from_json(r#"{ "chunk_size": "big" }"#).is_err());
        assert!(NavConfig::from_json("not json").is_err());
    }

    #[test]
    fn validate_rejects_degenerate_values() {
        let zero_chunk = NavConfig {
            chunk_size: 0,
            ..NavConfig::default()
        };
        assert!(zero_chunk.validate().is_err());

        let cheap_diagonal = NavConfig {
            diagonal_cost: 5,
            ..NavConfig::default()
        };
        let err = cheap_diagonal.validate().unwrap_err();
        assert!(err.contains("diagonal_cost"), "{err}");

        let nan_trim = NavConfig {
            spline_tail_trim: f32::NAN,
            ..NavConfig::default()
        };
        assert!(nan_trim.validate().is_err());
    }
}
