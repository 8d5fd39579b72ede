//! World configuration.
//!
//! Everything the worldgen thread needs to know up front: the seed feeding
//! the noise field, how far around the viewer chunks are kept generated, and
//! how often the generation sweep re-runs. Serde-derived so a JSON settings
//! file can override the defaults.

use serde::{Deserialize, Serialize};

/// Tunables for a [`World`](crate::voxels::world::World).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Seed feeding every noise channel. Two worlds with the same seed carve
    /// identical terrain.
    pub seed: u64,
    /// Generation radius around the viewer, in chunks. A radius of zero
    /// leaves the background thread idle, which is what headless tests want.
    pub view_distance: f32,
    /// Pause between generation sweeps, in milliseconds.
    pub sweep_interval_ms: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        WorldConfig {
            seed: 0,
            view_distance: 15.0,
            sweep_interval_ms: 300,
        }
    }
}

impl WorldConfig {
    /// Parses a config from a JSON document. Missing fields fall back to
    /// their defaults.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_overrides_defaults_partially() {
        let config = WorldConfig::from_json(r#"{ "seed": 42, "view_distance": 4.0 }"#).unwrap();
        assert_eq!(config.seed, 42);
        assert_eq!(config.view_distance, 4.0);
        assert_eq!(config.sweep_interval_ms, WorldConfig::default().sweep_interval_ms);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(WorldConfig::from_json("{ seed: }").is_err());
    }
}
