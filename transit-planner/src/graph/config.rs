//! Build-time configuration for the transport graph.

use std::collections::BTreeMap;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::domain::TransportMode;

/// Boarding and alighting overheads for one mode, in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeCosts {
    pub board: u32,
    pub depart: u32,
    /// Boarding at an interchange.
    pub interchange_board: u32,
    /// Alighting at an interchange.
    pub interchange_depart: u32,
}

impl ModeCosts {
    pub const fn new(board: u32, depart: u32, interchange_board: u32, interchange_depart: u32) -> Self {
        Self {
            board,
            depart,
            interchange_board,
            interchange_depart,
        }
    }
}

impl Default for ModeCosts {
    fn default() -> Self {
        Self::new(1, 1, 2, 2)
    }
}

/// Configuration parameters for graph construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Walking speed used for neighbour and query-point walks.
    pub walking_speed_m_per_min: f64,

    /// Stations closer than this become walking neighbours.
    pub neighbour_distance_m: f64,

    /// Whether to create NEIGHBOUR walks at all.
    pub create_neighbours: bool,

    /// Only stations marked as interchanges in the source data count as
    /// interchanges.
    pub change_at_interchange_only: bool,

    /// Per-mode boarding overheads.
    pub mode_costs: BTreeMap<TransportMode, ModeCosts>,

    /// Per-mode number of distinct onward links that makes a station an
    /// interchange.
    pub interchange_links: BTreeMap<TransportMode, usize>,
}

impl GraphConfig {
    /// Boarding overheads for `mode`.
    pub fn costs(&self, mode: TransportMode) -> ModeCosts {
        self.mode_costs.get(&mode).copied().unwrap_or_default()
    }

    /// Link count at which a station of `mode` becomes an interchange.
    pub fn interchange_threshold(&self, mode: TransportMode) -> usize {
        self.interchange_links.get(&mode).copied().unwrap_or(3)
    }

    /// Time to walk one kilometre, for display.
    pub fn minutes_per_km(&self) -> Duration {
        Duration::minutes((1000.0 / self.walking_speed_m_per_min).ceil() as i64)
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            walking_speed_m_per_min: 80.0, // ~3mph
            neighbour_distance_m: 300.0,
            create_neighbours: true,
            change_at_interchange_only: false,
            mode_costs: BTreeMap::from([
                (TransportMode::Tram, ModeCosts::new(1, 1, 2, 2)),
                (TransportMode::Bus, ModeCosts::new(2, 1, 3, 2)),
                (TransportMode::Train, ModeCosts::new(3, 2, 5, 3)),
                (TransportMode::Ferry, ModeCosts::new(5, 2, 6, 3)),
            ]),
            interchange_links: BTreeMap::from([
                (TransportMode::Tram, 3),
                (TransportMode::Bus, 4),
                (TransportMode::Train, 3),
                (TransportMode::Ferry, 2),
            ]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = GraphConfig::default();

        assert_eq!(config.walking_speed_m_per_min, 80.0);
        assert!(config.create_neighbours);
        assert!(!config.change_at_interchange_only);
        assert_eq!(config.interchange_threshold(TransportMode::Bus), 4);
        assert_eq!(config.minutes_per_km(), Duration::minutes(13));
    }

    #[test]
    fn interchange_costs_exceed_standard() {
        let config = GraphConfig::default();
        for mode in TransportMode::ALL {
            let costs = config.costs(mode);
            assert!(costs.interchange_board > costs.board, "{mode}");
            assert!(costs.interchange_depart > costs.depart, "{mode}");
        }
    }

    #[test]
    fn missing_mode_falls_back() {
        let config = GraphConfig {
            mode_costs: BTreeMap::new(),
            interchange_links: BTreeMap::new(),
            ..GraphConfig::default()
        };
        assert_eq!(config.costs(TransportMode::Ferry), ModeCosts::default());
        assert_eq!(config.interchange_threshold(TransportMode::Ferry), 3);
    }

    #[test]
    fn deserialize_partial() {
        let config: GraphConfig =
            serde_json::from_str(r#"{"change_at_interchange_only": true, "mode_costs": {"tram": {"board": 4, "depart": 1, "interchange_board": 6, "interchange_depart": 2}}}"#)
                .unwrap();
        assert!(config.change_at_interchange_only);
        assert_eq!(config.costs(TransportMode::Tram).board, 4);
        assert_eq!(config.walking_speed_m_per_min, 80.0);
    }
}
