//! Transport modes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The kind of vehicle a route is operated with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    Tram,
    Bus,
    Train,
    Ferry,
}

impl TransportMode {
    /// All modes, in a fixed order.
    pub const ALL: [TransportMode; 4] = [
        TransportMode::Tram,
        TransportMode::Bus,
        TransportMode::Train,
        TransportMode::Ferry,
    ];

    /// Whether stations of this mode board from distinct platforms.
    ///
    /// Modes without platforms board directly from the station.
    pub fn has_platforms(self) -> bool {
        matches!(self, TransportMode::Tram | TransportMode::Train)
    }

    /// Lowercase name, as used in config files.
    pub fn as_str(self) -> &'static str {
        match self {
            TransportMode::Tram => "tram",
            TransportMode::Bus => "bus",
            TransportMode::Train => "train",
            TransportMode::Ferry => "ferry",
        }
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platforms_by_mode() {
        assert!(TransportMode::Tram.has_platforms());
        assert!(TransportMode::Train.has_platforms());
        assert!(!TransportMode::Bus.has_platforms());
        assert!(!TransportMode::Ferry.has_platforms());
    }

    #[test]
    fn serde_lowercase() {
        assert_eq!(serde_json::to_string(&TransportMode::Tram).unwrap(), "\"tram\"");
        let mode: TransportMode = serde_json::from_str("\"bus\"").unwrap();
        assert_eq!(mode, TransportMode::Bus);
    }

    #[test]
    fn display_matches_as_str() {
        for mode in TransportMode::ALL {
            assert_eq!(mode.to_string(), mode.as_str());
        }
    }
}
