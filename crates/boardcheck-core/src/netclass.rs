use serde::{Deserialize, Serialize};

use crate::geometry::{mm, Coord};

pub const DEFAULT_NETCLASS: &str = "Default";

/// A named bundle of routing rules shared by a group of nets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetClass {
    pub name: String,
    pub description: String,
    pub clearance: Coord,
    pub track_width: Coord,
    pub via_diameter: Coord,
    pub via_drill: Coord,
    pub uvia_diameter: Coord,
    pub uvia_drill: Coord,
}

impl NetClass {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn with_clearance(mut self, clearance: Coord) -> Self {
        self.clearance = clearance;
        self
    }

    pub fn with_track_width(mut self, width: Coord) -> Self {
        self.track_width = width;
        self
    }

    pub fn with_via(mut self, diameter: Coord, drill: Coord) -> Self {
        self.via_diameter = diameter;
        self.via_drill = drill;
        self
    }

    pub fn with_uvia(mut self, diameter: Coord, drill: Coord) -> Self {
        self.uvia_diameter = diameter;
        self.uvia_drill = drill;
        self
    }
}

impl Default for NetClass {
    fn default() -> Self {
        Self {
            name: DEFAULT_NETCLASS.to_string(),
            description: String::new(),
            clearance: mm(0.2),
            track_width: mm(0.25),
            via_diameter: mm(0.8),
            via_drill: mm(0.4),
            uvia_diameter: mm(0.3),
            uvia_drill: mm(0.1),
        }
    }
}

/// Board-wide absolute minimums. Every effective per-net value is floored by
/// these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignSettings {
    pub min_clearance: Coord,
    pub min_track_width: Coord,
    pub min_via_diameter: Coord,
    pub min_via_drill: Coord,
    pub min_uvia_diameter: Coord,
    pub min_uvia_drill: Coord,
    pub min_hole_to_hole: Coord,
    pub copper_edge_clearance: Coord,
    pub allow_micro_vias: bool,
    pub allow_blind_buried_vias: bool,
    /// Report footprints without any courtyard. On unless a board opts out.
    pub require_courtyards: bool,
}

impl Default for DesignSettings {
    fn default() -> Self {
        Self {
            min_clearance: 0,
            min_track_width: mm(0.2),
            min_via_diameter: mm(0.4),
            min_via_drill: mm(0.3),
            min_uvia_diameter: mm(0.2),
            min_uvia_drill: mm(0.1),
            min_hole_to_hole: mm(0.25),
            copper_edge_clearance: mm(0.01),
            allow_micro_vias: false,
            allow_blind_buried_vias: false,
            require_courtyards: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_netclass_is_above_floor() {
        let nc = NetClass::default();
        let ds = DesignSettings::default();
        assert!(nc.clearance >= ds.min_clearance);
        assert!(nc.track_width >= ds.min_track_width);
        assert!(nc.via_diameter >= ds.min_via_diameter);
        assert!(nc.via_drill >= ds.min_via_drill);
        assert!(nc.uvia_diameter >= ds.min_uvia_diameter);
        assert!(nc.uvia_drill >= ds.min_uvia_drill);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let nc: NetClass = serde_json::from_str(r#"{"name":"Power","clearance":300000}"#).unwrap();
        assert_eq!(nc.name, "Power");
        assert_eq!(nc.clearance, 300_000);
        assert_eq!(nc.track_width, mm(0.25));
    }
}
