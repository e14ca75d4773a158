use std::fmt;

use serde::{Deserialize, Serialize};

use boardcheck_core::{ItemRef, Point};

use crate::options::DrcCategory;

/// Closed set of violation codes. Order and names are stable across runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DrcCode {
    UnconnectedItems,
    TrackNearThroughHole,
    TrackNearPad,
    TrackNearVia,
    ViaNearVia,
    ViaNearTrack,
    TrackEnds,
    TrackNearTrack,
    TracksCrossing,
    PadNearPad,
    ViaHoleBigger,
    MicroViaIncorrectLayerPair,
    ZonesIntersect,
    ZonesTooClose,
    SuspiciousNetForZoneOutline,
    HoleNearPad,
    HoleNearTrack,
    TooSmallTrackWidth,
    TooSmallVia,
    TooSmallMicrovia,
    TooSmallViaDrill,
    TooSmallMicroviaDrill,
    NetclassTrackwidth,
    NetclassClearance,
    NetclassViasize,
    NetclassViadrillsize,
    #[serde(rename = "NETCLASS_uVIASIZE")]
    NetclassUviasize,
    #[serde(rename = "NETCLASS_uVIADRILLSIZE")]
    NetclassUviadrillsize,
    ViaInsideKeepout,
    TrackInsideKeepout,
    PadInsideKeepout,
    TrackNearCopper,
    ViaNearCopper,
    PadNearCopper,
    TrackNearZone,
    OverlappingFootprints,
    MissingCourtyardInFootprint,
    MalformedCourtyardInFootprint,
    MicroViaNotAllowed,
    BuriedViaNotAllowed,
    DisabledLayerItem,
    DrilledHolesTooClose,
    TrackNearEdge,
    InvalidOutline,
    MissingFootprint,
    DuplicateFootprint,
    ExtraFootprint,
    Short,
    RedundantVia,
    DuplicateTrack,
    MergeTracks,
    DanglingTrack,
    DanglingVia,
    ZeroLengthTrack,
    TrackInPad,
    UnresolvedVariable,
}

impl DrcCode {
    /// Every code, in declaration order.
    pub const ALL: [DrcCode; 56] = [
        DrcCode::UnconnectedItems,
        DrcCode::TrackNearThroughHole,
        DrcCode::TrackNearPad,
        DrcCode::TrackNearVia,
        DrcCode::ViaNearVia,
        DrcCode::ViaNearTrack,
        DrcCode::TrackEnds,
        DrcCode::TrackNearTrack,
        DrcCode::TracksCrossing,
        DrcCode::PadNearPad,
        DrcCode::ViaHoleBigger,
        DrcCode::MicroViaIncorrectLayerPair,
        DrcCode::ZonesIntersect,
        DrcCode::ZonesTooClose,
        DrcCode::SuspiciousNetForZoneOutline,
        DrcCode::HoleNearPad,
        DrcCode::HoleNearTrack,
        DrcCode::TooSmallTrackWidth,
        DrcCode::TooSmallVia,
        DrcCode::TooSmallMicrovia,
        DrcCode::TooSmallViaDrill,
        DrcCode::TooSmallMicroviaDrill,
        DrcCode::NetclassTrackwidth,
        DrcCode::NetclassClearance,
        DrcCode::NetclassViasize,
        DrcCode::NetclassViadrillsize,
        DrcCode::NetclassUviasize,
        DrcCode::NetclassUviadrillsize,
        DrcCode::ViaInsideKeepout,
        DrcCode::TrackInsideKeepout,
        DrcCode::PadInsideKeepout,
        DrcCode::TrackNearCopper,
        DrcCode::ViaNearCopper,
        DrcCode::PadNearCopper,
        DrcCode::TrackNearZone,
        DrcCode::OverlappingFootprints,
        DrcCode::MissingCourtyardInFootprint,
        DrcCode::MalformedCourtyardInFootprint,
        DrcCode::MicroViaNotAllowed,
        DrcCode::BuriedViaNotAllowed,
        DrcCode::DisabledLayerItem,
        DrcCode::DrilledHolesTooClose,
        DrcCode::TrackNearEdge,
        DrcCode::InvalidOutline,
        DrcCode::MissingFootprint,
        DrcCode::DuplicateFootprint,
        DrcCode::ExtraFootprint,
        DrcCode::Short,
        DrcCode::RedundantVia,
        DrcCode::DuplicateTrack,
        DrcCode::MergeTracks,
        DrcCode::DanglingTrack,
        DrcCode::DanglingVia,
        DrcCode::ZeroLengthTrack,
        DrcCode::TrackInPad,
        DrcCode::UnresolvedVariable,
    ];

    /// Stable textual code as written to reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            DrcCode::UnconnectedItems => "UNCONNECTED_ITEMS",
            DrcCode::TrackNearThroughHole => "TRACK_NEAR_THROUGH_HOLE",
            DrcCode::TrackNearPad => "TRACK_NEAR_PAD",
            DrcCode::TrackNearVia => "TRACK_NEAR_VIA",
            DrcCode::ViaNearVia => "VIA_NEAR_VIA",
            DrcCode::ViaNearTrack => "VIA_NEAR_TRACK",
            DrcCode::TrackEnds => "TRACK_ENDS",
            DrcCode::TrackNearTrack => "TRACK_NEAR_TRACK",
            DrcCode::TracksCrossing => "TRACKS_CROSSING",
            DrcCode::PadNearPad => "PAD_NEAR_PAD",
            DrcCode::ViaHoleBigger => "VIA_HOLE_BIGGER",
            DrcCode::MicroViaIncorrectLayerPair => "MICRO_VIA_INCORRECT_LAYER_PAIR",
            DrcCode::ZonesIntersect => "ZONES_INTERSECT",
            DrcCode::ZonesTooClose => "ZONES_TOO_CLOSE",
            DrcCode::SuspiciousNetForZoneOutline => "SUSPICIOUS_NET_FOR_ZONE_OUTLINE",
            DrcCode::HoleNearPad => "HOLE_NEAR_PAD",
            DrcCode::HoleNearTrack => "HOLE_NEAR_TRACK",
            DrcCode::TooSmallTrackWidth => "TOO_SMALL_TRACK_WIDTH",
            DrcCode::TooSmallVia => "TOO_SMALL_VIA",
            DrcCode::TooSmallMicrovia => "TOO_SMALL_MICROVIA",
            DrcCode::TooSmallViaDrill => "TOO_SMALL_VIA_DRILL",
            DrcCode::TooSmallMicroviaDrill => "TOO_SMALL_MICROVIA_DRILL",
            DrcCode::NetclassTrackwidth => "NETCLASS_TRACKWIDTH",
            DrcCode::NetclassClearance => "NETCLASS_CLEARANCE",
            DrcCode::NetclassViasize => "NETCLASS_VIASIZE",
            DrcCode::NetclassViadrillsize => "NETCLASS_VIADRILLSIZE",
            DrcCode::NetclassUviasize => "NETCLASS_uVIASIZE",
            DrcCode::NetclassUviadrillsize => "NETCLASS_uVIADRILLSIZE",
            DrcCode::ViaInsideKeepout => "VIA_INSIDE_KEEPOUT",
            DrcCode::TrackInsideKeepout => "TRACK_INSIDE_KEEPOUT",
            DrcCode::PadInsideKeepout => "PAD_INSIDE_KEEPOUT",
            DrcCode::TrackNearCopper => "TRACK_NEAR_COPPER",
            DrcCode::ViaNearCopper => "VIA_NEAR_COPPER",
            DrcCode::PadNearCopper => "PAD_NEAR_COPPER",
            DrcCode::TrackNearZone => "TRACK_NEAR_ZONE",
            DrcCode::OverlappingFootprints => "OVERLAPPING_FOOTPRINTS",
            DrcCode::MissingCourtyardInFootprint => "MISSING_COURTYARD_IN_FOOTPRINT",
            DrcCode::MalformedCourtyardInFootprint => "MALFORMED_COURTYARD_IN_FOOTPRINT",
            DrcCode::MicroViaNotAllowed => "MICRO_VIA_NOT_ALLOWED",
            DrcCode::BuriedViaNotAllowed => "BURIED_VIA_NOT_ALLOWED",
            DrcCode::DisabledLayerItem => "DISABLED_LAYER_ITEM",
            DrcCode::DrilledHolesTooClose => "DRILLED_HOLES_TOO_CLOSE",
            DrcCode::TrackNearEdge => "TRACK_NEAR_EDGE",
            DrcCode::InvalidOutline => "INVALID_OUTLINE",
            DrcCode::MissingFootprint => "MISSING_FOOTPRINT",
            DrcCode::DuplicateFootprint => "DUPLICATE_FOOTPRINT",
            DrcCode::ExtraFootprint => "EXTRA_FOOTPRINT",
            DrcCode::Short => "SHORT",
            DrcCode::RedundantVia => "REDUNDANT_VIA",
            DrcCode::DuplicateTrack => "DUPLICATE_TRACK",
            DrcCode::MergeTracks => "MERGE_TRACKS",
            DrcCode::DanglingTrack => "DANGLING_TRACK",
            DrcCode::DanglingVia => "DANGLING_VIA",
            DrcCode::ZeroLengthTrack => "ZERO_LENGTH_TRACK",
            DrcCode::TrackInPad => "TRACK_IN_PAD",
            DrcCode::UnresolvedVariable => "UNRESOLVED_VARIABLE",
        }
    }

    /// Fixed human-readable title.
    pub fn title(&self) -> &'static str {
        match self {
            DrcCode::UnconnectedItems => "Unconnected items",
            DrcCode::TrackNearThroughHole => "Track too close to thru-hole",
            DrcCode::TrackNearPad => "Track too close to pad",
            DrcCode::TrackNearVia => "Track too close to via",
            DrcCode::ViaNearVia => "Via too close to via",
            DrcCode::ViaNearTrack => "Via too close to track",
            DrcCode::TrackEnds => "Track ends are too close",
            DrcCode::TrackNearTrack => "Parallel tracks too close",
            DrcCode::TracksCrossing => "Tracks are crossing",
            DrcCode::PadNearPad => "Pad too close to pad",
            DrcCode::ViaHoleBigger => "Via hole is bigger than via size",
            DrcCode::MicroViaIncorrectLayerPair => "Micro via: incorrect layer pairs (not adjacent)",
            DrcCode::ZonesIntersect => "Copper areas intersect",
            DrcCode::ZonesTooClose => "Copper areas too close",
            DrcCode::SuspiciousNetForZoneOutline => "Copper zone net has no pads",
            DrcCode::HoleNearPad => "Hole too close to pad",
            DrcCode::HoleNearTrack => "Hole too close to track",
            DrcCode::TooSmallTrackWidth => "Track width too small",
            DrcCode::TooSmallVia => "Via size too small",
            DrcCode::TooSmallMicrovia => "Micro via size too small",
            DrcCode::TooSmallViaDrill => "Via drill too small",
            DrcCode::TooSmallMicroviaDrill => "Micro via drill too small",
            DrcCode::NetclassTrackwidth => "NetClass Track Width < global limit",
            DrcCode::NetclassClearance => "NetClass Clearance < global limit",
            DrcCode::NetclassViasize => "NetClass Via Dia < global limit",
            DrcCode::NetclassViadrillsize => "NetClass Via Drill < global limit",
            DrcCode::NetclassUviasize => "NetClass uVia Dia < global limit",
            DrcCode::NetclassUviadrillsize => "NetClass uVia Drill < global limit",
            DrcCode::ViaInsideKeepout => "Via inside keepout area",
            DrcCode::TrackInsideKeepout => "Track inside keepout area",
            DrcCode::PadInsideKeepout => "Pad inside keepout area",
            DrcCode::TrackNearCopper => "Copper graphic too close to track",
            DrcCode::ViaNearCopper => "Copper graphic too close to via",
            DrcCode::PadNearCopper => "Copper graphic too close to pad",
            DrcCode::TrackNearZone => "Track too close to copper area",
            DrcCode::OverlappingFootprints => "Courtyards overlap",
            DrcCode::MissingCourtyardInFootprint => "Footprint has no courtyard defined",
            DrcCode::MalformedCourtyardInFootprint => "Footprint has malformed courtyard",
            DrcCode::MicroViaNotAllowed => "Micro via not allowed",
            DrcCode::BuriedViaNotAllowed => "Buried via not allowed",
            DrcCode::DisabledLayerItem => "Item on a disabled layer",
            DrcCode::DrilledHolesTooClose => "Drilled holes too close together",
            DrcCode::TrackNearEdge => "Copper too close to board edge",
            DrcCode::InvalidOutline => "Board has malformed outline",
            DrcCode::MissingFootprint => "Missing footprint",
            DrcCode::DuplicateFootprint => "Duplicate footprints",
            DrcCode::ExtraFootprint => "Extra footprint",
            DrcCode::Short => "Remove track shorting two nets",
            DrcCode::RedundantVia => "Remove redundant via",
            DrcCode::DuplicateTrack => "Remove duplicate track",
            DrcCode::MergeTracks => "Merge co-linear tracks",
            DrcCode::DanglingTrack => "Remove dangling track",
            DrcCode::DanglingVia => "Remove dangling via",
            DrcCode::ZeroLengthTrack => "Remove zero-length track",
            DrcCode::TrackInPad => "Remove track inside pad",
            DrcCode::UnresolvedVariable => "Unresolved text variable",
        }
    }

    pub fn default_severity(&self) -> Severity {
        match self {
            DrcCode::SuspiciousNetForZoneOutline
            | DrcCode::MissingCourtyardInFootprint
            | DrcCode::ExtraFootprint
            | DrcCode::RedundantVia
            | DrcCode::DuplicateTrack
            | DrcCode::MergeTracks
            | DrcCode::DanglingTrack
            | DrcCode::DanglingVia
            | DrcCode::ZeroLengthTrack
            | DrcCode::TrackInPad
            | DrcCode::UnresolvedVariable => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// The category whose driver produces this code.
    pub fn category(&self) -> DrcCategory {
        use DrcCode::*;
        match self {
            NetclassTrackwidth | NetclassClearance | NetclassViasize | NetclassViadrillsize
            | NetclassUviasize | NetclassUviadrillsize => DrcCategory::Netclasses,
            TrackNearThroughHole | TrackNearPad | TrackNearVia | ViaNearVia | ViaNearTrack
            | TrackEnds | TrackNearTrack | TracksCrossing | ViaHoleBigger
            | MicroViaIncorrectLayerPair | TooSmallTrackWidth | TooSmallVia | TooSmallMicrovia
            | TooSmallViaDrill | TooSmallMicroviaDrill | MicroViaNotAllowed
            | BuriedViaNotAllowed | TrackNearEdge | TrackNearZone | Short | ZeroLengthTrack
            | HoleNearTrack => DrcCategory::Tracks,
            PadNearPad | HoleNearPad => DrcCategory::PadToPad,
            DrilledHolesTooClose => DrcCategory::DrilledHoles,
            ZonesIntersect | ZonesTooClose | SuspiciousNetForZoneOutline => DrcCategory::Zones,
            ViaInsideKeepout | TrackInsideKeepout | PadInsideKeepout => DrcCategory::Keepouts,
            TrackNearCopper | ViaNearCopper | PadNearCopper => DrcCategory::CopperGraphics,
            OverlappingFootprints | MissingCourtyardInFootprint
            | MalformedCourtyardInFootprint => DrcCategory::Courtyards,
            UnconnectedItems => DrcCategory::Unconnected,
            DisabledLayerItem => DrcCategory::DisabledLayers,
            InvalidOutline => DrcCategory::Outline,
            UnresolvedVariable => DrcCategory::TextVariables,
            MissingFootprint | DuplicateFootprint | ExtraFootprint => DrcCategory::Footprints,
            RedundantVia | DuplicateTrack | MergeTracks | DanglingTrack | DanglingVia
            | TrackInPad => DrcCategory::Cleanup,
        }
    }
}

impl fmt::Display for DrcCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity level of a DRC violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("error"),
            Severity::Warning => f.write_str("warning"),
        }
    }
}

/// Something a violation points at.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Subject {
    Item(ItemRef),
    NetClass(String),
    /// A component reference designator, for netlist findings.
    Component(String),
}

/// A single DRC finding. Built once, never mutated after it is reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrcViolation {
    pub code: DrcCode,
    pub severity: Severity,
    pub message: String,
    pub location: Point,
    pub subjects: Vec<Subject>,
}

/// Identity used to drop symmetric or repeated findings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViolationKey {
    code: DrcCode,
    subjects: Vec<Subject>,
    location: Point,
}

impl DrcViolation {
    pub fn new(code: DrcCode, location: Point) -> Self {
        Self {
            code,
            severity: code.default_severity(),
            message: code.title().to_string(),
            location,
            subjects: Vec::new(),
        }
    }

    pub fn with_item(mut self, item: ItemRef) -> Self {
        debug_assert!(self.subjects.len() < 2, "a violation implicates at most two items");
        self.subjects.push(Subject::Item(item));
        self
    }

    pub fn with_items(self, a: ItemRef, b: ItemRef) -> Self {
        self.with_item(a).with_item(b)
    }

    pub fn with_netclass(mut self, name: &str) -> Self {
        self.subjects.push(Subject::NetClass(name.to_string()));
        self
    }

    pub fn with_component(mut self, reference: &str) -> Self {
        self.subjects.push(Subject::Component(reference.to_string()));
        self
    }

    /// Append a detail to the title, e.g. the measured and required values.
    pub fn with_detail(mut self, detail: impl AsRef<str>) -> Self {
        self.message = format!("{} ({})", self.code.title(), detail.as_ref());
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn items(&self) -> impl Iterator<Item = ItemRef> + '_ {
        self.subjects.iter().filter_map(|s| match s {
            Subject::Item(r) => Some(*r),
            _ => None,
        })
    }

    pub fn key(&self) -> ViolationKey {
        let mut subjects = self.subjects.clone();
        subjects.sort();
        ViolationKey {
            code: self.code,
            subjects,
            location: self.location,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_names_match_serde() {
        for code in DrcCode::ALL {
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json, format!("\"{}\"", code.as_str()));
        }
    }

    #[test]
    fn test_symmetric_pair_has_same_key() {
        let a = ItemRef::Track { index: 0 };
        let b = ItemRef::Track { index: 1 };
        let at = Point::new(10, 10);
        let ab = DrcViolation::new(DrcCode::TrackNearTrack, at).with_items(a, b);
        let ba = DrcViolation::new(DrcCode::TrackNearTrack, at).with_items(b, a);
        assert_eq!(ab.key(), ba.key());
        let elsewhere = DrcViolation::new(DrcCode::TrackNearTrack, Point::new(0, 0)).with_items(a, b);
        assert_ne!(ab.key(), elsewhere.key());
    }

    #[test]
    fn test_detail_and_severity() {
        let v = DrcViolation::new(DrcCode::ZeroLengthTrack, Point::new(0, 0)).with_detail("length 0");
        assert_eq!(v.message, "Remove zero-length track (length 0)");
        assert_eq!(v.severity, Severity::Warning);
        assert_eq!(DrcCode::TrackNearTrack.category(), DrcCategory::Tracks);
    }
}
