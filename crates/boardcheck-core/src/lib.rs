//! # BoardCheck Core
//!
//! Read-only printed circuit board model with the geometry it needs to be
//! checked: integer geometric primitives, exact spatial predicates, a
//! canonical segment frame, outline polygonization, layer sets, netclasses,
//! netlists, an R-tree spatial index and copper connectivity.

pub mod board;
pub mod connectivity;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod layer;
pub mod netclass;
pub mod netlist;
pub mod outline;
pub mod predicates;
pub mod spatial;

pub use board::{
    same_net, Board, BoardItem, Drawing, Footprint, ItemRef, KeepoutRules, NetCode, NetInfo, Pad,
    PadAttribute, PadShape, Text, Track, Via, ViaType, Zone, NO_NET,
};
pub use connectivity::{Connectivity, DisjointSet, Island, RatsnestEdge};
pub use error::{BoardError, PolygonizeError};
pub use frame::{LocalPoint, SegmentFrame};
pub use geometry::{mm, to_mm, BBox, Containment, Coord, GraphicShape, Point, Polygon, Segment, Shape, Size};
pub use layer::{Layer, LayerId, LayerKind, LayerSet, LayerStack};
pub use netclass::{DesignSettings, NetClass};
pub use netlist::{Netlist, NetlistComponent, PinNet};
pub use predicates::Proximity;
pub use spatial::{SpatialEntry, SpatialIndex};
