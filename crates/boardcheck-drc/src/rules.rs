//! Effective rule values: board minimum as the floor, then the netclass, then
//! per-item overrides.

use boardcheck_core::{
    same_net, to_mm, Board, BoardItem, Coord, DesignSettings, NetClass, NetCode, Point, Proximity,
};

use crate::violation::{DrcCode, DrcViolation};

pub fn fmt_mm(value: Coord) -> String {
    format!("{:.4} mm", to_mm(value as f64))
}

/// Required and measured separation, as appended to clearance messages.
pub fn clearance_detail(clearance: Coord, near: &Proximity) -> String {
    format!(
        "clearance {}; actual {}",
        fmt_mm(clearance),
        fmt_mm(near.distance.round() as Coord)
    )
}

/// Resolves clearance and size constraints for board items.
#[derive(Debug, Clone, Copy)]
pub struct RuleResolver<'a> {
    board: &'a Board,
}

impl<'a> RuleResolver<'a> {
    pub fn new(board: &'a Board) -> Self {
        Self { board }
    }

    pub fn design(&self) -> &'a DesignSettings {
        &self.board.design
    }

    pub fn netclass(&self, net: NetCode) -> &'a NetClass {
        self.board.netclass_of(net)
    }

    /// Clearance of a net's class, never below the board minimum.
    pub fn net_clearance(&self, net: NetCode) -> Coord {
        self.netclass(net).clearance.max(self.design().min_clearance)
    }

    /// Clearance an item asks for. Items without a net (graphics, text) ask
    /// for nothing beyond the board minimum and defer to the other item.
    pub fn item_clearance(&self, item: &BoardItem<'_>) -> Coord {
        let floor = self.design().min_clearance;
        let local = match item {
            BoardItem::Track(t) => t.local_clearance,
            BoardItem::Via(v) => v.local_clearance,
            BoardItem::Pad(fp, p) => p.local_clearance.or(fp.local_clearance),
            BoardItem::Zone(z) => z.local_clearance,
            BoardItem::Footprint(fp) => fp.local_clearance,
            BoardItem::Drawing(_) | BoardItem::Text(_) => return floor,
        };
        match local {
            Some(value) => value.max(floor),
            None => self.net_clearance(item.net()),
        }
    }

    /// Required separation between two items; `None` when they share a net
    /// and may touch.
    pub fn pair_clearance(&self, a: &BoardItem<'_>, b: &BoardItem<'_>) -> Option<Coord> {
        if same_net(a.net(), b.net()) {
            return None;
        }
        Some(self.item_clearance(a).max(self.item_clearance(b)))
    }

    pub fn track_width(&self, net: NetCode) -> Coord {
        self.netclass(net).track_width.max(self.design().min_track_width)
    }

    pub fn via_diameter(&self, net: NetCode) -> Coord {
        self.netclass(net).via_diameter.max(self.design().min_via_diameter)
    }

    pub fn via_drill(&self, net: NetCode) -> Coord {
        self.netclass(net).via_drill.max(self.design().min_via_drill)
    }

    pub fn uvia_diameter(&self, net: NetCode) -> Coord {
        self.netclass(net).uvia_diameter.max(self.design().min_uvia_diameter)
    }

    pub fn uvia_drill(&self, net: NetCode) -> Coord {
        self.netclass(net).uvia_drill.max(self.design().min_uvia_drill)
    }

    /// Largest clearance any item on the board can ask for. Bounds the sweep
    /// window of the pairwise drivers.
    pub fn worst_clearance(&self) -> Coord {
        let floor = self.design().min_clearance;
        let classes = self.board.netclasses.iter().map(|nc| nc.clearance);
        let tracks = self.board.tracks.iter().filter_map(|t| t.local_clearance);
        let vias = self.board.vias.iter().filter_map(|v| v.local_clearance);
        let zones = self.board.zones.iter().filter_map(|z| z.local_clearance);
        let footprints = self.board.footprints.iter().flat_map(|fp| {
            fp.local_clearance
                .into_iter()
                .chain(fp.pads.iter().filter_map(|p| p.local_clearance))
        });
        classes
            .chain(tracks)
            .chain(vias)
            .chain(zones)
            .chain(footprints)
            .chain(std::iter::once(self.board.default_netclass().clearance))
            .fold(floor, Coord::max)
    }

    /// Compare every netclass against the board minimums.
    pub fn validate_netclasses(&self) -> Vec<DrcViolation> {
        self.board
            .netclasses
            .iter()
            .flat_map(|nc| self.validate_netclass(nc))
            .collect()
    }

    /// One record per rule of `nc` that is looser than the board minimum.
    pub fn validate_netclass(&self, nc: &NetClass) -> Vec<DrcViolation> {
        let design = self.design();
        let checks = [
            (DrcCode::NetclassClearance, nc.clearance, design.min_clearance),
            (DrcCode::NetclassTrackwidth, nc.track_width, design.min_track_width),
            (DrcCode::NetclassViasize, nc.via_diameter, design.min_via_diameter),
            (DrcCode::NetclassViadrillsize, nc.via_drill, design.min_via_drill),
            (DrcCode::NetclassUviasize, nc.uvia_diameter, design.min_uvia_diameter),
            (DrcCode::NetclassUviadrillsize, nc.uvia_drill, design.min_uvia_drill),
        ];
        checks
            .into_iter()
            .filter(|(_, value, minimum)| value < minimum)
            .map(|(code, value, minimum)| {
                DrcViolation::new(code, Point::default())
                    .with_netclass(&nc.name)
                    .with_detail(format!(
                        "NetClass '{}' {} < board minimum {}",
                        nc.name,
                        fmt_mm(value),
                        fmt_mm(minimum)
                    ))
            })
            .collect()
    }
}
