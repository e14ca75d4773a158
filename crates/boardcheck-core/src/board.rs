use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::BoardError;
use crate::geometry::{
    ring_edges, to_mm, BBox, Coord, GraphicShape, Point, Polygon, Segment, Shape, Size,
};
use crate::layer::{self, layer_name, LayerId, LayerSet, LayerStack};
use crate::netclass::{DesignSettings, NetClass, DEFAULT_NETCLASS};

/// Net identifier. Code 0 means "no net".
pub type NetCode = u32;
pub const NO_NET: NetCode = 0;

/// True when two net codes name the same real net. Unconnected items are
/// never considered to share a net.
pub fn same_net(a: NetCode, b: NetCode) -> bool {
    a != NO_NET && a == b
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetInfo {
    pub code: NetCode,
    pub name: String,
    #[serde(default = "default_netclass_name")]
    pub netclass: String,
}

fn default_netclass_name() -> String {
    DEFAULT_NETCLASS.to_string()
}

impl NetInfo {
    pub fn new(code: NetCode, name: &str) -> Self {
        Self {
            code,
            name: name.to_string(),
            netclass: default_netclass_name(),
        }
    }

    pub fn with_netclass(mut self, netclass: &str) -> Self {
        self.netclass = netclass.to_string();
        self
    }
}

// ── Copper items ─────────────────────────────────────────────────────

/// A straight copper track segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub start: Point,
    pub end: Point,
    pub width: Coord,
    pub layer: LayerId,
    #[serde(default)]
    pub net: NetCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_clearance: Option<Coord>,
}

impl Track {
    pub fn new(start: Point, end: Point, width: Coord, layer: LayerId, net: NetCode) -> Self {
        Self {
            start,
            end,
            width,
            layer,
            net,
            local_clearance: None,
        }
    }

    pub fn segment(&self) -> Segment {
        Segment::new(self.start, self.end)
    }

    pub fn shape(&self) -> Shape {
        Shape::Segment {
            seg: self.segment(),
            width: self.width,
        }
    }

    pub fn length(&self) -> f64 {
        self.start.distance_to(&self.end)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViaType {
    #[default]
    Through,
    BlindBuried,
    Micro,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Via {
    pub position: Point,
    pub diameter: Coord,
    pub drill: Coord,
    #[serde(default = "default_top")]
    pub top: LayerId,
    #[serde(default = "default_bottom")]
    pub bottom: LayerId,
    #[serde(default)]
    pub via_type: ViaType,
    #[serde(default)]
    pub net: NetCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_clearance: Option<Coord>,
}

fn default_top() -> LayerId {
    layer::F_CU
}

fn default_bottom() -> LayerId {
    layer::B_CU
}

impl Via {
    pub fn through(position: Point, diameter: Coord, drill: Coord, net: NetCode) -> Self {
        Self {
            position,
            diameter,
            drill,
            top: layer::F_CU,
            bottom: layer::B_CU,
            via_type: ViaType::Through,
            net,
            local_clearance: None,
        }
    }

    pub fn with_span(mut self, via_type: ViaType, top: LayerId, bottom: LayerId) -> Self {
        self.via_type = via_type;
        self.top = top;
        self.bottom = bottom;
        self
    }

    pub fn layers(&self) -> LayerSet {
        LayerSet::copper_span(self.top, self.bottom)
    }

    pub fn shape(&self) -> Shape {
        Shape::circle(self.position, self.diameter)
    }

    pub fn hole(&self) -> Shape {
        Shape::circle(self.position, self.drill)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PadShape {
    #[default]
    Circle,
    Rect,
    Oval,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PadAttribute {
    #[default]
    Smd,
    ThroughHole,
    /// Non-plated hole: a drill with no copper.
    NonPlated,
}

/// A footprint pad, stored in absolute board coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pad {
    pub number: String,
    pub position: Point,
    pub size: Size,
    #[serde(default)]
    pub shape: PadShape,
    #[serde(default)]
    pub rotation: f64,
    pub layers: LayerSet,
    #[serde(default)]
    pub attribute: PadAttribute,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drill: Option<Coord>,
    #[serde(default)]
    pub net: NetCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_clearance: Option<Coord>,
}

impl Pad {
    pub fn smd(number: &str, position: Point, size: Size, layer: LayerId, net: NetCode) -> Self {
        Self {
            number: number.to_string(),
            position,
            size,
            shape: PadShape::Rect,
            rotation: 0.0,
            layers: LayerSet::single(layer),
            attribute: PadAttribute::Smd,
            drill: None,
            net,
            local_clearance: None,
        }
    }

    pub fn through_hole(number: &str, position: Point, diameter: Coord, drill: Coord, net: NetCode) -> Self {
        Self {
            number: number.to_string(),
            position,
            size: Size::new(diameter, diameter),
            shape: PadShape::Circle,
            rotation: 0.0,
            layers: LayerSet::all_copper(),
            attribute: PadAttribute::ThroughHole,
            drill: Some(drill),
            net,
            local_clearance: None,
        }
    }

    pub fn has_copper(&self) -> bool {
        self.attribute != PadAttribute::NonPlated && self.layers.has_copper()
    }

    /// Copper layers this pad actually carries copper on.
    pub fn copper_layers(&self) -> LayerSet {
        if self.has_copper() {
            self.layers.copper()
        } else {
            LayerSet::EMPTY
        }
    }

    pub fn copper_shape(&self) -> Option<Shape> {
        if !self.has_copper() {
            return None;
        }
        let shape = match self.shape {
            PadShape::Circle => Shape::circle(self.position, self.size.w),
            PadShape::Rect => {
                Shape::Polygon(Polygon::rectangle(self.position, self.size, self.rotation))
            }
            PadShape::Oval => {
                let (long, short) = (self.size.w.max(self.size.h), self.size.w.min(self.size.h));
                if long == short {
                    Shape::circle(self.position, long)
                } else {
                    let half = (long - short) / 2;
                    let axis_deg = if self.size.w >= self.size.h { 0.0 } else { 90.0 };
                    let angle = axis_deg + self.rotation;
                    let start = self.position.translate(-half, 0).rotate_about(&self.position, angle);
                    let end = self.position.translate(half, 0).rotate_about(&self.position, angle);
                    Shape::Segment {
                        seg: Segment::new(start, end),
                        width: short,
                    }
                }
            }
        };
        Some(shape)
    }

    pub fn hole(&self) -> Option<Shape> {
        self.drill
            .filter(|d| *d > 0)
            .map(|d| Shape::circle(self.position, d))
    }

    /// Copper layers the drill passes through.
    pub fn hole_layers(&self) -> LayerSet {
        if self.hole().is_some() {
            LayerSet::all_copper()
        } else {
            LayerSet::EMPTY
        }
    }
}

// ── Graphics and text ────────────────────────────────────────────────

/// A graphic item drawn with a pen of `width` on one layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drawing {
    #[serde(flatten)]
    pub shape: GraphicShape,
    #[serde(default)]
    pub width: Coord,
    pub layer: LayerId,
}

impl Drawing {
    pub fn new(shape: GraphicShape, width: Coord, layer: LayerId) -> Self {
        Self {
            shape,
            width,
            layer,
        }
    }

    /// Stroked outline as copper shapes. Polygons are filled.
    pub fn shapes(&self) -> Vec<Shape> {
        let stroke = |ring: Vec<Point>| -> Vec<Shape> {
            ring_edges(&ring)
                .map(|seg| Shape::Segment {
                    seg,
                    width: self.width,
                })
                .collect()
        };
        match &self.shape {
            GraphicShape::Segment { start, end } => vec![Shape::Segment {
                seg: Segment::new(*start, *end),
                width: self.width,
            }],
            GraphicShape::Rect { start, end } => stroke(GraphicShape::rect_corners(start, end)),
            GraphicShape::Circle { center, radius } => {
                stroke(GraphicShape::circle_points(center, *radius))
            }
            GraphicShape::Polygon { points } => vec![Shape::Polygon(Polygon::new(points.clone()))],
        }
    }

    pub fn bbox(&self) -> BBox {
        self.shape.bbox().inflate(self.width / 2)
    }

    pub fn kind_name(&self) -> &'static str {
        match self.shape {
            GraphicShape::Segment { .. } => "segment",
            GraphicShape::Rect { .. } => "rectangle",
            GraphicShape::Circle { .. } => "circle",
            GraphicShape::Polygon { .. } => "polygon",
        }
    }
}

/// A text item. `size` is the extent of the rendered string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text {
    pub text: String,
    pub position: Point,
    pub size: Size,
    #[serde(default)]
    pub rotation: f64,
    pub layer: LayerId,
}

impl Text {
    pub fn new(text: &str, position: Point, size: Size, layer: LayerId) -> Self {
        Self {
            text: text.to_string(),
            position,
            size,
            rotation: 0.0,
            layer,
        }
    }

    pub fn shape(&self) -> Shape {
        Shape::Polygon(Polygon::rectangle(self.position, self.size, self.rotation))
    }
}

// ── Footprints and zones ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Footprint {
    /// Nil when the file carries no id.
    #[serde(default)]
    pub id: Uuid,
    pub reference: String,
    #[serde(default)]
    pub value: String,
    pub position: Point,
    #[serde(default)]
    pub rotation: f64,
    /// F.Cu for front-side parts, B.Cu for flipped ones.
    #[serde(default = "default_top")]
    pub layer: LayerId,
    #[serde(default)]
    pub pads: Vec<Pad>,
    #[serde(default)]
    pub graphics: Vec<Drawing>,
    #[serde(default)]
    pub texts: Vec<Text>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_clearance: Option<Coord>,
}

impl Footprint {
    pub fn new(reference: &str, value: &str, position: Point) -> Self {
        Self {
            id: Uuid::new_v4(),
            reference: reference.to_string(),
            value: value.to_string(),
            position,
            rotation: 0.0,
            layer: layer::F_CU,
            pads: Vec::new(),
            graphics: Vec::new(),
            texts: Vec::new(),
            local_clearance: None,
        }
    }

    pub fn with_pad(mut self, pad: Pad) -> Self {
        self.pads.push(pad);
        self
    }

    pub fn with_graphic(mut self, graphic: Drawing) -> Self {
        self.graphics.push(graphic);
        self
    }

    pub fn is_back(&self) -> bool {
        self.layer == layer::B_CU
    }

    /// Courtyard graphics on the given courtyard layer.
    pub fn courtyard_graphics(&self, courtyard_layer: LayerId) -> Vec<GraphicShape> {
        self.graphics
            .iter()
            .filter(|g| g.layer == courtyard_layer)
            .map(|g| g.shape.clone())
            .collect()
    }

    /// Union of pad and graphic extents.
    pub fn bbox(&self) -> BBox {
        let pads = self
            .pads
            .iter()
            .map(|p| p.copper_shape().or_else(|| p.hole()).map(|s| s.bbox()));
        let graphics = self.graphics.iter().map(|g| Some(g.bbox()));
        pads.chain(graphics)
            .flatten()
            .reduce(|a, b| a.union(&b))
            .unwrap_or_else(|| BBox::new(self.position, self.position))
    }
}

/// What a keepout area forbids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeepoutRules {
    pub no_tracks: bool,
    pub no_vias: bool,
    pub no_pads: bool,
    pub no_copper_pour: bool,
}

impl Default for KeepoutRules {
    fn default() -> Self {
        Self {
            no_tracks: true,
            no_vias: true,
            no_pads: true,
            no_copper_pour: true,
        }
    }
}

/// A copper zone outline, or a keepout area when `keepout` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub net: NetCode,
    pub layers: LayerSet,
    pub outline: Polygon,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keepout: Option<KeepoutRules>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_clearance: Option<Coord>,
}

impl Zone {
    pub fn copper(net: NetCode, layers: LayerSet, outline: Polygon) -> Self {
        Self {
            name: String::new(),
            net,
            layers,
            outline,
            keepout: None,
            local_clearance: None,
        }
    }

    pub fn keepout(layers: LayerSet, outline: Polygon, rules: KeepoutRules) -> Self {
        Self {
            name: String::new(),
            net: NO_NET,
            layers,
            outline,
            keepout: Some(rules),
            local_clearance: None,
        }
    }

    pub fn is_keepout(&self) -> bool {
        self.keepout.is_some()
    }

    pub fn shape(&self) -> Shape {
        Shape::Polygon(self.outline.clone())
    }
}

// ── Item references ──────────────────────────────────────────────────

/// Stable identifier of any board item, by container index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ItemRef {
    Track { index: usize },
    Via { index: usize },
    Pad { footprint: usize, pad: usize },
    Zone { index: usize },
    Drawing { index: usize },
    Text { index: usize },
    Footprint { index: usize },
    FootprintGraphic { footprint: usize, index: usize },
    FootprintText { footprint: usize, index: usize },
}

impl fmt::Display for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemRef::Track { index } => write!(f, "track #{}", index),
            ItemRef::Via { index } => write!(f, "via #{}", index),
            ItemRef::Pad { footprint, pad } => write!(f, "pad #{} of footprint #{}", pad, footprint),
            ItemRef::Zone { index } => write!(f, "zone #{}", index),
            ItemRef::Drawing { index } => write!(f, "drawing #{}", index),
            ItemRef::Text { index } => write!(f, "text #{}", index),
            ItemRef::Footprint { index } => write!(f, "footprint #{}", index),
            ItemRef::FootprintGraphic { footprint, index } => {
                write!(f, "graphic #{} of footprint #{}", index, footprint)
            }
            ItemRef::FootprintText { footprint, index } => {
                write!(f, "text #{} of footprint #{}", index, footprint)
            }
        }
    }
}

/// A borrowed board item of any kind.
#[derive(Debug, Clone, Copy)]
pub enum BoardItem<'a> {
    Track(&'a Track),
    Via(&'a Via),
    Pad(&'a Footprint, &'a Pad),
    Zone(&'a Zone),
    Drawing(&'a Drawing),
    Text(&'a Text),
    Footprint(&'a Footprint),
}

impl<'a> BoardItem<'a> {
    pub fn layers(&self) -> LayerSet {
        match self {
            BoardItem::Track(t) => LayerSet::single(t.layer),
            BoardItem::Via(v) => v.layers(),
            BoardItem::Pad(_, p) => p.layers,
            BoardItem::Zone(z) => z.layers,
            BoardItem::Drawing(d) => LayerSet::single(d.layer),
            BoardItem::Text(t) => LayerSet::single(t.layer),
            BoardItem::Footprint(fp) => LayerSet::single(fp.layer),
        }
    }

    pub fn net(&self) -> NetCode {
        match self {
            BoardItem::Track(t) => t.net,
            BoardItem::Via(v) => v.net,
            BoardItem::Pad(_, p) => p.net,
            BoardItem::Zone(z) => z.net,
            BoardItem::Drawing(_) | BoardItem::Text(_) | BoardItem::Footprint(_) => NO_NET,
        }
    }

    /// Copper (or graphic) shapes of the item.
    pub fn shapes(&self) -> Vec<Shape> {
        match self {
            BoardItem::Track(t) => vec![t.shape()],
            BoardItem::Via(v) => vec![v.shape()],
            BoardItem::Pad(_, p) => p.copper_shape().or_else(|| p.hole()).into_iter().collect(),
            BoardItem::Zone(z) => vec![z.shape()],
            BoardItem::Drawing(d) => d.shapes(),
            BoardItem::Text(t) => vec![t.shape()],
            BoardItem::Footprint(fp) => vec![Shape::Polygon(Polygon::from_bbox(&fp.bbox()))],
        }
    }

    pub fn bbox(&self) -> BBox {
        match self {
            BoardItem::Drawing(d) => d.bbox(),
            BoardItem::Footprint(fp) => fp.bbox(),
            _ => self
                .shapes()
                .iter()
                .map(Shape::bbox)
                .reduce(|a, b| a.union(&b))
                .unwrap_or_default(),
        }
    }

    /// Where a marker for this item is anchored.
    pub fn position(&self) -> Point {
        match self {
            BoardItem::Track(t) => t.start,
            BoardItem::Via(v) => v.position,
            BoardItem::Pad(_, p) => p.position,
            BoardItem::Zone(z) => z.outline.outline.first().copied().unwrap_or_default(),
            BoardItem::Drawing(d) => d.shape.start_point(),
            BoardItem::Text(t) => t.position,
            BoardItem::Footprint(fp) => fp.position,
        }
    }

    /// One-line human description, as printed in reports.
    pub fn describe(&self, board: &Board) -> String {
        let net = |code: NetCode| board.net_name(code).unwrap_or("<no net>").to_string();
        let layers = |set: LayerSet| {
            let ids: Vec<LayerId> = set.iter().collect();
            match (ids.first(), ids.last()) {
                (Some(a), Some(b)) if a != b => format!("{} - {}", layer_name(*a), layer_name(*b)),
                (Some(a), _) => layer_name(*a),
                _ => "no layer".to_string(),
            }
        };
        match self {
            BoardItem::Track(t) => format!(
                "Track [{}] on {}, length {:.4} mm",
                net(t.net),
                layer_name(t.layer),
                to_mm(t.length())
            ),
            BoardItem::Via(v) => format!("Via [{}] on {}", net(v.net), layers(v.layers())),
            BoardItem::Pad(fp, p) => format!(
                "Pad {} [{}] of {} on {}",
                p.number,
                net(p.net),
                fp.reference,
                layers(p.layers)
            ),
            BoardItem::Zone(z) if z.is_keepout() => format!("Keepout area on {}", layers(z.layers)),
            BoardItem::Zone(z) => format!("Zone [{}] on {}", net(z.net), layers(z.layers)),
            BoardItem::Drawing(d) => format!("Graphic {} on {}", d.kind_name(), layer_name(d.layer)),
            BoardItem::Text(t) => format!("Text '{}' on {}", t.text, layer_name(t.layer)),
            BoardItem::Footprint(fp) => format!("Footprint {} ({})", fp.reference, fp.value),
        }
    }
}

// ── Board ────────────────────────────────────────────────────────────

/// Read-only board model consumed by the checker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Board {
    /// Nil when the file carries no id.
    #[serde(default)]
    pub id: Uuid,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub layers: LayerStack,
    #[serde(default)]
    pub design: DesignSettings,
    #[serde(default)]
    pub netclasses: Vec<NetClass>,
    #[serde(default)]
    pub nets: Vec<NetInfo>,
    #[serde(default)]
    pub tracks: Vec<Track>,
    #[serde(default)]
    pub vias: Vec<Via>,
    #[serde(default)]
    pub footprints: Vec<Footprint>,
    #[serde(default)]
    pub zones: Vec<Zone>,
    #[serde(default)]
    pub drawings: Vec<Drawing>,
    #[serde(default)]
    pub texts: Vec<Text>,
    #[serde(default)]
    pub text_vars: BTreeMap<String, String>,
    #[serde(skip, default)]
    default_netclass: NetClass,
}

impl Board {
    pub fn new(name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            layers: LayerStack::two_layer(),
            design: DesignSettings::default(),
            netclasses: vec![NetClass::default()],
            nets: vec![NetInfo::new(NO_NET, "")],
            tracks: Vec::new(),
            vias: Vec::new(),
            footprints: Vec::new(),
            zones: Vec::new(),
            drawings: Vec::new(),
            texts: Vec::new(),
            text_vars: BTreeMap::new(),
            default_netclass: NetClass::default(),
        }
    }

    // ── Building ─────────────────────────────────────────────────────

    /// Add a net in the default netclass and return its code.
    pub fn add_net(&mut self, name: &str) -> NetCode {
        let code = self.nets.iter().map(|n| n.code).max().unwrap_or(NO_NET) + 1;
        self.nets.push(NetInfo::new(code, name));
        code
    }

    /// Insert or replace a netclass by name.
    pub fn set_netclass(&mut self, netclass: NetClass) {
        match self.netclasses.iter_mut().find(|nc| nc.name == netclass.name) {
            Some(existing) => *existing = netclass,
            None => self.netclasses.push(netclass),
        }
    }

    pub fn assign_netclass(&mut self, net: NetCode, netclass: &str) {
        if let Some(info) = self.nets.iter_mut().find(|n| n.code == net) {
            info.netclass = netclass.to_string();
        }
    }

    pub fn add_track(&mut self, track: Track) -> ItemRef {
        self.tracks.push(track);
        ItemRef::Track {
            index: self.tracks.len() - 1,
        }
    }

    pub fn add_via(&mut self, via: Via) -> ItemRef {
        self.vias.push(via);
        ItemRef::Via {
            index: self.vias.len() - 1,
        }
    }

    pub fn add_footprint(&mut self, footprint: Footprint) -> ItemRef {
        self.footprints.push(footprint);
        ItemRef::Footprint {
            index: self.footprints.len() - 1,
        }
    }

    pub fn add_zone(&mut self, zone: Zone) -> ItemRef {
        self.zones.push(zone);
        ItemRef::Zone {
            index: self.zones.len() - 1,
        }
    }

    pub fn add_drawing(&mut self, drawing: Drawing) -> ItemRef {
        self.drawings.push(drawing);
        ItemRef::Drawing {
            index: self.drawings.len() - 1,
        }
    }

    pub fn add_text(&mut self, text: Text) -> ItemRef {
        self.texts.push(text);
        ItemRef::Text {
            index: self.texts.len() - 1,
        }
    }

    // ── Lookup ───────────────────────────────────────────────────────

    pub fn item(&self, r: ItemRef) -> Option<BoardItem<'_>> {
        Some(match r {
            ItemRef::Track { index } => BoardItem::Track(self.tracks.get(index)?),
            ItemRef::Via { index } => BoardItem::Via(self.vias.get(index)?),
            ItemRef::Pad { footprint, pad } => {
                let fp = self.footprints.get(footprint)?;
                BoardItem::Pad(fp, fp.pads.get(pad)?)
            }
            ItemRef::Zone { index } => BoardItem::Zone(self.zones.get(index)?),
            ItemRef::Drawing { index } => BoardItem::Drawing(self.drawings.get(index)?),
            ItemRef::Text { index } => BoardItem::Text(self.texts.get(index)?),
            ItemRef::Footprint { index } => BoardItem::Footprint(self.footprints.get(index)?),
            ItemRef::FootprintGraphic { footprint, index } => {
                BoardItem::Drawing(self.footprints.get(footprint)?.graphics.get(index)?)
            }
            ItemRef::FootprintText { footprint, index } => {
                BoardItem::Text(self.footprints.get(footprint)?.texts.get(index)?)
            }
        })
    }

    pub fn net_info(&self, code: NetCode) -> Option<&NetInfo> {
        self.nets.iter().find(|n| n.code == code)
    }

    pub fn net_name(&self, code: NetCode) -> Option<&str> {
        if code == NO_NET {
            return None;
        }
        self.net_info(code).map(|n| n.name.as_str())
    }

    pub fn netclass(&self, name: &str) -> Option<&NetClass> {
        self.netclasses.iter().find(|nc| nc.name == name)
    }

    /// The `Default` netclass, falling back to built-in values if the board
    /// does not declare one.
    pub fn default_netclass(&self) -> &NetClass {
        self.netclass(DEFAULT_NETCLASS).unwrap_or(&self.default_netclass)
    }

    /// Netclass governing a net; unknown nets use the default class.
    pub fn netclass_of(&self, net: NetCode) -> &NetClass {
        self.net_info(net)
            .and_then(|info| self.netclass(&info.netclass))
            .unwrap_or_else(|| self.default_netclass())
    }

    /// Every pad with its reference.
    pub fn pads(&self) -> impl Iterator<Item = (ItemRef, &Footprint, &Pad)> + '_ {
        self.footprints.iter().enumerate().flat_map(|(fi, fp)| {
            fp.pads.iter().enumerate().map(move |(pi, pad)| {
                (ItemRef::Pad { footprint: fi, pad: pi }, fp, pad)
            })
        })
    }

    /// Board and footprint graphics on Edge.Cuts.
    pub fn edge_graphics(&self) -> Vec<(ItemRef, &Drawing)> {
        let board = self
            .drawings
            .iter()
            .enumerate()
            .map(|(i, d)| (ItemRef::Drawing { index: i }, d));
        let footprints = self.footprints.iter().enumerate().flat_map(|(fi, fp)| {
            fp.graphics
                .iter()
                .enumerate()
                .map(move |(gi, d)| (ItemRef::FootprintGraphic { footprint: fi, index: gi }, d))
        });
        board
            .chain(footprints)
            .filter(|(_, d)| d.layer == layer::EDGE_CUTS)
            .collect()
    }

    /// All item references, board items first, then footprint children.
    pub fn item_refs(&self) -> Vec<ItemRef> {
        let mut refs = Vec::new();
        refs.extend((0..self.tracks.len()).map(|index| ItemRef::Track { index }));
        refs.extend((0..self.vias.len()).map(|index| ItemRef::Via { index }));
        refs.extend((0..self.zones.len()).map(|index| ItemRef::Zone { index }));
        refs.extend((0..self.drawings.len()).map(|index| ItemRef::Drawing { index }));
        refs.extend((0..self.texts.len()).map(|index| ItemRef::Text { index }));
        for (fi, fp) in self.footprints.iter().enumerate() {
            refs.push(ItemRef::Footprint { index: fi });
            refs.extend((0..fp.pads.len()).map(|pad| ItemRef::Pad { footprint: fi, pad }));
            refs.extend(
                (0..fp.graphics.len()).map(|index| ItemRef::FootprintGraphic { footprint: fi, index }),
            );
            refs.extend((0..fp.texts.len()).map(|index| ItemRef::FootprintText { footprint: fi, index }));
        }
        refs
    }

    pub fn item_count(&self) -> usize {
        self.item_refs().len()
    }

    /// Check structural consistency: unique net codes, known netclasses,
    /// net references that resolve, layer ids in range, non-negative sizes.
    pub fn validate(&self) -> Result<(), BoardError> {
        let mut seen = std::collections::BTreeSet::new();
        for info in &self.nets {
            if !seen.insert(info.code) {
                return Err(BoardError::DuplicateNetCode(info.code));
            }
            if info.code != NO_NET
                && info.netclass != DEFAULT_NETCLASS
                && self.netclass(&info.netclass).is_none()
            {
                return Err(BoardError::UnknownNetClass {
                    net: info.name.clone(),
                    netclass: info.netclass.clone(),
                });
            }
        }
        for item in self.item_refs() {
            let Some(resolved) = self.item(item) else {
                return Err(BoardError::MissingItem(item));
            };
            let code = resolved.net();
            if code != NO_NET && self.net_info(code).is_none() {
                return Err(BoardError::UnknownNet { item, code });
            }
            if let Some(layer) = invalid_layer(&resolved) {
                return Err(BoardError::InvalidLayer { item, layer });
            }
            let negative = match resolved {
                BoardItem::Track(t) => t.width < 0,
                BoardItem::Via(v) => v.diameter < 0 || v.drill < 0,
                BoardItem::Pad(_, p) => p.size.w < 0 || p.size.h < 0 || p.drill.is_some_and(|d| d < 0),
                _ => false,
            };
            if negative {
                return Err(BoardError::NegativeSize { item });
            }
        }
        Ok(())
    }
}

/// First layer id of `item` outside the layer table, read from the raw fields.
fn invalid_layer(item: &BoardItem<'_>) -> Option<u32> {
    let single = |id: LayerId| ((id as usize) >= layer::LAYER_COUNT).then_some(id as u32);
    match item {
        BoardItem::Track(t) => single(t.layer),
        BoardItem::Via(v) => single(v.top).or_else(|| single(v.bottom)),
        BoardItem::Pad(_, p) => p.layers.first_invalid(),
        BoardItem::Zone(z) => z.layers.first_invalid(),
        BoardItem::Drawing(d) => single(d.layer),
        BoardItem::Text(t) => single(t.layer),
        BoardItem::Footprint(fp) => single(fp.layer),
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new("")
    }
}
