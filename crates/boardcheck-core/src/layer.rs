use serde::{Deserialize, Serialize};

/// A board layer identifier. Copper layers come first, front to back.
pub type LayerId = u8;

pub const F_CU: LayerId = 0;
/// First inner copper layer; inner layers run `IN1_CU..B_CU`.
pub const IN1_CU: LayerId = 1;
pub const B_CU: LayerId = 31;
pub const F_SILKS: LayerId = 32;
pub const B_SILKS: LayerId = 33;
pub const F_MASK: LayerId = 34;
pub const B_MASK: LayerId = 35;
pub const F_CRTYD: LayerId = 36;
pub const B_CRTYD: LayerId = 37;
pub const EDGE_CUTS: LayerId = 38;
pub const DWGS_USER: LayerId = 39;
pub const LAYER_COUNT: usize = 40;

/// Canonical layer name as used in board files and reports.
pub fn layer_name(id: LayerId) -> String {
    match id {
        F_CU => "F.Cu".to_string(),
        B_CU => "B.Cu".to_string(),
        IN1_CU..=30 => format!("In{}.Cu", id),
        F_SILKS => "F.SilkS".to_string(),
        B_SILKS => "B.SilkS".to_string(),
        F_MASK => "F.Mask".to_string(),
        B_MASK => "B.Mask".to_string(),
        F_CRTYD => "F.CrtYd".to_string(),
        B_CRTYD => "B.CrtYd".to_string(),
        EDGE_CUTS => "Edge.Cuts".to_string(),
        DWGS_USER => "Dwgs.User".to_string(),
        _ => format!("Layer{}", id),
    }
}

pub fn is_copper(id: LayerId) -> bool {
    id <= B_CU
}

/// Broad role of a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    Copper,
    Silkscreen,
    SolderMask,
    Courtyard,
    EdgeCuts,
    User,
}

impl LayerKind {
    pub fn of(id: LayerId) -> Self {
        match id {
            F_CU..=B_CU => LayerKind::Copper,
            F_SILKS | B_SILKS => LayerKind::Silkscreen,
            F_MASK | B_MASK => LayerKind::SolderMask,
            F_CRTYD | B_CRTYD => LayerKind::Courtyard,
            EDGE_CUTS => LayerKind::EdgeCuts,
            _ => LayerKind::User,
        }
    }
}

/// A set of layers stored as a bit mask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerSet(pub u64);

impl LayerSet {
    pub const EMPTY: LayerSet = LayerSet(0);

    /// Ids at or above `LAYER_COUNT` are not layers and give an empty set.
    pub fn single(id: LayerId) -> Self {
        LayerSet::EMPTY.with(id)
    }

    /// Copper layers from `a` to `b` inclusive, in either order.
    pub fn copper_span(a: LayerId, b: LayerId) -> Self {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        (lo..=hi.min(B_CU)).fold(LayerSet::EMPTY, |set, id| set.with(id))
    }

    pub fn all_copper() -> Self {
        Self::copper_span(F_CU, B_CU)
    }

    pub fn with(self, id: LayerId) -> Self {
        if (id as usize) < LAYER_COUNT {
            LayerSet(self.0 | (1u64 << id))
        } else {
            self
        }
    }

    /// The lowest set bit that names no layer, as read from an unchecked mask.
    pub fn first_invalid(&self) -> Option<u32> {
        let high = self.0 >> LAYER_COUNT;
        (high != 0).then(|| LAYER_COUNT as u32 + high.trailing_zeros())
    }

    pub fn contains(&self, id: LayerId) -> bool {
        (id as usize) < LAYER_COUNT && self.0 & (1u64 << id) != 0
    }

    pub fn intersects(&self, other: &LayerSet) -> bool {
        self.0 & other.0 != 0
    }

    pub fn intersection(&self, other: &LayerSet) -> LayerSet {
        LayerSet(self.0 & other.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn copper(&self) -> LayerSet {
        self.intersection(&LayerSet::all_copper())
    }

    pub fn has_copper(&self) -> bool {
        !self.copper().is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = LayerId> + '_ {
        (0..LAYER_COUNT as LayerId).filter(move |id| self.contains(*id))
    }
}

impl FromIterator<LayerId> for LayerSet {
    fn from_iter<I: IntoIterator<Item = LayerId>>(iter: I) -> Self {
        iter.into_iter().fold(LayerSet::EMPTY, LayerSet::with)
    }
}

/// One enabled layer of the board stack-up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub id: LayerId,
    pub name: String,
    pub kind: LayerKind,
}

impl Layer {
    pub fn new(id: LayerId) -> Self {
        Self {
            id,
            name: layer_name(id),
            kind: LayerKind::of(id),
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }
}

/// The enabled layers of a board, copper ordered front to back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerStack {
    layers: Vec<Layer>,
}

impl LayerStack {
    pub fn new() -> Self {
        Self { layers: Vec::new() }
    }

    /// A two-layer board with the usual technical layers.
    pub fn two_layer() -> Self {
        let mut stack = Self::new();
        for id in [
            F_CU, B_CU, F_SILKS, B_SILKS, F_MASK, B_MASK, F_CRTYD, B_CRTYD, EDGE_CUTS, DWGS_USER,
        ] {
            stack.add_layer(Layer::new(id));
        }
        stack
    }

    /// A stack with `copper` copper layers (at least two).
    pub fn with_copper_layers(copper: usize) -> Self {
        let mut stack = Self::two_layer();
        let inner = copper.saturating_sub(2).min(30);
        for i in 0..inner {
            stack.add_layer(Layer::new(IN1_CU + i as LayerId));
        }
        stack
    }

    pub fn add_layer(&mut self, layer: Layer) {
        if self.get_layer(layer.id).is_none() {
            self.layers.push(layer);
            self.layers.sort_by_key(|l| l.id);
        }
    }

    pub fn get_layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub fn all_layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn enabled(&self) -> LayerSet {
        self.layers.iter().map(|l| l.id).collect()
    }

    pub fn is_enabled(&self, id: LayerId) -> bool {
        self.get_layer(id).is_some()
    }

    /// Enabled copper layers, front to back.
    pub fn copper_layers(&self) -> Vec<LayerId> {
        self.layers
            .iter()
            .filter(|l| is_copper(l.id))
            .map(|l| l.id)
            .collect()
    }

    /// Outer copper layers are F.Cu and B.Cu.
    pub fn is_outer(&self, id: LayerId) -> bool {
        id == F_CU || id == B_CU
    }

    /// True when the two copper layers are neighbours in the stack-up,
    /// which is what a micro via is allowed to join.
    pub fn are_adjacent(&self, a: LayerId, b: LayerId) -> bool {
        let order = self.copper_layers();
        let pos = |id| order.iter().position(|&l| l == id);
        match (pos(a), pos(b)) {
            (Some(i), Some(j)) => i.abs_diff(j) == 1,
            _ => false,
        }
    }
}

impl Default for LayerStack {
    fn default() -> Self {
        Self::two_layer()
    }
}
