use rstar::{RTree, RTreeObject, AABB};

use crate::board::{Board, BoardItem, ItemRef};
use crate::geometry::{BBox, Point};
use crate::layer::LayerSet;

/// An entry in the R-tree spatial index, referencing a board item.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialEntry {
    pub item: ItemRef,
    /// Bounding box of the item.
    pub bbox: BBox,
    pub layers: LayerSet,
}

impl SpatialEntry {
    pub fn of(board: &Board, item: ItemRef) -> Option<Self> {
        let resolved = board.item(item)?;
        Some(Self {
            item,
            bbox: resolved.bbox(),
            layers: resolved.layers(),
        })
    }
}

fn envelope_of(bbox: &BBox) -> AABB<[f64; 2]> {
    AABB::from_corners(
        [bbox.min.x as f64, bbox.min.y as f64],
        [bbox.max.x as f64, bbox.max.y as f64],
    )
}

impl RTreeObject for SpatialEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        envelope_of(&self.bbox)
    }
}

/// Spatial index for candidate lookup around a reference item.
pub struct SpatialIndex {
    tree: RTree<SpatialEntry>,
}

impl SpatialIndex {
    pub fn new() -> Self {
        Self { tree: RTree::new() }
    }

    pub fn build(entries: Vec<SpatialEntry>) -> Self {
        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    /// Index the copper items of a board: tracks, vias and copper pads.
    pub fn copper(board: &Board) -> Self {
        let entries = board
            .item_refs()
            .into_iter()
            .filter(|r| match board.item(*r) {
                Some(BoardItem::Track(_)) | Some(BoardItem::Via(_)) => true,
                Some(BoardItem::Pad(_, pad)) => pad.has_copper(),
                _ => false,
            })
            .filter_map(|r| SpatialEntry::of(board, r))
            .collect();
        Self::build(entries)
    }

    pub fn insert(&mut self, entry: SpatialEntry) {
        self.tree.insert(entry);
    }

    /// Entries whose bounding box contains the point.
    pub fn query_point(&self, point: &Point) -> Vec<&SpatialEntry> {
        let mut hits: Vec<&SpatialEntry> = self
            .tree
            .locate_in_envelope_intersecting(&AABB::from_point([point.x as f64, point.y as f64]))
            .collect();
        hits.sort_by_key(|e| e.item);
        hits
    }

    /// Entries intersecting `region` on any of `layers`, in item order so that
    /// callers iterate deterministically.
    pub fn query_region(&self, region: &BBox, layers: LayerSet) -> Vec<&SpatialEntry> {
        let mut hits: Vec<&SpatialEntry> = self
            .tree
            .locate_in_envelope_intersecting(&envelope_of(region))
            .filter(|e| e.layers.intersects(&layers))
            .collect();
        hits.sort_by_key(|e| e.item);
        hits
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new()
    }
}
