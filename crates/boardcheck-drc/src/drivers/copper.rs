use boardcheck_core::layer::is_copper;
use boardcheck_core::predicates::shape_distance;
use boardcheck_core::{Board, BoardItem, ItemRef, Proximity, SpatialIndex};

use super::DriverContext;
use crate::rules::clearance_detail;
use crate::violation::{DrcCode, DrcViolation};

/// Graphics and text drawn on copper layers, board-level and footprint-level.
fn copper_graphics(board: &Board) -> Vec<ItemRef> {
    let mut refs = Vec::new();
    refs.extend(
        board
            .drawings
            .iter()
            .enumerate()
            .filter(|(_, d)| is_copper(d.layer))
            .map(|(index, _)| ItemRef::Drawing { index }),
    );
    refs.extend(
        board
            .texts
            .iter()
            .enumerate()
            .filter(|(_, t)| is_copper(t.layer))
            .map(|(index, _)| ItemRef::Text { index }),
    );
    for (fi, fp) in board.footprints.iter().enumerate() {
        refs.extend(
            fp.graphics
                .iter()
                .enumerate()
                .filter(|(_, d)| is_copper(d.layer))
                .map(|(index, _)| ItemRef::FootprintGraphic { footprint: fi, index }),
        );
        refs.extend(
            fp.texts
                .iter()
                .enumerate()
                .filter(|(_, t)| is_copper(t.layer))
                .map(|(index, _)| ItemRef::FootprintText { footprint: fi, index }),
        );
    }
    refs
}

fn owner(item: ItemRef) -> Option<usize> {
    match item {
        ItemRef::Pad { footprint, .. }
        | ItemRef::FootprintGraphic { footprint, .. }
        | ItemRef::FootprintText { footprint, .. } => Some(footprint),
        _ => None,
    }
}

/// Copper graphics against tracks, vias and pads. A footprint's own copper
/// artwork is part of its pads and is not tested against them.
pub(super) fn run(ctx: &mut DriverContext<'_>) {
    let board = ctx.board;
    let graphics = copper_graphics(board);
    if graphics.is_empty() {
        return;
    }
    let index = SpatialIndex::copper(board);

    let total = graphics.len();
    for (n, &graphic_ref) in graphics.iter().enumerate() {
        if !ctx.step(n, total) {
            return;
        }
        let Some(graphic) = board.item(graphic_ref) else {
            continue;
        };
        let graphic_shapes = graphic.shapes();
        let region = graphic.bbox().inflate(ctx.state.worst_clearance);

        for entry in index.query_region(&region, graphic.layers()) {
            if owner(graphic_ref).is_some() && owner(graphic_ref) == owner(entry.item) {
                continue;
            }
            let Some(item) = board.item(entry.item) else {
                continue;
            };
            let code = match item {
                BoardItem::Track(_) => DrcCode::TrackNearCopper,
                BoardItem::Via(_) => DrcCode::ViaNearCopper,
                BoardItem::Pad(..) => DrcCode::PadNearCopper,
                _ => continue,
            };
            let Some(clearance) = ctx.rules.pair_clearance(&item, &graphic) else {
                continue;
            };
            let near = item
                .shapes()
                .iter()
                .flat_map(|a| graphic_shapes.iter().map(move |b| shape_distance(a, b)))
                .reduce(|x: Proximity, y| if y.distance < x.distance { y } else { x });
            if let Some(near) = near.filter(|p| p.violates(clearance)) {
                ctx.report(
                    DrcViolation::new(code, near.location)
                        .with_items(entry.item, graphic_ref)
                        .with_detail(clearance_detail(clearance, &near)),
                );
            }
        }
    }
}
