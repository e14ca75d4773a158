use boardcheck_core::predicates::shape_distance;
use boardcheck_core::{BoardItem, ItemRef, KeepoutRules, SpatialIndex};

use super::DriverContext;
use crate::violation::{DrcCode, DrcViolation};

/// Code reported when `item` lies in a keepout with `rules`, or `None` when
/// the keepout allows that kind of item.
fn forbidden(item: &BoardItem<'_>, rules: &KeepoutRules) -> Option<DrcCode> {
    match item {
        BoardItem::Track(_) if rules.no_tracks => Some(DrcCode::TrackInsideKeepout),
        BoardItem::Via(_) if rules.no_vias => Some(DrcCode::ViaInsideKeepout),
        BoardItem::Pad(..) if rules.no_pads => Some(DrcCode::PadInsideKeepout),
        _ => None,
    }
}

pub(super) fn run(ctx: &mut DriverContext<'_>) {
    let board = ctx.board;
    let keepouts: Vec<usize> = board
        .zones
        .iter()
        .enumerate()
        .filter(|(_, z)| z.is_keepout() && z.outline.is_valid())
        .map(|(i, _)| i)
        .collect();
    if keepouts.is_empty() {
        return;
    }
    let index = SpatialIndex::copper(board);

    let total = keepouts.len();
    for (n, &i) in keepouts.iter().enumerate() {
        if !ctx.step(n, total) {
            return;
        }
        let zone = &board.zones[i];
        let (Some(rules), Some(region)) = (zone.keepout, zone.outline.bbox()) else {
            continue;
        };
        let area = zone.shape();
        for entry in index.query_region(&region, zone.layers.copper()) {
            let Some(item) = board.item(entry.item) else {
                continue;
            };
            let Some(code) = forbidden(&item, &rules) else {
                continue;
            };
            let inside = item
                .shapes()
                .iter()
                .map(|shape| shape_distance(&area, shape))
                .find(|near| near.distance == 0.0);
            if let Some(near) = inside {
                ctx.report(DrcViolation::new(code, near.location).with_items(entry.item, ItemRef::Zone { index: i }));
            }
        }
    }
}
