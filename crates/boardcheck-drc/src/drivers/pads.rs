use boardcheck_core::predicates::shape_distance;
use boardcheck_core::{BoardItem, ItemRef, Pad, Shape};

use super::{sort_for_sweep, sweep_window, DriverContext, SweepEntry};
use crate::rules::clearance_detail;
use crate::violation::{DrcCode, DrcViolation};

/// Pad against pad, X-sorted. Pads of one footprint sharing a number are the
/// same electrical pin and may overlap.
pub(super) fn run(ctx: &mut DriverContext<'_>) {
    let board = ctx.board;
    let mut sorted: Vec<SweepEntry> = board
        .pads()
        .filter_map(|(item, _, pad)| {
            let shape = pad.copper_shape().or_else(|| pad.hole())?;
            Some(SweepEntry {
                item,
                bbox: shape.bbox(),
            })
        })
        .collect();
    sort_for_sweep(&mut sorted);

    let reach = ctx.state.worst_clearance;
    let total = sorted.len();
    for (i, entry) in sorted.iter().enumerate() {
        if !ctx.step(i, total) {
            return;
        }
        let Some(a @ BoardItem::Pad(_, pad_a)) = board.item(entry.item) else {
            continue;
        };
        for candidate in sweep_window(&sorted, i + 1, &entry.bbox, reach) {
            let Some(b @ BoardItem::Pad(_, pad_b)) = board.item(candidate.item) else {
                continue;
            };
            if same_pin(entry.item, pad_a, candidate.item, pad_b) {
                continue;
            }
            if let Some(violation) = check_pair(ctx, (entry.item, a, pad_a), (candidate.item, b, pad_b)) {
                ctx.report(violation);
            }
        }
    }
}

fn same_pin(a: ItemRef, pad_a: &Pad, b: ItemRef, pad_b: &Pad) -> bool {
    match (a, b) {
        (ItemRef::Pad { footprint: fa, .. }, ItemRef::Pad { footprint: fb, .. }) => {
            fa == fb && !pad_a.number.is_empty() && pad_a.number == pad_b.number
        }
        _ => false,
    }
}

type PadView<'a> = (ItemRef, BoardItem<'a>, &'a Pad);

fn check_pair(ctx: &DriverContext<'_>, a: PadView<'_>, b: PadView<'_>) -> Option<DrcViolation> {
    let rules = ctx.rules;
    let (ref_a, item_a, pad_a) = a;
    let (ref_b, item_b, pad_b) = b;

    if pad_a.copper_layers().intersects(&pad_b.copper_layers()) {
        let clearance = rules.pair_clearance(&item_a, &item_b)?;
        let near = shape_distance(&pad_a.copper_shape()?, &pad_b.copper_shape()?);
        return near.violates(clearance).then(|| {
            DrcViolation::new(DrcCode::PadNearPad, near.location)
                .with_items(ref_a, ref_b)
                .with_detail(clearance_detail(clearance, &near))
        });
    }

    // No shared copper: a drill of one pad may still pass through copper of
    // the other.
    let clearance = rules.item_clearance(&item_a).max(rules.item_clearance(&item_b));
    let hole_test = |holed: &Pad, other: &Pad| -> Option<(Shape, Shape)> {
        let hole = holed.hole()?;
        if !holed.hole_layers().intersects(&other.copper_layers()) {
            return None;
        }
        Some((hole, other.copper_shape()?))
    };
    let (hole, copper) = hole_test(pad_a, pad_b).or_else(|| hole_test(pad_b, pad_a))?;
    let near = shape_distance(&hole, &copper);
    near.violates(clearance).then(|| {
        DrcViolation::new(DrcCode::HoleNearPad, near.location)
            .with_items(ref_a, ref_b)
            .with_detail(clearance_detail(clearance, &near))
    })
}
