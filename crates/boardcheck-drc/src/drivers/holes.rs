use boardcheck_core::{BBox, Coord, ItemRef, Point};

use super::{sweep_key, sweep_window, DriverContext, SweepEntry};
use crate::rules::fmt_mm;
use crate::violation::{DrcCode, DrcViolation};

#[derive(Debug, Clone, Copy)]
struct Hole {
    center: Point,
    radius: Coord,
}

/// Every drilled hole against its neighbours. Holes stacked at the same
/// centre are a single drill hit and are allowed.
pub(super) fn run(ctx: &mut DriverContext<'_>) {
    let board = ctx.board;
    let min_spacing = board.design.min_hole_to_hole;

    let mut holes: Vec<(SweepEntry, Hole)> = Vec::new();
    for (index, via) in board.vias.iter().enumerate() {
        holes.push(hole_entry(ItemRef::Via { index }, via.position, via.drill));
    }
    for (item, _, pad) in board.pads() {
        if let Some(drill) = pad.drill.filter(|d| *d > 0) {
            holes.push(hole_entry(item, pad.position, drill));
        }
    }
    // Sweep entries and holes share one order, so a sweep position indexes both.
    holes.sort_by_key(|(e, _)| sweep_key(e));
    let sorted: Vec<SweepEntry> = holes.iter().map(|(e, _)| *e).collect();

    let total = sorted.len();
    for (i, entry) in sorted.iter().enumerate() {
        if !ctx.step(i, total) {
            return;
        }
        let a = holes[i].1;
        for (offset, candidate) in sweep_window(&sorted, i + 1, &entry.bbox, min_spacing).enumerate() {
            let b = holes[i + 1 + offset].1;
            if a.center == b.center {
                continue;
            }
            let gap = a.center.distance_to(&b.center) - (a.radius + b.radius) as f64;
            if gap < min_spacing as f64 {
                ctx.report(
                    DrcViolation::new(DrcCode::DrilledHolesTooClose, a.center.midpoint(&b.center))
                        .with_items(entry.item, candidate.item)
                        .with_detail(format!(
                            "minimum {}; actual {}",
                            fmt_mm(min_spacing),
                            fmt_mm(gap.max(0.0).round() as Coord)
                        )),
                );
            }
        }
    }
}

fn hole_entry(item: ItemRef, center: Point, drill: Coord) -> (SweepEntry, Hole) {
    let radius = drill / 2;
    let bbox = BBox::new(center, center).inflate(radius);
    (SweepEntry { item, bbox }, Hole { center, radius })
}
