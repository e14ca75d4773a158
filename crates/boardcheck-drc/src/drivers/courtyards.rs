use boardcheck_core::layer::{B_CRTYD, F_CRTYD};
use boardcheck_core::outline::{polygonize, CHAINING_EPSILON};
use boardcheck_core::predicates::polygons_overlap;
use boardcheck_core::{BBox, ItemRef, LayerId, Point, Polygon};

use super::{sweep_key, sweep_window, DriverContext, SweepEntry};
use crate::violation::{DrcCode, DrcViolation};

/// A resolved courtyard of one footprint on one side.
struct Courtyard {
    footprint: usize,
    side: LayerId,
    polygons: Vec<Polygon>,
}

/// Missing and malformed courtyards first, then overlaps between footprints
/// on the same side of the board.
pub(super) fn run(ctx: &mut DriverContext<'_>) {
    let board = ctx.board;
    let require = board.design.require_courtyards;
    let mut courtyards: Vec<Courtyard> = Vec::new();

    let total = board.footprints.len();
    for (fi, fp) in board.footprints.iter().enumerate() {
        if !ctx.step(fi, total) {
            return;
        }
        let item = ItemRef::Footprint { index: fi };
        let front = fp.courtyard_graphics(F_CRTYD);
        let back = fp.courtyard_graphics(B_CRTYD);
        if front.is_empty() && back.is_empty() {
            if require {
                ctx.report(
                    DrcViolation::new(DrcCode::MissingCourtyardInFootprint, fp.position)
                        .with_item(item)
                        .with_detail(format!("footprint {}", fp.reference)),
                );
            }
            continue;
        }
        for (side, graphics) in [(F_CRTYD, front), (B_CRTYD, back)] {
            if graphics.is_empty() {
                continue;
            }
            match polygonize(&graphics, CHAINING_EPSILON) {
                Ok(polygons) => courtyards.push(Courtyard {
                    footprint: fi,
                    side,
                    polygons,
                }),
                Err(err) => {
                    ctx.report(
                        DrcViolation::new(
                            DrcCode::MalformedCourtyardInFootprint,
                            err.location().unwrap_or(fp.position),
                        )
                        .with_item(item)
                        .with_detail(format!("footprint {}: {}", fp.reference, err)),
                    );
                }
            }
        }
    }

    for side in [F_CRTYD, B_CRTYD] {
        let on_side: Vec<&Courtyard> = courtyards.iter().filter(|c| c.side == side).collect();
        if !check_overlaps(ctx, &on_side) {
            return;
        }
    }
}

/// Overlaps among the courtyards of one side, one finding per footprint pair.
/// Returns false when the driver should stop.
fn check_overlaps(ctx: &mut DriverContext<'_>, courtyards: &[&Courtyard]) -> bool {
    let board = ctx.board;
    let mut entries: Vec<(SweepEntry, &[Polygon])> = courtyards
        .iter()
        .filter_map(|c| {
            let bbox = c
                .polygons
                .iter()
                .filter_map(Polygon::bbox)
                .reduce(|a, b| a.union(&b))?;
            let entry = SweepEntry {
                item: ItemRef::Footprint { index: c.footprint },
                bbox,
            };
            Some((entry, c.polygons.as_slice()))
        })
        .collect();
    entries.sort_by_key(|(e, _)| sweep_key(e));
    let sorted: Vec<SweepEntry> = entries.iter().map(|(e, _)| *e).collect();

    let total = sorted.len();
    for (i, entry) in sorted.iter().enumerate() {
        if !ctx.step(i, total) {
            return false;
        }
        let a = entries[i].1;
        for (offset, candidate) in sweep_window(&sorted, i + 1, &entry.bbox, 0).enumerate() {
            if !entry.bbox.intersects(&candidate.bbox) {
                continue;
            }
            let b = entries[i + 1 + offset].1;
            if !a.iter().any(|pa| b.iter().any(|pb| polygons_overlap(pa, pb))) {
                continue;
            }
            let (first, second) = if entry.item < candidate.item {
                (entry.item, candidate.item)
            } else {
                (candidate.item, entry.item)
            };
            let names: Vec<&str> = [first, second]
                .iter()
                .filter_map(|r| match r {
                    ItemRef::Footprint { index } => Some(board.footprints[*index].reference.as_str()),
                    _ => None,
                })
                .collect();
            ctx.report(
                DrcViolation::new(
                    DrcCode::OverlappingFootprints,
                    overlap_center(&entry.bbox, &candidate.bbox),
                )
                .with_items(first, second)
                .with_detail(names.join(" and ")),
            );
        }
    }
    true
}

fn overlap_center(a: &BBox, b: &BBox) -> Point {
    let min = Point::new(a.min.x.max(b.min.x), a.min.y.max(b.min.y));
    let max = Point::new(a.max.x.min(b.max.x), a.max.y.min(b.max.y));
    min.midpoint(&max)
}
