use boardcheck_core::predicates::{polygons_overlap, shape_distance};
use boardcheck_core::{same_net, ItemRef, NO_NET};

use super::DriverContext;
use crate::rules::clearance_detail;
use crate::violation::{DrcCode, DrcViolation};

/// Copper zone outlines against each other, then zones whose net has no pad
/// to connect to.
pub(super) fn run(ctx: &mut DriverContext<'_>) {
    let board = ctx.board;
    let zones: Vec<usize> = board
        .zones
        .iter()
        .enumerate()
        .filter(|(_, z)| !z.is_keepout() && z.outline.is_valid())
        .map(|(i, _)| i)
        .collect();

    let total = zones.len();
    for (n, &i) in zones.iter().enumerate() {
        if !ctx.step(n, total) {
            return;
        }
        let a = &board.zones[i];
        let item_a = ItemRef::Zone { index: i };
        let Some(bbox_a) = a.outline.bbox() else {
            continue;
        };

        for &j in &zones[n + 1..] {
            let b = &board.zones[j];
            let item_b = ItemRef::Zone { index: j };
            if !a.layers.copper().intersects(&b.layers.copper()) || same_net(a.net, b.net) {
                continue;
            }
            let (Some(resolved_a), Some(resolved_b)) = (board.item(item_a), board.item(item_b)) else {
                continue;
            };
            let Some(clearance) = ctx.rules.pair_clearance(&resolved_a, &resolved_b) else {
                continue;
            };
            let Some(bbox_b) = b.outline.bbox() else {
                continue;
            };
            if bbox_a.gap_to(&bbox_b) >= clearance as f64 {
                continue;
            }

            let near = shape_distance(&a.shape(), &b.shape());
            if polygons_overlap(&a.outline, &b.outline) {
                ctx.report(DrcViolation::new(DrcCode::ZonesIntersect, near.location).with_items(item_a, item_b));
            } else if near.violates(clearance) {
                ctx.report(
                    DrcViolation::new(DrcCode::ZonesTooClose, near.location)
                        .with_items(item_a, item_b)
                        .with_detail(clearance_detail(clearance, &near)),
                );
            }
        }

        if a.net != NO_NET && !board.pads().any(|(_, _, pad)| pad.net == a.net) {
            let net = board.net_name(a.net).unwrap_or_default();
            let anchor = a.outline.outline.first().copied().unwrap_or_default();
            ctx.report(
                DrcViolation::new(DrcCode::SuspiciousNetForZoneOutline, anchor)
                    .with_item(item_a)
                    .with_detail(format!("no pad on net '{}'", net)),
            );
        }
    }
}
