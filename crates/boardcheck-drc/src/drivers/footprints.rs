use std::collections::BTreeMap;

use boardcheck_core::{ItemRef, Point};

use super::DriverContext;
use crate::violation::{DrcCode, DrcViolation};

/// Placed footprints against the netlist: components never placed, references
/// placed twice, and footprints the netlist does not know.
pub(super) fn run(ctx: &mut DriverContext<'_>) {
    let Some(netlist) = ctx.netlist else {
        return;
    };
    let board = ctx.board;

    let mut placed: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (fi, fp) in board.footprints.iter().enumerate() {
        if !fp.reference.is_empty() {
            placed.entry(fp.reference.as_str()).or_default().push(fi);
        }
    }

    let total = netlist.components.len() + placed.len();
    let mut done = 0;

    for component in &netlist.components {
        if !ctx.step(done, total) {
            return;
        }
        done += 1;
        if !placed.contains_key(component.reference.as_str()) {
            ctx.report(
                DrcViolation::new(DrcCode::MissingFootprint, Point::default())
                    .with_component(&component.reference)
                    .with_detail(format!("{} ({})", component.reference, component.value)),
            );
        }
    }

    for (reference, indices) in &placed {
        if !ctx.step(done, total) {
            return;
        }
        done += 1;
        let first = &board.footprints[indices[0]];
        if let Some(&second) = indices.get(1) {
            let duplicate = &board.footprints[second];
            ctx.report(
                DrcViolation::new(DrcCode::DuplicateFootprint, duplicate.position)
                    .with_component(reference)
                    .with_item(ItemRef::Footprint { index: second })
                    .with_detail(format!("{} placed {} times", reference, indices.len())),
            );
        }
        if !netlist.contains(reference) {
            ctx.report(
                DrcViolation::new(DrcCode::ExtraFootprint, first.position)
                    .with_component(reference)
                    .with_item(ItemRef::Footprint { index: indices[0] })
                    .with_detail(format!("{} is not in the netlist", reference)),
            );
        }
    }
}
