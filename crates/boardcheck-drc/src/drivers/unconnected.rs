use boardcheck_core::{Connectivity, Coord};

use super::DriverContext;
use crate::rules::fmt_mm;
use crate::violation::{DrcCode, DrcViolation};

/// One finding per ratsnest edge still to be routed.
pub(super) fn run(ctx: &mut DriverContext<'_>) {
    let board = ctx.board;
    let connectivity = Connectivity::build(board);

    let total = connectivity.ratsnest.len();
    for (i, edge) in connectivity.ratsnest.iter().enumerate() {
        if !ctx.step(i, total) {
            return;
        }
        let net = board.net_name(edge.net).unwrap_or_default();
        ctx.report(
            DrcViolation::new(DrcCode::UnconnectedItems, edge.from_pos)
                .with_items(edge.from, edge.to)
                .with_detail(format!(
                    "net '{}', length {}",
                    net,
                    fmt_mm(edge.length.round() as Coord)
                )),
        );
    }
}
