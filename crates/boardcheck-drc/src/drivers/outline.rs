use boardcheck_core::Point;

use super::DriverContext;
use crate::violation::{DrcCode, DrcViolation};

/// Reports the outline failure recorded when the pass resolved Edge.Cuts.
/// A board with no edge graphics at all is not checked.
pub(super) fn run(ctx: &mut DriverContext<'_>) {
    if !ctx.step(0, 1) {
        return;
    }
    let Some(err) = ctx.state.outline_error else {
        return;
    };
    let at = err.location().unwrap_or_else(Point::default);
    let mut violation = DrcViolation::new(DrcCode::InvalidOutline, at).with_detail(err.to_string());
    if let Some((item, _)) = ctx
        .board
        .edge_graphics()
        .into_iter()
        .find(|(_, d)| d.shape.start_point() == at)
    {
        violation = violation.with_item(item);
    }
    ctx.report(violation);
}
