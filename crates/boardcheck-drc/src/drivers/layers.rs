use boardcheck_core::layer::layer_name;

use super::DriverContext;
use crate::violation::{DrcCode, DrcViolation};

/// Items that live only on layers the stackup does not enable.
pub(super) fn run(ctx: &mut DriverContext<'_>) {
    let board = ctx.board;
    let enabled = board.layers.enabled();
    let items = board.item_refs();

    let total = items.len();
    for (i, &item_ref) in items.iter().enumerate() {
        if !ctx.step(i, total) {
            return;
        }
        let Some(item) = board.item(item_ref) else {
            continue;
        };
        let layers = item.layers();
        if layers.is_empty() || layers.intersects(&enabled) {
            continue;
        }
        let names: Vec<String> = layers.iter().map(layer_name).collect();
        ctx.report(
            DrcViolation::new(DrcCode::DisabledLayerItem, item.position())
                .with_item(item_ref)
                .with_detail(format!("{} on {}", item.describe(board), names.join(", "))),
        );
    }
}
