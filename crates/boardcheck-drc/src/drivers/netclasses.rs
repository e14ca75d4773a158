use super::DriverContext;

/// Netclass values looser than the board minimums. Runs first: the geometric
/// drivers rely on the floor having been substituted.
pub(super) fn run(ctx: &mut DriverContext<'_>) {
    let board = ctx.board;
    let total = board.netclasses.len();
    for (done, nc) in board.netclasses.iter().enumerate() {
        if !ctx.step(done, total) {
            return;
        }
        for violation in ctx.rules.validate_netclass(nc) {
            ctx.report(violation);
        }
    }
}
