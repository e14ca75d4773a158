use boardcheck_core::layer::F_CU;
use boardcheck_core::{Board, NetClass, Point, Track};
use boardcheck_drc::{DrcCategory, DrcCode, DrcEngine, DrcOptions, NullObserver};
use proptest::prelude::*;

fn parallel_pair(gap: i64, clearance: i64, same_net: bool) -> Board {
    let mut board = Board::new("props");
    board.design.min_track_width = 0;
    board.set_netclass(NetClass::default().with_clearance(clearance));
    let a = board.add_net("A");
    let b = if same_net { a } else { board.add_net("B") };
    board.add_track(Track::new(Point::new(0, 0), Point::new(10_000, 0), 0, F_CU, a));
    board.add_track(Track::new(Point::new(2_000, gap), Point::new(8_000, gap), 0, F_CU, b));
    board
}

fn near_count(board: &Board) -> usize {
    DrcEngine::new(DrcOptions::only(&[DrcCategory::Tracks]))
        .run(board, None, &mut NullObserver)
        .count(DrcCode::TrackNearTrack)
}

proptest! {
    #[test]
    fn prop_reported_iff_strictly_closer(gap in 1i64..5_000, clearance in 1i64..5_000) {
        let board = parallel_pair(gap, clearance, false);
        prop_assert_eq!(near_count(&board), usize::from(gap < clearance));
    }

    #[test]
    fn prop_same_net_never_reported(gap in 0i64..5_000, clearance in 1i64..5_000) {
        let board = parallel_pair(gap, clearance, true);
        prop_assert_eq!(near_count(&board), 0);
    }
}
