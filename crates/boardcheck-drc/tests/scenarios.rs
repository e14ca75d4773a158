//! End-to-end passes over small hand-built boards.

use boardcheck_core::layer::{B_CRTYD, EDGE_CUTS, F_CRTYD, F_CU, F_SILKS, IN1_CU};
use boardcheck_core::{
    mm, Board, Drawing, Footprint, GraphicShape, ItemRef, KeepoutRules, LayerSet, NetClass,
    Netlist, NetlistComponent, Pad, Point, Polygon, Size, Text, Track, Via, Zone,
};
use boardcheck_drc::{
    CollectingObserver, DrcCategory, DrcCode, DrcEngine, DrcOptions, DrcReport, NullObserver,
    ReportLimit, RunState, Subject,
};

fn run(board: &Board, options: DrcOptions) -> DrcReport {
    DrcEngine::new(options).run(board, None, &mut NullObserver)
}

fn run_with_netlist(board: &Board, netlist: &Netlist, options: DrcOptions) -> DrcReport {
    DrcEngine::new(options).run(board, Some(netlist), &mut NullObserver)
}

/// Two nets with a 100 nm default clearance and no track width floor, so
/// that zero-width tracks measure centre line to centre line.
fn bare_board() -> (Board, u32, u32) {
    let mut board = Board::new("scenario");
    board.design.min_track_width = 0;
    board.set_netclass(NetClass::default().with_clearance(100));
    let a = board.add_net("A");
    let b = board.add_net("B");
    (board, a, b)
}

fn thin(board: &mut Board, from: (i64, i64), to: (i64, i64), net: u32) -> ItemRef {
    board.add_track(Track::new(Point::new(from.0, from.1), Point::new(to.0, to.1), 0, F_CU, net))
}

fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> GraphicShape {
    GraphicShape::Rect {
        start: Point::new(mm(x0), mm(y0)),
        end: Point::new(mm(x1), mm(y1)),
    }
}

// ── Tracks ───────────────────────────────────────────────────────────

#[test]
fn test_parallel_tracks_too_close() {
    let (mut board, a, b) = bare_board();
    thin(&mut board, (0, 0), (1000, 0), a);
    thin(&mut board, (0, 50), (1000, 50), b);

    let report = run(&board, DrcOptions::only(&[DrcCategory::Tracks]));
    assert_eq!(report.violations.len(), 1);
    assert_eq!(report.violations[0].code, DrcCode::TrackNearTrack);
    assert_eq!(report.violations[0].items().count(), 2);
}

#[test]
fn test_parallel_tracks_far_enough() {
    let (mut board, a, b) = bare_board();
    thin(&mut board, (0, 0), (1000, 0), a);
    thin(&mut board, (0, 150), (1000, 150), b);

    let report = run(&board, DrcOptions::only(&[DrcCategory::Tracks]));
    assert!(report.violations.is_empty());
}

#[test]
fn test_same_net_never_violates_clearance() {
    let (mut board, a, _) = bare_board();
    thin(&mut board, (0, 0), (1000, 0), a);
    thin(&mut board, (0, 10), (1000, 10), a);
    thin(&mut board, (500, -500), (500, 500), a);

    let report = run(&board, DrcOptions::only(&[DrcCategory::Tracks]));
    assert!(report.violations.is_empty());
}

#[test]
fn test_short_and_crossing() {
    let (mut board, a, b) = bare_board();
    thin(&mut board, (0, 0), (1000, 0), a);
    thin(&mut board, (1000, 0), (2000, 0), b);
    thin(&mut board, (500, -500), (500, 500), b);

    let report = run(&board, DrcOptions::only(&[DrcCategory::Tracks]));
    assert_eq!(report.violations.len(), 1, "a reference track stops after its first finding");

    let all = run(&board, DrcOptions::only(&[DrcCategory::Tracks]).with_all_track_errors(true));
    assert_eq!(all.count(DrcCode::Short), 1);
    assert_eq!(all.count(DrcCode::TracksCrossing), 1);
}

#[test]
fn test_unconnected_tracks_meeting_end_to_end() {
    let (mut board, _, _) = bare_board();
    let first = thin(&mut board, (0, 0), (1000, 0), 0);
    let second = thin(&mut board, (1000, 0), (2000, 0), 0);

    let report = run(&board, DrcOptions::only(&[DrcCategory::Tracks]));
    assert_eq!(report.violations.len(), 1);
    assert_eq!(report.count(DrcCode::Short), 0);
    assert_eq!(report.violations[0].code.category(), DrcCategory::Tracks);
    assert_eq!(report.violations[0].items().collect::<Vec<_>>(), vec![first, second]);
}

#[test]
fn test_via_sizes() {
    let mut board = Board::new("vias");
    let net = board.add_net("A");
    board.add_via(Via::through(Point::new(0, 0), mm(0.3), mm(0.2), net));
    board.add_via(Via::through(Point::new(mm(5.0), 0), mm(0.5), mm(0.6), net));

    let report = run(&board, DrcOptions::only(&[DrcCategory::Tracks]).with_all_track_errors(true));
    assert_eq!(report.count(DrcCode::TooSmallVia), 1);
    assert_eq!(report.count(DrcCode::TooSmallViaDrill), 1);
    assert_eq!(report.count(DrcCode::ViaHoleBigger), 1);
}

#[test]
fn test_track_near_board_edge() {
    let mut board = Board::new("edge");
    let net = board.add_net("A");
    board.add_drawing(Drawing::new(rect(0.0, 0.0, 10.0, 10.0), mm(0.1), EDGE_CUTS));
    board.add_track(Track::new(
        Point::new(mm(1.0), mm(0.1)),
        Point::new(mm(5.0), mm(0.1)),
        mm(0.25),
        F_CU,
        net,
    ));

    let report = run(&board, DrcOptions::only(&[DrcCategory::Tracks]));
    assert_eq!(report.count(DrcCode::TrackNearEdge), 1);
    assert!(report.outline.is_some());
}

#[test]
fn test_category_report_limit() {
    let (mut board, a, b) = bare_board();
    for i in 0..4 {
        let net = if i % 2 == 0 { a } else { b };
        thin(&mut board, (0, i * 50), (1000, i * 50), net);
    }
    let mut options = DrcOptions::only(&[DrcCategory::Tracks]);
    options.set_limit(DrcCategory::Tracks, ReportLimit::FirstN(1));

    let report = run(&board, options);
    assert_eq!(report.violations.len(), 1);
}

// ── Netclasses ───────────────────────────────────────────────────────

#[test]
fn test_netclass_below_floor_uses_floor() {
    let (mut board, a, b) = bare_board();
    board.design.min_clearance = 200;
    thin(&mut board, (0, 0), (1000, 0), a);
    thin(&mut board, (0, 150), (1000, 150), b);

    let report = run(
        &board,
        DrcOptions::only(&[DrcCategory::Netclasses, DrcCategory::Tracks]),
    );
    assert_eq!(report.count(DrcCode::NetclassClearance), 1);
    assert_eq!(report.count(DrcCode::TrackNearTrack), 1);
    assert_eq!(report.violations[0].code, DrcCode::NetclassClearance);
    assert!(matches!(&report.violations[0].subjects[0], Subject::NetClass(name) if name == "Default"));
}

// ── Pads and holes ───────────────────────────────────────────────────

#[test]
fn test_pad_near_pad() {
    let mut board = Board::new("pads");
    let a = board.add_net("A");
    let b = board.add_net("B");
    let size = Size::new(mm(1.0), mm(1.0));
    board.add_footprint(
        Footprint::new("R1", "10k", Point::new(0, 0)).with_pad(Pad::smd("1", Point::new(0, 0), size, F_CU, a)),
    );
    board.add_footprint(
        Footprint::new("R2", "10k", Point::new(mm(1.1), 0))
            .with_pad(Pad::smd("1", Point::new(mm(1.1), 0), size, F_CU, b)),
    );

    let report = run(&board, DrcOptions::only(&[DrcCategory::PadToPad]));
    assert_eq!(report.count(DrcCode::PadNearPad), 1);
}

#[test]
fn test_pads_of_one_pin_may_overlap() {
    let mut board = Board::new("pads");
    let a = board.add_net("A");
    let b = board.add_net("B");
    let size = Size::new(mm(1.0), mm(1.0));
    board.add_footprint(
        Footprint::new("U1", "QFN", Point::new(0, 0))
            .with_pad(Pad::smd("EP", Point::new(0, 0), size, F_CU, a))
            .with_pad(Pad::smd("EP", Point::new(mm(0.5), 0), size, F_CU, b)),
    );

    let report = run(&board, DrcOptions::only(&[DrcCategory::PadToPad]));
    assert!(report.violations.is_empty());
}

#[test]
fn test_drilled_holes_too_close() {
    let mut board = Board::new("holes");
    let a = board.add_net("A");
    let b = board.add_net("B");
    board.add_via(Via::through(Point::new(0, 0), mm(0.6), mm(0.3), a));
    board.add_via(Via::through(Point::new(mm(0.4), 0), mm(0.6), mm(0.3), b));
    // Stacked on the first: the same drill hit.
    board.add_via(Via::through(Point::new(0, 0), mm(0.6), mm(0.3), a));

    let report = run(&board, DrcOptions::only(&[DrcCategory::DrilledHoles]));
    assert_eq!(report.count(DrcCode::DrilledHolesTooClose), 2);
    assert!(report
        .violations
        .iter()
        .all(|v| v.items().any(|i| i == ItemRef::Via { index: 1 })));
}

#[test]
fn test_hole_spacing_pairs_follow_sweep_order() {
    let mut board = Board::new("holes");
    let a = board.add_net("A");
    let b = board.add_net("B");
    // Inserted out of X order, vias before pads, with unequal drills.
    board.add_via(Via::through(Point::new(mm(10.0), 0), mm(0.6), mm(0.3), a));
    board.add_via(Via::through(Point::new(mm(0.8), 0), mm(0.6), mm(0.3), b));
    board.add_footprint(
        Footprint::new("J1", "CONN", Point::new(0, 0))
            .with_pad(Pad::through_hole("1", Point::new(0, 0), mm(1.6), mm(1.0), a))
            .with_pad(Pad::through_hole("2", Point::new(mm(10.6), 0), mm(0.4), mm(0.2), b)),
    );

    let report = run(&board, DrcOptions::only(&[DrcCategory::DrilledHoles]));
    assert_eq!(report.count(DrcCode::DrilledHolesTooClose), 1);
    let violation = &report.violations[0];
    let mut items: Vec<ItemRef> = violation.items().collect();
    items.sort();
    assert_eq!(
        items,
        vec![ItemRef::Via { index: 1 }, ItemRef::Pad { footprint: 0, pad: 0 }]
    );
    assert!(violation.message.contains("actual 0.1500 mm"));
}

// ── Zones and keepouts ───────────────────────────────────────────────

#[test]
fn test_zones_intersect_and_suspicious_net() {
    let mut board = Board::new("zones");
    let a = board.add_net("A");
    let b = board.add_net("B");
    let layers = LayerSet::single(F_CU);
    let square = |x: f64| Polygon::rectangle(Point::new(mm(x), 0), Size::new(mm(4.0), mm(4.0)), 0.0);
    board.add_zone(Zone::copper(a, layers, square(0.0)));
    board.add_zone(Zone::copper(b, layers, square(3.0)));
    board.add_zone(Zone::copper(b, layers, square(10.0)));

    let report = run(&board, DrcOptions::only(&[DrcCategory::Zones]));
    assert_eq!(report.count(DrcCode::ZonesIntersect), 1);
    assert_eq!(report.count(DrcCode::ZonesTooClose), 0);
    assert_eq!(report.count(DrcCode::SuspiciousNetForZoneOutline), 3);
}

#[test]
fn test_zones_too_close() {
    let mut board = Board::new("zones");
    let a = board.add_net("A");
    let b = board.add_net("B");
    let layers = LayerSet::single(F_CU);
    let square = |x: f64| Polygon::rectangle(Point::new(mm(x), 0), Size::new(mm(4.0), mm(4.0)), 0.0);
    board.add_zone(Zone::copper(a, layers, square(0.0)));
    board.add_zone(Zone::copper(b, layers, square(4.1)));

    let report = run(&board, DrcOptions::only(&[DrcCategory::Zones]));
    assert_eq!(report.count(DrcCode::ZonesTooClose), 1);
    assert_eq!(report.count(DrcCode::ZonesIntersect), 0);
}

#[test]
fn test_keepout_forbids_tracks_and_vias() {
    let mut board = Board::new("keepout");
    let net = board.add_net("A");
    let area = Polygon::rectangle(Point::new(0, 0), Size::new(mm(2.0), mm(2.0)), 0.0);
    board.add_zone(Zone::keepout(LayerSet::all_copper(), area, KeepoutRules::default()));
    board.add_track(Track::new(Point::new(-mm(5.0), 0), Point::new(mm(5.0), 0), mm(0.25), F_CU, net));
    board.add_via(Via::through(Point::new(mm(0.5), mm(0.5)), mm(0.6), mm(0.3), net));
    board.add_via(Via::through(Point::new(mm(8.0), mm(8.0)), mm(0.6), mm(0.3), net));

    let report = run(&board, DrcOptions::only(&[DrcCategory::Keepouts]));
    assert_eq!(report.count(DrcCode::TrackInsideKeepout), 1);
    assert_eq!(report.count(DrcCode::ViaInsideKeepout), 1);

    let rules = KeepoutRules {
        no_tracks: false,
        ..KeepoutRules::default()
    };
    board.zones[0].keepout = Some(rules);
    let relaxed = run(&board, DrcOptions::only(&[DrcCategory::Keepouts]));
    assert_eq!(relaxed.count(DrcCode::TrackInsideKeepout), 0);
    assert_eq!(relaxed.count(DrcCode::ViaInsideKeepout), 1);
}

// ── Copper graphics ──────────────────────────────────────────────────

#[test]
fn test_track_near_copper_graphic() {
    let mut board = Board::new("copper");
    let net = board.add_net("A");
    board.add_track(Track::new(Point::new(0, 0), Point::new(mm(5.0), 0), mm(0.25), F_CU, net));
    board.add_drawing(Drawing::new(
        GraphicShape::Segment {
            start: Point::new(0, mm(0.3)),
            end: Point::new(mm(5.0), mm(0.3)),
        },
        mm(0.1),
        F_CU,
    ));
    // Silkscreen is not copper.
    board.add_drawing(Drawing::new(
        GraphicShape::Segment {
            start: Point::new(0, mm(0.2)),
            end: Point::new(mm(5.0), mm(0.2)),
        },
        mm(0.1),
        F_SILKS,
    ));

    let report = run(&board, DrcOptions::only(&[DrcCategory::CopperGraphics]));
    assert_eq!(report.count(DrcCode::TrackNearCopper), 1);
    assert_eq!(report.violations.len(), 1);
}

// ── Courtyards ───────────────────────────────────────────────────────

#[test]
fn test_missing_courtyard() {
    let mut board = Board::new("courtyard");
    board.add_footprint(Footprint::new("R1", "10k", Point::new(0, 0)));

    let report = run(&board, DrcOptions::only(&[DrcCategory::Courtyards]));
    assert_eq!(report.count(DrcCode::MissingCourtyardInFootprint), 1);
    assert_eq!(report.count(DrcCode::OverlappingFootprints), 0);
    assert_eq!(report.violations.len(), 1);

    board.design.require_courtyards = false;
    let relaxed = run(&board, DrcOptions::only(&[DrcCategory::Courtyards]));
    assert!(relaxed.violations.is_empty());
}

#[test]
fn test_overlapping_courtyards_same_side_only() {
    let mut board = Board::new("courtyard");
    board.add_footprint(
        Footprint::new("R1", "10k", Point::new(0, 0))
            .with_graphic(Drawing::new(rect(-1.0, -1.0, 1.0, 1.0), mm(0.05), F_CRTYD)),
    );
    board.add_footprint(
        Footprint::new("R2", "10k", Point::new(mm(1.5), 0))
            .with_graphic(Drawing::new(rect(0.5, -1.0, 2.5, 1.0), mm(0.05), F_CRTYD)),
    );
    board.add_footprint(
        Footprint::new("R3", "10k", Point::new(0, 0))
            .with_graphic(Drawing::new(rect(-1.0, -1.0, 1.0, 1.0), mm(0.05), B_CRTYD)),
    );

    let report = run(&board, DrcOptions::only(&[DrcCategory::Courtyards]));
    assert_eq!(report.count(DrcCode::OverlappingFootprints), 1);
    let items: Vec<ItemRef> = report.violations[0].items().collect();
    assert_eq!(
        items,
        vec![ItemRef::Footprint { index: 0 }, ItemRef::Footprint { index: 1 }]
    );
}

#[test]
fn test_malformed_courtyard() {
    let mut board = Board::new("courtyard");
    let open = |a: (f64, f64), b: (f64, f64)| {
        Drawing::new(
            GraphicShape::Segment {
                start: Point::new(mm(a.0), mm(a.1)),
                end: Point::new(mm(b.0), mm(b.1)),
            },
            mm(0.05),
            F_CRTYD,
        )
    };
    board.add_footprint(
        Footprint::new("U1", "IC", Point::new(0, 0))
            .with_graphic(open((0.0, 0.0), (2.0, 0.0)))
            .with_graphic(open((2.0, 0.0), (2.0, 2.0))),
    );

    let report = run(&board, DrcOptions::only(&[DrcCategory::Courtyards]));
    assert_eq!(report.count(DrcCode::MalformedCourtyardInFootprint), 1);
}

// ── Connectivity, layers, outline, text ──────────────────────────────

fn two_pad_board() -> Board {
    let mut board = Board::new("ratsnest");
    let net = board.add_net("GND");
    let size = Size::new(mm(1.0), mm(1.0));
    board.add_footprint(
        Footprint::new("C1", "100n", Point::new(0, 0)).with_pad(Pad::smd("1", Point::new(0, 0), size, F_CU, net)),
    );
    board.add_footprint(
        Footprint::new("C2", "100n", Point::new(mm(10.0), 0))
            .with_pad(Pad::smd("1", Point::new(mm(10.0), 0), size, F_CU, net)),
    );
    board
}

#[test]
fn test_unconnected_items() {
    let mut board = two_pad_board();
    let report = run(&board, DrcOptions::only(&[DrcCategory::Unconnected]));
    assert_eq!(report.count(DrcCode::UnconnectedItems), 1);
    assert_eq!(report.violations[0].location, Point::new(0, 0));

    board.add_track(Track::new(Point::new(0, 0), Point::new(mm(10.0), 0), mm(0.25), F_CU, 1));
    let routed = run(&board, DrcOptions::only(&[DrcCategory::Unconnected]));
    assert_eq!(routed.count(DrcCode::UnconnectedItems), 0);
}

#[test]
fn test_item_on_disabled_layer() {
    let mut board = Board::new("layers");
    let net = board.add_net("A");
    board.add_track(Track::new(Point::new(0, 0), Point::new(mm(1.0), 0), mm(0.25), IN1_CU, net));
    board.add_track(Track::new(Point::new(0, mm(2.0)), Point::new(mm(1.0), mm(2.0)), mm(0.25), F_CU, net));

    let report = run(&board, DrcOptions::only(&[DrcCategory::DisabledLayers]));
    assert_eq!(report.count(DrcCode::DisabledLayerItem), 1);
    assert_eq!(
        report.violations[0].items().collect::<Vec<_>>(),
        vec![ItemRef::Track { index: 0 }]
    );
}

#[test]
fn test_invalid_outline() {
    let mut board = Board::new("outline");
    let edge = |a: (f64, f64), b: (f64, f64)| {
        Drawing::new(
            GraphicShape::Segment {
                start: Point::new(mm(a.0), mm(a.1)),
                end: Point::new(mm(b.0), mm(b.1)),
            },
            mm(0.1),
            EDGE_CUTS,
        )
    };
    board.add_drawing(edge((0.0, 0.0), (10.0, 0.0)));
    board.add_drawing(edge((10.0, 0.0), (10.0, 10.0)));
    board.add_drawing(edge((10.0, 10.0), (0.0, 10.0)));

    let report = run(&board, DrcOptions::only(&[DrcCategory::Outline]));
    assert_eq!(report.count(DrcCode::InvalidOutline), 1);
    assert!(report.outline.is_none());
    assert_eq!(report.status, RunState::Completed);

    board.add_drawing(edge((0.0, 10.0), (0.0, 0.0)));
    let closed = run(&board, DrcOptions::only(&[DrcCategory::Outline]));
    assert!(closed.violations.is_empty());
    assert!(closed.outline.is_some());
}

#[test]
fn test_unresolved_text_variables() {
    let mut board = Board::new("text");
    let size = Size::new(mm(3.0), mm(1.0));
    board.add_text(Text::new("Rev ${REVISION}", Point::new(0, 0), size, F_SILKS));
    let mut fp = Footprint::new("R1", "10k", Point::new(mm(5.0), 0));
    fp.texts.push(Text::new("${REFERENCE}", Point::new(mm(5.0), 0), size, F_SILKS));
    board.add_footprint(fp);

    let report = run(&board, DrcOptions::only(&[DrcCategory::TextVariables]));
    assert_eq!(report.count(DrcCode::UnresolvedVariable), 1);
    assert_eq!(
        report.violations[0].items().collect::<Vec<_>>(),
        vec![ItemRef::Text { index: 0 }]
    );

    board.text_vars.insert("REVISION".to_string(), "B".to_string());
    let resolved = run(&board, DrcOptions::only(&[DrcCategory::TextVariables]));
    assert!(resolved.violations.is_empty());
}

// ── Footprints against the netlist ───────────────────────────────────

fn r1_netlist() -> Netlist {
    Netlist::new().with_component(NetlistComponent::new("R1", "10k").with_pin("1", "GND"))
}

#[test]
fn test_missing_footprint() {
    let board = Board::new("netlist");
    let report = run_with_netlist(&board, &r1_netlist(), DrcOptions::only(&[DrcCategory::Footprints]));
    assert_eq!(report.count(DrcCode::MissingFootprint), 1);
    assert_eq!(report.violations[0].subjects, vec![Subject::Component("R1".to_string())]);
}

#[test]
fn test_duplicate_footprint() {
    let mut board = Board::new("netlist");
    board.add_footprint(Footprint::new("R1", "10k", Point::new(0, 0)));
    board.add_footprint(Footprint::new("R1", "10k", Point::new(mm(5.0), 0)));

    let report = run_with_netlist(&board, &r1_netlist(), DrcOptions::only(&[DrcCategory::Footprints]));
    assert_eq!(report.count(DrcCode::DuplicateFootprint), 1);
    assert_eq!(report.count(DrcCode::MissingFootprint), 0);
    assert_eq!(report.count(DrcCode::ExtraFootprint), 0);
}

#[test]
fn test_extra_footprint_and_skip_without_netlist() {
    let mut board = Board::new("netlist");
    board.add_footprint(Footprint::new("R1", "10k", Point::new(0, 0)));
    board.add_footprint(Footprint::new("J9", "CONN", Point::new(mm(5.0), 0)));

    let report = run_with_netlist(&board, &r1_netlist(), DrcOptions::only(&[DrcCategory::Footprints]));
    assert_eq!(report.count(DrcCode::ExtraFootprint), 1);

    let skipped = run(&board, DrcOptions::only(&[DrcCategory::Footprints]));
    assert!(skipped.violations.is_empty());
    assert!(skipped.categories_skipped.contains(&DrcCategory::Footprints));
}

// ── Pass properties ──────────────────────────────────────────────────

fn busy_board() -> Board {
    let (mut board, a, b) = bare_board();
    for i in 0..12 {
        let net = if i % 2 == 0 { a } else { b };
        thin(&mut board, (0, i * 60), (1000, i * 60), net);
    }
    board
}

#[test]
fn test_runs_are_deterministic() {
    let board = busy_board();
    let first = run(&board, DrcOptions::default());
    let second = run(&board, DrcOptions::default());
    assert!(!first.violations.is_empty());
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_cancelled_run_is_a_prefix() {
    let board = busy_board();
    let options = DrcOptions::only(&[DrcCategory::Tracks]);
    let full = run(&board, options.clone());
    assert_eq!(full.count(DrcCode::TrackNearTrack), 11);

    for ticks in [1, 4, 7] {
        let mut observer = CollectingObserver::cancelling_after(ticks);
        let partial = DrcEngine::new(options.clone()).run(&board, None, &mut observer);
        assert_eq!(partial.status, RunState::Cancelled);
        assert!(partial.violations.len() < full.violations.len());
        assert_eq!(partial.violations[..], full.violations[..partial.violations.len()]);
        assert_eq!(observer.violations, partial.violations);
    }
}
