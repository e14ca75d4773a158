//! Tracks and vias against everything routed near them.
//!
//! Reference items are all tracks and vias, X-sorted. Each reference is
//! checked for its own sizes, then against pads, then against the tracks and
//! vias that follow it in sweep order (so each pair is tested once), then
//! against the board edge and, optionally, copper zones.
//!
//! Tracks with no net never share a net with anything, including each other.
//! Two of them meeting at an end point are not a SHORT; they are measured
//! like any other pair and reported for clearance.

use boardcheck_core::predicates::{self, Proximity};
use boardcheck_core::{
    same_net, BoardItem, Coord, ItemRef, PadAttribute, NO_NET, Point, SegmentFrame, Shape, Track, Via,
    ViaType,
};

use super::{sort_for_sweep, sweep_window, DriverContext, SweepEntry};
use crate::rules::{clearance_detail, fmt_mm};
use crate::violation::{DrcCode, DrcViolation};

/// Geometry of the reference item, built once per reference.
enum Reference<'a> {
    Track(&'a Track, SegmentFrame),
    Via(&'a Via, Shape),
}

impl Reference<'_> {
    fn distance(&self, other: &Shape) -> Proximity {
        match self {
            Reference::Track(_, frame) => frame.clearance_to(other),
            Reference::Via(_, shape) => predicates::shape_distance(shape, other),
        }
    }

    fn shape(&self) -> Shape {
        match self {
            Reference::Track(t, _) => t.shape(),
            Reference::Via(_, shape) => shape.clone(),
        }
    }
}

/// Reports for one reference, honouring `report_all_track_errors`.
struct Findings<'c, 'a> {
    ctx: &'c mut DriverContext<'a>,
    item: ItemRef,
    stop: bool,
}

impl Findings<'_, '_> {
    fn report(&mut self, violation: DrcViolation) {
        self.ctx.report(violation);
        if !self.ctx.options.report_all_track_errors {
            self.stop = true;
        }
    }

    fn single(&mut self, code: DrcCode, at: Point, detail: String) {
        let item = self.item;
        self.report(DrcViolation::new(code, at).with_item(item).with_detail(detail));
    }

    fn pair(&mut self, code: DrcCode, at: Point, other: ItemRef, detail: String) {
        let item = self.item;
        self.report(
            DrcViolation::new(code, at)
                .with_items(item, other)
                .with_detail(detail),
        );
    }
}

fn too_small(value: Coord, minimum: Coord) -> String {
    format!("{} < minimum {}", fmt_mm(value), fmt_mm(minimum))
}

pub(super) fn run(ctx: &mut DriverContext<'_>) {
    let board = ctx.board;

    let mut refs: Vec<SweepEntry> = (0..board.tracks.len())
        .map(|index| ItemRef::Track { index })
        .chain((0..board.vias.len()).map(|index| ItemRef::Via { index }))
        .filter_map(|item| {
            board.item(item).map(|resolved| SweepEntry {
                item,
                bbox: resolved.bbox(),
            })
        })
        .collect();
    sort_for_sweep(&mut refs);

    let mut pads: Vec<SweepEntry> = board
        .pads()
        .filter_map(|(item, _, pad)| {
            let shape = pad.copper_shape().or_else(|| pad.hole())?;
            Some(SweepEntry {
                item,
                bbox: shape.bbox(),
            })
        })
        .collect();
    sort_for_sweep(&mut pads);

    let reach = ctx.state.worst_clearance;
    let total = refs.len();
    log::debug!("Tracks: {} reference items, {} pads", total, pads.len());

    for (i, entry) in refs.iter().enumerate() {
        if !ctx.step(i, total) {
            return;
        }
        let reference = match board.item(entry.item) {
            Some(BoardItem::Track(t)) => Reference::Track(t, SegmentFrame::new(t.segment(), t.width)),
            Some(BoardItem::Via(v)) => Reference::Via(v, v.shape()),
            _ => continue,
        };
        let mut findings = Findings {
            ctx: &mut *ctx,
            item: entry.item,
            stop: false,
        };

        check_sizes(&mut findings, &reference);
        if !findings.stop {
            check_pads(&mut findings, &reference, entry, &pads, reach);
        }
        if !findings.stop {
            check_routing(&mut findings, &reference, entry, &refs, i, reach);
        }
        if !findings.stop {
            check_board_edge(&mut findings, &reference);
        }
        if !findings.stop && findings.ctx.options.test_tracks_against_zones {
            check_zones(&mut findings, &reference);
        }
    }
}

fn check_sizes(f: &mut Findings<'_, '_>, reference: &Reference<'_>) {
    let board = f.ctx.board;
    let design = &board.design;
    match reference {
        Reference::Track(track, _) => {
            if track.start == track.end {
                f.single(DrcCode::ZeroLengthTrack, track.start, "length 0 mm".to_string());
                if f.stop {
                    return;
                }
            }
            if track.width < design.min_track_width {
                f.single(
                    DrcCode::TooSmallTrackWidth,
                    track.segment().midpoint(),
                    too_small(track.width, design.min_track_width),
                );
            }
        }
        Reference::Via(via, _) => {
            let at = via.position;
            if via.drill >= via.diameter {
                f.single(
                    DrcCode::ViaHoleBigger,
                    at,
                    format!("drill {} >= diameter {}", fmt_mm(via.drill), fmt_mm(via.diameter)),
                );
                if f.stop {
                    return;
                }
            }
            let mut checks: Vec<(bool, DrcCode, String)> = Vec::new();
            match via.via_type {
                ViaType::Micro => {
                    checks.push((
                        !design.allow_micro_vias,
                        DrcCode::MicroViaNotAllowed,
                        "micro vias are disabled in the design settings".to_string(),
                    ));
                    checks.push((
                        via.diameter < design.min_uvia_diameter,
                        DrcCode::TooSmallMicrovia,
                        too_small(via.diameter, design.min_uvia_diameter),
                    ));
                    checks.push((
                        via.drill < design.min_uvia_drill,
                        DrcCode::TooSmallMicroviaDrill,
                        too_small(via.drill, design.min_uvia_drill),
                    ));
                    let stack = &board.layers;
                    let outer = stack.is_outer(via.top) || stack.is_outer(via.bottom);
                    checks.push((
                        !(outer && stack.are_adjacent(via.top, via.bottom)),
                        DrcCode::MicroViaIncorrectLayerPair,
                        format!(
                            "{} - {}",
                            boardcheck_core::layer::layer_name(via.top),
                            boardcheck_core::layer::layer_name(via.bottom)
                        ),
                    ));
                }
                ViaType::BlindBuried | ViaType::Through => {
                    if via.via_type == ViaType::BlindBuried {
                        checks.push((
                            !design.allow_blind_buried_vias,
                            DrcCode::BuriedViaNotAllowed,
                            "blind/buried vias are disabled in the design settings".to_string(),
                        ));
                    }
                    checks.push((
                        via.diameter < design.min_via_diameter,
                        DrcCode::TooSmallVia,
                        too_small(via.diameter, design.min_via_diameter),
                    ));
                    checks.push((
                        via.drill < design.min_via_drill,
                        DrcCode::TooSmallViaDrill,
                        too_small(via.drill, design.min_via_drill),
                    ));
                }
            }
            for (failed, code, detail) in checks {
                if failed {
                    f.single(code, at, detail);
                    if f.stop {
                        return;
                    }
                }
            }
        }
    }
}

fn check_pads(
    f: &mut Findings<'_, '_>,
    reference: &Reference<'_>,
    entry: &SweepEntry,
    pads: &[SweepEntry],
    reach: Coord,
) {
    let board = f.ctx.board;
    let rules = f.ctx.rules;
    let Some(ref_item) = board.item(entry.item) else {
        return;
    };
    let ref_layers = ref_item.layers();
    let limit = entry.bbox.max.x + reach;

    for candidate in pads.iter().take_while(|p| p.bbox.min.x <= limit) {
        if candidate.bbox.max.x < entry.bbox.min.x - reach {
            continue;
        }
        let Some(pad_item @ BoardItem::Pad(_, pad)) = board.item(candidate.item) else {
            continue;
        };

        if pad.copper_layers().intersects(&ref_layers) {
            let Some(clearance) = rules.pair_clearance(&ref_item, &pad_item) else {
                continue;
            };
            let Some(copper) = pad.copper_shape() else {
                continue;
            };
            let near = reference.distance(&copper);
            if near.violates(clearance) {
                f.pair(DrcCode::TrackNearPad, near.location, candidate.item, clearance_detail(clearance, &near));
            }
        } else if let Some(hole) = pad.hole().filter(|_| pad.hole_layers().intersects(&ref_layers)) {
            // No copper here: the drill is an obstacle whatever its net.
            let clearance = rules.item_clearance(&ref_item).max(rules.item_clearance(&pad_item));
            let near = reference.distance(&hole);
            if near.violates(clearance) {
                let code = if pad.attribute == PadAttribute::NonPlated {
                    DrcCode::HoleNearTrack
                } else {
                    DrcCode::TrackNearThroughHole
                };
                f.pair(code, near.location, candidate.item, clearance_detail(clearance, &near));
            }
        }
        if f.stop {
            return;
        }
    }
}

fn check_routing(
    f: &mut Findings<'_, '_>,
    reference: &Reference<'_>,
    entry: &SweepEntry,
    sorted: &[SweepEntry],
    position: usize,
    reach: Coord,
) {
    let board = f.ctx.board;
    let rules = f.ctx.rules;
    let Some(ref_item) = board.item(entry.item) else {
        return;
    };

    for candidate in sweep_window(sorted, position + 1, &entry.bbox, reach) {
        let Some(other) = board.item(candidate.item) else {
            continue;
        };
        if !other.layers().intersects(&ref_item.layers()) {
            continue;
        }
        let Some(clearance) = rules.pair_clearance(&ref_item, &other) else {
            continue;
        };

        match (reference, other) {
            (Reference::Track(track, frame), BoardItem::Track(candidate_track)) => {
                let seg = candidate_track.segment();
                let shared = track
                    .segment()
                    .shared_endpoint(&seg)
                    .filter(|_| track.net != NO_NET && candidate_track.net != NO_NET);
                if let Some(at) = shared {
                    f.pair(
                        DrcCode::Short,
                        at,
                        candidate.item,
                        "tracks of different nets share an end point".to_string(),
                    );
                } else if let Some(at) = frame.crosses(&seg) {
                    f.pair(DrcCode::TracksCrossing, at, candidate.item, String::from("crossing"));
                } else {
                    let near = frame.clearance_to(&candidate_track.shape());
                    if near.violates(clearance) {
                        let code = if frame.span_overlaps(&seg) {
                            DrcCode::TrackNearTrack
                        } else {
                            DrcCode::TrackEnds
                        };
                        f.pair(code, near.location, candidate.item, clearance_detail(clearance, &near));
                    }
                }
            }
            (reference, other) => {
                let code = match (reference, &other) {
                    (Reference::Via(..), BoardItem::Via(_)) => DrcCode::ViaNearVia,
                    (Reference::Via(..), _) => DrcCode::ViaNearTrack,
                    (Reference::Track(..), _) => DrcCode::TrackNearVia,
                };
                let Some(shape) = other.shapes().into_iter().next() else {
                    continue;
                };
                let near = reference.distance(&shape);
                if near.violates(clearance) {
                    f.pair(code, near.location, candidate.item, clearance_detail(clearance, &near));
                }
            }
        }
        if f.stop {
            return;
        }
    }
}

fn check_board_edge(f: &mut Findings<'_, '_>, reference: &Reference<'_>) {
    let edge_clearance = f.ctx.rules.design().copper_edge_clearance;
    if edge_clearance <= 0 {
        return;
    }
    let shape = reference.shape();

    let state = f.ctx.state;
    if let Some(outline) = &state.outline {
        let nearest = outline
            .edges()
            .map(|seg| reference.distance(&Shape::Segment { seg, width: 0 }))
            .min_by(|a, b| a.distance.total_cmp(&b.distance));
        if let Some(near) = nearest.filter(|n| n.violates(edge_clearance)) {
            f.single(DrcCode::TrackNearEdge, near.location, clearance_detail(edge_clearance, &near));
        }
        return;
    }

    let board = f.ctx.board;
    for (edge, drawing) in board.edge_graphics() {
        let nearest = drawing
            .shapes()
            .iter()
            .map(|s| predicates::shape_distance(&shape, s))
            .min_by(|a, b| a.distance.total_cmp(&b.distance));
        if let Some(near) = nearest.filter(|n| n.violates(edge_clearance)) {
            f.pair(DrcCode::TrackNearEdge, near.location, edge, clearance_detail(edge_clearance, &near));
            if f.stop {
                return;
            }
        }
    }
}

fn check_zones(f: &mut Findings<'_, '_>, reference: &Reference<'_>) {
    let board = f.ctx.board;
    let rules = f.ctx.rules;
    let Some(ref_item) = board.item(f.item) else {
        return;
    };
    for (index, zone) in board.zones.iter().enumerate() {
        if zone.is_keepout()
            || same_net(zone.net, ref_item.net())
            || !zone.layers.intersects(&ref_item.layers())
        {
            continue;
        }
        let zone_item = BoardItem::Zone(zone);
        let Some(clearance) = rules.pair_clearance(&ref_item, &zone_item) else {
            continue;
        };
        let near = reference.distance(&zone.shape());
        if near.violates(clearance) {
            f.pair(
                DrcCode::TrackNearZone,
                near.location,
                ItemRef::Zone { index },
                clearance_detail(clearance, &near),
            );
            if f.stop {
                return;
            }
        }
    }
}
