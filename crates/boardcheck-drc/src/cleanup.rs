//! Track cleanup: the only operation that edits the board, and only when the
//! caller asks for it outside a DRC pass.
//!
//! [`TrackCleaner::analyze`] proposes changes as violation records without
//! touching the board; [`TrackCleaner::apply`] makes the same changes. Item
//! references in the returned records refer to the board as it was before
//! the changes.

use std::collections::BTreeSet;

use boardcheck_core::predicates::hit_test;
use boardcheck_core::{Board, ItemRef, LayerId, LayerSet, Point, Track, NO_NET};
use serde::{Deserialize, Serialize};

use crate::violation::{DrcCode, DrcViolation};

/// Which cleanups to perform. All enabled by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanupOptions {
    pub remove_zero_length: bool,
    pub remove_duplicates: bool,
    pub merge_collinear: bool,
    pub remove_redundant_vias: bool,
    pub remove_tracks_in_pads: bool,
    pub delete_dangling: bool,
}

impl Default for CleanupOptions {
    fn default() -> Self {
        Self {
            remove_zero_length: true,
            remove_duplicates: true,
            merge_collinear: true,
            remove_redundant_vias: true,
            remove_tracks_in_pads: true,
            delete_dangling: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    RemoveTrack(usize),
    RemoveVia(usize),
    /// Extend track `keep` to span `start..end` and drop track `absorb`.
    Merge {
        keep: usize,
        absorb: usize,
        start: Point,
        end: Point,
    },
}

/// Plans and performs track cleanups.
#[derive(Debug, Clone, Default)]
pub struct TrackCleaner {
    options: CleanupOptions,
}

/// Working set of the planner: items already claimed by an earlier action.
#[derive(Default)]
struct Claimed {
    tracks: BTreeSet<usize>,
    vias: BTreeSet<usize>,
}

impl TrackCleaner {
    pub fn new(options: CleanupOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CleanupOptions {
        &self.options
    }

    /// Proposed changes, in the order they would be applied.
    pub fn analyze(&self, board: &Board) -> Vec<DrcViolation> {
        self.plan(board).into_iter().map(|(v, _)| v).collect()
    }

    /// Perform the cleanups on `board` and return what was done.
    pub fn apply(&self, board: &mut Board) -> Vec<DrcViolation> {
        let plan = self.plan(board);
        let mut drop_tracks = BTreeSet::new();
        let mut drop_vias = BTreeSet::new();
        for (_, action) in &plan {
            match *action {
                Action::RemoveTrack(i) => {
                    drop_tracks.insert(i);
                }
                Action::RemoveVia(i) => {
                    drop_vias.insert(i);
                }
                Action::Merge {
                    keep,
                    absorb,
                    start,
                    end,
                } => {
                    if let Some(track) = board.tracks.get_mut(keep) {
                        track.start = start;
                        track.end = end;
                    }
                    drop_tracks.insert(absorb);
                }
            }
        }
        let mut index = 0;
        board.tracks.retain(|_| {
            let keep = !drop_tracks.contains(&index);
            index += 1;
            keep
        });
        let mut index = 0;
        board.vias.retain(|_| {
            let keep = !drop_vias.contains(&index);
            index += 1;
            keep
        });
        log::info!(
            "Track cleanup: {} tracks and {} vias removed, {} changes",
            drop_tracks.len(),
            drop_vias.len(),
            plan.len()
        );
        plan.into_iter().map(|(v, _)| v).collect()
    }

    fn plan(&self, board: &Board) -> Vec<(DrcViolation, Action)> {
        let mut plan = Vec::new();
        let mut claimed = Claimed::default();
        let o = &self.options;

        if o.remove_zero_length {
            for (i, track) in board.tracks.iter().enumerate() {
                if track.segment().is_degenerate() {
                    claimed.tracks.insert(i);
                    plan.push((
                        DrcViolation::new(DrcCode::ZeroLengthTrack, track.start)
                            .with_item(ItemRef::Track { index: i }),
                        Action::RemoveTrack(i),
                    ));
                }
            }
        }
        if o.remove_duplicates {
            self.duplicates(board, &mut claimed, &mut plan);
        }
        if o.remove_tracks_in_pads {
            self.tracks_in_pads(board, &mut claimed, &mut plan);
        }
        if o.remove_redundant_vias {
            self.redundant_vias(board, &mut claimed, &mut plan);
        }
        if o.delete_dangling {
            self.dangling(board, &mut claimed, &mut plan);
        }
        if o.merge_collinear {
            self.merges(board, &mut claimed, &mut plan);
        }
        log::debug!("Track cleanup planned {} changes", plan.len());
        plan
    }

    fn duplicates(&self, board: &Board, claimed: &mut Claimed, plan: &mut Vec<(DrcViolation, Action)>) {
        let tracks = &board.tracks;
        for i in 0..tracks.len() {
            if claimed.tracks.contains(&i) {
                continue;
            }
            for j in (i + 1)..tracks.len() {
                if claimed.tracks.contains(&j) || !same_route(&tracks[i], &tracks[j]) {
                    continue;
                }
                if tracks[i].segment().same_span(&tracks[j].segment()) {
                    claimed.tracks.insert(j);
                    plan.push((
                        DrcViolation::new(DrcCode::DuplicateTrack, tracks[j].start)
                            .with_items(ItemRef::Track { index: j }, ItemRef::Track { index: i }),
                        Action::RemoveTrack(j),
                    ));
                }
            }
        }
    }

    fn tracks_in_pads(&self, board: &Board, claimed: &mut Claimed, plan: &mut Vec<(DrcViolation, Action)>) {
        for (i, track) in board.tracks.iter().enumerate() {
            if claimed.tracks.contains(&i) || track.net == NO_NET {
                continue;
            }
            let inside = board.pads().find(|(_, _, pad)| {
                pad.net == track.net
                    && pad.copper_layers().contains(track.layer)
                    && pad
                        .copper_shape()
                        .is_some_and(|shape| hit_test(&shape, &track.start) && hit_test(&shape, &track.end))
            });
            if let Some((pad_ref, _, _)) = inside {
                claimed.tracks.insert(i);
                plan.push((
                    DrcViolation::new(DrcCode::TrackInPad, track.start)
                        .with_items(ItemRef::Track { index: i }, pad_ref),
                    Action::RemoveTrack(i),
                ));
            }
        }
    }

    fn redundant_vias(&self, board: &Board, claimed: &mut Claimed, plan: &mut Vec<(DrcViolation, Action)>) {
        for (j, via) in board.vias.iter().enumerate() {
            let stacked = board.vias[..j]
                .iter()
                .enumerate()
                .find(|(i, other)| {
                    !claimed.vias.contains(i)
                        && other.position == via.position
                        && other.net == via.net
                        && other.layers().intersection(&via.layers()) == via.layers()
                })
                .map(|(i, _)| ItemRef::Via { index: i });
            let in_pad = || {
                board
                    .pads()
                    .find(|(_, _, pad)| {
                        pad.net == via.net
                            && pad.hole().is_some()
                            && pad.copper_layers().intersection(&via.layers()) == via.layers()
                            && pad.copper_shape().is_some_and(|s| hit_test(&s, &via.position))
                    })
                    .map(|(r, _, _)| r)
            };
            if let Some(other) = stacked.or_else(in_pad) {
                claimed.vias.insert(j);
                plan.push((
                    DrcViolation::new(DrcCode::RedundantVia, via.position)
                        .with_items(ItemRef::Via { index: j }, other),
                    Action::RemoveVia(j),
                ));
            }
        }
    }

    fn dangling(&self, board: &Board, claimed: &mut Claimed, plan: &mut Vec<(DrcViolation, Action)>) {
        let mut found = Vec::new();
        for (i, track) in board.tracks.iter().enumerate() {
            if claimed.tracks.contains(&i) {
                continue;
            }
            let free = [track.start, track.end]
                .into_iter()
                .find(|p| !attached(board, claimed, Some(i), track.layer, p));
            if let Some(at) = free {
                found.push((
                    DrcViolation::new(DrcCode::DanglingTrack, at).with_item(ItemRef::Track { index: i }),
                    Action::RemoveTrack(i),
                ));
            }
        }
        for (i, via) in board.vias.iter().enumerate() {
            if claimed.vias.contains(&i) {
                continue;
            }
            // A via that connects fewer than two layers does nothing.
            let connected = via_layers_in_use(board, claimed, i);
            if connected.iter().count() < 2 {
                found.push((
                    DrcViolation::new(DrcCode::DanglingVia, via.position).with_item(ItemRef::Via { index: i }),
                    Action::RemoveVia(i),
                ));
            }
        }
        for (violation, action) in found {
            match action {
                Action::RemoveTrack(i) => claimed.tracks.insert(i),
                Action::RemoveVia(i) => claimed.vias.insert(i),
                Action::Merge { .. } => false,
            };
            plan.push((violation, action));
        }
    }

    /// Collinear merging repeats until no pair is left, so a chain of
    /// segments collapses into one track. Later passes see earlier merges
    /// through a working copy of the tracks.
    fn merges(&self, board: &Board, claimed: &mut Claimed, plan: &mut Vec<(DrcViolation, Action)>) {
        let mut tracks = board.tracks.clone();
        loop {
            let mut merged = false;
            for i in 0..tracks.len() {
                for j in (i + 1)..tracks.len() {
                    if claimed.tracks.contains(&i) || claimed.tracks.contains(&j) {
                        continue;
                    }
                    let Some((start, end, joint)) = mergeable(board, &tracks, claimed, i, j) else {
                        continue;
                    };
                    claimed.tracks.insert(j);
                    tracks[i].start = start;
                    tracks[i].end = end;
                    merged = true;
                    plan.push((
                        DrcViolation::new(DrcCode::MergeTracks, joint)
                            .with_items(ItemRef::Track { index: i }, ItemRef::Track { index: j }),
                        Action::Merge {
                            keep: i,
                            absorb: j,
                            start,
                            end,
                        },
                    ));
                }
            }
            if !merged {
                break;
            }
        }
    }
}

/// The span `i` and `j` would cover as one track, and the joint between
/// them, when they continue each other in a straight line.
fn mergeable(board: &Board, tracks: &[Track], claimed: &Claimed, i: usize, j: usize) -> Option<(Point, Point, Point)> {
    let (a, b) = (&tracks[i], &tracks[j]);
    if !same_route(a, b) || !a.segment().is_collinear_with(&b.segment()) {
        return None;
    }
    let joint = a.segment().shared_endpoint(&b.segment())?;
    let far_a = if a.start == joint { a.end } else { a.start };
    let far_b = if b.start == joint { b.end } else { b.start };
    // Overlapping segments fold back over the joint.
    let dot = (far_a.x - joint.x) as i128 * (far_b.x - joint.x) as i128
        + (far_a.y - joint.y) as i128 * (far_b.y - joint.y) as i128;
    if dot >= 0 || joint_has_third_item(board, tracks, claimed, i, j, a.layer, &joint) {
        return None;
    }
    Some((far_a, far_b, joint))
}

fn same_route(a: &Track, b: &Track) -> bool {
    a.layer == b.layer && a.net == b.net && a.width == b.width
}

/// Whether anything other than track `skip` touches `p` on `layer`.
fn attached(board: &Board, claimed: &Claimed, skip: Option<usize>, layer: LayerId, p: &Point) -> bool {
    let tracks = board.tracks.iter().enumerate().any(|(i, t)| {
        Some(i) != skip && !claimed.tracks.contains(&i) && t.layer == layer && hit_test(&t.shape(), p)
    });
    tracks
        || board.vias.iter().enumerate().any(|(i, v)| {
            !claimed.vias.contains(&i) && v.layers().contains(layer) && hit_test(&v.shape(), p)
        })
        || board.pads().any(|(_, _, pad)| {
            pad.copper_layers().contains(layer) && pad.copper_shape().is_some_and(|s| hit_test(&s, p))
        })
        || board
            .zones
            .iter()
            .any(|z| !z.is_keepout() && z.layers.contains(layer) && z.outline.covers(p))
}

/// Copper layers on which something connects to via `index`.
fn via_layers_in_use(board: &Board, claimed: &Claimed, index: usize) -> LayerSet {
    let via = &board.vias[index];
    let shape = via.shape();
    via.layers()
        .iter()
        .filter(|&layer| {
            let track = board.tracks.iter().enumerate().any(|(i, t)| {
                !claimed.tracks.contains(&i)
                    && t.layer == layer
                    && (hit_test(&shape, &t.start) || hit_test(&shape, &t.end))
            });
            track
                || board.pads().any(|(_, _, pad)| {
                    pad.copper_layers().contains(layer)
                        && pad.copper_shape().is_some_and(|s| hit_test(&s, &via.position))
                })
                || board.zones.iter().any(|z| {
                    !z.is_keepout() && z.layers.contains(layer) && z.outline.covers(&via.position)
                })
        })
        .collect()
}

fn joint_has_third_item(
    board: &Board,
    tracks: &[Track],
    claimed: &Claimed,
    a: usize,
    b: usize,
    layer: LayerId,
    joint: &Point,
) -> bool {
    let tracks = tracks.iter().enumerate().any(|(i, t)| {
        i != a && i != b && !claimed.tracks.contains(&i) && t.layer == layer && hit_test(&t.shape(), joint)
    });
    tracks
        || board.vias.iter().enumerate().any(|(i, v)| {
            !claimed.vias.contains(&i) && v.layers().contains(layer) && hit_test(&v.shape(), joint)
        })
        || board.pads().any(|(_, _, pad)| {
            pad.copper_layers().contains(layer) && pad.copper_shape().is_some_and(|s| hit_test(&s, joint))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use boardcheck_core::layer::{B_CU, F_CU};
    use boardcheck_core::{mm, Footprint, Pad, Size, Via};

    /// Two pads joined by `tracks`, each track on F.Cu net 1.
    fn routed(tracks: &[(Point, Point)]) -> Board {
        let mut board = Board::new("cleanup");
        let net = board.add_net("SIG");
        let size = Size::new(mm(1.0), mm(1.0));
        board.add_footprint(
            Footprint::new("J1", "CONN", Point::new(0, 0))
                .with_pad(Pad::smd("1", Point::new(0, 0), size, F_CU, net))
                .with_pad(Pad::smd("2", Point::new(mm(10.0), 0), size, F_CU, net)),
        );
        for (a, b) in tracks {
            board.add_track(Track::new(*a, *b, mm(0.25), F_CU, net));
        }
        board
    }

    fn codes(found: &[DrcViolation]) -> Vec<DrcCode> {
        found.iter().map(|v| v.code).collect()
    }

    #[test]
    fn test_clean_board_has_nothing_to_do() {
        let board = routed(&[(Point::new(0, 0), Point::new(mm(10.0), 0))]);
        assert!(TrackCleaner::default().analyze(&board).is_empty());
    }

    #[test]
    fn test_duplicate_and_zero_length() {
        let mid = Point::new(mm(5.0), 0);
        let board = routed(&[
            (Point::new(0, 0), Point::new(mm(10.0), 0)),
            (Point::new(mm(10.0), 0), Point::new(0, 0)),
            (mid, mid),
        ]);
        let found = TrackCleaner::default().analyze(&board);
        assert_eq!(codes(&found), vec![DrcCode::ZeroLengthTrack, DrcCode::DuplicateTrack]);
        assert_eq!(board.tracks.len(), 3);
    }

    #[test]
    fn test_merge_collinear_and_apply() {
        let mut board = routed(&[
            (Point::new(0, 0), Point::new(mm(4.0), 0)),
            (Point::new(mm(4.0), 0), Point::new(mm(10.0), 0)),
        ]);
        let cleaner = TrackCleaner::default();
        assert_eq!(codes(&cleaner.analyze(&board)), vec![DrcCode::MergeTracks]);
        let applied = cleaner.apply(&mut board);
        assert_eq!(applied.len(), 1);
        assert_eq!(board.tracks.len(), 1);
        assert!(board.tracks[0].segment().same_span(&boardcheck_core::Segment::new(
            Point::new(0, 0),
            Point::new(mm(10.0), 0)
        )));
    }

    #[test]
    fn test_chain_of_collinear_tracks_becomes_one() {
        let mut board = routed(&[
            (Point::new(0, 0), Point::new(mm(2.0), 0)),
            (Point::new(mm(2.0), 0), Point::new(mm(5.0), 0)),
            (Point::new(mm(5.0), 0), Point::new(mm(7.0), 0)),
            (Point::new(mm(10.0), 0), Point::new(mm(7.0), 0)),
        ]);
        let cleaner = TrackCleaner::default();
        assert_eq!(codes(&cleaner.analyze(&board)), vec![DrcCode::MergeTracks; 3]);
        let applied = cleaner.apply(&mut board);
        assert_eq!(applied.len(), 3);
        assert_eq!(board.tracks.len(), 1);
        assert!(board.tracks[0].segment().same_span(&boardcheck_core::Segment::new(
            Point::new(0, 0),
            Point::new(mm(10.0), 0)
        )));
        assert!(cleaner.analyze(&board).is_empty());
    }

    #[test]
    fn test_no_merge_at_tee() {
        let joint = Point::new(mm(4.0), 0);
        let board = routed(&[
            (Point::new(0, 0), joint),
            (joint, Point::new(mm(10.0), 0)),
            (joint, Point::new(mm(4.0), mm(3.0))),
        ]);
        let keep_stubs = TrackCleaner::new(CleanupOptions {
            delete_dangling: false,
            ..CleanupOptions::default()
        });
        assert!(keep_stubs.analyze(&board).is_empty());

        // Once the free-ended stub goes, the joint is a plain corner again.
        let found = TrackCleaner::default().analyze(&board);
        assert_eq!(codes(&found), vec![DrcCode::DanglingTrack, DrcCode::MergeTracks]);
    }

    #[test]
    fn test_track_in_pad_and_redundant_via() {
        let mut board = routed(&[
            (Point::new(0, 0), Point::new(mm(10.0), 0)),
            (Point::new(-mm(0.2), 0), Point::new(mm(0.2), 0)),
        ]);
        board.add_via(Via::through(Point::new(mm(10.0), 0), mm(0.6), mm(0.3), 1));
        board.add_via(Via::through(Point::new(mm(10.0), 0), mm(0.6), mm(0.3), 1));
        board.add_track(Track::new(Point::new(mm(10.0), 0), Point::new(mm(10.0), mm(5.0)), mm(0.25), B_CU, 1));
        let found = TrackCleaner::new(CleanupOptions {
            delete_dangling: false,
            ..CleanupOptions::default()
        })
        .analyze(&board);
        assert_eq!(codes(&found), vec![DrcCode::TrackInPad, DrcCode::RedundantVia]);
    }

    #[test]
    fn test_dangling_via() {
        let mut board = routed(&[(Point::new(0, 0), Point::new(mm(10.0), 0))]);
        board.add_via(Via::through(Point::new(mm(20.0), mm(20.0)), mm(0.6), mm(0.3), 1));
        let found = TrackCleaner::default().apply(&mut board);
        assert_eq!(codes(&found), vec![DrcCode::DanglingVia]);
        assert!(board.vias.is_empty());
    }
}
