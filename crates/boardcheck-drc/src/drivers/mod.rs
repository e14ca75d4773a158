//! Category drivers. Each driver walks its reference items in a fixed order,
//! prunes candidates with an X-sorted sweep or the R-tree, and reports
//! through the shared [`DriverContext`].
//!
//! # Submodules
//! - `netclasses` - netclass values against board minimums
//! - `tracks` - track and via clearance, sizes, shorts, board edge, zones
//! - `pads` - pad-to-pad clearance and pad holes
//! - `holes` - drilled hole spacing
//! - `zones` - copper zone outlines
//! - `keepouts` - copper inside keepout areas
//! - `copper` - copper graphics and text against copper items
//! - `courtyards` - missing, malformed and overlapping courtyards
//! - `unconnected` - ratsnest edges
//! - `layers` - items on disabled layers
//! - `outline` - board outline validity
//! - `textvars` - unresolved `${VAR}` references
//! - `footprints` - placed footprints against the netlist

mod copper;
mod courtyards;
mod footprints;
mod holes;
mod keepouts;
mod layers;
mod netclasses;
mod outline;
mod pads;
mod textvars;
mod tracks;
mod unconnected;
mod zones;

use boardcheck_core::{BBox, Board, Coord, ItemRef, Netlist, Polygon, PolygonizeError};

use crate::observer::DrcObserver;
use crate::options::{DrcCategory, DrcOptions};
use crate::rules::RuleResolver;
use crate::sink::ViolationSink;
use crate::violation::DrcViolation;

/// Ephemeral state resolved once at the start of a pass.
#[derive(Debug, Clone, Default)]
pub struct PassState {
    /// Board outline with cutouts as holes, when Edge.Cuts forms one.
    pub outline: Option<Polygon>,
    pub outline_error: Option<PolygonizeError>,
    pub worst_clearance: Coord,
}

impl PassState {
    pub fn resolve(board: &Board) -> Self {
        let edges: Vec<_> = board
            .edge_graphics()
            .into_iter()
            .map(|(_, d)| d.shape.clone())
            .collect();
        let (outline, outline_error) = if edges.is_empty() {
            (None, None)
        } else {
            match boardcheck_core::outline::polygonize(&edges, boardcheck_core::outline::CHAINING_EPSILON)
            {
                Ok(mut polygons) if !polygons.is_empty() => (Some(polygons.remove(0)), None),
                Ok(_) => (None, Some(PolygonizeError::Empty)),
                Err(err) => (None, Some(err)),
            }
        };
        Self {
            outline,
            outline_error,
            worst_clearance: RuleResolver::new(board).worst_clearance(),
        }
    }
}

/// Everything a driver may read, plus the sink and observer it reports to.
pub struct DriverContext<'a> {
    pub board: &'a Board,
    pub netlist: Option<&'a Netlist>,
    pub options: &'a DrcOptions,
    pub rules: RuleResolver<'a>,
    pub state: &'a PassState,
    sink: &'a mut ViolationSink,
    observer: &'a mut dyn DrcObserver,
    category: DrcCategory,
    cancelled: bool,
}

impl<'a> DriverContext<'a> {
    pub fn new(
        board: &'a Board,
        netlist: Option<&'a Netlist>,
        options: &'a DrcOptions,
        state: &'a PassState,
        sink: &'a mut ViolationSink,
        observer: &'a mut dyn DrcObserver,
    ) -> Self {
        Self {
            board,
            netlist,
            options,
            rules: RuleResolver::new(board),
            state,
            sink,
            observer,
            category: DrcCategory::Netclasses,
            cancelled: false,
        }
    }

    pub fn category(&self) -> DrcCategory {
        self.category
    }

    pub fn was_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Records kept so far in this pass, all categories.
    pub fn found(&self) -> usize {
        self.sink.len()
    }

    /// Record a finding. Returns true if the sink kept it.
    pub fn report(&mut self, violation: DrcViolation) -> bool {
        match self.sink.report(violation) {
            Ok(kept) => {
                self.observer.on_violation(kept);
                true
            }
            Err(_) => false,
        }
    }

    /// Called before reference item `done` of `total`. Returns false when the
    /// driver should stop: the pass was cancelled, or the category has hit
    /// its report limit.
    pub fn step(&mut self, done: usize, total: usize) -> bool {
        if self.observer.is_cancelled() {
            self.cancelled = true;
            return false;
        }
        self.observer.on_progress(self.category, done, total);
        !self.sink.is_full(self.category)
    }

    /// Run one category's driver.
    pub fn run(&mut self, category: DrcCategory) {
        self.category = category;
        if self.observer.is_cancelled() {
            self.cancelled = true;
            return;
        }
        match category {
            DrcCategory::Netclasses => netclasses::run(self),
            DrcCategory::Tracks => tracks::run(self),
            DrcCategory::PadToPad => pads::run(self),
            DrcCategory::DrilledHoles => holes::run(self),
            DrcCategory::Zones => zones::run(self),
            DrcCategory::Keepouts => keepouts::run(self),
            DrcCategory::CopperGraphics => copper::run(self),
            DrcCategory::Courtyards => courtyards::run(self),
            DrcCategory::Unconnected => unconnected::run(self),
            DrcCategory::DisabledLayers => layers::run(self),
            DrcCategory::Outline => outline::run(self),
            DrcCategory::TextVariables => textvars::run(self),
            DrcCategory::Footprints => footprints::run(self),
            DrcCategory::Cleanup => {}
        }
    }
}

/// A reference or candidate in an X-sorted sweep.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SweepEntry {
    pub item: ItemRef,
    pub bbox: BBox,
}

/// Sort by bounding-box minimum X, ties broken by item order.
pub(crate) fn sort_for_sweep(entries: &mut [SweepEntry]) {
    entries.sort_by_key(sweep_key);
}

pub(crate) fn sweep_key(entry: &SweepEntry) -> (Coord, ItemRef) {
    (entry.bbox.min.x, entry.item)
}

/// Candidates after `from` that can still lie within `reach` of `reference`
/// along X. Stops at the first candidate starting beyond the window.
pub(crate) fn sweep_window<'s>(
    sorted: &'s [SweepEntry],
    from: usize,
    reference: &BBox,
    reach: Coord,
) -> impl Iterator<Item = &'s SweepEntry> + 's {
    let limit = reference.max.x + reach;
    sorted[from..].iter().take_while(move |c| c.bbox.min.x <= limit)
}
