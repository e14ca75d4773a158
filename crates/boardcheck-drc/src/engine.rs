//! The pass orchestrator: runs the enabled categories in a fixed order over a
//! frozen board and collects their findings into a report.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Instant;

use boardcheck_core::{Board, Netlist, Polygon};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::drivers::{DriverContext, PassState};
use crate::observer::DrcObserver;
use crate::options::{DrcCategory, DrcOptions};
use crate::sink::ViolationSink;
use crate::violation::{DrcCode, DrcViolation, Severity};

/// Lifecycle of an engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    #[default]
    Idle,
    Running,
    Completed,
    Cancelled,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Idle => f.write_str("idle"),
            RunState::Running => f.write_str("running"),
            RunState::Completed => f.write_str("completed"),
            RunState::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// Result of one pass. A cancelled pass still carries everything found
/// before the cancellation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrcReport {
    pub board_id: Uuid,
    #[serde(default)]
    pub board_name: String,
    pub status: RunState,
    pub violations: Vec<DrcViolation>,
    pub counts: BTreeMap<DrcCode, usize>,
    /// Board outline as resolved at the start of the pass.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outline: Option<Polygon>,
    pub categories_run: Vec<DrcCategory>,
    pub categories_skipped: Vec<DrcCategory>,
}

impl DrcReport {
    pub fn is_complete(&self) -> bool {
        self.status == RunState::Completed
    }

    pub fn count(&self, code: DrcCode) -> usize {
        self.counts.get(&code).copied().unwrap_or(0)
    }

    pub fn error_count(&self) -> usize {
        self.violations
            .iter()
            .filter(|v| v.severity == Severity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.violations.len() - self.error_count()
    }

    pub fn of_code(&self, code: DrcCode) -> impl Iterator<Item = &DrcViolation> {
        self.violations.iter().filter(move |v| v.code == code)
    }

    pub fn of_category(&self, category: DrcCategory) -> impl Iterator<Item = &DrcViolation> {
        self.violations
            .iter()
            .filter(move |v| v.code.category() == category)
    }

    /// Add findings produced outside the pass, such as cleanup proposals.
    /// Records already present under the same identity are dropped.
    pub fn append(&mut self, violations: impl IntoIterator<Item = DrcViolation>) {
        for violation in violations {
            let key = violation.key();
            if self.violations.iter().any(|v| v.key() == key) {
                continue;
            }
            *self.counts.entry(violation.code).or_insert(0) += 1;
            self.violations.push(violation);
        }
    }
}

/// Design rule checker. Options are fixed for the duration of a run.
#[derive(Debug, Clone, Default)]
pub struct DrcEngine {
    options: DrcOptions,
    state: RunState,
}

impl DrcEngine {
    pub fn new(options: DrcOptions) -> Self {
        Self {
            options,
            state: RunState::Idle,
        }
    }

    pub fn options(&self) -> &DrcOptions {
        &self.options
    }

    /// Replace the options. Takes effect on the next run.
    pub fn set_options(&mut self, options: DrcOptions) {
        self.options = options;
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Run every enabled category over `board`.
    ///
    /// The footprint category needs a netlist and is skipped without one.
    /// Cancellation is polled through `observer` before each reference item;
    /// the report then holds the findings accumulated so far.
    pub fn run(
        &mut self,
        board: &Board,
        netlist: Option<&Netlist>,
        observer: &mut dyn DrcObserver,
    ) -> DrcReport {
        self.state = RunState::Running;
        let started = Instant::now();
        log::info!(
            "DRC started on '{}': {} items, {} nets",
            board.name,
            board.item_count(),
            board.nets.len().saturating_sub(1)
        );

        let mut sink = ViolationSink::new();
        for category in DrcCategory::PASS_ORDER {
            sink.set_limit(category, self.options.category(category).limit);
        }
        let state = PassState::resolve(board);
        if let Some(err) = &state.outline_error {
            log::warn!("Board outline could not be resolved: {}", err);
        }

        let mut categories_run = Vec::new();
        let mut categories_skipped = Vec::new();
        let mut cancelled = false;
        {
            let mut ctx = DriverContext::new(board, netlist, &self.options, &state, &mut sink, observer);
            for category in DrcCategory::PASS_ORDER {
                if cancelled || !self.options.is_enabled(category) {
                    categories_skipped.push(category);
                    continue;
                }
                if category == DrcCategory::Footprints && netlist.is_none() {
                    log::info!("Skipping {}: no netlist supplied", category);
                    categories_skipped.push(category);
                    continue;
                }

                let category_started = Instant::now();
                let before = ctx.found();
                log::debug!("Running {}", category);
                ctx.run(category);
                log::info!(
                    "{}: {} violations in {:.1?}",
                    category,
                    ctx.found() - before,
                    category_started.elapsed()
                );
                categories_run.push(category);

                if ctx.was_cancelled() {
                    log::warn!("DRC cancelled during {}", category);
                    cancelled = true;
                }
            }
        }

        self.state = if cancelled {
            RunState::Cancelled
        } else {
            RunState::Completed
        };
        let counts = sink.counts().clone();
        let violations = sink.into_violations();
        log::info!(
            "DRC {} in {:.1?}: {} violations",
            self.state,
            started.elapsed(),
            violations.len()
        );

        DrcReport {
            board_id: board.id,
            board_name: board.name.clone(),
            status: self.state,
            violations,
            counts,
            outline: state.outline,
            categories_run,
            categories_skipped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::{CancelToken, NullObserver};
    use boardcheck_core::layer::F_CU;
    use boardcheck_core::{mm, Point, Track};

    fn crossing_board() -> Board {
        let mut board = Board::new("engine");
        let a = board.add_net("A");
        let b = board.add_net("B");
        board.add_track(Track::new(Point::new(0, 0), Point::new(mm(2.0), 0), mm(0.25), F_CU, a));
        board.add_track(Track::new(Point::new(mm(1.0), -mm(1.0)), Point::new(mm(1.0), mm(1.0)), mm(0.25), F_CU, b));
        board
    }

    #[test]
    fn test_run_completes() {
        let board = crossing_board();
        let mut engine = DrcEngine::default();
        assert_eq!(engine.state(), RunState::Idle);
        let report = engine.run(&board, None, &mut NullObserver);
        assert_eq!(engine.state(), RunState::Completed);
        assert!(report.is_complete());
        assert_eq!(report.count(DrcCode::TracksCrossing), 1);
        assert!(report.categories_skipped.contains(&DrcCategory::Footprints));
        assert!(!report.categories_run.contains(&DrcCategory::Footprints));
    }

    #[test]
    fn test_cancel_before_start() {
        let board = crossing_board();
        let token = CancelToken::new();
        token.cancel();
        let mut observer = token.clone();
        let report = DrcEngine::default().run(&board, None, &mut observer);
        assert_eq!(report.status, RunState::Cancelled);
        assert!(report.violations.is_empty());
    }

    #[test]
    fn test_disabled_category_is_skipped() {
        let board = crossing_board();
        let mut options = DrcOptions::default();
        options.set_enabled(DrcCategory::Tracks, false);
        let report = DrcEngine::new(options).run(&board, None, &mut NullObserver);
        assert_eq!(report.count(DrcCode::TracksCrossing), 0);
        assert!(report.categories_skipped.contains(&DrcCategory::Tracks));
    }

    #[test]
    fn test_append_skips_known_records() {
        let board = crossing_board();
        let mut report = DrcEngine::default().run(&board, None, &mut NullObserver);
        let before = report.violations.len();
        let again = report.violations[0].clone();
        let extra = DrcViolation::new(DrcCode::DanglingTrack, Point::new(0, 0))
            .with_item(boardcheck_core::ItemRef::Track { index: 0 });
        report.append([again, extra]);
        assert_eq!(report.violations.len(), before + 1);
        assert_eq!(report.count(DrcCode::DanglingTrack), 1);
        assert_eq!(report.warning_count(), 1);
    }
}
