//! # BoardCheck DRC
//!
//! Design rule checking over a frozen board. A pass runs the enabled check
//! categories in a fixed order; each category driver walks its reference
//! items, prunes candidates spatially and reports typed violation records to
//! a deduplicating sink. The host sees progress and can cancel through a
//! [`DrcObserver`]; a cancelled pass still returns what it found.
//!
//! Track cleanup lives beside the checker and is the only code that edits
//! a board.

pub mod cleanup;
pub mod drivers;
pub mod engine;
pub mod observer;
pub mod options;
pub mod rules;
pub mod sink;
pub mod violation;

pub use cleanup::{CleanupOptions, TrackCleaner};
pub use drivers::PassState;
pub use engine::{DrcEngine, DrcReport, RunState};
pub use observer::{CancelToken, CollectingObserver, DrcObserver, NullObserver};
pub use options::{CategoryOptions, DrcCategory, DrcOptions, ReportLimit};
pub use rules::RuleResolver;
pub use sink::{Rejected, ViolationSink};
pub use violation::{DrcCode, DrcViolation, Severity, Subject};
