use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A group of related checks, run by one driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrcCategory {
    Netclasses,
    Tracks,
    PadToPad,
    DrilledHoles,
    Zones,
    Keepouts,
    CopperGraphics,
    Courtyards,
    Unconnected,
    DisabledLayers,
    Outline,
    TextVariables,
    Footprints,
    /// Findings of the track cleaner; never run as part of a pass.
    Cleanup,
}

impl DrcCategory {
    /// Categories of a pass, in the order they run.
    pub const PASS_ORDER: [DrcCategory; 13] = [
        DrcCategory::Netclasses,
        DrcCategory::Tracks,
        DrcCategory::PadToPad,
        DrcCategory::DrilledHoles,
        DrcCategory::Zones,
        DrcCategory::Keepouts,
        DrcCategory::CopperGraphics,
        DrcCategory::Courtyards,
        DrcCategory::Unconnected,
        DrcCategory::DisabledLayers,
        DrcCategory::Outline,
        DrcCategory::TextVariables,
        DrcCategory::Footprints,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DrcCategory::Netclasses => "netclasses",
            DrcCategory::Tracks => "tracks",
            DrcCategory::PadToPad => "pad-to-pad",
            DrcCategory::DrilledHoles => "drilled holes",
            DrcCategory::Zones => "zones",
            DrcCategory::Keepouts => "keepouts",
            DrcCategory::CopperGraphics => "copper graphics",
            DrcCategory::Courtyards => "courtyards",
            DrcCategory::Unconnected => "unconnected items",
            DrcCategory::DisabledLayers => "disabled layers",
            DrcCategory::Outline => "board outline",
            DrcCategory::TextVariables => "text variables",
            DrcCategory::Footprints => "footprints vs netlist",
            DrcCategory::Cleanup => "cleanup",
        }
    }
}

impl fmt::Display for DrcCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How many findings a category may report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportLimit {
    #[default]
    All,
    FirstN(usize),
}

impl ReportLimit {
    pub fn allows(&self, already_reported: usize) -> bool {
        match self {
            ReportLimit::All => true,
            ReportLimit::FirstN(n) => already_reported < *n,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryOptions {
    pub enabled: bool,
    pub limit: ReportLimit,
}

impl Default for CategoryOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            limit: ReportLimit::All,
        }
    }
}

/// Caller-configured switches for a pass. Fixed once the pass starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrcOptions {
    /// Per-category overrides; categories not listed use the defaults.
    pub categories: BTreeMap<DrcCategory, CategoryOptions>,
    /// When false, a reference track stops after its first finding.
    pub report_all_track_errors: bool,
    pub test_tracks_against_zones: bool,
}

impl Default for DrcOptions {
    fn default() -> Self {
        Self {
            categories: BTreeMap::new(),
            report_all_track_errors: false,
            test_tracks_against_zones: false,
        }
    }
}

impl DrcOptions {
    pub fn category(&self, category: DrcCategory) -> CategoryOptions {
        self.categories.get(&category).copied().unwrap_or_default()
    }

    pub fn is_enabled(&self, category: DrcCategory) -> bool {
        self.category(category).enabled
    }

    pub fn set_enabled(&mut self, category: DrcCategory, enabled: bool) {
        self.categories.entry(category).or_default().enabled = enabled;
    }

    pub fn set_limit(&mut self, category: DrcCategory, limit: ReportLimit) {
        self.categories.entry(category).or_default().limit = limit;
    }

    /// Options with only the given categories enabled.
    pub fn only(categories: &[DrcCategory]) -> Self {
        let mut options = Self::default();
        for category in DrcCategory::PASS_ORDER {
            options.set_enabled(category, categories.contains(&category));
        }
        options
    }

    pub fn with_all_track_errors(mut self, enabled: bool) -> Self {
        self.report_all_track_errors = enabled;
        self
    }

    pub fn with_zone_tests(mut self, enabled: bool) -> Self {
        self.test_tracks_against_zones = enabled;
        self
    }
}
