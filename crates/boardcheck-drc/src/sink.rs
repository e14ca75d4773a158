use std::collections::{BTreeMap, HashSet};

use thiserror::Error;

use crate::options::{DrcCategory, ReportLimit};
use crate::violation::{DrcCode, DrcViolation, ViolationKey};

/// Why the sink declined a record.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejected {
    #[error("an identical record was already reported")]
    Duplicate,
    #[error("the category has reached its report limit")]
    OverLimit,
}

/// Ordered, deduplicated accumulation of the findings of one pass.
#[derive(Debug, Default)]
pub struct ViolationSink {
    violations: Vec<DrcViolation>,
    seen: HashSet<ViolationKey>,
    counts: BTreeMap<DrcCode, usize>,
    per_category: BTreeMap<DrcCategory, usize>,
    limits: BTreeMap<DrcCategory, ReportLimit>,
}

impl ViolationSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(mut self, category: DrcCategory, limit: ReportLimit) -> Self {
        self.limits.insert(category, limit);
        self
    }

    pub fn set_limit(&mut self, category: DrcCategory, limit: ReportLimit) {
        self.limits.insert(category, limit);
    }

    /// Append `violation` unless an identical (code, items, location) record
    /// is already present or its category has reached its limit.
    pub fn report(&mut self, violation: DrcViolation) -> Result<&DrcViolation, Rejected> {
        let category = violation.code.category();
        let reported = self.per_category.get(&category).copied().unwrap_or(0);
        let limit = self.limits.get(&category).copied().unwrap_or_default();
        if !limit.allows(reported) {
            return Err(Rejected::OverLimit);
        }
        if !self.seen.insert(violation.key()) {
            return Err(Rejected::Duplicate);
        }
        *self.counts.entry(violation.code).or_insert(0) += 1;
        *self.per_category.entry(category).or_insert(0) += 1;
        self.violations.push(violation);
        Ok(&self.violations[self.violations.len() - 1])
    }

    pub fn count(&self, code: DrcCode) -> usize {
        self.counts.get(&code).copied().unwrap_or(0)
    }

    pub fn category_count(&self, category: DrcCategory) -> usize {
        self.per_category.get(&category).copied().unwrap_or(0)
    }

    /// True once `category` cannot accept more records.
    pub fn is_full(&self, category: DrcCategory) -> bool {
        let limit = self.limits.get(&category).copied().unwrap_or_default();
        !limit.allows(self.category_count(category))
    }

    pub fn all(&self) -> &[DrcViolation] {
        &self.violations
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn counts(&self) -> &BTreeMap<DrcCode, usize> {
        &self.counts
    }

    pub fn into_violations(self) -> Vec<DrcViolation> {
        self.violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boardcheck_core::{ItemRef, Point};

    fn near(a: usize, b: usize, x: i64) -> DrcViolation {
        DrcViolation::new(DrcCode::TrackNearTrack, Point::new(x, 0))
            .with_items(ItemRef::Track { index: a }, ItemRef::Track { index: b })
    }

    #[test]
    fn test_dedup_symmetric_pairs() {
        let mut sink = ViolationSink::new();
        assert!(sink.report(near(0, 1, 5)).is_ok());
        assert_eq!(sink.report(near(1, 0, 5)).unwrap_err(), Rejected::Duplicate);
        assert!(sink.report(near(0, 1, 6)).is_ok());
        assert_eq!(sink.count(DrcCode::TrackNearTrack), 2);
        assert_eq!(sink.len(), 2);
    }

    #[test]
    fn test_insertion_order_is_kept() {
        let mut sink = ViolationSink::new();
        sink.report(near(3, 4, 1)).unwrap();
        sink.report(near(0, 1, 2)).unwrap();
        let xs: Vec<i64> = sink.all().iter().map(|v| v.location.x).collect();
        assert_eq!(xs, vec![1, 2]);
    }

    #[test]
    fn test_category_limit() {
        let mut sink = ViolationSink::new().with_limit(DrcCategory::Tracks, ReportLimit::FirstN(1));
        sink.report(near(0, 1, 1)).unwrap();
        assert!(sink.is_full(DrcCategory::Tracks));
        assert_eq!(sink.report(near(0, 2, 1)).unwrap_err(), Rejected::OverLimit);
    }
}
