//! Non-business-day policies for delivery occurrences.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::BusinessDayMatcher;

/// Longest forward search for a business day when no upper bound applies.
pub const MAX_SHIFT_DAYS: u32 = 366;

/// What to do with an occurrence that lands on a non-business day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OnNonBusinessDay {
    /// Drop the occurrence.
    #[default]
    Cancel,
    /// Roll the occurrence forward to the next business day.
    MoveToNextBusinessDay,
}

/// Applies an [`OnNonBusinessDay`] policy against a business-day calendar.
#[derive(Debug, Clone)]
pub struct DateShifter {
    matcher: Arc<dyn BusinessDayMatcher>,
    policy: OnNonBusinessDay,
}

impl DateShifter {
    pub fn new(matcher: Arc<dyn BusinessDayMatcher>, policy: OnNonBusinessDay) -> Self {
        Self { matcher, policy }
    }

    pub fn policy(&self) -> OnNonBusinessDay {
        self.policy
    }

    pub fn matcher(&self) -> &Arc<dyn BusinessDayMatcher> {
        &self.matcher
    }

    /// Shift `date` according to the policy.
    ///
    /// Returns `None` when the occurrence is dropped: it was cancelled, the
    /// next business day lies after `limit`, or no business day was found
    /// within [`MAX_SHIFT_DAYS`].
    pub fn shift(&self, date: NaiveDate, limit: Option<NaiveDate>) -> Option<NaiveDate> {
        if self.matcher.is_business_day(date) {
            return Some(date);
        }

        match self.policy {
            OnNonBusinessDay::Cancel => None,
            OnNonBusinessDay::MoveToNextBusinessDay => {
                let mut candidate = date;
                for _ in 0..MAX_SHIFT_DAYS {
                    candidate = candidate.succ_opt()?;
                    if limit.is_some_and(|l| candidate > l) {
                        return None;
                    }
                    if self.matcher.is_business_day(candidate) {
                        return Some(candidate);
                    }
                }
                None
            }
        }
    }
}
