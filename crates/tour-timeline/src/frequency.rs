//! Recurrence rules for delivery dates.
//!
//! A [`Frequency`] is either weekly (every Nth calendar week, optionally on a
//! restricted set of weekdays) or monthly (every Nth month on a fixed day of the
//! month). "No recurrence" is modeled as `Option<Frequency>::None` by callers.

use std::fmt;

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TimelineError};

const ALL_WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// A set of weekdays stored as a 7-bit mask (bit 0 = Monday).
///
/// An empty set means "every day of the week" wherever a weekly frequency is
/// concerned; use [`WeekdaySet::is_restricted`] to ask that question directly.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Weekday>", into = "Vec<Weekday>")]
pub struct WeekdaySet(u8);

impl WeekdaySet {
    pub const EMPTY: WeekdaySet = WeekdaySet(0);

    pub fn new() -> Self {
        Self::EMPTY
    }

    fn bit(day: Weekday) -> u8 {
        1 << day.num_days_from_monday()
    }

    pub fn insert(&mut self, day: Weekday) {
        self.0 |= Self::bit(day);
    }

    pub fn with(mut self, day: Weekday) -> Self {
        self.insert(day);
        self
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0 & Self::bit(day) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// `true` when at least one weekday was explicitly selected.
    pub fn is_restricted(&self) -> bool {
        !self.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Iterate the contained weekdays, Monday first.
    pub fn iter(&self) -> impl Iterator<Item = Weekday> + '_ {
        ALL_WEEKDAYS.into_iter().filter(move |d| self.contains(*d))
    }
}

impl FromIterator<Weekday> for WeekdaySet {
    fn from_iter<I: IntoIterator<Item = Weekday>>(iter: I) -> Self {
        let mut set = WeekdaySet::new();
        for day in iter {
            set.insert(day);
        }
        set
    }
}

impl From<Vec<Weekday>> for WeekdaySet {
    fn from(days: Vec<Weekday>) -> Self {
        days.into_iter().collect()
    }
}

impl From<WeekdaySet> for Vec<Weekday> {
    fn from(set: WeekdaySet) -> Self {
        set.iter().collect()
    }
}

impl fmt::Debug for WeekdaySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// A delivery recurrence rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Frequency {
    /// Every `every_nth_week` calendar weeks, on `only_days` (all days if empty).
    Weekly {
        every_nth_week: u32,
        only_days: WeekdaySet,
    },
    /// Every `every_nth_month` months on `month_day`, clamped to the month's length.
    Monthly { every_nth_month: u32, month_day: u32 },
}

impl Frequency {
    /// Build a weekly rule.
    ///
    /// # Errors
    /// Returns `TimelineError::InvalidArgument` if `every_nth_week` is zero.
    pub fn weekly(every_nth_week: u32, only_days: WeekdaySet) -> Result<Self> {
        if every_nth_week == 0 {
            return Err(TimelineError::invalid("every_nth_week must be at least 1"));
        }
        Ok(Frequency::Weekly {
            every_nth_week,
            only_days,
        })
    }

    /// Build a monthly rule.
    ///
    /// # Errors
    /// Returns `TimelineError::InvalidArgument` if `every_nth_month` is zero or
    /// `month_day` is outside `1..=31`.
    pub fn monthly(every_nth_month: u32, month_day: u32) -> Result<Self> {
        if every_nth_month == 0 {
            return Err(TimelineError::invalid("every_nth_month must be at least 1"));
        }
        if !(1..=31).contains(&month_day) {
            return Err(TimelineError::invalid(format!(
                "month_day must be within 1..=31, got {}",
                month_day
            )));
        }
        Ok(Frequency::Monthly {
            every_nth_month,
            month_day,
        })
    }

    pub fn is_weekly(&self) -> bool {
        matches!(self, Frequency::Weekly { .. })
    }

    pub fn is_monthly(&self) -> bool {
        matches!(self, Frequency::Monthly { .. })
    }

    /// The explicitly selected weekdays of a weekly rule. Monthly rules and
    /// unrestricted weekly rules return an empty set.
    pub fn only_days_of_week(&self) -> WeekdaySet {
        match self {
            Frequency::Weekly { only_days, .. } => *only_days,
            Frequency::Monthly { .. } => WeekdaySet::EMPTY,
        }
    }

    /// `true` for a weekly rule restricted to an explicit, non-empty set of weekdays.
    pub fn is_only_some_days_of_the_week(&self) -> bool {
        self.only_days_of_week().is_restricted()
    }

    /// Validate a rule that may have been constructed literally or deserialized.
    pub(crate) fn validate(&self) -> Result<()> {
        match *self {
            Frequency::Weekly {
                every_nth_week,
                only_days,
            } => Frequency::weekly(every_nth_week, only_days).map(|_| ()),
            Frequency::Monthly {
                every_nth_month,
                month_day,
            } => Frequency::monthly(every_nth_month, month_day).map(|_| ()),
        }
    }
}
