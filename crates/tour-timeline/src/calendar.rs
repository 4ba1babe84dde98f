//! Business-day calendars.
//!
//! The engine never decides on its own which dates are business days: it
//! consumes a [`BusinessDayMatcher`] supplied by the host. A date is a
//! business day when it is neither a weekend day nor a holiday.
//!
//! [`ExcludedWeekendDays`] wraps another matcher and forces a set of weekdays
//! out of the weekend, leaving holidays untouched. It backs the rule that
//! explicitly selected delivery weekdays are not second-guessed by the
//! calendar's default weekend.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::frequency::WeekdaySet;

/// Answers "is this date a business day?".
pub trait BusinessDayMatcher: fmt::Debug + Send + Sync {
    /// `true` if `date` falls on a weekday this calendar treats as weekend.
    fn is_weekend_day(&self, date: NaiveDate) -> bool;

    /// `true` if `date` is a (non-weekend) holiday.
    fn is_holiday(&self, date: NaiveDate) -> bool;

    fn is_business_day(&self, date: NaiveDate) -> bool {
        !self.is_weekend_day(date) && !self.is_holiday(date)
    }
}

impl<M: BusinessDayMatcher + ?Sized> BusinessDayMatcher for Arc<M> {
    fn is_weekend_day(&self, date: NaiveDate) -> bool {
        (**self).is_weekend_day(date)
    }

    fn is_holiday(&self, date: NaiveDate) -> bool {
        (**self).is_holiday(date)
    }

    fn is_business_day(&self, date: NaiveDate) -> bool {
        (**self).is_business_day(date)
    }
}

/// Treats every day as a business day.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllDaysCalendar;

impl BusinessDayMatcher for AllDaysCalendar {
    fn is_weekend_day(&self, _date: NaiveDate) -> bool {
        false
    }

    fn is_holiday(&self, _date: NaiveDate) -> bool {
        false
    }
}

/// A calendar with a fixed set of weekend weekdays and a list of holidays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HolidayCalendar {
    weekend: WeekdaySet,
    holidays: BTreeSet<NaiveDate>,
}

impl HolidayCalendar {
    pub fn new(weekend: WeekdaySet, holidays: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            weekend,
            holidays: holidays.into_iter().collect(),
        }
    }

    /// Saturday/Sunday weekend, no holidays.
    pub fn weekends_only() -> Self {
        Self::new(default_weekend(), [])
    }

    pub fn weekend(&self) -> WeekdaySet {
        self.weekend
    }

    pub fn holidays(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.holidays.iter().copied()
    }
}

impl Default for HolidayCalendar {
    fn default() -> Self {
        Self::weekends_only()
    }
}

impl BusinessDayMatcher for HolidayCalendar {
    fn is_weekend_day(&self, date: NaiveDate) -> bool {
        self.weekend.contains(date.weekday())
    }

    fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays.contains(&date)
    }
}

/// Removes a set of weekdays from the wrapped calendar's weekend.
#[derive(Debug, Clone)]
pub struct ExcludedWeekendDays<M> {
    inner: M,
    excluded: WeekdaySet,
}

impl<M: BusinessDayMatcher> ExcludedWeekendDays<M> {
    pub fn new(inner: M, excluded: WeekdaySet) -> Self {
        Self { inner, excluded }
    }
}

impl<M: BusinessDayMatcher> BusinessDayMatcher for ExcludedWeekendDays<M> {
    fn is_weekend_day(&self, date: NaiveDate) -> bool {
        !self.excluded.contains(date.weekday()) && self.inner.is_weekend_day(date)
    }

    fn is_holiday(&self, date: NaiveDate) -> bool {
        self.inner.is_holiday(date)
    }
}

/// Return a matcher identical to `matcher` except that `days` are never weekend days.
pub fn remove_weekend_days(
    matcher: Arc<dyn BusinessDayMatcher>,
    days: WeekdaySet,
) -> Arc<dyn BusinessDayMatcher> {
    if days.is_empty() {
        return matcher;
    }
    Arc::new(ExcludedWeekendDays::new(matcher, days))
}

fn default_weekend() -> WeekdaySet {
    WeekdaySet::new().with(Weekday::Sat).with(Weekday::Sun)
}

/// Serializable calendar configuration, as found in a planning document.
///
/// ```json
/// { "weekend": ["Sat", "Sun"], "holidays": ["2026-12-25", "2026-12-26"] }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarConfig {
    #[serde(default = "default_weekend")]
    pub weekend: WeekdaySet,
    #[serde(default)]
    pub holidays: Vec<NaiveDate>,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            weekend: default_weekend(),
            holidays: Vec::new(),
        }
    }
}

impl CalendarConfig {
    pub fn build(&self) -> HolidayCalendar {
        HolidayCalendar::new(self.weekend, self.holidays.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn weekends_are_not_business_days() {
        let cal = HolidayCalendar::weekends_only();
        // 2026-03-07 is a Saturday
        assert!(!cal.is_business_day(date(2026, 3, 7)));
        assert!(!cal.is_business_day(date(2026, 3, 8)));
        assert!(cal.is_business_day(date(2026, 3, 9)));
    }

    #[test]
    fn holidays_are_not_business_days() {
        let cal = HolidayCalendar::new(default_weekend(), [date(2026, 12, 25)]);
        assert!(cal.is_holiday(date(2026, 12, 25)));
        assert!(!cal.is_business_day(date(2026, 12, 25)));
        assert!(cal.is_business_day(date(2026, 12, 24)));
    }

    #[test]
    fn excluded_weekday_becomes_business_day_but_holidays_stay() {
        let base: Arc<dyn BusinessDayMatcher> =
            Arc::new(HolidayCalendar::new(default_weekend(), [date(2026, 3, 14)]));
        let cal = remove_weekend_days(base, WeekdaySet::new().with(Weekday::Sat));
        assert!(cal.is_business_day(date(2026, 3, 7)));
        assert!(!cal.is_business_day(date(2026, 3, 8)));
        // a Saturday that is also a holiday
        assert!(!cal.is_business_day(date(2026, 3, 14)));
    }

    #[test]
    fn config_defaults_to_saturday_sunday_weekend() {
        let config: CalendarConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, CalendarConfig::default());
        assert_eq!(config.build(), HolidayCalendar::weekends_only());
    }
}
