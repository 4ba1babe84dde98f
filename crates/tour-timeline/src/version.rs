//! Tour versions -- effective-dated delivery configurations of a tour.
//!
//! A version has no end date: it stays effective until the next version of the
//! same tour starts. The raw flags mirror how versions are configured and stored;
//! [`TourVersion::frequency`] and [`TourVersion::on_non_business_day`] normalize
//! them into a [`Frequency`] and an optional [`OnNonBusinessDay`] policy.

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::frequency::{Frequency, WeekdaySet};
use crate::shifter::OnNonBusinessDay;

pub type ClientId = u32;
pub type TourId = u32;
pub type TourVersionId = u32;

fn default_active() -> bool {
    true
}

/// One effective-dated configuration of a tour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TourVersion {
    pub id: TourVersionId,
    pub tour_id: TourId,
    #[serde(default)]
    pub client_id: ClientId,
    #[serde(default)]
    pub name: String,
    /// First day (inclusive) on which this version is effective.
    pub valid_from: NaiveDate,
    #[serde(default = "default_active")]
    pub active: bool,

    #[serde(default)]
    pub is_weekly: bool,
    #[serde(default)]
    pub every_week: u32,
    #[serde(default)]
    pub on_monday: bool,
    #[serde(default)]
    pub on_tuesday: bool,
    #[serde(default)]
    pub on_wednesday: bool,
    #[serde(default)]
    pub on_thursday: bool,
    #[serde(default)]
    pub on_friday: bool,
    #[serde(default)]
    pub on_saturday: bool,
    #[serde(default)]
    pub on_sunday: bool,

    #[serde(default)]
    pub is_monthly: bool,
    #[serde(default)]
    pub every_month: u32,
    #[serde(default)]
    pub month_day: u32,

    #[serde(default)]
    pub cancel_delivery_day: bool,
    #[serde(default)]
    pub move_delivery_day: bool,
}

impl TourVersion {
    /// An active version with no recurrence and no explicit policy.
    pub fn new(id: TourVersionId, tour_id: TourId, valid_from: NaiveDate) -> Self {
        Self {
            id,
            tour_id,
            client_id: 0,
            name: String::new(),
            valid_from,
            active: true,
            is_weekly: false,
            every_week: 0,
            on_monday: false,
            on_tuesday: false,
            on_wednesday: false,
            on_thursday: false,
            on_friday: false,
            on_saturday: false,
            on_sunday: false,
            is_monthly: false,
            every_month: 0,
            month_day: 0,
            cancel_delivery_day: false,
            move_delivery_day: false,
        }
    }

    /// Deliver weekly (flag form, every week) on `days`.
    pub fn weekly_on(mut self, days: WeekdaySet) -> Self {
        self.is_weekly = true;
        self.set_weekdays(days);
        self
    }

    /// Deliver every `every_week` weeks on `days`.
    pub fn every_nth_week_on(mut self, every_week: u32, days: WeekdaySet) -> Self {
        self.every_week = every_week;
        self.set_weekdays(days);
        self
    }

    /// Deliver monthly (flag form) on `month_day`.
    pub fn monthly_on(mut self, month_day: u32) -> Self {
        self.is_monthly = true;
        self.month_day = month_day;
        self
    }

    /// Deliver monthly (count form) on `month_day`. Any positive `every_month`
    /// activates the rule; the step stays one month.
    pub fn every_nth_month_on(mut self, every_month: u32, month_day: u32) -> Self {
        self.every_month = every_month;
        self.month_day = month_day;
        self
    }

    /// Set the explicit non-business-day policy.
    pub fn with_policy(mut self, policy: OnNonBusinessDay) -> Self {
        self.cancel_delivery_day = policy == OnNonBusinessDay::Cancel;
        self.move_delivery_day = policy == OnNonBusinessDay::MoveToNextBusinessDay;
        self
    }

    /// The weekdays flagged on this version.
    pub fn weekdays(&self) -> WeekdaySet {
        [
            (self.on_monday, Weekday::Mon),
            (self.on_tuesday, Weekday::Tue),
            (self.on_wednesday, Weekday::Wed),
            (self.on_thursday, Weekday::Thu),
            (self.on_friday, Weekday::Fri),
            (self.on_saturday, Weekday::Sat),
            (self.on_sunday, Weekday::Sun),
        ]
        .into_iter()
        .filter_map(|(flag, day)| flag.then_some(day))
        .collect()
    }

    pub fn set_weekdays(&mut self, days: WeekdaySet) {
        self.on_monday = days.contains(Weekday::Mon);
        self.on_tuesday = days.contains(Weekday::Tue);
        self.on_wednesday = days.contains(Weekday::Wed);
        self.on_thursday = days.contains(Weekday::Thu);
        self.on_friday = days.contains(Weekday::Fri);
        self.on_saturday = days.contains(Weekday::Sat);
        self.on_sunday = days.contains(Weekday::Sun);
    }

    /// Normalize the recurrence flags into at most one [`Frequency`].
    ///
    /// Weekly wins over monthly. A set flag forces an interval of 1. A positive
    /// `every_week` both activates the weekly rule and sets its interval; a
    /// positive `every_month` only activates the monthly rule.
    /// `Ok(None)` means the version defines no delivery schedule.
    ///
    /// # Errors
    /// Returns `TimelineError::InvalidArgument` if a monthly version carries a
    /// `month_day` outside `1..=31`.
    pub fn frequency(&self) -> Result<Option<Frequency>> {
        if self.is_weekly || self.every_week > 0 {
            let every_nth_week = if self.is_weekly { 1 } else { self.every_week };
            return Frequency::weekly(every_nth_week, self.weekdays()).map(Some);
        }

        // `every_month` only switches the monthly rule on; it always steps one month.
        if self.is_monthly || self.every_month > 0 {
            return Frequency::monthly(1, self.month_day).map(Some);
        }

        Ok(None)
    }

    /// The explicitly configured policy, `None` when the version leaves it open.
    ///
    /// Cancel wins if both flags are set.
    pub fn on_non_business_day(&self) -> Option<OnNonBusinessDay> {
        if self.cancel_delivery_day {
            Some(OnNonBusinessDay::Cancel)
        } else if self.move_delivery_day {
            Some(OnNonBusinessDay::MoveToNextBusinessDay)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn version() -> TourVersion {
        TourVersion::new(1, 1, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap())
    }

    fn mon_wed() -> WeekdaySet {
        WeekdaySet::new().with(Weekday::Mon).with(Weekday::Wed)
    }

    #[test]
    fn no_flags_means_no_frequency() {
        assert_eq!(version().frequency().unwrap(), None);
    }

    #[test]
    fn weekly_flag_forces_interval_of_one() {
        let mut v = version().weekly_on(mon_wed());
        v.every_week = 3;
        assert_eq!(
            v.frequency().unwrap(),
            Some(Frequency::Weekly {
                every_nth_week: 1,
                only_days: mon_wed()
            })
        );
    }

    #[test]
    fn every_week_count_activates_weekly() {
        let v = version().every_nth_week_on(2, WeekdaySet::EMPTY);
        assert_eq!(
            v.frequency().unwrap(),
            Some(Frequency::Weekly {
                every_nth_week: 2,
                only_days: WeekdaySet::EMPTY
            })
        );
    }

    #[test]
    fn monthly_flag_forces_interval_of_one() {
        let mut v = version().monthly_on(15);
        v.every_month = 4;
        assert_eq!(
            v.frequency().unwrap(),
            Some(Frequency::Monthly {
                every_nth_month: 1,
                month_day: 15
            })
        );
    }

    #[test]
    fn every_month_count_activates_monthly_with_step_of_one() {
        let v = version().every_nth_month_on(3, 31);
        assert_eq!(
            v.frequency().unwrap(),
            Some(Frequency::Monthly {
                every_nth_month: 1,
                month_day: 31
            })
        );
    }

    #[test]
    fn weekly_takes_priority_over_monthly() {
        let v = version().monthly_on(10).weekly_on(mon_wed());
        assert!(v.frequency().unwrap().unwrap().is_weekly());
    }

    #[test]
    fn monthly_without_month_day_is_invalid() {
        let mut v = version();
        v.is_monthly = true;
        assert!(v.frequency().is_err());
    }

    #[test]
    fn policy_extraction() {
        assert_eq!(version().on_non_business_day(), None);
        assert_eq!(
            version()
                .with_policy(OnNonBusinessDay::MoveToNextBusinessDay)
                .on_non_business_day(),
            Some(OnNonBusinessDay::MoveToNextBusinessDay)
        );
        let mut both = version();
        both.cancel_delivery_day = true;
        both.move_delivery_day = true;
        assert_eq!(both.on_non_business_day(), Some(OnNonBusinessDay::Cancel));
    }

    #[test]
    fn weekday_flags_roundtrip_through_set() {
        let mut v = version();
        v.set_weekdays(mon_wed().with(Weekday::Sun));
        assert!(v.on_monday && v.on_wednesday && v.on_sunday);
        assert!(!v.on_tuesday && !v.on_saturday);
        assert_eq!(v.weekdays(), mon_wed().with(Weekday::Sun));
    }

    #[test]
    fn deserializes_with_defaults() {
        let json = r#"{"id":7,"tour_id":3,"valid_from":"2026-02-01","is_weekly":true,"on_friday":true}"#;
        let v: TourVersion = serde_json::from_str(json).unwrap();
        assert!(v.active);
        assert_eq!(v.weekdays(), WeekdaySet::new().with(Weekday::Fri));
        assert_eq!(v.on_non_business_day(), None);
    }
}
