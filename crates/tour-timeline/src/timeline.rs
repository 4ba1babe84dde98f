//! Tour-version timeline resolution.
//!
//! Partitions a query interval `[date_from, date_to]` into the sequence of tour
//! versions effective during each sub-interval, and attaches to each range the
//! [`DateSequenceGenerator`] that yields its delivery dates.
//!
//! Versions carry only a start date, so a version's range ends the day before
//! the next version starts; the last range ends at `date_to`. A version starting
//! before `date_from` that is still effective at `date_from` is clipped to start
//! at `date_from`. When the earliest version starts strictly after `date_from`,
//! the days before it stay uncovered.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calendar::{self, BusinessDayMatcher};
use crate::error::{Result, TimelineError};
use crate::frequency::Frequency;
use crate::generator::DateSequenceGenerator;
use crate::shifter::{DateShifter, OnNonBusinessDay};
use crate::version::{TourVersion, TourVersionId};

/// The part of `[date_from, date_to]` during which one tour version is effective.
#[derive(Debug, Clone)]
pub struct TourVersionRange {
    version: TourVersion,
    valid_from: NaiveDate,
    valid_to: NaiveDate,
    generator: Option<DateSequenceGenerator>,
}

impl TourVersionRange {
    pub fn version(&self) -> &TourVersion {
        &self.version
    }

    /// First effective day (inclusive).
    pub fn valid_from(&self) -> NaiveDate {
        self.valid_from
    }

    /// Last effective day (inclusive).
    pub fn valid_to(&self) -> NaiveDate {
        self.valid_to
    }

    /// `None` when the version defines no recurrence.
    pub fn generator(&self) -> Option<&DateSequenceGenerator> {
        self.generator.as_ref()
    }

    /// Delivery dates of this range; empty when there is no generator.
    pub fn delivery_dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.generator.iter().flat_map(|generator| generator.iter())
    }
}

/// A delivery date together with the version that scheduled it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryDay {
    pub tour_version_id: TourVersionId,
    pub date: NaiveDate,
}

/// Flatten the delivery dates of all ranges, in range order.
pub fn delivery_days(ranges: &[TourVersionRange]) -> Vec<DeliveryDay> {
    ranges
        .iter()
        .flat_map(|range| {
            let tour_version_id = range.version.id;
            range.delivery_dates().map(move |date| DeliveryDay {
                tour_version_id,
                date,
            })
        })
        .collect()
}

/// Resolver state while walking the versions.
#[derive(Debug, Clone, Copy)]
enum Cursor<'a> {
    /// No version is known to be effective at `date_from` yet. `candidate` is
    /// the latest version starting before `date_from`, if any.
    Searching { candidate: Option<&'a TourVersion> },
    /// `version` is effective from `from` until the next version starts.
    Confirmed {
        version: &'a TourVersion,
        from: NaiveDate,
    },
}

/// Builds [`TourVersionRange`]s against a business-day calendar.
#[derive(Debug, Clone)]
pub struct TimelineResolver {
    calendar: Arc<dyn BusinessDayMatcher>,
}

impl TimelineResolver {
    pub fn new(calendar: Arc<dyn BusinessDayMatcher>) -> Self {
        Self { calendar }
    }

    pub fn calendar(&self) -> &Arc<dyn BusinessDayMatcher> {
        &self.calendar
    }

    /// Partition `[date_from, date_to]` among `versions`.
    ///
    /// `versions` must be sorted ascending by `valid_from`. Versions starting
    /// after `date_to` are ignored. The result is empty when no version is
    /// effective anywhere in the interval.
    ///
    /// # Errors
    /// Returns `TimelineError::InvalidArgument` if `date_from > date_to`, if
    /// `versions` is not sorted, or if a version carries an invalid recurrence.
    pub fn resolve(
        &self,
        versions: &[TourVersion],
        date_from: NaiveDate,
        date_to: NaiveDate,
    ) -> Result<Vec<TourVersionRange>> {
        if date_from > date_to {
            return Err(TimelineError::invalid(format!(
                "date_from ({}) must not be after date_to ({})",
                date_from, date_to
            )));
        }
        if !versions.is_sorted_by_key(|v| v.valid_from) {
            return Err(TimelineError::invalid(
                "tour versions must be sorted ascending by valid_from",
            ));
        }

        let in_scope = &versions[..versions.partition_point(|v| v.valid_from <= date_to)];
        if in_scope.len() < versions.len() {
            debug!(
                ignored = versions.len() - in_scope.len(),
                %date_to,
                "ignoring tour versions starting after date_to"
            );
        }

        let mut ranges = Vec::new();
        let mut cursor = Cursor::Searching { candidate: None };

        for (index, version) in in_scope.iter().enumerate() {
            let start = version.valid_from;
            let is_last = index + 1 == in_scope.len();

            cursor = match cursor {
                Cursor::Searching { candidate } => {
                    if start < date_from {
                        if is_last {
                            Cursor::Confirmed {
                                version,
                                from: date_from,
                            }
                        } else {
                            Cursor::Searching {
                                candidate: Some(version),
                            }
                        }
                    } else if start == date_from {
                        Cursor::Confirmed {
                            version,
                            from: date_from,
                        }
                    } else {
                        if let Some(previous) = candidate {
                            self.push_range(&mut ranges, previous, date_from, day_before(start))?;
                        } else {
                            debug!(
                                tour_version_id = version.id,
                                %date_from,
                                %start,
                                "no tour version effective at date_from; leaving gap"
                            );
                        }
                        Cursor::Confirmed {
                            version,
                            from: start,
                        }
                    }
                }
                Cursor::Confirmed {
                    version: previous,
                    from,
                } => {
                    self.push_range(&mut ranges, previous, from, day_before(start))?;
                    Cursor::Confirmed {
                        version,
                        from: start,
                    }
                }
            };
        }

        if let Cursor::Confirmed { version, from } = cursor {
            self.push_range(&mut ranges, version, from, date_to)?;
        }

        debug!(
            ranges = ranges.len(),
            %date_from,
            %date_to,
            "resolved tour version ranges"
        );
        Ok(ranges)
    }

    fn push_range(
        &self,
        ranges: &mut Vec<TourVersionRange>,
        version: &TourVersion,
        valid_from: NaiveDate,
        valid_to: NaiveDate,
    ) -> Result<()> {
        // Superseded on its own start day by a version with the same valid_from.
        if valid_to < valid_from {
            debug!(
                tour_version_id = version.id,
                %valid_from,
                "skipping tour version superseded on the same day"
            );
            return Ok(());
        }

        ranges.push(self.create_tour_version_range(version, valid_from, valid_to)?);
        Ok(())
    }

    fn create_tour_version_range(
        &self,
        version: &TourVersion,
        valid_from: NaiveDate,
        valid_to: NaiveDate,
    ) -> Result<TourVersionRange> {
        Ok(TourVersionRange {
            version: version.clone(),
            valid_from,
            valid_to,
            generator: self.create_date_sequence_generator(version, valid_from, valid_to)?,
        })
    }

    /// Build the generator for `version` over `[valid_from, valid_to]`.
    ///
    /// Returns `Ok(None)` when the version has no recurrence. Shifted dates never
    /// leave the range: the following version schedules its own deliveries.
    pub fn create_date_sequence_generator(
        &self,
        version: &TourVersion,
        valid_from: NaiveDate,
        valid_to: NaiveDate,
    ) -> Result<Option<DateSequenceGenerator>> {
        let Some(frequency) = version.frequency()? else {
            return Ok(None);
        };

        let shifter = self.create_date_shifter(&frequency, version.on_non_business_day());
        let generator = DateSequenceGenerator::new(valid_from, valid_to, frequency, shifter)?
            .enforce_date_to_after_shift(true);
        Ok(Some(generator))
    }

    /// Build the shifter for `frequency`.
    ///
    /// When the user picked specific weekdays and left the policy open, those
    /// weekdays count as business days even if the calendar has them as weekend.
    pub fn create_date_shifter(
        &self,
        frequency: &Frequency,
        policy: Option<OnNonBusinessDay>,
    ) -> DateShifter {
        let mut matcher = Arc::clone(&self.calendar);
        if frequency.is_weekly() && frequency.is_only_some_days_of_the_week() && policy.is_none() {
            matcher = calendar::remove_weekend_days(matcher, frequency.only_days_of_week());
        }

        DateShifter::new(matcher, policy.unwrap_or_default())
    }
}

fn day_before(date: NaiveDate) -> NaiveDate {
    date.pred_opt().unwrap_or(date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::HolidayCalendar;
    use crate::frequency::WeekdaySet;
    use chrono::Weekday;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn resolver() -> TimelineResolver {
        TimelineResolver::new(Arc::new(HolidayCalendar::weekends_only()))
    }

    #[test]
    fn day_before_saturates_at_min_date() {
        assert_eq!(day_before(NaiveDate::MIN), NaiveDate::MIN);
        assert_eq!(day_before(date(2026, 3, 1)), date(2026, 2, 28));
    }

    #[test]
    fn explicit_weekdays_without_policy_are_business_days() {
        let frequency = Frequency::weekly(1, WeekdaySet::new().with(Weekday::Sat)).unwrap();
        let shifter = resolver().create_date_shifter(&frequency, None);
        assert_eq!(shifter.policy(), OnNonBusinessDay::Cancel);
        assert!(shifter.matcher().is_business_day(date(2026, 3, 7)));
    }

    #[test]
    fn explicit_policy_keeps_calendar_weekend() {
        let frequency = Frequency::weekly(1, WeekdaySet::new().with(Weekday::Sat)).unwrap();
        let shifter =
            resolver().create_date_shifter(&frequency, Some(OnNonBusinessDay::Cancel));
        assert!(!shifter.matcher().is_business_day(date(2026, 3, 7)));
    }

    #[test]
    fn unrestricted_weekly_keeps_calendar_weekend() {
        let frequency = Frequency::weekly(1, WeekdaySet::EMPTY).unwrap();
        let shifter = resolver().create_date_shifter(&frequency, None);
        assert!(!shifter.matcher().is_business_day(date(2026, 3, 7)));
    }

    #[test]
    fn range_generator_enforces_date_to() {
        let version = TourVersion::new(1, 1, date(2026, 3, 1)).weekly_on(WeekdaySet::EMPTY);
        let generator = resolver()
            .create_date_sequence_generator(&version, date(2026, 3, 1), date(2026, 3, 31))
            .unwrap()
            .unwrap();
        assert!(generator.is_enforcing_date_to_after_shift());
    }
}
