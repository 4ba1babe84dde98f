//! Delivery date generation -- turns a [`Frequency`] and a bounding interval into
//! the concrete, business-day adjusted dates on which deliveries happen.
//!
//! A [`DateSequenceGenerator`] is immutable. Every call to
//! [`DateSequenceGenerator::iter`] starts a fresh [`DeliveryDates`] cursor, so
//! the same generator can be iterated repeatedly, and from several threads,
//! with identical results.

use std::iter::FusedIterator;

use chrono::{Datelike, Days, Months, NaiveDate};
use tracing::trace;

use crate::error::{Result, TimelineError};
use crate::frequency::{Frequency, WeekdaySet};
use crate::shifter::DateShifter;

/// Produces the delivery dates of one recurrence rule within `[date_from, date_to]`.
#[derive(Debug, Clone)]
pub struct DateSequenceGenerator {
    date_from: NaiveDate,
    date_to: NaiveDate,
    frequency: Frequency,
    shifter: DateShifter,
    enforce_date_to_after_shift: bool,
}

impl DateSequenceGenerator {
    /// Create a generator bounded by `date_from..=date_to` (both inclusive).
    ///
    /// Shifted dates may land after `date_to` unless
    /// [`enforce_date_to_after_shift`](Self::enforce_date_to_after_shift) is set.
    ///
    /// # Errors
    /// Returns `TimelineError::InvalidArgument` if `date_from > date_to` or the
    /// frequency carries an out-of-range parameter.
    pub fn new(
        date_from: NaiveDate,
        date_to: NaiveDate,
        frequency: Frequency,
        shifter: DateShifter,
    ) -> Result<Self> {
        if date_from > date_to {
            return Err(TimelineError::invalid(format!(
                "date_from ({}) must not be after date_to ({})",
                date_from, date_to
            )));
        }
        frequency.validate()?;

        Ok(Self {
            date_from,
            date_to,
            frequency,
            shifter,
            enforce_date_to_after_shift: false,
        })
    }

    /// Drop occurrences whose shifted date would land after `date_to`.
    pub fn enforce_date_to_after_shift(mut self, enforce: bool) -> Self {
        self.enforce_date_to_after_shift = enforce;
        self
    }

    pub fn date_from(&self) -> NaiveDate {
        self.date_from
    }

    pub fn date_to(&self) -> NaiveDate {
        self.date_to
    }

    pub fn frequency(&self) -> &Frequency {
        &self.frequency
    }

    pub fn shifter(&self) -> &DateShifter {
        &self.shifter
    }

    pub fn is_enforcing_date_to_after_shift(&self) -> bool {
        self.enforce_date_to_after_shift
    }

    /// Start a new pass over the delivery dates.
    pub fn iter(&self) -> DeliveryDates<'_> {
        DeliveryDates {
            generator: self,
            raw: RawOccurrences::new(self.frequency, self.date_from, self.date_to),
            last_emitted: None,
        }
    }

    /// Collect all delivery dates.
    pub fn generate(&self) -> Vec<NaiveDate> {
        self.iter().collect()
    }
}

impl<'a> IntoIterator for &'a DateSequenceGenerator {
    type Item = NaiveDate;
    type IntoIter = DeliveryDates<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A single pass over a generator's delivery dates, strictly ascending.
#[derive(Debug, Clone)]
pub struct DeliveryDates<'a> {
    generator: &'a DateSequenceGenerator,
    raw: RawOccurrences,
    last_emitted: Option<NaiveDate>,
}

impl Iterator for DeliveryDates<'_> {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        let generator = self.generator;
        let limit = generator
            .enforce_date_to_after_shift
            .then_some(generator.date_to);

        loop {
            let raw = self.raw.next()?;

            let Some(date) = generator.shifter.shift(raw, limit) else {
                trace!(%raw, policy = ?generator.shifter.policy(), "occurrence dropped on non-business day");
                continue;
            };

            // A moved occurrence can catch up with the next raw one.
            if self.last_emitted.is_some_and(|last| date <= last) {
                trace!(%raw, %date, "shifted occurrence already delivered");
                continue;
            }

            if date != raw {
                trace!(%raw, %date, "occurrence moved to next business day");
            }
            self.last_emitted = Some(date);
            return Some(date);
        }
    }
}

impl FusedIterator for DeliveryDates<'_> {}

/// Unshifted occurrences of a frequency, within the bounds.
#[derive(Debug, Clone)]
struct RawOccurrences {
    date_from: NaiveDate,
    date_to: NaiveDate,
    state: RawState,
}

#[derive(Debug, Clone)]
enum RawState {
    Weekly {
        cursor: NaiveDate,
        anchor: NaiveDate,
        every_nth_week: u32,
        only_days: WeekdaySet,
    },
    Monthly {
        first_month: NaiveDate,
        offset: u32,
        every_nth_month: u32,
        month_day: u32,
    },
    Done,
}

impl RawOccurrences {
    fn new(frequency: Frequency, date_from: NaiveDate, date_to: NaiveDate) -> Self {
        let state = match frequency {
            Frequency::Weekly {
                every_nth_week,
                only_days,
            } => RawState::Weekly {
                cursor: date_from,
                anchor: date_from,
                every_nth_week,
                only_days,
            },
            Frequency::Monthly {
                every_nth_month,
                month_day,
            } => RawState::Monthly {
                first_month: month_start(date_from),
                offset: 0,
                every_nth_month,
                month_day,
            },
        };

        Self {
            date_from,
            date_to,
            state,
        }
    }

    fn next_weekly(&mut self) -> Option<NaiveDate> {
        let RawState::Weekly {
            cursor,
            anchor,
            every_nth_week,
            only_days,
        } = &mut self.state
        else {
            return None;
        };

        while *cursor <= self.date_to {
            let date = *cursor;

            let week_index = weeks_between(*anchor, date);
            let step = i64::from(*every_nth_week);
            if week_index % step != 0 {
                let next_week = (week_index / step + 1) * step;
                *cursor = monday_of_week(*anchor, next_week)?;
                continue;
            }

            *cursor = date.succ_opt()?;
            if only_days.is_empty() || only_days.contains(date.weekday()) {
                return Some(date);
            }
        }
        None
    }

    fn next_monthly(&mut self) -> Option<NaiveDate> {
        let RawState::Monthly {
            first_month,
            offset,
            every_nth_month,
            month_day,
        } = &mut self.state
        else {
            return None;
        };

        loop {
            let months = offset.checked_mul(*every_nth_month)?;
            let month = first_month.checked_add_months(Months::new(months))?;
            if month > self.date_to {
                return None;
            }
            *offset += 1;

            let date = clamp_to_month(month, *month_day);
            if date < self.date_from {
                continue;
            }
            return (date <= self.date_to).then_some(date);
        }
    }
}

impl Iterator for RawOccurrences {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        let next = match self.state {
            RawState::Weekly { .. } => self.next_weekly(),
            RawState::Monthly { .. } => self.next_monthly(),
            RawState::Done => None,
        };
        if next.is_none() {
            self.state = RawState::Done;
        }
        next
    }
}

/// Whole Monday-based calendar weeks from the week containing `anchor` to the
/// week containing `date` (`date >= anchor`).
///
/// Counted from `anchor` itself so the Monday of its week never has to exist.
fn weeks_between(anchor: NaiveDate, date: NaiveDate) -> i64 {
    let lead = i64::from(anchor.weekday().num_days_from_monday());
    ((date - anchor).num_days() + lead).div_euclid(7)
}

/// Monday of the `week`-th week after the week containing `anchor` (`week >= 1`).
fn monday_of_week(anchor: NaiveDate, week: i64) -> Option<NaiveDate> {
    let lead = i64::from(anchor.weekday().num_days_from_monday());
    let offset = u64::try_from(week.checked_mul(7)? - lead).ok()?;
    anchor.checked_add_days(Days::new(offset))
}

fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// `day` of the month starting at `month`, clamped to the month's last day.
fn clamp_to_month(month: NaiveDate, day: u32) -> NaiveDate {
    let last_day = month
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .map_or(31, |last| last.day());
    month.with_day(day.min(last_day)).unwrap_or(month)
}
