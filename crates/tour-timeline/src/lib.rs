//! # tour-timeline
//!
//! Tour-version timeline resolution and delivery date recurrence.
//!
//! A tour is configured through a history of effective-dated versions, each
//! describing a delivery frequency (weekly or monthly) and what happens to a
//! delivery that falls on a non-business day. Given such a history and a query
//! interval, this crate works out which version governs each part of the
//! interval and lazily generates the concrete delivery dates.
//!
//! ```rust
//! use std::sync::Arc;
//! use chrono::{NaiveDate, Weekday};
//! use tour_timeline::{HolidayCalendar, TimelineResolver, TourVersion, WeekdaySet};
//!
//! let date = |m, d| NaiveDate::from_ymd_opt(2026, m, d).unwrap();
//! let versions = vec![
//!     TourVersion::new(1, 1, date(1, 1)).weekly_on(WeekdaySet::new().with(Weekday::Mon)),
//!     TourVersion::new(2, 1, date(3, 11)).weekly_on(WeekdaySet::new().with(Weekday::Fri)),
//! ];
//!
//! let resolver = TimelineResolver::new(Arc::new(HolidayCalendar::weekends_only()));
//! let ranges = resolver.resolve(&versions, date(3, 1), date(3, 15)).unwrap();
//!
//! assert_eq!(ranges.len(), 2);
//! assert_eq!(ranges[0].valid_from(), date(3, 1));
//! assert_eq!(ranges[0].valid_to(), date(3, 10));
//! assert_eq!(ranges[0].delivery_dates().collect::<Vec<_>>(), vec![date(3, 2), date(3, 9)]);
//! assert_eq!(ranges[1].delivery_dates().collect::<Vec<_>>(), vec![date(3, 13)]);
//! ```
//!
//! ## Modules
//!
//! - [`calendar`] — business-day matchers and weekday exclusion
//! - [`frequency`] — weekly / monthly recurrence rules
//! - [`shifter`] — non-business-day policies (cancel, move forward)
//! - [`generator`] — lazy, restartable delivery date sequences
//! - [`version`] — tour version records and their normalization
//! - [`timeline`] — partitioning a query interval among tour versions
//! - [`repository`] — record retrieval seam and in-memory implementation
//! - [`error`] — Error types

pub mod calendar;
pub mod error;
pub mod frequency;
pub mod generator;
pub mod repository;
pub mod shifter;
pub mod timeline;
pub mod version;

pub use calendar::{AllDaysCalendar, BusinessDayMatcher, CalendarConfig, HolidayCalendar};
pub use error::TimelineError;
pub use frequency::{Frequency, WeekdaySet};
pub use generator::{DateSequenceGenerator, DeliveryDates};
pub use repository::{
    retrieve_tour_version_ranges, InMemoryTourRepository, PlanningDocument, Tour, TourRepository,
    TourVersionLine,
};
pub use shifter::{DateShifter, OnNonBusinessDay};
pub use timeline::{delivery_days, DeliveryDay, TimelineResolver, TourVersionRange};
pub use version::TourVersion;
