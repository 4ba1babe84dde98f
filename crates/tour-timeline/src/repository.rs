//! Retrieval of tours, tour versions and tour version lines.
//!
//! The timeline engine itself never touches storage. [`TourRepository`] is the
//! seam through which hosts supply records; its errors pass through
//! [`retrieve_tour_version_ranges`] unchanged. [`InMemoryTourRepository`] is a
//! complete implementation backed by plain collections, loadable from a JSON
//! [`PlanningDocument`].

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::calendar::CalendarConfig;
use crate::error::{Result, TimelineError};
use crate::timeline::{TimelineResolver, TourVersionRange};
use crate::version::{ClientId, TourId, TourVersion, TourVersionId};

fn default_active() -> bool {
    true
}

/// A delivery tour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tour {
    pub id: TourId,
    #[serde(default)]
    pub client_id: ClientId,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

impl Tour {
    pub fn new(id: TourId, name: impl Into<String>) -> Self {
        Self {
            id,
            client_id: 0,
            name: name.into(),
            active: true,
        }
    }
}

/// A stop of a tour version: which business partner location is served, in which order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TourVersionLine {
    pub id: u32,
    pub tour_version_id: TourVersionId,
    #[serde(default)]
    pub client_id: ClientId,
    #[serde(default)]
    pub seq_no: i32,
    pub bpartner_id: u32,
    pub bpartner_location_id: u32,
    #[serde(default = "default_active")]
    pub active: bool,
}

/// Source of tour records.
pub trait TourRepository {
    type Error: From<TimelineError>;

    /// Active tours of `client_id`, ordered by id.
    fn retrieve_all_tours(&self, client_id: ClientId) -> std::result::Result<Vec<Tour>, Self::Error>;

    /// Active versions of `tour` in the tour's client, ordered by `valid_from`
    /// ascending. `valid_from` / `valid_to` bound the versions' start dates,
    /// both inclusive.
    fn retrieve_tour_versions(
        &self,
        tour: &Tour,
        valid_from: Option<NaiveDate>,
        valid_to: Option<NaiveDate>,
    ) -> std::result::Result<Vec<TourVersion>, Self::Error>;

    /// Active lines of `version`, ordered by `seq_no` ascending.
    fn retrieve_tour_version_lines(
        &self,
        version: &TourVersion,
    ) -> std::result::Result<Vec<TourVersionLine>, Self::Error>;
}

/// Resolve the version ranges of `tour` over `[date_from, date_to]`.
///
/// Versions are fetched without a lower bound so that the version already
/// effective at `date_from` takes part.
///
/// # Errors
/// Propagates the repository's errors, and `TimelineError::InvalidArgument`
/// (converted into `R::Error`) if `date_from > date_to`.
pub fn retrieve_tour_version_ranges<R: TourRepository>(
    repository: &R,
    resolver: &TimelineResolver,
    tour: &Tour,
    date_from: NaiveDate,
    date_to: NaiveDate,
) -> std::result::Result<Vec<TourVersionRange>, R::Error> {
    if date_from > date_to {
        return Err(TimelineError::invalid(format!(
            "date_from ({}) must not be after date_to ({})",
            date_from, date_to
        ))
        .into());
    }

    let versions = repository.retrieve_tour_versions(tour, None, Some(date_to))?;
    if versions.is_empty() {
        return Ok(Vec::new());
    }

    Ok(resolver.resolve(&versions, date_from, date_to)?)
}

/// Memoization key for line lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct LineCacheKey {
    client_id: ClientId,
    tour_version_id: TourVersionId,
}

/// [`TourRepository`] over in-memory collections.
#[derive(Debug, Default)]
pub struct InMemoryTourRepository {
    tours: BTreeMap<TourId, Tour>,
    versions: Vec<TourVersion>,
    lines: Vec<TourVersionLine>,
    line_cache: DashMap<LineCacheKey, Arc<[TourVersionLine]>>,
}

impl InMemoryTourRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_tour(&mut self, tour: Tour) {
        self.tours.insert(tour.id, tour);
    }

    pub fn insert_version(&mut self, version: TourVersion) {
        self.versions.push(version);
    }

    pub fn insert_line(&mut self, line: TourVersionLine) {
        self.line_cache.retain(|key, _| key.tour_version_id != line.tour_version_id);
        self.lines.push(line);
    }

    /// # Errors
    /// Returns `TimelineError::InvalidArgument` if no such tour exists.
    pub fn tour(&self, id: TourId) -> Result<&Tour> {
        self.tours
            .get(&id)
            .ok_or_else(|| TimelineError::invalid(format!("unknown tour {}", id)))
    }

    /// # Errors
    /// Returns `TimelineError::InvalidArgument` if no such tour version exists.
    pub fn tour_version(&self, id: TourVersionId) -> Result<&TourVersion> {
        self.versions
            .iter()
            .find(|v| v.id == id)
            .ok_or_else(|| TimelineError::invalid(format!("unknown tour version {}", id)))
    }

    /// Number of memoized line lists.
    pub fn cached_line_lists(&self) -> usize {
        self.line_cache.len()
    }

    fn load_lines(&self, key: LineCacheKey) -> Arc<[TourVersionLine]> {
        let mut lines: Vec<TourVersionLine> = self
            .lines
            .iter()
            .filter(|l| {
                l.active && l.tour_version_id == key.tour_version_id && l.client_id == key.client_id
            })
            .cloned()
            .collect();
        lines.sort_by_key(|l| l.seq_no);
        lines.into()
    }
}

impl TourRepository for InMemoryTourRepository {
    type Error = TimelineError;

    fn retrieve_all_tours(&self, client_id: ClientId) -> Result<Vec<Tour>> {
        Ok(self
            .tours
            .values()
            .filter(|t| t.active && t.client_id == client_id)
            .cloned()
            .collect())
    }

    fn retrieve_tour_versions(
        &self,
        tour: &Tour,
        valid_from: Option<NaiveDate>,
        valid_to: Option<NaiveDate>,
    ) -> Result<Vec<TourVersion>> {
        self.tour(tour.id)?;

        let mut versions: Vec<TourVersion> = self
            .versions
            .iter()
            .filter(|v| v.active && v.tour_id == tour.id && v.client_id == tour.client_id)
            .filter(|v| valid_from.is_none_or(|from| v.valid_from >= from))
            .filter(|v| valid_to.is_none_or(|to| v.valid_from <= to))
            .cloned()
            .collect();
        versions.sort_by_key(|v| v.valid_from);
        Ok(versions)
    }

    fn retrieve_tour_version_lines(&self, version: &TourVersion) -> Result<Vec<TourVersionLine>> {
        self.tour_version(version.id)?;

        let key = LineCacheKey {
            client_id: version.client_id,
            tour_version_id: version.id,
        };
        if let Some(cached) = self.line_cache.get(&key) {
            trace!(tour_version_id = version.id, "tour version lines cache hit");
            return Ok(cached.to_vec());
        }

        let lines = self.load_lines(key);
        self.line_cache.insert(key, Arc::clone(&lines));
        Ok(lines.to_vec())
    }
}

/// A serialized planning setup: calendar plus tour records.
///
/// ```json
/// {
///   "calendar": { "weekend": ["Sat", "Sun"], "holidays": ["2026-12-25"] },
///   "tours": [{ "id": 1, "name": "North" }],
///   "versions": [{ "id": 10, "tour_id": 1, "valid_from": "2026-01-01", "is_weekly": true, "on_monday": true }],
///   "lines": [{ "id": 100, "tour_version_id": 10, "seq_no": 10, "bpartner_id": 5, "bpartner_location_id": 50 }]
/// }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanningDocument {
    #[serde(default)]
    pub calendar: CalendarConfig,
    #[serde(default)]
    pub tours: Vec<Tour>,
    #[serde(default)]
    pub versions: Vec<TourVersion>,
    #[serde(default)]
    pub lines: Vec<TourVersionLine>,
}

impl PlanningDocument {
    /// # Errors
    /// Returns `TimelineError::JsonParse` if `json` is not a valid document.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Split into the calendar configuration and a populated repository.
    pub fn into_parts(self) -> (CalendarConfig, InMemoryTourRepository) {
        let mut repository = InMemoryTourRepository::new();
        for tour in self.tours {
            repository.insert_tour(tour);
        }
        for version in self.versions {
            repository.insert_version(version);
        }
        for line in self.lines {
            repository.insert_line(line);
        }
        (self.calendar, repository)
    }
}
