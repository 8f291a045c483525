//! Shift series: a contiguous span of a shift's timeline governed by one
//! fixed recurrence definition.
//!
//! A shift's series list is ordered by ascending start date, and a later
//! series shadows an earlier one from its start date onward. That makes
//! ownership a reverse scan ([`find_owning_series`]) and turns a
//! "this and future" bulk edit into a split at the edited occurrence
//! ([`split_series_at`]) followed by edits to every series at or after the
//! split point.

use crate::error::{Error, Result};
use crate::occurrence::{decode_occurrence_id, ShiftOccurrenceDiff, TimeOfDayRange};
use crate::position::Position;
use crate::shift::Shift;
use crate::{OccurrenceId, SeriesId};
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Cadence of a recurrence rule.
///
/// An interval of zero is treated as one; the rule always advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "interval", rename_all = "camelCase")]
pub enum RecurrenceEvery {
    Days(u32),
    Weeks(u32),
}

impl RecurrenceEvery {
    fn step_days(&self) -> u64 {
        match self {
            RecurrenceEvery::Days(n) => u64::from(*n.max(&1)),
            RecurrenceEvery::Weeks(n) => 7 * u64::from(*n.max(&1)),
        }
    }
}

/// Where a recurrence stops generating occurrences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum RecurrenceEnd {
    /// Last generated date, inclusive.
    OnDate(NaiveDate),
    /// Total number of occurrences, counted from the series start.
    AfterOccurrences(u32),
}

/// A recurrence definition: cadence plus an optional end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recurrence {
    pub every: RecurrenceEvery,
    pub end: Option<RecurrenceEnd>,
}

impl Recurrence {
    pub fn daily(interval: u32) -> Self {
        Self {
            every: RecurrenceEvery::Days(interval),
            end: None,
        }
    }

    pub fn weekly(interval: u32) -> Self {
        Self {
            every: RecurrenceEvery::Weeks(interval),
            end: None,
        }
    }

    /// Builder-style end date.
    pub fn ending_on(mut self, date: NaiveDate) -> Self {
        self.end = Some(RecurrenceEnd::OnDate(date));
        self
    }
}

/// One contiguous span of a shift's timeline.
///
/// Both diff maps exist from construction (possibly empty, never absent):
/// `projected_diffs` is keyed by undetached occurrence ids, `detached_diffs`
/// by full ids including the detached suffix. `deleted_occurrence_ids` holds
/// undetached ids the recurrence rule must not materialize — either truly
/// removed, or superseded by a detached override filed elsewhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftSeries {
    pub id: SeriesId,
    pub title: String,
    pub description: String,
    pub chat_id: Option<String>,
    pub positions: Vec<Position>,
    pub start_date: NaiveDate,
    pub time: TimeOfDayRange,
    pub recurrence: Recurrence,
    pub deleted_occurrence_ids: Vec<OccurrenceId>,
    pub projected_diffs: BTreeMap<OccurrenceId, ShiftOccurrenceDiff>,
    pub detached_diffs: BTreeMap<OccurrenceId, ShiftOccurrenceDiff>,
}

impl ShiftSeries {
    /// Create a series with empty positions and diff maps.
    pub fn new(
        id: impl Into<SeriesId>,
        title: impl Into<String>,
        start_date: NaiveDate,
        time: TimeOfDayRange,
        recurrence: Recurrence,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            chat_id: None,
            positions: Vec::new(),
            start_date,
            time,
            recurrence,
            deleted_occurrence_ids: Vec::new(),
            projected_diffs: BTreeMap::new(),
            detached_diffs: BTreeMap::new(),
        }
    }

    /// Record an undetached id the rule must no longer materialize.
    pub fn mark_occurrence_deleted(&mut self, occurrence_id: &str) {
        if !self.deleted_occurrence_ids.iter().any(|d| d == occurrence_id) {
            self.deleted_occurrence_ids.push(occurrence_id.to_string());
        }
    }

    pub fn is_occurrence_deleted(&self, occurrence_id: &str) -> bool {
        self.deleted_occurrence_ids.iter().any(|d| d == occurrence_id)
    }

    /// Dates this series' rule generates inside `[from, to]`, both inclusive.
    ///
    /// An `AfterOccurrences` end counts from the series start, not from the
    /// window, so a window query never shifts the accounting.
    pub fn occurrence_dates(&self, from: NaiveDate, to: NaiveDate) -> Vec<NaiveDate> {
        let step = self.recurrence.every.step_days();
        let mut dates = Vec::new();
        let mut date = self.start_date;
        let mut generated: u32 = 0;

        while date <= to {
            match self.recurrence.end {
                Some(RecurrenceEnd::OnDate(end)) if date > end => break,
                Some(RecurrenceEnd::AfterOccurrences(count)) if generated >= count => break,
                _ => {}
            }
            if date >= from {
                dates.push(date);
            }
            generated += 1;
            date = match date.checked_add_days(Days::new(step)) {
                Some(next) => next,
                None => break,
            };
        }

        dates
    }
}

/// Locate the series owning `date` within a shift.
///
/// Scans from the highest index downward and returns the first (latest-
/// starting) series whose `start_date <= date` — a later series shadows an
/// earlier one from its start date onward. `None` means the date precedes
/// every series and the occurrence is unreachable.
pub fn find_owning_series(shift: &Shift, date: NaiveDate) -> Option<(usize, &ShiftSeries)> {
    shift
        .series
        .iter()
        .enumerate()
        .rev()
        .find(|(_, series)| series.start_date <= date)
}

/// Split a series at the date carried by `occurrence_id`, in preparation for
/// a "this and future" bulk edit.
///
/// When the split date is the series' own start, nothing needs splitting and
/// the same index comes back. Otherwise the original series is truncated to
/// end the day before the split date, a clone carrying `new_series_id` takes
/// over from the split date, and the returned index is the first series the
/// bulk edit applies to.
pub fn split_series_at(
    shift: &mut Shift,
    series_index: usize,
    occurrence_id: &str,
    new_series_id: Option<&str>,
) -> Result<usize> {
    let len = shift.series.len();
    let series = shift
        .series
        .get_mut(series_index)
        .ok_or(Error::SeriesIndexOutOfBounds {
            index: series_index,
            len,
        })?;

    let parts = decode_occurrence_id(occurrence_id)
        .ok_or_else(|| Error::MalformedOccurrenceId(occurrence_id.to_string()))?;
    let split_date = parts.date;

    if split_date == series.start_date {
        return Ok(series_index);
    }

    let new_series_id = new_series_id.ok_or_else(|| Error::SplitSeedRequired(series.id.clone()))?;

    // TODO: partition projected_diffs/detached_diffs/deleted_occurrence_ids
    // by split_date and rebase an AfterOccurrences end onto the tail instead
    // of cloning both halves wholesale.
    let mut tail = series.clone();
    tail.id = new_series_id.to_string();
    tail.start_date = split_date;

    series.recurrence.end = Some(RecurrenceEnd::OnDate(
        split_date.pred_opt().unwrap_or(split_date),
    ));

    shift.series.insert(series_index + 1, tail);
    Ok(series_index + 1)
}
