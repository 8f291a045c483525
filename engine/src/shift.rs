//! Shifts and the update orchestrator.
//!
//! [`apply_update_to_shift`] is the entry point for every shift edit. It
//! routes an incoming [`ShiftUpdates`] one of three ways:
//!
//! - **single occurrence**: an occurrence id plus an occurrence-level edit.
//!   The edit accumulates in the owning series' diff maps; a start-date
//!   change rewrites the occurrence's derived identity and *detaches* it,
//!   possibly moving it to another series.
//! - **bulk, whole shift**: no occurrence id. The series-level edit applies
//!   to every series.
//! - **bulk, this and future**: an occurrence id without an occurrence-level
//!   edit. The owning series is split at that occurrence and the series-level
//!   edit applies from the split point onward.
//!
//! Series are always reached by index through `shift.series` — never through
//! back-pointers — so every mutation lands in the shift's own list.

use crate::error::{Error, Result};
use crate::occurrence::{
    decode_occurrence_id, encode_occurrence_id, OccurrencePatch, ShiftOccurrence,
    ShiftOccurrenceDiff, TimeOfDayRange,
};
use crate::position::{merge_position_set_updates, project_position_updates, PositionSetUpdate};
use crate::series::{find_owning_series, split_series_at, ShiftSeries};
use crate::{OrgId, PositionId, ShiftId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A shift: an ordered list of series under one id.
///
/// The series list ascends by start date. That ordering is maintained by
/// [`Shift::push_series`] and [`split_series_at`], never supplied by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shift {
    pub id: ShiftId,
    pub org_id: OrgId,
    pub series: Vec<ShiftSeries>,
}

impl Shift {
    pub fn new(id: impl Into<ShiftId>, org_id: impl Into<OrgId>) -> Self {
        Self {
            id: id.into(),
            org_id: org_id.into(),
            series: Vec::new(),
        }
    }

    /// Insert a series at its start-date position, after any series that
    /// starts the same day.
    pub fn push_series(&mut self, series: ShiftSeries) {
        let index = self
            .series
            .partition_point(|s| s.start_date <= series.start_date);
        self.series.insert(index, series);
    }
}

/// Scalar replacements applied to series during a bulk edit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub time: Option<TimeOfDayRange>,
}

impl SeriesPatch {
    pub fn apply_to(&self, series: &mut ShiftSeries) {
        if let Some(title) = &self.title {
            series.title = title.clone();
        }
        if let Some(description) = &self.description {
            series.description = description.clone();
        }
        if let Some(time) = self.time {
            series.time = time;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.time.is_none()
    }
}

/// The occurrence-level half of an incoming update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OccurrenceEdit {
    pub patch: OccurrencePatch,
    pub position_updates: PositionSetUpdate,
}

/// An incoming edit to a shift.
///
/// `series_patch` and `position_updates` are the series-level half, used by
/// both bulk flavors. `occurrence`, when present together with an occurrence
/// id, makes the edit a single-occurrence one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftUpdates {
    pub series_patch: SeriesPatch,
    pub position_updates: PositionSetUpdate,
    pub occurrence: Option<OccurrenceEdit>,
}

/// Apply an incoming update to a shift.
///
/// `occurrence_id` selects between the three routes (see module docs).
/// `id_seed` is a caller-supplied unique id — the engine never generates
/// randomness. It becomes the detached suffix when a single-occurrence edit
/// changes the occurrence's identity, or the cloned series' id when a
/// "this and future" edit splits a series. It is only consumed when the
/// transition actually needs a fresh id.
pub fn apply_update_to_shift(
    shift: &mut Shift,
    updates: &ShiftUpdates,
    occurrence_id: Option<&str>,
    id_seed: Option<&str>,
) -> Result<()> {
    match (occurrence_id, &updates.occurrence) {
        (Some(occurrence_id), Some(edit)) => {
            apply_occurrence_edit(shift, edit, occurrence_id, id_seed)
        }
        (Some(occurrence_id), None) => {
            apply_this_and_future(shift, updates, occurrence_id, id_seed)
        }
        (None, _) => {
            for series in &mut shift.series {
                apply_series_update(series, updates);
            }
            Ok(())
        }
    }
}

fn apply_series_update(series: &mut ShiftSeries, updates: &ShiftUpdates) {
    updates.series_patch.apply_to(series);
    series.positions = project_position_updates(&series.positions, &updates.position_updates);
}

fn apply_occurrence_edit(
    shift: &mut Shift,
    edit: &OccurrenceEdit,
    occurrence_id: &str,
    id_seed: Option<&str>,
) -> Result<()> {
    let parts = decode_occurrence_id(occurrence_id)
        .ok_or_else(|| Error::MalformedOccurrenceId(occurrence_id.to_string()))?;

    let (series_index, existing) = {
        let (index, series) =
            find_owning_series(shift, parts.date).ok_or_else(|| Error::OccurrenceUnreachable {
                shift_id: shift.id.clone(),
                date: parts.date,
            })?;
        let existing = series
            .detached_diffs
            .get(occurrence_id)
            .or_else(|| series.projected_diffs.get(occurrence_id))
            .cloned();
        (index, existing)
    };

    let mut diff =
        existing.unwrap_or_else(|| ShiftOccurrenceDiff::new(occurrence_id, shift.id.clone()));

    diff.patch.merge(&edit.patch);
    // ids already recorded as additions are exactly the ones the series
    // baseline has never seen
    let mut fresh_ids: BTreeSet<PositionId> = diff
        .position_updates
        .added_items
        .iter()
        .map(|p| p.id.clone())
        .collect();
    merge_position_set_updates(&mut diff.position_updates, &edit.position_updates, &mut fresh_ids);

    let new_id = match edit.patch.start_date {
        Some(new_date) if new_date != parts.date => {
            let suffix = parts
                .detached_id
                .as_deref()
                .or(id_seed)
                .ok_or_else(|| Error::DetachSeedRequired(occurrence_id.to_string()))?;
            encode_occurrence_id(&parts.shift_id, new_date, Some(suffix))
        }
        _ => occurrence_id.to_string(),
    };
    diff.id = new_id.clone();

    if new_id != occurrence_id {
        // identity changed: detach from the rule-derived id. Resolve the new
        // owner first so an unreachable date leaves the shift untouched.
        let new_date = diff.patch.start_date.unwrap_or(parts.date);
        let (new_index, _) =
            find_owning_series(shift, new_date).ok_or_else(|| Error::OccurrenceUnreachable {
                shift_id: shift.id.clone(),
                date: new_date,
            })?;

        let old_series = &mut shift.series[series_index];
        if !parts.is_detached() {
            old_series.mark_occurrence_deleted(occurrence_id);
            old_series.projected_diffs.remove(occurrence_id);
        }
        old_series.detached_diffs.remove(occurrence_id);

        shift.series[new_index].detached_diffs.insert(new_id, diff);
    } else if parts.is_detached() {
        shift.series[series_index].detached_diffs.insert(new_id, diff);
    } else {
        shift.series[series_index].projected_diffs.insert(new_id, diff);
    }

    Ok(())
}

fn apply_this_and_future(
    shift: &mut Shift,
    updates: &ShiftUpdates,
    occurrence_id: &str,
    id_seed: Option<&str>,
) -> Result<()> {
    let parts = decode_occurrence_id(occurrence_id)
        .ok_or_else(|| Error::MalformedOccurrenceId(occurrence_id.to_string()))?;
    let (series_index, _) =
        find_owning_series(shift, parts.date).ok_or_else(|| Error::OccurrenceUnreachable {
            shift_id: shift.id.clone(),
            date: parts.date,
        })?;

    let start = split_series_at(shift, series_index, occurrence_id, id_seed)?;
    for series in &mut shift.series[start..] {
        apply_series_update(series, updates);
    }
    Ok(())
}

/// Materialize one occurrence by id.
///
/// `Ok(None)` means the id decodes and resolves but the occurrence has been
/// removed from the rule (a deleted undetached id).
pub fn materialize_occurrence(shift: &Shift, occurrence_id: &str) -> Result<Option<ShiftOccurrence>> {
    let parts = decode_occurrence_id(occurrence_id)
        .ok_or_else(|| Error::MalformedOccurrenceId(occurrence_id.to_string()))?;
    let (_, series) =
        find_owning_series(shift, parts.date).ok_or_else(|| Error::OccurrenceUnreachable {
            shift_id: shift.id.clone(),
            date: parts.date,
        })?;

    if !parts.is_detached() && series.is_occurrence_deleted(occurrence_id) {
        return Ok(None);
    }

    let diff = series
        .detached_diffs
        .get(occurrence_id)
        .or_else(|| series.projected_diffs.get(occurrence_id));
    Ok(Some(build_occurrence(
        &shift.id,
        series,
        parts.date,
        occurrence_id,
        diff,
    )))
}

/// Materialize every occurrence of a shift inside `[from, to]`, sorted by
/// start instant.
///
/// Each series contributes its rule-generated dates only inside the span it
/// governs — the next series shadows it from its own start date — minus
/// deleted ids, with projected overrides applied. Detached occurrences are
/// spliced in from the series that owns their current date.
pub fn occurrences_in_range(shift: &Shift, from: NaiveDate, to: NaiveDate) -> Vec<ShiftOccurrence> {
    let mut occurrences = Vec::new();

    for (index, series) in shift.series.iter().enumerate() {
        let mut window_to = to;
        if let Some(next) = shift.series.get(index + 1) {
            if let Some(shadow_end) = next.start_date.pred_opt() {
                window_to = window_to.min(shadow_end);
            }
        }

        if window_to >= from {
            for date in series.occurrence_dates(from, window_to) {
                let occurrence_id = encode_occurrence_id(&shift.id, date, None);
                if series.is_occurrence_deleted(&occurrence_id) {
                    continue;
                }
                let diff = series.projected_diffs.get(&occurrence_id);
                occurrences.push(build_occurrence(&shift.id, series, date, &occurrence_id, diff));
            }
        }

        for (occurrence_id, diff) in &series.detached_diffs {
            let Some(parts) = decode_occurrence_id(occurrence_id) else {
                continue;
            };
            if parts.date < from || parts.date > to {
                continue;
            }
            occurrences.push(build_occurrence(
                &shift.id,
                series,
                parts.date,
                occurrence_id,
                Some(diff),
            ));
        }
    }

    occurrences.sort_by(|a, b| a.when.start.cmp(&b.when.start));
    occurrences
}

fn build_occurrence(
    shift_id: &str,
    series: &ShiftSeries,
    rule_date: NaiveDate,
    occurrence_id: &str,
    diff: Option<&ShiftOccurrenceDiff>,
) -> ShiftOccurrence {
    let patch = diff.map(|d| &d.patch);
    let date = patch.and_then(|p| p.start_date).unwrap_or(rule_date);
    let time = patch.and_then(|p| p.time).unwrap_or(series.time);
    let title = patch
        .and_then(|p| p.title.clone())
        .unwrap_or_else(|| series.title.clone());
    let description = patch
        .and_then(|p| p.description.clone())
        .unwrap_or_else(|| series.description.clone());
    let positions = match diff {
        Some(diff) => project_position_updates(&series.positions, &diff.position_updates),
        None => series.positions.clone(),
    };

    ShiftOccurrence {
        id: occurrence_id.to_string(),
        shift_id: shift_id.to_string(),
        title,
        description,
        positions,
        when: time.on_date(date),
        chat_id: series.chat_id.clone(),
    }
}
