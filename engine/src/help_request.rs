//! Help requests: one-off staffing asks outside any recurrence rule.

use crate::occurrence::TimeOfDayRange;
use crate::position::{merge_position_set_updates, project_position_updates, PositionSetUpdate};
use crate::{OrgId, PositionId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A single dated request for extra hands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HelpRequest {
    pub id: String,
    pub org_id: OrgId,
    pub title: String,
    pub description: String,
    pub date: NaiveDate,
    pub time: TimeOfDayRange,
    pub positions: Vec<crate::position::Position>,
}

/// Scalar replacements for a help request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HelpRequestPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<TimeOfDayRange>,
}

impl HelpRequestPatch {
    pub fn merge(&mut self, other: &HelpRequestPatch) {
        if let Some(title) = &other.title {
            self.title = Some(title.clone());
        }
        if let Some(description) = &other.description {
            self.description = Some(description.clone());
        }
        if let Some(date) = other.date {
            self.date = Some(date);
        }
        if let Some(time) = other.time {
            self.time = Some(time);
        }
    }
}

/// The accumulated outbound edit for one help request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HelpRequestUpdates {
    pub patch: HelpRequestPatch,
    pub position_updates: PositionSetUpdate,
}

/// Apply an accumulated edit onto a help request.
pub fn apply_update_to_help_request(request: &mut HelpRequest, updates: &HelpRequestUpdates) {
    if let Some(title) = &updates.patch.title {
        request.title = title.clone();
    }
    if let Some(description) = &updates.patch.description {
        request.description = description.clone();
    }
    if let Some(date) = updates.patch.date {
        request.date = date;
    }
    if let Some(time) = updates.patch.time {
        request.time = time;
    }
    request.positions = project_position_updates(&request.positions, &updates.position_updates);
}

/// Fold a fresh local edit into the accumulating outbound edit.
pub fn merge_help_request_updates(
    target: &mut HelpRequestUpdates,
    diff: &HelpRequestUpdates,
    new_position_ids: &mut BTreeSet<PositionId>,
) {
    target.patch.merge(&diff.patch);
    merge_position_set_updates(&mut target.position_updates, &diff.position_updates, new_position_ids);
}
