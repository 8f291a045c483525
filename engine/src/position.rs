//! Positions and the diff types that describe edits to them.
//!
//! A [`Position`] is one staffable slot on a shift series or help request.
//! Edits are expressed as diffs, never direct mutations of canonical state:
//! a [`PositionUpdate`] describes changes to one position, a
//! [`PositionSetUpdate`] describes changes to a whole position set, and
//! [`merge_position_set_updates`] folds freshly-produced local edits into the
//! outbound diff that eventually goes to the server.

use crate::collection::{
    merge_array_collection_updates, project_array_updates, ArrayCollectionUpdate,
};
use crate::{PositionId, UserId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// An attribute attached to a position, identified by the
/// `(category, item)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorizedItem {
    pub category_id: String,
    pub item_id: String,
}

impl CategorizedItem {
    pub fn new(category_id: impl Into<String>, item_id: impl Into<String>) -> Self {
        Self {
            category_id: category_id.into(),
            item_id: item_id.into(),
        }
    }

    /// Identity key: both segments together.
    pub fn key(&self) -> (String, String) {
        (self.category_id.clone(), self.item_id.clone())
    }
}

/// One staffable slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub id: PositionId,
    pub role: String,
    pub min_workers: u32,
    pub max_workers: u32,
    pub attributes: Vec<CategorizedItem>,
    pub joined_users: Vec<UserId>,
}

impl Position {
    pub fn new(
        id: impl Into<PositionId>,
        role: impl Into<String>,
        min_workers: u32,
        max_workers: u32,
    ) -> Self {
        Self {
            id: id.into(),
            role: role.into(),
            min_workers,
            max_workers,
            attributes: Vec::new(),
            joined_users: Vec::new(),
        }
    }
}

/// Scalar replacements for one position.
///
/// One `Option` field per replaceable scalar, so adding a replaceable field
/// is a type-checked change to this struct and its merge/apply sites.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionPatch {
    pub role: Option<String>,
    pub min_workers: Option<u32>,
    pub max_workers: Option<u32>,
}

impl PositionPatch {
    /// Overwrite each populated field of `self` from `other`.
    pub fn merge(&mut self, other: &PositionPatch) {
        if let Some(role) = &other.role {
            self.role = Some(role.clone());
        }
        if let Some(min_workers) = other.min_workers {
            self.min_workers = Some(min_workers);
        }
        if let Some(max_workers) = other.max_workers {
            self.max_workers = Some(max_workers);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.role.is_none() && self.min_workers.is_none() && self.max_workers.is_none()
    }
}

/// A diff against one position: scalar replacements plus an attribute diff.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionUpdate {
    pub patch: PositionPatch,
    pub attribute_updates: ArrayCollectionUpdate<CategorizedItem>,
}

/// A diff against a whole position set, keyed by position id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionSetUpdate {
    pub added_items: Vec<Position>,
    pub removed_items: Vec<Position>,
    pub item_updates: BTreeMap<PositionId, PositionUpdate>,
}

impl PositionSetUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.added_items.is_empty() && self.removed_items.is_empty() && self.item_updates.is_empty()
    }
}

/// Apply a position diff directly onto a position.
pub fn apply_update_to_position(position: &mut Position, update: &PositionUpdate) {
    if let Some(role) = &update.patch.role {
        position.role = role.clone();
    }
    if let Some(min_workers) = update.patch.min_workers {
        position.min_workers = min_workers;
    }
    if let Some(max_workers) = update.patch.max_workers {
        position.max_workers = max_workers;
    }
    position.attributes = project_array_updates(
        &position.attributes,
        &update.attribute_updates,
        CategorizedItem::key,
        CategorizedItem::key,
    );
}

/// Project a position-set diff onto a base position list.
///
/// Removal wins over a simultaneous update of the same id. Surviving base
/// positions keep their relative order; added positions land at the end.
pub fn project_position_updates(
    positions: &[Position],
    updates: &PositionSetUpdate,
) -> Vec<Position> {
    let removed: BTreeSet<&str> = updates
        .removed_items
        .iter()
        .map(|p| p.id.as_str())
        .collect();

    let mut projected = Vec::with_capacity(positions.len() + updates.added_items.len());
    for position in positions {
        if removed.contains(position.id.as_str()) {
            continue;
        }
        let mut position = position.clone();
        if let Some(update) = updates.item_updates.get(&position.id) {
            apply_update_to_position(&mut position, update);
        }
        projected.push(position);
    }
    projected.extend(updates.added_items.iter().cloned());
    projected
}

/// Fold a position diff into an accumulating one.
pub fn merge_position_updates(target: &mut PositionUpdate, diff: &PositionUpdate) {
    target.patch.merge(&diff.patch);
    merge_array_collection_updates(
        &mut target.attribute_updates,
        &diff.attribute_updates,
        CategorizedItem::key,
        CategorizedItem::key,
    );
}

/// Fold a freshly-produced local position-set diff into the accumulating
/// outbound diff.
///
/// `new_position_ids` is the set of position ids created locally and never
/// acknowledged by the server. Removing one of those cancels the pending
/// addition entirely — the server never hears about an entity it never saw —
/// instead of producing a tombstone.
///
/// Removals are processed before updates, and updates before additions: a
/// removal must purge any stale pending update for the same id before that
/// id could be mistaken for a fresh one.
pub fn merge_position_set_updates(
    target: &mut PositionSetUpdate,
    diff: &PositionSetUpdate,
    new_position_ids: &mut BTreeSet<PositionId>,
) {
    for removed in &diff.removed_items {
        if target.removed_items.iter().any(|p| p.id == removed.id) {
            continue;
        }
        // an edit to something about to be deleted is moot
        target.item_updates.remove(&removed.id);
        if new_position_ids.remove(&removed.id) {
            target.added_items.retain(|p| p.id != removed.id);
        } else {
            target.removed_items.push(removed.clone());
        }
    }

    for (id, update) in &diff.item_updates {
        if let Some(pending) = target.item_updates.get_mut(id) {
            merge_position_updates(pending, update);
        } else if let Some(added) = target.added_items.iter_mut().find(|p| p.id == *id) {
            // unsynced new position: fold the edit into the pending addition
            apply_update_to_position(added, update);
        } else {
            target.item_updates.insert(id.clone(), update.clone());
        }
    }

    for added in &diff.added_items {
        new_position_ids.insert(added.id.clone());
        target.added_items.push(added.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attribute(category: &str, item: &str) -> CategorizedItem {
        CategorizedItem::new(category, item)
    }

    fn removal_of(position: &Position) -> Position {
        position.clone()
    }

    #[test]
    fn apply_patch_and_attributes() {
        let mut position = Position::new("p1", "barista", 1, 2);
        position.attributes.push(attribute("cert", "food_safety"));

        let update = PositionUpdate {
            patch: PositionPatch {
                role: Some("shift lead".into()),
                max_workers: Some(3),
                ..Default::default()
            },
            attribute_updates: ArrayCollectionUpdate {
                added_items: vec![attribute("cert", "first_aid")],
                removed_items: vec![attribute("cert", "food_safety")],
            },
        };

        apply_update_to_position(&mut position, &update);

        assert_eq!(position.role, "shift lead");
        assert_eq!(position.min_workers, 1);
        assert_eq!(position.max_workers, 3);
        assert_eq!(position.attributes, vec![attribute("cert", "first_aid")]);
    }

    #[test]
    fn project_removal_wins_over_update() {
        let positions = vec![Position::new("p1", "barista", 1, 1)];
        let mut updates = PositionSetUpdate::new();
        updates.removed_items.push(positions[0].clone());
        updates.item_updates.insert(
            "p1".into(),
            PositionUpdate {
                patch: PositionPatch {
                    role: Some("ghost edit".into()),
                    ..Default::default()
                },
                ..Default::default()
            },
        );

        let projected = project_position_updates(&positions, &updates);
        assert!(projected.is_empty());
    }

    #[test]
    fn project_preserves_order_and_appends() {
        let positions = vec![
            Position::new("p1", "barista", 1, 1),
            Position::new("p2", "runner", 1, 1),
            Position::new("p3", "host", 1, 1),
        ];
        let mut updates = PositionSetUpdate::new();
        updates.removed_items.push(removal_of(&positions[1]));
        updates.item_updates.insert(
            "p3".into(),
            PositionUpdate {
                patch: PositionPatch {
                    min_workers: Some(2),
                    ..Default::default()
                },
                ..Default::default()
            },
        );
        updates.added_items.push(Position::new("p4", "cook", 1, 2));

        let projected = project_position_updates(&positions, &updates);
        let ids: Vec<&str> = projected.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p3", "p4"]);
        assert_eq!(projected[1].min_workers, 2);
    }

    #[test]
    fn merge_updates_last_field_wins() {
        let mut target = PositionUpdate {
            patch: PositionPatch {
                role: Some("barista".into()),
                min_workers: Some(1),
                ..Default::default()
            },
            ..Default::default()
        };
        let diff = PositionUpdate {
            patch: PositionPatch {
                role: Some("lead".into()),
                ..Default::default()
            },
            ..Default::default()
        };

        merge_position_updates(&mut target, &diff);
        assert_eq!(target.patch.role.as_deref(), Some("lead"));
        assert_eq!(target.patch.min_workers, Some(1));
    }

    #[test]
    fn set_merge_remove_unsynced_position_leaves_no_trace() {
        let mut target = PositionSetUpdate::new();
        let mut new_ids = BTreeSet::new();

        let added = Position::new("p_new", "barista", 1, 1);
        let mut add_diff = PositionSetUpdate::new();
        add_diff.added_items.push(added.clone());
        merge_position_set_updates(&mut target, &add_diff, &mut new_ids);
        assert!(new_ids.contains("p_new"));

        let mut remove_diff = PositionSetUpdate::new();
        remove_diff.removed_items.push(added);
        merge_position_set_updates(&mut target, &remove_diff, &mut new_ids);

        assert!(target.added_items.is_empty());
        assert!(target.removed_items.is_empty());
        assert!(target.item_updates.is_empty());
        assert!(!new_ids.contains("p_new"));
    }

    #[test]
    fn set_merge_remove_synced_position_records_removal_and_drops_update() {
        let mut target = PositionSetUpdate::new();
        let mut new_ids = BTreeSet::new();

        let mut edit = PositionSetUpdate::new();
        edit.item_updates.insert(
            "p1".into(),
            PositionUpdate {
                patch: PositionPatch {
                    role: Some("stale".into()),
                    ..Default::default()
                },
                ..Default::default()
            },
        );
        merge_position_set_updates(&mut target, &edit, &mut new_ids);

        let mut removal = PositionSetUpdate::new();
        removal.removed_items.push(Position::new("p1", "barista", 1, 1));
        merge_position_set_updates(&mut target, &removal, &mut new_ids);

        assert!(target.item_updates.is_empty());
        assert_eq!(target.removed_items.len(), 1);
        assert_eq!(target.removed_items[0].id, "p1");
    }

    #[test]
    fn set_merge_update_folds_into_pending_addition() {
        let mut target = PositionSetUpdate::new();
        let mut new_ids = BTreeSet::new();

        let mut add_diff = PositionSetUpdate::new();
        add_diff.added_items.push(Position::new("p_new", "barista", 1, 1));
        merge_position_set_updates(&mut target, &add_diff, &mut new_ids);

        let mut edit = PositionSetUpdate::new();
        edit.item_updates.insert(
            "p_new".into(),
            PositionUpdate {
                patch: PositionPatch {
                    role: Some("lead".into()),
                    ..Default::default()
                },
                ..Default::default()
            },
        );
        merge_position_set_updates(&mut target, &edit, &mut new_ids);

        // the edit landed on the pending addition, not as a separate update
        assert!(target.item_updates.is_empty());
        assert_eq!(target.added_items[0].role, "lead");
    }

    #[test]
    fn set_merge_updates_accumulate() {
        let mut target = PositionSetUpdate::new();
        let mut new_ids = BTreeSet::new();

        let mut first = PositionSetUpdate::new();
        first.item_updates.insert(
            "p1".into(),
            PositionUpdate {
                patch: PositionPatch {
                    role: Some("lead".into()),
                    ..Default::default()
                },
                ..Default::default()
            },
        );
        merge_position_set_updates(&mut target, &first, &mut new_ids);

        let mut second = PositionSetUpdate::new();
        second.item_updates.insert(
            "p1".into(),
            PositionUpdate {
                patch: PositionPatch {
                    min_workers: Some(2),
                    ..Default::default()
                },
                ..Default::default()
            },
        );
        merge_position_set_updates(&mut target, &second, &mut new_ids);

        let pending = target.item_updates.get("p1").unwrap();
        assert_eq!(pending.patch.role.as_deref(), Some("lead"));
        assert_eq!(pending.patch.min_workers, Some(2));
    }

    #[test]
    fn serialization_roundtrip() {
        let mut update = PositionSetUpdate::new();
        update.added_items.push(Position::new("p1", "barista", 1, 2));
        update.item_updates.insert(
            "p2".into(),
            PositionUpdate {
                patch: PositionPatch {
                    max_workers: Some(4),
                    ..Default::default()
                },
                ..Default::default()
            },
        );

        let json = serde_json::to_string(&update).unwrap();
        assert!(json.contains("itemUpdates"));
        assert!(json.contains("minWorkers"));

        let parsed: PositionSetUpdate = serde_json::from_str(&json).unwrap();
        assert_eq!(update, parsed);
    }
}
