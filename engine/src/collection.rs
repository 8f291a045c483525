//! Generic add/remove diffs over unordered, id-keyed collections.
//!
//! An [`ArrayCollectionUpdate`] describes a change to a collection as two
//! lists: items to add (or overwrite) and items to remove. The two core
//! operations are [`project_array_updates`], which applies a diff to a base
//! collection, and [`merge_array_collection_updates`], which folds a new diff
//! into an accumulating one.
//!
//! The merge is cancellation-based, not tombstone-based: adding and then
//! removing the same identity (or the reverse) collapses to nothing, so an
//! accumulated diff stays minimal no matter how many edits fed it.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::Hash;

/// A diff over an id-keyed collection.
///
/// `A` is the added-item type, `R` the removed-item type. They usually
/// coincide, but removals may carry a lighter representation (an id-only
/// record) when the caller has nothing more at hand.
///
/// Invariant: after [`merge_array_collection_updates`], no identity appears
/// in both lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrayCollectionUpdate<A, R = A> {
    pub added_items: Vec<A>,
    pub removed_items: Vec<R>,
}

impl<A, R> ArrayCollectionUpdate<A, R> {
    /// Create an empty diff.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether the diff changes anything.
    pub fn is_empty(&self) -> bool {
        self.added_items.is_empty() && self.removed_items.is_empty()
    }
}

impl<A, R> Default for ArrayCollectionUpdate<A, R> {
    fn default() -> Self {
        Self {
            added_items: Vec::new(),
            removed_items: Vec::new(),
        }
    }
}

/// Apply a diff to a base collection, returning the projected collection.
///
/// Semantics follow an insertion-ordered map keyed by `id_of`:
/// removals delete entries, additions overwrite an existing entry in place
/// or append a brand-new one at the end. Untouched items keep their original
/// position. Applying the same diff twice yields the same result as once.
pub fn project_array_updates<A, R, K>(
    base: &[A],
    diff: &ArrayCollectionUpdate<A, R>,
    id_of: impl Fn(&A) -> K,
    removed_id_of: impl Fn(&R) -> K,
) -> Vec<A>
where
    A: Clone,
    K: Eq + Hash + Clone,
{
    let mut order: Vec<K> = Vec::with_capacity(base.len());
    let mut items: HashMap<K, A> = HashMap::with_capacity(base.len());

    for item in base {
        let key = id_of(item);
        if !items.contains_key(&key) {
            order.push(key.clone());
        }
        items.insert(key, item.clone());
    }

    for removed in &diff.removed_items {
        let key = removed_id_of(removed);
        if items.remove(&key).is_some() {
            order.retain(|k| *k != key);
        }
    }

    for added in &diff.added_items {
        let key = id_of(added);
        if !items.contains_key(&key) {
            order.push(key.clone());
        }
        items.insert(key, added.clone());
    }

    order.into_iter().filter_map(|k| items.remove(&k)).collect()
}

/// Fold `diff` into `target`, mutating `target` in place.
///
/// A removal cancels a pending addition of the same identity (and vice
/// versa) instead of being recorded alongside it; otherwise each entry is
/// appended once. Folding diffs with disjoint identities is commutative.
pub fn merge_array_collection_updates<A, R, K>(
    target: &mut ArrayCollectionUpdate<A, R>,
    diff: &ArrayCollectionUpdate<A, R>,
    id_of: impl Fn(&A) -> K,
    removed_id_of: impl Fn(&R) -> K,
) where
    A: Clone,
    R: Clone,
    K: PartialEq,
{
    for removed in &diff.removed_items {
        let key = removed_id_of(removed);
        if let Some(pos) = target.added_items.iter().position(|a| id_of(a) == key) {
            target.added_items.remove(pos);
        } else if !target.removed_items.iter().any(|r| removed_id_of(r) == key) {
            target.removed_items.push(removed.clone());
        }
    }

    for added in &diff.added_items {
        let key = id_of(added);
        if let Some(pos) = target.removed_items.iter().position(|r| removed_id_of(r) == key) {
            target.removed_items.remove(pos);
        } else if !target.added_items.iter().any(|a| id_of(a) == key) {
            target.added_items.push(added.clone());
        }
    }
}
