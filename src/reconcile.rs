//! Set reconciliation for membership-style resources.
//!
//! Several Vercel collections (project members, access-group assignments)
//! only expose add/remove/update primitives, never a bulk replace. Updating
//! such a resource means computing the minimal delta between the collection
//! as currently held and the collection as desired, then issuing one API call
//! per delta entry.
//!
//! [`reconcile`] is that computation: a pure function over two keyed
//! collections. The caller issues the API calls and then re-reads the
//! authoritative collection; the API, not the diff result, is the source of
//! truth for refreshed state.

use std::collections::HashMap;

/// An item with a stable identity key.
///
/// `None` means the identity is not yet assigned (e.g. an invitation by email
/// whose user id has not resolved); such items are always classified as
/// additions.
pub trait Keyed {
    /// The item's identity key, unique within its collection.
    fn key(&self) -> Option<&str>;
}

/// The minimal delta transforming one keyed collection into another.
///
/// A key appears in at most one of the three buckets; items that are present
/// and equal on both sides appear in none.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Reconciliation<T> {
    /// Desired items whose key is unassigned or absent from current.
    pub to_add: Vec<T>,
    /// Current items whose key is absent from desired.
    pub to_remove: Vec<T>,
    /// Desired items present in current under the same key but with
    /// differing fields.
    pub to_update: Vec<T>,
}

impl<T> Reconciliation<T> {
    /// Whether the two collections were already identical.
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty() && self.to_update.is_empty()
    }

    /// Total number of API calls the delta implies.
    pub fn len(&self) -> usize {
        self.to_add.len() + self.to_remove.len() + self.to_update.len()
    }
}

/// Compute the delta from `current` to `desired`.
///
/// Items are matched by [`Keyed::key`]; matched items compare their remaining
/// fields via `PartialEq`. Output order within each bucket is the insertion
/// order of the corresponding input (`to_add`/`to_update` follow `desired`,
/// `to_remove` follows `current`).
pub fn reconcile<T>(current: Vec<T>, desired: Vec<T>) -> Reconciliation<T>
where
    T: Keyed + PartialEq,
{
    let index: HashMap<&str, usize> = current
        .iter()
        .enumerate()
        .filter_map(|(i, item)| item.key().map(|k| (k, i)))
        .collect();

    let mut matched = vec![false; current.len()];
    let mut to_add = Vec::new();
    let mut to_update = Vec::new();

    for item in desired {
        match item.key().and_then(|k| index.get(k).copied()) {
            Some(i) => {
                matched[i] = true;
                if current[i] != item {
                    to_update.push(item);
                }
            },
            None => to_add.push(item),
        }
    }

    let to_remove = current
        .into_iter()
        .zip(matched)
        .filter_map(|(item, seen)| (!seen).then_some(item))
        .collect();

    Reconciliation {
        to_add,
        to_remove,
        to_update,
    }
}
