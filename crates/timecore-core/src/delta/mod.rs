//! Items delta engine
//!
//! Compares the server-confirmed items of a report (the baseline) with the
//! user's edited list (the working set) and produces the smallest
//! upsert/delete instruction set that turns one into the other.
//!
//! ```
//! use timecore_core::delta::compute_items_delta;
//! use timecore_core::models::{Item, WorkingItem};
//!
//! let baseline = vec![Item {
//!     id: Some(1),
//!     article_id: Some(5),
//!     description: "Cable".to_string(),
//!     amount: 2.0,
//!     unit_price: None,
//! }];
//! let mut edited = WorkingItem::from_baseline(&baseline[0]);
//! edited.amount = 3.0;
//!
//! let delta = compute_items_delta(&baseline, &[edited]);
//! assert_eq!(delta.upsert.len(), 1);
//! assert!(delta.delete.is_empty());
//! ```

use std::collections::{HashMap, HashSet};

use crate::models::{Item, ItemFields, ItemId, ItemsDelta, UpsertItem, WorkingItem};

/// Compute the items delta between `baseline` and `working`.
///
/// Working rows with neither an article nor a description are incomplete and
/// are never emitted; if such a row came from a baseline item, that item ends
/// up deleted. Ordering of the output carries no meaning.
#[must_use]
pub fn compute_items_delta(baseline: &[Item], working: &[WorkingItem]) -> ItemsDelta {
    let known: HashMap<ItemId, ItemFields> = baseline
        .iter()
        .filter_map(|item| item.id.map(|id| (id, item.fields())))
        .collect();
    let mut kept = HashSet::new();
    let mut delta = ItemsDelta::default();

    for item in working {
        let fields = item.fields();
        if !fields.is_persistable() {
            continue;
        }

        match item.origin_id.and_then(|id| known.get(&id).map(|base| (id, base))) {
            Some((id, base)) => {
                kept.insert(id);
                if *base != fields {
                    delta.upsert.push(UpsertItem::from_fields(Some(id), fields));
                }
            }
            None => delta.upsert.push(UpsertItem::from_fields(None, fields)),
        }
    }

    let mut seen = HashSet::new();
    delta.delete = baseline
        .iter()
        .filter_map(|item| item.id)
        .filter(|id| !kept.contains(id) && seen.insert(*id))
        .collect();

    tracing::debug!(
        upserts = delta.upsert.len(),
        deletes = delta.delete.len(),
        "Computed items delta"
    );
    delta
}

/// Seed a working set from a baseline, tagging each row with its origin id.
#[must_use]
pub fn working_set_from(baseline: &[Item]) -> Vec<WorkingItem> {
    baseline.iter().map(WorkingItem::from_baseline).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn item(id: ItemId, article_id: Option<i64>, amount: f64, description: &str) -> Item {
        Item {
            id: Some(id),
            article_id,
            description: description.to_string(),
            amount,
            unit_price: None,
        }
    }

    fn edit(origin: Option<ItemId>, article_id: Option<i64>, amount: f64, description: &str) -> WorkingItem {
        WorkingItem {
            origin_id: origin,
            article_id,
            description: description.to_string(),
            amount,
        }
    }

    fn sorted_ids(mut ids: Vec<ItemId>) -> Vec<ItemId> {
        ids.sort_unstable();
        ids
    }

    #[test]
    fn unchanged_item_is_a_noop() {
        let baseline = vec![item(1, Some(5), 2.0, "Cable")];
        let working = vec![edit(Some(1), Some(5), 2.0, "Cable")];

        let delta = compute_items_delta(&baseline, &working);
        assert!(delta.is_noop());
    }

    #[test]
    fn changed_amount_emits_upsert_with_id() {
        let baseline = vec![item(1, Some(5), 2.0, "Cable")];
        let working = vec![edit(Some(1), Some(5), 3.0, "Cable")];

        let delta = compute_items_delta(&baseline, &working);
        assert_eq!(
            delta,
            ItemsDelta {
                upsert: vec![UpsertItem {
                    id: Some(1),
                    article_id: Some(5),
                    amount: 3.0,
                    description: "Cable".to_string(),
                }],
                delete: vec![],
            }
        );
    }

    #[test]
    fn removed_item_is_deleted() {
        let baseline = vec![item(1, Some(5), 2.0, "Cable"), item(2, None, 1.0, "Travel")];
        let working = vec![edit(Some(1), Some(5), 2.0, "Cable")];

        let delta = compute_items_delta(&baseline, &working);
        assert!(delta.upsert.is_empty());
        assert_eq!(delta.delete, vec![2]);
    }

    #[test]
    fn new_item_has_no_id() {
        let working = vec![edit(None, None, 1.0, "Custom fee")];

        let delta = compute_items_delta(&[], &working);
        assert_eq!(
            delta.upsert,
            vec![UpsertItem {
                id: None,
                article_id: None,
                amount: 1.0,
                description: "Custom fee".to_string(),
            }]
        );
        assert!(delta.delete.is_empty());
    }

    #[test]
    fn unknown_origin_id_is_treated_as_new() {
        let baseline = vec![item(1, Some(5), 2.0, "Cable")];
        let working = vec![
            edit(Some(1), Some(5), 2.0, "Cable"),
            edit(Some(99), Some(7), 1.0, "Plug"),
        ];

        let delta = compute_items_delta(&baseline, &working);
        assert_eq!(delta.upsert.len(), 1);
        assert_eq!(delta.upsert[0].id, None);
        assert_eq!(delta.upsert[0].article_id, Some(7));
    }

    #[test]
    fn incomplete_rows_are_skipped() {
        let baseline = vec![item(1, None, 1.0, "Travel")];
        let working = vec![edit(Some(1), None, 1.0, "   "), edit(None, Some(0), 4.0, "")];

        let delta = compute_items_delta(&baseline, &working);
        assert!(delta.upsert.is_empty());
        assert_eq!(delta.delete, vec![1]);
    }

    #[test]
    fn representational_differences_are_not_edits() {
        let baseline = vec![item(1, None, 1.0, "Cable")];
        let working = vec![edit(Some(1), Some(0), 0.0, "  Cable ")];

        assert!(compute_items_delta(&baseline, &working).is_noop());
    }

    #[test]
    fn reordering_is_not_an_edit() {
        let baseline = vec![item(1, Some(5), 2.0, "Cable"), item(2, None, 1.0, "Travel")];
        let mut working = working_set_from(&baseline);
        working.reverse();

        assert!(compute_items_delta(&baseline, &working).is_noop());
    }

    #[test]
    fn every_dropped_id_is_deleted_exactly_once() {
        let baseline = vec![
            item(1, Some(5), 2.0, "Cable"),
            item(2, None, 1.0, "Travel"),
            item(3, Some(8), 4.0, "Socket"),
            item(4, None, 2.0, "Setup"),
        ];
        let working = vec![
            edit(Some(3), Some(8), 5.0, "Socket"),
            edit(None, None, 1.0, "Extra"),
        ];

        let delta = compute_items_delta(&baseline, &working);
        assert_eq!(sorted_ids(delta.delete.clone()), vec![1, 2, 4]);

        let upserted_ids: Vec<ItemId> = delta.upsert.iter().filter_map(|u| u.id).collect();
        for id in &upserted_ids {
            assert!(!delta.delete.contains(id));
        }
        assert_eq!(upserted_ids, vec![3]);
    }

    #[test]
    fn renormalizing_working_set_yields_same_delta() {
        let baseline = vec![item(1, Some(5), 2.0, "Cable"), item(2, None, 1.0, "Travel")];
        let working = vec![
            edit(Some(1), Some(5), -1.0, "  Cable  "),
            edit(None, Some(-2), f64::INFINITY, " Fee "),
            edit(Some(2), None, 0.5, "   "),
        ];

        let once: Vec<WorkingItem> = working.iter().cloned().map(WorkingItem::normalized).collect();
        let twice: Vec<WorkingItem> = once.iter().cloned().map(WorkingItem::normalized).collect();

        assert_eq!(once, twice);
        assert_eq!(
            compute_items_delta(&baseline, &working),
            compute_items_delta(&baseline, &once)
        );
        assert_eq!(
            compute_items_delta(&baseline, &once),
            compute_items_delta(&baseline, &twice)
        );
    }

    #[test]
    fn duplicate_origin_ids_each_compare_against_baseline() {
        let baseline = vec![item(1, Some(5), 2.0, "Cable")];
        let working = vec![
            edit(Some(1), Some(5), 2.0, "Cable"),
            edit(Some(1), Some(5), 6.0, "Cable"),
        ];

        let delta = compute_items_delta(&baseline, &working);
        assert!(delta.delete.is_empty());
        assert_eq!(delta.upsert.len(), 1);
        assert_eq!(delta.upsert[0].amount, 6.0);
    }
}
