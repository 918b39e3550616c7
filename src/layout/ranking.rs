// Placement priority.
//
// Pinned ("bumped") listings first, then score descending, then id ascending so
// the order is total and repeated runs over unchanged input agree.

use std::cmp::Ordering;

use crate::model::Item;

pub fn compare_rank(a: &Item, b: &Item) -> Ordering {
    b.pinned
        .cmp(&a.pinned)
        .then_with(|| b.score.cmp(&a.score))
        .then_with(|| a.id.cmp(&b.id))
}

/// Return a new list in placement order. The input is left untouched.
pub fn rank_items(items: &[Item]) -> Vec<Item> {
    let mut ranked = items.to_vec();
    // Stable, so duplicate ids keep their input order.
    ranked.sort_by(compare_rank);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ids(items: &[Item]) -> Vec<&str> {
        items.iter().map(|i| i.id.0.as_str()).collect()
    }

    #[test]
    fn test_score_descending() {
        let items = vec![
            Item::new("item10", 80.0, 10),
            Item::new("item5", 80.0, 5),
            Item::new("item20", 80.0, 20),
        ];
        assert_eq!(ids(&rank_items(&items)), vec!["item20", "item10", "item5"]);
    }

    #[test]
    fn test_pinned_beats_score() {
        let items = vec![
            Item::new("popular", 80.0, 1000),
            Item::new("bumped", 80.0, 1).pinned(),
        ];
        assert_eq!(ids(&rank_items(&items)), vec!["bumped", "popular"]);
    }

    #[test]
    fn test_ties_broken_by_id() {
        let items = vec![
            Item::new("c", 80.0, 3),
            Item::new("a", 80.0, 3),
            Item::new("b", 80.0, 3),
        ];
        assert_eq!(ids(&rank_items(&items)), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_does_not_mutate_input() {
        let items = vec![Item::new("low", 80.0, 1), Item::new("high", 80.0, 9)];
        let _ = rank_items(&items);
        assert_eq!(ids(&items), vec!["low", "high"]);
    }

    #[test]
    fn test_empty() {
        assert!(rank_items(&[]).is_empty());
    }

    fn arb_items() -> impl Strategy<Value = Vec<Item>> {
        prop::collection::vec((0u32..40, -50i64..50, any::<bool>()), 0..40).prop_map(|raw| {
            raw.into_iter()
                .map(|(id, score, pinned)| {
                    let mut item = Item::new(&format!("item{id}"), 60.0, score);
                    item.pinned = pinned;
                    item
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_pinned_always_first(items in arb_items()) {
            let ranked = rank_items(&items);
            let first_unpinned = ranked.iter().position(|i| !i.pinned).unwrap_or(ranked.len());
            prop_assert!(ranked[first_unpinned..].iter().all(|i| !i.pinned));
        }

        #[test]
        fn prop_adjacent_pairs_ordered(items in arb_items()) {
            let ranked = rank_items(&items);
            for pair in ranked.windows(2) {
                prop_assert_ne!(compare_rank(&pair[0], &pair[1]), Ordering::Greater);
            }
        }

        #[test]
        fn prop_input_order_irrelevant(items in arb_items()) {
            let mut reversed = items.clone();
            reversed.reverse();
            let a = rank_items(&items);
            let b = rank_items(&reversed);
            // Duplicate ids may swap, so compare the keys only.
            let key = |i: &Item| (i.pinned, i.score, i.id.clone());
            prop_assert_eq!(a.iter().map(key).collect::<Vec<_>>(), b.iter().map(key).collect::<Vec<_>>());
        }
    }
}
