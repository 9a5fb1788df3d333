use lifedesk_core::{Category, CategoryForest};
use std::collections::BTreeSet;

fn category(id: i64, parent_id: Option<i64>, sort_order: i64) -> Category {
    Category {
        id,
        name: format!("cat-{id}"),
        description: None,
        parent_id,
        sort_order,
        created_at: 0,
        updated_at: 0,
    }
}

#[test]
fn build_then_flatten_round_trips_the_flat_list() {
    let flat = vec![
        category(1, None, 0),
        category(2, Some(1), 0),
        category(3, Some(1), 1),
        category(4, Some(3), 0),
        category(5, None, 1),
    ];

    let forest = CategoryForest::build(&flat);
    assert!(forest.orphaned_ids().is_empty());

    let mut expected: Vec<_> = flat.iter().map(|c| (c.id, c.parent_id)).collect();
    expected.sort();
    let mut flattened = forest.flatten();
    flattened.sort();
    assert_eq!(flattened, expected);
}

#[test]
fn children_are_ordered_by_sort_order_then_id() {
    // Two children share sort_order 1; the lower id wins the tie.
    let flat = vec![
        category(1, None, 0),
        category(5, Some(1), 1),
        category(3, Some(1), 1),
        category(4, Some(1), 0),
    ];

    let forest = CategoryForest::build(&flat);
    let roots = forest.roots();
    assert_eq!(roots.len(), 1);
    let child_ids: Vec<_> = roots[0].children.iter().map(|n| n.category.id).collect();
    assert_eq!(child_ids, vec![4, 3, 5]);
}

#[test]
fn is_descendant_is_reflexive_for_every_category() {
    let flat = vec![category(1, None, 0), category(2, Some(1), 0)];
    let forest = CategoryForest::build(&flat);

    for id in forest.category_ids() {
        assert!(forest.is_descendant(id, id));
    }
}

#[test]
fn is_descendant_tracks_ancestry_but_not_siblings() {
    let flat = vec![
        category(1, None, 0),
        category(2, Some(1), 0),
        category(3, Some(1), 1),
        category(4, Some(2), 0),
    ];
    let forest = CategoryForest::build(&flat);

    assert!(forest.is_descendant(4, 1));
    assert!(forest.is_descendant(4, 2));
    assert!(forest.is_descendant(2, 1));
    assert!(!forest.is_descendant(2, 3));
    assert!(!forest.is_descendant(3, 2));
    assert!(!forest.is_descendant(1, 2));
}

#[test]
fn descendant_ids_is_inclusive() {
    let flat = vec![
        category(1, None, 0),
        category(2, Some(1), 0),
        category(3, Some(2), 0),
        category(4, None, 1),
    ];
    let forest = CategoryForest::build(&flat);

    assert_eq!(forest.descendant_ids(1), BTreeSet::from([1, 2, 3]));
    assert_eq!(forest.descendant_ids(2), BTreeSet::from([2, 3]));
    assert_eq!(forest.descendant_ids(4), BTreeSet::from([4]));
}

#[test]
fn walk_is_depth_first_and_restartable() {
    let flat = vec![
        category(1, None, 0),
        category(2, Some(1), 0),
        category(3, Some(1), 1),
        category(4, Some(2), 0),
        category(5, None, 1),
    ];
    let forest = CategoryForest::build(&flat);

    let first_pass: Vec<_> = forest.walk().map(|node| node.category.id).collect();
    assert_eq!(first_pass, vec![1, 2, 4, 3, 5]);

    // A second walk starts over from the roots.
    let second_pass: Vec<_> = forest.walk().map(|node| node.category.id).collect();
    assert_eq!(first_pass, second_pass);
}

#[test]
fn dangling_parent_links_surface_as_orphans() {
    let flat = vec![
        category(1, None, 0),
        category(2, Some(99), 0),
        category(3, Some(2), 0),
    ];
    let forest = CategoryForest::build(&flat);

    let roots: Vec<_> = forest.roots().iter().map(|n| n.category.id).collect();
    assert_eq!(roots, vec![1]);

    let orphaned: BTreeSet<_> = forest.orphaned_ids().iter().copied().collect();
    assert_eq!(orphaned, BTreeSet::from([2, 3]));
}

#[test]
fn corrupt_parent_cycle_does_not_hang_the_builder() {
    // 2 and 3 point at each other; such data can only come from a bug or a
    // hand-edited database, and must not loop tree assembly or queries.
    let flat = vec![
        category(1, None, 0),
        category(2, Some(3), 0),
        category(3, Some(2), 0),
    ];
    let forest = CategoryForest::build(&flat);

    let roots: Vec<_> = forest.roots().iter().map(|n| n.category.id).collect();
    assert_eq!(roots, vec![1]);

    let orphaned: BTreeSet<_> = forest.orphaned_ids().iter().copied().collect();
    assert_eq!(orphaned, BTreeSet::from([2, 3]));

    // The parent-chain walk terminates instead of spinning on the cycle.
    assert!(!forest.is_descendant(2, 1));
    assert!(forest.is_descendant(2, 2));
}
