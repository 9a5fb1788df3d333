use lifedesk_core::db::open_db_in_memory;
use lifedesk_core::{
    CategoryPatch, CategoryService, CategoryServiceError, CategoryValidationError,
    SqliteCategoryRepository, SqliteItemRepository,
};
use rusqlite::Connection;

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

fn service(
    conn: &Connection,
) -> CategoryService<SqliteCategoryRepository<'_>, SqliteItemRepository<'_>> {
    CategoryService::new(
        SqliteCategoryRepository::try_new(conn).unwrap(),
        SqliteItemRepository::new(conn),
    )
}

#[test]
fn create_trims_name_and_defaults_to_root() {
    let conn = setup();
    let service = service(&conn);

    let created = service.create("  Work  ", None, None).unwrap();
    assert_eq!(created.name, "Work");
    assert_eq!(created.parent_id, None);
    assert_eq!(created.sort_order, 0);
}

#[test]
fn create_rejects_blank_name() {
    let conn = setup();
    let service = service(&conn);

    let err = service.create("   ", None, None).unwrap_err();
    assert!(matches!(
        err,
        CategoryServiceError::Validation(CategoryValidationError::BlankName)
    ));
    assert!(service.tree().unwrap().is_empty());
}

#[test]
fn create_rejects_unknown_parent() {
    let conn = setup();
    let service = service(&conn);

    let err = service.create("Child", None, Some(404)).unwrap_err();
    assert!(matches!(err, CategoryServiceError::NotFound(404)));
}

#[test]
fn create_maps_blank_description_to_none() {
    let conn = setup();
    let service = service(&conn);

    let created = service
        .create("Wedding", Some("   ".to_string()), None)
        .unwrap();
    assert_eq!(created.description, None);
}

#[test]
fn update_renames_and_rejects_blank_name() {
    let conn = setup();
    let service = service(&conn);

    let created = service.create("Grocerys", None, None).unwrap();
    let renamed = service
        .update(
            created.id,
            CategoryPatch {
                name: Some("Groceries".to_string()),
                description: None,
            },
        )
        .unwrap();
    assert_eq!(renamed.name, "Groceries");

    let err = service
        .update(
            created.id,
            CategoryPatch {
                name: Some("".to_string()),
                description: None,
            },
        )
        .unwrap_err();
    assert!(matches!(err, CategoryServiceError::Validation(_)));
}

#[test]
fn update_unknown_id_fails_with_not_found() {
    let conn = setup();
    let service = service(&conn);

    let err = service
        .update(
            9,
            CategoryPatch {
                name: Some("Ghost".to_string()),
                description: None,
            },
        )
        .unwrap_err();
    assert!(matches!(err, CategoryServiceError::NotFound(9)));
}

#[test]
fn move_changes_only_parent_and_appends_to_new_siblings() {
    let conn = setup();
    let service = service(&conn);

    let work = service.create("Work", None, None).unwrap();
    let home = service.create("Home", None, None).unwrap();
    let _chores = service.create("Chores", None, Some(home.id)).unwrap();
    let errands = service.create("Errands", None, Some(work.id)).unwrap();

    let moved = service.move_category(errands.id, Some(home.id)).unwrap();
    assert_eq!(moved.parent_id, Some(home.id));
    // Last among the new siblings: Chores holds 0.
    assert_eq!(moved.sort_order, 1);
    assert_eq!(moved.name, "Errands");

    let tree = service.tree().unwrap();
    let home_node = tree
        .iter()
        .find(|node| node.category.id == home.id)
        .unwrap();
    let child_names: Vec<_> = home_node
        .children
        .iter()
        .map(|node| node.category.name.clone())
        .collect();
    assert_eq!(child_names, vec!["Chores", "Errands"]);
}

#[test]
fn move_to_root_is_allowed() {
    let conn = setup();
    let service = service(&conn);

    let work = service.create("Work", None, None).unwrap();
    let child = service.create("Child", None, Some(work.id)).unwrap();

    let moved = service.move_category(child.id, None).unwrap();
    assert_eq!(moved.parent_id, None);
    assert_eq!(service.tree().unwrap().len(), 2);
}

#[test]
fn move_rejects_unknown_ids() {
    let conn = setup();
    let service = service(&conn);

    let work = service.create("Work", None, None).unwrap();

    let err = service.move_category(500, Some(work.id)).unwrap_err();
    assert!(matches!(err, CategoryServiceError::NotFound(500)));

    let err = service.move_category(work.id, Some(501)).unwrap_err();
    assert!(matches!(err, CategoryServiceError::NotFound(501)));
}

#[test]
fn move_onto_itself_fails_with_cycle_error() {
    let conn = setup();
    let service = service(&conn);

    let work = service.create("Work", None, None).unwrap();
    let err = service.move_category(work.id, Some(work.id)).unwrap_err();
    assert!(matches!(err, CategoryServiceError::Cycle { .. }));
}

#[test]
fn move_into_own_subtree_fails_and_leaves_tree_unchanged() {
    let conn = setup();
    let service = service(&conn);

    let top = service.create("Top", None, None).unwrap();
    let mid = service.create("Mid", None, Some(top.id)).unwrap();
    let deep = service.create("Deep", None, Some(mid.id)).unwrap();

    let before = service.tree().unwrap();
    let err = service.move_category(top.id, Some(deep.id)).unwrap_err();
    assert!(matches!(
        err,
        CategoryServiceError::Cycle { id, new_parent_id }
            if id == top.id && new_parent_id == deep.id
    ));
    assert_eq!(service.tree().unwrap(), before);
}
