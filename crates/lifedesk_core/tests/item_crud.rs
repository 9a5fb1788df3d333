use lifedesk_core::db::open_db_in_memory;
use lifedesk_core::{
    CategoryRepository, ItemRepoError, ItemRepository, NoteDraft, NoteListQuery,
    SqliteCategoryRepository, SqliteItemRepository, TaskDraft, TaskListQuery,
};
use lifedesk_core::CategoryDraft;
use rusqlite::Connection;

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

fn add_category(conn: &Connection, name: &str) -> i64 {
    SqliteCategoryRepository::try_new(conn)
        .unwrap()
        .insert(&CategoryDraft {
            name: name.to_string(),
            description: None,
            parent_id: None,
        })
        .unwrap()
        .id
}

#[test]
fn create_task_assigns_id_and_round_trips_fields() {
    let conn = setup();
    let repo = SqliteItemRepository::new(&conn);
    let errands = add_category(&conn, "Errands");

    let task = repo
        .create_task(&TaskDraft {
            category_id: Some(errands),
            content: "renew passport".to_string(),
            due_date: Some("2026-09-01".to_string()),
        })
        .unwrap();

    assert!(task.id > 0);
    assert_eq!(task.category_id, Some(errands));
    assert_eq!(task.content, "renew passport");
    assert_eq!(task.due_date.as_deref(), Some("2026-09-01"));
    assert!(!task.completed);
}

#[test]
fn list_tasks_filters_by_category_and_completion() {
    let conn = setup();
    let repo = SqliteItemRepository::new(&conn);
    let work = add_category(&conn, "Work");
    let home = add_category(&conn, "Home");

    let at_work = repo
        .create_task(&TaskDraft {
            category_id: Some(work),
            content: "standup".to_string(),
            due_date: None,
        })
        .unwrap();
    let at_home = repo
        .create_task(&TaskDraft {
            category_id: Some(home),
            content: "laundry".to_string(),
            due_date: None,
        })
        .unwrap();
    repo.set_task_completed(at_home.id, true).unwrap();

    let work_only = repo
        .list_tasks(&TaskListQuery {
            category_id: Some(work),
            completed: None,
        })
        .unwrap();
    assert_eq!(work_only.len(), 1);
    assert_eq!(work_only[0].id, at_work.id);

    let completed_only = repo
        .list_tasks(&TaskListQuery {
            category_id: None,
            completed: Some(true),
        })
        .unwrap();
    assert_eq!(completed_only.len(), 1);
    assert_eq!(completed_only[0].id, at_home.id);
    assert!(completed_only[0].completed);
}

#[test]
fn set_task_completed_on_unknown_id_fails() {
    let conn = setup();
    let repo = SqliteItemRepository::new(&conn);

    let err = repo.set_task_completed(77, true).unwrap_err();
    assert!(matches!(err, ItemRepoError::TaskNotFound(77)));
}

#[test]
fn reassign_by_ids_touches_exactly_the_given_rows() {
    let conn = setup();
    let repo = SqliteItemRepository::new(&conn);
    let source = add_category(&conn, "Source");
    let target = add_category(&conn, "Target");

    let moved_a = repo
        .create_task(&TaskDraft {
            category_id: Some(source),
            content: "a".to_string(),
            due_date: None,
        })
        .unwrap();
    let stays = repo
        .create_task(&TaskDraft {
            category_id: Some(source),
            content: "b".to_string(),
            due_date: None,
        })
        .unwrap();

    let changed = repo
        .reassign_tasks_category(&[moved_a.id], Some(target))
        .unwrap();
    assert_eq!(changed, 1);

    assert_eq!(repo.find_tasks_by_category(target).unwrap()[0].id, moved_a.id);
    assert_eq!(repo.find_tasks_by_category(source).unwrap()[0].id, stays.id);

    // Reassigning to `None` files the row as uncategorized.
    let cleared = repo.reassign_tasks_category(&[stays.id], None).unwrap();
    assert_eq!(cleared, 1);
    assert!(repo.find_tasks_by_category(source).unwrap().is_empty());
}

#[test]
fn delete_by_ids_removes_only_the_given_rows() {
    let conn = setup();
    let repo = SqliteItemRepository::new(&conn);
    let journal = add_category(&conn, "Journal");

    let doomed = repo
        .create_note(&NoteDraft {
            category_id: Some(journal),
            content: "scratch".to_string(),
        })
        .unwrap();
    let kept = repo
        .create_note(&NoteDraft {
            category_id: Some(journal),
            content: "keeper".to_string(),
        })
        .unwrap();

    let removed = repo.delete_notes(&[doomed.id]).unwrap();
    assert_eq!(removed, 1);

    let remaining = repo.list_notes(&NoteListQuery::default()).unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, kept.id);
}

#[test]
fn empty_id_batches_are_no_ops() {
    let conn = setup();
    let repo = SqliteItemRepository::new(&conn);

    assert_eq!(repo.reassign_tasks_category(&[], None).unwrap(), 0);
    assert_eq!(repo.delete_tasks(&[]).unwrap(), 0);
    assert_eq!(repo.delete_notes(&[]).unwrap(), 0);
}
