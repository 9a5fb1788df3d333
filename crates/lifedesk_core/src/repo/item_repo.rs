//! Task/note repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide persistence APIs for the records filed under categories.
//! - Supply the grouped direct counts the aggregator builds on.
//! - Share low-level reassign/delete helpers with the category store's
//!   deletion transaction.
//!
//! # Invariants
//! - Listing order is deterministic: `id ASC`.
//! - Grouped counts cover categorized rows only; `category_id IS NULL` rows
//!   are never attributed to any category.
//! - Batch reassign/delete touch exactly the ids they are given.

use crate::counts::CountMap;
use crate::db::DbError;
use crate::model::category::CategoryId;
use crate::model::item::{Note, NoteDraft, NoteId, Task, TaskDraft, TaskId};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const TASK_SELECT_SQL: &str =
    "SELECT id, category_id, content, due_date, completed, created_at, updated_at FROM tasks";
const NOTE_SELECT_SQL: &str = "SELECT id, category_id, content, created_at, updated_at FROM notes";

pub type ItemRepoResult<T> = Result<T, ItemRepoError>;

/// Errors from task/note persistence operations.
#[derive(Debug)]
pub enum ItemRepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Target task does not exist.
    TaskNotFound(TaskId),
    /// Target note does not exist.
    NoteNotFound(NoteId),
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
}

impl Display for ItemRepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::TaskNotFound(id) => write!(f, "task not found: {id}"),
            Self::NoteNotFound(id) => write!(f, "note not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted item data: {message}"),
        }
    }
}

impl Error for ItemRepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for ItemRepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for ItemRepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Caller-supplied filter for direct task counts.
///
/// Whether completed tasks count is a view decision, not an aggregator rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskCountFilter {
    pub include_completed: bool,
}

/// Query options for task listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskListQuery {
    /// Exact-category filter; `None` lists every task.
    pub category_id: Option<CategoryId>,
    /// Completion filter; `None` lists both.
    pub completed: Option<bool>,
}

/// Query options for note listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteListQuery {
    /// Exact-category filter; `None` lists every note.
    pub category_id: Option<CategoryId>,
}

/// Repository interface for the records filed under categories.
pub trait ItemRepository {
    /// Inserts one task, assigning its id.
    fn create_task(&self, draft: &TaskDraft) -> ItemRepoResult<Task>;
    /// Inserts one note, assigning its id.
    fn create_note(&self, draft: &NoteDraft) -> ItemRepoResult<Note>;
    /// Lists tasks matching the query.
    fn list_tasks(&self, query: &TaskListQuery) -> ItemRepoResult<Vec<Task>>;
    /// Lists notes matching the query.
    fn list_notes(&self, query: &NoteListQuery) -> ItemRepoResult<Vec<Note>>;
    /// Tasks whose `category_id` equals the id exactly.
    fn find_tasks_by_category(&self, category_id: CategoryId) -> ItemRepoResult<Vec<Task>>;
    /// Notes whose `category_id` equals the id exactly.
    fn find_notes_by_category(&self, category_id: CategoryId) -> ItemRepoResult<Vec<Note>>;
    /// Flips one task's completion state.
    fn set_task_completed(&self, id: TaskId, completed: bool) -> ItemRepoResult<()>;
    /// Direct task counts grouped by category.
    fn count_tasks_by_category(&self, filter: &TaskCountFilter) -> ItemRepoResult<CountMap>;
    /// Direct note counts grouped by category.
    fn count_notes_by_category(&self) -> ItemRepoResult<CountMap>;
    /// Moves the given tasks to another category (or uncategorized).
    fn reassign_tasks_category(
        &self,
        ids: &[TaskId],
        new_category_id: Option<CategoryId>,
    ) -> ItemRepoResult<usize>;
    /// Moves the given notes to another category (or uncategorized).
    fn reassign_notes_category(
        &self,
        ids: &[NoteId],
        new_category_id: Option<CategoryId>,
    ) -> ItemRepoResult<usize>;
    /// Removes the given tasks.
    fn delete_tasks(&self, ids: &[TaskId]) -> ItemRepoResult<usize>;
    /// Removes the given notes.
    fn delete_notes(&self, ids: &[NoteId]) -> ItemRepoResult<usize>;
}

/// SQLite-backed item repository.
pub struct SqliteItemRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteItemRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl ItemRepository for SqliteItemRepository<'_> {
    fn create_task(&self, draft: &TaskDraft) -> ItemRepoResult<Task> {
        self.conn.execute(
            "INSERT INTO tasks (category_id, content, due_date) VALUES (?1, ?2, ?3);",
            params![draft.category_id, draft.content.as_str(), draft.due_date.as_deref()],
        )?;
        load_task(self.conn, self.conn.last_insert_rowid())
    }

    fn create_note(&self, draft: &NoteDraft) -> ItemRepoResult<Note> {
        self.conn.execute(
            "INSERT INTO notes (category_id, content) VALUES (?1, ?2);",
            params![draft.category_id, draft.content.as_str()],
        )?;
        load_note(self.conn, self.conn.last_insert_rowid())
    }

    fn list_tasks(&self, query: &TaskListQuery) -> ItemRepoResult<Vec<Task>> {
        let mut sql = format!("{TASK_SELECT_SQL} WHERE 1 = 1");
        let mut bind: Vec<Value> = Vec::new();

        if let Some(category_id) = query.category_id {
            sql.push_str(" AND category_id = ?");
            bind.push(Value::Integer(category_id));
        }
        if let Some(completed) = query.completed {
            sql.push_str(" AND completed = ?");
            bind.push(Value::Integer(i64::from(completed)));
        }
        sql.push_str(" ORDER BY id ASC;");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind))?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_task_row(row)?);
        }
        Ok(items)
    }

    fn list_notes(&self, query: &NoteListQuery) -> ItemRepoResult<Vec<Note>> {
        let mut sql = format!("{NOTE_SELECT_SQL} WHERE 1 = 1");
        let mut bind: Vec<Value> = Vec::new();

        if let Some(category_id) = query.category_id {
            sql.push_str(" AND category_id = ?");
            bind.push(Value::Integer(category_id));
        }
        sql.push_str(" ORDER BY id ASC;");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind))?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_note_row(row)?);
        }
        Ok(items)
    }

    fn find_tasks_by_category(&self, category_id: CategoryId) -> ItemRepoResult<Vec<Task>> {
        self.list_tasks(&TaskListQuery {
            category_id: Some(category_id),
            completed: None,
        })
    }

    fn find_notes_by_category(&self, category_id: CategoryId) -> ItemRepoResult<Vec<Note>> {
        self.list_notes(&NoteListQuery {
            category_id: Some(category_id),
        })
    }

    fn set_task_completed(&self, id: TaskId, completed: bool) -> ItemRepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE tasks
             SET completed = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![id, i64::from(completed)],
        )?;
        if changed == 0 {
            return Err(ItemRepoError::TaskNotFound(id));
        }
        Ok(())
    }

    fn count_tasks_by_category(&self, filter: &TaskCountFilter) -> ItemRepoResult<CountMap> {
        let sql = if filter.include_completed {
            "SELECT category_id, COUNT(*)
             FROM tasks
             WHERE category_id IS NOT NULL
             GROUP BY category_id;"
        } else {
            "SELECT category_id, COUNT(*)
             FROM tasks
             WHERE category_id IS NOT NULL
               AND completed = 0
             GROUP BY category_id;"
        };
        grouped_counts(self.conn, sql)
    }

    fn count_notes_by_category(&self) -> ItemRepoResult<CountMap> {
        grouped_counts(
            self.conn,
            "SELECT category_id, COUNT(*)
             FROM notes
             WHERE category_id IS NOT NULL
             GROUP BY category_id;",
        )
    }

    fn reassign_tasks_category(
        &self,
        ids: &[TaskId],
        new_category_id: Option<CategoryId>,
    ) -> ItemRepoResult<usize> {
        Ok(reassign_item_ids(
            self.conn,
            ItemTable::Tasks,
            ids,
            new_category_id,
        )?)
    }

    fn reassign_notes_category(
        &self,
        ids: &[NoteId],
        new_category_id: Option<CategoryId>,
    ) -> ItemRepoResult<usize> {
        Ok(reassign_item_ids(
            self.conn,
            ItemTable::Notes,
            ids,
            new_category_id,
        )?)
    }

    fn delete_tasks(&self, ids: &[TaskId]) -> ItemRepoResult<usize> {
        Ok(delete_item_ids(self.conn, ItemTable::Tasks, ids)?)
    }

    fn delete_notes(&self, ids: &[NoteId]) -> ItemRepoResult<usize> {
        Ok(delete_item_ids(self.conn, ItemTable::Notes, ids)?)
    }
}

/// Table designator for the helpers shared with the category store's
/// deletion transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ItemTable {
    Tasks,
    Notes,
}

impl ItemTable {
    fn name(self) -> &'static str {
        match self {
            Self::Tasks => "tasks",
            Self::Notes => "notes",
        }
    }
}

/// Ids of every row filed under the given category, ascending.
pub(crate) fn item_ids_in_category(
    conn: &Connection,
    table: ItemTable,
    category_id: CategoryId,
) -> rusqlite::Result<Vec<i64>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT id FROM {} WHERE category_id = ?1 ORDER BY id ASC;",
        table.name()
    ))?;
    let mut rows = stmt.query([category_id])?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next()? {
        ids.push(row.get(0)?);
    }
    Ok(ids)
}

/// Moves the given rows to another category in one statement.
pub(crate) fn reassign_item_ids(
    conn: &Connection,
    table: ItemTable,
    ids: &[i64],
    new_category_id: Option<CategoryId>,
) -> rusqlite::Result<usize> {
    if ids.is_empty() {
        return Ok(0);
    }
    let placeholders = id_placeholders(2, ids.len());
    let sql = format!(
        "UPDATE {}
         SET category_id = ?1,
             updated_at = (strftime('%s', 'now') * 1000)
         WHERE id IN ({placeholders});",
        table.name()
    );
    let mut bind: Vec<Value> = Vec::with_capacity(ids.len() + 1);
    bind.push(match new_category_id {
        Some(id) => Value::Integer(id),
        None => Value::Null,
    });
    bind.extend(ids.iter().map(|id| Value::Integer(*id)));
    conn.execute(&sql, params_from_iter(bind))
}

/// Removes the given rows in one statement.
pub(crate) fn delete_item_ids(
    conn: &Connection,
    table: ItemTable,
    ids: &[i64],
) -> rusqlite::Result<usize> {
    if ids.is_empty() {
        return Ok(0);
    }
    let placeholders = id_placeholders(1, ids.len());
    let sql = format!("DELETE FROM {} WHERE id IN ({placeholders});", table.name());
    let bind: Vec<Value> = ids.iter().map(|id| Value::Integer(*id)).collect();
    conn.execute(&sql, params_from_iter(bind))
}

fn id_placeholders(first: usize, count: usize) -> String {
    (first..first + count)
        .map(|n| format!("?{n}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn grouped_counts(conn: &Connection, sql: &str) -> ItemRepoResult<CountMap> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query([])?;
    let mut counts = CountMap::new();
    while let Some(row) = rows.next()? {
        let category_id: CategoryId = row.get(0)?;
        let count: i64 = row.get(1)?;
        counts.insert(category_id, count.max(0) as u64);
    }
    Ok(counts)
}

fn load_task(conn: &Connection, id: TaskId) -> ItemRepoResult<Task> {
    let mut stmt = conn.prepare(&format!("{TASK_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id])?;
    if let Some(row) = rows.next()? {
        return parse_task_row(row);
    }
    Err(ItemRepoError::TaskNotFound(id))
}

fn load_note(conn: &Connection, id: NoteId) -> ItemRepoResult<Note> {
    let mut stmt = conn.prepare(&format!("{NOTE_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id])?;
    if let Some(row) = rows.next()? {
        return parse_note_row(row);
    }
    Err(ItemRepoError::NoteNotFound(id))
}

fn parse_task_row(row: &Row<'_>) -> ItemRepoResult<Task> {
    Ok(Task {
        id: row.get("id")?,
        category_id: row.get("category_id")?,
        content: row.get("content")?,
        due_date: row.get("due_date")?,
        completed: parse_completed(row.get("completed")?)?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_note_row(row: &Row<'_>) -> ItemRepoResult<Note> {
    Ok(Note {
        id: row.get("id")?,
        category_id: row.get("category_id")?,
        content: row.get("content")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_completed(value: i64) -> ItemRepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(ItemRepoError::InvalidData(format!(
            "invalid completed value `{other}` in tasks.completed"
        ))),
    }
}
