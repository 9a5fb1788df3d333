//! Category store contract and SQLite implementation.
//!
//! # Responsibility
//! - Own the authoritative flat list of categories and their parent links.
//! - Keep SQL details and ordering behavior inside the repository boundary.
//! - Run the whole delete-with-disposition cascade as one transaction.
//!
//! # Invariants
//! - Listing is deterministic: `sort_order ASC, id ASC`.
//! - `insert` defaults `sort_order` to one past the largest sibling value.
//! - `remove_leaf` is all-or-nothing: preconditions are re-verified inside
//!   the transaction, and any failure rolls every effect back.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::category::{
    normalize_name, Category, CategoryDraft, CategoryId, CategoryPatch, CategoryValidationError,
};
use crate::repo::item_repo::{delete_item_ids, item_ids_in_category, reassign_item_ids, ItemTable};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

const CATEGORY_SELECT_SQL: &str =
    "SELECT id, name, description, parent_id, sort_order, created_at, updated_at FROM categories";

const CATEGORY_COLUMNS: &[&str] = &[
    "id",
    "name",
    "description",
    "parent_id",
    "sort_order",
    "created_at",
    "updated_at",
];

pub type CategoryRepoResult<T> = Result<T, CategoryRepoError>;

/// Errors from category store operations.
#[derive(Debug)]
pub enum CategoryRepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Write shape failed validation.
    Validation(CategoryValidationError),
    /// Target category does not exist.
    CategoryNotFound(CategoryId),
    /// Deletion blocked by direct children.
    HasChildren(CategoryId),
    /// Deletion expected no attached tasks/notes, but found some.
    ItemsStillAttached(CategoryId),
    /// Reassignment target is the category being deleted or unknown.
    ReassignTargetInvalid(CategoryId),
    /// Connection schema is not at the expected migrated version.
    SchemaVersionMismatch { expected: u32, found: u32 },
    /// Required table is missing.
    MissingTable(&'static str),
    /// Required column is missing from an expected table.
    MissingColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
}

impl Display for CategoryRepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::CategoryNotFound(id) => write!(f, "category not found: {id}"),
            Self::HasChildren(id) => {
                write!(f, "category {id} still has child categories")
            }
            Self::ItemsStillAttached(id) => {
                write!(f, "category {id} still has attached tasks or notes")
            }
            Self::ReassignTargetInvalid(id) => {
                write!(f, "invalid reassignment target category: {id}")
            }
            Self::SchemaVersionMismatch { expected, found } => write!(
                f,
                "category store requires schema version {expected}, got {found}"
            ),
            Self::MissingTable(table) => {
                write!(f, "category store requires table `{table}`")
            }
            Self::MissingColumn { table, column } => {
                write!(f, "category store requires column `{column}` in table `{table}`")
            }
            Self::InvalidData(message) => write!(f, "invalid category data: {message}"),
        }
    }
}

impl Error for CategoryRepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for CategoryRepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for CategoryRepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<CategoryValidationError> for CategoryRepoError {
    fn from(value: CategoryValidationError) -> Self {
        Self::Validation(value)
    }
}

/// What happens to a deleted category's tasks and notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemDisposition {
    /// Fail when any task/note is still attached.
    RequireEmpty,
    /// Move every attached task/note to the given category.
    ReassignTo(CategoryId),
    /// Delete every attached task/note.
    DeleteItems,
}

/// Effects of a committed category deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub category_id: CategoryId,
    /// Tasks reassigned or deleted, depending on the disposition.
    pub tasks_affected: usize,
    /// Notes reassigned or deleted, depending on the disposition.
    pub notes_affected: usize,
}

/// Repository interface for the authoritative category list.
pub trait CategoryRepository {
    /// Stable snapshot of every category, ordered `sort_order, id`.
    fn list(&self) -> CategoryRepoResult<Vec<Category>>;
    /// Loads one category by id.
    fn get(&self, id: CategoryId) -> CategoryRepoResult<Option<Category>>;
    /// Inserts one category, assigning id and default sort order.
    fn insert(&self, draft: &CategoryDraft) -> CategoryRepoResult<Category>;
    /// Applies a partial update and returns the updated record.
    fn patch(&self, id: CategoryId, patch: &CategoryPatch) -> CategoryRepoResult<Category>;
    /// Re-parents one category, placing it last among its new siblings.
    fn set_parent(
        &self,
        id: CategoryId,
        new_parent_id: Option<CategoryId>,
    ) -> CategoryRepoResult<Category>;
    /// Deletes one childless category after resolving its items.
    fn remove_leaf(
        &self,
        id: CategoryId,
        disposition: ItemDisposition,
    ) -> CategoryRepoResult<DeleteOutcome>;
}

/// SQLite-backed category store.
#[derive(Debug)]
pub struct SqliteCategoryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCategoryRepository<'conn> {
    /// Creates the store from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> CategoryRepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl CategoryRepository for SqliteCategoryRepository<'_> {
    fn list(&self) -> CategoryRepoResult<Vec<Category>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CATEGORY_SELECT_SQL} ORDER BY sort_order ASC, id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut categories = Vec::new();
        while let Some(row) = rows.next()? {
            categories.push(parse_category_row(row)?);
        }
        Ok(categories)
    }

    fn get(&self, id: CategoryId) -> CategoryRepoResult<Option<Category>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CATEGORY_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_category_row(row)?));
        }
        Ok(None)
    }

    fn insert(&self, draft: &CategoryDraft) -> CategoryRepoResult<Category> {
        let name = normalize_name(&draft.name)?;
        let sort_order = next_sort_order(self.conn, draft.parent_id)?;
        self.conn.execute(
            "INSERT INTO categories (name, description, parent_id, sort_order)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                name,
                draft.description.as_deref(),
                draft.parent_id,
                sort_order
            ],
        )?;
        load_required(self.conn, self.conn.last_insert_rowid())
    }

    fn patch(&self, id: CategoryId, patch: &CategoryPatch) -> CategoryRepoResult<Category> {
        let mut assignments: Vec<&'static str> = Vec::new();
        let mut bind: Vec<Value> = Vec::new();

        if let Some(name) = &patch.name {
            assignments.push("name = ?");
            bind.push(Value::Text(normalize_name(name)?));
        }
        if let Some(description) = &patch.description {
            assignments.push("description = ?");
            bind.push(match description {
                Some(text) => Value::Text(text.clone()),
                None => Value::Null,
            });
        }
        if assignments.is_empty() {
            return load_required(self.conn, id);
        }

        assignments.push("updated_at = (strftime('%s', 'now') * 1000)");
        let sql = format!(
            "UPDATE categories SET {} WHERE id = ?;",
            assignments.join(", ")
        );
        bind.push(Value::Integer(id));

        let changed = self.conn.execute(&sql, params_from_iter(bind))?;
        if changed == 0 {
            return Err(CategoryRepoError::CategoryNotFound(id));
        }
        load_required(self.conn, id)
    }

    fn set_parent(
        &self,
        id: CategoryId,
        new_parent_id: Option<CategoryId>,
    ) -> CategoryRepoResult<Category> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let sort_order = next_sort_order(&tx, new_parent_id)?;
        let changed = tx.execute(
            "UPDATE categories
             SET parent_id = ?2,
                 sort_order = ?3,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![id, new_parent_id, sort_order],
        )?;
        if changed == 0 {
            return Err(CategoryRepoError::CategoryNotFound(id));
        }
        tx.commit()?;
        load_required(self.conn, id)
    }

    fn remove_leaf(
        &self,
        id: CategoryId,
        disposition: ItemDisposition,
    ) -> CategoryRepoResult<DeleteOutcome> {
        if let ItemDisposition::ReassignTo(target) = disposition {
            if target == id {
                return Err(CategoryRepoError::ReassignTargetInvalid(target));
            }
        }

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        if !category_exists(&tx, id)? {
            return Err(CategoryRepoError::CategoryNotFound(id));
        }
        let child_count: i64 = tx.query_row(
            "SELECT COUNT(*) FROM categories WHERE parent_id = ?1;",
            [id],
            |row| row.get(0),
        )?;
        if child_count > 0 {
            return Err(CategoryRepoError::HasChildren(id));
        }

        let task_ids = item_ids_in_category(&tx, ItemTable::Tasks, id)?;
        let note_ids = item_ids_in_category(&tx, ItemTable::Notes, id)?;

        let (tasks_affected, notes_affected) = match disposition {
            ItemDisposition::RequireEmpty => {
                if !task_ids.is_empty() || !note_ids.is_empty() {
                    return Err(CategoryRepoError::ItemsStillAttached(id));
                }
                (0, 0)
            }
            ItemDisposition::ReassignTo(target) => {
                if !category_exists(&tx, target)? {
                    return Err(CategoryRepoError::ReassignTargetInvalid(target));
                }
                (
                    reassign_item_ids(&tx, ItemTable::Tasks, &task_ids, Some(target))?,
                    reassign_item_ids(&tx, ItemTable::Notes, &note_ids, Some(target))?,
                )
            }
            ItemDisposition::DeleteItems => (
                delete_item_ids(&tx, ItemTable::Tasks, &task_ids)?,
                delete_item_ids(&tx, ItemTable::Notes, &note_ids)?,
            ),
        };

        tx.execute("DELETE FROM categories WHERE id = ?1;", [id])?;
        tx.commit()?;

        Ok(DeleteOutcome {
            category_id: id,
            tasks_affected,
            notes_affected,
        })
    }
}

/// Next sort position under one parent: one past the largest sibling value.
fn next_sort_order(conn: &Connection, parent_id: Option<CategoryId>) -> rusqlite::Result<i64> {
    conn.query_row(
        "SELECT COALESCE(MAX(sort_order), -1) + 1 FROM categories WHERE parent_id IS ?1;",
        params![parent_id],
        |row| row.get(0),
    )
}

fn category_exists(conn: &Connection, id: CategoryId) -> rusqlite::Result<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM categories WHERE id = ?1);",
        [id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn load_required(conn: &Connection, id: CategoryId) -> CategoryRepoResult<Category> {
    let mut stmt = conn.prepare(&format!("{CATEGORY_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id])?;
    if let Some(row) = rows.next()? {
        return parse_category_row(row);
    }
    Err(CategoryRepoError::CategoryNotFound(id))
}

fn parse_category_row(row: &Row<'_>) -> CategoryRepoResult<Category> {
    Ok(Category {
        id: row.get("id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        parent_id: row.get("parent_id")?,
        sort_order: row.get("sort_order")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn ensure_connection_ready(conn: &Connection) -> CategoryRepoResult<()> {
    let expected = latest_version();
    let found: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if found != expected {
        return Err(CategoryRepoError::SchemaVersionMismatch { expected, found });
    }

    for table in ["categories", "tasks", "notes"] {
        if !table_exists(conn, table)? {
            return Err(CategoryRepoError::MissingTable(table));
        }
    }

    for &column in CATEGORY_COLUMNS {
        if !table_has_column(conn, "categories", column)? {
            return Err(CategoryRepoError::MissingColumn {
                table: "categories",
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> rusqlite::Result<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1);",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> rusqlite::Result<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}
