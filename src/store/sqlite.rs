//! Embedded SQLite implementation of the relational store.
//!
//! Rows are read into JSON objects keyed by column name and decoded into the
//! typed records, the same shape the hosted API returns.

use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{ffi, params, params_from_iter, Connection, ErrorCode, Params, Row};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use super::{
    Editable, MembershipRow, Order, Resource, SortColumn, SortDirection, Store, MEMBERSHIP_TABLE,
};
use crate::error::{Error, Result};
use crate::flashcards::{Flashcard, Membership, NewMembership};

const SCHEMA: &str = r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS words (
        id TEXT PRIMARY KEY,
        word TEXT NOT NULL CHECK (length(trim(word)) > 0),
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS flashcards (
        id TEXT PRIMARY KEY,
        front TEXT NOT NULL CHECK (length(trim(front)) > 0),
        back TEXT,
        language TEXT NOT NULL DEFAULT 'es',
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        owner_id TEXT
    );

    CREATE TABLE IF NOT EXISTS decks (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL CHECK (length(trim(name)) > 0),
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );

    -- Both UNIQUE constraints settle concurrent adds: the loser gets a
    -- constraint violation instead of a duplicate row or position.
    CREATE TABLE IF NOT EXISTS deck_flashcards (
        id TEXT PRIMARY KEY,
        deck_id TEXT NOT NULL REFERENCES decks(id) ON DELETE CASCADE,
        flashcard_id TEXT NOT NULL REFERENCES flashcards(id) ON DELETE CASCADE,
        position INTEGER NOT NULL CHECK (position >= 0),
        added_at TEXT NOT NULL,
        UNIQUE (deck_id, flashcard_id),
        UNIQUE (deck_id, position)
    );

    CREATE INDEX IF NOT EXISTS idx_deck_flashcards_flashcard_id ON deck_flashcards(flashcard_id);
    CREATE INDEX IF NOT EXISTS idx_flashcards_front ON flashcards(front);
"#;

const MEMBERSHIP_JOIN_SQL: &str = r#"
    SELECT m.id AS membership_id, m.position AS position, m.added_at AS added_at,
           f.id AS id, f.front AS front, f.back AS back, f.language AS language,
           f.created_at AS created_at, f.updated_at AS updated_at, f.owner_id AS owner_id
    FROM deck_flashcards m
    JOIN flashcards f ON f.id = m.flashcard_id
    WHERE m.deck_id = ?1
    ORDER BY m.position ASC
"#;

const OUTSIDE_DECK_SQL: &str = r#"
    SELECT f.* FROM flashcards f
    WHERE NOT EXISTS (
        SELECT 1 FROM deck_flashcards m
        WHERE m.deck_id = ?1 AND m.flashcard_id = f.id
    )
    ORDER BY f.front ASC, f.rowid ASC
"#;

impl From<rusqlite::Error> for Error {
    fn from(e: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(failure, message) = &e {
            if failure.code == ErrorCode::ConstraintViolation {
                let detail = message.clone().unwrap_or_else(|| failure.to_string());
                return match failure.extended_code {
                    ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                        Error::Conflict(detail)
                    }
                    ffi::SQLITE_CONSTRAINT_FOREIGNKEY => Error::NotFound {
                        resource: "Referenced row",
                        id: detail,
                    },
                    _ => Error::ValidationFailed(detail),
                };
            }
        }
        Error::server(format!("SQLite error: {}", e))
    }
}

/// Relational store backed by a single SQLite connection.
///
/// Statements run on the blocking thread pool so callers on the async
/// runtime are never stalled by disk I/O.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) a database file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::server(format!("IO error: {}", e)))?;
        }
        Self::init(Connection::open(path)?)
    }

    /// Fresh database living only as long as the store.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().unwrap_or_else(PoisonError::into_inner);
            f(&conn)
        })
        .await?
    }
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn row_to_json(row: &Row, names: &[String]) -> rusqlite::Result<Map<String, Value>> {
    let mut map = Map::with_capacity(names.len());
    for (i, name) in names.iter().enumerate() {
        let value = match row.get_ref(i)? {
            ValueRef::Null | ValueRef::Blob(_) => Value::Null,
            ValueRef::Integer(n) => Value::from(n),
            ValueRef::Real(f) => Value::from(f),
            ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
        };
        map.insert(name.clone(), value);
    }
    Ok(map)
}

fn query_maps<P: Params>(conn: &Connection, sql: &str, params: P) -> Result<Vec<Map<String, Value>>> {
    let mut stmt = conn.prepare(sql)?;
    let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let rows = stmt
        .query_map(params, |row| row_to_json(row, &names))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

fn query_rows<T: DeserializeOwned, P: Params>(conn: &Connection, sql: &str, params: P) -> Result<Vec<T>> {
    query_maps(conn, sql, params)?
        .into_iter()
        .map(|map| serde_json::from_value(Value::Object(map)).map_err(Error::from))
        .collect()
}

fn fetch_one<R: Resource>(conn: &Connection, id: Uuid) -> Result<R> {
    let sql = format!("SELECT * FROM {} WHERE id = ?1", R::TABLE);
    query_rows::<R, _>(conn, &sql, params![id.to_string()])?
        .into_iter()
        .next()
        .ok_or_else(|| Error::not_found(R::NAME, id))
}

fn json_to_sql(value: Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(b as i64),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => SqlValue::Text(s),
        other => SqlValue::Text(other.to_string()),
    }
}

/// PostgreSQL's default placement: NULLs sort as larger than any value.
fn nulls_placement(direction: SortDirection) -> &'static str {
    match direction {
        SortDirection::Asc => "NULLS LAST",
        SortDirection::Desc => "NULLS FIRST",
    }
}

/// Column/value pairs of a serialized draft or patch.
fn to_columns<T: Serialize>(fields: &T) -> Result<Vec<(String, SqlValue)>> {
    match serde_json::to_value(fields)? {
        Value::Object(map) => Ok(map.into_iter().map(|(k, v)| (k, json_to_sql(v))).collect()),
        other => Err(Error::server(format!("Expected a row object, got {}", other))),
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn count<R: Resource>(&self) -> Result<u64> {
        self.with_conn(|conn| {
            let sql = format!("SELECT COUNT(*) FROM {}", R::TABLE);
            let count: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
            Ok(count as u64)
        })
        .await
    }

    async fn select_page<R: Resource>(
        &self,
        order: Order<R::Column>,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<R>> {
        self.with_conn(move |conn| {
            let direction = order.direction.as_str();
            let sql = format!(
                "SELECT * FROM {} ORDER BY {} {} {}, rowid {} LIMIT ?1 OFFSET ?2",
                R::TABLE,
                order.column.as_str(),
                direction,
                nulls_placement(order.direction),
                direction
            );
            query_rows(conn, &sql, params![limit as i64, offset as i64])
        })
        .await
    }

    async fn get<R: Resource>(&self, id: Uuid) -> Result<R> {
        self.with_conn(move |conn| fetch_one::<R>(conn, id)).await
    }

    async fn insert<R: Resource>(&self, draft: &R::Draft) -> Result<R> {
        let fields = to_columns(draft)?;
        self.with_conn(move |conn| {
            let id = Uuid::new_v4();
            let now = timestamp();

            let mut columns = vec!["id".to_string(), "created_at".to_string()];
            let mut values = vec![SqlValue::Text(id.to_string()), SqlValue::Text(now.clone())];
            if R::HAS_UPDATED_AT {
                columns.push("updated_at".to_string());
                values.push(SqlValue::Text(now));
            }
            for (column, value) in fields {
                columns.push(column);
                values.push(value);
            }

            let placeholders = (1..=columns.len())
                .map(|i| format!("?{}", i))
                .collect::<Vec<_>>()
                .join(", ");
            let sql = format!(
                "INSERT INTO {} ({}) VALUES ({})",
                R::TABLE,
                columns.join(", "),
                placeholders
            );
            conn.execute(&sql, params_from_iter(values))?;

            fetch_one::<R>(conn, id)
        })
        .await
    }

    async fn update<R: Editable>(&self, id: Uuid, patch: &R::Patch) -> Result<R> {
        let mut fields = to_columns(patch)?;
        if R::HAS_UPDATED_AT {
            fields.push(("updated_at".to_string(), SqlValue::Text(timestamp())));
        }
        self.with_conn(move |conn| {
            if fields.is_empty() {
                return fetch_one::<R>(conn, id);
            }

            let assignments = fields
                .iter()
                .enumerate()
                .map(|(i, (column, _))| format!("{} = ?{}", column, i + 1))
                .collect::<Vec<_>>()
                .join(", ");
            let sql = format!(
                "UPDATE {} SET {} WHERE id = ?{}",
                R::TABLE,
                assignments,
                fields.len() + 1
            );
            let mut values: Vec<SqlValue> = fields.into_iter().map(|(_, v)| v).collect();
            values.push(SqlValue::Text(id.to_string()));

            if conn.execute(&sql, params_from_iter(values))? == 0 {
                return Err(Error::not_found(R::NAME, id));
            }
            fetch_one::<R>(conn, id)
        })
        .await
    }

    async fn delete<R: Resource>(&self, id: Uuid) -> Result<()> {
        self.with_conn(move |conn| {
            let sql = format!("DELETE FROM {} WHERE id = ?1", R::TABLE);
            if conn.execute(&sql, params![id.to_string()])? == 0 {
                return Err(Error::not_found(R::NAME, id));
            }
            Ok(())
        })
        .await
    }

    async fn max_position(&self, deck_id: Uuid) -> Result<Option<u32>> {
        self.with_conn(move |conn| {
            let max: Option<i64> = conn.query_row(
                "SELECT MAX(position) FROM deck_flashcards WHERE deck_id = ?1",
                params![deck_id.to_string()],
                |row| row.get(0),
            )?;
            Ok(max.map(|p| p as u32))
        })
        .await
    }

    async fn insert_membership(&self, membership: &NewMembership) -> Result<Membership> {
        let membership = membership.clone();
        self.with_conn(move |conn| {
            let id = Uuid::new_v4();
            conn.execute(
                "INSERT INTO deck_flashcards (id, deck_id, flashcard_id, position, added_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    id.to_string(),
                    membership.deck_id.to_string(),
                    membership.flashcard_id.to_string(),
                    membership.position as i64,
                    timestamp()
                ],
            )?;

            let sql = format!("SELECT * FROM {} WHERE id = ?1", MEMBERSHIP_TABLE);
            query_rows::<Membership, _>(conn, &sql, params![id.to_string()])?
                .into_iter()
                .next()
                .ok_or_else(|| Error::not_found("Membership", id))
        })
        .await
    }

    async fn delete_membership(&self, id: Uuid) -> Result<()> {
        self.with_conn(move |conn| {
            let removed = conn.execute(
                "DELETE FROM deck_flashcards WHERE id = ?1",
                params![id.to_string()],
            )?;
            if removed == 0 {
                return Err(Error::not_found("Membership", id));
            }
            Ok(())
        })
        .await
    }

    async fn deck_memberships(&self, deck_id: Uuid) -> Result<Vec<MembershipRow>> {
        self.with_conn(move |conn| {
            query_maps(conn, MEMBERSHIP_JOIN_SQL, params![deck_id.to_string()])?
                .into_iter()
                .map(|mut flashcard| {
                    let row = serde_json::json!({
                        "id": flashcard.remove("membership_id"),
                        "position": flashcard.remove("position"),
                        "added_at": flashcard.remove("added_at"),
                        "flashcards": Value::Object(flashcard),
                    });
                    serde_json::from_value(row).map_err(Error::from)
                })
                .collect()
        })
        .await
    }

    async fn flashcards_outside_deck(&self, deck_id: Uuid) -> Result<Vec<Flashcard>> {
        self.with_conn(move |conn| query_rows(conn, OUTSIDE_DECK_SQL, params![deck_id.to_string()]))
            .await
    }
}
