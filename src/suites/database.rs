//! `DatabaseTest`: basic relational operations on an in-memory SQLite database.
//!
//! Each unit gets its own connection, opened in setup and closed in teardown.

use rusqlite::{params, Connection, OptionalExtension};

use crate::assertion::{equals, is_some};
use crate::diagnostics::{Fault, HarnessResult, UnitResult};
use crate::registry::Registry;

const CREATE_USERS: &str = "
    CREATE TABLE users (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        email TEXT UNIQUE
    )";

#[derive(Debug, Default)]
pub struct Database {
    conn: Option<Connection>,
}

impl Database {
    fn conn(&mut self) -> Result<&mut Connection, Fault> {
        self.conn
            .as_mut()
            .ok_or_else(|| Fault::new("database connection is not open"))
    }
}

fn open(db: &mut Database) -> UnitResult {
    db.conn = Some(Connection::open_in_memory()?);
    Ok(())
}

fn close(db: &mut Database) -> UnitResult {
    if let Some(conn) = db.conn.take() {
        conn.close().map_err(|(_, err)| err)?;
    }
    Ok(())
}

pub fn register(registry: &mut Registry) -> HarnessResult<()> {
    registry
        .suite::<Database>("DatabaseTest")?
        .setup(open)
        .teardown(close)
        .unit("test_create_table", create_table)?
        .unit("test_insert_user", insert_user)?
        .unit("test_query_users", query_users)?;
    Ok(())
}

fn create_table(db: &mut Database) -> UnitResult {
    let conn = db.conn()?;
    conn.execute(CREATE_USERS, [])?;

    let table: Option<String> = conn
        .query_row(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'users'",
            [],
            |row| row.get(0),
        )
        .optional()?;
    is_some(&table)?;
    equals(Some("users"), table.as_deref())?;
    Ok(())
}

fn insert_user(db: &mut Database) -> UnitResult {
    let conn = db.conn()?;
    conn.execute(CREATE_USERS, [])?;
    conn.execute(
        "INSERT INTO users (name, email) VALUES (?1, ?2)",
        params!["John Doe", "john@example.com"],
    )?;

    let user: Option<(i64, String, Option<String>)> = conn
        .query_row(
            "SELECT id, name, email FROM users WHERE name = ?1",
            params!["John Doe"],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .optional()?;
    is_some(&user)?;
    if let Some((_, name, email)) = user {
        equals("John Doe", name)?;
        equals(Some("john@example.com"), email.as_deref())?;
    }
    Ok(())
}

fn query_users(db: &mut Database) -> UnitResult {
    let conn = db.conn()?;
    conn.execute(CREATE_USERS, [])?;

    let users = [
        ("Alice Smith", "alice@example.com"),
        ("Bob Johnson", "bob@example.com"),
        ("Charlie Brown", "charlie@example.com"),
    ];
    let tx = conn.transaction()?;
    {
        let mut insert = tx.prepare("INSERT INTO users (name, email) VALUES (?1, ?2)")?;
        for (name, email) in users {
            insert.execute(params![name, email])?;
        }
    }
    tx.commit()?;

    let mut select = conn.prepare("SELECT name FROM users ORDER BY id")?;
    let names = select
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    equals(3, names.len())?;
    equals(vec!["Alice Smith", "Bob Johnson", "Charlie Brown"], names)?;
    Ok(())
}
