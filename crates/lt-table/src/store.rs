//! SQLite persistence of light tables and their configuration.
//!
//! A store holds three sections: the `LightTable` itself, rewritten on
//! every write, an append-only `Config` table and the bookkeeping tables
//! `meta` and `columns` that let the table be loaded back.

use std::fs;
use std::path::Path;

use log::{debug, info};
use lt_core::{ErrorInfo, LtError};
use rusqlite::{params, params_from_iter, Connection, OpenFlags, OptionalExtension};

use crate::config_table::ConfigTable;
use crate::table::{LightTable, TableRow};

pub const STORE_VERSION: i64 = 1;

const TABLE_SECTION: &str = "LightTable";
const CONFIG_SECTION: &str = "Config";
const INDEX_ROLE: &str = "index";
const VALUE_ROLE: &str = "value";

/// Writes `table` to `path`, replacing any previous store there.
///
/// The store is assembled in a sibling temporary file and renamed over
/// `path` once complete, so a failed write leaves the previous store intact.
pub fn write_light_table(path: &Path, table: &LightTable) -> Result<(), LtError> {
    if table.index_columns.is_empty() {
        return Err(store_error("store-write", path, "table has no index column"));
    }
    let width = table.index_columns.len() + table.value_columns.len();
    if let Some(row) = table
        .rows
        .iter()
        .find(|row| row.index.len() + row.values.len() != width)
    {
        return Err(store_error(
            "store-write",
            path,
            format!("row {:?} does not match the table columns", row.index),
        ));
    }

    let dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir).map_err(|err| LtError::io("io-write", dir, err))?;
    let staged = tempfile::Builder::new()
        .prefix(".lighttable-")
        .suffix(".sqlite")
        .tempfile_in(dir)
        .map_err(|err| LtError::io("io-write", dir, err))?;
    fill_store(staged.path(), path, table)?;
    staged
        .persist(path)
        .map_err(|err| LtError::io("io-write", path, err.error))?;
    info!("wrote {} rows to {}", table.len(), path.display());
    Ok(())
}

fn fill_store(staged: &Path, path: &Path, table: &LightTable) -> Result<(), LtError> {
    let mut conn = Connection::open(staged).map_err(|err| store_error("store-open", path, err))?;
    init_schema(&conn, path)?;

    let columns: Vec<&str> = table
        .index_columns
        .iter()
        .chain(&table.value_columns)
        .map(String::as_str)
        .collect();
    let definitions: Vec<String> = columns
        .iter()
        .map(|column| format!("{} REAL NOT NULL", quote(column)))
        .collect();
    let index_list: Vec<String> = table.index_columns.iter().map(|c| quote(c)).collect();
    let placeholders = vec!["?"; columns.len()].join(", ");
    let insert = format!(
        "INSERT INTO {}({}) VALUES ({placeholders})",
        quote(TABLE_SECTION),
        columns.iter().map(|c| quote(c)).collect::<Vec<_>>().join(", ")
    );

    let tx = conn
        .transaction()
        .map_err(|err| store_error("store-write", path, err))?;
    tx.execute_batch(&format!(
        "CREATE TABLE {}({});
         CREATE INDEX light_table_index ON {}({});",
        quote(TABLE_SECTION),
        definitions.join(", "),
        quote(TABLE_SECTION),
        index_list.join(", ")
    ))
    .map_err(|err| store_error("store-write", path, err))?;
    for (position, column) in columns.iter().enumerate() {
        let role = if position < table.index_columns.len() {
            INDEX_ROLE
        } else {
            VALUE_ROLE
        };
        tx.execute(
            "INSERT INTO columns(name, role, position) VALUES (?, ?, ?)",
            params![column, role, position as i64],
        )
        .map_err(|err| store_error("store-write", path, err))?;
    }
    {
        let mut stmt = tx
            .prepare(&insert)
            .map_err(|err| store_error("store-write", path, err))?;
        for row in &table.rows {
            stmt.execute(params_from_iter(row.index.iter().chain(&row.values)))
                .map_err(|err| store_error("store-write", path, err))?;
        }
    }
    tx.commit()
        .map_err(|err| store_error("store-write", path, err))?;
    conn.close()
        .map_err(|(_, err)| store_error("store-write", path, err))
}

/// Appends `config` to the `Config` section of the store at `path`.
pub fn append_config(path: &Path, config: &ConfigTable) -> Result<(), LtError> {
    let mut conn = Connection::open(path).map_err(|err| store_error("store-open", path, err))?;
    init_schema(&conn, path)?;
    let tx = conn
        .transaction()
        .map_err(|err| store_error("store-write", path, err))?;
    for (parameter, value) in &config.entries {
        tx.execute(
            &format!("INSERT INTO {}(parameter, value) VALUES (?, ?)", quote(CONFIG_SECTION)),
            params![parameter, value],
        )
        .map_err(|err| store_error("store-write", path, err))?;
    }
    tx.commit()
        .map_err(|err| store_error("store-write", path, err))?;
    debug!("appended {} config entries to {}", config.len(), path.display());
    Ok(())
}

/// Reads back a table written by [`write_light_table`].
pub fn load_light_table(path: &Path) -> Result<LightTable, LtError> {
    let conn = open_read_only(path)?;
    check_version(&conn, path)?;

    let mut stmt = conn
        .prepare("SELECT name, role FROM columns ORDER BY position")
        .map_err(|err| store_error("store-read", path, err))?;
    let described = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
        .map_err(|err| store_error("store-read", path, err))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| store_error("store-read", path, err))?;

    let mut table = LightTable::new(Vec::new(), Vec::new());
    for (name, role) in described {
        match role.as_str() {
            INDEX_ROLE => table.index_columns.push(name),
            VALUE_ROLE => table.value_columns.push(name),
            other => {
                return Err(store_error(
                    "store-schema",
                    path,
                    format!("column {name} has unknown role {other}"),
                ))
            }
        }
    }
    if table.index_columns.is_empty() {
        return Err(store_error("store-schema", path, "store has no index column"));
    }

    let width = table.index_columns.len();
    let selected: Vec<String> = table
        .index_columns
        .iter()
        .chain(&table.value_columns)
        .map(|c| quote(c))
        .collect();
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {} FROM {} ORDER BY rowid",
            selected.join(", "),
            quote(TABLE_SECTION)
        ))
        .map_err(|err| store_error("store-read", path, err))?;
    let rows = stmt
        .query_map([], |row| {
            let mut cells = Vec::with_capacity(selected.len());
            for position in 0..selected.len() {
                cells.push(row.get::<_, f64>(position)?);
            }
            let values = cells.split_off(width);
            Ok(TableRow {
                index: cells,
                values,
            })
        })
        .map_err(|err| store_error("store-read", path, err))?;
    table.rows = rows
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| store_error("store-read", path, err))?;
    Ok(table)
}

/// Every `Config` entry of the store, in insertion order.
pub fn load_config(path: &Path) -> Result<ConfigTable, LtError> {
    let conn = open_read_only(path)?;
    check_version(&conn, path)?;
    let mut stmt = conn
        .prepare(&format!(
            "SELECT parameter, value FROM {} ORDER BY rowid",
            quote(CONFIG_SECTION)
        ))
        .map_err(|err| store_error("store-read", path, err))?;
    let entries = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
        .map_err(|err| store_error("store-read", path, err))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| store_error("store-read", path, err))?;
    Ok(ConfigTable { entries })
}

fn init_schema(conn: &Connection, path: &Path) -> Result<(), LtError> {
    conn.execute_batch(
        "BEGIN;
        CREATE TABLE IF NOT EXISTS meta(version INTEGER NOT NULL);
        CREATE TABLE IF NOT EXISTS columns(
            name TEXT NOT NULL,
            role TEXT NOT NULL,
            position INTEGER NOT NULL
        );
        CREATE TABLE IF NOT EXISTS \"Config\"(
            parameter TEXT NOT NULL,
            value TEXT NOT NULL
        );
        COMMIT;",
    )
    .map_err(|err| store_error("store-schema", path, err))?;
    let existing = read_version(conn, path)?;
    match existing {
        Some(version) if version == STORE_VERSION => Ok(()),
        Some(version) => Err(version_mismatch(path, version)),
        None => {
            conn.execute("INSERT INTO meta(version) VALUES (?)", params![STORE_VERSION])
                .map_err(|err| store_error("store-schema", path, err))?;
            Ok(())
        }
    }
}

fn check_version(conn: &Connection, path: &Path) -> Result<(), LtError> {
    match read_version(conn, path)? {
        Some(version) if version == STORE_VERSION => Ok(()),
        Some(version) => Err(version_mismatch(path, version)),
        None => Err(store_error("store-schema", path, "store has no version")),
    }
}

fn read_version(conn: &Connection, path: &Path) -> Result<Option<i64>, LtError> {
    conn.query_row("SELECT version FROM meta LIMIT 1", [], |row| row.get(0))
        .optional()
        .map_err(|err| store_error("store-schema", path, err))
}

fn version_mismatch(path: &Path, version: i64) -> LtError {
    store_error(
        "store-schema",
        path,
        format!("store schema {version} incompatible with expected {STORE_VERSION}"),
    )
}

fn open_read_only(path: &Path) -> Result<Connection, LtError> {
    Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .map_err(|err| store_error("store-open", path, err))
}

fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

fn store_error(code: &str, path: &Path, err: impl ToString) -> LtError {
    LtError::Store(
        ErrorInfo::new(code, err.to_string()).with_context("path", path.display().to_string()),
    )
}
