use rusqlite::{Connection, ErrorCode};

use crate::error::{Error, Result};

/// Bumped whenever the table layout changes.
pub const SCHEMA_VERSION: i64 = 1;

const REQUIRED_TABLES: [&str; 4] = ["clients", "client_folds", "files", "metadata"];

pub fn initialize(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS clients (
            id          INTEGER PRIMARY KEY
        );

        CREATE TABLE IF NOT EXISTS client_folds (
            client_id   INTEGER NOT NULL REFERENCES clients(id),
            fold        INTEGER NOT NULL CHECK (fold BETWEEN 0 AND 5),
            grp         TEXT NOT NULL CHECK (grp IN ('train', 'devel', 'test')),
            PRIMARY KEY (client_id, fold)
        );

        CREATE INDEX IF NOT EXISTS idx_client_folds_fold ON client_folds(fold, grp);

        CREATE TABLE IF NOT EXISTS files (
            id          INTEGER PRIMARY KEY,
            client_id   INTEGER NOT NULL REFERENCES clients(id),
            path        TEXT NOT NULL UNIQUE,
            cls         TEXT NOT NULL CHECK (cls IN ('real', 'attack')),
            quality     TEXT NOT NULL CHECK (quality IN ('laptop', 'mobile')),
            instrument  TEXT NOT NULL CHECK (instrument IN ('video_hd', 'video_mobile', 'print', 'none')),
            rotate      INTEGER NOT NULL DEFAULT 0,
            CHECK ((cls = 'real') = (instrument = 'none')),
            UNIQUE (client_id, cls, quality, instrument)
        );

        CREATE INDEX IF NOT EXISTS idx_files_client ON files(client_id);

        CREATE TABLE IF NOT EXISTS metadata (
            key   TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );
        ",
    )?;
    Ok(())
}

/// Verify that `conn` holds a populated catalog this build can read.
pub fn check(conn: &Connection, origin: &str) -> Result<()> {
    let present: i64 = match conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'
         AND name IN ('clients', 'client_folds', 'files', 'metadata')",
        [],
        |row| row.get(0),
    ) {
        Ok(n) => n,
        Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::NotADatabase => {
            return Err(Error::CatalogUnavailable(format!("{origin} is not a catalog")));
        }
        Err(e) => return Err(e.into()),
    };
    if present != REQUIRED_TABLES.len() as i64 {
        return Err(Error::CatalogUnavailable(format!("{origin} has no catalog tables")));
    }

    let version: Option<String> = conn
        .query_row("SELECT value FROM metadata WHERE key = 'version'", [], |row| row.get(0))
        .ok();
    match version.and_then(|v| v.parse::<i64>().ok()) {
        None => Err(Error::CatalogUnavailable(format!("{origin} was never populated"))),
        Some(v) if v > SCHEMA_VERSION => Err(Error::CatalogUnavailable(format!(
            "{origin} has schema version {v}, this build reads up to {SCHEMA_VERSION}"
        ))),
        Some(_) => Ok(()),
    }
}
