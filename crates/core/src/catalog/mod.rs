pub mod schema;

use std::collections::BTreeMap;
use std::path::Path;

use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, OpenFlags, Row};
use tracing::{debug, info};

use crate::dataset::Dataset;
use crate::domain::*;
use crate::error::{Error, Result};
use crate::query::ResolvedQuery;

const FILE_COLUMNS: &str = "f.id, f.client_id, f.path, f.cls, f.quality, f.instrument, f.rotate";

/// SQLite-backed catalog of clients, their fold assignments and files.
///
/// The tables are written once when the catalog is created and only read
/// afterwards.
pub struct Catalog {
    conn: Connection,
}

impl Catalog {
    /// Build a catalog file from the built-in dataset tables.
    ///
    /// An existing catalog is reused unless `recreate` is set.
    pub fn create(path: &Path, recreate: bool) -> Result<Self> {
        if path.exists() {
            if !recreate {
                return Self::open(path);
            }
            info!(path = %path.display(), "removing existing catalog");
            std::fs::remove_file(path)?;
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut conn = Connection::open(path)?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        schema::initialize(&conn)?;
        populate(&mut conn, &Dataset::builtin()?)?;
        info!(path = %path.display(), "catalog created");
        Ok(Self { conn })
    }

    /// Open an existing catalog read-only.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::CatalogUnavailable(format!("{} does not exist", path.display())));
        }
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        schema::check(&conn, &path.display().to_string())?;
        debug!(path = %path.display(), "catalog opened");
        Ok(Self { conn })
    }

    /// In-memory catalog populated from the built-in tables.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_dataset(&Dataset::builtin()?)
    }

    /// In-memory catalog populated from arbitrary tables.
    pub fn from_dataset(dataset: &Dataset) -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        schema::initialize(&conn)?;
        populate(&mut conn, dataset)?;
        Ok(Self { conn })
    }

    // ── Clients ──────────────────────────────────────────────────────

    pub fn clients(&self) -> Result<Vec<Client>> {
        let mut stmt = self.conn.prepare(
            "SELECT c.id, cf.fold, cf.grp
             FROM clients c
             JOIN client_folds cf ON cf.client_id = c.id
             ORDER BY c.id, cf.fold",
        )?;
        let rows = stmt
            .query_map([], |row| {
                let fold: u8 = row.get(1)?;
                let fold = Fold::ALL
                    .get(fold as usize)
                    .copied()
                    .ok_or_else(|| conversion_error(1, format!("fold {fold} out of range")))?;
                Ok((ClientId(row.get(0)?), fold, choice::<Group>(row, 2)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut clients: BTreeMap<ClientId, Client> = BTreeMap::new();
        for (id, fold, group) in rows {
            clients
                .entry(id)
                .or_insert_with(|| Client {
                    id,
                    groups: BTreeMap::new(),
                })
                .groups
                .insert(fold, group);
        }
        Ok(clients.into_values().collect())
    }

    pub fn client_ids(&self) -> Result<Vec<ClientId>> {
        let mut stmt = self.conn.prepare("SELECT id FROM clients ORDER BY id")?;
        let ids = stmt
            .query_map([], |row| Ok(ClientId(row.get(0)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    // ── Files ────────────────────────────────────────────────────────

    pub fn files(&self) -> Result<Vec<FileRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {FILE_COLUMNS} FROM files f ORDER BY f.id"))?;
        let files = stmt
            .query_map([], file_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(files)
    }

    pub fn file(&self, id: i64) -> Result<Option<FileRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {FILE_COLUMNS} FROM files f WHERE f.id = ?1"))?;
        let mut rows = stmt.query_map(params![id], file_from_row)?;
        let file = rows.next().transpose()?;
        Ok(file)
    }

    pub fn count_files(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM files", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Look up file ids by stem. Unknown stems are skipped; the result
    /// follows the order of `stems`.
    pub fn reverse(&self, stems: &[&str]) -> Result<Vec<i64>> {
        let mut stmt = self.conn.prepare("SELECT id FROM files WHERE path = ?1")?;
        let mut ids = Vec::new();
        for stem in stems {
            let found: Option<i64> = stmt
                .query_map(params![stem], |row| row.get(0))?
                .next()
                .transpose()?;
            ids.extend(found);
        }
        Ok(ids)
    }

    /// Join files against the fold's group assignment and apply every
    /// criterion. Real recordings come first, then ascending client id.
    pub fn find_files(&self, query: &ResolvedQuery) -> Result<Vec<FileRecord>> {
        let mut values: Vec<Value> = vec![Value::Integer(query.fold.number() as i64)];
        let mut clauses = vec!["cf.fold = ?1".to_string()];

        if !query.ids.is_empty() {
            let ids: Vec<Value> = query.ids.iter().map(|id| Value::Integer(id.0 as i64)).collect();
            clauses.push(in_clause("f.client_id", ids, &mut values));
        }
        clauses.push(in_clause("cf.grp", text_values(&query.groups), &mut values));
        clauses.push(in_clause("f.cls", text_values(&query.classes), &mut values));
        clauses.push(in_clause("f.quality", text_values(&query.qualities), &mut values));
        clauses.push(in_clause("f.instrument", text_values(&query.instruments), &mut values));

        let sql = format!(
            "SELECT {FILE_COLUMNS}
             FROM files f
             JOIN client_folds cf ON cf.client_id = f.client_id
             WHERE {}
             ORDER BY CASE f.cls WHEN 'real' THEN 0 ELSE 1 END, f.client_id, f.id",
            clauses.join(" AND ")
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let files = stmt
            .query_map(params_from_iter(values), file_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        debug!(count = files.len(), fold = %query.fold, "files matched");
        Ok(files)
    }

    // ── Metadata ─────────────────────────────────────────────────────

    pub fn get_meta(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM metadata WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .ok();
        Ok(value)
    }
}

fn populate(conn: &mut Connection, dataset: &Dataset) -> Result<()> {
    let tx = conn.transaction()?;
    {
        let mut insert_client = tx.prepare("INSERT INTO clients (id) VALUES (?1)")?;
        let mut insert_fold =
            tx.prepare("INSERT INTO client_folds (client_id, fold, grp) VALUES (?1, ?2, ?3)")?;
        for client in &dataset.clients {
            insert_client.execute(params![client.id.0])?;
            for (fold, group) in &client.groups {
                insert_fold.execute(params![client.id.0, fold.number(), group.as_str()])?;
            }
        }

        let mut insert_file = tx.prepare(
            "INSERT INTO files (id, client_id, path, cls, quality, instrument, rotate)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;
        for f in &dataset.files {
            insert_file.execute(params![
                f.id,
                f.client_id.0,
                f.path,
                f.class.as_str(),
                f.quality.as_str(),
                f.instrument.as_str(),
                f.rotate,
            ])?;
        }
    }
    tx.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES ('version', ?1)",
        params![schema::SCHEMA_VERSION.to_string()],
    )?;
    tx.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES ('created_at', ?1)",
        params![chrono::Utc::now().to_rfc3339()],
    )?;
    tx.commit()?;
    Ok(())
}

fn in_clause(column: &str, items: Vec<Value>, values: &mut Vec<Value>) -> String {
    if items.is_empty() {
        return "0".to_string();
    }
    let start = values.len();
    let placeholders: Vec<String> = (0..items.len()).map(|i| format!("?{}", start + i + 1)).collect();
    values.extend(items);
    format!("{column} IN ({})", placeholders.join(", "))
}

fn text_values<T: Choice>(items: &[T]) -> Vec<Value> {
    items.iter().map(|c| Value::Text(c.as_str().to_string())).collect()
}

fn conversion_error(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, message.into())
}

fn choice<T: Choice>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let token: String = row.get(idx)?;
    T::from_token(&token).ok_or_else(|| conversion_error(idx, format!("unknown {} \"{token}\"", T::PARAM)))
}

fn file_from_row(row: &Row<'_>) -> rusqlite::Result<FileRecord> {
    Ok(FileRecord {
        id: row.get(0)?,
        client_id: ClientId(row.get(1)?),
        path: row.get(2)?,
        class: choice(row, 3)?,
        quality: choice(row, 4)?,
        instrument: choice(row, 5)?,
        rotate: row.get(6)?,
    })
}
