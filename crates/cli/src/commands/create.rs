use std::path::Path;

use anyhow::Result;
use mfsd_core::config::DatabaseOptions;
use mfsd_core::Database;

pub fn run(catalog: &Path, recreate: bool) -> Result<()> {
    let db = Database::create(catalog, recreate, DatabaseOptions::default())?;
    let clients = db.client_ids()?.len();
    let files = db.catalog().count_files()?;
    println!(
        "Catalog ready: {} ({} clients, {} files)",
        catalog.display(),
        clients,
        files
    );
    Ok(())
}
