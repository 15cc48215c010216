use std::path::PathBuf;

use anyhow::Result;
use mfsd_core::Database;
use tracing::debug;

use super::dumplist::ListArgs;

pub fn run(db: &Database, args: &ListArgs) -> Result<()> {
    let files = db.objects_raw(args.filter.to_raw_query())?;
    let paths: Vec<PathBuf> = files.iter().map(|f| args.path_of(f)).collect();
    let missing = missing_paths(&paths);
    debug!(checked = paths.len(), missing = missing.len(), "file check done");

    for path in &missing {
        println!("Cannot find file \"{}\"", path.display());
    }
    if missing.is_empty() {
        println!("All {} files found", files.len());
    } else {
        println!(
            "{} files (out of {}) were not found at \"{}\"",
            missing.len(),
            files.len(),
            args.directory_display()
        );
    }
    Ok(())
}

fn missing_paths(paths: &[PathBuf]) -> Vec<&PathBuf> {
    paths.iter().filter(|p| !p.exists()).collect()
}
