use anyhow::Result;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use mfsd_core::domain::{Choice, Fold, Group};
use mfsd_core::query::Query;
use mfsd_core::Database;

/// Clients and files of one (fold, group) cell.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct CellCounts {
    pub(crate) clients: usize,
    pub(crate) files: usize,
}

pub(crate) fn format_cell(counts: &CellCounts) -> String {
    if counts.clients == 0 {
        "-".to_string()
    } else {
        format!("{} / {}", counts.clients, counts.files)
    }
}

pub(crate) fn count(db: &Database, fold: Fold, group: Group) -> Result<CellCounts> {
    let clients = db
        .clients()?
        .iter()
        .filter(|c| c.group(fold) == Some(group))
        .count();
    let files = db.objects(&Query::new().fold(fold).groups(group))?.len();
    Ok(CellCounts { clients, files })
}

pub fn run(db: &Database) -> Result<()> {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    let mut header = vec![Cell::new("Fold")];
    header.extend(Group::ALL.iter().map(|g| Cell::new(g.as_str())));
    table.set_header(header);

    for fold in db.folds() {
        let label = if fold.is_original() {
            format!("{fold} (original)")
        } else {
            fold.to_string()
        };
        let mut row = vec![Cell::new(label)];
        for group in db.groups() {
            row.push(Cell::new(format_cell(&count(db, *fold, *group)?)));
        }
        table.add_row(row);
    }

    println!();
    println!("  Clients / files per group");
    println!("  -------------------------");
    println!("{table}");
    println!();
    println!(
        "  {} clients, {} files",
        db.client_ids()?.len(),
        db.catalog().count_files()?
    );
    if let Some(created) = db.catalog().get_meta("created_at")? {
        println!("  catalog built {created}");
    }
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mfsd_core::config::DatabaseOptions;

    #[test]
    fn test_format_cell() {
        assert_eq!(format_cell(&CellCounts { clients: 10, files: 80 }), "10 / 80");
        assert_eq!(format_cell(&CellCounts::default()), "-");
    }

    #[test]
    fn test_counts_per_fold() {
        let db = Database::open_in_memory(DatabaseOptions::default()).unwrap();
        let test = count(&db, Fold::default(), Group::Test).unwrap();
        assert_eq!(test, CellCounts { clients: 15, files: 120 });

        let devel = count(&db, Fold::ORIGINAL, Group::Devel).unwrap();
        assert_eq!(devel, CellCounts::default());
    }
}
