use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;
use mfsd_core::domain::FileRecord;
use mfsd_core::filter::Filter;
use mfsd_core::query::RawQuery;
use mfsd_core::Database;

/// Criteria shared by `dumplist` and `checkfiles`. Repeat a flag to select
/// several values.
#[derive(Args, Debug, Default, Clone)]
pub struct FilterArgs {
    /// Restrict to a presentation class (real, attack)
    #[arg(short = 'c', long = "class")]
    pub classes: Vec<String>,

    /// Cross-validation fold, 0 for the original split (defaults to 1)
    #[arg(short = 'f', long)]
    pub fold: Option<String>,

    /// Restrict to a group (train, devel, test)
    #[arg(short = 'g', long = "group")]
    pub groups: Vec<String>,

    /// Restrict to a capture quality (laptop, mobile)
    #[arg(short = 'q', long = "quality")]
    pub qualities: Vec<String>,

    /// Restrict to an attack instrument (video_hd, video_mobile, print)
    #[arg(short = 't', long = "type")]
    pub instruments: Vec<String>,

    /// Restrict to client ids
    #[arg(short = 'i', long = "id")]
    pub ids: Vec<String>,
}

impl FilterArgs {
    pub fn to_raw_query(&self) -> RawQuery {
        RawQuery {
            ids: self.ids.clone().into(),
            groups: self.groups.clone().into(),
            classes: self.classes.clone().into(),
            qualities: self.qualities.clone().into(),
            instruments: self.instruments.clone().into(),
            fold: self.fold.clone().map_or(Filter::Unset, Filter::One),
        }
    }
}

#[derive(Args, Debug, Default, Clone)]
pub struct ListArgs {
    /// Prepended to every path
    #[arg(short = 'd', long, env = "MFSD_DIRECTORY")]
    pub directory: Option<PathBuf>,

    /// Appended to every path
    #[arg(short = 'e', long)]
    pub extension: Option<String>,

    /// Print the matching records as JSON instead of paths
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub filter: FilterArgs,
}

impl ListArgs {
    pub fn path_of(&self, file: &FileRecord) -> PathBuf {
        file.make_path(self.directory.as_deref(), self.extension.as_deref())
    }

    pub fn directory_display(&self) -> String {
        self.directory
            .as_deref()
            .map(Path::display)
            .map(|d| d.to_string())
            .unwrap_or_default()
    }
}

pub fn run(db: &Database, args: &ListArgs) -> Result<()> {
    let files = db.objects_raw(args.filter.to_raw_query())?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&files)?);
        return Ok(());
    }

    for file in &files {
        println!("{}", args.path_of(file).display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mfsd_core::config::DatabaseOptions;

    #[test]
    fn test_empty_flags_leave_query_unset() {
        let raw = FilterArgs::default().to_raw_query();
        assert!(raw.groups.is_unset());
        assert!(raw.ids.is_unset());
        assert_eq!(raw.fold, Filter::Unset);
    }

    #[test]
    fn test_flags_become_query() {
        let args = FilterArgs {
            groups: vec!["devel".into()],
            classes: vec!["attack".into()],
            fold: Some("1".into()),
            ..FilterArgs::default()
        };
        let db = Database::open_in_memory(DatabaseOptions::default()).unwrap();
        let files = db.objects_raw(args.to_raw_query()).unwrap();
        assert_eq!(files.len(), 60);
    }

    #[test]
    fn test_path_of_uses_directory_and_extension() {
        let db = Database::open_in_memory(DatabaseOptions::default()).unwrap();
        let file = db.file(1).unwrap().unwrap();
        let args = ListArgs {
            directory: Some(PathBuf::from("/data/mfsd")),
            extension: Some(".mov".into()),
            ..ListArgs::default()
        };
        assert_eq!(
            args.path_of(&file),
            PathBuf::from("/data/mfsd/real/real_client001_laptop_SD_scene01.mov")
        );
        assert_eq!(args.directory_display(), "/data/mfsd");
    }
}
