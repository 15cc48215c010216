pub mod antispoof;
pub mod catalog;
pub mod config;
pub mod dataset;
pub mod domain;
pub mod error;
pub mod filter;
pub mod query;
pub mod verification;

use std::path::{Path, PathBuf};

use catalog::Catalog;
use config::DatabaseOptions;
use domain::*;
use error::Result;
use query::{Query, RawQuery};

/// The main entry point: a read-only view over a populated catalog.
pub struct Database {
    catalog: Catalog,
    options: DatabaseOptions,
}

impl Database {
    /// Build (or reuse) a catalog file and open it.
    pub fn create(catalog_path: &Path, recreate: bool, options: DatabaseOptions) -> Result<Self> {
        let catalog = Catalog::create(catalog_path, recreate)?;
        Ok(Self::from_catalog(catalog, options))
    }

    /// Open an existing catalog file.
    pub fn open(catalog_path: &Path, options: DatabaseOptions) -> Result<Self> {
        let catalog = Catalog::open(catalog_path)?;
        Ok(Self::from_catalog(catalog, options))
    }

    /// Catalog held in memory, built from the shipped tables.
    pub fn open_in_memory(options: DatabaseOptions) -> Result<Self> {
        Ok(Self::from_catalog(Catalog::open_in_memory()?, options))
    }

    pub fn from_catalog(catalog: Catalog, options: DatabaseOptions) -> Self {
        Self { catalog, options }
    }

    pub fn options(&self) -> &DatabaseOptions {
        &self.options
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Files matching `query`, real recordings first, then by client id.
    pub fn objects(&self, query: &Query) -> Result<Vec<FileRecord>> {
        let known = self.catalog.client_ids()?;
        let resolved = query.resolve(&known, self.options.fold)?;
        self.catalog.find_files(&resolved)
    }

    /// Same as [`Database::objects`] for untyped input.
    pub fn objects_raw(&self, raw: RawQuery) -> Result<Vec<FileRecord>> {
        self.objects(&raw.parse()?)
    }

    pub fn file(&self, id: i64) -> Result<Option<FileRecord>> {
        self.catalog.file(id)
    }

    /// File ids for the given stems; unknown stems are dropped.
    pub fn reverse(&self, paths: &[&str]) -> Result<Vec<i64>> {
        self.catalog.reverse(paths)
    }

    // ── Domains ──────────────────────────────────────────────────────

    pub fn clients(&self) -> Result<Vec<Client>> {
        self.catalog.clients()
    }

    pub fn client_ids(&self) -> Result<Vec<ClientId>> {
        self.catalog.client_ids()
    }

    pub fn groups(&self) -> &'static [Group] {
        Group::ALL
    }

    pub fn folds(&self) -> &'static [Fold] {
        Fold::ALL
    }

    pub fn qualities(&self) -> &'static [Quality] {
        Quality::ALL
    }

    pub fn attack_instruments(&self) -> &'static [Instrument] {
        Instrument::ATTACKS
    }

    pub fn presentation_classes(&self) -> &'static [PresentationClass] {
        PresentationClass::ALL
    }

    // ── Paths ────────────────────────────────────────────────────────

    /// Original recording under the configured directory and extension.
    /// Without a configured extension the device's container format is used.
    pub fn original_file(&self, file: &FileRecord) -> PathBuf {
        let extension = self
            .options
            .original_extension
            .as_deref()
            .unwrap_or_else(|| file.video_extension());
        file.make_path(self.options.original_directory.as_deref(), Some(extension))
    }

    pub fn face_file(&self, file: &FileRecord) -> PathBuf {
        file.face_file(&self.options.face_directory)
    }
}
