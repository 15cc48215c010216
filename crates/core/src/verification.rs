//! Enrollment/probe view of the catalog for vulnerability analysis.
//!
//! Laptop recordings of genuine users enroll a model. Under
//! `grandtest-licit` the probes are the mobile recordings of every genuine
//! user; under `grandtest-spoof` they are the attacks. Each video is
//! expanded into a fixed set of evenly spaced frames.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::config::VerificationOptions;
use crate::domain::{display_as_str, Choice, ClientId, FileRecord, Fold, Group, Instrument, PresentationClass, Quality};
use crate::error::{Error, Result};
use crate::filter::{self, scalar_filter, Filter};
use crate::query::Query;
use crate::Database;

/// Frame count every recording of the dataset is guaranteed to have.
pub const FRAMES_PER_VIDEO: usize = 180;

/// Evenly spread `desired` indices over `0..total`.
///
/// Asking for nothing, or for at least `total`, yields every index.
pub fn selected_indices(total: usize, desired: Option<usize>) -> Vec<usize> {
    match desired {
        Some(k) if k > 0 && k < total => (0..k)
            .map(|i| ((i as f64 + 0.5) * total as f64 / k as f64) as usize)
            .collect(),
        _ => (0..total).collect(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Protocol {
    GrandtestLicit,
    GrandtestSpoof,
}

impl Protocol {
    pub fn is_licit(&self) -> bool {
        *self == Protocol::GrandtestLicit
    }
}

impl Choice for Protocol {
    const PARAM: &'static str = "protocol";
    const ALL: &'static [Self] = &[Protocol::GrandtestLicit, Protocol::GrandtestSpoof];

    fn as_str(&self) -> &'static str {
        match self {
            Protocol::GrandtestLicit => "grandtest-licit",
            Protocol::GrandtestSpoof => "grandtest-spoof",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Purpose {
    Enroll,
    Probe,
}

impl Choice for Purpose {
    const PARAM: &'static str = "purpose";
    const ALL: &'static [Self] = &[Purpose::Enroll, Purpose::Probe];

    fn as_str(&self) -> &'static str {
        match self {
            Purpose::Enroll => "enroll",
            Purpose::Probe => "probe",
        }
    }
}

/// Group names of the verification view; each maps to one catalog group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ProtocolGroup {
    World,
    Dev,
    Eval,
}

impl ProtocolGroup {
    pub fn to_low_level(self) -> Group {
        match self {
            ProtocolGroup::World => Group::Train,
            ProtocolGroup::Dev => Group::Devel,
            ProtocolGroup::Eval => Group::Test,
        }
    }

    pub fn from_low_level(group: Group) -> Self {
        match group {
            Group::Train => ProtocolGroup::World,
            Group::Devel => ProtocolGroup::Dev,
            Group::Test => ProtocolGroup::Eval,
        }
    }
}

impl Choice for ProtocolGroup {
    const PARAM: &'static str = "group";
    const ALL: &'static [Self] = &[ProtocolGroup::World, ProtocolGroup::Dev, ProtocolGroup::Eval];

    fn as_str(&self) -> &'static str {
        match self {
            ProtocolGroup::World => "world",
            ProtocolGroup::Dev => "dev",
            ProtocolGroup::Eval => "eval",
        }
    }
}

display_as_str!(Protocol, Purpose, ProtocolGroup);
scalar_filter!(Protocol, Purpose, ProtocolGroup);

/// Who a verification sample claims to be.
///
/// Attacks are grouped by instrument rather than by the genuine user they
/// were produced from, so an attack never matches an enrolled identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Identity {
    Client(ClientId),
    Attack(Instrument),
}

impl Identity {
    pub fn of(record: &FileRecord) -> Self {
        match record.class {
            PresentationClass::Real => Identity::Client(record.client_id),
            PresentationClass::Attack => Identity::Attack(record.instrument),
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identity::Client(id) => write!(f, "{id}"),
            Identity::Attack(instrument) => write!(f, "attack/{instrument}"),
        }
    }
}

/// One frame of a catalog recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationFile {
    record: Arc<FileRecord>,
    pub frame: usize,
    pub identity: Identity,
    /// `<stem>_<frame, three digits>`
    pub path: String,
    /// `<record id>_<frame>`
    pub file_id: String,
}

impl VerificationFile {
    pub fn new(record: Arc<FileRecord>, frame: usize) -> Self {
        Self {
            path: format!("{}_{frame:03}", record.path),
            file_id: format!("{}_{frame}", record.id),
            identity: Identity::of(&record),
            frame,
            record,
        }
    }

    pub fn record(&self) -> &FileRecord {
        &self.record
    }

    pub fn client_id(&self) -> String {
        self.identity.to_string()
    }

    pub fn make_path(&self, directory: Option<&Path>, extension: Option<&str>) -> PathBuf {
        let file = format!("{}{}", self.path, extension.unwrap_or(""));
        match directory {
            Some(dir) => dir.join(file),
            None => PathBuf::from(file),
        }
    }
}

/// Criteria of [`VerificationDatabase::objects`].
#[derive(Debug, Clone, Default)]
pub struct VerificationQuery {
    pub groups: Filter<ProtocolGroup>,
    pub protocol: Filter<Protocol>,
    pub purposes: Filter<Purpose>,
    pub model_ids: Filter<ClientId>,
    pub fold: Filter<Fold>,
}

impl VerificationQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn groups(mut self, groups: impl Into<Filter<ProtocolGroup>>) -> Self {
        self.groups = groups.into();
        self
    }

    pub fn protocol(mut self, protocol: impl Into<Filter<Protocol>>) -> Self {
        self.protocol = protocol.into();
        self
    }

    pub fn purposes(mut self, purposes: impl Into<Filter<Purpose>>) -> Self {
        self.purposes = purposes.into();
        self
    }

    pub fn model_ids(mut self, model_ids: impl Into<Filter<ClientId>>) -> Self {
        self.model_ids = model_ids.into();
        self
    }

    pub fn fold(mut self, fold: impl Into<Filter<Fold>>) -> Self {
        self.fold = fold.into();
        self
    }
}

pub struct VerificationDatabase {
    db: Database,
    options: VerificationOptions,
    indices: Vec<usize>,
}

impl VerificationDatabase {
    pub fn new(db: Database, options: VerificationOptions) -> Self {
        let indices = selected_indices(FRAMES_PER_VIDEO, Some(options.frames()));
        Self { db, options, indices }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn options(&self) -> &VerificationOptions {
        &self.options
    }

    /// Frame indices every recording expands into.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn protocol_names(&self) -> &'static [Protocol] {
        Protocol::ALL
    }

    pub fn groups(&self) -> Vec<ProtocolGroup> {
        self.db
            .groups()
            .iter()
            .copied()
            .map(ProtocolGroup::from_low_level)
            .collect()
    }

    /// Frame-level samples for the requested groups, protocol and purposes.
    ///
    /// Purpose criteria accumulate in enroll, probe order: a spoof probe
    /// lifts the quality restriction for the whole request, and a licit
    /// probe drops `model_ids`.
    pub fn objects(&self, query: &VerificationQuery) -> Result<Vec<VerificationFile>> {
        let protocol = filter::validate_single(
            Protocol::PARAM,
            query.protocol.clone(),
            Protocol::ALL,
            Protocol::GrandtestLicit,
        )?;
        let groups = filter::validate(ProtocolGroup::PARAM, query.groups.clone(), ProtocolGroup::ALL, ProtocolGroup::ALL)?;
        let purposes: BTreeSet<Purpose> =
            filter::validate(Purpose::PARAM, query.purposes.clone(), Purpose::ALL, Purpose::ALL)?
                .into_iter()
                .collect();

        let mut model_ids = query.model_ids.clone();
        if purposes.len() > 1 && !model_ids.is_unset() {
            return Err(Error::UnsupportedQueryCombination(
                "enroll and probe cannot be requested together for specific models; ask for one purpose".into(),
            ));
        }

        let mut qualities: Option<Vec<Quality>> = Some(Vec::new());
        let mut classes: Vec<PresentationClass> = Vec::new();
        if purposes.contains(&Purpose::Enroll) {
            if let Some(q) = qualities.as_mut() {
                q.push(Quality::Laptop);
            }
            classes.push(PresentationClass::Real);
        }
        if purposes.contains(&Purpose::Probe) {
            if protocol.is_licit() {
                if let Some(q) = qualities.as_mut() {
                    q.push(Quality::Mobile);
                }
                classes.push(PresentationClass::Real);
                model_ids = Filter::Unset;
            } else {
                qualities = None;
                classes.push(PresentationClass::Attack);
            }
        }

        let low_level: Vec<Group> = groups.iter().map(|g| g.to_low_level()).collect();
        let base = Query::new()
            .ids(model_ids)
            .groups(low_level)
            .classes(classes)
            .qualities(qualities)
            .fold(query.fold.clone());
        let records = self.db.objects(&base)?;

        let files: Vec<VerificationFile> = records
            .into_iter()
            .map(Arc::new)
            .flat_map(|record| {
                self.indices
                    .iter()
                    .map(move |&frame| VerificationFile::new(Arc::clone(&record), frame))
            })
            .collect();
        debug!(%protocol, records = files.len() / self.indices.len().max(1), frames = files.len(), "verification objects");
        Ok(files)
    }

    /// Sorted identities that have enrollment data under `protocol` in the
    /// given fold.
    pub fn model_ids_with_protocol(
        &self,
        groups: impl Into<Filter<ProtocolGroup>>,
        protocol: impl Into<Filter<Protocol>>,
        fold: impl Into<Filter<Fold>>,
    ) -> Result<Vec<Identity>> {
        let query = VerificationQuery::new()
            .groups(groups)
            .protocol(protocol)
            .fold(fold)
            .purposes(Purpose::Enroll);
        let ids: BTreeSet<Identity> = self.objects(&query)?.into_iter().map(|f| f.identity).collect();
        Ok(ids.into_iter().collect())
    }
}
