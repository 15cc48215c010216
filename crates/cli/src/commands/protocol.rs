use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::Args;
use mfsd_core::config::VerificationOptions;
use mfsd_core::domain::{ClientId, Fold};
use mfsd_core::filter::{self, Filter};
use mfsd_core::verification::{Protocol, ProtocolGroup, Purpose, VerificationDatabase, VerificationQuery};
use mfsd_core::Database;
use tracing::debug;

#[derive(Args, Debug, Clone)]
pub struct ModelsArgs {
    /// grandtest-licit or grandtest-spoof
    #[arg(short = 'p', long, default_value = "grandtest-licit")]
    pub protocol: String,

    /// Restrict to a group (world, dev, eval)
    #[arg(short = 'g', long = "group")]
    pub groups: Vec<String>,

    /// Cross-validation fold (defaults to 1)
    #[arg(short = 'f', long)]
    pub fold: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ProtocolArgs {
    #[command(flatten)]
    pub base: ModelsArgs,

    /// Restrict to a purpose (enroll, probe)
    #[arg(short = 'u', long = "purpose")]
    pub purposes: Vec<String>,

    /// Restrict to model (client) ids; needs a single purpose
    #[arg(short = 'm', long = "model")]
    pub models: Vec<String>,

    /// Frames sampled per video, 0 for the default
    #[arg(long, default_value_t = 10)]
    pub frames: usize,

    /// Prepended to every path
    #[arg(short = 'd', long, env = "MFSD_DIRECTORY")]
    pub directory: Option<PathBuf>,

    /// Appended to every path
    #[arg(short = 'e', long)]
    pub extension: Option<String>,
}

impl ModelsArgs {
    fn to_query(&self) -> Result<VerificationQuery> {
        Ok(VerificationQuery::new()
            .protocol(filter::parse::<Protocol>(Filter::One(self.protocol.clone()))?)
            .groups(filter::parse::<ProtocolGroup>(self.groups.clone().into())?)
            .fold(filter::parse::<Fold>(self.fold.clone().map_or(Filter::Unset, Filter::One))?))
    }
}

impl ProtocolArgs {
    fn to_query(&self) -> Result<VerificationQuery> {
        let models = self
            .models
            .iter()
            .map(|m| m.parse::<ClientId>().map_err(|_| anyhow!("invalid model id \"{m}\"")))
            .collect::<Result<Vec<_>>>()?;
        Ok(self
            .base
            .to_query()?
            .purposes(filter::parse::<Purpose>(self.purposes.clone().into())?)
            .model_ids(models))
    }
}

pub fn run(db: Database, args: &ProtocolArgs) -> Result<()> {
    let vdb = VerificationDatabase::new(db, VerificationOptions::with_frames(args.frames));
    let files = vdb.objects(&args.to_query()?)?;
    debug!(samples = files.len(), "protocol listing");
    for file in &files {
        println!(
            "{}\t{}",
            file.client_id(),
            file.make_path(args.directory.as_deref(), args.extension.as_deref()).display()
        );
    }
    Ok(())
}

pub fn models(db: Database, args: &ModelsArgs) -> Result<()> {
    let vdb = VerificationDatabase::new(db, VerificationOptions::default());
    let query = args.to_query()?;
    let ids = vdb.model_ids_with_protocol(query.groups, query.protocol, query.fold)?;
    debug!(models = ids.len(), "enrolled identities");
    for id in ids {
        println!("{id}");
    }
    Ok(())
}
