//! Real/attack splits for training and evaluating presentation-attack
//! detectors.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::domain::{Choice, ClientId, FileRecord, Fold, Group, Instrument, PresentationClass, Quality};
use crate::error::Result;
use crate::query::Query;
use crate::Database;

/// Genuine and attack recordings of one group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SplitData {
    pub real: Vec<FileRecord>,
    pub attack: Vec<FileRecord>,
}

impl SplitData {
    pub fn len(&self) -> usize {
        self.real.len() + self.attack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// How [`SpoofingProtocol::filtered`] partitions a split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitFilter {
    /// One entry per attack instrument; every entry keeps all real data.
    Instruments,
    /// One entry per quality, applied to both sides.
    Qualities,
}

/// A fold of the dataset restricted to a set of attack instruments and
/// capture qualities.
pub struct SpoofingProtocol<'a> {
    db: &'a Database,
    fold: Fold,
    instruments: Vec<Instrument>,
    qualities: Vec<Quality>,
}

impl<'a> SpoofingProtocol<'a> {
    pub fn new(db: &'a Database, fold: Fold) -> Self {
        Self {
            db,
            fold,
            instruments: Instrument::ATTACKS.to_vec(),
            qualities: Quality::ALL.to_vec(),
        }
    }

    /// Keep only these instruments; an empty list keeps all of them.
    pub fn with_instruments(mut self, instruments: Vec<Instrument>) -> Self {
        if !instruments.is_empty() {
            self.instruments = instruments;
        }
        self
    }

    /// Keep only these qualities; an empty list keeps all of them.
    pub fn with_qualities(mut self, qualities: Vec<Quality>) -> Self {
        if !qualities.is_empty() {
            self.qualities = qualities;
        }
        self
    }

    pub fn fold(&self) -> Fold {
        self.fold
    }

    pub fn attack_types(&self) -> &[Instrument] {
        &self.instruments
    }

    /// Real and attack data of `group`.
    ///
    /// With `enroll_quality` set, real recordings of that quality are left
    /// out since they are reserved for enrollment. Attacks are unaffected.
    pub fn data(&self, group: Group, enroll_quality: Option<Quality>) -> Result<SplitData> {
        let attack = self.db.objects(
            &self
                .base(group)
                .classes(PresentationClass::Attack)
                .instruments(self.instruments.clone())
                .qualities(self.qualities.clone()),
        )?;

        let real_qualities: Vec<Quality> = self
            .qualities
            .iter()
            .copied()
            .filter(|q| Some(*q) != enroll_quality)
            .collect();
        let real = if real_qualities.is_empty() {
            Vec::new()
        } else {
            self.db
                .objects(&self.base(group).classes(PresentationClass::Real).qualities(real_qualities))?
        };

        Ok(SplitData { real, attack })
    }

    pub fn train_data(&self, enroll_quality: Option<Quality>) -> Result<SplitData> {
        self.data(Group::Train, enroll_quality)
    }

    pub fn devel_data(&self, enroll_quality: Option<Quality>) -> Result<SplitData> {
        self.data(Group::Devel, enroll_quality)
    }

    pub fn test_data(&self, enroll_quality: Option<Quality>) -> Result<SplitData> {
        self.data(Group::Test, enroll_quality)
    }

    /// Real recordings of `group` captured with `enroll_quality`.
    pub fn enroll_data(&self, group: Group, enroll_quality: Quality) -> Result<Vec<FileRecord>> {
        self.db.objects(
            &self
                .base(group)
                .classes(PresentationClass::Real)
                .qualities(enroll_quality),
        )
    }

    /// Every recording matching the instrument and quality restriction,
    /// regardless of group.
    pub fn all_data(&self) -> Result<SplitData> {
        let query = Query::new().fold(self.fold).qualities(self.qualities.clone());
        let real = self.db.objects(&query.clone().classes(PresentationClass::Real))?;
        let attack = self.db.objects(
            &query
                .classes(PresentationClass::Attack)
                .instruments(self.instruments.clone()),
        )?;
        Ok(SplitData { real, attack })
    }

    /// Partition the data of `group` by instrument or by quality.
    pub fn filtered(
        &self,
        group: Group,
        by: SplitFilter,
        enroll_quality: Option<Quality>,
    ) -> Result<BTreeMap<&'static str, SplitData>> {
        let split = self.data(group, enroll_quality)?;
        let mut out = BTreeMap::new();
        match by {
            SplitFilter::Instruments => {
                for instrument in Instrument::ATTACKS {
                    out.insert(
                        instrument.as_str(),
                        SplitData {
                            real: split.real.clone(),
                            attack: keep(&split.attack, |f| f.instrument == *instrument),
                        },
                    );
                }
            }
            SplitFilter::Qualities => {
                for quality in Quality::ALL {
                    out.insert(
                        quality.as_str(),
                        SplitData {
                            real: keep(&split.real, |f| f.quality == *quality),
                            attack: keep(&split.attack, |f| f.quality == *quality),
                        },
                    );
                }
            }
        }
        Ok(out)
    }

    /// Distinct clients with real data in `group`, or in any group.
    pub fn clients(&self, group: Option<Group>) -> Result<Vec<ClientId>> {
        let groups = match group {
            Some(g) => vec![g],
            None => Group::ALL.to_vec(),
        };
        let mut ids = BTreeSet::new();
        for g in groups {
            ids.extend(self.data(g, None)?.real.iter().map(|f| f.client_id));
        }
        Ok(ids.into_iter().collect())
    }

    fn base(&self, group: Group) -> Query {
        Query::new().fold(self.fold).groups(group)
    }
}

fn keep(files: &[FileRecord], pred: impl Fn(&FileRecord) -> bool) -> Vec<FileRecord> {
    files.iter().filter(|f| pred(f)).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseOptions;

    fn db() -> Database {
        Database::open_in_memory(DatabaseOptions::default()).unwrap()
    }

    #[test]
    fn test_train_split_counts() {
        let db = db();
        let proto = SpoofingProtocol::new(&db, Fold::default());
        let train = proto.train_data(None).unwrap();
        assert_eq!(train.real.len(), 20);
        assert_eq!(train.attack.len(), 60);
    }

    #[test]
    fn test_enroll_quality_is_excluded_from_real() {
        let db = db();
        let proto = SpoofingProtocol::new(&db, Fold::default());
        let test = proto.test_data(Some(Quality::Laptop)).unwrap();
        assert_eq!(test.real.len(), 15);
        assert!(test.real.iter().all(|f| f.quality == Quality::Mobile));
        assert_eq!(test.attack.len(), 90);

        let enroll = proto.enroll_data(Group::Test, Quality::Laptop).unwrap();
        assert_eq!(enroll.len(), 15);
    }

    #[test]
    fn test_excluding_only_quality_leaves_no_real() {
        let db = db();
        let proto = SpoofingProtocol::new(&db, Fold::default()).with_qualities(vec![Quality::Mobile]);
        let devel = proto.devel_data(Some(Quality::Mobile)).unwrap();
        assert!(devel.real.is_empty());
        assert_eq!(devel.attack.len(), 30);
    }

    #[test]
    fn test_instrument_restriction() {
        let db = db();
        let proto = SpoofingProtocol::new(&db, Fold::default()).with_instruments(vec![Instrument::Print]);
        let all = proto.all_data().unwrap();
        assert_eq!(all.real.len(), 70);
        assert_eq!(all.attack.len(), 70);
        assert!(all.attack.iter().all(|f| f.instrument == Instrument::Print));
    }

    #[test]
    fn test_filtered_by_instrument_and_quality() {
        let db = db();
        let proto = SpoofingProtocol::new(&db, Fold::default());
        let by_instrument = proto.filtered(Group::Test, SplitFilter::Instruments, None).unwrap();
        assert_eq!(by_instrument.len(), 3);
        assert_eq!(by_instrument["print"].real.len(), 30);
        assert_eq!(by_instrument["print"].attack.len(), 30);

        let by_quality = proto.filtered(Group::Test, SplitFilter::Qualities, None).unwrap();
        assert_eq!(by_quality["mobile"].real.len(), 15);
        assert_eq!(by_quality["mobile"].attack.len(), 45);
    }

    #[test]
    fn test_clients_per_group() {
        let db = db();
        let proto = SpoofingProtocol::new(&db, Fold::default());
        assert_eq!(proto.clients(Some(Group::Devel)).unwrap().len(), 10);
        assert_eq!(proto.clients(Some(Group::Test)).unwrap().len(), 15);
        assert_eq!(proto.clients(None).unwrap().len(), 35);
    }

    #[test]
    fn test_original_fold_has_no_devel() {
        let db = db();
        let proto = SpoofingProtocol::new(&db, Fold::ORIGINAL);
        assert!(proto.devel_data(None).unwrap().is_empty());
        assert_eq!(proto.train_data(None).unwrap().real.len(), 30);
    }
}
