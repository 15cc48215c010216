//! Static definition tables of the dataset and the filename grammar used to
//! turn listing entries into file records.
//!
//! Listing entries look like
//! `./real/real_client001_android_SD_scene01.mp4` or
//! `./attack/attack_client006_laptop_SD_ipad_video_scene01.mov`.

use std::collections::{BTreeMap, HashSet};

use tracing::debug;

use crate::domain::{Choice, Client, ClientId, FileRecord, Fold, Group, Instrument, PresentationClass, Quality};
use crate::error::{Error, Result};

const FOLD_TABLES: [&str; 6] = [
    include_str!("../data/folds/fold0.txt"),
    include_str!("../data/folds/fold1.txt"),
    include_str!("../data/folds/fold2.txt"),
    include_str!("../data/folds/fold3.txt"),
    include_str!("../data/folds/fold4.txt"),
    include_str!("../data/folds/fold5.txt"),
];
const REAL_LISTING: &str = include_str!("../data/files/real.txt");
const ATTACK_LISTING: &str = include_str!("../data/files/attack.txt");
const ROTATED_LISTING: &str = include_str!("../data/rotated.txt");

/// Attributes carried by one listing entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub client_id: ClientId,
    pub stem: String,
    pub class: PresentationClass,
    pub quality: Quality,
    pub instrument: Instrument,
}

/// Fully materialized client and file tables.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub clients: Vec<Client>,
    pub files: Vec<FileRecord>,
}

impl Dataset {
    /// The tables shipped with the crate.
    pub fn builtin() -> Result<Self> {
        let folds: Vec<(Fold, &str)> = Fold::ALL.iter().copied().zip(FOLD_TABLES).collect();
        Self::from_sources(&folds, REAL_LISTING, ATTACK_LISTING, ROTATED_LISTING)
    }

    /// Build the tables from fold assignments, per-class listings and the
    /// rotation list. File ids are assigned in listing order, reals first.
    pub fn from_sources(folds: &[(Fold, &str)], real: &str, attack: &str, rotated: &str) -> Result<Self> {
        let mut assignments: BTreeMap<ClientId, BTreeMap<Fold, Group>> = BTreeMap::new();
        for (fold, text) in folds {
            for (client_id, group) in parse_fold_table(text)? {
                assignments.entry(client_id).or_default().insert(*fold, group);
            }
        }

        for (client_id, groups) in &assignments {
            if let Some((fold, _)) = folds.iter().find(|(f, _)| !groups.contains_key(f)) {
                return Err(Error::MalformedListing {
                    line: client_id.to_string(),
                    reason: format!("client missing from fold {fold} table"),
                });
            }
        }

        let rotated: HashSet<&str> = lines(rotated).collect();

        let mut files = Vec::new();
        for line in lines(real).chain(lines(attack)) {
            let entry = parse_listing_entry(line)?;
            if !assignments.contains_key(&entry.client_id) {
                return Err(Error::MalformedListing {
                    line: line.to_string(),
                    reason: format!("unknown client {}", entry.client_id),
                });
            }
            files.push(FileRecord {
                id: files.len() as i64 + 1,
                client_id: entry.client_id,
                rotate: rotated.contains(entry.stem.as_str()),
                path: entry.stem,
                class: entry.class,
                quality: entry.quality,
                instrument: entry.instrument,
            });
        }

        let clients: Vec<Client> = assignments
            .into_iter()
            .map(|(id, groups)| Client { id, groups })
            .collect();

        debug!(clients = clients.len(), files = files.len(), "dataset tables parsed");
        Ok(Self { clients, files })
    }
}

fn lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines().map(str::trim).filter(|l| !l.is_empty() && !l.starts_with('#'))
}

/// Parse a `<client id> <group>` table.
pub fn parse_fold_table(text: &str) -> Result<Vec<(ClientId, Group)>> {
    lines(text)
        .map(|line| {
            let malformed = |reason: &str| Error::MalformedListing {
                line: line.to_string(),
                reason: reason.to_string(),
            };
            let mut parts = line.split_whitespace();
            let id = parts
                .next()
                .and_then(|s| s.parse::<ClientId>().ok())
                .ok_or_else(|| malformed("bad client id"))?;
            let group = parts
                .next()
                .and_then(Group::from_token)
                .ok_or_else(|| malformed("bad group"))?;
            Ok((id, group))
        })
        .collect()
}

/// Parse one entry of a file listing according to the filename grammar.
pub fn parse_listing_entry(line: &str) -> Result<ListingEntry> {
    let malformed = |reason: String| Error::MalformedListing {
        line: line.to_string(),
        reason,
    };

    let mut components = line.rsplit('/');
    let file = components.next().unwrap_or_default();
    let folder = components
        .next()
        .ok_or_else(|| malformed("missing class folder".into()))?;
    let base = file.split('.').next().unwrap_or_default();
    let parts: Vec<&str> = base.split('_').collect();
    if parts.len() < 5 {
        return Err(malformed("too few name fields".into()));
    }

    let class = PresentationClass::from_token(parts[0])
        .ok_or_else(|| malformed(format!("unknown presentation \"{}\"", parts[0])))?;
    let client_id = parts[1]
        .parse::<ClientId>()
        .map_err(|_| malformed(format!("bad client field \"{}\"", parts[1])))?;
    let quality = match parts[2] {
        "laptop" => Quality::Laptop,
        "android" => Quality::Mobile,
        other => return Err(malformed(format!("unknown quality \"{other}\""))),
    };
    let instrument = match class {
        PresentationClass::Real => Instrument::None,
        PresentationClass::Attack => match parts[4] {
            "ipad" => Instrument::VideoHd,
            "iphone" => Instrument::VideoMobile,
            "printed" => Instrument::Print,
            other => return Err(malformed(format!("unknown attack instrument \"{other}\""))),
        },
    };

    Ok(ListingEntry {
        client_id,
        stem: format!("{folder}/{base}"),
        class,
        quality,
        instrument,
    })
}

/// Rebuild the stem of a recording from its attributes.
pub fn stem_for(class: PresentationClass, client_id: ClientId, quality: Quality, instrument: Instrument) -> String {
    let quality = match quality {
        Quality::Laptop => "laptop",
        Quality::Mobile => "android",
    };
    match class {
        PresentationClass::Real => format!("real/real_client{:03}_{quality}_SD_scene01", client_id.0),
        PresentationClass::Attack => {
            let instrument = match instrument {
                Instrument::VideoHd => "ipad_video",
                Instrument::VideoMobile => "iphone_video",
                Instrument::Print | Instrument::None => "printed_photo",
            };
            format!("attack/attack_client{:03}_{quality}_SD_{instrument}_scene01", client_id.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_real_entry() {
        let e = parse_listing_entry("./real/real_client001_android_SD_scene01.mp4").unwrap();
        assert_eq!(e.client_id, ClientId(1));
        assert_eq!(e.stem, "real/real_client001_android_SD_scene01");
        assert_eq!(e.class, PresentationClass::Real);
        assert_eq!(e.quality, Quality::Mobile);
        assert_eq!(e.instrument, Instrument::None);
    }

    #[test]
    fn test_parse_attack_entry() {
        let e = parse_listing_entry("./attack/attack_client006_laptop_SD_iphone_video_scene01.mov").unwrap();
        assert_eq!(e.client_id, ClientId(6));
        assert_eq!(e.stem, "attack/attack_client006_laptop_SD_iphone_video_scene01");
        assert_eq!(e.class, PresentationClass::Attack);
        assert_eq!(e.quality, Quality::Laptop);
        assert_eq!(e.instrument, Instrument::VideoMobile);
    }

    #[test]
    fn test_parse_rejects_unknown_tokens() {
        let err = parse_listing_entry("./attack/attack_client006_tablet_SD_ipad_video_scene01.mov").unwrap_err();
        assert!(err.to_string().contains("unknown quality"));

        let err = parse_listing_entry("./attack/attack_client006_laptop_SD_laser_video_scene01.mov").unwrap_err();
        assert!(err.to_string().contains("unknown attack instrument"));

        let err = parse_listing_entry("./fake/fake_client006_laptop_SD_scene01.mov").unwrap_err();
        assert!(matches!(err, Error::MalformedListing { .. }));
    }

    #[test]
    fn test_builtin_counts() {
        let ds = Dataset::builtin().unwrap();
        assert_eq!(ds.clients.len(), 35);
        assert_eq!(ds.files.len(), 280);
        assert!(ds.clients.iter().all(|c| c.groups.len() == 6));
        assert_eq!(ds.files.iter().filter(|f| f.is_real()).count(), 70);
    }

    #[test]
    fn test_builtin_paths_roundtrip_through_grammar() {
        let ds = Dataset::builtin().unwrap();
        for f in &ds.files {
            assert_eq!(f.path, stem_for(f.class, f.client_id, f.quality, f.instrument));
            assert_eq!(f.client_id_from_path(), Some(f.client_id));
        }
        let unique: HashSet<&str> = ds.files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(unique.len(), ds.files.len());
    }

    #[test]
    fn test_rotation_flags() {
        let ds = Dataset::builtin().unwrap();
        let by_path = |p: &str| ds.files.iter().find(|f| f.path == p).unwrap();
        assert!(by_path("real/real_client003_android_SD_scene01").is_rotated());
        assert!(!by_path("attack/attack_client003_laptop_SD_ipad_video_scene01").is_rotated());
    }

    #[test]
    fn test_client_missing_from_a_fold_is_rejected() {
        let folds = [(Fold::ALL[0], "001 train\n002 test\n"), (Fold::ALL[1], "001 train\n")];
        let err = Dataset::from_sources(&folds, "", "", "").unwrap_err();
        assert!(err.to_string().contains("fold 1"));
    }

    #[test]
    fn test_file_for_unknown_client_is_rejected() {
        let folds = [(Fold::ALL[1], "001 train\n")];
        let err = Dataset::from_sources(&folds, "./real/real_client002_laptop_SD_scene01.mov\n", "", "")
            .unwrap_err();
        assert!(err.to_string().contains("unknown client 02"));
    }
}
