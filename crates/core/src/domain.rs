use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A closed, enumerable filter dimension.
///
/// `PARAM` is the name reported in validation errors, `ALL` is the full
/// domain in its canonical order.
pub trait Choice: Copy + Eq + Ord + fmt::Display + 'static {
    const PARAM: &'static str;
    const ALL: &'static [Self];

    fn as_str(&self) -> &'static str;

    fn from_token(token: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.as_str() == token)
    }
}

macro_rules! display_as_str {
    ($($ty:ty),*) => {
        $(impl ::std::fmt::Display for $ty {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str($crate::domain::Choice::as_str(self))
            }
        })*
    };
}

pub(crate) use display_as_str;

display_as_str!(Group, PresentationClass, Quality, Instrument);

/// Which subset of the data a client belongs to under a given fold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Group {
    Train,
    Devel,
    Test,
}

impl Choice for Group {
    const PARAM: &'static str = "group";
    const ALL: &'static [Self] = &[Group::Train, Group::Devel, Group::Test];

    fn as_str(&self) -> &'static str {
        match self {
            Group::Train => "train",
            Group::Devel => "devel",
            Group::Test => "test",
        }
    }
}

/// Genuine capture or spoofing attempt.
///
/// `Real` orders before `Attack`; query results rely on this rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresentationClass {
    Real,
    Attack,
}

impl PresentationClass {
    pub fn rank(&self) -> u8 {
        match self {
            PresentationClass::Real => 0,
            PresentationClass::Attack => 1,
        }
    }
}

impl Choice for PresentationClass {
    const PARAM: &'static str = "presentation";
    const ALL: &'static [Self] = &[PresentationClass::Real, PresentationClass::Attack];

    fn as_str(&self) -> &'static str {
        match self {
            PresentationClass::Real => "real",
            PresentationClass::Attack => "attack",
        }
    }
}

/// Capture device tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quality {
    Laptop,
    Mobile,
}

impl Quality {
    /// Container format of the original recordings for this device.
    pub fn video_extension(&self) -> &'static str {
        match self {
            Quality::Laptop => ".mov",
            Quality::Mobile => ".mp4",
        }
    }
}

impl Choice for Quality {
    const PARAM: &'static str = "quality";
    const ALL: &'static [Self] = &[Quality::Laptop, Quality::Mobile];

    fn as_str(&self) -> &'static str {
        match self {
            Quality::Laptop => "laptop",
            Quality::Mobile => "mobile",
        }
    }
}

/// Attack instrument. Real recordings carry `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Instrument {
    VideoHd,
    VideoMobile,
    Print,
    None,
}

impl Instrument {
    /// The three instruments that actually produce attacks.
    pub const ATTACKS: &'static [Instrument] =
        &[Instrument::VideoHd, Instrument::VideoMobile, Instrument::Print];
}

impl Choice for Instrument {
    const PARAM: &'static str = "attack_instrument";
    const ALL: &'static [Self] = &[
        Instrument::VideoHd,
        Instrument::VideoMobile,
        Instrument::Print,
        Instrument::None,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            Instrument::VideoHd => "video_hd",
            Instrument::VideoMobile => "video_mobile",
            Instrument::Print => "print",
            Instrument::None => "none",
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        if token.is_empty() {
            return Some(Instrument::None);
        }
        Self::ALL.iter().copied().find(|c| c.as_str() == token)
    }
}

/// Cross-validation fold selector. Fold 0 is the original train/test split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Fold(u8);

impl Fold {
    pub const ORIGINAL: Fold = Fold(0);

    pub fn number(&self) -> u8 {
        self.0
    }

    pub fn is_original(&self) -> bool {
        self.0 == 0
    }

    /// The cross-validation folds, excluding the original split.
    pub fn cross_validation() -> &'static [Fold] {
        &Self::ALL[1..]
    }
}

impl Default for Fold {
    fn default() -> Self {
        Fold(1)
    }
}

impl Choice for Fold {
    const PARAM: &'static str = "fold";
    const ALL: &'static [Self] = &[Fold(0), Fold(1), Fold(2), Fold(3), Fold(4), Fold(5)];

    fn as_str(&self) -> &'static str {
        ["0", "1", "2", "3", "4", "5"].get(self.0 as usize).copied().unwrap_or("?")
    }

    fn from_token(token: &str) -> Option<Self> {
        let token = token.strip_prefix("fold").unwrap_or(token);
        let n: u8 = token.parse().ok()?;
        Self::ALL.get(n as usize).copied()
    }
}

impl TryFrom<u8> for Fold {
    type Error = crate::error::Error;

    fn try_from(n: u8) -> crate::error::Result<Self> {
        Self::ALL
            .get(n as usize)
            .copied()
            .ok_or_else(|| crate::error::Error::invalid_value(Self::PARAM, n, Self::ALL))
    }
}

impl From<Fold> for u8 {
    fn from(fold: Fold) -> u8 {
        fold.0
    }
}

impl fmt::Display for Fold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Numeric client identifier, rendered with two digits (`01`, `55`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(pub u8);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.0)
    }
}

impl FromStr for ClientId {
    type Err = std::num::ParseIntError;

    /// Accepts `1`, `01`, `001` and `client001`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let digits = s.strip_prefix("client").unwrap_or(s);
        digits.parse::<u8>().map(ClientId)
    }
}

/// A dataset participant and its group under every fold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub groups: BTreeMap<Fold, Group>,
}

impl Client {
    /// The client's group under `fold`, if it has one.
    pub fn group(&self, fold: Fold) -> Option<Group> {
        self.groups.get(&fold).copied()
    }
}

/// One recording of the dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: i64,
    pub client_id: ClientId,
    /// Stem relative to the dataset root, without extension.
    pub path: String,
    pub class: PresentationClass,
    pub quality: Quality,
    pub instrument: Instrument,
    pub rotate: bool,
}

impl FileRecord {
    /// `directory/path + extension`; both parts are optional.
    pub fn make_path(&self, directory: Option<&Path>, extension: Option<&str>) -> PathBuf {
        let file = format!("{}{}", self.path, extension.unwrap_or(""));
        match directory {
            Some(dir) => dir.join(file),
            None => PathBuf::from(file),
        }
    }

    pub fn video_extension(&self) -> &'static str {
        self.quality.video_extension()
    }

    /// Location of the original video file.
    pub fn video_file(&self, directory: Option<&Path>) -> PathBuf {
        self.make_path(directory, Some(self.video_extension()))
    }

    /// Location of the companion face bounding-box file.
    pub fn face_file(&self, directory: &Path) -> PathBuf {
        self.make_path(Some(directory), Some(".face"))
    }

    /// Whether the original video was recorded upside down.
    pub fn is_rotated(&self) -> bool {
        self.rotate
    }

    pub fn is_real(&self) -> bool {
        self.class == PresentationClass::Real
    }

    /// Client id recovered from the stem (`.../real_client003_...` → `03`).
    pub fn client_id_from_path(&self) -> Option<ClientId> {
        let stem = self.path.rsplit('/').next()?;
        let token = stem.split('_').nth(1)?;
        token.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(path: &str, quality: Quality) -> FileRecord {
        FileRecord {
            id: 1,
            client_id: ClientId(1),
            path: path.to_string(),
            class: PresentationClass::Real,
            quality,
            instrument: Instrument::None,
            rotate: false,
        }
    }

    #[test]
    fn test_make_path_defaults_to_bare_stem() {
        let r = record("real/real_client001_android_SD_scene01", Quality::Mobile);
        assert_eq!(
            r.make_path(None, None),
            PathBuf::from("real/real_client001_android_SD_scene01")
        );
        assert_eq!(
            r.make_path(Some(Path::new("xxx")), Some(".hdf5")),
            PathBuf::from("xxx/real/real_client001_android_SD_scene01.hdf5")
        );
    }

    #[test]
    fn test_video_file_extension_follows_quality() {
        let mobile = record("real/real_client001_android_SD_scene01", Quality::Mobile);
        assert_eq!(
            mobile.video_file(Some(Path::new("xxx"))),
            PathBuf::from("xxx/real/real_client001_android_SD_scene01.mp4")
        );

        let laptop = record("attack/attack_client003_laptop_SD_ipad_video_scene01", Quality::Laptop);
        assert_eq!(laptop.video_extension(), ".mov");
        assert_eq!(
            laptop.video_file(Some(Path::new("xxx"))),
            PathBuf::from("xxx/attack/attack_client003_laptop_SD_ipad_video_scene01.mov")
        );
    }

    #[test]
    fn test_face_file() {
        let r = record("real/real_client001_laptop_SD_scene01", Quality::Laptop);
        assert_eq!(
            r.face_file(Path::new("face-locations")),
            PathBuf::from("face-locations/real/real_client001_laptop_SD_scene01.face")
        );
    }

    #[test]
    fn test_client_id_from_path() {
        let r = record("attack/attack_client003_laptop_SD_ipad_video_scene01", Quality::Laptop);
        assert_eq!(r.client_id_from_path(), Some(ClientId(3)));
        assert_eq!(r.client_id_from_path().unwrap().to_string(), "03");
    }

    #[test]
    fn test_client_id_parse_forms() {
        assert_eq!("1".parse::<ClientId>().unwrap(), ClientId(1));
        assert_eq!("01".parse::<ClientId>().unwrap(), ClientId(1));
        assert_eq!("client055".parse::<ClientId>().unwrap(), ClientId(55));
        assert!("abc".parse::<ClientId>().is_err());
    }

    #[test]
    fn test_real_ranks_before_attack() {
        assert!(PresentationClass::Real < PresentationClass::Attack);
        assert!(PresentationClass::Real.rank() < PresentationClass::Attack.rank());
    }

    #[test]
    fn test_instrument_tokens() {
        assert_eq!(Instrument::from_token("print"), Some(Instrument::Print));
        assert_eq!(Instrument::from_token(""), Some(Instrument::None));
        assert_eq!(Instrument::from_token("none"), Some(Instrument::None));
        assert_eq!(Instrument::from_token("ipad"), None);
    }

    #[test]
    fn test_fold_tokens_and_range() {
        assert_eq!(Fold::from_token("3"), Some(Fold::ALL[3]));
        assert_eq!(Fold::from_token("fold5"), Some(Fold::ALL[5]));
        assert_eq!(Fold::from_token("6"), None);
        assert!(Fold::try_from(6).is_err());
        assert_eq!(Fold::default().number(), 1);
        assert_eq!(Fold::cross_validation().len(), 5);
    }

    #[test]
    fn test_fold_outside_range_does_not_panic() {
        assert_eq!(Fold(9).as_str(), "?");
        assert_eq!(Fold(9).to_string(), "9");
    }

    #[test]
    fn test_client_group_lookup() {
        let mut groups = BTreeMap::new();
        groups.insert(Fold::ORIGINAL, Group::Test);
        groups.insert(Fold::default(), Group::Devel);
        let client = Client { id: ClientId(1), groups };
        assert_eq!(client.group(Fold::ORIGINAL), Some(Group::Test));
        assert_eq!(client.group(Fold::default()), Some(Group::Devel));
        assert_eq!(client.group(Fold::ALL[2]), None);
    }
}
