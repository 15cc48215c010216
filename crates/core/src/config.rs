use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::Fold;

/// Frames kept per video when the caller asks for zero.
pub const DEFAULT_MAX_FRAMES: usize = 10;

/// Settings of a [`crate::Database`] handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseOptions {
    /// Root holding the original recordings.
    pub original_directory: Option<PathBuf>,
    /// Extension appended to stems for `original_file`.
    pub original_extension: Option<String>,
    /// Root of the `.face` companion files.
    pub face_directory: PathBuf,
    /// Fold used when a query leaves it unset.
    pub fold: Fold,
}

impl Default for DatabaseOptions {
    fn default() -> Self {
        Self {
            original_directory: None,
            original_extension: None,
            face_directory: PathBuf::from("face-locations"),
            fold: Fold::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationOptions {
    pub max_number_of_frames: usize,
}

impl VerificationOptions {
    pub fn with_frames(max_number_of_frames: usize) -> Self {
        Self { max_number_of_frames }
    }

    /// Effective frame budget; zero falls back to [`DEFAULT_MAX_FRAMES`].
    pub fn frames(&self) -> usize {
        if self.max_number_of_frames == 0 {
            DEFAULT_MAX_FRAMES
        } else {
            self.max_number_of_frames
        }
    }
}

impl Default for VerificationOptions {
    fn default() -> Self {
        Self {
            max_number_of_frames: DEFAULT_MAX_FRAMES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Choice;

    #[test]
    fn test_database_defaults() {
        let opts = DatabaseOptions::default();
        assert_eq!(opts.face_directory, PathBuf::from("face-locations"));
        assert_eq!(opts.fold.number(), 1);
        assert!(opts.original_directory.is_none());
    }

    #[test]
    fn test_zero_frames_means_default() {
        assert_eq!(VerificationOptions::with_frames(0).frames(), DEFAULT_MAX_FRAMES);
        assert_eq!(VerificationOptions::with_frames(3).frames(), 3);
    }

    #[test]
    fn test_fold_out_of_range_rejected_on_load() {
        let opts: DatabaseOptions = serde_json::from_str(r#"{"fold": 3}"#).unwrap();
        assert_eq!(opts.fold, Fold::ALL[3]);

        let err = serde_json::from_str::<DatabaseOptions>(r#"{"fold": 9}"#).unwrap_err();
        assert!(err.to_string().contains("invalid fold value \"9\""));
    }

    #[test]
    fn test_fold_serializes_as_number() {
        let json = serde_json::to_string(&DatabaseOptions::default()).unwrap();
        assert!(json.contains(r#""fold":1"#));
    }
}
