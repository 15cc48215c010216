#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid {param} value \"{value}\"; valid values are: {}", .valid.join(", "))]
    InvalidFilterValue {
        value: String,
        param: &'static str,
        valid: Vec<String>,
    },

    #[error("unsupported query combination: {0}")]
    UnsupportedQueryCombination(String),

    #[error("catalog unavailable: {0}; run `mfsd create` first")]
    CatalogUnavailable(String),

    #[error("malformed listing entry \"{line}\": {reason}")]
    MalformedListing { line: String, reason: String },
}

impl Error {
    /// Build an `InvalidFilterValue` naming every member of the valid domain.
    pub fn invalid_value<T: std::fmt::Display>(
        param: &'static str,
        value: impl std::fmt::Display,
        valid: &[T],
    ) -> Self {
        Error::InvalidFilterValue {
            value: value.to_string(),
            param,
            valid: valid.iter().map(|v| v.to_string()).collect(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
