use std::path::{Path, PathBuf};

/// Crate-wide result type for directory loading.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures reading an account or channel source. All of them are fatal to
/// a run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The source could not be opened or read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The source is not valid delimited text.
    #[error("malformed record in {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// The source has no header row.
    #[error("{} is empty (expected a header row)", path.display())]
    MissingHeader { path: PathBuf },

    /// A data row has fewer fields than required.
    #[error("{}:{line}: expected at least {expected} fields, found {found}", path.display())]
    MissingField {
        path: PathBuf,
        line: u64,
        expected: usize,
        found: usize,
    },

    /// A required field is blank.
    #[error("{}:{line}: {field} is empty", path.display())]
    EmptyField {
        path: PathBuf,
        line: u64,
        field: &'static str,
    },
}

impl Error {
    #[must_use]
    pub fn read(path: &Path, source: std::io::Error) -> Self {
        Self::Read {
            path: path.to_path_buf(),
            source,
        }
    }

    #[must_use]
    pub fn csv(path: &Path, source: csv::Error) -> Self {
        Self::Csv {
            path: path.to_path_buf(),
            source,
        }
    }
}
