use std::{collections::HashSet, io::Read, path::Path};

use tracing::{info, warn};

use crate::{error::Result, reader};

/// Ordered session identifiers, one per account.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountDirectory {
    sessions: Vec<String>,
}

impl AccountDirectory {
    /// Load session identifiers from the first column of a delimited file.
    pub fn load(path: &Path, delimiter: u8) -> Result<Self> {
        info!(path = %path.display(), "reading session identifiers");
        let file = reader::open(path)?;
        Self::from_reader(file, path, delimiter)
    }

    /// Parse an already-open source. `origin` is used for error messages.
    pub fn from_reader(source: impl Read, origin: &Path, delimiter: u8) -> Result<Self> {
        let rows = reader::read_rows(source, origin, delimiter)?;
        let mut seen = HashSet::with_capacity(rows.len());
        let mut sessions = Vec::with_capacity(rows.len());
        for row in &rows {
            let session = reader::field(row, origin, 0, 1, "session identifier")?;
            if !seen.insert(session.to_string()) {
                warn!(
                    path = %origin.display(),
                    line = row.line,
                    session,
                    "duplicate session identifier skipped"
                );
                continue;
            }
            sessions.push(session.to_string());
        }
        Ok(Self { sessions })
    }

    #[must_use]
    pub fn sessions(&self) -> &[String] {
        &self.sessions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    #[must_use]
    pub fn into_sessions(self) -> Vec<String> {
        self.sessions
    }
}
